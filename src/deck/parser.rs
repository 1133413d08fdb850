//! Beamer source scanner.
//!
//! Splits a Beamer document into frames and each frame into content blocks.
//! This is a structural scanner, not a TeX parser: it recognises the
//! environments that carry reveal semantics and treats everything between them
//! as paragraph text.
use super::{BlockKind, ContentBlock, Deck, Frame};
use memchr::memmem;

const BEGIN_DOCUMENT: &str = r"\begin{document}";
const BEGIN_FRAME: &str = r"\begin{frame}";
const END_FRAME: &str = r"\end{frame}";
const BEGIN_ENV: &str = r"\begin{";
const LSTLISTING: &str = r"\begin{lstlisting}";

/// Environments that become their own block.
const BLOCK_ENVIRONMENTS: &[&str] = &[
    "lstlisting",
    "align",
    "align*",
    "gather",
    "gather*",
    "equation",
    "equation*",
    "itemize",
    "enumerate",
];

/// A frame as it appears in the source, before block splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame<'a> {
    pub options: &'a str,
    pub title: &'a str,
    pub content: &'a str,
}

#[inline]
fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    memmem::find(&haystack.as_bytes()[from..], needle.as_bytes()).map(|i| i + from)
}

/// Everything before `\begin{document}`, or an empty string when the document
/// has no body.
pub fn extract_preamble(source: &str) -> &str {
    match find_from(source, BEGIN_DOCUMENT, 0) {
        Some(pos) => &source[..pos],
        None => "",
    }
}

/// Argument of the first `\command{...}` in `text` (no nested braces).
fn command_argument<'a>(text: &'a str, command: &str) -> Option<&'a str> {
    let open = format!("\\{}{{", command);
    let start = find_from(text, &open, 0)? + open.len();
    let end = find_from(text, "}", start)?;
    Some(&text[start..end])
}

/// Name of the first environment opened in `raw`.
pub(crate) fn begin_environment(raw: &str) -> Option<&str> {
    let start = find_from(raw, BEGIN_ENV, 0)? + BEGIN_ENV.len();
    let end = find_from(raw, "}", start)?;
    let name = &raw[start..end];
    (!name.is_empty()).then_some(name)
}

/// Take a delimited group `open ... close` right at the start of `text`.
///
/// Returns the inner text and the number of bytes consumed.
fn leading_group(text: &str, open: char, close: char) -> Option<(&str, usize)> {
    let rest = text.strip_prefix(open)?;
    let end = rest.find(close)?;
    Some((&rest[..end], end + 2))
}

/// Extract all frames as `(options, title, content)`.
pub fn extract_frames(source: &str) -> Vec<RawFrame<'_>> {
    let mut frames = Vec::new();
    let mut pos = 0;

    while let Some(begin) = find_from(source, BEGIN_FRAME, pos) {
        let mut cursor = begin + BEGIN_FRAME.len();

        let mut options = "";
        if let Some((inner, used)) = leading_group(&source[cursor..], '[', ']') {
            options = inner;
            cursor += used;
        }

        let mut title = "";
        if let Some((inner, used)) = leading_group(&source[cursor..], '{', '}') {
            title = inner;
            cursor += used;
        }

        let Some(end) = find_from(source, END_FRAME, cursor) else {
            break;
        };

        frames.push(RawFrame {
            options,
            title,
            content: source[cursor..end].trim(),
        });
        pos = end + END_FRAME.len();
    }

    frames
}

/// Split the body of an `align`-like environment into its lines.
///
/// Lines end at `\\`, optionally followed by a spacing argument such as `[5pt]`.
pub fn split_align_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while let Some(brk) = find_from(content, r"\\", pos) {
        lines.push(&content[start..brk]);

        let mut next = brk + 2;
        let rest = &content[next..];
        let trimmed = rest.trim_start();
        if let Some((_, used)) = leading_group(trimmed, '[', ']') {
            next += rest.len() - trimmed.len() + used;
        }
        start = next;
        pos = next;
    }
    lines.push(&content[start..]);

    lines
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split the body of an `itemize`/`enumerate` environment into its items.
pub fn split_itemize_items(content: &str) -> Vec<String> {
    const ITEM: &str = r"\item";

    let mut items = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while let Some(found) = find_from(content, ITEM, pos) {
        let after = found + ITEM.len();
        // `\itemsep` and friends are not item markers
        if content[after..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
        {
            pos = after;
            continue;
        }
        items.push(&content[start..found]);
        start = after;
        pos = after;
    }
    items.push(&content[start..]);

    items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Replace every `\vspace{...}` with a paragraph break.
fn vspace_to_breaks(text: &str) -> String {
    const VSPACE: &str = r"\vspace{";

    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some(found) = find_from(text, VSPACE, pos) {
        let Some(close) = find_from(text, "}", found + VSPACE.len()) else {
            break;
        };
        out.push_str(&text[pos..found]);
        out.push_str("\n\n");
        pos = close + 1;
    }
    out.push_str(&text[pos..]);
    out
}

/// Split running text into reveal items.
///
/// Items are separated by blank lines and `\vspace{...}`; inside a paragraph a
/// line starting with `\textbf{` opens a new item.
pub fn split_text_into_paragraphs(text: &str) -> Vec<String> {
    let text = vspace_to_breaks(text);

    let mut result = Vec::new();
    let mut chunk: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !chunk.is_empty() {
                result.push(chunk.join("\n"));
                chunk.clear();
            }
            continue;
        }
        if line.starts_with(r"\textbf{") && !chunk.is_empty() {
            result.push(chunk.join("\n"));
            chunk.clear();
        }
        chunk.push(line);
    }
    if !chunk.is_empty() {
        result.push(chunk.join("\n"));
    }

    result
}

/// A recognised block environment inside frame content.
struct EnvMatch<'a> {
    start: usize,
    end: usize,
    name: &'a str,
    body: &'a str,
}

/// Find the next block environment at or after `from`.
fn next_environment(content: &str, from: usize) -> Option<EnvMatch<'_>> {
    let mut pos = from;
    while let Some(begin) = find_from(content, BEGIN_ENV, pos) {
        let name_start = begin + BEGIN_ENV.len();
        let name_end = find_from(content, "}", name_start)?;
        let name = &content[name_start..name_end];

        if BLOCK_ENVIRONMENTS.contains(&name) {
            let closing = format!("\\end{{{}}}", name);
            if let Some(end) = find_from(content, &closing, name_end + 1) {
                return Some(EnvMatch {
                    start: begin,
                    end: end + closing.len(),
                    name,
                    body: &content[name_end + 1..end],
                });
            }
        }
        pos = begin + 1;
    }
    None
}

fn push_text_block(blocks: &mut Vec<ContentBlock>, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    let paragraphs = split_text_into_paragraphs(text);
    if !paragraphs.is_empty() {
        blocks.push(ContentBlock::new(BlockKind::Text, text, paragraphs));
    }
}

/// Split frame content into blocks in source order.
pub fn parse_frame_content(content: &str) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut last_end = 0;

    while let Some(env) = next_environment(content, last_end) {
        push_text_block(&mut blocks, &content[last_end..env.start]);

        let raw = &content[env.start..env.end];
        let body = env.body.trim();
        let block = match env.name {
            "lstlisting" => ContentBlock::new(BlockKind::Code, raw, Vec::new()),
            "align" | "align*" | "gather" | "gather*" => {
                ContentBlock::new(BlockKind::MathAlignment, raw, split_align_lines(body))
            },
            "equation" | "equation*" => {
                ContentBlock::new(BlockKind::DisplayMath, raw, vec![body.to_string()])
            },
            "itemize" => ContentBlock::new(BlockKind::Itemize, raw, split_itemize_items(body)),
            _ => ContentBlock::new(BlockKind::Enumerate, raw, split_itemize_items(body)),
        };
        blocks.push(block);

        last_end = env.end;
    }

    push_text_block(&mut blocks, &content[last_end..]);
    blocks
}

/// Parse a complete Beamer document.
pub fn parse_beamer(source: &str) -> Deck {
    let preamble = extract_preamble(source);

    let frames = extract_frames(source)
        .into_iter()
        .map(|raw| Frame {
            title: raw.title.to_string(),
            options: raw.options.to_string(),
            raw: raw.content.to_string(),
            blocks: parse_frame_content(raw.content),
            has_code: raw.content.contains(LSTLISTING),
        })
        .collect();

    Deck {
        preamble: preamble.to_string(),
        title: command_argument(preamble, "title").unwrap_or_default().to_string(),
        author: command_argument(preamble, "author").unwrap_or_default().to_string(),
        frames,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"\documentclass{beamer}
\usetheme{Madrid}
\usepackage{amsmath}
\title{Test Presentation}
\author{Test Author}

\begin{document}

\begin{frame}{First Slide}
\begin{itemize}
\item Alpha
\item Beta
\item Gamma
\end{itemize}
\end{frame}

\begin{frame}{Math Slide}
\begin{align*}
x &= 1 \\
y &= 2
\end{align*}
\end{frame}

\begin{frame}{Text Slide}
First paragraph about something.

Second paragraph about something else.
\end{frame}

\end{document}
";

    #[test]
    fn test_extract_preamble() {
        let preamble = extract_preamble(SAMPLE);
        assert!(preamble.contains(r"\documentclass{beamer}"));
        assert!(preamble.contains(r"\usepackage{amsmath}"));
        assert!(!preamble.contains(BEGIN_DOCUMENT));
        assert_eq!(extract_preamble("just text"), "");
    }

    #[test]
    fn test_extract_frames() {
        let tex = r"
\begin{frame}[fragile]{Code Slide}
some code
\end{frame}
\begin{frame}
untitled content
\end{frame}";
        let frames = extract_frames(tex);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].options, "fragile");
        assert_eq!(frames[0].title, "Code Slide");
        assert_eq!(frames[0].content, "some code");
        assert_eq!(frames[1].title, "");
        assert_eq!(frames[1].content, "untitled content");
    }

    #[test]
    fn test_unterminated_frame_is_dropped() {
        let frames = extract_frames(r"\begin{frame}{A} alpha \end{frame} \begin{frame}{B} beta");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].title, "A");
    }

    #[test]
    fn test_split_align_lines() {
        let lines = split_align_lines(r"x &= 1 \\ y &= 2 \\ z &= 3");
        assert_eq!(lines, vec!["x &= 1", "y &= 2", "z &= 3"]);

        let spaced = split_align_lines(r"a &= 1 \\[5pt] b &= 2");
        assert_eq!(spaced, vec!["a &= 1", "b &= 2"]);

        assert_eq!(split_align_lines("x = 1"), vec!["x = 1"]);
        assert_eq!(split_align_lines(r"x \\"), vec!["x"]);
    }

    #[test]
    fn test_split_itemize_items() {
        let items = split_itemize_items(r"\item First \item Second \item Third");
        assert_eq!(items, vec!["First", "Second", "Third"]);

        let multiline = split_itemize_items("\n\\item First item\nwith more text\n\\item Second item\n");
        assert_eq!(multiline.len(), 2);
        assert_eq!(multiline[0], "First item\nwith more text");

        let with_sep = split_itemize_items(r"\itemsep1em \item A \item B");
        assert_eq!(with_sep, vec![r"\itemsep1em", "A", "B"]);
    }

    #[test]
    fn test_split_text_into_paragraphs() {
        assert_eq!(
            split_text_into_paragraphs("First paragraph.\n\nSecond paragraph."),
            vec!["First paragraph.", "Second paragraph."]
        );

        let bold = split_text_into_paragraphs(
            "\\textbf{Heading 1}\nSome detail.\n\\textbf{Heading 2}\nMore detail.",
        );
        assert_eq!(bold.len(), 2);
        assert!(bold[0].starts_with(r"\textbf{Heading 1}"));
        assert!(bold[1].starts_with(r"\textbf{Heading 2}"));

        assert_eq!(split_text_into_paragraphs(r"Before\vspace{1em}After").len(), 2);
        assert_eq!(split_text_into_paragraphs("Just one paragraph.").len(), 1);
        assert!(split_text_into_paragraphs("").is_empty());
        assert!(split_text_into_paragraphs("   ").is_empty());
    }

    #[test]
    fn test_parse_frame_content_kinds() {
        let cases = [
            ("\\begin{itemize}\n\\item A\n\\item B\n\\end{itemize}", BlockKind::Itemize, 2),
            ("\\begin{enumerate}\\item A\\end{enumerate}", BlockKind::Enumerate, 1),
            ("\\begin{align*}\nx &= 1 \\\\\ny &= 2\n\\end{align*}", BlockKind::MathAlignment, 2),
            ("\\begin{gather}a \\\\ b \\\\ c\\end{gather}", BlockKind::MathAlignment, 3),
            ("\\begin{equation*}\nE = mc^2\n\\end{equation*}", BlockKind::DisplayMath, 1),
            ("\\begin{lstlisting}\nprint(1)\n\\end{lstlisting}", BlockKind::Code, 0),
        ];
        for (content, kind, items) in cases {
            let blocks = parse_frame_content(content);
            assert_eq!(blocks.len(), 1, "{content}");
            assert_eq!(blocks[0].kind, kind);
            assert_eq!(blocks[0].items.len(), items);
            assert_eq!(blocks[0].raw, content.trim());
        }
    }

    #[test]
    fn test_parse_frame_content_mixed() {
        let content = "Intro text.\n\n\\begin{align*}\nx &= 1\n\\end{align*}\n\n\\begin{itemize}\n\\item A\n\\item B\n\\end{itemize}\nTrailing text.";
        let kinds: Vec<_> = parse_frame_content(content).iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Text,
                BlockKind::MathAlignment,
                BlockKind::Itemize,
                BlockKind::Text
            ]
        );
        assert!(parse_frame_content("").is_empty());
    }

    #[test]
    fn test_unknown_environment_stays_text() {
        let blocks = parse_frame_content("\\begin{center}hello\\end{center}");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Text);
    }

    #[test]
    fn test_parse_beamer() {
        let deck = parse_beamer(SAMPLE);
        assert_eq!(deck.title, "Test Presentation");
        assert_eq!(deck.author, "Test Author");
        assert_eq!(deck.frames.len(), 3);

        let titles: Vec<_> = deck.frames.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["First Slide", "Math Slide", "Text Slide"]);

        assert_eq!(deck.frames[0].blocks[0].kind, BlockKind::Itemize);
        assert_eq!(deck.frames[0].blocks[0].items.len(), 3);
        assert_eq!(deck.frames[1].blocks[0].kind, BlockKind::MathAlignment);
        assert_eq!(deck.frames[1].blocks[0].items.len(), 2);
        assert_eq!(deck.frames[2].blocks[0].kind, BlockKind::Text);
        assert_eq!(deck.frames[2].blocks[0].items.len(), 2);
        assert!(!deck.has_code_frames());
    }

    #[test]
    fn test_has_code_flag() {
        let tex = "\\documentclass{beamer}\n\\begin{document}\n\\begin{frame}[fragile]{Code}\n\\begin{lstlisting}\nx = 1\n\\end{lstlisting}\n\\end{frame}\n\\begin{frame}{Normal}\nhello\n\\end{frame}\n\\end{document}";
        let deck = parse_beamer(tex);
        assert!(deck.frames[0].has_code);
        assert!(!deck.frames[1].has_code);
        assert!(deck.has_code_frames());
    }
}
