//! Standalone document generation.
//!
//! Every reveal step is typeset as a complete one-page `article` document so
//! that font metrics and page width are identical across steps.
use crate::config::RenderStyle;
use crate::deck::{BlockKind, ContentBlock};
use memchr::memmem;
use std::fmt::Write as FmtWrite;

/// How a fragment is treated before typesetting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// Paragraph text; Beamer-only commands are stripped first
    Text,
    /// Math environments, passed through untouched
    Math,
    /// List environments, passed through untouched
    List,
}

impl From<BlockKind> for FragmentKind {
    fn from(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Text => FragmentKind::Text,
            BlockKind::Itemize | BlockKind::Enumerate => FragmentKind::List,
            _ => FragmentKind::Math,
        }
    }
}

/// Markup for each reveal step of `block`, in order.
///
/// Cumulative kinds yield one fragment per item, each holding the first `i`
/// items as a complete environment. Display math yields its raw markup once.
/// Code blocks yield nothing.
pub fn reveal_fragments(block: &ContentBlock) -> Vec<String> {
    match block.kind {
        BlockKind::Code => Vec::new(),
        kind if kind.is_cumulative() => (1..=block.items.len())
            .map(|count| cumulative_fragment(block, count))
            .collect(),
        _ => vec![block.raw.clone()],
    }
}

/// Markup revealing the first `count` items of a cumulative block.
pub fn cumulative_fragment(block: &ContentBlock, count: usize) -> String {
    let items = &block.items[..count.min(block.items.len())];
    match block.kind {
        BlockKind::Text => items.join("\n\n"),
        BlockKind::MathAlignment => {
            let env = block.environment_name();
            format!("\\begin{{{env}}}\n{}\n\\end{{{env}}}", items.join(" \\\\\n"))
        },
        BlockKind::Itemize | BlockKind::Enumerate => {
            let env = block.environment_name();
            let mut out = format!("\\begin{{{env}}}\n");
            for item in items {
                out.push_str("\\item ");
                out.push_str(item);
                out.push('\n');
            }
            out.push_str(&format!("\\end{{{env}}}"));
            out
        },
        BlockKind::DisplayMath | BlockKind::Code => block.raw.clone(),
    }
}

#[inline]
fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    memmem::find(&haystack.as_bytes()[from..], needle.as_bytes()).map(|i| i + from)
}

/// Remove every `open ... close` span (non-nested, shortest match).
fn remove_spans(text: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some(start) = find_from(text, open, pos) {
        let Some(end) = find_from(text, close, start + open.len()) else {
            break;
        };
        out.push_str(&text[pos..start]);
        pos = end + close.len();
    }
    out.push_str(&text[pos..]);
    out
}

/// Replace every `\command{arg}` (no nested braces) with `replacement`.
fn replace_braced_command(text: &str, command: &str, replacement: &str) -> String {
    let open = format!("\\{}{{", command);
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some(start) = find_from(text, &open, pos) {
        let Some(end) = find_from(text, "}", start + open.len()) else {
            break;
        };
        out.push_str(&text[pos..start]);
        out.push_str(replacement);
        pos = end + 1;
    }
    out.push_str(&text[pos..]);
    out
}

/// Remove every `\command<overlay>` marker, leaving any argument group.
fn remove_overlay_command(text: &str, command: &str) -> String {
    let open = format!("\\{}<", command);
    remove_spans(text, &open, ">")
}

/// Remove `\command{...}` including a balanced, possibly nested argument.
fn remove_nested_braces(text: &str, command: &str) -> String {
    let cmd = format!("\\{}", command);
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    let mut scan = 0;

    while let Some(start) = find_from(text, &cmd, scan) {
        let mut j = start + cmd.len();
        while j < bytes.len() && matches!(bytes[j], b' ' | b'\t' | b'\n') {
            j += 1;
        }
        if j >= bytes.len() || bytes[j] != b'{' {
            scan = start + cmd.len();
            continue;
        }

        let mut depth = 1usize;
        let mut k = j + 1;
        while k < bytes.len() && depth > 0 {
            match bytes[k] {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                _ => {},
            }
            k += 1;
        }
        out.push_str(&text[pos..start]);
        pos = k;
        scan = k;
    }
    out.push_str(&text[pos..]);
    out
}

/// Collapse runs of blank lines into a single blank line.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_blank = false;
    for line in text.lines() {
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        if blank {
            out.push('\n');
        } else {
            out.push_str(line);
            out.push('\n');
        }
        previous_blank = blank;
    }
    out
}

/// Strip Beamer-only markup so a text fragment typesets in a plain article.
///
/// Returns an empty string when nothing printable is left.
pub fn sanitize_fragment(content: &str) -> String {
    let mut text = remove_spans(content, r"\begin{columns}", r"\end{columns}");
    text = replace_braced_command(&text, "column", "");
    text = remove_nested_braces(&text, "fbox");
    text = remove_nested_braces(&text, "parbox");

    for command in ["onslide", "only", "visible", "invisible", "uncover", "alert"] {
        text = remove_overlay_command(&text, command);
    }
    text = replace_braced_command(&text, "structure", "");
    text = text.replace(r"\alert{", "{");
    for command in [r"\pause", r"\titlepage", r"\maketitle", r"\vfill"] {
        text = text.replace(command, "");
    }
    text = replace_braced_command(&text, "vspace", "\n");
    text = replace_braced_command(&text, "hspace", " ");

    collapse_blank_lines(&text).trim().to_string()
}

/// Wrap `fragment` in a complete standalone document.
///
/// Returns `None` when a text fragment is empty after sanitising.
pub fn standalone_document(
    fragment: &str,
    kind: FragmentKind,
    preamble: &str,
    style: &RenderStyle,
) -> Option<String> {
    let body = match kind {
        FragmentKind::Text => {
            let cleaned = sanitize_fragment(fragment);
            if cleaned.is_empty() {
                return None;
            }
            cleaned
        },
        FragmentKind::Math | FragmentKind::List => fragment.to_string(),
    };

    let mut doc = String::with_capacity(1024 + body.len());
    // Writing into a String cannot fail
    let _ = write!(
        doc,
        r"\documentclass[{font_size}]{{article}}
\usepackage[paperwidth={width},paperheight=20cm,margin=0.3cm]{{geometry}}
\usepackage{{amsmath,amssymb,amsfonts}}
\usepackage{{xcolor}}
\usepackage{{helvet}}
\usepackage{{enumitem}}
\renewcommand{{\familydefault}}{{\sfdefault}}
\definecolor{{beamerblue}}{{rgb}}{{{accent}}}
\setlength{{\parindent}}{{0pt}}
\setlength{{\parskip}}{{0.5em}}
\setlist[itemize]{{leftmargin=1.5em,itemsep=0.3em,parsep=0pt}}
\setlist[enumerate]{{leftmargin=1.5em,itemsep=0.3em,parsep=0pt}}
\renewcommand{{\labelitemi}}{{\textcolor{{beamerblue}}{{$\blacktriangleright$}}}}
\renewcommand{{\labelenumi}}{{\textcolor{{beamerblue}}{{\arabic{{enumi}}.}}}}
",
        font_size = style.font_size,
        width = style.text_width,
        accent = style.accent_color,
    );

    for line in preamble.lines() {
        if line.contains(r"\usepackage")
            && !line.to_ascii_lowercase().contains("beamer")
            && !line.contains("geometry")
        {
            doc.push_str(line);
            doc.push('\n');
        }
    }

    doc.push_str("\\begin{document}\n\\pagestyle{empty}\n");
    doc.push_str(&body);
    doc.push_str("\n\\end{document}\n");
    Some(doc)
}
