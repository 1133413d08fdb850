//! Deck data model.
//!
//! A [`Deck`] is an ordered list of [`Frame`]s, each an ordered list of
//! [`ContentBlock`]s. Blocks carry their reveal items (the units of cumulative
//! disclosure) and the raw markup they came from.

pub mod parser;

pub use parser::parse_beamer;

/// Kind of a content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Run of paragraphs
    Text,
    /// `align`/`gather` group, one item per line
    MathAlignment,
    /// Bulleted list, one item per `\item`
    Itemize,
    /// Numbered list, one item per `\item`
    Enumerate,
    /// Verbatim listing, drawn by the static frame path
    Code,
    /// Single displayed equation
    DisplayMath,
}

impl BlockKind {
    /// Whether blocks of this kind are revealed item by item.
    #[inline]
    pub fn is_cumulative(self) -> bool {
        matches!(
            self,
            BlockKind::Text | BlockKind::MathAlignment | BlockKind::Itemize | BlockKind::Enumerate
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Text => "text",
            BlockKind::MathAlignment => "math_align",
            BlockKind::Itemize => "itemize",
            BlockKind::Enumerate => "enumerate",
            BlockKind::Code => "code",
            BlockKind::DisplayMath => "display_math",
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One semantic unit within a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub kind: BlockKind,
    /// The original markup fragment
    pub raw: String,
    /// Reveal items in order; empty for code blocks
    pub items: Vec<String>,
}

impl ContentBlock {
    pub fn new(kind: BlockKind, raw: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
            items,
        }
    }

    /// Convenience constructor for tests and programmatic decks.
    pub fn from_items<I, S>(kind: BlockKind, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        let raw = items.join("\n");
        Self { kind, raw, items }
    }

    /// Environment name used when re-typesetting the block.
    ///
    /// Math groups keep the environment they were written in (falling back to
    /// `align*`); lists map to `itemize`/`enumerate`.
    pub fn environment_name(&self) -> &str {
        match self.kind {
            BlockKind::Itemize => "itemize",
            BlockKind::Enumerate => "enumerate",
            _ => parser::begin_environment(&self.raw).unwrap_or("align*"),
        }
    }
}

/// One slide's worth of source content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// Frame title; empty when the frame has none
    pub title: String,
    /// Frame options such as `fragile`
    pub options: String,
    pub raw: String,
    pub blocks: Vec<ContentBlock>,
    /// Whether the frame contains a code listing
    pub has_code: bool,
}

impl Frame {
    pub fn new(title: impl Into<String>, blocks: Vec<ContentBlock>) -> Self {
        let has_code = blocks.iter().any(|b| b.kind == BlockKind::Code);
        Self {
            title: title.into(),
            blocks,
            has_code,
            ..Default::default()
        }
    }

    #[inline]
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

/// A parsed deck.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Deck {
    /// Everything before `\begin{document}`
    pub preamble: String,
    pub title: String,
    pub author: String,
    pub frames: Vec<Frame>,
}

impl Deck {
    pub fn has_code_frames(&self) -> bool {
        self.frames.iter().any(|f| f.has_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cumulative_kinds() {
        assert!(BlockKind::Text.is_cumulative());
        assert!(BlockKind::Enumerate.is_cumulative());
        assert!(!BlockKind::Code.is_cumulative());
        assert!(!BlockKind::DisplayMath.is_cumulative());
    }

    #[test]
    fn test_environment_name() {
        let gather = ContentBlock::new(
            BlockKind::MathAlignment,
            r"\begin{gather*}x\end{gather*}",
            vec!["x".into()],
        );
        assert_eq!(gather.environment_name(), "gather*");

        let bare = ContentBlock::new(BlockKind::MathAlignment, "no env here", vec![]);
        assert_eq!(bare.environment_name(), "align*");

        let list = ContentBlock::from_items(BlockKind::Enumerate, ["a", "b"]);
        assert_eq!(list.environment_name(), "enumerate");
    }

    #[test]
    fn test_frame_code_flag() {
        let frame = Frame::new(
            "Code",
            vec![ContentBlock::new(BlockKind::Code, "x", Vec::new())],
        );
        assert!(frame.has_code);
        assert!(frame.has_title());
        assert!(!Frame::new("  ", Vec::new()).has_title());
    }
}
