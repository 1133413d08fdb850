use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("constant patterns always build")
});

/// Escape the five XML special characters for text and attribute values.
///
/// ```
/// use beamer_reveal::pptx::escape_xml;
/// assert_eq!(escape_xml("Fourier & <Laplace>"), "Fourier &amp; &lt;Laplace&gt;");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
}
