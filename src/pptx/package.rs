//! ZIP packaging of presentation parts.
use super::escape_xml;
use super::template::{CT_RELATIONSHIPS, XML_DECLARATION};
use crate::error::Result;
use std::fmt::Write as FmtWrite;
use std::io::{Cursor, Write};
use zip::write::{SimpleFileOptions, ZipWriter};

/// Relationship part under construction. Ids are assigned `rId1`, `rId2`, ...
#[derive(Debug, Default)]
pub(crate) struct Relationships {
    entries: Vec<(String, &'static str, String)>,
}

impl Relationships {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a relationship and return its id.
    pub(crate) fn add(&mut self, rel_type: &'static str, target: impl Into<String>) -> String {
        let id = format!("rId{}", self.entries.len() + 1);
        self.entries.push((id.clone(), rel_type, target.into()));
        id
    }

    pub(crate) fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(256 + self.entries.len() * 160);
        xml.push_str(XML_DECLARATION);
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (id, rel_type, target) in &self.entries {
            write!(
                xml,
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                id,
                rel_type,
                escape_xml(target)
            )?;
        }
        xml.push_str("</Relationships>");
        Ok(xml)
    }
}

/// `[Content_Types].xml` under construction.
#[derive(Debug, Default)]
pub(crate) struct ContentTypes {
    defaults: Vec<(&'static str, &'static str)>,
    overrides: Vec<(String, &'static str)>,
}

impl ContentTypes {
    pub(crate) fn new() -> Self {
        let mut types = Self::default();
        types.add_default("rels", CT_RELATIONSHIPS);
        types.add_default("xml", "application/xml");
        types
    }

    pub(crate) fn add_default(&mut self, extension: &'static str, content_type: &'static str) {
        if !self.defaults.iter().any(|(ext, _)| *ext == extension) {
            self.defaults.push((extension, content_type));
        }
    }

    /// Register a part by its package path (without the leading slash).
    pub(crate) fn add_override(&mut self, part: &str, content_type: &'static str) {
        self.overrides.push((format!("/{}", part), content_type));
    }

    pub(crate) fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(512 + self.overrides.len() * 160);
        xml.push_str(XML_DECLARATION);
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
        for (extension, content_type) in &self.defaults {
            write!(
                xml,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                extension, content_type
            )?;
        }
        for (part, content_type) in &self.overrides {
            write!(
                xml,
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(part),
                content_type
            )?;
        }
        xml.push_str("</Types>");
        Ok(xml)
    }
}

/// In-memory ZIP writer for package parts.
pub(crate) struct PackageWriter {
    zip_writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl PackageWriter {
    pub(crate) fn new() -> Self {
        Self {
            zip_writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Add a part, deflated. Media parts are already compressed and are stored.
    pub(crate) fn add_part(&mut self, path: &str, content: &[u8]) -> Result<()> {
        let method = if path.starts_with("ppt/media/") {
            zip::CompressionMethod::Stored
        } else {
            zip::CompressionMethod::Deflated
        };
        let options = SimpleFileOptions::default().compression_method(method);
        self.zip_writer.start_file(path, options)?;
        self.zip_writer.write_all(content)?;
        Ok(())
    }

    pub(crate) fn finish_to_bytes(self) -> Result<Vec<u8>> {
        let cursor = self.zip_writer.finish()?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pptx::template::REL_IMAGE;

    #[test]
    fn test_relationship_ids() {
        let mut rels = Relationships::new();
        assert_eq!(rels.add(REL_IMAGE, "../media/image1.png"), "rId1");
        assert_eq!(rels.add(REL_IMAGE, "../media/image2.png"), "rId2");
        let xml = rels.to_xml().unwrap();
        assert!(xml.contains(r#"Id="rId2""#));
        assert!(xml.contains("../media/image2.png"));
    }

    #[test]
    fn test_content_type_defaults_are_unique() {
        let mut types = ContentTypes::new();
        types.add_default("png", "image/png");
        types.add_default("png", "image/png");
        types.add_override("ppt/slides/slide1.xml", "x");
        let xml = types.to_xml().unwrap();
        assert_eq!(xml.matches(r#"Extension="png""#).count(), 1);
        assert!(xml.contains(r#"PartName="/ppt/slides/slide1.xml""#));
    }

    #[test]
    fn test_package_is_a_zip() {
        let mut writer = PackageWriter::new();
        writer.add_part("a.xml", b"<a/>").unwrap();
        writer.add_part("ppt/media/image1.png", b"\x89PNG").unwrap();
        let bytes = writer.finish_to_bytes().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.by_name("a.xml").unwrap().size(), 4);
    }
}
