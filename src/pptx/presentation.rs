//! Presentation writer.
use super::escape_xml;
use super::package::{ContentTypes, PackageWriter, Relationships};
use super::slide::Slide;
use super::template::*;
use crate::error::Result;
use crate::units::inches_to_emu;
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// First id in the slide id list (values below 256 are reserved).
const FIRST_SLIDE_ID: u32 = 256;

/// A presentation being assembled in memory.
///
/// # Examples
///
/// ```no_run
/// use beamer_reveal::pptx::Presentation;
/// use beamer_reveal::units::EmuRect;
///
/// # fn main() -> beamer_reveal::Result<()> {
/// let mut pres = Presentation::widescreen();
/// let slide = pres.add_slide();
/// slide.add_title("Results", EmuRect::from_inches(1.0, 0.3, 11.333, 0.8), 32.0);
/// pres.save("results.pptx")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Presentation {
    slides: Vec<Slide>,
    /// Slide width in EMUs
    width: i64,
    /// Slide height in EMUs
    height: i64,
    title: String,
    author: String,
}

impl Presentation {
    /// Create an empty presentation of the given slide size (EMUs).
    pub fn new(width: i64, height: i64) -> Self {
        Self {
            slides: Vec::new(),
            width,
            height,
            title: String::new(),
            author: String::new(),
        }
    }

    /// 13.333 in x 7.5 in.
    pub fn widescreen() -> Self {
        Self::from_inches(13.333, 7.5)
    }

    pub fn from_inches(width: f64, height: f64) -> Self {
        Self::new(inches_to_emu(width), inches_to_emu(height))
    }

    /// Set the document title and author written to the core properties.
    pub fn set_metadata(&mut self, title: &str, author: &str) {
        self.title = title.to_string();
        self.author = author.to_string();
    }

    /// Append an empty slide.
    pub fn add_slide(&mut self) -> &mut Slide {
        let index = self.slides.len();
        self.slides.push(Slide::new(FIRST_SLIDE_ID + index as u32));
        &mut self.slides[index]
    }

    #[inline]
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    #[inline]
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    #[inline]
    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    #[inline]
    pub fn slide_width(&self) -> i64 {
        self.width
    }

    #[inline]
    pub fn slide_height(&self) -> i64 {
        self.height
    }

    /// Serialise the whole package.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = PackageWriter::new();
        let mut types = ContentTypes::new();

        let mut pres_rels = Relationships::new();
        pres_rels.add(REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml");
        pres_rels.add(REL_THEME, "theme/theme1.xml");
        pres_rels.add(REL_PRES_PROPS, "presProps.xml");

        let mut slide_rel_ids = Vec::with_capacity(self.slides.len());
        let mut media_index = 0usize;
        for (i, slide) in self.slides.iter().enumerate() {
            let number = i + 1;
            let mut rels = Relationships::new();
            rels.add(REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml");

            let mut image_rel_ids = Vec::with_capacity(slide.pictures().len());
            for picture in slide.pictures() {
                media_index += 1;
                let extension = picture.format.extension();
                let media_name = format!("image{}.{}", media_index, extension);
                writer.add_part(&format!("ppt/media/{}", media_name), picture.data())?;
                types.add_default(extension, picture.format.mime_type());
                image_rel_ids.push(rels.add(REL_IMAGE, format!("../media/{}", media_name)));
            }

            let part = format!("ppt/slides/slide{}.xml", number);
            writer.add_part(&part, slide.to_xml(&image_rel_ids)?.as_bytes())?;
            writer.add_part(
                &format!("ppt/slides/_rels/slide{}.xml.rels", number),
                rels.to_xml()?.as_bytes(),
            )?;
            types.add_override(&part, CT_SLIDE);
            slide_rel_ids.push(pres_rels.add(REL_SLIDE, format!("slides/slide{}.xml", number)));
        }

        writer.add_part("ppt/presentation.xml", self.presentation_xml(&slide_rel_ids)?.as_bytes())?;
        writer.add_part("ppt/_rels/presentation.xml.rels", pres_rels.to_xml()?.as_bytes())?;
        writer.add_part("ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER_XML.as_bytes())?;
        writer.add_part(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            SLIDE_MASTER_RELS_XML.as_bytes(),
        )?;
        writer.add_part("ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT_XML.as_bytes())?;
        writer.add_part(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            SLIDE_LAYOUT_RELS_XML.as_bytes(),
        )?;
        writer.add_part("ppt/theme/theme1.xml", THEME_XML.as_bytes())?;
        writer.add_part("ppt/presProps.xml", PRES_PROPS_XML.as_bytes())?;
        writer.add_part("docProps/core.xml", self.core_props_xml().as_bytes())?;
        writer.add_part("docProps/app.xml", self.app_props_xml().as_bytes())?;

        let mut root_rels = Relationships::new();
        root_rels.add(REL_OFFICE_DOCUMENT, "ppt/presentation.xml");
        root_rels.add(REL_CORE_PROPS, "docProps/core.xml");
        root_rels.add(REL_EXTENDED_PROPS, "docProps/app.xml");
        writer.add_part("_rels/.rels", root_rels.to_xml()?.as_bytes())?;

        types.add_override("ppt/presentation.xml", CT_PRESENTATION);
        types.add_override("ppt/slideMasters/slideMaster1.xml", CT_SLIDE_MASTER);
        types.add_override("ppt/slideLayouts/slideLayout1.xml", CT_SLIDE_LAYOUT);
        types.add_override("ppt/theme/theme1.xml", CT_THEME);
        types.add_override("ppt/presProps.xml", CT_PRES_PROPS);
        types.add_override("docProps/core.xml", CT_CORE_PROPS);
        types.add_override("docProps/app.xml", CT_EXTENDED_PROPS);
        writer.add_part("[Content_Types].xml", types.to_xml()?.as_bytes())?;

        writer.finish_to_bytes()
    }

    /// Write the package to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }

    fn presentation_xml(&self, slide_rel_ids: &[String]) -> Result<String> {
        let mut xml = String::with_capacity(1024 + slide_rel_ids.len() * 48);
        xml.push_str(XML_DECLARATION);
        write!(
            xml,
            r#"<p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" saveSubsetFonts="1">"#,
            NS_A, NS_R, NS_P
        )?;
        xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
        if !self.slides.is_empty() {
            xml.push_str("<p:sldIdLst>");
            for (slide, rel_id) in self.slides.iter().zip(slide_rel_ids) {
                write!(xml, r#"<p:sldId id="{}" r:id="{}"/>"#, slide.slide_id(), rel_id)?;
            }
            xml.push_str("</p:sldIdLst>");
        }
        write!(xml, r#"<p:sldSz cx="{}" cy="{}"/>"#, self.width, self.height)?;
        xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
        xml.push_str("</p:presentation>");
        Ok(xml)
    }

    fn core_props_xml(&self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
                r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
                r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
                "<dc:title>{}</dc:title><dc:creator>{}</dc:creator>",
                "</cp:coreProperties>"
            ),
            escape_xml(&self.title),
            escape_xml(&self.author)
        )
    }

    fn app_props_xml(&self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
                "<Application>beamer-reveal</Application><Slides>{}</Slides>",
                "</Properties>"
            ),
            self.slides.len()
        )
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::widescreen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::EmuRect;
    use std::io::{Cursor, Read};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut text = String::new();
        part.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn test_widescreen_size() {
        let pres = Presentation::widescreen();
        assert_eq!(pres.slide_width(), 12_191_695);
        assert_eq!(pres.slide_height(), 6_858_000);
        assert_eq!(pres.slide_count(), 0);
    }

    #[test]
    fn test_package_parts() {
        let mut pres = Presentation::widescreen();
        pres.set_metadata("Talk & Slides", "Ada");
        let slide = pres.add_slide();
        slide.add_title("One", EmuRect::default(), 32.0);
        let id = slide.add_picture(PNG.to_vec(), EmuRect::default(), "").unwrap();
        slide.timing_mut().appear(id, 0).unwrap();
        let second = pres.add_slide();
        second.add_picture(PNG.to_vec(), EmuRect::default(), "").unwrap();

        let bytes = pres.to_bytes().unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/slides/_rels/slide2.xml.rels",
            "ppt/media/image1.png",
            "ppt/media/image2.png",
            "ppt/theme/theme1.xml",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }

        let presentation = read_part(&bytes, "ppt/presentation.xml");
        assert!(presentation.contains(r#"<p:sldId id="256" r:id="rId4"/>"#));
        assert!(presentation.contains(r#"<p:sldId id="257" r:id="rId5"/>"#));

        let slide2_rels = read_part(&bytes, "ppt/slides/_rels/slide2.xml.rels");
        assert!(slide2_rels.contains("../media/image2.png"));

        let slide1 = read_part(&bytes, "ppt/slides/slide1.xml");
        assert!(slide1.contains("<p:timing>"));
        let slide2 = read_part(&bytes, "ppt/slides/slide2.xml");
        assert!(!slide2.contains("<p:timing>"));

        let types = read_part(&bytes, "[Content_Types].xml");
        assert!(types.contains(r#"Extension="png""#));
        assert!(types.contains("/ppt/slides/slide2.xml"));

        let core = read_part(&bytes, "docProps/core.xml");
        assert!(core.contains("Talk &amp; Slides"));
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");
        let mut pres = Presentation::default();
        pres.add_slide();
        pres.save(&path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
