//! Picture and title shapes.
use super::escape_xml;
use super::format::ImageFormat;
use crate::error::Result;
use crate::timing::ShapeId;
use crate::units::EmuRect;
use std::fmt::Write as FmtWrite;

/// A bitmap placed on a slide.
#[derive(Debug, Clone)]
pub struct PictureShape {
    pub id: ShapeId,
    pub(crate) data: Vec<u8>,
    pub format: ImageFormat,
    pub rect: EmuRect,
    pub description: String,
}

impl PictureShape {
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Append the `<p:pic>` element, embedding the image relationship `rel_id`.
    pub(crate) fn write_xml(&self, xml: &mut String, rel_id: &str) -> Result<()> {
        xml.push_str("<p:pic><p:nvPicPr>");
        write!(
            xml,
            r#"<p:cNvPr id="{}" name="Picture {}" descr="{}"/>"#,
            self.id,
            self.id,
            escape_xml(&self.description)
        )?;
        xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/>"#);
        xml.push_str("</p:nvPicPr><p:blipFill>");
        write!(xml, r#"<a:blip r:embed="{}"/>"#, rel_id)?;
        xml.push_str("<a:stretch><a:fillRect/></a:stretch></p:blipFill>");
        write_sp_pr(xml, &self.rect)?;
        xml.push_str("</p:pic>");
        Ok(())
    }
}

/// The slide title: a bold, unfilled text box.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleShape {
    pub id: ShapeId,
    pub text: String,
    pub rect: EmuRect,
    /// Font size in points
    pub font_size: f64,
}

impl TitleShape {
    pub(crate) fn write_xml(&self, xml: &mut String) -> Result<()> {
        xml.push_str("<p:sp><p:nvSpPr>");
        write!(xml, r#"<p:cNvPr id="{}" name="Title {}"/>"#, self.id, self.id)?;
        xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#);
        write_sp_pr(xml, &self.rect)?;
        xml.push_str(r#"<p:txBody><a:bodyPr wrap="square" anchor="ctr"><a:normAutofit/></a:bodyPr><a:lstStyle/><a:p>"#);
        // sz is in hundredths of a point
        write!(
            xml,
            r#"<a:r><a:rPr lang="en-US" sz="{}" b="1" dirty="0"/><a:t>{}</a:t></a:r>"#,
            (self.font_size * 100.0).round() as i64,
            escape_xml(&self.text)
        )?;
        xml.push_str("</a:p></p:txBody></p:sp>");
        Ok(())
    }
}

fn write_sp_pr(xml: &mut String, rect: &EmuRect) -> Result<()> {
    xml.push_str("<p:spPr><a:xfrm>");
    write!(xml, r#"<a:off x="{}" y="{}"/>"#, rect.x, rect.y)?;
    write!(xml, r#"<a:ext cx="{}" cy="{}"/>"#, rect.width, rect.height)?;
    xml.push_str(r#"</a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picture_xml() {
        let picture = PictureShape {
            id: 5,
            data: vec![0x89, b'P', b'N', b'G'],
            format: ImageFormat::Png,
            rect: EmuRect::from_inches(1.0, 1.2, 10.0, 2.0),
            description: "block 0 step 1".into(),
        };
        let mut xml = String::new();
        picture.write_xml(&mut xml, "rId2").unwrap();
        assert!(xml.contains(r#"<p:cNvPr id="5""#));
        assert!(xml.contains(r#"r:embed="rId2""#));
        assert!(xml.contains(r#"<a:off x="914400" y="1097280"/>"#));
        assert!(xml.contains(r#"<a:ext cx="9144000" cy="1828800"/>"#));
    }

    #[test]
    fn test_title_xml_escapes_text() {
        let title = TitleShape {
            id: 2,
            text: "Sets & <Maps>".into(),
            rect: EmuRect::from_inches(1.0, 0.3, 11.333, 0.8),
            font_size: 32.0,
        };
        let mut xml = String::new();
        title.write_xml(&mut xml).unwrap();
        assert!(xml.contains("Sets &amp; &lt;Maps&gt;"));
        assert!(xml.contains(r#"sz="3200" b="1""#));
    }
}
