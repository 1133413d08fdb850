//! A slide under construction.
use super::format::ImageFormat;
use super::shape::{PictureShape, TitleShape};
use super::template::{NS_A, NS_P, NS_R, SP_TREE_HEADER, XML_DECLARATION};
use crate::error::{Error, Result};
use crate::timing::{ShapeId, TimingTree, to_xml as timing_xml};
use crate::units::EmuRect;
use std::fmt::Write as FmtWrite;

/// Shape id of the slide's shape tree; placed shapes start after it.
const SHAPE_TREE_ID: ShapeId = 1;

/// One slide: an optional title, ordered pictures and at most one timing tree.
#[derive(Debug, Clone)]
pub struct Slide {
    slide_id: u32,
    title: Option<TitleShape>,
    pictures: Vec<PictureShape>,
    timing: TimingTree,
    next_shape_id: ShapeId,
}

impl Slide {
    pub(crate) fn new(slide_id: u32) -> Self {
        Self {
            slide_id,
            title: None,
            pictures: Vec::new(),
            timing: TimingTree::new(),
            next_shape_id: SHAPE_TREE_ID + 1,
        }
    }

    /// Identifier in the presentation's slide list.
    #[inline]
    pub fn slide_id(&self) -> u32 {
        self.slide_id
    }

    fn allocate_shape_id(&mut self) -> ShapeId {
        let id = self.next_shape_id;
        self.next_shape_id += 1;
        id
    }

    /// Add the title text box.
    ///
    /// A slide has one title; calling this again replaces the text and box but
    /// keeps the original shape id.
    pub fn add_title(&mut self, text: &str, rect: EmuRect, font_size: f64) -> ShapeId {
        if let Some(title) = &mut self.title {
            title.text = text.to_string();
            title.rect = rect;
            title.font_size = font_size;
            return title.id;
        }
        let id = self.allocate_shape_id();
        self.title = Some(TitleShape {
            id,
            text: text.to_string(),
            rect,
            font_size,
        });
        id
    }

    #[inline]
    pub fn title(&self) -> Option<&str> {
        self.title.as_ref().map(|t| t.text.as_str())
    }

    /// Place a picture and return its shape id.
    ///
    /// Ids are allocated monotonically in placement order.
    pub fn add_picture(
        &mut self,
        data: Vec<u8>,
        rect: EmuRect,
        description: impl Into<String>,
    ) -> Result<ShapeId> {
        let format = ImageFormat::detect(&data)
            .ok_or_else(|| Error::InvalidFormat("unrecognised image data".to_string()))?;
        let id = self.allocate_shape_id();
        self.pictures.push(PictureShape {
            id,
            data,
            format,
            rect,
            description: description.into(),
        });
        Ok(id)
    }

    #[inline]
    pub fn pictures(&self) -> &[PictureShape] {
        &self.pictures
    }

    /// Number of picture shapes; the title is not counted.
    #[inline]
    pub fn shape_count(&self) -> usize {
        self.pictures.len()
    }

    /// Number of clicks needed to reveal everything on the slide.
    #[inline]
    pub fn click_count(&self) -> usize {
        self.timing.click_count()
    }

    #[inline]
    pub fn timing(&self) -> &TimingTree {
        &self.timing
    }

    #[inline]
    pub fn timing_mut(&mut self) -> &mut TimingTree {
        &mut self.timing
    }

    /// Slide XML. `image_rel_ids[i]` is the relationship id of picture `i`.
    pub(crate) fn to_xml(&self, image_rel_ids: &[String]) -> Result<String> {
        if image_rel_ids.len() != self.pictures.len() {
            return Err(Error::Xml(format!(
                "{} pictures but {} image relationships",
                self.pictures.len(),
                image_rel_ids.len()
            )));
        }

        let mut xml = String::with_capacity(2048 + self.pictures.len() * 768);
        xml.push_str(XML_DECLARATION);
        write!(
            xml,
            r#"<p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">"#,
            NS_A, NS_R, NS_P
        )?;
        xml.push_str("<p:cSld><p:spTree>");
        xml.push_str(SP_TREE_HEADER);

        if let Some(title) = &self.title {
            title.write_xml(&mut xml)?;
        }
        for (picture, rel_id) in self.pictures.iter().zip(image_rel_ids) {
            picture.write_xml(&mut xml, rel_id)?;
        }

        xml.push_str("</p:spTree></p:cSld>");
        xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
        if let Some(timing) = timing_xml(&self.timing) {
            xml.push_str(&timing);
        }
        xml.push_str("</p:sld>");
        Ok(xml)
    }
}
