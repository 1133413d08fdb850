//! `p:timing` serialisation and re-parsing.
//!
//! Layout of the generated markup:
//!
//! ```text
//! p:timing / p:tnLst / p:par / p:cTn[tmRoot]
//!   p:seq / p:cTn[mainSeq]
//!     p:par (one per click, start condition "indefinite")
//!       p:par (delay 0)
//!         p:par / p:cTn[presetClass=entr|exit] (clickEffect, then withEffect)
//!           p:set -> style.visibility = visible|hidden
//! ```
use super::{AnimationEvent, ClickNode, EffectKind, TimingTree};
use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Appear/disappear preset ("Appear" in the entrance and exit galleries).
const APPEAR_PRESET_ID: u32 = 1;

/// Serialise `tree` as a `<p:timing>` element.
///
/// Returns `None` when the tree has no main sequence; such a slide carries no
/// timing element at all.
pub fn to_xml(tree: &TimingTree) -> Option<String> {
    if !tree.has_sequence() {
        return None;
    }

    let mut xml = String::with_capacity(1024 + tree.node_count() * 512);
    xml.push_str("<p:timing><p:tnLst>");
    xml.push_str(r#"<p:par><p:cTn id="1" dur="indefinite" restart="never" nodeType="tmRoot">"#);
    xml.push_str(r#"<p:childTnLst><p:seq concurrent="1" nextAc="seek">"#);
    xml.push_str(r#"<p:cTn id="2" dur="indefinite" nodeType="mainSeq"><p:childTnLst>"#);

    let mut next_id = 3u32;
    for click in tree.clicks() {
        write_click(&mut xml, click, &mut next_id);
    }

    xml.push_str("</p:childTnLst></p:cTn>");
    xml.push_str(r#"<p:prevCondLst><p:cond evt="onPrev" delay="0"><p:tgtEl><p:sldTgt/></p:tgtEl></p:cond></p:prevCondLst>"#);
    xml.push_str(r#"<p:nextCondLst><p:cond evt="onNext" delay="0"><p:tgtEl><p:sldTgt/></p:tgtEl></p:cond></p:nextCondLst>"#);
    xml.push_str("</p:seq></p:childTnLst></p:cTn></p:par>");
    xml.push_str("</p:tnLst></p:timing>");
    Some(xml)
}

#[inline]
fn take_id(next_id: &mut u32) -> u32 {
    let id = *next_id;
    *next_id += 1;
    id
}

fn write_click(xml: &mut String, click: &ClickNode, next_id: &mut u32) {
    xml.push_str(&format!(
        r#"<p:par><p:cTn id="{}" fill="hold"><p:stCondLst><p:cond delay="indefinite"/></p:stCondLst><p:childTnLst>"#,
        take_id(next_id)
    ));
    xml.push_str(&format!(
        r#"<p:par><p:cTn id="{}" fill="hold"><p:stCondLst><p:cond delay="0"/></p:stCondLst><p:childTnLst>"#,
        take_id(next_id)
    ));

    for (i, effect) in click.effects.iter().enumerate() {
        let node_type = if i == 0 { "clickEffect" } else { "withEffect" };
        xml.push_str(&format!(
            r#"<p:par><p:cTn id="{}" presetID="{}" presetClass="{}" presetSubtype="0" fill="hold" grpId="0" nodeType="{}"><p:stCondLst><p:cond delay="0"/></p:stCondLst><p:childTnLst>"#,
            take_id(next_id),
            APPEAR_PRESET_ID,
            effect.kind.preset_class(),
            node_type
        ));
        xml.push_str(&format!(
            r#"<p:set><p:cBhvr><p:cTn id="{}" dur="1" fill="hold"><p:stCondLst><p:cond delay="0"/></p:stCondLst></p:cTn><p:tgtEl><p:spTgt spid="{}"/></p:tgtEl><p:attrNameLst><p:attrName>style.visibility</p:attrName></p:attrNameLst></p:cBhvr><p:to><p:strVal val="{}"/></p:to></p:set>"#,
            take_id(next_id),
            effect.shape_id,
            effect.kind.visibility()
        ));
        xml.push_str("</p:childTnLst></p:cTn></p:par>");
    }

    xml.push_str("</p:childTnLst></p:cTn></p:par>");
    xml.push_str("</p:childTnLst></p:cTn></p:par>");
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| std::str::from_utf8(&attr.value).ok().map(str::to_string))
}

/// Re-read the visibility events of a `<p:timing>` element.
///
/// Click indices are counted from the click-triggered (`delay="indefinite"`)
/// start conditions in document order. Effects that are not visibility
/// changes are ignored.
pub fn parse_timing_xml(xml: &str) -> Result<Vec<AnimationEvent>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut events = Vec::new();
    let mut click: Option<usize> = None;
    let mut preset_kind: Option<EffectKind> = None;
    let mut shape_id: Option<u32> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"cond" => {
                    if attribute(&e, b"delay").as_deref() == Some("indefinite") {
                        click = Some(click.map_or(0, |c| c + 1));
                    }
                },
                b"cTn" => {
                    if let Some(class) = attribute(&e, b"presetClass") {
                        preset_kind = EffectKind::from_preset_class(&class);
                        shape_id = None;
                    }
                },
                b"spTgt" => {
                    shape_id = attribute(&e, b"spid").and_then(|id| id.parse().ok());
                },
                b"strVal" => {
                    let kind = attribute(&e, b"val")
                        .as_deref()
                        .and_then(EffectKind::from_visibility)
                        .or(preset_kind);
                    if let (Some(kind), Some(shape_id)) = (kind, shape_id) {
                        let click_index = click.ok_or_else(|| {
                            Error::InvalidFormat(format!(
                                "effect on shape {} precedes any click",
                                shape_id
                            ))
                        })?;
                        events.push(AnimationEvent {
                            shape_id,
                            click_index,
                            kind,
                        });
                    }
                },
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {},
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> TimingTree {
        let mut tree = TimingTree::new();
        tree.appear(2, 0).unwrap();
        tree.appear(3, 1).unwrap();
        tree.disappear(2, 1).unwrap();
        tree.appear(4, 2).unwrap();
        tree
    }

    #[test]
    fn test_empty_tree_has_no_markup() {
        assert!(to_xml(&TimingTree::new()).is_none());

        let mut root_only = TimingTree::new();
        root_only.ensure_root();
        assert!(to_xml(&root_only).is_none());
    }

    #[test]
    fn test_structure() {
        let xml = to_xml(&sample_tree()).unwrap();
        assert!(xml.starts_with("<p:timing>"));
        assert!(xml.ends_with("</p:timing>"));
        assert_eq!(xml.matches(r#"nodeType="tmRoot""#).count(), 1);
        assert_eq!(xml.matches(r#"nodeType="mainSeq""#).count(), 1);
        assert_eq!(xml.matches(r#"delay="indefinite""#).count(), 3);
        assert_eq!(xml.matches(r#"nodeType="clickEffect""#).count(), 3);
        assert_eq!(xml.matches(r#"nodeType="withEffect""#).count(), 1);
        assert_eq!(xml.matches(r#"presetClass="exit""#).count(), 1);
        assert_eq!(xml.matches("<p:par>").count(), xml.matches("</p:par>").count());
    }

    #[test]
    fn test_node_ids_are_unique() {
        let xml = to_xml(&sample_tree()).unwrap();
        let mut ids: Vec<u32> = xml
            .split(r#"<p:cTn id=""#)
            .skip(1)
            .filter_map(|rest| rest.split('"').next()?.parse().ok())
            .collect();
        let count = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), count);
        assert_eq!(ids.first(), Some(&1));
    }

    #[test]
    fn test_round_trip() {
        let tree = sample_tree();
        let xml = to_xml(&tree).unwrap();
        let parsed = parse_timing_xml(&xml).unwrap();
        assert_eq!(parsed, tree.events());
        assert_eq!(TimingTree::from_events(&parsed).unwrap(), tree);
    }

    #[test]
    fn test_parse_effect_before_click_is_rejected() {
        let xml = r#"<p:timing xmlns:p="p"><p:set><p:cBhvr><p:tgtEl><p:spTgt spid="5"/></p:tgtEl></p:cBhvr><p:to><p:strVal val="visible"/></p:to></p:set></p:timing>"#;
        assert!(parse_timing_xml(xml).is_err());
    }

    #[test]
    fn test_parse_ignores_other_attributes() {
        let xml = r#"<p:timing xmlns:p="p"><p:cond delay="indefinite"/><p:spTgt spid="7"/><p:strVal val="red"/></p:timing>"#;
        assert!(parse_timing_xml(xml).unwrap().is_empty());
    }
}
