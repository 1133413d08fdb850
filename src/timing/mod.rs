//! Click-driven visibility animation for one slide.
//!
//! A [`TimingTree`] is built incrementally from appear/disappear calls and moves
//! through three stages: empty, root created, and main sequence created. Once
//! the sequence exists it holds click nodes in increasing index order, each
//! with the effects that fire on that click. A tree that never saw an
//! `appear` stays empty and is not serialised at all.
//!
//! # Example
//!
//! ```
//! use beamer_reveal::timing::{EffectKind, TimingTree};
//!
//! let mut tree = TimingTree::new();
//! tree.appear(2, 0).unwrap();
//! tree.appear(3, 1).unwrap();
//! tree.disappear(2, 1).unwrap();
//!
//! assert_eq!(tree.click_count(), 2);
//! let events = tree.events();
//! assert_eq!(events[2].kind, EffectKind::Disappear);
//! ```

pub mod xml;

pub use xml::{parse_timing_xml, to_xml};

use crate::error::TimingError;
use smallvec::SmallVec;

/// Shape identifier within one slide.
pub type ShapeId = u32;

/// What an effect does to its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Entrance: the shape becomes visible
    Appear,
    /// Exit: the shape becomes hidden
    Disappear,
}

impl EffectKind {
    /// Preset class of the effect node.
    pub fn preset_class(self) -> &'static str {
        match self {
            EffectKind::Appear => "entr",
            EffectKind::Disappear => "exit",
        }
    }

    /// Value written to `style.visibility`.
    pub fn visibility(self) -> &'static str {
        match self {
            EffectKind::Appear => "visible",
            EffectKind::Disappear => "hidden",
        }
    }

    pub fn from_visibility(value: &str) -> Option<Self> {
        match value {
            "visible" => Some(EffectKind::Appear),
            "hidden" => Some(EffectKind::Disappear),
            _ => None,
        }
    }

    pub fn from_preset_class(class: &str) -> Option<Self> {
        match class {
            "entr" => Some(EffectKind::Appear),
            "exit" => Some(EffectKind::Disappear),
            _ => None,
        }
    }
}

/// A visibility change of one shape at one click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationEvent {
    pub shape_id: ShapeId,
    pub click_index: usize,
    pub kind: EffectKind,
}

impl AnimationEvent {
    #[inline]
    pub fn appear(shape_id: ShapeId, click_index: usize) -> Self {
        Self {
            shape_id,
            click_index,
            kind: EffectKind::Appear,
        }
    }

    #[inline]
    pub fn disappear(shape_id: ShapeId, click_index: usize) -> Self {
        Self {
            shape_id,
            click_index,
            kind: EffectKind::Disappear,
        }
    }
}

/// Effect node: flips one shape's visibility with zero duration and a hold fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
    pub shape_id: ShapeId,
    pub kind: EffectKind,
}

/// All effects fired by one click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickNode {
    pub index: usize,
    pub effects: SmallVec<[Effect; 2]>,
}

impl ClickNode {
    fn new(index: usize) -> Self {
        Self {
            index,
            effects: SmallVec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct MainSequence {
    clicks: Vec<ClickNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum TreeState {
    #[default]
    Empty,
    RootCreated,
    SequenceCreated(MainSequence),
}

/// The timing tree of one slide.
///
/// A slide has at most one tree and a tree has at most one main sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimingTree {
    state: TreeState,
}

impl TimingTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree by applying `events` in order.
    pub fn from_events<'e, I>(events: I) -> Result<Self, TimingError>
    where
        I: IntoIterator<Item = &'e AnimationEvent>,
    {
        let mut tree = Self::new();
        for event in events {
            tree.apply(event)?;
        }
        Ok(tree)
    }

    /// Create the root node if missing.
    pub fn ensure_root(&mut self) {
        if self.state == TreeState::Empty {
            self.state = TreeState::RootCreated;
        }
    }

    /// Create the root and the main sequence if missing.
    pub fn ensure_sequence(&mut self) {
        self.ensure_root();
        if self.state == TreeState::RootCreated {
            self.state = TreeState::SequenceCreated(MainSequence::default());
        }
    }

    fn sequence(&self) -> Option<&MainSequence> {
        match &self.state {
            TreeState::SequenceCreated(sequence) => Some(sequence),
            _ => None,
        }
    }

    /// Apply one event.
    pub fn apply(&mut self, event: &AnimationEvent) -> Result<(), TimingError> {
        match event.kind {
            EffectKind::Appear => self.appear(event.shape_id, event.click_index),
            EffectKind::Disappear => self.disappear(event.shape_id, event.click_index),
        }
    }

    /// Make `shape_id` visible on click `click_index`.
    ///
    /// Reuses the click node for `click_index` when it exists; otherwise
    /// `click_index` must be the next index, and a node is appended. Any other
    /// index fails with [`TimingError::ClickOutOfOrder`] and leaves the tree
    /// unchanged.
    pub fn appear(&mut self, shape_id: ShapeId, click_index: usize) -> Result<(), TimingError> {
        let next = self.click_count();
        if click_index > next {
            return Err(TimingError::ClickOutOfOrder {
                next,
                requested: click_index,
            });
        }

        self.ensure_sequence();
        if let TreeState::SequenceCreated(sequence) = &mut self.state {
            if click_index == next {
                sequence.clicks.push(ClickNode::new(click_index));
            }
            if let Some(node) = sequence.clicks.get_mut(click_index) {
                node.effects.push(Effect {
                    shape_id,
                    kind: EffectKind::Appear,
                });
            }
        }
        Ok(())
    }

    /// Hide `shape_id` on click `click_index`, concurrently with whatever
    /// else that click fires.
    ///
    /// The click node must already exist; otherwise the call fails with
    /// [`TimingError::NoClickNode`] and the tree is untouched.
    pub fn disappear(&mut self, shape_id: ShapeId, click_index: usize) -> Result<(), TimingError> {
        let node = match &mut self.state {
            TreeState::SequenceCreated(sequence) => sequence.clicks.get_mut(click_index),
            _ => None,
        };
        let node = node.ok_or(TimingError::NoClickNode { click_index })?;
        node.effects.push(Effect {
            shape_id,
            kind: EffectKind::Disappear,
        });
        Ok(())
    }

    /// Whether nothing has been created yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.state == TreeState::Empty
    }

    #[inline]
    pub fn has_root(&self) -> bool {
        self.state != TreeState::Empty
    }

    #[inline]
    pub fn has_sequence(&self) -> bool {
        self.sequence().is_some()
    }

    /// Click nodes in index order.
    pub fn clicks(&self) -> &[ClickNode] {
        self.sequence().map(|s| s.clicks.as_slice()).unwrap_or_default()
    }

    #[inline]
    pub fn click_count(&self) -> usize {
        self.clicks().len()
    }

    /// Number of nodes: root, sequence, click nodes and effect nodes.
    pub fn node_count(&self) -> usize {
        match &self.state {
            TreeState::Empty => 0,
            TreeState::RootCreated => 1,
            TreeState::SequenceCreated(sequence) => {
                2 + sequence
                    .clicks
                    .iter()
                    .map(|c| 1 + c.effects.len())
                    .sum::<usize>()
            },
        }
    }

    /// Every effect as an event, in click order then insertion order.
    pub fn events(&self) -> Vec<AnimationEvent> {
        self.clicks()
            .iter()
            .flat_map(|click| {
                click.effects.iter().map(move |effect| AnimationEvent {
                    shape_id: effect.shape_id,
                    click_index: click.index,
                    kind: effect.kind,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages() {
        let mut tree = TimingTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 0);

        tree.ensure_root();
        tree.ensure_root();
        assert!(tree.has_root());
        assert!(!tree.has_sequence());
        assert_eq!(tree.node_count(), 1);

        tree.ensure_sequence();
        tree.ensure_sequence();
        assert!(tree.has_sequence());
        assert_eq!(tree.node_count(), 2);
        assert_eq!(tree.click_count(), 0);

        tree.appear(2, 0).unwrap();
        assert!(tree.has_sequence());
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn test_appear_reuses_click_node() {
        let mut tree = TimingTree::new();
        tree.appear(2, 0).unwrap();
        tree.appear(3, 0).unwrap();
        assert_eq!(tree.click_count(), 1);
        assert_eq!(tree.clicks()[0].effects.len(), 2);
    }

    #[test]
    fn test_appear_rejects_gaps() {
        let mut tree = TimingTree::new();
        let err = tree.appear(2, 1).unwrap_err();
        assert_eq!(
            err,
            TimingError::ClickOutOfOrder {
                next: 0,
                requested: 1
            }
        );
        assert!(tree.is_empty());
    }

    #[test]
    fn test_disappear_shares_click() {
        let mut tree = TimingTree::new();
        tree.appear(2, 0).unwrap();
        tree.appear(3, 1).unwrap();
        tree.disappear(2, 1).unwrap();

        assert_eq!(tree.click_count(), 2);
        let click = &tree.clicks()[1];
        assert_eq!(click.effects[0].kind, EffectKind::Appear);
        assert_eq!(click.effects[1].kind, EffectKind::Disappear);
        assert_eq!(click.effects[1].shape_id, 2);
    }

    #[test]
    fn test_disappear_without_click_is_rejected() {
        let mut tree = TimingTree::new();
        assert_eq!(
            tree.disappear(2, 0),
            Err(TimingError::NoClickNode { click_index: 0 })
        );
        assert!(tree.is_empty());

        tree.appear(2, 0).unwrap();
        let before = tree.clone();
        let nodes = tree.node_count();
        assert!(tree.disappear(2, 1).is_err());
        assert_eq!(tree.node_count(), nodes);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_events_round_trip_through_from_events() {
        let events = vec![
            AnimationEvent::appear(2, 0),
            AnimationEvent::appear(3, 1),
            AnimationEvent::disappear(2, 1),
            AnimationEvent::appear(4, 2),
        ];
        let tree = TimingTree::from_events(&events).unwrap();
        assert_eq!(tree.events(), events);
    }

    #[test]
    fn test_effect_kind_names() {
        assert_eq!(EffectKind::Appear.preset_class(), "entr");
        assert_eq!(EffectKind::Disappear.visibility(), "hidden");
        assert_eq!(EffectKind::from_visibility("visible"), Some(EffectKind::Appear));
        assert_eq!(EffectKind::from_preset_class("emph"), None);
    }
}
