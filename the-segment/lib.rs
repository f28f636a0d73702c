//! Tag-position segment model for bilingual translation units.
//!
//! Inline tags live next to the segment text as position-anchored
//! descriptors. Inside the text each tag occupies a fixed-width marker
//! (`⟨bpt⟩`, `⟨ph⟩`, ...) starting at the tag's position, counted in chars.

pub mod align;
pub mod marker;
pub mod model;
pub mod navigation;
pub mod render;

pub use model::{
  Document,
  File,
  Segment,
  Tag,
  TagKind,
  TagType,
  TransUnit,
  UnitRef,
};
