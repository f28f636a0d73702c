//! Edit buffer of the selected translation unit.
//!
//! The buffer owns nothing but text. Tags stay with the document's target
//! segment and are joined back to the text only when a save is reconciled.

use std::ops::Range;

use the_segment::{
  TagType,
  TransUnit,
  UnitRef,
  marker,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
  unit: UnitRef,
  text: String,
}

impl EditBuffer {
  /// Seeds a buffer from the unit's target text, empty when it has none.
  pub fn seed(unit: UnitRef, trans_unit: &TransUnit) -> Self {
    let text = trans_unit
      .target
      .as_ref()
      .map(|target| target.text.clone())
      .unwrap_or_default();
    Self { unit, text }
  }

  pub fn unit(&self) -> UnitRef {
    self.unit
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn char_len(&self) -> usize {
    self.text.chars().count()
  }

  pub fn set_text(&mut self, text: impl Into<String>) {
    self.text = text.into();
  }

  /// Inserts at a char offset; offsets past the end append.
  pub fn insert(&mut self, char_idx: usize, s: &str) {
    let byte = self.byte_offset(char_idx);
    self.text.insert_str(byte, s);
  }

  pub fn insert_marker(&mut self, char_idx: usize, tag_type: TagType) {
    self.insert(char_idx, &marker::encode(tag_type));
  }

  /// Removes a char range, clamped to the text.
  pub fn remove(&mut self, range: Range<usize>) {
    let start = self.byte_offset(range.start);
    let end = self.byte_offset(range.end.max(range.start));
    self.text.replace_range(start..end, "");
  }

  /// Whether the buffer differs from the unit's stored target text.
  pub fn is_modified(&self, trans_unit: &TransUnit) -> bool {
    let stored = trans_unit
      .target
      .as_ref()
      .map_or("", |target| target.text.as_str());
    stored != self.text
  }

  fn byte_offset(&self, char_idx: usize) -> usize {
    self
      .text
      .char_indices()
      .nth(char_idx)
      .map_or(self.text.len(), |(byte, _)| byte)
  }
}

#[cfg(test)]
mod tests {
  use the_segment::{
    Segment,
    Tag,
  };

  use super::*;

  fn unit() -> TransUnit {
    TransUnit::new("u1", Segment::plain("Save ⟨ph⟩")).with_target(Segment::new(
      "Speichern ⟨ph⟩",
      vec![Tag::new(TagType::Ph, 10)],
    ))
  }

  #[test]
  fn seeds_from_target() {
    let buffer = EditBuffer::seed(UnitRef::new(0, 3), &unit());
    assert_eq!(buffer.text(), "Speichern ⟨ph⟩");
    assert_eq!(buffer.unit(), UnitRef::new(0, 3));
    assert!(!buffer.is_modified(&unit()));

    let untranslated = TransUnit::new("u2", Segment::plain("Open"));
    let buffer = EditBuffer::seed(UnitRef::new(0, 0), &untranslated);
    assert_eq!(buffer.text(), "");
    assert!(!buffer.is_modified(&untranslated));
  }

  #[test]
  fn edits_by_char_offset() {
    let mut buffer = EditBuffer::seed(UnitRef::new(0, 0), &unit());
    buffer.remove(0..10);
    assert_eq!(buffer.text(), "⟨ph⟩");
    buffer.insert(4, " sichern");
    buffer.insert(0, "Jetzt ");
    assert_eq!(buffer.text(), "Jetzt ⟨ph⟩ sichern");
    buffer.insert_marker(100, TagType::X);
    assert_eq!(buffer.text(), "Jetzt ⟨ph⟩ sichern⟨x⟩");
    assert_eq!(buffer.char_len(), 21);
    buffer.remove(18..40);
    assert_eq!(buffer.text(), "Jetzt ⟨ph⟩ sichern");
    assert!(buffer.is_modified(&unit()));

    buffer.set_text("Speichern ⟨ph⟩");
    assert!(!buffer.is_modified(&unit()));
  }
}
