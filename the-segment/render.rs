//! Splits a segment into alternating literal-text and tag spans.
//!
//! Rendering is pure and never fails. Tag positions that do not fit the text
//! (stale after an edit, or simply out of range) are clamped to the text
//! bounds; callers that hold edited text re-align tags first, see
//! [`crate::align`].

use std::iter;

use crate::{
  marker,
  model::{
    Segment,
    Tag,
  },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
  Text(&'a str),
  Tag(&'a Tag),
}

impl<'a> Span<'a> {
  pub fn as_text(&self) -> Option<&'a str> {
    match self {
      Self::Text(text) => Some(*text),
      Self::Tag(_) => None,
    }
  }

  pub fn as_tag(&self) -> Option<&'a Tag> {
    match self {
      Self::Text(_) => None,
      Self::Tag(tag) => Some(*tag),
    }
  }
}

/// Tags ordered by position; ties keep their stored order.
pub fn sorted_tags(tags: &[Tag]) -> Vec<&Tag> {
  let mut sorted: Vec<&Tag> = tags.iter().collect();
  sorted.sort_by_key(|tag| tag.position);
  sorted
}

pub fn render(segment: &Segment) -> Vec<Span<'_>> {
  let text = segment.text.as_str();
  // byte offset of every char boundary, including the end of the text
  let bounds: Vec<usize> = text
    .char_indices()
    .map(|(byte, _)| byte)
    .chain(iter::once(text.len()))
    .collect();
  let len = bounds.len() - 1;

  let mut spans = Vec::with_capacity(segment.tags.len() * 2 + 1);
  let mut cursor = 0;

  for tag in sorted_tags(&segment.tags) {
    if cursor < tag.position {
      let literal = char_slice(text, &bounds, cursor, tag.position);
      if !literal.is_empty() {
        spans.push(Span::Text(literal));
      }
    }
    spans.push(Span::Tag(tag));
    cursor = cursor.max(tag.position.saturating_add(tag.marker_len()));
  }

  let rest = char_slice(text, &bounds, cursor, len);
  if !rest.is_empty() {
    spans.push(Span::Text(rest));
  }

  spans
}

fn char_slice<'a>(text: &'a str, bounds: &[usize], start: usize, end: usize) -> &'a str {
  let last = bounds.len() - 1;
  let start = bounds[start.min(last)];
  let end = bounds[end.min(last)];
  if start < end { &text[start..end] } else { "" }
}

/// Rebuilds segment text from spans, writing each tag's marker in its place.
pub fn reconstruct(spans: &[Span<'_>]) -> String {
  let mut text = String::new();
  for span in spans {
    match span {
      Span::Text(literal) => text.push_str(literal),
      Span::Tag(tag) => text.push_str(&marker::encode(tag.tag_type)),
    }
  }
  text
}

#[cfg(test)]
mod tests {
  use quickcheck::TestResult;

  use super::*;
  use crate::model::TagType;

  fn tag_type(n: u8) -> TagType {
    TagType::ALL[n as usize % TagType::ALL.len()]
  }

  /// Builds a consistent segment from literal pieces, each followed by a
  /// tag of the given type.
  fn build(pieces: &[(String, u8)], tail: &str) -> Segment {
    let mut text = String::new();
    let mut tags = Vec::new();
    for (literal, n) in pieces {
      text.push_str(literal);
      let tag_type = tag_type(*n);
      tags.push(Tag::new(tag_type, text.chars().count()));
      text.push_str(&marker::encode(tag_type));
    }
    text.push_str(tail);
    Segment::new(text, tags)
  }

  #[test]
  fn splits_paired_tags() {
    let segment = Segment::new("Hello ⟨bpt⟩world⟨ept⟩!", vec![
      Tag::new(TagType::Bpt, 6),
      Tag::new(TagType::Ept, 16),
    ]);
    let spans = render(&segment);
    assert_eq!(spans, [
      Span::Text("Hello "),
      Span::Tag(&segment.tags[0]),
      Span::Text("world"),
      Span::Tag(&segment.tags[1]),
      Span::Text("!"),
    ]);
    assert_eq!(reconstruct(&spans), segment.text);
  }

  #[test]
  fn sorts_unsorted_storage() {
    let segment = Segment::new("⟨ph⟩ a ⟨x⟩", vec![
      Tag::new(TagType::X, 7),
      Tag::new(TagType::Ph, 0),
    ]);
    let spans = render(&segment);
    assert_eq!(spans, [
      Span::Tag(&segment.tags[1]),
      Span::Text(" a "),
      Span::Tag(&segment.tags[0]),
    ]);
  }

  #[test]
  fn ties_keep_stored_order() {
    let segment = Segment::new("ab", vec![
      Tag::new(TagType::Ph, 1).with_id("first"),
      Tag::new(TagType::Ph, 1).with_id("second"),
    ]);
    let ids: Vec<_> = render(&segment)
      .iter()
      .filter_map(Span::as_tag)
      .map(|tag| tag.id.as_deref())
      .collect();
    assert_eq!(ids, [Some("first"), Some("second")]);
  }

  #[test]
  fn untagged_segments() {
    assert_eq!(render(&Segment::plain("just text")), [Span::Text(
      "just text"
    )]);
    assert!(render(&Segment::plain("")).is_empty());
  }

  #[test]
  fn stale_positions_are_clamped() {
    let segment = Segment::new("short", vec![Tag::new(TagType::Bpt, 40)]);
    assert_eq!(render(&segment), [
      Span::Text("short"),
      Span::Tag(&segment.tags[0])
    ]);

    // marker would run past the end of the text
    let segment = Segment::new("ab⟨b", vec![Tag::new(TagType::Bpt, 2)]);
    assert_eq!(render(&segment), [
      Span::Text("ab"),
      Span::Tag(&segment.tags[0])
    ]);

    // overlapping markers never emit text twice
    let segment = Segment::new("⟨bpt⟩tail", vec![
      Tag::new(TagType::Bpt, 0),
      Tag::new(TagType::X, 1),
    ]);
    assert_eq!(render(&segment), [
      Span::Tag(&segment.tags[0]),
      Span::Tag(&segment.tags[1]),
      Span::Text("tail"),
    ]);
  }

  #[test]
  fn multibyte_text() {
    let segment = Segment::new("¡Hola ⟨ph⟩ señor!", vec![Tag::new(TagType::Ph, 6)]);
    assert_eq!(render(&segment), [
      Span::Text("¡Hola "),
      Span::Tag(&segment.tags[0]),
      Span::Text(" señor!"),
    ]);
  }

  quickcheck::quickcheck! {
      fn reconstructs_text(pieces: Vec<(String, u8)>, tail: String) -> bool {
          let segment = build(&pieces, &tail);
          reconstruct(&render(&segment)) == segment.text
      }

      fn rendering_is_idempotent(pieces: Vec<(String, u8)>, tail: String) -> bool {
          let mut segment = build(&pieces, &tail);
          let first: Vec<_> = render(&segment).into_iter().map(owned).collect();
          segment.tags.reverse();
          let second: Vec<_> = render(&segment).into_iter().map(owned).collect();
          first == second && first == render(&segment).into_iter().map(owned).collect::<Vec<_>>()
      }

      fn arbitrary_positions_never_panic(text: String, tags: Vec<(u8, usize)>) -> TestResult {
          let tags = tags
              .into_iter()
              .map(|(n, position)| Tag::new(tag_type(n), position))
              .collect();
          let segment = Segment::new(text, tags);
          let spans = render(&segment);
          TestResult::from_bool(spans.iter().filter(|span| span.as_tag().is_some()).count() == segment.tags.len())
      }
  }

  fn owned(span: Span<'_>) -> Result<String, Tag> {
    match span {
      Span::Text(text) => Ok(text.to_string()),
      Span::Tag(tag) => Err(tag.clone()),
    }
  }
}
