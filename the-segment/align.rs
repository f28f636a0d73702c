//! Re-derives tag positions from freely edited text.
//!
//! Markers only name a tag type, so the k-th marker of a type is matched to
//! the k-th tag of that type in original position order. When a segment
//! holds several tags of one type this is a heuristic, not a proven
//! correspondence. The per-type count check is the safety net: an edit that
//! adds or drops a marker is rejected instead of guessed at.

use std::{
  collections::{
    BTreeMap,
    VecDeque,
  },
  fmt::Write as _,
};

use thiserror::Error;

use crate::{
  marker::{
    self,
    MarkerMatch,
  },
  model::{
    Tag,
    TagType,
  },
  render::sorted_tags,
};

pub type Result<T> = std::result::Result<T, AlignError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountMismatch {
  pub tag_type: TagType,
  /// Markers of this type found in the text.
  pub markers:  usize,
  /// Tags of this type in the original segment.
  pub tags:     usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignError {
  #[error("{}", format_mismatches(.0))]
  CountMismatch(Vec<CountMismatch>),
}

fn format_mismatches(mismatches: &[CountMismatch]) -> String {
  let mut out = String::from("tag marker count mismatch:");
  for (idx, mismatch) in mismatches.iter().enumerate() {
    let sep = if idx == 0 { " " } else { ", " };
    let _ = write!(
      out,
      "{sep}{} has {} marker(s) for {} tag(s)",
      marker::encode(mismatch.tag_type),
      mismatch.markers,
      mismatch.tags
    );
  }
  out
}

/// Tags carrying positions re-derived from an edited text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
  /// Ordered by their new position.
  pub tags:      Vec<Tag>,
  /// The relative order of tags across types differs from the original.
  pub reordered: bool,
}

/// Every tag type whose marker count in `text` differs from its tag count.
pub fn count_mismatches(text: &str, tags: &[Tag]) -> Vec<CountMismatch> {
  mismatches_for(&marker::find_all(text), tags)
}

/// Checks the per-type marker counts and returns the markers found.
pub fn check_counts(text: &str, tags: &[Tag]) -> Result<Vec<MarkerMatch>> {
  let markers = marker::find_all(text);
  let mismatches = mismatches_for(&markers, tags);
  if mismatches.is_empty() {
    Ok(markers)
  } else {
    Err(AlignError::CountMismatch(mismatches))
  }
}

pub fn align(text: &str, tags: &[Tag]) -> Result<Alignment> {
  let markers = check_counts(text, tags)?;

  let original = sorted_tags(tags);
  let mut queues: BTreeMap<TagType, VecDeque<(usize, &Tag)>> = BTreeMap::new();
  for (rank, tag) in original.iter().enumerate() {
    queues
      .entry(tag.tag_type)
      .or_default()
      .push_back((rank, *tag));
  }

  let mut ranks = Vec::with_capacity(markers.len());
  let mut aligned = Vec::with_capacity(markers.len());
  for found in &markers {
    let Some((rank, tag)) = queues
      .get_mut(&found.tag_type)
      .and_then(VecDeque::pop_front)
    else {
      continue;
    };
    ranks.push(rank);
    aligned.push(Tag {
      position: found.offset,
      ..tag.clone()
    });
  }

  let reordered = ranks.windows(2).any(|pair| pair[0] > pair[1]);
  if reordered {
    log::warn!("tag order changed while re-aligning {} tag(s)", aligned.len());
  }

  Ok(Alignment {
    tags: aligned,
    reordered,
  })
}

fn mismatches_for(markers: &[MarkerMatch], tags: &[Tag]) -> Vec<CountMismatch> {
  let mut counts: BTreeMap<TagType, (usize, usize)> = BTreeMap::new();
  for found in markers {
    counts.entry(found.tag_type).or_default().0 += 1;
  }
  for tag in tags {
    counts.entry(tag.tag_type).or_default().1 += 1;
  }

  counts
    .into_iter()
    .filter(|(_, (markers, tags))| markers != tags)
    .map(|(tag_type, (markers, tags))| {
      CountMismatch {
        tag_type,
        markers,
        tags,
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn paired() -> Vec<Tag> {
    vec![
      Tag::new(TagType::Bpt, 6).with_id("1").with_content("<b>"),
      Tag::new(TagType::Ept, 16).with_id("1").with_content("</b>"),
    ]
  }

  #[test]
  fn realigns_moved_markers() {
    let alignment = align("⟨bpt⟩Hallo⟨ept⟩ Welt!", &paired()).unwrap();
    assert!(!alignment.reordered);
    let positions: Vec<_> = alignment
      .tags
      .iter()
      .map(|tag| (tag.tag_type, tag.position, tag.content.as_deref()))
      .collect();
    assert_eq!(positions, [
      (TagType::Bpt, 0, Some("<b>")),
      (TagType::Ept, 10, Some("</b>")),
    ]);
  }

  #[test]
  fn rejects_count_mismatch() {
    let err = align("Hallo ⟨bpt⟩Welt!", &paired()).unwrap_err();
    assert_eq!(
      err,
      AlignError::CountMismatch(vec![CountMismatch {
        tag_type: TagType::Ept,
        markers:  0,
        tags:     1,
      }])
    );
    assert_eq!(
      err.to_string(),
      "tag marker count mismatch: ⟨ept⟩ has 0 marker(s) for 1 tag(s)"
    );

    let mismatches = count_mismatches("⟨bpt⟩⟨bpt⟩⟨ept⟩⟨ph⟩", &paired());
    assert_eq!(mismatches, [
      CountMismatch {
        tag_type: TagType::Bpt,
        markers:  2,
        tags:     1,
      },
      CountMismatch {
        tag_type: TagType::Ph,
        markers:  1,
        tags:     0,
      },
    ]);
  }

  #[test]
  fn untagged_text() {
    let alignment = align("plain ⟨span⟩ text", &[]).unwrap();
    assert!(alignment.tags.is_empty());
    assert!(check_counts("", &[]).unwrap().is_empty());
  }

  #[test]
  fn same_type_tags_keep_their_order() {
    let tags = vec![
      Tag::new(TagType::Ph, 9).with_id("b"),
      Tag::new(TagType::Ph, 2).with_id("a"),
    ];
    let alignment = align("⟨ph⟩ x ⟨ph⟩ y", &tags).unwrap();
    let ids: Vec<_> = alignment
      .tags
      .iter()
      .map(|tag| (tag.id.as_deref(), tag.position))
      .collect();
    assert_eq!(ids, [(Some("a"), 0), (Some("b"), 7)]);
    assert!(!alignment.reordered);
  }

  #[test]
  fn flags_cross_type_reorder() {
    let alignment = align("⟨ept⟩Hallo⟨bpt⟩", &paired()).unwrap();
    assert!(alignment.reordered);
    assert_eq!(alignment.tags[0].tag_type, TagType::Ept);
    assert_eq!(alignment.tags[0].position, 0);
    assert_eq!(alignment.tags[1].position, 10);
  }
}
