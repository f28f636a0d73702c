//! Joins an edit buffer with its unit's original tags.
//!
//! Tags are never re-derived from edited text on this side: the save request
//! carries the verbatim text plus the untouched target tag list, and the
//! backend re-aligns markers against that list. [`preview`] performs the
//! same alignment locally, only to display what a save would produce.

use serde::{
  Deserialize,
  Serialize,
};
use the_segment::{
  Document,
  Segment,
  Tag,
  UnitRef,
  align::{
    self,
    AlignError,
  },
};
use thiserror::Error;

use crate::buffer::EditBuffer;

/// Body of a target update sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
  pub file_index:    usize,
  pub trans_unit_id: String,
  pub target_text:   String,
  /// The original target tags, unmodified.
  #[serde(default)]
  pub target_tags:   Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
  #[error("translation unit {0} does not exist")]
  UnitNotFound(UnitRef),
}

pub fn reconcile(document: &Document, buffer: &EditBuffer) -> Result<UpdateRequest, ReconcileError> {
  let unit = buffer.unit();
  let trans_unit = document
    .unit(unit)
    .ok_or(ReconcileError::UnitNotFound(unit))?;

  Ok(UpdateRequest {
    file_index:    unit.file_index,
    trans_unit_id: trans_unit.id.clone(),
    target_text:   buffer.text().to_string(),
    target_tags:   trans_unit.target_tags().to_vec(),
  })
}

/// What the edited target would look like once saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
  /// Buffer text with re-aligned tags, or without tags when alignment failed.
  pub segment:   Segment,
  pub error:     Option<AlignError>,
  pub reordered: bool,
}

pub fn preview(target: Option<&Segment>, buffer: &EditBuffer) -> Preview {
  let tags = target.map_or(&[][..], |target| target.tags.as_slice());
  match align::align(buffer.text(), tags) {
    Ok(alignment) => {
      Preview {
        segment:   Segment::new(buffer.text(), alignment.tags),
        error:     None,
        reordered: alignment.reordered,
      }
    },
    Err(err) => {
      Preview {
        segment:   Segment::plain(buffer.text()),
        error:     Some(err),
        reordered: false,
      }
    },
  }
}

#[cfg(test)]
mod tests {
  use the_segment::{
    File,
    TagType,
    TransUnit,
    render::{
      Span,
      render,
    },
  };

  use super::*;

  fn document() -> Document {
    let tags = vec![
      Tag::new(TagType::Bpt, 6).with_id("1"),
      Tag::new(TagType::Ept, 16).with_id("1"),
    ];
    Document {
      version: "1.2".to_string(),
      files:   vec![File {
        original:        "home.html".to_string(),
        source_language: "en".to_string(),
        target_language: Some("de".to_string()),
        datatype:        Some("html".to_string()),
        trans_units:     vec![
          TransUnit::new("hello", Segment::new("Hello ⟨bpt⟩world⟨ept⟩!", tags.clone()))
            .with_target(Segment::new("Hallo ⟨bpt⟩Welt!⟨ept⟩", tags)),
          TransUnit::new("bye", Segment::plain("Bye")),
        ],
      }],
    }
  }

  #[test]
  fn carries_text_verbatim_and_tags_unmodified() {
    let doc = document();
    let mut buffer = EditBuffer::seed(UnitRef::new(0, 0), doc.unit(UnitRef::new(0, 0)).unwrap());
    buffer.set_text("⟨bpt⟩Servus⟨ept⟩ Welt");

    let request = reconcile(&doc, &buffer).unwrap();
    assert_eq!(request.file_index, 0);
    assert_eq!(request.trans_unit_id, "hello");
    assert_eq!(request.target_text, "⟨bpt⟩Servus⟨ept⟩ Welt");
    assert_eq!(request.target_tags, doc.files[0].trans_units[0].target_tags());
    assert_eq!(request.target_tags[0].position, 6);
  }

  #[test]
  fn missing_target_sends_no_tags() {
    let doc = document();
    let mut buffer = EditBuffer::seed(UnitRef::new(0, 1), doc.unit(UnitRef::new(0, 1)).unwrap());
    buffer.set_text("Tschüss");
    let request = reconcile(&doc, &buffer).unwrap();
    assert_eq!(request.trans_unit_id, "bye");
    assert!(request.target_tags.is_empty());

    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "file_index": 0,
        "trans_unit_id": "bye",
        "target_text": "Tschüss",
        "target_tags": [],
      })
    );
  }

  #[test]
  fn unknown_unit() {
    let doc = document();
    let buffer = EditBuffer::seed(UnitRef::new(3, 0), &TransUnit::new("x", Segment::plain("")));
    assert_eq!(
      reconcile(&doc, &buffer),
      Err(ReconcileError::UnitNotFound(UnitRef::new(3, 0)))
    );
  }

  #[test]
  fn preview_realigns_or_falls_back() {
    let doc = document();
    let target = doc.files[0].trans_units[0].target.as_ref();
    let mut buffer = EditBuffer::seed(UnitRef::new(0, 0), &doc.files[0].trans_units[0]);
    buffer.set_text("⟨bpt⟩Hallo⟨ept⟩ Welt!");

    let preview = preview(target, &buffer);
    assert!(preview.error.is_none());
    let spans = render(&preview.segment);
    assert_eq!(spans[1], Span::Text("Hallo"));
    assert_eq!(spans[3], Span::Text(" Welt!"));

    buffer.set_text("⟨bpt⟩Hallo Welt!");
    let fallback = super::preview(target, &buffer);
    assert!(fallback.error.is_some());
    assert_eq!(render(&fallback.segment), [Span::Text("⟨bpt⟩Hallo Welt!")]);
  }
}
