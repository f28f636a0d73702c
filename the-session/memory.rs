//! In-process backend over JSON documents.
//!
//! Loads documents in the backend's JSON shape, applies updates with the
//! same marker re-alignment the document service performs and exports the
//! current state as pretty JSON.

use async_trait::async_trait;
use parking_lot::Mutex;
use the_segment::{
  Document,
  Segment,
  align,
};

use crate::{
  backend::{
    Backend,
    BackendError,
    ExportPayload,
  },
  reconcile::UpdateRequest,
};

#[derive(Debug, Clone)]
struct Loaded {
  filename: String,
  document: Document,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
  state: Mutex<Option<Loaded>>,
}

impl MemoryBackend {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_document(filename: impl Into<String>, document: Document) -> Self {
    Self {
      state: Mutex::new(Some(Loaded {
        filename: filename.into(),
        document,
      })),
    }
  }

  /// Snapshot of the stored document.
  pub fn document(&self) -> Option<Document> {
    self
      .state
      .lock()
      .as_ref()
      .map(|loaded| loaded.document.clone())
  }
}

#[async_trait]
impl Backend for MemoryBackend {
  async fn load(&self, filename: &str, bytes: Vec<u8>) -> Result<Document, BackendError> {
    let document: Document = serde_json::from_slice(&bytes)
      .map_err(|err| BackendError::Rejected(format!("Invalid document: {err}")))?;
    log::debug!(
      "loaded {filename}: {} file(s), {} unit(s)",
      document.files.len(),
      document.units().count()
    );
    *self.state.lock() = Some(Loaded {
      filename: filename.to_string(),
      document: document.clone(),
    });
    Ok(document)
  }

  async fn save(&self, request: &UpdateRequest) -> Result<(), BackendError> {
    let mut state = self.state.lock();
    let loaded = state
      .as_mut()
      .ok_or_else(|| BackendError::Rejected("No file uploaded".to_string()))?;

    let file = loaded
      .document
      .files
      .get_mut(request.file_index)
      .ok_or_else(|| {
        BackendError::Rejected(format!("file index {} out of range", request.file_index))
      })?;
    let unit = file
      .trans_units
      .iter_mut()
      .find(|unit| unit.id == request.trans_unit_id)
      .ok_or_else(|| {
        BackendError::Rejected(format!(
          "trans-unit '{}' not found",
          request.trans_unit_id
        ))
      })?;

    let alignment = align::align(&request.target_text, &request.target_tags)
      .map_err(|err| BackendError::Rejected(err.to_string()))?;
    if alignment.reordered {
      log::warn!(
        "trans-unit '{}' saved with reordered tags",
        request.trans_unit_id
      );
    }
    unit.target = Some(Segment::new(request.target_text.clone(), alignment.tags));
    Ok(())
  }

  async fn export(&self) -> Result<ExportPayload, BackendError> {
    let state = self.state.lock();
    let loaded = state
      .as_ref()
      .ok_or_else(|| BackendError::Rejected("No file to download".to_string()))?;
    let bytes = serde_json::to_vec_pretty(&loaded.document)
      .map_err(|err| BackendError::Rejected(format!("Error generating download: {err}")))?;
    Ok(ExportPayload {
      bytes,
      filename_hint: Some(loaded.filename.clone()),
    })
  }
}

#[cfg(test)]
mod tests {
  use the_segment::{
    File,
    Tag,
    TagType,
    TransUnit,
  };

  use super::*;

  fn document() -> Document {
    let tags = vec![
      Tag::new(TagType::Bpt, 0).with_id("1"),
      Tag::new(TagType::Ept, 9).with_id("1"),
    ];
    Document {
      version: "1.2".to_string(),
      files:   vec![File {
        original:        "menu.rc".to_string(),
        source_language: "en".to_string(),
        target_language: Some("es".to_string()),
        datatype:        Some("winres".to_string()),
        trans_units:     vec![
          TransUnit::new("m1", Segment::new("⟨bpt⟩File⟨ept⟩", tags.clone()))
            .with_target(Segment::new("⟨bpt⟩Arch⟨ept⟩", tags)),
        ],
      }],
    }
  }

  fn request(text: &str) -> UpdateRequest {
    let doc = document();
    UpdateRequest {
      file_index:    0,
      trans_unit_id: "m1".to_string(),
      target_text:   text.to_string(),
      target_tags:   doc.files[0].trans_units[0].target_tags().to_vec(),
    }
  }

  #[tokio::test]
  async fn save_realigns_target_tags() {
    let backend = MemoryBackend::with_document("menu.json", document());
    backend.save(&request("⟨bpt⟩Archivo⟨ept⟩")).await.unwrap();

    let stored = backend.document().unwrap();
    let target = stored.files[0].trans_units[0].target.as_ref().unwrap();
    assert_eq!(target.text, "⟨bpt⟩Archivo⟨ept⟩");
    assert_eq!(target.tags[1].tag_type, TagType::Ept);
    assert_eq!(target.tags[1].position, 12);
    assert_eq!(target.tags[1].id.as_deref(), Some("1"));
  }

  #[tokio::test]
  async fn save_rejects_count_mismatch_and_keeps_state() {
    let backend = MemoryBackend::with_document("menu.json", document());
    let err = backend.save(&request("Archivo⟨ept⟩")).await.unwrap_err();
    assert!(matches!(err, BackendError::Rejected(reason) if reason.contains("⟨bpt⟩")));
    assert_eq!(backend.document(), Some(document()));
  }

  #[tokio::test]
  async fn save_rejects_unknown_unit() {
    let backend = MemoryBackend::with_document("menu.json", document());
    let mut bad = request("⟨bpt⟩x⟨ept⟩");
    bad.trans_unit_id = "nope".to_string();
    assert!(backend.save(&bad).await.is_err());
    bad.file_index = 4;
    assert!(backend.save(&bad).await.is_err());
    assert!(MemoryBackend::new().save(&request("")).await.is_err());
  }

  #[tokio::test]
  async fn load_and_export_round_trip() {
    let backend = MemoryBackend::new();
    let bytes = serde_json::to_vec(&document()).unwrap();
    let loaded = backend.load("menu.json", bytes).await.unwrap();
    assert_eq!(loaded, document());

    let payload = backend.export().await.unwrap();
    assert_eq!(payload.filename_hint.as_deref(), Some("menu.json"));
    let exported: Document = serde_json::from_slice(&payload.bytes).unwrap();
    assert_eq!(exported, document());
  }

  #[tokio::test]
  async fn load_failure_keeps_previous_document() {
    let backend = MemoryBackend::with_document("menu.json", document());
    let err = backend.load("broken.json", b"{not json".to_vec()).await.unwrap_err();
    assert!(err.to_string().starts_with("Invalid document"));
    assert_eq!(backend.document(), Some(document()));
    assert!(MemoryBackend::new().export().await.is_err());
  }
}
