//! Contract with the service that parses, stores and serializes documents.

use async_trait::async_trait;
use the_segment::Document;
use thiserror::Error;

use crate::reconcile::UpdateRequest;

pub const DEFAULT_EXPORT_NAME: &str = "modified.xliff";

/// File extensions the backend accepts for upload.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = [".xliff", ".xlf", ".sdlxliff", ".xlz"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
  /// The request never produced a response.
  #[error("network error: {0}")]
  Network(String),
  /// The backend answered and refused, with a human readable reason.
  #[error("{0}")]
  Rejected(String),
}

/// A serialized document returned by an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
  pub bytes:         Vec<u8>,
  pub filename_hint: Option<String>,
}

impl ExportPayload {
  pub fn filename(&self, default: &str) -> String {
    export_filename(self.filename_hint.as_deref(), default)
  }
}

#[async_trait]
pub trait Backend: Send + Sync {
  /// Uploads a file and returns the parsed document. Partial documents are
  /// never returned: any parse failure is a single error.
  async fn load(&self, filename: &str, bytes: Vec<u8>) -> Result<Document, BackendError>;

  async fn save(&self, request: &UpdateRequest) -> Result<(), BackendError>;

  async fn export(&self) -> Result<ExportPayload, BackendError>;
}

pub fn is_supported_upload(filename: &str) -> bool {
  let filename = filename.to_lowercase();
  SUPPORTED_EXTENSIONS
    .iter()
    .any(|extension| filename.ends_with(extension))
}

/// Picks the name to save an export under: the server's hint when it names
/// a file, `default` otherwise. Directory components of the hint are dropped.
pub fn export_filename(hint: Option<&str>, default: &str) -> String {
  hint
    .and_then(|hint| hint.rsplit(['/', '\\']).next())
    .map(str::trim)
    .filter(|name| !name.is_empty() && *name != "." && *name != "..")
    .unwrap_or(default)
    .to_string()
}

/// Extracts the download name from a `Content-Disposition` header.
///
/// An RFC 5987 `filename*` parameter wins over a plain `filename`. Quoted
/// values may contain `;` and backslash escapes.
pub fn content_disposition_filename(header: &str) -> Option<String> {
  let mut plain = None;
  for (key, value) in disposition_params(header).into_iter().skip(1) {
    if key.eq_ignore_ascii_case("filename*") {
      if let Some(name) = decode_ext_value(&value) {
        return Some(name);
      }
    } else if key.eq_ignore_ascii_case("filename") && plain.is_none() {
      plain = Some(value);
    }
  }
  plain
}

/// Splits a header into `key=value` pairs on `;` outside quoted strings.
/// The leading disposition type comes back with an empty value.
fn disposition_params(header: &str) -> Vec<(String, String)> {
  let mut params = Vec::new();
  let mut chars = header.chars();
  loop {
    let mut key = String::new();
    let mut value = String::new();
    let mut in_value = false;
    let mut ended = true;

    while let Some(ch) = chars.next() {
      match ch {
        ';' => {
          ended = false;
          break;
        },
        '=' if !in_value => in_value = true,
        '"' if in_value && value.trim().is_empty() => {
          value.clear();
          while let Some(ch) = chars.next() {
            match ch {
              '"' => break,
              '\\' => value.extend(chars.next()),
              other => value.push(other),
            }
          }
        },
        other if in_value => value.push(other),
        other => key.push(other),
      }
    }

    let key = key.trim();
    if !key.is_empty() {
      params.push((key.to_string(), value.trim().to_string()));
    }
    if ended {
      return params;
    }
  }
}

/// Decodes `charset'language'percent-encoded` as used by `filename*`.
fn decode_ext_value(value: &str) -> Option<String> {
  let mut parts = value.splitn(3, '\'');
  let charset = parts.next()?;
  let _language = parts.next()?;
  let encoded = parts.next()?;
  if !charset.eq_ignore_ascii_case("utf-8") {
    return None;
  }
  urlencoding::decode(encoded)
    .ok()
    .map(|name| name.into_owned())
}
