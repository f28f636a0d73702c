//! HTTP client for the document service.
//!
//! Endpoints: `POST /upload` (multipart field `file`), `PUT /trans-unit`
//! (JSON [`UpdateRequest`]) and `GET /download`. Failures carry a JSON body
//! of the form `{"detail": "..."}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
  Client,
  Response,
  header::CONTENT_DISPOSITION,
  multipart,
};
use serde::Deserialize;
use the_segment::Document;

use crate::{
  backend::{
    Backend,
    BackendError,
    ExportPayload,
    SUPPORTED_EXTENSIONS,
    content_disposition_filename,
    is_supported_upload,
  },
  reconcile::UpdateRequest,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct HttpBackend {
  client:   Client,
  base_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
  detail: String,
}

impl HttpBackend {
  pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|err| BackendError::Network(err.to_string()))?;
    Ok(Self {
      client,
      base_url: base_url.into().trim_end_matches('/').to_string(),
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn url(&self, path: &str) -> String {
    format!("{}/{path}", self.base_url)
  }
}

#[async_trait]
impl Backend for HttpBackend {
  async fn load(&self, filename: &str, bytes: Vec<u8>) -> Result<Document, BackendError> {
    if !is_supported_upload(filename) {
      return Err(BackendError::Rejected(format!(
        "File must be one of: {}",
        SUPPORTED_EXTENSIONS.join(", ")
      )));
    }

    log::debug!("uploading {filename} ({} bytes)", bytes.len());
    let part = multipart::Part::bytes(bytes).file_name(filename.to_string());
    let form = multipart::Form::new().part("file", part);
    let response = self
      .client
      .post(self.url("upload"))
      .multipart(form)
      .send()
      .await
      .map_err(network)?;

    ensure_success(response)
      .await?
      .json::<Document>()
      .await
      .map_err(|err| BackendError::Rejected(format!("invalid document response: {err}")))
  }

  async fn save(&self, request: &UpdateRequest) -> Result<(), BackendError> {
    log::debug!(
      "saving trans-unit '{}' of file {}",
      request.trans_unit_id,
      request.file_index
    );
    let response = self
      .client
      .put(self.url("trans-unit"))
      .json(request)
      .send()
      .await
      .map_err(network)?;
    ensure_success(response).await?;
    Ok(())
  }

  async fn export(&self) -> Result<ExportPayload, BackendError> {
    let response = self
      .client
      .get(self.url("download"))
      .send()
      .await
      .map_err(network)?;
    let response = ensure_success(response).await?;

    let filename_hint = response
      .headers()
      .get(CONTENT_DISPOSITION)
      .and_then(|value| value.to_str().ok())
      .and_then(content_disposition_filename);
    let bytes = response.bytes().await.map_err(network)?;

    Ok(ExportPayload {
      bytes: bytes.to_vec(),
      filename_hint,
    })
  }
}

fn network(err: reqwest::Error) -> BackendError {
  BackendError::Network(err.to_string())
}

async fn ensure_success(response: Response) -> Result<Response, BackendError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  let text = response.text().await.unwrap_or_default();
  let reason = serde_json::from_str::<ErrorBody>(&text)
    .map(|body| body.detail)
    .unwrap_or_else(|_| format!("status {status}: {text}"));
  log::error!("backend request failed: {reason}");
  Err(BackendError::Rejected(reason))
}
