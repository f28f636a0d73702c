//! Session state for one translator working on one document.
//!
//! Everything runs on the caller's event loop. The only suspending operation
//! is a backend round trip; saves are split into [`Session::begin_save`] and
//! [`Session::complete_save`] so input handling (typing, navigation) can keep
//! running while a request is in flight. [`Session::save`] chains both for
//! callers that can simply await.

use std::collections::{
  BTreeSet,
  HashMap,
};

use the_segment::{
  Document,
  Segment,
  TransUnit,
  UnitRef,
  align::{
    self,
    AlignError,
  },
  navigation::{
    Direction,
    NavigationIndex,
    VisibilityFilter,
  },
};
use thiserror::Error;

use crate::{
  backend::{
    Backend,
    BackendError,
    DEFAULT_EXPORT_NAME,
  },
  buffer::EditBuffer,
  events::{
    EventLog,
    SessionEvent,
    SessionEventKind,
  },
  messages::{
    Message,
    MessageCenter,
    MessageLevel,
  },
  reconcile::{
    self,
    Preview,
    ReconcileError,
    UpdateRequest,
  },
};

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
  #[error("no document loaded")]
  NoDocument,
  #[error("no translation unit selected")]
  NoSelection,
  #[error("translation unit {0} does not exist")]
  UnitNotFound(UnitRef),
  #[error(transparent)]
  Reconcile(#[from] ReconcileError),
  #[error(transparent)]
  TagMismatch(#[from] AlignError),
  #[error(transparent)]
  Backend(#[from] BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
  pub filter:              VisibilityFilter,
  /// Reject marker/tag count mismatches before sending a save.
  pub preflight_tag_check: bool,
  pub default_export_name: String,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      filter:              VisibilityFilter::default(),
      preflight_tag_check: true,
      default_export_name: DEFAULT_EXPORT_NAME.to_string(),
    }
  }
}

/// A save that has been sent, or is about to be.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveTicket {
  pub id:      u64,
  pub unit:    UnitRef,
  /// Payload built from the edit buffer at send time.
  pub request: UpdateRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
  /// The document now holds the saved text.
  Applied,
  /// The backend refused or was unreachable; nothing changed locally.
  Failed(BackendError),
  /// A newer save for the same unit was started, or the document was
  /// replaced, so this completion was ignored.
  Superseded,
}

/// An exported file ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
  pub filename: String,
  pub bytes:    Vec<u8>,
}

#[derive(Debug)]
pub struct Session {
  config:         SessionConfig,
  document:       Option<Document>,
  selection:      Option<UnitRef>,
  buffer:         Option<EditBuffer>,
  expanded_files: BTreeSet<usize>,
  latest_saves:   HashMap<UnitRef, u64>,
  /// Buffers left behind while their save was in flight, keyed by unit.
  parked:         HashMap<UnitRef, EditBuffer>,
  next_ticket:    u64,
  messages:       MessageCenter,
  events:         EventLog,
}

impl Default for Session {
  fn default() -> Self {
    Self::new(SessionConfig::default())
  }
}

impl Session {
  pub fn new(config: SessionConfig) -> Self {
    Self {
      config,
      document: None,
      selection: None,
      buffer: None,
      expanded_files: BTreeSet::new(),
      latest_saves: HashMap::new(),
      parked: HashMap::new(),
      next_ticket: 1,
      messages: MessageCenter::default(),
      events: EventLog::default(),
    }
  }

  pub fn config(&self) -> &SessionConfig {
    &self.config
  }

  /// The loaded document. A target saved during this session holds the new
  /// text but its tags keep the positions they were loaded with, so show it
  /// through [`reconcile::preview`] until the document is loaded again.
  pub fn document(&self) -> Option<&Document> {
    self.document.as_ref()
  }

  pub fn selection(&self) -> Option<UnitRef> {
    self.selection
  }

  pub fn selected_unit(&self) -> Option<&TransUnit> {
    self.document.as_ref()?.unit(self.selection?)
  }

  pub fn buffer(&self) -> Option<&EditBuffer> {
    self.buffer.as_ref()
  }

  pub fn filter(&self) -> VisibilityFilter {
    self.config.filter
  }

  pub fn messages(&self) -> &MessageCenter {
    &self.messages
  }

  pub fn events_since(&self, seq: u64) -> Vec<SessionEvent> {
    self.events.events_since(seq)
  }

  pub fn latest_seq(&self) -> u64 {
    self.events.latest_seq()
  }

  pub fn is_expanded(&self, file_index: usize) -> bool {
    self.expanded_files.contains(&file_index)
  }

  pub fn expanded_files(&self) -> impl Iterator<Item = usize> + '_ {
    self.expanded_files.iter().copied()
  }

  /// Whether a save for `unit` is awaiting completion.
  pub fn is_saving(&self, unit: UnitRef) -> bool {
    self.latest_saves.contains_key(&unit)
  }

  /// Whether unsaved text of `unit` is kept aside for its next selection.
  pub fn has_parked_text(&self, unit: UnitRef) -> bool {
    self.parked.contains_key(&unit)
  }

  // Document lifecycle

  /// Replaces the document in full. Selection, buffer and pending saves of
  /// the previous document are dropped.
  pub fn load_succeeded(&mut self, document: Document) {
    let files = document.files.len();
    let units = document.units().count();
    log::info!("document loaded: {files} file(s), {units} unit(s)");

    self.expanded_files.clear();
    if files > 0 {
      self.expanded_files.insert(0);
    }
    self.document = Some(document);
    self.latest_saves.clear();
    self.parked.clear();
    self.events.push(SessionEventKind::DocumentLoaded { files, units });
    if self.selection.is_some() {
      self.set_selection(None);
    }
  }

  /// Reports a failed load. The current document, if any, stays active.
  pub fn load_failed(&mut self, reason: impl Into<String>) {
    let reason = reason.into();
    log::error!("load failed: {reason}");
    self.notify(MessageLevel::Error, None, reason.clone());
    self.events.push(SessionEventKind::LoadFailed { reason });
  }

  pub async fn load<B>(&mut self, backend: &B, filename: &str, bytes: Vec<u8>) -> Result<()>
  where
    B: Backend + ?Sized,
  {
    match backend.load(filename, bytes).await {
      Ok(document) => {
        self.load_succeeded(document);
        Ok(())
      },
      Err(err) => {
        self.load_failed(err.to_string());
        Err(err.into())
      },
    }
  }

  // Selection and navigation

  /// Selects a unit and seeds a fresh edit buffer from its target, replacing
  /// whatever the previous buffer held. A buffer whose save is still in
  /// flight is parked instead, and comes back when its unit is selected
  /// again.
  pub fn select(&mut self, unit: UnitRef) -> Result<()> {
    let document = self.document.as_ref().ok_or(SessionError::NoDocument)?;
    if document.unit(unit).is_none() {
      return Err(SessionError::UnitNotFound(unit));
    }
    self.expanded_files.insert(unit.file_index);
    self.set_selection(Some(unit));
    Ok(())
  }

  pub fn clear_selection(&mut self) {
    if self.selection.is_some() {
      self.set_selection(None);
    }
  }

  /// Builds the navigation index for the current document and filter.
  pub fn navigation_index(&self) -> NavigationIndex {
    match &self.document {
      Some(document) => NavigationIndex::with_filter(document, self.config.filter),
      None => NavigationIndex::default(),
    }
  }

  /// Moves the selection one visible unit back or forward. At either end of
  /// the list the selection, and the edit buffer with it, stay untouched.
  pub fn navigate(&mut self, direction: Direction) -> Option<UnitRef> {
    let current = self.selection?;
    let next = self.navigation_index().advance(current, direction);
    if next != current {
      self.set_selection(Some(next));
      self.expanded_files.insert(next.file_index);
    }
    Some(next)
  }

  pub fn toggle_file(&mut self, file_index: usize) -> bool {
    let expanded = if self.expanded_files.remove(&file_index) {
      false
    } else {
      self.expanded_files.insert(file_index);
      true
    };
    self.events.push(SessionEventKind::FileToggled {
      file_index,
      expanded,
    });
    expanded
  }

  pub fn set_filter(&mut self, filter: VisibilityFilter) {
    if self.config.filter == filter {
      return;
    }
    self.config.filter = filter;
    self.events.push(SessionEventKind::FilterChanged {
      hide_empty_sources: filter.hide_empty_sources,
    });
  }

  /// `(visible, total)` unit counts of a file under the current filter.
  pub fn visible_count(&self, file_index: usize) -> Option<(usize, usize)> {
    let file = self.document.as_ref()?.files.get(file_index)?;
    let visible = file
      .trans_units
      .iter()
      .filter(|unit| self.config.filter.is_visible(unit))
      .count();
    Some((visible, file.trans_units.len()))
  }

  // Editing

  pub fn edit<R>(&mut self, f: impl FnOnce(&mut EditBuffer) -> R) -> Result<R> {
    let buffer = self.buffer.as_mut().ok_or(SessionError::NoSelection)?;
    let result = f(buffer);
    let unit = buffer.unit();
    self.events.push(SessionEventKind::BufferEdited { unit });
    Ok(result)
  }

  pub fn set_buffer_text(&mut self, text: impl Into<String>) -> Result<()> {
    let text = text.into();
    self.edit(|buffer| buffer.set_text(text))
  }

  /// Target as it would look once the buffer is saved.
  pub fn preview(&self) -> Option<Preview> {
    let buffer = self.buffer.as_ref()?;
    let target = self
      .document
      .as_ref()?
      .unit(buffer.unit())?
      .target
      .as_ref();
    Some(reconcile::preview(target, buffer))
  }

  // Saving

  /// Builds the update for the selected unit from the buffer as it is right
  /// now and marks it as the unit's latest save.
  pub fn begin_save(&mut self) -> Result<SaveTicket> {
    let document = self.document.as_ref().ok_or(SessionError::NoDocument)?;
    let buffer = self.buffer.as_ref().ok_or(SessionError::NoSelection)?;
    let request = reconcile::reconcile(document, buffer)?;
    let unit = buffer.unit();

    if self.config.preflight_tag_check {
      match align::align(&request.target_text, &request.target_tags) {
        Ok(alignment) if alignment.reordered => {
          self.notify(
            MessageLevel::Warning,
            Some(unit),
            format!("Tags of {} change order", request.trans_unit_id),
          );
        },
        Ok(_) => {},
        Err(err) => {
          log::warn!("save of {} refused before sending: {err}", request.trans_unit_id);
          self.notify(MessageLevel::Error, Some(unit), err.to_string());
          return Err(err.into());
        },
      }
    }

    let id = self.next_ticket;
    self.next_ticket = self.next_ticket.saturating_add(1);
    if let Some(previous) = self.latest_saves.insert(unit, id) {
      log::debug!("save {id} of {unit} supersedes save {previous}");
    }
    self.events.push(SessionEventKind::SaveStarted { ticket: id, unit });

    Ok(SaveTicket { id, unit, request })
  }

  /// Applies the backend's answer to a save. Only the latest ticket of a
  /// unit may change the document; the edit buffer is never touched.
  ///
  /// On success only the target text changes. Its tags keep their loaded
  /// positions, see [`Session::document`].
  pub fn complete_save(
    &mut self,
    ticket: &SaveTicket,
    result: std::result::Result<(), BackendError>,
  ) -> SaveStatus {
    let unit = ticket.unit;
    if self.latest_saves.get(&unit) != Some(&ticket.id) {
      log::warn!("ignoring stale completion of save {} for {unit}", ticket.id);
      self.events.push(SessionEventKind::SaveSuperseded {
        ticket: ticket.id,
        unit,
      });
      return SaveStatus::Superseded;
    }
    self.latest_saves.remove(&unit);

    match result {
      Ok(()) => {
        self.apply_saved_text(&ticket.request, unit);
        if self
          .parked
          .get(&unit)
          .is_some_and(|parked| parked.text() == ticket.request.target_text)
        {
          self.parked.remove(&unit);
        }
        self.notify(
          MessageLevel::Info,
          Some(unit),
          format!("Saved {}", ticket.request.trans_unit_id),
        );
        self.events.push(SessionEventKind::SaveSucceeded {
          ticket: ticket.id,
          unit,
        });
        SaveStatus::Applied
      },
      Err(err) => {
        log::error!("save of {} failed: {err}", ticket.request.trans_unit_id);
        let reason = err.to_string();
        self.notify(
          MessageLevel::Error,
          Some(unit),
          format!("Failed to save {}: {reason}", ticket.request.trans_unit_id),
        );
        self.events.push(SessionEventKind::SaveFailed {
          ticket: ticket.id,
          unit,
          reason,
        });
        SaveStatus::Failed(err)
      },
    }
  }

  pub async fn save<B>(&mut self, backend: &B) -> Result<SaveStatus>
  where
    B: Backend + ?Sized,
  {
    let ticket = self.begin_save()?;
    let result = backend.save(&ticket.request).await;
    Ok(self.complete_save(&ticket, result))
  }

  // Export

  /// Fetches the serialized document. Local state is never changed; a
  /// failure is reported and returned.
  pub async fn export<B>(&mut self, backend: &B) -> Result<ExportedFile>
  where
    B: Backend + ?Sized,
  {
    match backend.export().await {
      Ok(payload) => {
        let filename = payload.filename(&self.config.default_export_name);
        log::info!("exported {} bytes as {filename}", payload.bytes.len());
        self.events.push(SessionEventKind::Exported {
          filename: filename.clone(),
        });
        Ok(ExportedFile {
          filename,
          bytes: payload.bytes,
        })
      },
      Err(err) => {
        log::error!("export failed: {err}");
        let reason = err.to_string();
        self.notify(MessageLevel::Error, None, format!("Failed to export: {reason}"));
        self.events.push(SessionEventKind::ExportFailed { reason });
        Err(err.into())
      },
    }
  }

  fn set_selection(&mut self, unit: Option<UnitRef>) {
    if let Some(previous) = self.buffer.take() {
      let previous_unit = previous.unit();
      if self.is_saving(previous_unit) {
        log::debug!("parking buffer of {previous_unit}");
        self.parked.insert(previous_unit, previous);
      }
    }

    self.selection = unit;
    self.buffer = unit.and_then(|unit| {
      if let Some(parked) = self.parked.remove(&unit) {
        return Some(parked);
      }
      let trans_unit = self.document.as_ref()?.unit(unit)?;
      Some(EditBuffer::seed(unit, trans_unit))
    });
    log::debug!("selection changed to {unit:?}");
    self.events.push(SessionEventKind::SelectionChanged { unit });
  }

  fn apply_saved_text(&mut self, request: &UpdateRequest, unit: UnitRef) {
    let Some(trans_unit) = self.document.as_mut().and_then(|doc| doc.unit_mut(unit)) else {
      return;
    };
    if trans_unit.id != request.trans_unit_id {
      log::warn!(
        "unit {unit} is now '{}', not '{}'; keeping local copy",
        trans_unit.id,
        request.trans_unit_id
      );
      return;
    }
    match trans_unit.target.as_mut() {
      Some(target) => target.text = request.target_text.clone(),
      None => {
        trans_unit.target = Some(Segment::new(
          request.target_text.clone(),
          request.target_tags.clone(),
        ));
      },
    }
  }

  fn notify(&mut self, level: MessageLevel, unit: Option<UnitRef>, text: String) -> Message {
    let message = self.messages.publish(level, unit, text);
    self.events.push(SessionEventKind::MessagePublished {
      message: message.clone(),
    });
    message
  }
}
