//! Sequence-numbered log of session state changes.
//!
//! Views subscribe by remembering the last sequence number they processed
//! and polling [`EventLog::events_since`] after each input event.

use std::collections::VecDeque;

use serde::{
  Deserialize,
  Serialize,
};
use the_segment::UnitRef;

use crate::messages::Message;

pub const DEFAULT_EVENT_LIMIT: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEventKind {
  DocumentLoaded { files: usize, units: usize },
  LoadFailed { reason: String },
  SelectionChanged { unit: Option<UnitRef> },
  BufferEdited { unit: UnitRef },
  FilterChanged { hide_empty_sources: bool },
  FileToggled { file_index: usize, expanded: bool },
  SaveStarted { ticket: u64, unit: UnitRef },
  SaveSucceeded { ticket: u64, unit: UnitRef },
  SaveFailed { ticket: u64, unit: UnitRef, reason: String },
  SaveSuperseded { ticket: u64, unit: UnitRef },
  Exported { filename: String },
  ExportFailed { reason: String },
  MessagePublished { message: Message },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEvent {
  pub seq:  u64,
  #[serde(flatten)]
  pub kind: SessionEventKind,
}

#[derive(Debug, Clone)]
pub struct EventLog {
  events:         VecDeque<SessionEvent>,
  next_event_seq: u64,
  event_limit:    usize,
}

impl Default for EventLog {
  fn default() -> Self {
    Self::with_limit(DEFAULT_EVENT_LIMIT)
  }
}

impl EventLog {
  pub fn with_limit(event_limit: usize) -> Self {
    Self {
      events:         VecDeque::new(),
      next_event_seq: 1,
      event_limit:    event_limit.max(1),
    }
  }

  pub fn latest_seq(&self) -> u64 {
    self.next_event_seq.saturating_sub(1)
  }

  /// Oldest sequence number still retained.
  pub fn oldest_seq(&self) -> u64 {
    self
      .events
      .front()
      .map(|event| event.seq)
      .unwrap_or(self.next_event_seq)
  }

  pub fn events_since(&self, seq: u64) -> Vec<SessionEvent> {
    self
      .events
      .iter()
      .filter(|event| event.seq > seq)
      .cloned()
      .collect()
  }

  pub fn push(&mut self, kind: SessionEventKind) -> u64 {
    let seq = self.next_event_seq;
    log::trace!("session event {seq}: {kind:?}");
    self.events.push_back(SessionEvent { seq, kind });
    self.next_event_seq = self.next_event_seq.saturating_add(1);
    while self.events.len() > self.event_limit {
      self.events.pop_front();
    }
    seq
  }
}
