use std::collections::VecDeque;

use serde::{
  Deserialize,
  Serialize,
};
use the_segment::UnitRef;

pub const DEFAULT_HISTORY_LIMIT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
  Info,
  Warning,
  Error,
}

/// A notification for the translator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub id:    u64,
  pub level: MessageLevel,
  /// Unit the message is about, if any.
  pub unit:  Option<UnitRef>,
  pub text:  String,
}

#[derive(Debug, Clone)]
pub struct MessageCenter {
  active:          Option<Message>,
  history:         VecDeque<Message>,
  next_message_id: u64,
  history_limit:   usize,
}

impl Default for MessageCenter {
  fn default() -> Self {
    Self::with_limit(DEFAULT_HISTORY_LIMIT)
  }
}

impl MessageCenter {
  pub fn with_limit(history_limit: usize) -> Self {
    Self {
      active:          None,
      history:         VecDeque::new(),
      next_message_id: 1,
      history_limit:   history_limit.max(1),
    }
  }

  pub fn active(&self) -> Option<&Message> {
    self.active.as_ref()
  }

  pub fn history_len(&self) -> usize {
    self.history.len()
  }

  pub fn history(&self) -> impl Iterator<Item = &Message> {
    self.history.iter()
  }

  pub fn publish(
    &mut self,
    level: MessageLevel,
    unit: Option<UnitRef>,
    text: impl Into<String>,
  ) -> Message {
    let message = Message {
      id: self.next_message_id,
      level,
      unit,
      text: text.into(),
    };
    self.next_message_id = self.next_message_id.saturating_add(1);

    self.active = Some(message.clone());
    self.history.push_back(message.clone());
    while self.history.len() > self.history_limit {
      self.history.pop_front();
    }
    message
  }

  pub fn info(&mut self, unit: Option<UnitRef>, text: impl Into<String>) -> Message {
    self.publish(MessageLevel::Info, unit, text)
  }

  pub fn warning(&mut self, unit: Option<UnitRef>, text: impl Into<String>) -> Message {
    self.publish(MessageLevel::Warning, unit, text)
  }

  pub fn error(&mut self, unit: Option<UnitRef>, text: impl Into<String>) -> Message {
    self.publish(MessageLevel::Error, unit, text)
  }

  pub fn dismiss_active(&mut self) -> Option<Message> {
    self.active.take()
  }

  pub fn clear(&mut self) {
    self.active = None;
    self.history.clear();
  }
}
