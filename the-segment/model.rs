//! Document model shared with the backend.
//!
//! The types mirror the backend's JSON wire format field for field. Tags are
//! immutable once loaded; the only part of a segment that changes while a
//! translator works is its text, and that change happens in an
//! `EditBuffer`, never here.

use std::{
  fmt,
  str::FromStr,
};

use indexmap::IndexMap;
use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::marker;

/// Inline element names of the XLIFF 1.x interchange format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
  G,
  X,
  Bpt,
  Ept,
  Ph,
  It,
  Mrk,
  Sub,
  Bx,
  Ex,
}

/// Structural category of a [`TagType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
  /// Opening half of a formatting pair.
  BeginPaired,
  /// Closing half of a formatting pair.
  EndPaired,
  /// Self-contained inline code such as an image reference.
  Placeholder,
  Other,
}

impl TagType {
  pub const ALL: [TagType; 10] = [
    TagType::G,
    TagType::X,
    TagType::Bpt,
    TagType::Ept,
    TagType::Ph,
    TagType::It,
    TagType::Mrk,
    TagType::Sub,
    TagType::Bx,
    TagType::Ex,
  ];

  pub const fn as_str(self) -> &'static str {
    match self {
      Self::G => "g",
      Self::X => "x",
      Self::Bpt => "bpt",
      Self::Ept => "ept",
      Self::Ph => "ph",
      Self::It => "it",
      Self::Mrk => "mrk",
      Self::Sub => "sub",
      Self::Bx => "bx",
      Self::Ex => "ex",
    }
  }

  pub const fn kind(self) -> TagKind {
    match self {
      Self::Bpt | Self::Bx => TagKind::BeginPaired,
      Self::Ept | Self::Ex => TagKind::EndPaired,
      Self::Ph | Self::X => TagKind::Placeholder,
      Self::G | Self::It | Self::Mrk | Self::Sub => TagKind::Other,
    }
  }
}

impl fmt::Display for TagType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown inline tag type '{0}'")]
pub struct UnknownTagType(pub String);

impl FromStr for TagType {
  type Err = UnknownTagType;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|tag_type| tag_type.as_str() == s)
      .ok_or_else(|| UnknownTagType(s.to_string()))
  }
}

/// An inline tag anchored at a char offset of its segment's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub tag_type:    TagType,
  #[serde(default)]
  pub id:          Option<String>,
  /// Literal inner content, e.g. the escaped original markup of a `bpt`.
  #[serde(default)]
  pub content:     Option<String>,
  #[serde(default)]
  pub attributes:  IndexMap<String, String>,
  pub position:    usize,
  #[serde(default)]
  pub ctype:       Option<String>,
  #[serde(default)]
  pub paired_with: Option<String>,
}

impl Tag {
  pub fn new(tag_type: TagType, position: usize) -> Self {
    Self {
      tag_type,
      id: None,
      content: None,
      attributes: IndexMap::new(),
      position,
      ctype: None,
      paired_with: None,
    }
  }

  pub fn with_id(mut self, id: impl Into<String>) -> Self {
    self.id = Some(id.into());
    self
  }

  pub fn with_content(mut self, content: impl Into<String>) -> Self {
    self.content = Some(content.into());
    self
  }

  pub fn with_ctype(mut self, ctype: impl Into<String>) -> Self {
    self.ctype = Some(ctype.into());
    self
  }

  pub fn kind(&self) -> TagKind {
    self.tag_type.kind()
  }

  pub fn marker(&self) -> String {
    marker::encode(self.tag_type)
  }

  /// Number of chars the tag's marker covers in the segment text.
  pub fn marker_len(&self) -> usize {
    marker::marker_len(self.tag_type)
  }

  /// Locked, read-only label shown in place of the marker.
  pub fn label(&self) -> String {
    let content = self.content.as_deref();
    match self.tag_type {
      TagType::Bpt => format!("<bpt>{}", content.unwrap_or_default()),
      TagType::Ept => format!("</{}>", content.unwrap_or("ept")),
      TagType::Ph => {
        match content {
          Some(content) => content.to_string(),
          None => format!("{{{}}}", self.id.as_deref().unwrap_or_default()),
        }
      },
      other => {
        match content {
          Some(content) => format!("<{other}>{content}</{other}>"),
          None => format!("<{other}/>"),
        }
      },
    }
  }

  pub fn tooltip(&self) -> String {
    let mut lines = vec![format!("Type: {}", self.tag_type)];
    if let Some(id) = &self.id {
      lines.push(format!("ID: {id}"));
    }
    if let Some(ctype) = &self.ctype {
      lines.push(format!("Content Type: {ctype}"));
    }
    if let Some(content) = &self.content {
      lines.push(format!("Content: {content}"));
    }
    lines.join("\n")
  }
}

/// One side (source or target) of a translation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
  pub text: String,
  /// Not required to be sorted by position.
  #[serde(default)]
  pub tags: Vec<Tag>,
}

impl Segment {
  pub fn new(text: impl Into<String>, tags: Vec<Tag>) -> Self {
    Self {
      text: text.into(),
      tags,
    }
  }

  pub fn plain(text: impl Into<String>) -> Self {
    Self::new(text, Vec::new())
  }

  /// Text with every recognized marker removed.
  pub fn plain_text(&self) -> String {
    marker::strip(&self.text)
  }

  pub fn is_blank(&self) -> bool {
    self.text.trim().is_empty()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransUnit {
  pub id:         String,
  pub source:     Segment,
  #[serde(default)]
  pub target:     Option<Segment>,
  /// Workflow state such as `translated` or `needs-review`.
  #[serde(default)]
  pub state:      Option<String>,
  #[serde(default)]
  pub notes:      Vec<String>,
  #[serde(default)]
  pub attributes: IndexMap<String, serde_json::Value>,
}

impl TransUnit {
  pub fn new(id: impl Into<String>, source: Segment) -> Self {
    Self {
      id: id.into(),
      source,
      target: None,
      state: None,
      notes: Vec::new(),
      attributes: IndexMap::new(),
    }
  }

  pub fn with_target(mut self, target: Segment) -> Self {
    self.target = Some(target);
    self
  }

  pub fn target_tags(&self) -> &[Tag] {
    self
      .target
      .as_ref()
      .map(|target| target.tags.as_slice())
      .unwrap_or_default()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
  pub original:        String,
  pub source_language: String,
  #[serde(default)]
  pub target_language: Option<String>,
  #[serde(default)]
  pub datatype:        Option<String>,
  #[serde(default)]
  pub trans_units:     Vec<TransUnit>,
}

impl File {
  pub fn unit_position(&self, id: &str) -> Option<usize> {
    self.trans_units.iter().position(|unit| unit.id == id)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
  pub version: String,
  #[serde(default)]
  pub files:   Vec<File>,
}

impl Document {
  pub fn unit(&self, unit: UnitRef) -> Option<&TransUnit> {
    self
      .files
      .get(unit.file_index)?
      .trans_units
      .get(unit.unit_index)
  }

  pub fn unit_mut(&mut self, unit: UnitRef) -> Option<&mut TransUnit> {
    self
      .files
      .get_mut(unit.file_index)?
      .trans_units
      .get_mut(unit.unit_index)
  }

  /// All units in file order, then unit order.
  pub fn units(&self) -> impl Iterator<Item = (UnitRef, &TransUnit)> {
    self
      .files
      .iter()
      .enumerate()
      .flat_map(|(file_index, file)| {
        file
          .trans_units
          .iter()
          .enumerate()
          .map(move |(unit_index, unit)| (UnitRef::new(file_index, unit_index), unit))
      })
  }
}

/// Positional address of a translation unit inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitRef {
  pub file_index: usize,
  pub unit_index: usize,
}

impl UnitRef {
  pub const fn new(file_index: usize, unit_index: usize) -> Self {
    Self {
      file_index,
      unit_index,
    }
  }
}

impl fmt::Display for UnitRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.file_index, self.unit_index)
  }
}
