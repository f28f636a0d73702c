//! Tag marker codec.
//!
//! A marker is `⟨` + tag type identifier + `⟩` (U+27E8 / U+27E9). Markers
//! identify a tag *type*, not a tag instance: a translator re-inserts "a tag
//! of this type" by typing its marker. All offsets here are char offsets.

use crate::model::TagType;

pub const MARKER_OPEN: char = '\u{27E8}';
pub const MARKER_CLOSE: char = '\u{27E9}';

/// A recognized marker inside a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerMatch {
  pub tag_type: TagType,
  /// Char offset of the opening bracket.
  pub offset:   usize,
}

impl MarkerMatch {
  pub fn end(&self) -> usize {
    self.offset + marker_len(self.tag_type)
  }
}

pub fn encode(tag_type: TagType) -> String {
  let name = tag_type.as_str();
  let mut marker = String::with_capacity(name.len() + 2 * MARKER_OPEN.len_utf8());
  marker.push(MARKER_OPEN);
  marker.push_str(name);
  marker.push(MARKER_CLOSE);
  marker
}

/// Width of the marker in chars.
pub fn marker_len(tag_type: TagType) -> usize {
  // identifiers are ASCII
  tag_type.as_str().len() + 2
}

/// Scans `text` left to right for markers of known tag types.
///
/// Bracket runs that do not enclose a known identifier are literal text and
/// scanning resumes right after the opening bracket, so `⟨⟨bpt⟩` matches a
/// single `bpt` at offset 1.
pub fn find_all(text: &str) -> Vec<MarkerMatch> {
  let chars: Vec<char> = text.chars().collect();
  let mut matches = Vec::new();
  let mut idx = 0;

  while idx < chars.len() {
    if chars[idx] != MARKER_OPEN {
      idx += 1;
      continue;
    }
    match recognize(&chars[idx + 1..]) {
      Some(tag_type) => {
        matches.push(MarkerMatch {
          tag_type,
          offset: idx,
        });
        idx += marker_len(tag_type);
      },
      None => idx += 1,
    }
  }

  matches
}

/// Returns `text` with every recognized marker removed.
pub fn strip(text: &str) -> String {
  let mut markers = find_all(text).into_iter().peekable();
  let mut out = String::with_capacity(text.len());
  let mut skip_until = 0;

  for (idx, ch) in text.chars().enumerate() {
    if idx < skip_until {
      continue;
    }
    if let Some(marker) = markers.next_if(|marker| marker.offset == idx) {
      skip_until = marker.end();
      continue;
    }
    out.push(ch);
  }

  out
}

fn recognize(rest: &[char]) -> Option<TagType> {
  let close = rest
    .iter()
    .position(|&ch| ch == MARKER_CLOSE || ch == MARKER_OPEN)?;
  if rest[close] != MARKER_CLOSE {
    return None;
  }
  let name: String = rest[..close].iter().collect();
  name.parse().ok()
}
