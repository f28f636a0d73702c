//! Plain-text rendering of a document for the terminal.

use std::fmt::Write as _;

use the_segment::{
  Document,
  Segment,
  render::{
    Span,
    render,
  },
};
use the_session::Session;

/// Segment text with every tag drawn as its locked label in brackets,
/// followed by `|ctype` when the tag declares a content type.
pub fn labeled(segment: &Segment) -> String {
  render(segment)
    .into_iter()
    .fold(String::new(), |mut out, span| {
      match span {
        Span::Text(text) => out.push_str(text),
        Span::Tag(tag) => {
          match &tag.ctype {
            Some(ctype) => {
              let _ = write!(out, "[{}|{ctype}]", tag.label());
            },
            None => {
              let _ = write!(out, "[{}]", tag.label());
            },
          }
        },
      }
      out
    })
}

/// Listing of every file and visible unit of the session's document. With
/// `tags` set, the attributes of each source tag follow the source line.
pub fn document_listing(session: &Session, tags: bool) -> String {
  let Some(document) = session.document() else {
    return String::from("no document loaded\n");
  };
  let mut out = String::new();
  let _ = writeln!(out, "XLIFF {}", document.version);
  write_files(&mut out, session, document, tags);
  out
}

fn write_files(out: &mut String, session: &Session, document: &Document, tags: bool) {
  let filter = session.filter();
  for (file_index, file) in document.files.iter().enumerate() {
    let (visible, total) = session
      .visible_count(file_index)
      .unwrap_or((0, file.trans_units.len()));
    let target_language = file.target_language.as_deref().unwrap_or("?");
    let _ = writeln!(
      out,
      "{} ({} -> {}) {visible}/{total}",
      file.original, file.source_language, target_language
    );

    for unit in file.trans_units.iter().filter(|unit| filter.is_visible(unit)) {
      let state = unit.state.as_deref().unwrap_or("new");
      let _ = writeln!(out, "  {} [{state}]", unit.id);
      let _ = writeln!(out, "    source: {}", labeled(&unit.source));
      if !unit.source.tags.is_empty() {
        let _ = writeln!(out, "    plain:  {}", unit.source.plain_text());
      }
      if tags {
        for tag in &unit.source.tags {
          let details = tag.tooltip().replace('\n', ", ");
          let _ = writeln!(out, "      tag {}: {details}", tag.position);
        }
      }
      match &unit.target {
        Some(target) => {
          let _ = writeln!(out, "    target: {}", labeled(target));
        },
        None => {
          let _ = writeln!(out, "    target: -");
        },
      }
      for note in &unit.notes {
        let _ = writeln!(out, "    note:   {note}");
      }
    }
  }
}
