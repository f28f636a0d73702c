//! Interactive editing session over a backend-held translation document.
//!
//! The session owns three independent pieces of state: the [`Document`]
//! cache, the [`EditBuffer`] of the selected unit and the visibility filter
//! that drives navigation. They meet only in [`reconcile`], which joins the
//! edited text with the untouched tag list at save time.
//!
//! [`Document`]: the_segment::Document

pub mod backend;
pub mod buffer;
pub mod events;
pub mod http;
pub mod memory;
pub mod messages;
pub mod reconcile;
pub mod session;

pub use backend::{
  Backend,
  BackendError,
  ExportPayload,
};
pub use buffer::EditBuffer;
pub use reconcile::UpdateRequest;
pub use session::{
  ExportedFile,
  SaveStatus,
  SaveTicket,
  Session,
  SessionConfig,
  SessionError,
};
