//! Content builders for each message type.
//!
//! These build messages without consulting a protocol version; callers
//! normally go through [`Protocol`](crate::Protocol), which checks the type
//! is supported first.

pub mod control;
pub mod document_sync;
pub mod patch_doc;
pub mod server_info;
