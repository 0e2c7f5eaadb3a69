//! PATCH-DOC wire protocol.
//!
//! A [`Protocol`] builds [`Message`]s for one protocol version; a
//! [`Receiver`] reassembles them from their header / metadata / content
//! frames. Messages that carry document state (PATCH-DOC, PUSH-DOC,
//! PULL-DOC-REPLY) apply to a [`docpatch_document::Document`] through
//! [`Message::apply_to_document`].

pub mod cli;
pub mod error;
pub mod header;
pub mod message;
pub mod messages;
pub mod protocol;
pub mod receiver;

pub use error::ProtocolError;
pub use header::{Header, MsgType};
pub use message::Message;
pub use protocol::{Protocol, DEFAULT_VERSION};
pub use receiver::Receiver;

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
