//! PATCH-DOC: a batch of document changes.
//!
//! Content is the patch JSON produced by
//! [`patch_json`](docpatch_document::patch_json): the encoded events plus a
//! snapshot of every model a receiver needs to replay them.

use docpatch_document::{patch_json, DocumentChangedEvent, DocumentId};
use serde_json::Value;
use tracing::debug;

use crate::error::ProtocolError;
use crate::header::{Header, MsgType};
use crate::message::Message;

/// Builds a PATCH-DOC message from events raised by a single document.
pub fn create(events: &[DocumentChangedEvent]) -> Result<Message, ProtocolError> {
    let document = match documents(events).as_slice() {
        [] => return Err(ProtocolError::NoEvents),
        [only] => *only,
        _ => return Err(ProtocolError::MultipleDocuments),
    };
    let content = patch_json(events);
    let message = Message::new(Header::new(MsgType::PatchDoc), content);
    debug!(
        msgid = message.msgid(),
        %document,
        events = events.len(),
        "created PATCH-DOC message"
    );
    Ok(message)
}

/// The `"kind"` of every event a PATCH-DOC message carries, in order.
pub fn event_kinds(message: &Message) -> Vec<&str> {
    message
        .content()
        .get("events")
        .and_then(Value::as_array)
        .map(|events| {
            events
                .iter()
                .filter_map(|e| e.get("kind").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

/// Distinct source documents of `events`, in first-seen order.
pub fn documents(events: &[DocumentChangedEvent]) -> Vec<DocumentId> {
    let mut out: Vec<DocumentId> = Vec::new();
    for event in events {
        let id = event.document();
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
