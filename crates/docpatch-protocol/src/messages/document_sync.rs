//! Whole-document transfer: PUSH-DOC, PULL-DOC-REQ and PULL-DOC-REPLY.
//!
//! PUSH-DOC and PULL-DOC-REPLY carry `{"doc": <document json>}`; a
//! PULL-DOC-REQ has empty content.

use docpatch_document::Document;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ProtocolError;
use crate::header::{Header, MsgType};
use crate::message::Message;

pub fn push_doc(doc: &Document) -> Message {
    debug!(document = %doc.id(), "created PUSH-DOC message");
    Message::new(Header::new(MsgType::PushDoc), json!({ "doc": doc.to_json() }))
}

pub fn pull_doc_req() -> Message {
    Message::new(Header::new(MsgType::PullDocReq), json!({}))
}

pub fn pull_doc_reply(reqid: impl Into<String>, doc: &Document) -> Message {
    debug!(document = %doc.id(), "created PULL-DOC-REPLY message");
    Message::new(
        Header::reply(MsgType::PullDocReply, reqid),
        json!({ "doc": doc.to_json() }),
    )
}

/// Builds a new document from the one carried by a PUSH-DOC or
/// PULL-DOC-REPLY message.
pub fn carried_document(message: &Message) -> Result<Document, ProtocolError> {
    match message.msgtype() {
        MsgType::PushDoc | MsgType::PullDocReply => {}
        other => return Err(ProtocolError::NotApplicable(other)),
    }
    let doc = message
        .content()
        .get("doc")
        .filter(|d| !d.is_null())
        .ok_or_else(|| ProtocolError::Malformed(format!("{} content is missing \"doc\"", message.msgtype())))?;
    Ok(Document::from_json(doc)?)
}

/// Whether `message` carries a document.
pub fn has_document(message: &Message) -> bool {
    matches!(message.content().get("doc"), Some(Value::Object(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpatch_document::Model;

    #[test]
    fn reply_names_the_request() {
        let req = pull_doc_req();
        let doc = Document::new();
        let reply = pull_doc_reply(req.msgid(), &doc);
        assert_eq!(reply.reqid(), Some(req.msgid()));
        assert!(has_document(&reply));
        assert!(!has_document(&req));
    }

    #[test]
    fn carried_document_matches_source() {
        let mut doc = Document::new();
        doc.add_root(Model::new("Thing").with("foo", 1), None).unwrap();
        let copy = carried_document(&push_doc(&doc)).unwrap();
        assert_eq!(copy.to_json(), doc.to_json());
    }

    #[test]
    fn requests_carry_no_document() {
        assert!(matches!(
            carried_document(&pull_doc_req()),
            Err(ProtocolError::NotApplicable(MsgType::PullDocReq))
        ));
    }
}
