//! A protocol message: header, metadata and content.
//!
//! On the wire a message travels as three text frames, one JSON document
//! each, in the order header, metadata, content. Files written by the
//! `docpatch` tool hold the same three parts in a single envelope object:
//!
//! ```json
//! {"header": {..}, "metadata": {..}, "content": {..}}
//! ```

use docpatch_document::{Document, Setter};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ProtocolError;
use crate::header::{Header, MsgType};

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    header: Header,
    metadata: Value,
    content: Value,
}

impl Message {
    pub(crate) fn new(header: Header, content: Value) -> Self {
        Self {
            header,
            metadata: Value::Object(Map::new()),
            content,
        }
    }

    pub(crate) fn from_parts(header: Header, metadata: Value, content: Value) -> Self {
        Self {
            header,
            metadata,
            content,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn msgtype(&self) -> MsgType {
        self.header.msgtype
    }

    pub fn msgid(&self) -> &str {
        &self.header.msgid
    }

    pub fn reqid(&self) -> Option<&str> {
        self.header.reqid.as_deref()
    }

    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    /// The header, metadata and content frames, in send order.
    pub fn to_frames(&self) -> Result<[String; 3], ProtocolError> {
        Ok([
            serde_json::to_string(&self.header)?,
            self.metadata.to_string(),
            self.content.to_string(),
        ])
    }

    pub fn to_json(&self) -> Result<Value, ProtocolError> {
        let mut m = Map::new();
        m.insert("header".into(), self.header.to_json()?);
        m.insert("metadata".into(), self.metadata.clone());
        m.insert("content".into(), self.content.clone());
        Ok(Value::Object(m))
    }

    /// Decodes the envelope form written by [`Message::to_json`].
    ///
    /// This does not check the message type against a protocol version; use
    /// [`Protocol::assemble_json`](crate::Protocol::assemble_json) for that.
    pub fn from_json(v: &Value) -> Result<Self, ProtocolError> {
        let part = |key: &str| {
            v.get(key)
                .ok_or_else(|| ProtocolError::Malformed(format!("message is missing {key:?}")))
        };
        let header = Header::from_json(part("header")?)?;
        let metadata = match v.get("metadata") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(m) => m.clone(),
        };
        Ok(Self::from_parts(header, metadata, part("content")?.clone()))
    }

    /// Applies a document-carrying message to `doc`.
    ///
    /// PATCH-DOC replays its events; PUSH-DOC and PULL-DOC-REPLY replace the
    /// document's roots and title. Every change notification raised on `doc`
    /// carries `setter`. Other message types are rejected.
    pub fn apply_to_document(&self, doc: &mut Document, setter: Option<Setter>) -> Result<(), ProtocolError> {
        debug!(
            msgid = %self.header.msgid,
            msgtype = %self.header.msgtype,
            document = %doc.id(),
            "applying message to document"
        );
        match self.header.msgtype {
            MsgType::PatchDoc => doc.apply_json_patch(&self.content, setter)?,
            MsgType::PushDoc | MsgType::PullDocReply => {
                let carried = self.content.get("doc").ok_or_else(|| {
                    ProtocolError::Malformed(format!("{} content is missing \"doc\"", self.header.msgtype))
                })?;
                doc.replace_with_json(carried, setter)?;
            }
            other => return Err(ProtocolError::NotApplicable(other)),
        }
        Ok(())
    }
}
