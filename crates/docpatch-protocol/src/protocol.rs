//! Protocol versions and message construction.

use docpatch_document::{Document, DocumentChangedEvent};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::ProtocolError;
use crate::header::{Header, MsgType};
use crate::message::Message;
use crate::messages::{control, document_sync, patch_doc, server_info};

pub const DEFAULT_VERSION: &str = "1.0";

/// Message types understood by each protocol version.
const VERSIONS: &[(&str, &[MsgType])] = &[("1.0", &MsgType::ALL)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protocol {
    version: &'static str,
    supported: &'static [MsgType],
}

impl Default for Protocol {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
            supported: &MsgType::ALL,
        }
    }
}

impl Protocol {
    pub fn new(version: &str) -> Result<Self, ProtocolError> {
        let &(version, supported) = VERSIONS
            .iter()
            .find(|(v, _)| *v == version)
            .ok_or_else(|| ProtocolError::UnknownVersion(version.to_owned()))?;
        Ok(Self { version, supported })
    }

    pub fn versions() -> impl Iterator<Item = &'static str> {
        VERSIONS.iter().map(|(v, _)| *v)
    }

    pub fn version(&self) -> &str {
        self.version
    }

    pub fn supports(&self, msgtype: MsgType) -> bool {
        self.supported.contains(&msgtype)
    }

    fn check(&self, msgtype: MsgType) -> Result<(), ProtocolError> {
        if self.supports(msgtype) {
            Ok(())
        } else {
            Err(ProtocolError::UnsupportedMsgType {
                msgtype,
                version: self.version.to_owned(),
            })
        }
    }

    /// Fails when `events` is empty or spans more than one document.
    pub fn create_patch_doc(&self, events: &[DocumentChangedEvent]) -> Result<Message, ProtocolError> {
        self.check(MsgType::PatchDoc)?;
        patch_doc::create(events)
    }

    pub fn create_push_doc(&self, doc: &Document) -> Result<Message, ProtocolError> {
        self.check(MsgType::PushDoc)?;
        Ok(document_sync::push_doc(doc))
    }

    pub fn create_pull_doc_req(&self) -> Result<Message, ProtocolError> {
        self.check(MsgType::PullDocReq)?;
        Ok(document_sync::pull_doc_req())
    }

    pub fn create_pull_doc_reply(&self, reqid: impl Into<String>, doc: &Document) -> Result<Message, ProtocolError> {
        self.check(MsgType::PullDocReply)?;
        Ok(document_sync::pull_doc_reply(reqid, doc))
    }

    pub fn create_ok(&self, reqid: impl Into<String>) -> Result<Message, ProtocolError> {
        self.check(MsgType::Ok)?;
        Ok(control::ok(reqid))
    }

    pub fn create_error(
        &self,
        reqid: impl Into<String>,
        text: impl Into<String>,
        traceback: Option<String>,
    ) -> Result<Message, ProtocolError> {
        self.check(MsgType::Error)?;
        control::error(reqid, text, traceback)
    }

    pub fn create_ack(&self) -> Result<Message, ProtocolError> {
        self.check(MsgType::Ack)?;
        Ok(control::ack())
    }

    pub fn create_server_info_req(&self) -> Result<Message, ProtocolError> {
        self.check(MsgType::ServerInfoReq)?;
        Ok(server_info::req())
    }

    pub fn create_server_info_reply(&self, reqid: impl Into<String>) -> Result<Message, ProtocolError> {
        self.check(MsgType::ServerInfoReply)?;
        Ok(server_info::reply(reqid, self.version))
    }

    /// Builds a message from its three received text frames.
    pub fn assemble(&self, header: &str, metadata: &str, content: &str) -> Result<Message, ProtocolError> {
        let header: Value = serde_json::from_str(header)?;
        let header = Header::from_json(&header)?;
        self.check(header.msgtype)?;
        let metadata: Value = serde_json::from_str(metadata)?;
        if !metadata.is_object() {
            return Err(ProtocolError::Malformed("metadata frame must be a JSON object".into()));
        }
        let content: Value = serde_json::from_str(content)?;
        trace!(msgid = %header.msgid, msgtype = %header.msgtype, "assembled message");
        Ok(Message::from_parts(header, metadata, content))
    }

    /// Like [`Protocol::assemble`], for the single-object envelope form.
    pub fn assemble_json(&self, envelope: &Value) -> Result<Message, ProtocolError> {
        let message = Message::from_json(envelope)?;
        self.check(message.msgtype())?;
        debug!(msgid = message.msgid(), msgtype = %message.msgtype(), "decoded message envelope");
        Ok(message)
    }
}
