use docpatch_document::DocumentError;
use thiserror::Error;

use crate::header::MsgType;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown protocol version {0:?}")]
    UnknownVersion(String),
    #[error("unknown message type {0:?}")]
    UnknownMsgType(String),
    #[error("message type {msgtype} is not supported by protocol version {version}")]
    UnsupportedMsgType { msgtype: MsgType, version: String },
    #[error("PATCH-DOC message requires at least one event")]
    NoEvents,
    #[error("PATCH-DOC message configured with events for more than one document")]
    MultipleDocuments,
    #[error("{0} messages cannot be applied to a document")]
    NotApplicable(MsgType),
    #[error("malformed message: {0}")]
    Malformed(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
