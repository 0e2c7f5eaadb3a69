//! ACK, OK and ERROR.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ProtocolError;
use crate::header::{Header, MsgType};
use crate::message::Message;

/// Content of an ERROR message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub text: String,
    #[serde(default)]
    pub traceback: Option<String>,
}

/// Sent once a connection is established.
pub fn ack() -> Message {
    Message::new(Header::new(MsgType::Ack), json!({}))
}

pub fn ok(reqid: impl Into<String>) -> Message {
    Message::new(Header::reply(MsgType::Ok, reqid), json!({}))
}

pub fn error(reqid: impl Into<String>, text: impl Into<String>, traceback: Option<String>) -> Result<Message, ProtocolError> {
    let report = ErrorReport {
        text: text.into(),
        traceback,
    };
    Ok(Message::new(
        Header::reply(MsgType::Error, reqid),
        serde_json::to_value(report)?,
    ))
}

/// Decodes the content of an ERROR message.
pub fn error_report(message: &Message) -> Result<ErrorReport, ProtocolError> {
    if message.msgtype() != MsgType::Error {
        return Err(ProtocolError::Malformed(format!(
            "expected an ERROR message, got {}",
            message.msgtype()
        )));
    }
    Ok(serde_json::from_value(message.content().clone())?)
}
