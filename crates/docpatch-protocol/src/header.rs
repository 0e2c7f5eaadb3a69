//! Message headers.
//!
//! The header frame is a JSON object:
//!
//! ```json
//! {"msgid": "..", "msgtype": "PATCH-DOC", "reqid": ".."}
//! ```
//!
//! `reqid` is only present on replies and names the request's `msgid`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ProtocolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsgType {
    #[serde(rename = "ACK")]
    Ack,
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "PATCH-DOC")]
    PatchDoc,
    #[serde(rename = "PULL-DOC-REQ")]
    PullDocReq,
    #[serde(rename = "PULL-DOC-REPLY")]
    PullDocReply,
    #[serde(rename = "PUSH-DOC")]
    PushDoc,
    #[serde(rename = "SERVER-INFO-REQ")]
    ServerInfoReq,
    #[serde(rename = "SERVER-INFO-REPLY")]
    ServerInfoReply,
}

impl MsgType {
    pub const ALL: [MsgType; 9] = [
        MsgType::Ack,
        MsgType::Ok,
        MsgType::Error,
        MsgType::PatchDoc,
        MsgType::PullDocReq,
        MsgType::PullDocReply,
        MsgType::PushDoc,
        MsgType::ServerInfoReq,
        MsgType::ServerInfoReply,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MsgType::Ack => "ACK",
            MsgType::Ok => "OK",
            MsgType::Error => "ERROR",
            MsgType::PatchDoc => "PATCH-DOC",
            MsgType::PullDocReq => "PULL-DOC-REQ",
            MsgType::PullDocReply => "PULL-DOC-REPLY",
            MsgType::PushDoc => "PUSH-DOC",
            MsgType::ServerInfoReq => "SERVER-INFO-REQ",
            MsgType::ServerInfoReply => "SERVER-INFO-REPLY",
        }
    }

    /// Whether messages of this type answer an earlier request.
    pub fn is_reply(self) -> bool {
        matches!(
            self,
            MsgType::Ok | MsgType::Error | MsgType::PullDocReply | MsgType::ServerInfoReply
        )
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MsgType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MsgType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownMsgType(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub msgid: String,
    pub msgtype: MsgType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reqid: Option<String>,
}

impl Header {
    /// A header with a fresh message id.
    pub fn new(msgtype: MsgType) -> Self {
        Self {
            msgid: Uuid::new_v4().to_string(),
            msgtype,
            reqid: None,
        }
    }

    /// A header for a reply to the message `reqid`.
    pub fn reply(msgtype: MsgType, reqid: impl Into<String>) -> Self {
        Self {
            reqid: Some(reqid.into()),
            ..Self::new(msgtype)
        }
    }

    /// Decodes a header, reporting unrecognised message types by name.
    pub fn from_json(v: &Value) -> Result<Self, ProtocolError> {
        let msgtype = v
            .get("msgtype")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::Malformed("header is missing \"msgtype\"".into()))?;
        msgtype.parse::<MsgType>()?;
        Ok(serde_json::from_value(v.clone())?)
    }

    pub fn to_json(&self) -> Result<Value, ProtocolError> {
        Ok(serde_json::to_value(self)?)
    }
}
