//! SERVER-INFO-REQ and SERVER-INFO-REPLY.

use serde_json::json;

use crate::header::{Header, MsgType};
use crate::message::Message;

pub fn req() -> Message {
    Message::new(Header::new(MsgType::ServerInfoReq), json!({}))
}

/// Reply content: `{"version_info": {"docpatch": .., "protocol": ..}}`.
pub fn reply(reqid: impl Into<String>, protocol_version: &str) -> Message {
    Message::new(
        Header::reply(MsgType::ServerInfoReply, reqid),
        json!({
            "version_info": {
                "docpatch": crate::version(),
                "protocol": protocol_version,
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_reports_versions() {
        let msg = reply("r1", "1.0");
        assert_eq!(msg.content()["version_info"]["protocol"], json!("1.0"));
        assert_eq!(msg.content()["version_info"]["docpatch"], json!(crate::version()));
        assert_eq!(msg.reqid(), Some("r1"));
    }
}
