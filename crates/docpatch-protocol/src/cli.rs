//! Logic behind the `docpatch` binary.
//!
//! - `apply`     — apply a message to a document, returning the new document
//! - `inspect`   — summarize a message
//! - `roundtrip` — load and re-serialize a document

use docpatch_document::Document;
use serde_json::{json, Value};

use crate::error::ProtocolError;
use crate::header::MsgType;
use crate::messages::{control, document_sync, patch_doc};
use crate::protocol::Protocol;

fn render(v: &Value, pretty: bool) -> Result<String, ProtocolError> {
    Ok(if pretty {
        serde_json::to_string_pretty(v)?
    } else {
        serde_json::to_string(v)?
    })
}

/// Applies the message envelope `message_json` to the document
/// `document_json` and returns the resulting document JSON.
pub fn apply(
    protocol: &Protocol,
    document_json: &str,
    message_json: &str,
    pretty: bool,
) -> Result<String, ProtocolError> {
    let mut doc = Document::from_json_string(document_json)?;
    let envelope: Value = serde_json::from_str(message_json)?;
    let message = protocol.assemble_json(&envelope)?;
    message.apply_to_document(&mut doc, None)?;
    render(&doc.to_json(), pretty)
}

/// Summarizes the message envelope `message_json`.
pub fn inspect(protocol: &Protocol, message_json: &str, pretty: bool) -> Result<String, ProtocolError> {
    let envelope: Value = serde_json::from_str(message_json)?;
    let message = protocol.assemble_json(&envelope)?;
    let mut summary = json!({
        "msgtype": message.msgtype().as_str(),
        "msgid": message.msgid(),
        "reqid": message.reqid(),
    });
    match message.msgtype() {
        MsgType::PatchDoc => {
            summary["events"] = json!(patch_doc::event_kinds(&message));
            summary["references"] = json!(message
                .content()
                .get("references")
                .and_then(Value::as_array)
                .map_or(0, Vec::len));
        }
        MsgType::PushDoc | MsgType::PullDocReply => {
            let doc = document_sync::carried_document(&message)?;
            summary["title"] = json!(doc.title());
            summary["roots"] = json!(doc.root_ids().len());
            summary["models"] = json!(doc.all_models().count());
        }
        MsgType::Error => {
            let report = control::error_report(&message)?;
            summary["text"] = json!(report.text);
        }
        _ => {}
    }
    render(&summary, pretty)
}

/// Loads and re-serializes a document.
pub fn roundtrip(document_json: &str, pretty: bool) -> Result<String, ProtocolError> {
    let doc = Document::from_json_string(document_json)?;
    render(&doc.to_json(), pretty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpatch_document::Model;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.add_root(Model::new("Thing").with("foo", 1), None).unwrap();
        doc
    }

    #[test]
    fn apply_patches_the_document() {
        let mut doc = sample();
        let original = doc.to_json_string();
        let root = doc.root_ids()[0].clone();
        let events = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = std::sync::Arc::clone(&events);
        doc.on_change(move |e| sink.lock().unwrap().push(e.clone()));
        doc.set_property(&root, "foo", 9, None).unwrap();

        let protocol = Protocol::default();
        let message = protocol.create_patch_doc(&events.lock().unwrap()).unwrap();
        let envelope = message.to_json().unwrap().to_string();

        let out: Value = serde_json::from_str(&apply(&protocol, &original, &envelope, false).unwrap()).unwrap();
        assert_eq!(out, doc.to_json());
    }

    #[test]
    fn inspect_lists_event_kinds() {
        let doc = sample();
        let protocol = Protocol::default();
        let envelope = protocol.create_push_doc(&doc).unwrap().to_json().unwrap().to_string();
        let summary: Value = serde_json::from_str(&inspect(&protocol, &envelope, true).unwrap()).unwrap();
        assert_eq!(summary["msgtype"], json!("PUSH-DOC"));
        assert_eq!(summary["roots"], json!(1));
        assert_eq!(summary["reqid"], Value::Null);
    }

    #[test]
    fn roundtrip_is_stable() {
        let text = sample().to_json_string();
        assert_eq!(roundtrip(&text, false).unwrap(), text);
    }
}
