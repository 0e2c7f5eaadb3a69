mod common;

use common::{record_events, sample_doc};
use docpatch_document::{Document, Model, Setter};
use docpatch_protocol::messages::{control, document_sync};
use docpatch_protocol::{MsgType, Protocol, ProtocolError, Receiver};
use pretty_assertions::assert_eq;

#[test]
fn push_doc_replaces_roots_and_title() {
    let protocol = Protocol::default();
    let mut source = sample_doc();
    source.set_title("Shared", None);
    let msg = protocol.create_push_doc(&source).unwrap();

    let mut target = Document::new();
    let stale = target.add_root(Model::new("Stale"), None).unwrap();
    let seen = record_events(&mut target);
    let setter = Setter::new();
    msg.apply_to_document(&mut target, Some(setter)).unwrap();

    assert_eq!(target.to_json(), source.to_json());
    assert!(!target.contains(&stale.id));
    let seen = seen.lock().unwrap();
    let kinds: Vec<&str> = seen.iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec!["RootRemoved", "RootAdded", "RootAdded", "TitleChanged"]);
    assert!(seen.iter().all(|e| e.setter() == Some(setter)));
}

#[test]
fn pull_doc_reply_answers_the_request() {
    let protocol = Protocol::default();
    let source = sample_doc();
    let req = protocol.create_pull_doc_req().unwrap();
    let reply = protocol.create_pull_doc_reply(req.msgid(), &source).unwrap();

    assert_eq!(reply.msgtype(), MsgType::PullDocReply);
    assert_eq!(reply.reqid(), Some(req.msgid()));

    let mut fresh = Document::new();
    reply.apply_to_document(&mut fresh, None).unwrap();
    assert_eq!(fresh.to_json(), source.to_json());
    assert_ne!(fresh.id(), source.id());

    let carried = document_sync::carried_document(&reply).unwrap();
    assert_eq!(carried.to_json(), source.to_json());
}

#[test]
fn request_messages_cannot_be_applied() {
    let protocol = Protocol::default();
    let mut doc = sample_doc();
    let before = doc.to_json();
    for msg in [
        protocol.create_pull_doc_req().unwrap(),
        protocol.create_server_info_req().unwrap(),
        protocol.create_ok("r").unwrap(),
    ] {
        assert!(matches!(
            msg.apply_to_document(&mut doc, None),
            Err(ProtocolError::NotApplicable(_))
        ));
    }
    assert_eq!(doc.to_json(), before);
}

#[test]
fn frames_survive_the_receiver() {
    let protocol = Protocol::default();
    let source = sample_doc();
    let mut receiver = Receiver::new(protocol.clone());
    let mut received = Vec::new();

    let sent = vec![
        protocol.create_ack().unwrap(),
        protocol.create_push_doc(&source).unwrap(),
        protocol.create_error("r1", "boom", None).unwrap(),
        protocol.create_server_info_reply("r2").unwrap(),
    ];
    for msg in &sent {
        for frame in msg.to_frames().unwrap() {
            if let Some(done) = receiver.consume(&frame).unwrap() {
                received.push(done);
            }
        }
    }

    assert_eq!(received, sent);
    assert_eq!(control::error_report(&received[2]).unwrap().text, "boom");
    assert_eq!(
        received[3].content()["version_info"]["protocol"],
        serde_json::json!("1.0")
    );
}

#[test]
fn envelopes_with_unknown_types_are_rejected() {
    let protocol = Protocol::default();
    let envelope = serde_json::json!({
        "header": {"msgid": "1", "msgtype": "EXPLODE"},
        "metadata": {},
        "content": {}
    });
    assert!(matches!(
        protocol.assemble_json(&envelope),
        Err(ProtocolError::UnknownMsgType(t)) if t == "EXPLODE"
    ));
}
