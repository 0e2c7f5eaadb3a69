#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use docpatch_document::{Document, DocumentChangedEvent, Model, ModelRef, PropValue};

pub const SOME_MODEL: &str = "SomeModel";
pub const ANOTHER_MODEL: &str = "AnotherModel";

pub fn another_model() -> Model {
    Model::new(ANOTHER_MODEL).with("bar", 1)
}

pub fn some_model() -> Model {
    Model::new(SOME_MODEL).with("foo", 2).with("child", PropValue::Null)
}

/// A document with two `SomeModel` roots; only the first has a child.
pub fn sample_doc() -> Document {
    let mut doc = Document::new();
    doc.add_root(some_model().with("child", another_model()), None)
        .expect("add root with child");
    doc.add_root(some_model(), None).expect("add childless root");
    doc
}

/// The root with a child and the root without one.
pub fn split_roots(doc: &Document) -> (ModelRef, ModelRef) {
    let with_child = doc
        .roots()
        .find(|r| r.get("child").is_some_and(|c| !c.is_null()))
        .map(Model::model_ref)
        .expect("root with child");
    let without_child = doc
        .roots()
        .find(|r| r.get("child").is_some_and(PropValue::is_null))
        .map(Model::model_ref)
        .expect("root without child");
    (with_child, without_child)
}

pub fn record_events(doc: &mut Document) -> Arc<Mutex<Vec<DocumentChangedEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    doc.on_change(move |event| sink.lock().unwrap().push(event.clone()));
    seen
}

pub fn sorted_foos(doc: &Document) -> Vec<i64> {
    let mut foos: Vec<i64> = doc
        .roots()
        .filter_map(|r| r.get("foo").and_then(PropValue::as_i64))
        .collect();
    foos.sort();
    foos
}
