#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use docpatch_document::{
    ColumnData, Document, DocumentChangedEvent, Model, ModelRef, PropValue,
};

pub const SOME_MODEL: &str = "SomeModel";
pub const ANOTHER_MODEL: &str = "AnotherModel";

pub fn another_model() -> Model {
    Model::new(ANOTHER_MODEL).with("bar", 1)
}

pub fn some_model() -> Model {
    Model::new(SOME_MODEL).with("foo", 2).with("child", PropValue::Null)
}

/// Two roots: the first holds a child, the second does not.
pub fn sample_doc() -> (Document, ModelRef, ModelRef) {
    let mut doc = Document::new();
    let with_child = doc
        .add_root(some_model().with("child", another_model()), None)
        .expect("add first root");
    let without_child = doc.add_root(some_model(), None).expect("add second root");
    (doc, with_child, without_child)
}

pub fn column_data(cols: &[(&str, &[i64])]) -> ColumnData {
    cols.iter()
        .map(|(name, values)| {
            (
                name.to_string(),
                values.iter().copied().map(PropValue::Int).collect(),
            )
        })
        .collect()
}

pub fn record_events(doc: &mut Document) -> Arc<Mutex<Vec<DocumentChangedEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    doc.on_change(move |event| sink.lock().unwrap().push(event.clone()));
    seen
}

pub fn foos(doc: &Document) -> Vec<i64> {
    let mut out: Vec<i64> = doc
        .roots()
        .filter_map(|m| m.get("foo").and_then(PropValue::as_i64))
        .collect();
    out.sort();
    out
}
