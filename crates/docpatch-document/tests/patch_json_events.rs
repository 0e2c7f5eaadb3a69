mod common;

use common::{another_model, column_data, record_events, sample_doc, ANOTHER_MODEL};
use docpatch_document::{
    coalesce, patch_json, ColumnPatches, ColumnsHint, Document, DocumentChangedEvent, Model, PatchIndex,
    PropValue, Setter,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn kinds(events: &[DocumentChangedEvent]) -> Vec<&'static str> {
    events.iter().map(DocumentChangedEvent::kind).collect()
}

#[test]
fn replacing_a_child_ships_the_new_child() {
    let (mut doc, with_child, _) = sample_doc();
    let seen = record_events(&mut doc);

    let child = another_model().with("bar", 56);
    let child_id = child.id().clone();
    doc.set_property(&with_child.id, "child", child, None).unwrap();

    let events = seen.lock().unwrap().clone();
    assert_eq!(kinds(&events), vec!["ModelChanged"]);
    let patch = patch_json(&events);
    assert_eq!(patch["events"][0]["attr"], json!("child"));
    assert_eq!(
        patch["events"][0]["new"],
        json!({"id": child_id.as_str(), "type": ANOTHER_MODEL})
    );
    let references = patch["references"].as_array().unwrap();
    assert_eq!(references.len(), 1);
    assert_eq!(references[0]["attributes"]["bar"], json!(56));
}

#[test]
fn patch_replays_onto_a_copy() {
    let (mut doc, with_child, without_child) = sample_doc();
    let mut copy = Document::from_json(&doc.to_json()).unwrap();
    let seen = record_events(&mut doc);

    doc.set_property(&with_child.id, "foo", 42, None).unwrap();
    doc.set_property(&without_child.id, "child", another_model().with("bar", 3), None)
        .unwrap();
    doc.add_root(Model::new("Extra").with("child", another_model()), None)
        .unwrap();
    doc.remove_root(&with_child.id, None).unwrap();
    doc.set_title("Renamed", None);

    let events = seen.lock().unwrap().clone();
    copy.apply_json_patch(&patch_json(&events), None).unwrap();

    assert_eq!(copy.to_json(), doc.to_json());
}

#[test]
fn replayed_events_carry_the_setter() {
    let (doc, with_child, _) = sample_doc();
    let mut copy = Document::from_json(&doc.to_json()).unwrap();
    let seen = record_events(&mut copy);
    let setter = Setter::new();

    copy.apply_json_patch(
        &json!({
            "events": [
                {"kind": "ModelChanged", "model": with_child.to_json(), "attr": "foo", "new": 7},
                {"kind": "TitleChanged", "title": "Remote"}
            ],
            "references": []
        }),
        Some(setter),
    )
    .unwrap();

    let events = seen.lock().unwrap();
    assert_eq!(kinds(&events), vec!["ModelChanged", "TitleChanged"]);
    assert!(events.iter().all(|e| e.setter() == Some(setter)));
}

#[test]
fn column_updates_replay_through_hints() {
    let mut doc = Document::new();
    let cds = doc
        .add_root(Model::column_data_source(column_data(&[("x", &[1, 2]), ("y", &[3, 4])])), None)
        .unwrap();
    let mut copy = Document::from_json(&doc.to_json()).unwrap();
    let seen = record_events(&mut doc);

    doc.stream(&cds.id, column_data(&[("x", &[5]), ("y", &[6])]), Some(2), None)
        .unwrap();
    let mut patches = ColumnPatches::new();
    patches.insert("y".into(), vec![(PatchIndex::Index(0), PropValue::Int(60))]);
    doc.patch(&cds.id, patches, None).unwrap();

    let events = seen.lock().unwrap().clone();
    let patch = patch_json(&events);
    let event_kinds: Vec<&Value> = patch["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| &e["kind"])
        .collect();
    assert_eq!(event_kinds, vec![&json!("ColumnsStreamed"), &json!("ColumnsPatched")]);
    assert_eq!(patch["references"], json!([]));

    copy.apply_json_patch(&patch, None).unwrap();
    let cols = copy.get_model_by_id(&cds.id).unwrap().columns().unwrap();
    assert_eq!(cols["x"], vec![PropValue::Int(2), PropValue::Int(5)]);
    assert_eq!(cols["y"], vec![PropValue::Int(60), PropValue::Int(6)]);
}

#[test]
fn coalesce_keeps_the_latest_value() {
    let (mut doc, with_child, _) = sample_doc();
    let seen = record_events(&mut doc);
    doc.set_property(&with_child.id, "foo", 3, None).unwrap();
    doc.set_property(&with_child.id, "foo", 4, None).unwrap();
    doc.set_title("a", None);
    doc.set_title("b", None);

    let merged = coalesce(seen.lock().unwrap().clone());
    assert_eq!(kinds(&merged), vec!["ModelChanged", "TitleChanged"]);
    let patch = patch_json(&merged);
    assert_eq!(patch["events"][0]["new"], json!(4));
    assert_eq!(patch["events"][1]["title"], json!("b"));
}

#[test]
fn coalesce_keeps_each_setters_change() {
    let (mut doc, with_child, _) = sample_doc();
    let seen = record_events(&mut doc);
    let (a, b) = (Setter::new(), Setter::new());
    doc.set_property(&with_child.id, "foo", 3, Some(a)).unwrap();
    doc.set_property(&with_child.id, "foo", 4, Some(b)).unwrap();
    doc.set_property(&with_child.id, "foo", 5, Some(b)).unwrap();

    let merged = coalesce(seen.lock().unwrap().clone());
    let setters: Vec<Option<Setter>> = merged.iter().map(DocumentChangedEvent::setter).collect();
    assert_eq!(setters, vec![Some(a), Some(b)]);
    let patch = patch_json(&merged);
    assert_eq!(patch["events"][0]["new"], json!(3));
    assert_eq!(patch["events"][1]["new"], json!(5));
}

#[test]
fn replaced_columns_replay_onto_a_copy() {
    let mut doc = Document::new();
    let cds = doc
        .add_root(Model::column_data_source(column_data(&[("x", &[1, 2]), ("y", &[3, 4])])), None)
        .unwrap();
    let mut copy = Document::from_json(&doc.to_json()).unwrap();
    let seen = record_events(&mut doc);

    doc.replace_columns(&cds.id, column_data(&[("y", &[7, 8, 9])]), None)
        .unwrap();
    let events = seen.lock().unwrap().clone();
    let patch = patch_json(&events);
    assert_eq!(patch["events"][0]["kind"], json!("ColumnDataChanged"));
    assert_eq!(patch["events"][0]["cols"], json!(["y"]));
    assert_eq!(patch["references"], json!([]));

    let setter = Setter::new();
    let replayed = record_events(&mut copy);
    copy.apply_json_patch(&patch, Some(setter)).unwrap();

    assert_eq!(copy.to_json(), doc.to_json());
    let replayed = replayed.lock().unwrap();
    assert_eq!(kinds(&replayed), vec!["ModelChanged"]);
    assert_eq!(replayed[0].setter(), Some(setter));
}

#[test]
fn column_data_changed_only_replaces_listed_columns() {
    let mut doc = Document::new();
    let cds = doc
        .add_root(Model::column_data_source(column_data(&[("x", &[1]), ("y", &[2])])), None)
        .unwrap();
    let setter = Setter::new();
    let seen = record_events(&mut doc);

    doc.apply_json_patch(
        &json!({
            "events": [{
                "kind": "ColumnDataChanged",
                "column_source": cds.to_json(),
                "new": {"x": [10], "y": [20]},
                "cols": ["x"]
            }]
        }),
        Some(setter),
    )
    .unwrap();

    let cols = doc.get_model_by_id(&cds.id).unwrap().columns().unwrap();
    assert_eq!(cols["x"], vec![PropValue::Int(10)]);
    assert_eq!(cols["y"], vec![PropValue::Int(2)]);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    match &seen[0] {
        DocumentChangedEvent::ModelChanged(e) => {
            assert_eq!(e.setter, Some(setter));
            match &e.hint {
                Some(ColumnsHint::DataChanged(hint)) => {
                    assert_eq!(hint.cols, Some(vec!["x".to_string()]));
                    assert_eq!(hint.setter, Some(setter));
                }
                other => panic!("unexpected hint {other:?}"),
            }
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn root_added_references_are_deduplicated() {
    let mut doc = Document::new();
    let seen = record_events(&mut doc);
    let shared = doc.add_root(another_model(), None).unwrap();
    doc.add_root(Model::new("Holder").with("child", shared.clone()), None)
        .unwrap();

    let patch = patch_json(&seen.lock().unwrap());
    let ids: Vec<&str> = patch["references"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["id"].as_str())
        .collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], shared.id.as_str());
}
