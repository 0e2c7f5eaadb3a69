//! Replaying patch JSON (as produced by [`patch_json`](crate::events::patch_json))
//! onto a document.

use serde_json::Value;
use tracing::{debug, trace};

use super::Document;
use crate::columns;
use crate::error::DocumentError;
use crate::ids::{ModelId, Setter};
use crate::model::Model;
use crate::value::{ModelRef, PropValue};

fn field<'a>(event: &'a Value, key: &str) -> Result<&'a Value, DocumentError> {
    event
        .get(key)
        .ok_or_else(|| DocumentError::Malformed(format!("patch event is missing {key:?}")))
}

fn model_id(event: &Value, key: &str) -> Result<ModelId, DocumentError> {
    ModelRef::from_json(field(event, key)?)
        .map(|r| r.id)
        .ok_or_else(|| DocumentError::Malformed(format!("{key:?} must be a model reference")))
}

impl Document {
    /// Applies `{"events": [..], "references": [..]}` to this document.
    ///
    /// References not yet in the document are instantiated; references that
    /// are already present have their attributes updated. Events are then
    /// replayed in order. Every notification raised on the way carries
    /// `setter`.
    ///
    /// Application is not transactional: when an event fails, the events
    /// before it stay applied. Models brought in by the patch that no root
    /// reaches are dropped either way.
    pub fn apply_json_patch(
        &mut self,
        patch: &Value,
        setter: Option<Setter>,
    ) -> Result<(), DocumentError> {
        let references = match patch.get("references") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(refs)) => refs
                .iter()
                .map(Model::from_json)
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(DocumentError::Malformed("\"references\" must be an array".into())),
        };
        let events = patch
            .get("events")
            .and_then(Value::as_array)
            .ok_or_else(|| DocumentError::Malformed("patch is missing an \"events\" array".into()))?;

        debug!(
            document = %self.id,
            events = events.len(),
            references = references.len(),
            "applying patch"
        );

        let result = self.replay(references, events, setter);
        self.collect_garbage();
        result
    }

    /// Adopts `references` and replays `events`. References adopted before
    /// a failure are left for the caller's garbage collection.
    fn replay(
        &mut self,
        references: Vec<Model>,
        events: &[Value],
        setter: Option<Setter>,
    ) -> Result<(), DocumentError> {
        let (known, fresh): (Vec<Model>, Vec<Model>) =
            references.into_iter().partition(|m| self.contains(m.id()));
        self.adopt(fresh)?;
        for model in known {
            for (attr, value) in model.properties() {
                self.check_refs(value)?;
                self.assign(model.id(), attr, value.clone(), setter)?;
            }
        }
        for event in events {
            self.apply_patch_event(event, setter)?;
        }
        Ok(())
    }

    fn apply_patch_event(&mut self, event: &Value, setter: Option<Setter>) -> Result<(), DocumentError> {
        let kind = field(event, "kind")?
            .as_str()
            .ok_or_else(|| DocumentError::Malformed("event kind must be a string".into()))?;
        trace!(document = %self.id, kind, "replaying patch event");
        match kind {
            "ModelChanged" => {
                let id = model_id(event, "model")?;
                if !self.contains(&id) {
                    return Err(DocumentError::PatchTargetMissing(id));
                }
                let attr = field(event, "attr")?
                    .as_str()
                    .ok_or_else(|| DocumentError::Malformed("\"attr\" must be a string".into()))?;
                let value = PropValue::from_json(field(event, "new")?);
                self.check_refs(&value)?;
                self.assign(&id, attr, value, setter)
            }
            "ColumnDataChanged" => {
                let id = model_id(event, "column_source")?;
                let mut data = columns::data_from_json(field(event, "new")?)?;
                if let Some(Value::Array(cols)) = event.get("cols") {
                    data.retain(|name, _| cols.iter().any(|c| c.as_str() == Some(name.as_str())));
                }
                self.replace_columns(&id, data, setter)
            }
            "ColumnsStreamed" => {
                let id = model_id(event, "column_source")?;
                let data = columns::data_from_json(field(event, "data")?)?;
                let rollover = match event.get("rollover") {
                    None | Some(Value::Null) => None,
                    Some(r) => Some(
                        r.as_u64()
                            .and_then(|r| usize::try_from(r).ok())
                            .ok_or_else(|| {
                                DocumentError::Malformed(format!("invalid \"rollover\": {r}"))
                            })?,
                    ),
                };
                self.stream(&id, data, rollover, setter)
            }
            "ColumnsPatched" => {
                let id = model_id(event, "column_source")?;
                let patches = columns::patches_from_json(field(event, "patches")?)?;
                self.patch(&id, patches, setter)
            }
            "RootAdded" => {
                let id = model_id(event, "model")?;
                self.attach_root(&id, setter)
            }
            "RootRemoved" => {
                let id = model_id(event, "model")?;
                self.detach_root(&id, setter)
            }
            "TitleChanged" => {
                let title = field(event, "title")?
                    .as_str()
                    .ok_or_else(|| DocumentError::Malformed("\"title\" must be a string".into()))?;
                self.set_title(title, setter);
                Ok(())
            }
            other => Err(DocumentError::UnknownEventKind(other.to_owned())),
        }
    }

    /// Replaces this document's roots and title with those of the document
    /// encoded in `json`, notifying listeners of every removal and addition.
    pub fn replace_with_json(&mut self, json: &Value, setter: Option<Setter>) -> Result<(), DocumentError> {
        let replacement = Document::from_json(json)?;
        for id in self.roots.clone() {
            self.detach_root(&id, setter)?;
        }
        self.collect_garbage();
        let Document {
            title,
            roots,
            models,
            ..
        } = replacement;
        self.models.extend(models);
        for id in &roots {
            self.attach_root(id, setter)?;
        }
        self.set_title(title, setter);
        debug!(document = %self.id, roots = self.roots.len(), "replaced document contents");
        Ok(())
    }
}
