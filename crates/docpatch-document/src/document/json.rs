//! Document JSON codec.
//!
//! ```json
//! {
//!   "title": "Untitled",
//!   "version": "0.1.0",
//!   "roots": {
//!     "root_ids": ["<id>", ...],
//!     "references": [{"id": "<id>", "type": "<type>", "attributes": {...}}, ...]
//!   }
//! }
//! ```
//!
//! References are written roots first, then breadth first, so encoding the
//! same document twice yields the same string.

use serde_json::{json, Value};
use tracing::{debug, warn};

use super::Document;
use crate::error::DocumentError;
use crate::ids::ModelId;
use crate::model::Model;

impl Document {
    pub fn to_json(&self) -> Value {
        let root_refs = self.roots().map(Model::model_ref).collect();
        // Mutators reject dangling refs and only drop unreachable models, so
        // every ref reachable from a root resolves.
        let gathered = self.gather_references(root_refs, Vec::new());
        debug_assert!(gathered.is_ok(), "document holds a dangling reference: {gathered:?}");
        let references: Vec<Value> = gathered
            .unwrap_or_default()
            .iter()
            .map(Model::to_json)
            .collect();
        let root_ids: Vec<Value> = self
            .roots
            .iter()
            .map(|id| Value::String(id.to_string()))
            .collect();
        json!({
            "title": self.title,
            "version": crate::version(),
            "roots": {
                "root_ids": root_ids,
                "references": references,
            },
        })
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    /// Rebuilds a document from [`Document::to_json`] output.
    ///
    /// The result is a new document: it has its own [`DocumentId`](crate::DocumentId)
    /// and no listeners, but the same model ids, root order and title.
    pub fn from_json(v: &Value) -> Result<Self, DocumentError> {
        let obj = v
            .as_object()
            .ok_or_else(|| DocumentError::Malformed("document must be an object".into()))?;
        if let Some(version) = obj.get("version").and_then(Value::as_str) {
            if version != crate::version() {
                warn!(
                    json_version = version,
                    library_version = crate::version(),
                    "loading document json written by a different library version"
                );
            }
        }
        let roots = obj
            .get("roots")
            .and_then(Value::as_object)
            .ok_or_else(|| DocumentError::Malformed("missing \"roots\" object".into()))?;
        let root_ids = roots
            .get("root_ids")
            .and_then(Value::as_array)
            .ok_or_else(|| DocumentError::Malformed("missing \"roots.root_ids\" array".into()))?;
        let references = match roots.get("references") {
            None => Vec::new(),
            Some(Value::Array(refs)) => refs
                .iter()
                .map(Model::from_json)
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(DocumentError::Malformed(
                    "\"roots.references\" must be an array".into(),
                ))
            }
        };

        let mut doc = Document::new();
        if let Some(title) = obj.get("title").and_then(Value::as_str) {
            doc.title = title.to_owned();
        }
        doc.adopt(references)?;
        for id in root_ids {
            let id = id
                .as_str()
                .ok_or_else(|| DocumentError::Malformed("root ids must be strings".into()))?;
            let id = ModelId::from(id);
            if !doc.contains(&id) {
                return Err(DocumentError::DanglingReference(id));
            }
            if !doc.is_root(&id) {
                doc.roots.push(id);
            }
        }
        doc.collect_garbage();
        debug!(
            document = %doc.id,
            roots = doc.roots.len(),
            models = doc.models.len(),
            "loaded document from json"
        );
        Ok(doc)
    }

    pub fn from_json_string(s: &str) -> Result<Self, DocumentError> {
        let v: Value = serde_json::from_str(s)?;
        Self::from_json(&v)
    }
}
