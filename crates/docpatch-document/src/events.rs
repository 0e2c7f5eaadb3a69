//! Document change events.
//!
//! Each event is a self-contained description of one mutation: besides the
//! target it carries a snapshot of every model a receiver needs in order to
//! replay it (`references`), so events can be encoded without access to the
//! document they came from.
//!
//! Wire form (one object per event, tagged by `"kind"`):
//!
//! | kind                | fields                                        |
//! |---------------------|-----------------------------------------------|
//! | `ModelChanged`      | `model`, `attr`, `new`                        |
//! | `ColumnDataChanged` | `column_source`, `new`, `cols`                |
//! | `ColumnsStreamed`   | `column_source`, `data`, `rollover`           |
//! | `ColumnsPatched`    | `column_source`, `patches`                    |
//! | `RootAdded`         | `model`                                       |
//! | `RootRemoved`       | `model`                                       |
//! | `TitleChanged`      | `title`                                       |

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::columns::{self, ColumnData, ColumnPatches};
use crate::document::Document;
use crate::error::DocumentError;
use crate::ids::{DocumentId, ModelId, Setter};
use crate::model::Model;
use crate::value::{ModelRef, PropValue};

#[derive(Debug, Clone, PartialEq)]
pub struct ModelChangedEvent {
    pub document: DocumentId,
    pub model: ModelRef,
    pub attr: String,
    pub old: PropValue,
    pub new: PropValue,
    /// Finer-grained description of a column update. When present it is
    /// sent instead of the whole new value.
    pub hint: Option<ColumnsHint>,
    pub setter: Option<Setter>,
    pub references: Vec<Model>,
}

impl ModelChangedEvent {
    /// Describes `model.attr` changing from `old` to `new`.
    ///
    /// Models held inline by `new` are lifted out into `references`, along
    /// with every document model reachable from it.
    pub fn new(
        doc: &Document,
        model: &ModelId,
        attr: impl Into<String>,
        old: PropValue,
        new: PropValue,
    ) -> Result<Self, DocumentError> {
        let target = doc
            .get_model_by_id(model)
            .ok_or_else(|| DocumentError::UnknownModel(model.clone()))?;
        let mut detached = Vec::new();
        let new = new.flatten(&mut detached);
        let references = doc.gather_references(new.refs(), detached)?;
        Ok(Self {
            document: doc.id(),
            model: target.model_ref(),
            attr: attr.into(),
            old,
            new,
            hint: None,
            setter: None,
            references,
        })
    }

    pub fn with_hint(mut self, hint: impl Into<ColumnsHint>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_setter(mut self, setter: Setter) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn to_json(&self) -> Value {
        if let Some(hint) = &self.hint {
            return hint.to_json();
        }
        json!({
            "kind": "ModelChanged",
            "model": self.model.to_json(),
            "attr": self.attr,
            "new": self.new.to_json(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnsHint {
    DataChanged(ColumnDataChangedEvent),
    Streamed(ColumnsStreamedEvent),
    Patched(ColumnsPatchedEvent),
}

impl ColumnsHint {
    pub fn to_json(&self) -> Value {
        match self {
            ColumnsHint::DataChanged(e) => e.to_json(),
            ColumnsHint::Streamed(e) => e.to_json(),
            ColumnsHint::Patched(e) => e.to_json(),
        }
    }
}

impl From<ColumnDataChangedEvent> for ColumnsHint {
    fn from(e: ColumnDataChangedEvent) -> Self {
        ColumnsHint::DataChanged(e)
    }
}

impl From<ColumnsStreamedEvent> for ColumnsHint {
    fn from(e: ColumnsStreamedEvent) -> Self {
        ColumnsHint::Streamed(e)
    }
}

impl From<ColumnsPatchedEvent> for ColumnsHint {
    fn from(e: ColumnsPatchedEvent) -> Self {
        ColumnsHint::Patched(e)
    }
}

fn column_source(doc: &Document, id: &ModelId) -> Result<ModelRef, DocumentError> {
    let model = doc
        .get_model_by_id(id)
        .ok_or_else(|| DocumentError::UnknownModel(id.clone()))?;
    if !model.is_column_source() {
        return Err(DocumentError::NotAColumnSource(id.clone()));
    }
    Ok(model.model_ref())
}

/// Some (or all) columns of a source were replaced wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDataChangedEvent {
    pub document: DocumentId,
    pub column_source: ModelRef,
    /// Names of the replaced columns; `None` means all of them.
    pub cols: Option<Vec<String>>,
    pub new: ColumnData,
    pub setter: Option<Setter>,
}

impl ColumnDataChangedEvent {
    /// Snapshots the current contents of `cols` (all columns when `None`).
    pub fn new(
        doc: &Document,
        source: &ModelId,
        cols: Option<Vec<String>>,
    ) -> Result<Self, DocumentError> {
        let column_source = column_source(doc, source)?;
        let mut new = doc
            .get_model_by_id(source)
            .and_then(Model::columns)
            .unwrap_or_default();
        if let Some(cols) = &cols {
            new.retain(|name, _| cols.contains(name));
        }
        Ok(Self {
            document: doc.id(),
            column_source,
            cols,
            new,
            setter: None,
        })
    }

    pub fn with_setter(mut self, setter: Setter) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn to_json(&self) -> Value {
        let cols = match &self.cols {
            Some(cols) => json!(cols),
            None => json!(self.new.keys().collect::<Vec<_>>()),
        };
        json!({
            "kind": "ColumnDataChanged",
            "column_source": self.column_source.to_json(),
            "new": columns::data_to_json(&self.new),
            "cols": cols,
        })
    }
}

/// New rows appended to a column source.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnsStreamedEvent {
    pub document: DocumentId,
    pub column_source: ModelRef,
    pub data: ColumnData,
    pub rollover: Option<usize>,
    pub setter: Option<Setter>,
}

impl ColumnsStreamedEvent {
    pub fn new(
        doc: &Document,
        source: &ModelId,
        data: ColumnData,
        rollover: Option<usize>,
    ) -> Result<Self, DocumentError> {
        Ok(Self {
            document: doc.id(),
            column_source: column_source(doc, source)?,
            data,
            rollover,
            setter: None,
        })
    }

    pub fn with_setter(mut self, setter: Setter) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn to_json(&self) -> Value {
        json!({
            "kind": "ColumnsStreamed",
            "column_source": self.column_source.to_json(),
            "data": columns::data_to_json(&self.data),
            "rollover": self.rollover,
        })
    }
}

/// Individual cells of a column source replaced in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnsPatchedEvent {
    pub document: DocumentId,
    pub column_source: ModelRef,
    pub patches: ColumnPatches,
    pub setter: Option<Setter>,
}

impl ColumnsPatchedEvent {
    pub fn new(
        doc: &Document,
        source: &ModelId,
        patches: ColumnPatches,
    ) -> Result<Self, DocumentError> {
        Ok(Self {
            document: doc.id(),
            column_source: column_source(doc, source)?,
            patches,
            setter: None,
        })
    }

    pub fn with_setter(mut self, setter: Setter) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn to_json(&self) -> Value {
        json!({
            "kind": "ColumnsPatched",
            "column_source": self.column_source.to_json(),
            "patches": columns::patches_to_json(&self.patches),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RootAddedEvent {
    pub document: DocumentId,
    pub model: ModelRef,
    pub setter: Option<Setter>,
    /// The root and every model reachable from it.
    pub references: Vec<Model>,
}

impl RootAddedEvent {
    pub fn new(doc: &Document, model: &ModelId) -> Result<Self, DocumentError> {
        let root = doc
            .get_model_by_id(model)
            .ok_or_else(|| DocumentError::UnknownModel(model.clone()))?
            .model_ref();
        let references = doc.gather_references(vec![root.clone()], Vec::new())?;
        Ok(Self {
            document: doc.id(),
            model: root,
            setter: None,
            references,
        })
    }

    pub fn with_setter(mut self, setter: Setter) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn to_json(&self) -> Value {
        json!({ "kind": "RootAdded", "model": self.model.to_json() })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RootRemovedEvent {
    pub document: DocumentId,
    pub model: ModelRef,
    pub setter: Option<Setter>,
}

impl RootRemovedEvent {
    pub fn new(doc: &Document, model: &ModelId) -> Result<Self, DocumentError> {
        let model = doc
            .get_model_by_id(model)
            .ok_or_else(|| DocumentError::UnknownModel(model.clone()))?
            .model_ref();
        Ok(Self {
            document: doc.id(),
            model,
            setter: None,
        })
    }

    pub fn with_setter(mut self, setter: Setter) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn to_json(&self) -> Value {
        json!({ "kind": "RootRemoved", "model": self.model.to_json() })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitleChangedEvent {
    pub document: DocumentId,
    pub title: String,
    pub setter: Option<Setter>,
}

impl TitleChangedEvent {
    pub fn new(doc: &Document, title: impl Into<String>) -> Self {
        Self {
            document: doc.id(),
            title: title.into(),
            setter: None,
        }
    }

    pub fn with_setter(mut self, setter: Setter) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn to_json(&self) -> Value {
        json!({ "kind": "TitleChanged", "title": self.title })
    }
}

/// Any change to a document, as delivered to `on_change` listeners and
/// bundled into PATCH-DOC messages.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentChangedEvent {
    ModelChanged(ModelChangedEvent),
    ColumnDataChanged(ColumnDataChangedEvent),
    ColumnsStreamed(ColumnsStreamedEvent),
    ColumnsPatched(ColumnsPatchedEvent),
    RootAdded(RootAddedEvent),
    RootRemoved(RootRemovedEvent),
    TitleChanged(TitleChangedEvent),
}

impl DocumentChangedEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentChangedEvent::ModelChanged(_) => "ModelChanged",
            DocumentChangedEvent::ColumnDataChanged(_) => "ColumnDataChanged",
            DocumentChangedEvent::ColumnsStreamed(_) => "ColumnsStreamed",
            DocumentChangedEvent::ColumnsPatched(_) => "ColumnsPatched",
            DocumentChangedEvent::RootAdded(_) => "RootAdded",
            DocumentChangedEvent::RootRemoved(_) => "RootRemoved",
            DocumentChangedEvent::TitleChanged(_) => "TitleChanged",
        }
    }

    pub fn document(&self) -> DocumentId {
        match self {
            DocumentChangedEvent::ModelChanged(e) => e.document,
            DocumentChangedEvent::ColumnDataChanged(e) => e.document,
            DocumentChangedEvent::ColumnsStreamed(e) => e.document,
            DocumentChangedEvent::ColumnsPatched(e) => e.document,
            DocumentChangedEvent::RootAdded(e) => e.document,
            DocumentChangedEvent::RootRemoved(e) => e.document,
            DocumentChangedEvent::TitleChanged(e) => e.document,
        }
    }

    pub fn setter(&self) -> Option<Setter> {
        match self {
            DocumentChangedEvent::ModelChanged(e) => e.setter,
            DocumentChangedEvent::ColumnDataChanged(e) => e.setter,
            DocumentChangedEvent::ColumnsStreamed(e) => e.setter,
            DocumentChangedEvent::ColumnsPatched(e) => e.setter,
            DocumentChangedEvent::RootAdded(e) => e.setter,
            DocumentChangedEvent::RootRemoved(e) => e.setter,
            DocumentChangedEvent::TitleChanged(e) => e.setter,
        }
    }

    /// Models a receiver must know about to replay this event.
    pub fn references(&self) -> &[Model] {
        match self {
            DocumentChangedEvent::ModelChanged(e) if e.hint.is_none() => &e.references,
            DocumentChangedEvent::RootAdded(e) => &e.references,
            _ => &[],
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            DocumentChangedEvent::ModelChanged(e) => e.to_json(),
            DocumentChangedEvent::ColumnDataChanged(e) => e.to_json(),
            DocumentChangedEvent::ColumnsStreamed(e) => e.to_json(),
            DocumentChangedEvent::ColumnsPatched(e) => e.to_json(),
            DocumentChangedEvent::RootAdded(e) => e.to_json(),
            DocumentChangedEvent::RootRemoved(e) => e.to_json(),
            DocumentChangedEvent::TitleChanged(e) => e.to_json(),
        }
    }

    /// Folds a later event into this one when the later one supersedes it.
    /// Returns `false` (leaving `self` untouched) when they cannot merge.
    ///
    /// Events from different documents or different setters never merge.
    pub fn combine(&mut self, other: &DocumentChangedEvent) -> bool {
        if self.document() != other.document() || self.setter() != other.setter() {
            return false;
        }
        match (self, other) {
            (DocumentChangedEvent::ModelChanged(a), DocumentChangedEvent::ModelChanged(b)) => {
                if a.hint.is_some() || b.hint.is_some() || a.model.id != b.model.id || a.attr != b.attr {
                    return false;
                }
                a.new = b.new.clone();
                a.references = b.references.clone();
                true
            }
            (DocumentChangedEvent::TitleChanged(a), DocumentChangedEvent::TitleChanged(b)) => {
                a.title = b.title.clone();
                true
            }
            _ => false,
        }
    }
}

macro_rules! impl_from_event {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for DocumentChangedEvent {
                fn from(e: $ty) -> Self {
                    DocumentChangedEvent::$variant(e)
                }
            }
        )*
    };
}

impl_from_event!(
    ModelChanged(ModelChangedEvent),
    ColumnDataChanged(ColumnDataChangedEvent),
    ColumnsStreamed(ColumnsStreamedEvent),
    ColumnsPatched(ColumnsPatchedEvent),
    RootAdded(RootAddedEvent),
    RootRemoved(RootRemovedEvent),
    TitleChanged(TitleChangedEvent),
);

/// What a mergeable event overwrites: a model attribute or the title.
fn merge_target(event: &DocumentChangedEvent) -> Option<(DocumentId, Option<(&ModelId, &str)>)> {
    match event {
        DocumentChangedEvent::ModelChanged(e) if e.hint.is_none() => {
            Some((e.document, Some((&e.model.id, e.attr.as_str()))))
        }
        DocumentChangedEvent::TitleChanged(e) => Some((e.document, None)),
        _ => None,
    }
}

/// Merges each event into the latest earlier event for the same target,
/// when that one can absorb it.
pub fn coalesce(events: Vec<DocumentChangedEvent>) -> Vec<DocumentChangedEvent> {
    let mut out: Vec<DocumentChangedEvent> = Vec::with_capacity(events.len());
    for event in events {
        let target = merge_target(&event);
        let latest = target.as_ref().and_then(|t| {
            out.iter()
                .rposition(|held| merge_target(held).as_ref() == Some(t))
        });
        let merged = match latest {
            Some(i) => out[i].combine(&event),
            None => false,
        };
        if !merged {
            out.push(event);
        }
    }
    out
}

/// Encodes events as patch content: `{"events": [..], "references": [..]}`.
///
/// References are de-duplicated by model id, keeping the first snapshot.
pub fn patch_json(events: &[DocumentChangedEvent]) -> Value {
    let mut seen: HashSet<&ModelId> = HashSet::new();
    let mut references = Vec::new();
    for model in events.iter().flat_map(|e| e.references()) {
        if seen.insert(model.id()) {
            references.push(model.to_json());
        }
    }
    let mut m = Map::new();
    m.insert(
        "events".into(),
        Value::Array(events.iter().map(DocumentChangedEvent::to_json).collect()),
    );
    m.insert("references".into(), Value::Array(references));
    Value::Object(m)
}
