//! The document: a set of root models plus every model reachable from them.
//!
//! # Overview
//!
//! A [`Document`] stores its models flattened in an id-keyed map; models
//! point at each other through [`PropValue::Ref`]. Public mutators adopt
//! inline [`PropValue::Instance`] values, apply the change, notify listeners
//! registered with [`Document::on_change`], and finally drop any model that
//! is no longer reachable from a root.
//!
//! JSON (de)serialization lives in [`json`], patch replay in [`patch`].

pub mod json;
pub mod patch;

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;

use indexmap::IndexMap;
use tracing::trace;

use crate::columns::{self, ColumnData, ColumnPatches};
use crate::error::DocumentError;
use crate::events::{
    ColumnDataChangedEvent, ColumnsHint, ColumnsPatchedEvent, ColumnsStreamedEvent, DocumentChangedEvent,
    ModelChangedEvent, RootAddedEvent, RootRemovedEvent, TitleChangedEvent,
};
use crate::ids::{DocumentId, ModelId, Setter};
use crate::model::{Model, DATA_ATTR};
use crate::value::{ModelRef, PropValue};

pub const DEFAULT_TITLE: &str = "Untitled";

pub type ListenerId = u64;

type Listener = Box<dyn FnMut(&DocumentChangedEvent) + Send>;

pub struct Document {
    id: DocumentId,
    title: String,
    roots: Vec<ModelId>,
    models: IndexMap<ModelId, Model>,
    next_listener_id: ListenerId,
    listeners: BTreeMap<ListenerId, Listener>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("roots", &self.roots)
            .field("models", &self.models.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            id: DocumentId::generate(),
            title: DEFAULT_TITLE.to_owned(),
            roots: Vec::new(),
            models: IndexMap::new(),
            next_listener_id: 1,
            listeners: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Sets the title. Unchanged titles raise no event.
    pub fn set_title(&mut self, title: impl Into<String>, setter: Option<Setter>) {
        let title = title.into();
        if title == self.title {
            return;
        }
        self.title = title;
        let mut event = TitleChangedEvent::new(self, self.title.clone());
        event.setter = setter;
        self.trigger_on_change(event.into());
    }

    /// Root models, in the order they were added.
    pub fn roots(&self) -> impl Iterator<Item = &Model> + '_ {
        self.roots.iter().filter_map(|id| self.models.get(id))
    }

    pub fn root_ids(&self) -> &[ModelId] {
        &self.roots
    }

    pub fn is_root(&self, id: &ModelId) -> bool {
        self.roots.contains(id)
    }

    pub fn get_model_by_id(&self, id: &ModelId) -> Option<&Model> {
        self.models.get(id)
    }

    pub fn contains(&self, id: &ModelId) -> bool {
        self.models.contains_key(id)
    }

    /// Every model reachable from a root.
    pub fn all_models(&self) -> impl Iterator<Item = &Model> + '_ {
        self.models.values()
    }

    /// Adds `model` (and every model it holds inline) as a new root.
    ///
    /// Adding a model that is already a root does nothing.
    pub fn add_root(&mut self, model: Model, setter: Option<Setter>) -> Result<ModelRef, DocumentError> {
        let (root, graph) = model.into_graph();
        if self.is_root(&root.id) {
            return Ok(root);
        }
        self.adopt(graph)?;
        self.attach_root(&root.id, setter)?;
        Ok(root)
    }

    /// Removes a root, dropping any model that becomes unreachable.
    pub fn remove_root(&mut self, id: &ModelId, setter: Option<Setter>) -> Result<(), DocumentError> {
        self.detach_root(id, setter)?;
        self.collect_garbage();
        Ok(())
    }

    /// Removes every root.
    pub fn clear(&mut self, setter: Option<Setter>) -> Result<(), DocumentError> {
        for id in self.roots.clone() {
            self.detach_root(&id, setter)?;
        }
        self.collect_garbage();
        Ok(())
    }

    /// Sets `attr` on the model `id`. Listeners are only notified when the
    /// value actually changes.
    pub fn set_property(
        &mut self,
        id: &ModelId,
        attr: &str,
        value: impl Into<PropValue>,
        setter: Option<Setter>,
    ) -> Result<(), DocumentError> {
        if !self.contains(id) {
            return Err(DocumentError::UnknownModel(id.clone()));
        }
        let mut detached = Vec::new();
        let value = value.into().flatten(&mut detached);
        {
            let incoming: HashSet<&ModelId> = detached.iter().map(Model::id).collect();
            if let Some(r) = value
                .refs()
                .into_iter()
                .find(|r| !incoming.contains(&r.id) && !self.models.contains_key(&r.id))
            {
                return Err(DocumentError::DanglingReference(r.id));
            }
        }
        self.adopt(detached)?;
        self.assign(id, attr, value, setter)?;
        self.collect_garbage();
        Ok(())
    }

    /// Appends rows to a column source.
    pub fn stream(
        &mut self,
        id: &ModelId,
        data: ColumnData,
        rollover: Option<usize>,
        setter: Option<Setter>,
    ) -> Result<(), DocumentError> {
        let document = self.id;
        let (source, old, mut cols) = self.column_source_mut(id)?;
        columns::stream(&mut cols, &data, rollover)?;
        source.set_columns(cols);
        let new = source.get(DATA_ATTR).cloned().unwrap_or_default();
        let hint = ColumnsStreamedEvent {
            document,
            column_source: source.model_ref(),
            data,
            rollover,
            setter,
        };
        self.trigger_column_change(hint.column_source.clone(), old, new, hint.into(), setter);
        Ok(())
    }

    /// Replaces individual cells of a column source.
    pub fn patch(
        &mut self,
        id: &ModelId,
        patches: ColumnPatches,
        setter: Option<Setter>,
    ) -> Result<(), DocumentError> {
        let document = self.id;
        let (source, old, mut cols) = self.column_source_mut(id)?;
        columns::patch(&mut cols, &patches)?;
        source.set_columns(cols);
        let new = source.get(DATA_ATTR).cloned().unwrap_or_default();
        let hint = ColumnsPatchedEvent {
            document,
            column_source: source.model_ref(),
            patches,
            setter,
        };
        self.trigger_column_change(hint.column_source.clone(), old, new, hint.into(), setter);
        Ok(())
    }

    /// Replaces (or adds) whole columns of a column source.
    pub fn replace_columns(
        &mut self,
        id: &ModelId,
        data: ColumnData,
        setter: Option<Setter>,
    ) -> Result<(), DocumentError> {
        let document = self.id;
        let (source, old, mut cols) = self.column_source_mut(id)?;
        let names: Vec<String> = data.keys().cloned().collect();
        for (name, values) in data.iter() {
            cols.insert(name.clone(), values.clone());
        }
        source.set_columns(cols);
        let new = source.get(DATA_ATTR).cloned().unwrap_or_default();
        let hint = ColumnDataChangedEvent {
            document,
            column_source: source.model_ref(),
            cols: Some(names),
            new: data,
            setter,
        };
        self.trigger_column_change(hint.column_source.clone(), old, new, hint.into(), setter);
        Ok(())
    }

    /// Registers a listener called with every change to this document.
    pub fn on_change<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&DocumentChangedEvent) + Send + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id = self.next_listener_id.saturating_add(1);
        self.listeners.insert(id, Box::new(listener));
        id
    }

    pub fn remove_on_change(&mut self, listener_id: ListenerId) -> bool {
        self.listeners.remove(&listener_id).is_some()
    }

    /// Snapshots `start` and every model reachable from it, breadth first.
    ///
    /// Ids are looked up in `detached` before the document itself.
    pub(crate) fn gather_references(
        &self,
        start: Vec<ModelRef>,
        detached: Vec<Model>,
    ) -> Result<Vec<Model>, DocumentError> {
        let mut detached: IndexMap<ModelId, Model> =
            detached.into_iter().map(|m| (m.id().clone(), m)).collect();
        let mut seen: HashSet<ModelId> = HashSet::new();
        let mut queue: VecDeque<ModelRef> = start.into();
        let mut out = Vec::new();
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next.id.clone()) {
                continue;
            }
            let model = match detached.shift_remove(&next.id) {
                Some(m) => m,
                None => self
                    .models
                    .get(&next.id)
                    .cloned()
                    .ok_or_else(|| DocumentError::DanglingReference(next.id.clone()))?,
            };
            queue.extend(model.refs());
            out.push(model);
        }
        Ok(out)
    }

    fn reachable(&self) -> HashSet<ModelId> {
        let mut seen: HashSet<ModelId> = HashSet::new();
        let mut queue: VecDeque<&ModelId> = self.roots.iter().collect();
        while let Some(id) = queue.pop_front() {
            if seen.contains(id) {
                continue;
            }
            seen.insert(id.clone());
            if let Some(model) = self.models.get(id) {
                for r in model.refs() {
                    if !seen.contains(&r.id) {
                        if let Some((key, _)) = self.models.get_key_value(&r.id) {
                            queue.push_back(key);
                        }
                    }
                }
            }
        }
        seen
    }

    fn collect_garbage(&mut self) {
        let reachable = self.reachable();
        let before = self.models.len();
        self.models.retain(|id, _| reachable.contains(id));
        let dropped = before - self.models.len();
        if dropped > 0 {
            trace!(document = %self.id, dropped, "dropped unreachable models");
        }
    }

    /// Inserts already-flattened models, after checking every ref they
    /// hold resolves either among themselves or in the document.
    fn adopt(&mut self, models: Vec<Model>) -> Result<(), DocumentError> {
        let incoming: HashSet<&ModelId> = models.iter().map(Model::id).collect();
        for model in &models {
            for r in model.refs() {
                if !incoming.contains(&r.id) && !self.models.contains_key(&r.id) {
                    return Err(DocumentError::DanglingReference(r.id));
                }
            }
        }
        for model in models {
            self.models.insert(model.id().clone(), model);
        }
        Ok(())
    }

    fn check_refs(&self, value: &PropValue) -> Result<(), DocumentError> {
        match value.refs().into_iter().find(|r| !self.models.contains_key(&r.id)) {
            Some(r) => Err(DocumentError::DanglingReference(r.id)),
            None => Ok(()),
        }
    }

    /// Sets a flattened value whose refs are known to resolve.
    fn assign(
        &mut self,
        id: &ModelId,
        attr: &str,
        value: PropValue,
        setter: Option<Setter>,
    ) -> Result<(), DocumentError> {
        let model = self
            .models
            .get_mut(id)
            .ok_or_else(|| DocumentError::UnknownModel(id.clone()))?;
        if model.get(attr) == Some(&value) {
            return Ok(());
        }
        let old = model.set(attr, value.clone());
        let mut event = ModelChangedEvent::new(self, id, attr, old, value)?;
        event.setter = setter;
        self.trigger_on_change(event.into());
        Ok(())
    }

    fn attach_root(&mut self, id: &ModelId, setter: Option<Setter>) -> Result<(), DocumentError> {
        if self.is_root(id) {
            return Ok(());
        }
        if !self.contains(id) {
            return Err(DocumentError::DanglingReference(id.clone()));
        }
        self.roots.push(id.clone());
        let mut event = RootAddedEvent::new(self, id)?;
        event.setter = setter;
        self.trigger_on_change(event.into());
        Ok(())
    }

    fn detach_root(&mut self, id: &ModelId, setter: Option<Setter>) -> Result<(), DocumentError> {
        let pos = self
            .roots
            .iter()
            .position(|r| r == id)
            .ok_or_else(|| DocumentError::NotARoot(id.clone()))?;
        let mut event = RootRemovedEvent::new(self, id)?;
        event.setter = setter;
        self.roots.remove(pos);
        self.trigger_on_change(event.into());
        Ok(())
    }

    fn column_source_mut(
        &mut self,
        id: &ModelId,
    ) -> Result<(&mut Model, PropValue, ColumnData), DocumentError> {
        let source = self
            .models
            .get_mut(id)
            .ok_or_else(|| DocumentError::UnknownModel(id.clone()))?;
        let cols = source
            .columns()
            .ok_or_else(|| DocumentError::NotAColumnSource(id.clone()))?;
        let old = source.get(DATA_ATTR).cloned().unwrap_or_default();
        Ok((source, old, cols))
    }

    fn trigger_column_change(
        &mut self,
        source: ModelRef,
        old: PropValue,
        new: PropValue,
        hint: ColumnsHint,
        setter: Option<Setter>,
    ) {
        let event = ModelChangedEvent {
            document: self.id,
            model: source,
            attr: DATA_ATTR.to_owned(),
            old,
            new,
            hint: Some(hint),
            setter,
            references: Vec::new(),
        };
        self.trigger_on_change(event.into());
    }

    fn trigger_on_change(&mut self, event: DocumentChangedEvent) {
        trace!(
            document = %self.id,
            kind = event.kind(),
            listeners = self.listeners.len(),
            "document changed"
        );
        for listener in self.listeners.values_mut() {
            listener(&event);
        }
    }
}
