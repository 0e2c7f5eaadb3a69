//! Models: typed bags of named properties.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::columns::ColumnData;
use crate::error::DocumentError;
use crate::ids::ModelId;
use crate::value::{ModelRef, PropValue};

/// Type name given to models built by [`Model::column_data_source`].
pub const COLUMN_DATA_SOURCE: &str = "ColumnDataSource";

/// Name of the property holding a column source's columns.
pub const DATA_ATTR: &str = "data";

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    id: ModelId,
    type_name: String,
    properties: IndexMap<String, PropValue>,
}

impl Model {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self::with_id(ModelId::generate(), type_name)
    }

    pub fn with_id(id: impl Into<ModelId>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            properties: IndexMap::new(),
        }
    }

    pub fn column_data_source(data: ColumnData) -> Self {
        let columns = data
            .into_iter()
            .map(|(name, values)| (name, PropValue::List(values)))
            .collect();
        Self::new(COLUMN_DATA_SOURCE).with(DATA_ATTR, PropValue::Map(columns))
    }

    /// Builder form of [`Model::set`].
    pub fn with(mut self, attr: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.properties.insert(attr.into(), value.into());
        self
    }

    pub fn id(&self) -> &ModelId {
        &self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn model_ref(&self) -> ModelRef {
        ModelRef::new(self.id.clone(), self.type_name.clone())
    }

    pub fn get(&self, attr: &str) -> Option<&PropValue> {
        self.properties.get(attr)
    }

    /// Sets `attr`, returning the previous value (`Null` when unset).
    pub fn set(&mut self, attr: impl Into<String>, value: PropValue) -> PropValue {
        self.properties.insert(attr.into(), value).unwrap_or_default()
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the model has a `data` property shaped as a column map.
    pub fn is_column_source(&self) -> bool {
        match self.properties.get(DATA_ATTR) {
            Some(PropValue::Map(cols)) => cols.values().all(|c| matches!(c, PropValue::List(_))),
            _ => false,
        }
    }

    /// Returns a copy of the column map, or `None` if this is not a column source.
    pub fn columns(&self) -> Option<ColumnData> {
        match self.properties.get(DATA_ATTR) {
            Some(PropValue::Map(cols)) => cols
                .iter()
                .map(|(name, col)| match col {
                    PropValue::List(values) => Some((name.clone(), values.clone())),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    pub(crate) fn set_columns(&mut self, data: ColumnData) -> PropValue {
        let map = data
            .into_iter()
            .map(|(name, values)| (name, PropValue::List(values)))
            .collect();
        self.set(DATA_ATTR, PropValue::Map(map))
    }

    /// Refs to every model this model's properties point at.
    pub fn refs(&self) -> Vec<ModelRef> {
        let mut out = Vec::new();
        for value in self.properties.values() {
            value.collect_refs(&mut out);
        }
        out
    }

    /// Flattens inline instances, returning this model's ref and every model
    /// of the graph with the root first.
    pub fn into_graph(self) -> (ModelRef, Vec<Model>) {
        let model_ref = self.model_ref();
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        (model_ref, out)
    }

    pub(crate) fn flatten_into(mut self, out: &mut Vec<Model>) {
        if !self.properties.values().any(PropValue::has_instances) {
            out.push(self);
            return;
        }
        let slot = out.len();
        let properties = std::mem::take(&mut self.properties);
        out.push(Model {
            id: self.id,
            type_name: self.type_name,
            properties: IndexMap::new(),
        });
        let flat: IndexMap<String, PropValue> = properties
            .into_iter()
            .map(|(k, v)| (k, v.flatten(out)))
            .collect();
        out[slot].properties = flat;
    }

    pub fn to_json(&self) -> Value {
        let attributes: Map<String, Value> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        let mut m = Map::new();
        m.insert("id".into(), Value::String(self.id.to_string()));
        m.insert("type".into(), Value::String(self.type_name.clone()));
        m.insert("attributes".into(), Value::Object(attributes));
        Value::Object(m)
    }

    pub fn from_json(v: &Value) -> Result<Self, DocumentError> {
        let obj = v
            .as_object()
            .ok_or_else(|| DocumentError::Malformed("model reference must be an object".into()))?;
        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| DocumentError::Malformed("model reference is missing \"id\"".into()))?;
        let type_name = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DocumentError::Malformed(format!("model {id} is missing \"type\"")))?;
        let mut model = Model::with_id(id, type_name);
        match obj.get("attributes") {
            None | Some(Value::Null) => {}
            Some(Value::Object(attrs)) => {
                for (k, v) in attrs {
                    model.properties.insert(k.clone(), PropValue::from_json(v));
                }
            }
            Some(_) => {
                return Err(DocumentError::Malformed(format!(
                    "attributes of model {id} must be an object"
                )))
            }
        }
        Ok(model)
    }
}
