//! Property values.
//!
//! [`PropValue`] is a JSON-like tree that can additionally point at other
//! models, either by reference ([`PropValue::Ref`]) or by holding a model
//! that has not been adopted by any document yet ([`PropValue::Instance`]).

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::ids::ModelId;
use crate::model::Model;

/// By-reference pointer to a model. Encodes as `{"id": .., "type": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelRef {
    pub id: ModelId,
    pub type_name: String,
}

impl ModelRef {
    pub fn new(id: impl Into<ModelId>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
        }
    }

    pub fn to_json(&self) -> Value {
        let mut m = Map::new();
        m.insert("id".into(), Value::String(self.id.to_string()));
        m.insert("type".into(), Value::String(self.type_name.clone()));
        Value::Object(m)
    }

    /// Decodes `{"id": "..", "type": ".."}`. Any other key makes it a plain map.
    pub fn from_json(v: &Value) -> Option<Self> {
        let m = v.as_object()?;
        if m.len() != 2 {
            return None;
        }
        let id = m.get("id")?.as_str()?;
        let type_name = m.get("type")?.as_str()?;
        Some(Self::new(id, type_name))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<PropValue>),
    Map(IndexMap<String, PropValue>),
    Ref(ModelRef),
    Instance(Box<Model>),
}

impl PropValue {
    pub fn instance(model: Model) -> Self {
        PropValue::Instance(Box::new(model))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropValue]> {
        match self {
            PropValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, PropValue>> {
        match self {
            PropValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// The model this value points at, if it is a reference or an instance.
    pub fn as_model_ref(&self) -> Option<ModelRef> {
        match self {
            PropValue::Ref(r) => Some(r.clone()),
            PropValue::Instance(m) => Some(m.model_ref()),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            PropValue::Null => Value::Null,
            PropValue::Bool(b) => Value::Bool(*b),
            PropValue::Int(i) => Value::Number((*i).into()),
            PropValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            PropValue::String(s) => Value::String(s.clone()),
            PropValue::List(items) => Value::Array(items.iter().map(PropValue::to_json).collect()),
            PropValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            PropValue::Ref(r) => r.to_json(),
            PropValue::Instance(m) => m.model_ref().to_json(),
        }
    }

    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => PropValue::Null,
            Value::Bool(b) => PropValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => PropValue::Int(i),
                None => n.as_f64().map(PropValue::Float).unwrap_or(PropValue::Null),
            },
            Value::String(s) => PropValue::String(s.clone()),
            Value::Array(items) => PropValue::List(items.iter().map(PropValue::from_json).collect()),
            Value::Object(entries) => match ModelRef::from_json(v) {
                Some(r) => PropValue::Ref(r),
                None => PropValue::Map(
                    entries
                        .iter()
                        .map(|(k, v)| (k.clone(), PropValue::from_json(v)))
                        .collect(),
                ),
            },
        }
    }

    /// Every model this value points at, in depth-first order. Models held
    /// as instances contribute their own ref, not their properties' refs.
    pub fn refs(&self) -> Vec<ModelRef> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    pub(crate) fn collect_refs(&self, out: &mut Vec<ModelRef>) {
        match self {
            PropValue::List(items) => items.iter().for_each(|v| v.collect_refs(out)),
            PropValue::Map(entries) => entries.values().for_each(|v| v.collect_refs(out)),
            PropValue::Ref(r) => out.push(r.clone()),
            PropValue::Instance(m) => out.push(m.model_ref()),
            _ => {}
        }
    }

    /// Replaces every inline instance with a ref, moving the models (and
    /// everything they hold inline) into `out`.
    pub fn flatten(self, out: &mut Vec<Model>) -> PropValue {
        match self {
            PropValue::List(items) => {
                PropValue::List(items.into_iter().map(|v| v.flatten(out)).collect())
            }
            PropValue::Map(entries) => PropValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.flatten(out)))
                    .collect(),
            ),
            PropValue::Instance(model) => {
                let model_ref = model.model_ref();
                (*model).flatten_into(out);
                PropValue::Ref(model_ref)
            }
            other => other,
        }
    }

    pub(crate) fn has_instances(&self) -> bool {
        match self {
            PropValue::List(items) => items.iter().any(PropValue::has_instances),
            PropValue::Map(entries) => entries.values().any(PropValue::has_instances),
            PropValue::Instance(_) => true,
            _ => false,
        }
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}

impl From<i64> for PropValue {
    fn from(i: i64) -> Self {
        PropValue::Int(i)
    }
}

impl From<i32> for PropValue {
    fn from(i: i32) -> Self {
        PropValue::Int(i64::from(i))
    }
}

impl From<f64> for PropValue {
    fn from(f: f64) -> Self {
        PropValue::Float(f)
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::String(s.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::String(s)
    }
}

impl From<ModelRef> for PropValue {
    fn from(r: ModelRef) -> Self {
        PropValue::Ref(r)
    }
}

impl From<Model> for PropValue {
    fn from(m: Model) -> Self {
        PropValue::instance(m)
    }
}

impl<T: Into<PropValue>> From<Vec<T>> for PropValue {
    fn from(items: Vec<T>) -> Self {
        PropValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(PropValue::Null)
    }
}
