//! Column data held by column data sources, and the stream / patch updates
//! applied to it.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::{ColumnError, DocumentError};
use crate::value::PropValue;

/// Column name → column values.
pub type ColumnData = IndexMap<String, Vec<PropValue>>;

/// Column name → list of `(where, new value)` replacements.
pub type ColumnPatches = IndexMap<String, Vec<(PatchIndex, PropValue)>>;

/// Position(s) targeted by a single column patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchIndex {
    Index(usize),
    /// Half-open `[start, stop)` with a stride. Missing bounds default to
    /// the whole column, a missing step to 1. The value patched in must be a
    /// list with one item per selected position.
    Slice {
        start: Option<usize>,
        stop: Option<usize>,
        step: Option<usize>,
    },
}

impl PatchIndex {
    fn positions(&self, column: &str, len: usize) -> Result<Vec<usize>, ColumnError> {
        match *self {
            PatchIndex::Index(index) => {
                if index >= len {
                    return Err(ColumnError::IndexOutOfBounds {
                        column: column.to_owned(),
                        index,
                        len,
                    });
                }
                Ok(vec![index])
            }
            PatchIndex::Slice { start, stop, step } => {
                let step = step.unwrap_or(1);
                if step == 0 {
                    return Err(ColumnError::ZeroStep);
                }
                let start = start.unwrap_or(0);
                let stop = stop.unwrap_or(len);
                for bound in [start, stop] {
                    if bound > len {
                        return Err(ColumnError::IndexOutOfBounds {
                            column: column.to_owned(),
                            index: bound,
                            len,
                        });
                    }
                }
                Ok((start..stop).step_by(step).collect())
            }
        }
    }

    pub fn to_json(&self) -> Value {
        match *self {
            PatchIndex::Index(i) => json!(i),
            PatchIndex::Slice { start, stop, step } => json!({
                "start": start,
                "stop": stop,
                "step": step,
            }),
        }
    }

    pub fn from_json(v: &Value) -> Result<Self, DocumentError> {
        if let Some(i) = v.as_u64() {
            return usize::try_from(i)
                .map(PatchIndex::Index)
                .map_err(|_| DocumentError::Malformed(format!("patch index out of range: {i}")));
        }
        let obj = v
            .as_object()
            .ok_or_else(|| DocumentError::Malformed(format!("invalid patch index: {v}")))?;
        let bound = |key: &str| -> Result<Option<usize>, DocumentError> {
            match obj.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(b) => b
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .map(Some)
                    .ok_or_else(|| DocumentError::Malformed(format!("invalid slice {key}: {b}"))),
            }
        };
        Ok(PatchIndex::Slice {
            start: bound("start")?,
            stop: bound("stop")?,
            step: bound("step")?,
        })
    }
}

/// Checks that `new` can be streamed onto `existing`.
pub fn validate_stream(existing: &ColumnData, new: &ColumnData) -> Result<(), ColumnError> {
    if !existing.is_empty() {
        let missing: Vec<&str> = existing
            .keys()
            .filter(|k| !new.contains_key(*k))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(ColumnError::MissingStreamColumns(missing.join(", ")));
        }
        let extra: Vec<&str> = new
            .keys()
            .filter(|k| !existing.contains_key(*k))
            .map(String::as_str)
            .collect();
        if !extra.is_empty() {
            return Err(ColumnError::ExtraStreamColumns(extra.join(", ")));
        }
    }
    let mut lengths = new.values().map(Vec::len);
    if let Some(first) = lengths.next() {
        if lengths.any(|l| l != first) {
            return Err(ColumnError::UnequalStreamLengths);
        }
    }
    Ok(())
}

/// Appends `new` to `existing`, keeping at most `rollover` trailing items
/// per column when given.
pub fn stream(
    existing: &mut ColumnData,
    new: &ColumnData,
    rollover: Option<usize>,
) -> Result<(), ColumnError> {
    validate_stream(existing, new)?;
    for (name, values) in new {
        let column = existing.entry(name.clone()).or_default();
        column.extend(values.iter().cloned());
        if let Some(limit) = rollover {
            if column.len() > limit {
                let excess = column.len() - limit;
                column.drain(..excess);
            }
        }
    }
    Ok(())
}

/// Applies `patches` to `existing`. Nothing is modified unless every patch
/// is valid.
pub fn patch(existing: &mut ColumnData, patches: &ColumnPatches) -> Result<(), ColumnError> {
    let mut writes: Vec<(&str, usize, PropValue)> = Vec::new();
    for (name, items) in patches {
        let column = existing
            .get(name)
            .ok_or_else(|| ColumnError::UnknownColumn(name.clone()))?;
        for (index, value) in items {
            let positions = index.positions(name, column.len())?;
            match index {
                PatchIndex::Index(_) => writes.push((name.as_str(), positions[0], value.clone())),
                PatchIndex::Slice { .. } => {
                    let values = value
                        .as_list()
                        .ok_or_else(|| ColumnError::SliceValuesNotList(name.clone()))?;
                    if values.len() != positions.len() {
                        return Err(ColumnError::SliceLengthMismatch {
                            column: name.clone(),
                            expected: positions.len(),
                            actual: values.len(),
                        });
                    }
                    let slice_writes = positions
                        .into_iter()
                        .zip(values.iter().cloned())
                        .map(|(pos, v)| (name.as_str(), pos, v));
                    writes.extend(slice_writes);
                }
            }
        }
    }
    for (name, pos, value) in writes {
        if let Some(column) = existing.get_mut(name) {
            column[pos] = value;
        }
    }
    Ok(())
}

pub fn data_to_json(data: &ColumnData) -> Value {
    let m: Map<String, Value> = data
        .iter()
        .map(|(k, col)| (k.clone(), Value::Array(col.iter().map(PropValue::to_json).collect())))
        .collect();
    Value::Object(m)
}

pub fn data_from_json(v: &Value) -> Result<ColumnData, DocumentError> {
    let obj = v
        .as_object()
        .ok_or_else(|| DocumentError::Malformed("column data must be an object".into()))?;
    obj.iter()
        .map(|(k, col)| {
            let items = col
                .as_array()
                .ok_or_else(|| DocumentError::Malformed(format!("column {k:?} must be an array")))?;
            Ok((k.clone(), items.iter().map(PropValue::from_json).collect()))
        })
        .collect()
}

pub fn patches_to_json(patches: &ColumnPatches) -> Value {
    let m: Map<String, Value> = patches
        .iter()
        .map(|(k, items)| {
            let arr = items
                .iter()
                .map(|(index, value)| json!([index.to_json(), value.to_json()]))
                .collect();
            (k.clone(), Value::Array(arr))
        })
        .collect();
    Value::Object(m)
}

pub fn patches_from_json(v: &Value) -> Result<ColumnPatches, DocumentError> {
    let obj = v
        .as_object()
        .ok_or_else(|| DocumentError::Malformed("column patches must be an object".into()))?;
    let mut out = ColumnPatches::new();
    for (k, items) in obj {
        let items = items
            .as_array()
            .ok_or_else(|| DocumentError::Malformed(format!("patches for {k:?} must be an array")))?;
        let mut parsed = Vec::with_capacity(items.len());
        for item in items {
            match item.as_array().map(Vec::as_slice) {
                Some([index, value]) => {
                    parsed.push((PatchIndex::from_json(index)?, PropValue::from_json(value)))
                }
                _ => {
                    return Err(DocumentError::Malformed(format!(
                        "patch for {k:?} must be an [index, value] pair"
                    )))
                }
            }
        }
        out.insert(k.clone(), parsed);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<PropValue> {
        values.iter().copied().map(PropValue::Int).collect()
    }

    fn source(cols: &[(&str, &[i64])]) -> ColumnData {
        cols.iter().map(|(k, v)| (k.to_string(), ints(v))).collect()
    }

    #[test]
    fn stream_appends() {
        let mut data = source(&[("a", &[0, 1, 2]), ("b", &[5, 5, 5])]);
        stream(&mut data, &source(&[("a", &[3]), ("b", &[6])]), None).unwrap();
        assert_eq!(data["a"], ints(&[0, 1, 2, 3]));
        assert_eq!(data["b"], ints(&[5, 5, 5, 6]));
    }

    #[test]
    fn stream_rollover_keeps_tail() {
        let mut data = source(&[("a", &[0, 1, 2])]);
        stream(&mut data, &source(&[("a", &[3, 4])]), Some(3)).unwrap();
        assert_eq!(data["a"], ints(&[2, 3, 4]));
    }

    #[test]
    fn stream_rejects_missing_and_extra_columns() {
        let mut data = source(&[("a", &[0]), ("b", &[0])]);
        assert_eq!(
            stream(&mut data, &source(&[("a", &[1])]), None),
            Err(ColumnError::MissingStreamColumns("b".into()))
        );
        assert_eq!(
            stream(&mut data, &source(&[("a", &[1]), ("b", &[1]), ("c", &[1])]), None),
            Err(ColumnError::ExtraStreamColumns("c".into()))
        );
        assert_eq!(data, source(&[("a", &[0]), ("b", &[0])]));
    }

    #[test]
    fn stream_rejects_ragged_update() {
        let mut data = source(&[("a", &[0]), ("b", &[0])]);
        assert_eq!(
            stream(&mut data, &source(&[("a", &[1, 2]), ("b", &[1])]), None),
            Err(ColumnError::UnequalStreamLengths)
        );
    }

    #[test]
    fn stream_into_empty_source_creates_columns() {
        let mut data = ColumnData::new();
        stream(&mut data, &source(&[("x", &[1, 2])]), None).unwrap();
        assert_eq!(data["x"], ints(&[1, 2]));
    }

    #[test]
    fn patch_indices_must_fit_usize() {
        let index = PatchIndex::from_json(&json!(u64::MAX));
        let bound = PatchIndex::from_json(&json!({"start": u64::MAX}));
        match usize::try_from(u64::MAX) {
            Ok(max) => {
                assert_eq!(index.unwrap(), PatchIndex::Index(max));
                assert_eq!(
                    bound.unwrap(),
                    PatchIndex::Slice { start: Some(max), stop: None, step: None }
                );
            }
            Err(_) => {
                assert!(matches!(index, Err(DocumentError::Malformed(_))));
                assert!(matches!(bound, Err(DocumentError::Malformed(_))));
            }
        }
        assert!(matches!(PatchIndex::from_json(&json!(-1)), Err(DocumentError::Malformed(_))));
    }

    #[test]
    fn patch_single_index() {
        let mut data = source(&[("a", &[0, 1, 2])]);
        let mut patches = ColumnPatches::new();
        patches.insert("a".into(), vec![(PatchIndex::Index(0), PropValue::Int(11))]);
        patch(&mut data, &patches).unwrap();
        assert_eq!(data["a"], ints(&[11, 1, 2]));
    }

    #[test]
    fn patch_slice_with_step() {
        let mut data = source(&[("a", &[0, 1, 2, 3, 4])]);
        let mut patches = ColumnPatches::new();
        patches.insert(
            "a".into(),
            vec![(
                PatchIndex::Slice { start: Some(0), stop: None, step: Some(2) },
                PropValue::List(ints(&[10, 12, 14])),
            )],
        );
        patch(&mut data, &patches).unwrap();
        assert_eq!(data["a"], ints(&[10, 1, 12, 3, 14]));
    }

    #[test]
    fn invalid_patch_leaves_data_untouched() {
        let mut data = source(&[("a", &[0, 1, 2])]);
        let mut patches = ColumnPatches::new();
        patches.insert(
            "a".into(),
            vec![(PatchIndex::Index(0), PropValue::Int(9)), (PatchIndex::Index(3), PropValue::Int(9))],
        );
        let err = patch(&mut data, &patches).unwrap_err();
        assert_eq!(err, ColumnError::IndexOutOfBounds { column: "a".into(), index: 3, len: 3 });
        assert_eq!(data["a"], ints(&[0, 1, 2]));

        let mut unknown = ColumnPatches::new();
        unknown.insert("zz".into(), vec![(PatchIndex::Index(0), PropValue::Int(1))]);
        assert_eq!(patch(&mut data, &unknown), Err(ColumnError::UnknownColumn("zz".into())));
    }

    #[test]
    fn slice_value_count_must_match() {
        let mut data = source(&[("a", &[0, 1, 2])]);
        let mut patches = ColumnPatches::new();
        patches.insert(
            "a".into(),
            vec![(
                PatchIndex::Slice { start: Some(1), stop: Some(3), step: None },
                PropValue::List(ints(&[7])),
            )],
        );
        assert!(matches!(
            patch(&mut data, &patches),
            Err(ColumnError::SliceLengthMismatch { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn patches_json_shape() {
        let mut patches = ColumnPatches::new();
        patches.insert(
            "a".into(),
            vec![
                (PatchIndex::Index(0), PropValue::Int(11)),
                (
                    PatchIndex::Slice { start: Some(1), stop: Some(3), step: None },
                    PropValue::List(ints(&[1, 2])),
                ),
            ],
        );
        let v = patches_to_json(&patches);
        assert_eq!(
            v,
            json!({"a": [[0, 11], [{"start": 1, "stop": 3, "step": null}, [1, 2]]]})
        );
        assert_eq!(patches_from_json(&v).unwrap(), patches);
    }
}
