use thiserror::Error;

use crate::ids::ModelId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColumnError {
    #[error("must stream updates to all existing columns (missing: {0})")]
    MissingStreamColumns(String),
    #[error("must stream updates only to existing columns (extra: {0})")]
    ExtraStreamColumns(String),
    #[error("all streaming column updates must be the same length")]
    UnequalStreamLengths,
    #[error("cannot patch non-existent column {0:?}")]
    UnknownColumn(String),
    #[error("out-of-bounds index ({index}) in patch for column {column:?} of length {len}")]
    IndexOutOfBounds {
        column: String,
        index: usize,
        len: usize,
    },
    #[error("slice step must be non-zero")]
    ZeroStep,
    #[error("slice patch for column {column:?} selects {expected} items but carries {actual}")]
    SliceLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("slice patch for column {0:?} must carry a list of values")]
    SliceValuesNotList(String),
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("model {0} is not in the document")]
    UnknownModel(ModelId),
    #[error("cannot apply patch to {0} which is not in the document")]
    PatchTargetMissing(ModelId),
    #[error("model {0} is not a root of the document")]
    NotARoot(ModelId),
    #[error("model {0} is not a column data source")]
    NotAColumnSource(ModelId),
    #[error("reference to unknown model {0}")]
    DanglingReference(ModelId),
    #[error("column update failed: {0}")]
    Column(#[from] ColumnError),
    #[error("unknown patch event kind: {0}")]
    UnknownEventKind(String),
    #[error("malformed document json: {0}")]
    Malformed(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
