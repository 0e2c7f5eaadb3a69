//! Identifiers for models, documents and change originators.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

/// Minimum valid document id.
pub const MIN_DOCUMENT_ID: u64 = 65_536;

/// Stable identifier of a model. Survives JSON round trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(String);

impl ModelId {
    /// Generates a fresh, globally unique id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a live [`Document`](crate::Document) instance.
///
/// Not serialized: a document loaded from JSON is a different document
/// from the one that produced the JSON, even when their contents match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self(rng.gen_range(MIN_DOCUMENT_ID..=i64::MAX as u64))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static NEXT_SETTER: AtomicU64 = AtomicU64::new(1);

/// Opaque token naming whoever originated a change.
///
/// Listeners compare the setter of an incoming event against their own token
/// to recognise (and usually skip) echoes of their own changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Setter(u64);

impl Setter {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(NEXT_SETTER.fetch_add(1, Ordering::Relaxed))
    }
}
