//! The rights overlay: application permissions the ACL can't express.
//!
//! The overlay is a JSON object stored as one string property on a document,
//! mapping a lower-cased identity to a custom permission name. Only the
//! "take" value is currently meaningful. Unknown keys and non-string values
//! are carried through untouched when the overlay is rewritten.

use serde_json::{Map, Value};
use tracing::warn;

use vellum_core::TAKE_OVERLAY_VALUE;

use crate::error::{PermsError, Result};

/// A parsed rights overlay.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RightsOverlay {
    entries: Map<String, Value>,
}

impl RightsOverlay {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an overlay attribute.
    ///
    /// A blank attribute is an empty overlay. Anything that is not a JSON
    /// object is an error.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::new());
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(entries)) => Ok(Self { entries }),
            Ok(other) => Err(PermsError::MalformedOverlay(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
            Err(e) => Err(PermsError::MalformedOverlay(e.to_string())),
        }
    }

    /// Parse an overlay attribute, substituting an empty overlay on failure.
    ///
    /// A corrupt overlay must not block unrelated permission work, so the
    /// failure is logged against `path` and otherwise swallowed.
    pub fn parse_lenient(raw: Option<&str>, path: &str) -> Self {
        match raw.map(Self::parse) {
            None => Self::new(),
            Some(Ok(overlay)) => overlay,
            Some(Err(e)) => {
                warn!(path, error = %e, "ignoring unreadable rights overlay");
                Self::new()
            }
        }
    }

    /// The custom permission recorded for `identity`, if it is a string.
    pub fn get(&self, identity: &str) -> Option<&str> {
        self.entries.get(identity).and_then(Value::as_str)
    }

    /// Whether `identity` is marked with the "take" permission.
    pub fn grants_take(&self, identity: &str) -> bool {
        self.get(identity) == Some(TAKE_OVERLAY_VALUE)
    }

    /// Whether any value (string or not) is recorded for `identity`.
    pub fn contains(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }

    /// Record a custom permission for `identity`.
    pub fn set(&mut self, identity: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(identity.into(), Value::String(value.into()));
    }

    /// Remove whatever is recorded for `identity`. Returns true if there was
    /// an entry.
    pub fn remove(&mut self, identity: &str) -> bool {
        self.entries.remove(identity).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the overlay has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to the attribute's JSON form.
    pub fn to_json(&self) -> String {
        Value::Object(self.entries.clone()).to_string()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
