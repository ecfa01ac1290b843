//! Data context for template rendering.
//!
//! Any [`Serialize`] value can be passed to the engine as render data. Maps
//! and structs become the root scope of the template, so `{{ Title }}` reads
//! the `Title` key directly. [`Context`] is a small map type for building that
//! data on the fly:
//!
//! ```rust
//! use trellis::ctx;
//!
//! let data = ctx().add("Title", "Hi").add("Tags", vec!["rust", "html"]);
//! assert_eq!(data.get("Title"), Some(&serde_json::json!("Hi")));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered string-keyed map of render data.
///
/// Serializes as the bare map, so the engine sees the keys themselves rather
/// than a wrapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    data: Map<String, Value>,
}

/// Shorthand for [`Context::new`].
pub fn ctx() -> Context {
    Context::new()
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from a JSON value.
    ///
    /// Objects become the context; any other value yields an empty context.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(data) => Self { data },
            _ => Self::default(),
        }
    }

    /// Adds a value, builder style. Empty keys are ignored.
    ///
    /// A value that fails to serialize is stored as `null`.
    pub fn add<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces a value. Empty keys are ignored.
    ///
    /// A value that fails to serialize is stored as `null`; use
    /// [`try_insert`](Self::try_insert) to see the error instead.
    pub fn insert<T: Serialize>(&mut self, key: &str, value: T) {
        if key.is_empty() {
            return;
        }
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.data.insert(key.to_string(), value);
    }

    /// Like [`insert`](Self::insert), but a serialization failure leaves the
    /// context unchanged and is returned.
    pub fn try_insert<T: Serialize>(&mut self, key: &str, value: T) -> serde_json::Result<()> {
        if key.is_empty() {
            return Ok(());
        }
        let value = serde_json::to_value(value)?;
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns the underlying map.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.data
    }
}

impl From<Map<String, Value>> for Context {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

impl From<Context> for Value {
    fn from(context: Context) -> Self {
        Value::Object(context.data)
    }
}
