//! Event declaration contract and decoded event data.
//!
//! Publishers implement [`Event`] on plain serializable structs; the type
//! name doubles as the broker channel name. Handlers never see the original
//! typed event (decode happens on the receiving side without knowledge of
//! the publishing side's types); they receive an [`EventData`] field mapping
//! instead.

use serde::Serialize;
use serde_json::{Map, Value};

/// A typed, named application event.
///
/// The type name is the registry key and the broker channel name, so it must
/// be non-empty and stable for the lifetime of the type.
///
/// # Example
///
/// ```rust
/// use eve_bus::Event;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct OrderPlaced {
///     order_id: String,
///     total: f64,
/// }
///
/// impl Event for OrderPlaced {
///     fn event_type() -> &'static str {
///         "OrderPlaced"
///     }
/// }
/// ```
pub trait Event: Serialize {
    /// Stable name identifying this event type.
    fn event_type() -> &'static str;
}

/// Decoded event payload delivered to handlers.
///
/// A mapping from field name to `serde_json::Value`, the closed tagged union
/// over strings, numbers, booleans, sequences, and nested mappings. Field
/// names unknown at compile time stay addressable through [`EventData::get`]
/// and the typed accessors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventData {
    fields: Map<String, Value>,
}

impl EventData {
    /// Wraps a decoded field mapping.
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Returns the raw value of a field, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a field as a string slice, if present and a string.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Returns a field as an `i64`, if present and an integer.
    #[must_use]
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(Value::as_i64)
    }

    /// Returns a field as an `f64`, if present and numeric.
    #[must_use]
    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(Value::as_f64)
    }

    /// Returns a field as a boolean, if present and a boolean.
    #[must_use]
    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(Value::as_bool)
    }

    /// Returns `true` if the mapping contains the named field.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the mapping has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Borrows the underlying field mapping.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for EventData {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}
