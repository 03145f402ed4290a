//! Tagged domain records.
//!
//! A [`Record`] is one object from the input stream: a class tag, an
//! object-id and a tree of named attribute values. Attribute values are
//! scalars, nested structures or references to other objects by id, and a
//! name may carry several values (ordered as they arrived).

use indexmap::IndexMap;

/// A single attribute value of a record or nested structure.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A scalar value, kept in its textual transfer form.
    Text(String),
    /// A nested structure value.
    Struct(StructValue),
    /// A reference to another object by its object-id.
    Reference(String),
}

/// An ordered collection of named, multi-valued attributes.
///
/// Both records and nested structure values share this shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructValue {
    fields: IndexMap<String, Vec<Value>>,
}

impl StructValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under the given attribute name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.entry(name.into()).or_default().push(value);
    }

    /// All values stored under the given name, in insertion order.
    pub fn values(&self, name: &str) -> &[Value] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The first value stored under the given name.
    pub fn first(&self, name: &str) -> Option<&Value> {
        self.values(name).first()
    }

    /// The first scalar value stored under the given name.
    pub fn scalar(&self, name: &str) -> Option<&str> {
        match self.first(name) {
            Some(Value::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// The first nested structure stored under the given name.
    pub fn structure(&self, name: &str) -> Option<&StructValue> {
        match self.first(name) {
            Some(Value::Struct(value)) => Some(value),
            _ => None,
        }
    }

    /// All nested structures stored under the given name.
    pub fn structures<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a StructValue> {
        self.values(name).iter().filter_map(|value| match value {
            Value::Struct(value) => Some(value),
            _ => None,
        })
    }

    /// The referenced object-id stored under the given name.
    pub fn reference(&self, name: &str) -> Option<&str> {
        match self.first(name) {
            Some(Value::Reference(oid)) => Some(oid),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One tagged domain object from the input stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    tag: String,
    oid: String,
    value: StructValue,
}

impl Record {
    pub fn new(tag: impl Into<String>, oid: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            oid: oid.into(),
            value: StructValue::new(),
        }
    }

    /// The scoped class name of this record.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The object-id of this record.
    pub fn oid(&self) -> &str {
        &self.oid
    }

    /// The attribute values of this record.
    pub fn value(&self) -> &StructValue {
        &self.value
    }

    /// Appends an attribute value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.value.insert(name, value);
    }

    /// Builder-style variant of [`Record::insert`].
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Builder-style scalar attribute.
    pub fn with_scalar(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.with(name, Value::Text(text.into()))
    }

    /// Builder-style reference attribute.
    pub fn with_reference(self, name: impl Into<String>, oid: impl Into<String>) -> Self {
        self.with(name, Value::Reference(oid.into()))
    }
}
