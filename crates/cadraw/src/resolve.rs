//! Path evaluation against records and the reference cache.
//!
//! [`resolve`] walks a translated path over a record's value tree.
//! Reference steps jump to the distilled cache entry of the referenced
//! object; a reference to an object that has not been seen yet yields
//! [`Resolution::Pending`], which is distinct from [`Resolution::Undefined`]
//! (no relation at all) and must propagate to the engine's retry logic.

use std::collections::HashMap;

use cadraw_core::record::{Record, StructValue, Value};
use cadraw_mapping::{PathStep, StepKind};

/// The outcome of evaluating a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// The path ended at a scalar value.
    Text(&'a str),
    /// The path ended at a complex (structure) value.
    Complex(&'a StructValue),
    /// Some step had no value; the path resolves to nothing.
    Undefined,
    /// A reference step pointed at an object-id not in the cache yet.
    Pending,
}

/// Walks `steps` over `value`, crossing references through `cache`.
pub fn resolve<'a>(
    value: &'a StructValue,
    steps: &[PathStep],
    cache: &'a ReferenceCache,
) -> Resolution<'a> {
    let mut current = Some(value);
    for step in steps {
        let Some(record) = current else { break };
        match step.kind() {
            StepKind::Attribute => {
                return match record.first(step.name()) {
                    Some(Value::Text(text)) => Resolution::Text(text),
                    Some(Value::Struct(complex)) => Resolution::Complex(complex),
                    Some(Value::Reference(_)) | None => Resolution::Undefined,
                };
            }
            StepKind::Structure => {
                current = record.structure(step.name());
            }
            StepKind::Reference { .. } => match record.first(step.name()) {
                Some(Value::Reference(oid)) => match cache.get(oid) {
                    Some(entry) => current = Some(entry),
                    None => return Resolution::Pending,
                },
                // Distilled cache entries inline the resolved target
                // structure of a chained reference; descend directly.
                Some(Value::Struct(inlined)) => current = Some(inlined),
                Some(Value::Text(_)) | None => current = None,
            },
        }
    }
    match current {
        Some(complex) => Resolution::Complex(complex),
        None => Resolution::Undefined,
    }
}

/// Distilled per-object attribute subsets, keyed by object-id.
///
/// An entry holds only the attribute values some rule's reference path
/// dereferences on objects of that class, never a full object copy.
/// Entries are created once, on first sight of an object, and never
/// mutated afterward.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    entries: HashMap<String, StructValue>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, oid: &str) -> Option<&StructValue> {
        self.entries.get(oid)
    }

    /// Builds and stores the distilled record for `record`, evaluating
    /// each required single-step path. Unresolved or undefined fields are
    /// omitted. A second sighting of the same object-id is ignored.
    pub fn insert_distilled(&mut self, record: &Record, required: &[PathStep]) {
        if self.entries.contains_key(record.oid()) {
            return;
        }
        let mut distilled = StructValue::new();
        for step in required {
            match resolve(record.value(), std::slice::from_ref(step), self) {
                Resolution::Text(text) => {
                    distilled.insert(step.name(), Value::Text(text.to_string()));
                }
                Resolution::Complex(complex) => {
                    distilled.insert(step.name(), Value::Struct(complex.clone()));
                }
                Resolution::Undefined | Resolution::Pending => {}
            }
        }
        self.entries.insert(record.oid().to_string(), distilled);
    }
}
