//! Configuration errors.
//!
//! Every variant is fatal at compile time, before any record is processed.

use std::io;

use thiserror::Error;

/// A fatal problem in the configured rule table or its paths.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("unknown class: {name}")]
    UnknownClass { name: String },

    #[error("attribute or role not found on {class}: {name}")]
    UnknownAttribute { class: String, name: String },

    #[error("path \"{path}\" ends at {step} but must continue")]
    DanglingPath { path: String, step: String },

    #[error("path \"{path}\" continues past the terminal attribute {step}")]
    UnexpectedContinuation { path: String, step: String },

    #[error("predicate path \"{path}\" does not resolve to an enumeration")]
    NotAnEnumeration { path: String },

    #[error("enumeration value not found: {value}")]
    UnknownEnumerationValue { value: String },

    #[error("rule for layer {layer} is missing its {field} path")]
    MissingOutputPath { layer: String, field: &'static str },

    #[error("failed to read rule table: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse rule table: {0}")]
    RuleTable(#[from] toml::de::Error),
}
