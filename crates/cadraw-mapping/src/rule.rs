//! Rule-table definitions.
//!
//! A rule table is an ordered list of [`RuleDefinition`]s loaded from a
//! TOML document. Each rule names the record classes it applies to, the
//! output kind it produces, the destination layer with its render
//! attributes, the attribute paths supplying geometry/orientation/text,
//! and zero or more value-set predicates.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::ConfigurationError;

/// The rendering kind a rule produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// A filled area, possibly with holes.
    Surface,
    /// A line geometry.
    Line,
    /// A point geometry marked with a symbol block.
    Point,
    /// An aligned, oriented label.
    Text,
}

/// One predicate: an attribute path plus the values it may resolve to.
#[derive(Debug, Clone, Deserialize)]
pub struct PredicateDefinition {
    /// Arrow-separated chain of canonical attribute/role names.
    pub path: String,
    /// Allowed enumeration values (dotted for sub-enumeration values).
    pub values: Vec<String>,
}

/// One configured mapping rule.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDefinition {
    /// Destination layer name.
    pub layer: String,
    /// Record tags this rule applies to.
    pub classes: Vec<String>,
    pub output: OutputKind,
    /// Path to the geometry attribute.
    pub geometry: String,
    #[serde(default = "default_color")]
    pub color: i32,
    #[serde(default)]
    pub orientation: Option<String>,
    #[serde(default)]
    pub v_align: Option<String>,
    #[serde(default)]
    pub h_align: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Block symbol name for point outputs.
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub linetype: Option<String>,
    #[serde(default = "default_lineweight")]
    pub lineweight: f64,
    #[serde(default = "default_textsize")]
    pub textsize: f64,
    /// Text style font for text outputs.
    #[serde(default)]
    pub font: Option<String>,
    /// Predicates, matched in declared order.
    #[serde(default)]
    pub predicates: Vec<PredicateDefinition>,
}

fn default_color() -> i32 {
    7
}

fn default_lineweight() -> f64 {
    0.25
}

fn default_textsize() -> f64 {
    1.25
}

/// The ordered rule table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleTable {
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleDefinition>,
}

impl RuleTable {
    /// Parses a rule table from its TOML source.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigurationError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a rule table file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
