//! Rule-table configuration for the cadraw pipeline.
//!
//! This crate turns externally configured mapping rules into an immutable,
//! fully typed [`RuleSet`](compile::RuleSet):
//!
//! - [`rule`]: the rule-table definitions and their TOML loader
//! - [`path`]: translation of schema-relative attribute paths into typed
//!   steps
//! - [`compile`]: compilation of rules into ordered predicate chains plus
//!   per-class cache requirements
//!
//! All failures here are [`ConfigurationError`](error::ConfigurationError)s
//! and abort a run before any record is processed.

pub mod compile;
pub mod error;
pub mod path;
pub mod rule;

pub use compile::{CompiledRule, OutputPaths, RuleCompiler, RuleSet, ValuePredicate};
pub use error::ConfigurationError;
pub use path::{AttributePath, PathStep, PathTranslator, StepKind, TranslatedPath};
pub use rule::{OutputKind, PredicateDefinition, RuleDefinition, RuleTable};
