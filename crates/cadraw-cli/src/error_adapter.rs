//! Error adapter for converting CadrawError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error
//! types and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use cadraw::CadrawError;
use cadraw_mapping::ConfigurationError;

/// Adapter wrapping a [`CadrawError`] for rich error formatting in the CLI.
pub struct ErrorAdapter<'a>(pub &'a CadrawError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            CadrawError::Io(_) => "cadraw::io",
            CadrawError::Configuration(err) => configuration_code(err),
            CadrawError::UnresolvedReference { .. } => "cadraw::unresolved_reference",
            CadrawError::Serialization { .. } => "cadraw::serialization",
            CadrawError::InvalidInput { .. } => "cadraw::invalid_input",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help: &str = match &self.0 {
            CadrawError::UnresolvedReference { .. } => {
                "ensure the referenced object is present in one of the processed input files"
            }
            CadrawError::Configuration(
                ConfigurationError::UnknownClass { .. }
                | ConfigurationError::UnknownAttribute { .. },
            ) => "rule paths use the canonical names defined by the schema",
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

fn configuration_code(err: &ConfigurationError) -> &'static str {
    match err {
        ConfigurationError::UnknownClass { .. } => "cadraw::config::unknown_class",
        ConfigurationError::UnknownAttribute { .. } => "cadraw::config::unknown_attribute",
        ConfigurationError::DanglingPath { .. } => "cadraw::config::dangling_path",
        ConfigurationError::UnexpectedContinuation { .. } => "cadraw::config::unexpected_continuation",
        ConfigurationError::NotAnEnumeration { .. } => "cadraw::config::not_an_enumeration",
        ConfigurationError::UnknownEnumerationValue { .. } => {
            "cadraw::config::unknown_enumeration_value"
        }
        ConfigurationError::MissingOutputPath { .. } => "cadraw::config::missing_output_path",
        ConfigurationError::Io(_) => "cadraw::config::io",
        ConfigurationError::RuleTable(_) => "cadraw::config::rule_table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_error_variants() {
        let err = CadrawError::UnresolvedReference {
            oid: "obj_1".to_string(),
        };
        let adapter = ErrorAdapter(&err);
        assert_eq!(
            adapter.code().unwrap().to_string(),
            "cadraw::unresolved_reference"
        );
        assert!(adapter.help().is_some());

        let err = CadrawError::Configuration(ConfigurationError::UnknownClass {
            name: "LK.Map.Unknown".to_string(),
        });
        let adapter = ErrorAdapter(&err);
        assert_eq!(
            adapter.code().unwrap().to_string(),
            "cadraw::config::unknown_class"
        );
    }
}
