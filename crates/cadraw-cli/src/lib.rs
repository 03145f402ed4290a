//! cadraw CLI library
//!
//! This module contains the core CLI logic for the cadraw DXF converter.

pub mod error_adapter;

mod args;
mod config;
mod input;

pub use args::Args;
pub use error_adapter::ErrorAdapter;

use std::{fs::File, io::BufWriter, path::Path};

use log::{debug, info};

use cadraw::{CadrawError, DxfWriter, MappingEngine};
use cadraw_core::geometry::Rect;
use cadraw_mapping::{RuleCompiler, RuleTable};

const DEFAULT_PRECISION: usize = 3;

/// Run the cadraw CLI application
///
/// Compiles the configured rule table against the schema, streams every
/// input file through one mapping engine (so cross-file references
/// resolve) and writes the resolved outputs into a single DXF file.
///
/// # Errors
///
/// Returns `CadrawError` for:
/// - File I/O errors
/// - Configuration and rule compilation errors
/// - Malformed record input
/// - References that stay unresolved across all inputs
pub fn run(args: &Args) -> Result<(), CadrawError> {
    let app_config = config::load_config(args.config.as_ref())?;

    let rules_path = args
        .rules
        .clone()
        .or(app_config.rules)
        .ok_or_else(|| missing_setting("rules"))?;
    let schema_path = args
        .schema
        .clone()
        .or(app_config.schema)
        .ok_or_else(|| missing_setting("schema"))?;
    let precision = args
        .precision
        .or(app_config.precision)
        .unwrap_or(DEFAULT_PRECISION);
    let perimeter = args
        .perimeter
        .as_deref()
        .map(|values| Rect::new(values[0], values[1], values[2], values[3]));

    info!(
        rules = rules_path.as_str(),
        schema = schema_path.as_str(),
        output = args.output.as_str();
        "Compiling mapping rules"
    );
    let table = RuleTable::load(&rules_path)?;
    let schema = input::read_schema(Path::new(&schema_path))?;
    let rule_set = RuleCompiler::new(&schema).compile(&table)?;

    let file = File::create(&args.output)?;
    let mut writer = DxfWriter::new(
        BufWriter::new(file),
        precision,
        rule_set.definitions(),
        app_config.comment.as_deref(),
    )?;

    let mut engine = MappingEngine::new(&rule_set);
    for input_path in &args.inputs {
        let records = input::read_records(Path::new(input_path))?;
        info!(path = input_path.as_str(), records = records.len(); "Processing input");

        for object in engine.map(records) {
            let object = object?;
            if let Some(rect) = perimeter {
                let inside = object
                    .geometry()
                    .envelope()
                    .is_some_and(|envelope| envelope.intersects(rect));
                if !inside {
                    debug!(oid = object.oid(); "Dropping output outside the perimeter");
                    continue;
                }
            }
            object
                .write_to(&mut writer)
                .map_err(|source| CadrawError::Serialization {
                    path: input_path.clone(),
                    source,
                })?;
        }
    }
    writer.finish()?;

    info!(output = args.output.as_str(); "DXF exported successfully");
    Ok(())
}

fn missing_setting(name: &str) -> CadrawError {
    CadrawError::InvalidInput {
        path: name.to_string(),
        message: format!("no {name} path given on the command line or in the configuration"),
    }
}
