//! Command-line argument definitions for the cadraw CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control the record inputs, output path, rule
//! table and schema selection, the perimeter filter and logging verbosity.

use clap::Parser;

/// Command-line arguments for the cadraw DXF converter
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Paths to the record input files (JSON), processed in order into
    /// one output drawing
    #[arg(required = true, help = "Paths to the record input files")]
    pub inputs: Vec<String>,

    /// Path to the output DXF file
    #[arg(short, long, default_value = "out.dxf")]
    pub output: String,

    /// Path to the rule table (TOML)
    #[arg(short, long)]
    pub rules: Option<String>,

    /// Path to the schema description (JSON)
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Decimal places for coordinate values
    #[arg(long)]
    pub precision: Option<usize>,

    /// Keep only outputs intersecting this rectangle
    #[arg(
        long,
        num_args = 4,
        value_names = ["MIN_X", "MIN_Y", "MAX_X", "MAX_Y"],
        allow_negative_numbers = true
    )]
    pub perimeter: Option<Vec<f64>>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}
