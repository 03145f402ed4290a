//! Maps streams of tagged cadastral network records onto typed DXF
//! entities grouped into named layers.
//!
//! The pipeline has three stages:
//!
//! 1. A [`cadraw_mapping::RuleSet`] is compiled once per run from the
//!    configured rule table and the domain schema.
//! 2. The [`engine::MappingEngine`] streams records through the compiled
//!    rules in two passes, deferring records whose reference predicates
//!    point at objects not yet seen and retrying them once the input is
//!    exhausted.
//! 3. The [`export::dxf::DxfWriter`] serializes each resolved output as
//!    one DXF entity.

pub mod engine;
pub mod error;
pub mod export;
pub mod mapped;
pub mod resolve;

pub use engine::MappingEngine;
pub use error::CadrawError;
pub use export::dxf::DxfWriter;
pub use mapped::MappedObject;
