//! Cadraw Core Types and Definitions
//!
//! This crate provides the foundational types for the cadraw pipeline:
//!
//! - **Records**: tagged domain objects from an input stream ([`record`] module)
//! - **Schema**: class/attribute/role introspection with canonical-name
//!   aliasing and enumeration trees ([`schema`] module)
//! - **Geometry**: typed point/line/surface geometry with arc support
//!   ([`geometry`] module)

pub mod geometry;
pub mod record;
pub mod schema;
