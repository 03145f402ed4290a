//! Resolved outputs and their geometry construction.
//!
//! A [`MappedObject`] is produced once a rule fully matches a record. It
//! carries the typed geometry plus the optional orientation, alignment and
//! text values the rule's output paths resolved to, and is consumed by the
//! serializer immediately.

use std::io::{self, Write};

use thiserror::Error;

use cadraw_core::{
    geometry::{Geometry, MultiSurface, Point, Polyline, Surface, Vertex},
    record::StructValue,
};
use cadraw_mapping::{CompiledRule, OutputKind};

use crate::export::dxf::DxfWriter;

/// A record resolved against a matching rule, ready for serialization.
#[derive(Debug)]
pub struct MappedObject<'r> {
    oid: String,
    geometry: Geometry,
    orientation: Option<f64>,
    v_align: Option<String>,
    h_align: Option<String>,
    text: Option<String>,
    rule: &'r CompiledRule,
}

impl<'r> MappedObject<'r> {
    pub(crate) fn new(
        oid: String,
        geometry: Geometry,
        orientation: Option<f64>,
        v_align: Option<String>,
        h_align: Option<String>,
        text: Option<String>,
        rule: &'r CompiledRule,
    ) -> Self {
        Self {
            oid,
            geometry,
            orientation,
            v_align,
            h_align,
            text,
            rule,
        }
    }

    pub fn oid(&self) -> &str {
        &self.oid
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// The rule that matched this record.
    pub fn rule(&self) -> &'r CompiledRule {
        self.rule
    }

    /// Writes this output as one DXF entity.
    pub fn write_to<W: Write>(&self, writer: &mut DxfWriter<W>) -> io::Result<()> {
        let definition = self.rule.definition();
        match (&definition.output, &self.geometry) {
            (OutputKind::Surface, Geometry::Surface(multi_surface)) => {
                writer.write_hatch(&definition.layer, multi_surface)
            }
            (OutputKind::Line, Geometry::Line(polyline)) => {
                writer.write_polyline(&definition.layer, polyline)
            }
            (OutputKind::Point, Geometry::Point(point)) => writer.write_block_insert(
                &definition.layer,
                definition.symbol.as_deref().unwrap_or_default(),
                self.orientation.unwrap_or(0.0),
                *point,
            ),
            (OutputKind::Text, Geometry::Point(point)) => writer.write_text(
                &definition.layer,
                definition.font.as_deref().unwrap_or_default(),
                definition.textsize,
                self.text.as_deref().unwrap_or_default(),
                self.h_align.as_deref(),
                self.v_align.as_deref(),
                self.orientation.unwrap_or(0.0),
                *point,
            ),
            // Geometry is constructed per output kind; a mismatch cannot
            // be produced by the engine.
            _ => Ok(()),
        }
    }
}

/// A geometry value that could not be turned into typed geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("missing geometry field {field}")]
    MissingField { field: &'static str },

    #[error("invalid coordinate value: {value}")]
    InvalidNumber { value: String },

    #[error("polyline without segments")]
    EmptyPolyline,
}

/// Builds the typed geometry an output kind requires from a resolved
/// complex value.
pub fn build_geometry(kind: OutputKind, value: &StructValue) -> Result<Geometry, GeometryError> {
    match kind {
        OutputKind::Point | OutputKind::Text => Ok(Geometry::Point(read_coord(value)?)),
        OutputKind::Line => Ok(Geometry::Line(read_polyline(value)?)),
        OutputKind::Surface => Ok(Geometry::Surface(read_multi_surface(value)?)),
    }
}

fn coordinate(value: &StructValue, field: &'static str) -> Result<f64, GeometryError> {
    let text = value
        .scalar(field)
        .ok_or(GeometryError::MissingField { field })?;
    text.parse().map_err(|_| GeometryError::InvalidNumber {
        value: text.to_string(),
    })
}

fn read_coord(value: &StructValue) -> Result<Point, GeometryError> {
    Ok(Point::new(
        coordinate(value, "C1")?,
        coordinate(value, "C2")?,
    ))
}

fn read_polyline(value: &StructValue) -> Result<Polyline, GeometryError> {
    let sequence = value
        .structure("sequence")
        .ok_or(GeometryError::MissingField { field: "sequence" })?;

    let mut vertices = Vec::new();
    for segment in sequence.structures("segment") {
        let point = read_coord(segment)?;
        // Arc segments carry the arc's mid point; the arc leads from the
        // previous vertex to this one.
        let vertex = if segment.scalar("A1").is_some() && segment.scalar("A2").is_some() {
            let mid = Point::new(coordinate(segment, "A1")?, coordinate(segment, "A2")?);
            Vertex::arc_to(point, mid)
        } else {
            Vertex::line_to(point)
        };
        vertices.push(vertex);
    }

    if vertices.is_empty() {
        return Err(GeometryError::EmptyPolyline);
    }
    Ok(Polyline::new(vertices))
}

fn read_surface(value: &StructValue) -> Result<Surface, GeometryError> {
    let mut boundaries = Vec::new();
    for boundary in value.structures("boundary") {
        let polyline = boundary
            .structure("polyline")
            .ok_or(GeometryError::MissingField { field: "polyline" })?;
        boundaries.push(read_polyline(polyline)?);
    }
    if boundaries.is_empty() {
        return Err(GeometryError::MissingField { field: "boundary" });
    }
    Ok(Surface::new(boundaries))
}

fn read_multi_surface(value: &StructValue) -> Result<MultiSurface, GeometryError> {
    let mut surfaces = Vec::new();
    for surface in value.structures("surface") {
        surfaces.push(read_surface(surface)?);
    }
    if surfaces.is_empty() {
        return Err(GeometryError::MissingField { field: "surface" });
    }
    Ok(MultiSurface::new(surfaces))
}
