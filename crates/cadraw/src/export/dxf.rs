//! Streaming DXF serializer.
//!
//! Produces an AC1021 (AutoCAD 2007) ASCII DXF file as a flat stream of
//! group-code/value pairs. The constructor writes the full file prolog
//! (header, symbol tables, the layer palette and one block per configured
//! point symbol) so entities can be appended one by one; [`DxfWriter::finish`]
//! closes the entities section and writes the objects trailer.
//!
//! Entity handles are allocated from a single counter and written as
//! uppercase hex, so output is deterministic for identical inputs.

use std::f64::consts::PI;
use std::io::{self, Write};

use cadraw_core::geometry::{MultiSurface, Point, Polyline, Vertex};
use cadraw_mapping::RuleDefinition;

const DEFAULT_LAYER: &str = "0";

/// Writes one DXF document to an underlying writer.
pub struct DxfWriter<W: Write> {
    writer: W,
    precision: usize,
    handle: u64,
    finished: bool,
}

impl<W: Write> DxfWriter<W> {
    /// Creates a writer and emits the document prolog.
    ///
    /// The layer table, text styles and symbol blocks are derived from the
    /// configured rule definitions in declared order; the first rule
    /// naming a layer determines its render attributes. `comment` becomes
    /// a 999 group at the very beginning of the file.
    pub fn new(
        writer: W,
        precision: usize,
        palette: &[RuleDefinition],
        comment: Option<&str>,
    ) -> io::Result<Self> {
        let mut dxf = Self {
            writer,
            precision,
            handle: 1,
            finished: false,
        };
        dxf.write_prolog(palette, comment)?;
        Ok(dxf)
    }

    /// Writes a LWPOLYLINE entity. A chain whose first and last vertices
    /// coincide is written as a closed polyline with the duplicate vertex
    /// dropped.
    pub fn write_polyline(&mut self, layer: &str, polyline: &Polyline) -> io::Result<()> {
        let closed = polyline.is_closed();
        let count = polyline.vertices().len() - usize::from(closed);

        self.raw(0, "LWPOLYLINE")?;
        let handle = self.next_handle();
        self.raw(5, &handle)?;
        self.raw(100, "AcDbEntity")?;
        self.raw(8, layer)?;
        self.raw(100, "AcDbPolyline")?;
        self.int(90, count as i64)?;
        self.int(70, i64::from(closed))?;
        self.write_vertices(polyline, closed)
    }

    /// Writes a solid-fill HATCH entity with one boundary loop per
    /// polygon boundary. The first loop of each polygon is marked
    /// external, further loops (holes) outermost.
    pub fn write_hatch(&mut self, layer: &str, multi_surface: &MultiSurface) -> io::Result<()> {
        self.raw(0, "HATCH")?;
        let handle = self.next_handle();
        self.raw(5, &handle)?;
        self.raw(100, "AcDbEntity")?;
        self.raw(8, layer)?;
        self.raw(100, "AcDbHatch")?;
        self.float(10, 0.0)?;
        self.float(20, 0.0)?;
        self.float(30, 0.0)?;
        self.float(210, 0.0)?;
        self.float(220, 0.0)?;
        self.float(230, 1.0)?;
        self.raw(2, "SOLID")?;
        self.int(70, 1)?; // solid fill
        self.int(71, 0)?; // not associative

        self.int(91, multi_surface.boundary_count() as i64)?;
        for surface in multi_surface.surfaces() {
            for (index, boundary) in surface.boundaries().iter().enumerate() {
                let external = if index == 0 { 1 } else { 16 };
                self.int(92, external + 2)?; // polygon loop
                self.int(72, 1)?; // has bulge
                self.int(73, 1)?; // is closed
                self.int(93, boundary.vertices().len() as i64 - 1)?;
                self.write_vertices(boundary, true)?;
                self.int(97, 0)?; // no source boundaries
            }
        }

        self.int(75, 0)?; // odd parity
        self.int(76, 1)?; // predefined pattern
        self.int(98, 0) // no seed points
    }

    /// Writes a CIRCLE entity.
    pub fn write_circle(&mut self, layer: &str, center: Point, radius: f64) -> io::Result<()> {
        self.raw(0, "CIRCLE")?;
        let handle = self.next_handle();
        self.raw(5, &handle)?;
        self.raw(100, "AcDbEntity")?;
        self.raw(8, layer)?;
        self.raw(100, "AcDbCircle")?;
        self.float(10, center.x())?;
        self.float(20, center.y())?;
        self.float(40, radius)
    }

    /// Writes an INSERT entity referencing a symbol block.
    pub fn write_block_insert(
        &mut self,
        layer: &str,
        block: &str,
        rotation: f64,
        point: Point,
    ) -> io::Result<()> {
        self.raw(0, "INSERT")?;
        let handle = self.next_handle();
        self.raw(5, &handle)?;
        self.raw(100, "AcDbEntity")?;
        self.raw(8, layer)?;
        self.raw(100, "AcDbBlockReference")?;
        self.raw(2, block)?;
        self.float(10, point.x())?;
        self.float(20, point.y())?;
        self.float(50, convert_orientation(rotation))
    }

    /// Writes a TEXT entity.
    ///
    /// With the default alignment (left/base) the anchor point is stored
    /// in the first point group; any other alignment stores it in the
    /// second point group along with the alignment flags.
    #[allow(clippy::too_many_arguments)]
    pub fn write_text(
        &mut self,
        layer: &str,
        style: &str,
        height: f64,
        text: &str,
        h_align: Option<&str>,
        v_align: Option<&str>,
        orientation: f64,
        position: Point,
    ) -> io::Result<()> {
        let h_value = match h_align.unwrap_or_default().to_lowercase().as_str() {
            "right" => 2,
            "center" => 1,
            _ => 0, // left
        };
        let v_value = match v_align.unwrap_or_default().to_lowercase().as_str() {
            "top" | "cap" => 3,
            "half" => 2,
            "bottom" => 1,
            _ => 0, // base
        };
        let default_alignment = h_value == 0 && v_value == 0;
        let orientation = convert_orientation(orientation);

        self.raw(0, "TEXT")?;
        let handle = self.next_handle();
        self.raw(5, &handle)?;
        self.raw(100, "AcDbEntity")?;
        self.raw(8, layer)?;
        self.raw(100, "AcDbText")?;
        self.raw(7, style)?;
        self.float(10, if default_alignment { position.x() } else { 0.0 })?;
        self.float(20, if default_alignment { position.y() } else { 0.0 })?;
        self.float(40, height)?;
        self.raw(1, text)?;
        if h_value != 0 {
            self.int(72, h_value)?;
        }
        if !default_alignment {
            self.float(11, position.x())?;
            self.float(21, position.y())?;
        }
        if orientation != 0.0 {
            self.float(50, orientation)?;
        }
        self.raw(100, "AcDbText")?;
        if v_value != 0 {
            self.int(73, v_value)?;
        }
        Ok(())
    }

    /// Closes the entities section and writes the objects trailer.
    pub fn finish(mut self) -> io::Result<()> {
        self.write_trailer()?;
        self.writer.flush()
    }

    fn write_prolog(
        &mut self,
        palette: &[RuleDefinition],
        comment: Option<&str>,
    ) -> io::Result<()> {
        struct LayerRow {
            name: String,
            linetype: String,
            color: i32,
            lineweight: f64,
        }

        let mut layers = vec![LayerRow {
            name: DEFAULT_LAYER.to_string(),
            linetype: "Continuous".to_string(),
            color: 0,
            lineweight: 0.25,
        }];
        let mut fonts: Vec<&str> = Vec::new();
        let mut symbols: Vec<&str> = Vec::new();
        for definition in palette {
            if !layers.iter().any(|layer| layer.name == definition.layer) {
                layers.push(LayerRow {
                    name: definition.layer.clone(),
                    linetype: definition.linetype.clone().unwrap_or_default(),
                    color: definition.color,
                    lineweight: definition.lineweight,
                });
            }
            if let Some(font) = definition.font.as_deref() {
                if !font.trim().is_empty() && !fonts.contains(&font) {
                    fonts.push(font);
                }
            }
            if let Some(symbol) = definition.symbol.as_deref() {
                if !symbol.is_empty() && !symbols.contains(&symbol) {
                    symbols.push(symbol);
                }
            }
        }
        let fonts: Vec<String> = fonts.into_iter().map(str::to_string).collect();
        let symbols: Vec<String> = symbols.into_iter().map(str::to_string).collect();

        if let Some(comment) = comment {
            self.raw(999, comment)?;
        }

        // HEADER
        self.begin_section("HEADER")?;
        self.raw(9, "$ACADVER")?;
        self.raw(1, "AC1021")?;
        self.raw(9, "$HANDSEED")?;
        self.raw(5, "3b9aca00")?; // 1_000_000_000 in hex
        self.raw(9, "$INSUNITS")?;
        self.int(70, 6)?; // meters
        self.end_section()?;

        self.begin_section("CLASSES")?;
        self.end_section()?;

        // TABLES
        self.begin_section("TABLES")?;

        self.begin_table("VPORT", 1)?;
        self.write_default_viewport()?;
        self.end_table()?;

        self.begin_table("LTYPE", 5)?;
        self.write_linetype("ByLayer", &[])?;
        self.write_linetype("ByBlock", &[])?;
        self.write_linetype("Continuous", &[])?;
        self.write_linetype("Dashed", &[0.5, -0.25])?;
        self.write_linetype("DashDotDot", &[0.5, -0.25, 0.0, -0.25, 0.0, -0.25])?;
        self.end_table()?;

        self.begin_table("LAYER", layers.len())?;
        for layer in &layers {
            self.write_layer(&layer.name, &layer.linetype, layer.color, layer.lineweight)?;
        }
        self.end_table()?;

        self.begin_table("STYLE", fonts.len())?;
        for font in &fonts {
            self.write_style(font)?;
        }
        self.end_table()?;

        self.begin_table("VIEW", 0)?;
        self.end_table()?;
        self.begin_table("UCS", 0)?;
        self.end_table()?;

        self.begin_table("APPID", 1)?;
        self.write_default_appid()?;
        self.end_table()?;

        self.write_minimal_dimstyle_table()?;

        self.begin_table("BLOCK_RECORD", 2 + symbols.len())?;
        self.write_block_record("*Model_Space")?;
        self.write_block_record("*Paper_Space")?;
        for symbol in &symbols {
            self.write_block_record(symbol)?;
        }
        self.end_table()?;

        self.end_section()?;

        // BLOCKS
        self.begin_section("BLOCKS")?;
        self.write_block("*Model_Space", false)?;
        self.write_block("*Paper_Space", false)?;
        for symbol in &symbols {
            self.write_block(symbol, true)?;
        }
        self.end_section()?;

        self.raw(0, "SECTION")?;
        self.raw(2, "ENTITIES")
    }

    fn write_trailer(&mut self) -> io::Result<()> {
        self.finished = true;
        self.raw(0, "ENDSEC")?;

        self.begin_section("OBJECTS")?;
        let root_handle = self.next_handle();
        let entry_handle = self.next_handle();
        self.raw(0, "DICTIONARY")?;
        self.raw(5, &root_handle)?;
        self.raw(330, "0")?;
        self.raw(100, "AcDbDictionary")?;
        self.int(281, 1)?;
        self.raw(3, "ACAD_GROUP")?;
        self.raw(350, &entry_handle)?;
        self.raw(0, "DICTIONARY")?;
        self.raw(5, &entry_handle)?;
        self.raw(330, &root_handle)?;
        self.raw(100, "AcDbDictionary")?;
        self.int(281, 1)?;
        self.end_section()?;

        self.raw(0, "EOF")
    }

    fn write_vertices(&mut self, polyline: &Polyline, closed: bool) -> io::Result<()> {
        let vertices = polyline.vertices();
        let Some(first) = vertices.first() else {
            return Ok(());
        };

        let mut prev = first.point();
        for vertex in &vertices[1..] {
            self.float(10, prev.x())?;
            self.float(20, prev.y())?;
            self.float(42, bulge(prev, *vertex))?;
            prev = vertex.point();
        }
        if !closed {
            self.float(10, prev.x())?;
            self.float(20, prev.y())?;
            self.float(42, 0.0)?;
        }
        Ok(())
    }

    fn write_default_viewport(&mut self) -> io::Result<()> {
        self.raw(0, "VPORT")?;
        let handle = self.next_handle();
        self.raw(5, &handle)?;
        self.raw(100, "AcDbSymbolTableRecord")?;
        self.raw(100, "AcDbViewportTableRecord")?;
        self.raw(2, "*ACTIVE")?;
        self.int(70, 0)
    }

    fn write_default_appid(&mut self) -> io::Result<()> {
        self.raw(0, "APPID")?;
        let handle = self.next_handle();
        self.raw(5, &handle)?;
        self.raw(100, "AcDbSymbolTableRecord")?;
        self.raw(100, "AcDbRegAppTableRecord")?;
        self.raw(2, "ACAD")?;
        self.int(70, 0)
    }

    // DIMSTYLE carries an extra subclass marker and a 71 group, unlike
    // the generic tables.
    fn write_minimal_dimstyle_table(&mut self) -> io::Result<()> {
        self.raw(0, "TABLE")?;
        self.raw(2, "DIMSTYLE")?;
        let handle = self.next_handle();
        self.raw(5, &handle)?;
        self.raw(100, "AcDbSymbolTable")?;
        self.raw(100, "AcDbDimStyleTable")?;
        self.int(70, 0)?;
        self.int(71, 1)?;
        self.raw(0, "ENDTAB")
    }

    fn write_style(&mut self, font: &str) -> io::Result<()> {
        self.raw(0, "STYLE")?;
        let handle = self.next_handle();
        self.raw(5, &handle)?;
        self.raw(100, "AcDbSymbolTableRecord")?;
        self.raw(100, "AcDbTextStyleTableRecord")?;
        self.raw(2, font)?;
        self.raw(3, font)?;
        self.int(70, 0)
    }

    fn write_layer(
        &mut self,
        name: &str,
        linetype: &str,
        color: i32,
        lineweight: f64,
    ) -> io::Result<()> {
        self.raw(0, "LAYER")?;
        let handle = self.next_handle();
        self.raw(5, &handle)?;
        self.raw(100, "AcDbSymbolTableRecord")?;
        self.raw(100, "AcDbLayerTableRecord")?;
        self.raw(2, name)?;
        self.raw(6, if linetype.is_empty() { "Continuous" } else { linetype })?;
        self.int(370, (lineweight * 100.0).round() as i64)?;
        self.int(62, i64::from(color))?;
        self.int(70, 0)?;
        self.int(390, 0)
    }

    fn write_linetype(&mut self, name: &str, pattern: &[f64]) -> io::Result<()> {
        self.raw(0, "LTYPE")?;
        let handle = self.next_handle();
        self.raw(5, &handle)?;
        self.raw(100, "AcDbSymbolTableRecord")?;
        self.raw(100, "AcDbLinetypeTableRecord")?;
        self.raw(2, name)?;
        self.int(70, 0)?;
        self.int(72, 65)?;
        self.int(73, pattern.len() as i64)?;
        self.float(40, pattern.iter().map(|value| value.abs()).sum())?;
        for value in pattern {
            self.float(49, *value)?;
            self.int(74, 0)?; // complex linetype element type
        }
        Ok(())
    }

    fn write_block_record(&mut self, name: &str) -> io::Result<()> {
        self.raw(0, "BLOCK_RECORD")?;
        let handle = self.next_handle();
        self.raw(5, &handle)?;
        self.raw(100, "AcDbSymbolTableRecord")?;
        self.raw(100, "AcDbBlockTableRecord")?;
        self.raw(2, name)?;
        self.int(70, 0)?;
        self.int(280, 1)?; // is explodable
        self.int(281, 0) // is scalable
    }

    fn write_block(&mut self, name: &str, with_symbol_circle: bool) -> io::Result<()> {
        self.raw(0, "BLOCK")?;
        let handle = self.next_handle();
        self.raw(5, &handle)?;
        self.raw(8, DEFAULT_LAYER)?;
        self.raw(100, "AcDbEntity")?;
        self.raw(100, "AcDbBlockBegin")?;
        self.raw(2, name)?;
        self.int(70, 0)?;
        self.float(10, 0.0)?;
        self.float(20, 0.0)?;
        self.float(30, 0.0)?;
        if with_symbol_circle {
            self.write_circle(DEFAULT_LAYER, Point::new(0.0, 0.0), 0.5)?;
        }
        self.raw(0, "ENDBLK")?;
        let handle = self.next_handle();
        self.raw(5, &handle)?;
        self.raw(8, DEFAULT_LAYER)?;
        self.raw(100, "AcDbEntity")?;
        self.raw(100, "AcDbBlockEnd")
    }

    fn begin_section(&mut self, name: &str) -> io::Result<()> {
        self.raw(0, "SECTION")?;
        self.raw(2, name)
    }

    fn end_section(&mut self) -> io::Result<()> {
        self.raw(0, "ENDSEC")
    }

    fn begin_table(&mut self, name: &str, entries: usize) -> io::Result<()> {
        self.raw(0, "TABLE")?;
        self.raw(2, name)?;
        let handle = self.next_handle();
        self.raw(5, &handle)?;
        self.raw(100, "AcDbSymbolTable")?;
        self.int(70, entries as i64)
    }

    fn end_table(&mut self) -> io::Result<()> {
        self.raw(0, "ENDTAB")
    }

    fn raw(&mut self, code: i32, value: &str) -> io::Result<()> {
        writeln!(self.writer, "{code}")?;
        writeln!(self.writer, "{value}")
    }

    fn int(&mut self, code: i32, value: i64) -> io::Result<()> {
        writeln!(self.writer, "{code}")?;
        writeln!(self.writer, "{value}")
    }

    fn float(&mut self, code: i32, value: f64) -> io::Result<()> {
        writeln!(self.writer, "{code}")?;
        writeln!(self.writer, "{}", format_float(value, self.precision))
    }

    fn next_handle(&mut self) -> String {
        let handle = self.handle;
        self.handle += 1;
        format!("{handle:X}")
    }
}

impl<W: Write> Drop for DxfWriter<W> {
    // Best-effort trailer so a dropped writer still yields a readable file.
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.write_trailer();
            let _ = self.writer.flush();
        }
    }
}

/// The bulge of the arc leading into `vertex`, or 0 for straight
/// segments and degenerate arcs.
fn bulge(from: Point, vertex: Vertex) -> f64 {
    let Some(mid) = vertex.arc_mid() else {
        return 0.0;
    };
    let to = vertex.point();
    let end_angle = (to.y() - mid.y()).atan2(to.x() - mid.x());
    let start_angle = (from.y() - mid.y()).atan2(from.x() - mid.x());
    let value = ((PI + end_angle - start_angle) / 2.0).tan();
    if value.is_finite() { value } else { 0.0 }
}

/// Converts a transfer orientation (clockwise from north) to a DXF
/// rotation (counter-clockwise from east).
fn convert_orientation(angle: f64) -> f64 {
    (-angle + 90.0).rem_euclid(360.0)
}

/// Fixed-precision formatting with trailing zeros removed, so `1.250`
/// becomes `1.25` and `3.000` becomes `3`.
fn format_float(value: f64, precision: usize) -> String {
    let mut text = format!("{value:.precision$}");
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_formatting_trims_trailing_zeros() {
        assert_eq!(format_float(3.0, 3), "3");
        assert_eq!(format_float(4.5, 3), "4.5");
        assert_eq!(format_float(0.6649999, 3), "0.665");
        assert_eq!(format_float(1.25, 3), "1.25");
        assert_eq!(format_float(2_600_000.0, 3), "2600000");
    }

    #[test]
    fn negative_zero_keeps_its_sign() {
        // Tiny negative values round to negative zero at fixed precision.
        assert_eq!(format_float(-9.8e-16, 3), "-0");
    }

    #[test]
    fn orientation_conversion_flips_direction_and_origin() {
        assert_eq!(convert_orientation(0.0), 90.0);
        assert_eq!(convert_orientation(30.0), 60.0);
        assert_eq!(convert_orientation(90.0), 0.0);
        assert_eq!(convert_orientation(135.0), 315.0);
        assert_eq!(convert_orientation(270.0), 180.0);
        assert_eq!(convert_orientation(-45.0), 135.0);
    }

    #[test]
    fn bulge_of_straight_segment_is_zero() {
        let vertex = Vertex::line_to(Point::new(1.0, 0.0));
        assert_eq!(bulge(Point::new(0.0, 0.0), vertex), 0.0);
    }

    #[test]
    fn bulge_of_quarter_circle() {
        use float_cmp::assert_approx_eq;

        // Quarter arc from (1, 0) through (0.707.., 0.707..) to (0, 1):
        // the bulge is tan(angle / 4).
        let mid = Point::new(0.5_f64.sqrt(), 0.5_f64.sqrt());
        let vertex = Vertex::arc_to(Point::new(0.0, 1.0), mid);
        let value = bulge(Point::new(1.0, 0.0), vertex);
        assert!(value.is_finite());
        assert_approx_eq!(f64, value, (PI / 8.0).tan(), epsilon = 1e-12);
        // The inverse formula recovers the included angle.
        assert_approx_eq!(f64, 4.0 * value.atan(), PI / 2.0, epsilon = 1e-12);
    }
}
