//! Typed geometry for resolved outputs.
//!
//! Coordinates are planar; circular arcs between two polyline vertices are
//! carried as the arc's mid point on the vertex they lead into.

/// A planar point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }
}

/// One polyline vertex, optionally reached from its predecessor along a
/// circular arc through `arc_mid`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    point: Point,
    arc_mid: Option<Point>,
}

impl Vertex {
    /// A vertex reached along a straight segment.
    pub fn line_to(point: Point) -> Self {
        Self {
            point,
            arc_mid: None,
        }
    }

    /// A vertex reached along a circular arc through the given mid point.
    pub fn arc_to(point: Point, mid: Point) -> Self {
        Self {
            point,
            arc_mid: Some(mid),
        }
    }

    pub fn point(self) -> Point {
        self.point
    }

    pub fn arc_mid(self) -> Option<Point> {
        self.arc_mid
    }
}

/// An open or closed vertex chain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline {
    vertices: Vec<Vertex>,
}

impl Polyline {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// A polyline is closed when its first and last vertices coincide.
    pub fn is_closed(&self) -> bool {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) => {
                self.vertices.len() > 1 && first.point() == last.point()
            }
            _ => false,
        }
    }
}

/// One polygon: an outer boundary followed by its holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    boundaries: Vec<Polyline>,
}

impl Surface {
    pub fn new(boundaries: Vec<Polyline>) -> Self {
        Self { boundaries }
    }

    /// Outer boundary first, then the holes.
    pub fn boundaries(&self) -> &[Polyline] {
        &self.boundaries
    }
}

/// A collection of polygons forming one area value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiSurface {
    surfaces: Vec<Surface>,
}

impl MultiSurface {
    pub fn new(surfaces: Vec<Surface>) -> Self {
        Self { surfaces }
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    /// Total boundary-loop count across all surfaces.
    pub fn boundary_count(&self) -> usize {
        self.surfaces
            .iter()
            .map(|surface| surface.boundaries().len())
            .sum()
    }
}

/// The resolved geometry of one output.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    Line(Polyline),
    Surface(MultiSurface),
}

impl Geometry {
    /// The axis-aligned envelope of this geometry, or `None` for an empty
    /// geometry.
    pub fn envelope(&self) -> Option<Rect> {
        let mut points = Vec::new();
        match self {
            Geometry::Point(point) => points.push(*point),
            Geometry::Line(line) => collect_points(line, &mut points),
            Geometry::Surface(multi_surface) => {
                for surface in multi_surface.surfaces() {
                    for boundary in surface.boundaries() {
                        collect_points(boundary, &mut points);
                    }
                }
            }
        }
        Rect::around(&points)
    }
}

fn collect_points(polyline: &Polyline, points: &mut Vec<Point>) {
    for vertex in polyline.vertices() {
        points.push(vertex.point());
        if let Some(mid) = vertex.arc_mid() {
            points.push(mid);
        }
    }
}

/// An axis-aligned rectangle, used as a perimeter filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Rect {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    /// The smallest rectangle containing all points, or `None` for an
    /// empty slice.
    pub fn around(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut rect = Self::new(first.x(), first.y(), first.x(), first.y());
        for point in &points[1..] {
            rect.min_x = rect.min_x.min(point.x());
            rect.min_y = rect.min_y.min(point.y());
            rect.max_x = rect.max_x.max(point.x());
            rect.max_y = rect.max_y.max(point.y());
        }
        Some(rect)
    }

    pub fn intersects(self, other: Rect) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}
