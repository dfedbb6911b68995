//! Drawable geometry kinds and visitor dispatch.

use geo::{
    Area, BoundingRect, EuclideanLength, LineString, MultiLineString, MultiPolygon, Polygon, Rect,
    Translate,
};

/// Geometry kinds that can appear in a clipped vector layer.
#[derive(Debug, Clone, PartialEq)]
pub enum MapGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
    LineString(LineString<f64>),
    MultiLineString(MultiLineString<f64>),
    GeometryCollection(Vec<MapGeometry>),
}

impl MapGeometry {
    /// Convert from a general geo geometry. Point-like kinds are not drawable
    /// and yield `None`.
    pub fn from_geo(geometry: geo::Geometry<f64>) -> Option<Self> {
        match geometry {
            geo::Geometry::Polygon(p) => Some(MapGeometry::Polygon(p)),
            geo::Geometry::MultiPolygon(mp) => Some(MapGeometry::MultiPolygon(mp)),
            geo::Geometry::LineString(ls) => Some(MapGeometry::LineString(ls)),
            geo::Geometry::MultiLineString(mls) => Some(MapGeometry::MultiLineString(mls)),
            geo::Geometry::Line(line) => Some(MapGeometry::LineString(line.into())),
            geo::Geometry::Rect(rect) => Some(MapGeometry::Polygon(rect.to_polygon())),
            geo::Geometry::Triangle(tri) => Some(MapGeometry::Polygon(tri.to_polygon())),
            geo::Geometry::GeometryCollection(gc) => {
                let members: Vec<_> = gc.into_iter().filter_map(MapGeometry::from_geo).collect();
                if members.is_empty() {
                    None
                } else {
                    Some(MapGeometry::GeometryCollection(members))
                }
            }
            geo::Geometry::Point(_) | geo::Geometry::MultiPoint(_) => None,
        }
    }

    /// Short name of the geometry kind, for log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            MapGeometry::Polygon(_) => "Polygon",
            MapGeometry::MultiPolygon(_) => "MultiPolygon",
            MapGeometry::LineString(_) => "LineString",
            MapGeometry::MultiLineString(_) => "MultiLineString",
            MapGeometry::GeometryCollection(_) => "GeometryCollection",
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            MapGeometry::Polygon(p) => p.exterior().0.is_empty(),
            MapGeometry::MultiPolygon(mp) => mp.0.is_empty(),
            MapGeometry::LineString(ls) => ls.0.is_empty(),
            MapGeometry::MultiLineString(mls) => mls.0.iter().all(|ls| ls.0.is_empty()),
            MapGeometry::GeometryCollection(members) => members.iter().all(MapGeometry::is_empty),
        }
    }

    /// Total planar area in squared degrees.
    pub fn area(&self) -> f64 {
        match self {
            MapGeometry::Polygon(p) => p.unsigned_area(),
            MapGeometry::MultiPolygon(mp) => mp.unsigned_area(),
            MapGeometry::LineString(_) | MapGeometry::MultiLineString(_) => 0.0,
            MapGeometry::GeometryCollection(members) => members.iter().map(MapGeometry::area).sum(),
        }
    }

    /// Total planar length of line members in degrees.
    pub fn length(&self) -> f64 {
        match self {
            MapGeometry::LineString(ls) => ls.euclidean_length(),
            MapGeometry::MultiLineString(mls) => mls.euclidean_length(),
            MapGeometry::Polygon(_) | MapGeometry::MultiPolygon(_) => 0.0,
            MapGeometry::GeometryCollection(members) => members.iter().map(MapGeometry::length).sum(),
        }
    }

    /// Bounding rectangle, `None` when empty.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        match self {
            MapGeometry::Polygon(p) => p.bounding_rect(),
            MapGeometry::MultiPolygon(mp) => mp.bounding_rect(),
            MapGeometry::LineString(ls) => ls.bounding_rect(),
            MapGeometry::MultiLineString(mls) => mls.bounding_rect(),
            MapGeometry::GeometryCollection(members) => members
                .iter()
                .filter_map(MapGeometry::bounds)
                .reduce(|a, b| {
                    Rect::new(
                        (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                        (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
                    )
                }),
        }
    }

    /// Copy shifted east by `dx` degrees.
    pub fn shifted(&self, dx: f64) -> MapGeometry {
        match self {
            MapGeometry::Polygon(p) => MapGeometry::Polygon(p.translate(dx, 0.0)),
            MapGeometry::MultiPolygon(mp) => MapGeometry::MultiPolygon(mp.translate(dx, 0.0)),
            MapGeometry::LineString(ls) => MapGeometry::LineString(ls.translate(dx, 0.0)),
            MapGeometry::MultiLineString(mls) => {
                MapGeometry::MultiLineString(mls.translate(dx, 0.0))
            }
            MapGeometry::GeometryCollection(members) => {
                MapGeometry::GeometryCollection(members.iter().map(|m| m.shifted(dx)).collect())
            }
        }
    }

    /// Dispatch to the visitor method for this kind.
    pub fn accept<V: GeometryVisitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            MapGeometry::Polygon(p) => visitor.visit_polygon(p),
            MapGeometry::MultiPolygon(mp) => visitor.visit_multi_polygon(mp),
            MapGeometry::LineString(ls) => visitor.visit_line_string(ls),
            MapGeometry::MultiLineString(mls) => visitor.visit_multi_line_string(mls),
            MapGeometry::GeometryCollection(members) => visitor.visit_collection(members),
        }
    }
}

/// A drawing routine over the closed set of geometry kinds.
///
/// Multi-part kinds and collections default to visiting each member, so most
/// routines only implement the two single-part methods.
pub trait GeometryVisitor {
    fn visit_polygon(&mut self, polygon: &Polygon<f64>);

    fn visit_line_string(&mut self, line: &LineString<f64>);

    fn visit_multi_polygon(&mut self, polygons: &MultiPolygon<f64>) {
        for polygon in polygons {
            self.visit_polygon(polygon);
        }
    }

    fn visit_multi_line_string(&mut self, lines: &MultiLineString<f64>) {
        for line in lines {
            self.visit_line_string(line);
        }
    }

    fn visit_collection(&mut self, members: &[MapGeometry]) {
        for member in members {
            member.accept(self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, polygon};

    #[derive(Default)]
    struct Counter {
        polygons: usize,
        lines: usize,
    }

    impl GeometryVisitor for Counter {
        fn visit_polygon(&mut self, _: &Polygon<f64>) {
            self.polygons += 1;
        }

        fn visit_line_string(&mut self, _: &LineString<f64>) {
            self.lines += 1;
        }
    }

    #[test]
    fn test_visitor_walks_collections() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let line = line_string![(x: 0.0, y: 0.0), (x: 2.0, y: 2.0)];
        let geom = MapGeometry::GeometryCollection(vec![
            MapGeometry::MultiPolygon(MultiPolygon::new(vec![square.clone(), square])),
            MapGeometry::LineString(line),
        ]);

        let mut counter = Counter::default();
        geom.accept(&mut counter);
        assert_eq!(counter.polygons, 2);
        assert_eq!(counter.lines, 1);
    }

    #[test]
    fn test_points_are_not_drawable() {
        let point = geo::Geometry::Point(geo::Point::new(1.0, 2.0));
        assert!(MapGeometry::from_geo(point).is_none());
    }

    #[test]
    fn test_area_and_length() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0)];
        assert_eq!(MapGeometry::Polygon(square).area(), 4.0);
        let line = line_string![(x: 0.0, y: 0.0), (x: 3.0, y: 4.0)];
        assert_eq!(MapGeometry::LineString(line).length(), 5.0);
    }
}
