//! Clipping of global vector layers to the map extent.
//!
//! Every shape is intersected with the closed extent rectangle. When the
//! extent wraps the antimeridian the rectangle spans `xmin - 360..xmax`, and
//! each shape is intersected both as stored and moved 360° west so parts on
//! either side of the dateline land in the same frame. Shapes that
//! cannot be intersected (self-intersecting rings, degenerate or non-finite
//! coordinates) are skipped with a warning naming the layer; they never fail
//! the session.

use std::collections::BTreeMap;
use std::time::Instant;

use geo::line_intersection::{line_intersection, LineIntersection};
use geo::{BooleanOps, Coord, Line, LineString, MultiLineString, MultiPolygon, Polygon};
use rstar::{RTree, RTreeObject, AABB};
use shake_common::GeoExtent;

use crate::error::{GeometryError, VectorResult};
use crate::geometry::MapGeometry;
use crate::source::LayerSource;

/// Result of clipping one shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipOutcome {
    Clipped(MapGeometry),
    Skipped(GeometryError),
}

/// Clipped geometries of one layer, in query order.
#[derive(Debug, Clone, Default)]
pub struct VectorLayer {
    pub name: String,
    pub geometries: Vec<MapGeometry>,
    /// Shapes dropped because they could not be clipped.
    pub skipped: usize,
}

/// All clipped layers of a session, keyed by layer name.
#[derive(Debug, Clone, Default)]
pub struct ClippedLayers {
    layers: BTreeMap<String, VectorLayer>,
}

impl ClippedLayers {
    pub fn insert(&mut self, layer: VectorLayer) {
        self.layers.insert(layer.name.clone(), layer);
    }

    /// Geometries of a layer; empty when the layer was not configured.
    pub fn geometries(&self, name: &str) -> &[MapGeometry] {
        self.layers
            .get(name)
            .map(|l| l.geometries.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }
}

/// Clips geometries to a fixed extent.
#[derive(Debug, Clone)]
pub struct VectorClipper {
    extent: GeoExtent,
    frame: MultiPolygon<f64>,
}

impl VectorClipper {
    pub fn new(extent: GeoExtent) -> Self {
        let ring: Vec<(f64, f64)> = extent.ring().to_vec();
        let frame = MultiPolygon::new(vec![Polygon::new(LineString::from(ring), vec![])]);
        Self { extent, frame }
    }

    pub fn extent(&self) -> &GeoExtent {
        &self.extent
    }

    /// Intersect one shape with the extent.
    pub fn clip_geometry(&self, geometry: &MapGeometry) -> ClipOutcome {
        match self.try_clip(geometry) {
            Ok(clipped) => ClipOutcome::Clipped(clipped),
            Err(reason) => ClipOutcome::Skipped(reason),
        }
    }

    fn try_clip(&self, geometry: &MapGeometry) -> Result<MapGeometry, GeometryError> {
        let clipped = self.clip_in_frame(geometry)?;
        if !self.extent.crosses_antimeridian() {
            return Ok(clipped);
        }
        let wrapped = self.clip_in_frame(&geometry.shifted(-360.0))?;
        Ok(join_parts(clipped, wrapped))
    }

    fn clip_in_frame(&self, geometry: &MapGeometry) -> Result<MapGeometry, GeometryError> {
        match geometry {
            MapGeometry::Polygon(p) => {
                validate_polygon(p)?;
                Ok(polygons_to_geometry(
                    MultiPolygon::new(vec![p.clone()]).intersection(&self.frame),
                ))
            }
            MapGeometry::MultiPolygon(mp) => {
                for p in mp {
                    validate_polygon(p)?;
                }
                Ok(polygons_to_geometry(mp.intersection(&self.frame)))
            }
            MapGeometry::LineString(ls) => {
                validate_coords(ls.coords())?;
                Ok(lines_to_geometry(
                    self.frame.clip(&MultiLineString::new(vec![ls.clone()]), false),
                ))
            }
            MapGeometry::MultiLineString(mls) => {
                for ls in mls {
                    validate_coords(ls.coords())?;
                }
                Ok(lines_to_geometry(self.frame.clip(mls, false)))
            }
            MapGeometry::GeometryCollection(members) => {
                let clipped = members
                    .iter()
                    .map(|m| self.clip_in_frame(m))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(MapGeometry::GeometryCollection(
                    clipped.into_iter().filter(|g| !g.is_empty()).collect(),
                ))
            }
        }
    }

    /// Query a source and clip every returned shape.
    ///
    /// Source failures propagate; per-shape failures are logged and counted.
    pub fn clip_layer(&self, source: &dyn LayerSource) -> VectorResult<VectorLayer> {
        let name = source.name().to_string();
        let shapes = source.query(&self.extent)?;

        let mut layer = VectorLayer {
            name: name.clone(),
            ..Default::default()
        };
        for shape in shapes {
            let outcome = match shape {
                Ok(geometry) => self.clip_geometry(&geometry),
                Err(reason) => ClipOutcome::Skipped(reason),
            };
            match outcome {
                ClipOutcome::Clipped(geometry) if geometry.is_empty() => {}
                ClipOutcome::Clipped(geometry) => layer.geometries.push(geometry),
                ClipOutcome::Skipped(reason) => {
                    tracing::warn!(layer = %name, reason = %reason, "Failure to grab {} segment", name);
                    layer.skipped += 1;
                }
            }
        }
        Ok(layer)
    }

    /// Clip every source once for the whole session.
    pub fn clip_all(&self, sources: &[Box<dyn LayerSource>]) -> VectorResult<ClippedLayers> {
        let start = Instant::now();
        let mut clipped = ClippedLayers::default();
        for source in sources {
            let layer_start = Instant::now();
            let layer = self.clip_layer(source.as_ref())?;
            tracing::debug!(
                layer = %layer.name,
                shapes = layer.geometries.len(),
                skipped = layer.skipped,
                elapsed_ms = layer_start.elapsed().as_millis() as u64,
                "Clipped layer"
            );
            clipped.insert(layer);
        }
        tracing::debug!(
            layers = sources.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Clipped vectors"
        );
        Ok(clipped)
    }
}

fn polygons_to_geometry(mut mp: MultiPolygon<f64>) -> MapGeometry {
    if mp.0.len() == 1 {
        MapGeometry::Polygon(mp.0.remove(0))
    } else {
        MapGeometry::MultiPolygon(mp)
    }
}

fn lines_to_geometry(mut mls: MultiLineString<f64>) -> MapGeometry {
    mls.0.retain(|ls| ls.0.len() >= 2);
    if mls.0.len() == 1 {
        MapGeometry::LineString(mls.0.remove(0))
    } else {
        MapGeometry::MultiLineString(mls)
    }
}

fn polygon_parts(geometry: MapGeometry) -> Vec<Polygon<f64>> {
    match geometry {
        MapGeometry::Polygon(p) => vec![p],
        MapGeometry::MultiPolygon(mp) => mp.0,
        _ => Vec::new(),
    }
}

fn line_parts(geometry: MapGeometry) -> Vec<LineString<f64>> {
    match geometry {
        MapGeometry::LineString(ls) => vec![ls],
        MapGeometry::MultiLineString(mls) => mls.0,
        _ => Vec::new(),
    }
}

/// Merge the pieces of one shape clipped on each side of the antimeridian.
fn join_parts(first: MapGeometry, second: MapGeometry) -> MapGeometry {
    if second.is_empty() {
        return first;
    }
    if first.is_empty() {
        return second;
    }
    let polygonal = |g: &MapGeometry| matches!(g, MapGeometry::Polygon(_) | MapGeometry::MultiPolygon(_));
    let lineal = |g: &MapGeometry| matches!(g, MapGeometry::LineString(_) | MapGeometry::MultiLineString(_));

    if polygonal(&first) && polygonal(&second) {
        let mut parts = polygon_parts(first);
        parts.extend(polygon_parts(second));
        return polygons_to_geometry(MultiPolygon::new(parts));
    }
    if lineal(&first) && lineal(&second) {
        let mut parts = line_parts(first);
        parts.extend(line_parts(second));
        return lines_to_geometry(MultiLineString::new(parts));
    }
    match (first, second) {
        (MapGeometry::GeometryCollection(mut a), MapGeometry::GeometryCollection(b)) => {
            a.extend(b);
            MapGeometry::GeometryCollection(a)
        }
        (first, second) => MapGeometry::GeometryCollection(vec![first, second]),
    }
}

fn validate_coords<'a>(coords: impl Iterator<Item = &'a Coord<f64>>) -> Result<(), GeometryError> {
    for c in coords {
        if !c.x.is_finite() || !c.y.is_finite() {
            return Err(GeometryError::NonFinite);
        }
    }
    Ok(())
}

/// Reject polygons the boolean operations cannot handle.
fn validate_polygon(polygon: &Polygon<f64>) -> Result<(), GeometryError> {
    let rings: Vec<&LineString<f64>> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .collect();
    for ring in &rings {
        validate_coords(ring.coords())?;
        if ring.0.len() < 4 {
            return Err(GeometryError::DegenerateRing(ring.0.len()));
        }
    }
    match find_crossing(&rings) {
        Some(c) => Err(GeometryError::SelfIntersection { x: c.x, y: c.y }),
        None => Ok(()),
    }
}

struct RingSegment {
    line: Line<f64>,
    ring: usize,
    index: usize,
    ring_segments: usize,
}

impl RingSegment {
    fn is_adjacent(&self, other: &RingSegment) -> bool {
        if self.ring != other.ring {
            return false;
        }
        let (a, b) = (self.index.min(other.index), self.index.max(other.index));
        b - a == 1 || (a == 0 && b == self.ring_segments - 1)
    }
}

impl RTreeObject for RingSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.line.start.x, self.line.start.y],
            [self.line.end.x, self.line.end.y],
        )
    }
}

/// First point where two non-adjacent ring segments cross or overlap.
fn find_crossing(rings: &[&LineString<f64>]) -> Option<Coord<f64>> {
    let mut segments = Vec::new();
    for (ring_idx, ring) in rings.iter().enumerate() {
        let lines: Vec<Line<f64>> = ring.lines().filter(|l| l.start != l.end).collect();
        let count = lines.len();
        segments.extend(lines.into_iter().enumerate().map(|(index, line)| RingSegment {
            line,
            ring: ring_idx,
            index,
            ring_segments: count,
        }));
    }

    let tree = RTree::bulk_load(segments);
    for seg in tree.iter() {
        for other in tree.locate_in_envelope_intersecting(&seg.envelope()) {
            if std::ptr::eq(seg, other) || seg.is_adjacent(other) {
                continue;
            }
            // Each pair is seen twice; only test it once.
            if (seg.ring, seg.index) > (other.ring, other.index) {
                continue;
            }
            match line_intersection(seg.line, other.line) {
                Some(LineIntersection::SinglePoint {
                    intersection,
                    is_proper: true,
                }) => return Some(intersection),
                Some(LineIntersection::Collinear { intersection }) => return Some(intersection.start),
                _ => {}
            }
        }
    }
    None
}
