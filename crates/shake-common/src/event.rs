//! Event metadata and rupture geometry.

use std::io::Read;

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{MapError, MapResult};
use crate::imt::Imt;

const ORIGIN_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.fZ",
];

/// Hypocenter and magnitude of an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    pub lon: f64,
    pub lat: f64,
    pub depth: f64,
    pub mag: f64,
}

/// Event description read from `info.json`.
#[derive(Debug, Clone)]
pub struct EventInfo {
    pub event_id: String,
    pub source: String,
    pub description: String,
    pub time: NaiveDateTime,
    pub origin: Origin,
}

#[derive(Debug, Deserialize)]
struct InfoDocument {
    input: InfoInput,
}

#[derive(Debug, Deserialize)]
struct InfoInput {
    event_information: serde_json::Map<String, Value>,
}

fn field<'a>(map: &'a serde_json::Map<String, Value>, key: &str) -> MapResult<&'a Value> {
    map.get(key)
        .ok_or_else(|| MapError::parse("info.json", format!("missing event_information.{}", key)))
}

fn text_field(map: &serde_json::Map<String, Value>, key: &str) -> MapResult<String> {
    match field(map, key)? {
        Value::String(s) => Ok(s.clone()),
        other => Ok(other.to_string()),
    }
}

fn number_field(map: &serde_json::Map<String, Value>, key: &str) -> MapResult<f64> {
    let value = field(map, key)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        MapError::parse("info.json", format!("event_information.{} is not numeric: {}", key, value))
    })
}

impl EventInfo {
    pub fn from_json_reader<R: Read>(reader: R) -> MapResult<Self> {
        let doc: InfoDocument = serde_json::from_reader(reader)?;
        let info = &doc.input.event_information;

        let time_str = text_field(info, "origin_time")?;
        let time = ORIGIN_TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(&time_str, fmt).ok())
            .ok_or_else(|| {
                MapError::parse("info.json", format!("unrecognized origin_time '{}'", time_str))
            })?;

        Ok(Self {
            event_id: text_field(info, "event_id")?,
            source: text_field(info, "eventsource")?,
            description: text_field(info, "event_description")?,
            time,
            origin: Origin {
                lon: number_field(info, "longitude")?,
                lat: number_field(info, "latitude")?,
                depth: number_field(info, "depth")?,
                mag: number_field(info, "magnitude")?,
            },
        })
    }

    /// Two-line map title for a product of the given measure.
    pub fn title(&self, imt: &Imt) -> String {
        let o = &self.origin;
        let lat = if o.lat < 0.0 {
            format!("S{:.2}", o.lat.abs())
        } else {
            format!("N{:.2}", o.lat)
        };
        let lon = if o.lon < 0.0 {
            format!("W{:.2}", o.lon.abs())
        } else {
            format!("E{:.2}", o.lon)
        };
        format!(
            "USGS ShakeMap ({}): {}\n {} UTC M{:.1} {} {} Depth: {:.1}km ID:{}",
            imt,
            self.description,
            self.time.format("%b %d, %Y %H:%M:%S"),
            o.mag,
            lat,
            lon,
            o.depth,
            self.event_id
        )
    }
}

/// Rupture geometry: a point source or a set of outline quadrilaterals.
#[derive(Debug, Clone, PartialEq)]
pub enum Rupture {
    Point,
    Outline(Vec<Vec<(f64, f64)>>),
}

impl Rupture {
    /// Read `rupture.json`; a Point geometry yields [`Rupture::Point`].
    pub fn from_json_reader<R: Read>(reader: R) -> MapResult<Self> {
        let doc: Value = serde_json::from_reader(reader)?;
        let geometry = doc
            .get("features")
            .and_then(|f| f.get(0))
            .and_then(|f| f.get("geometry"))
            .ok_or_else(|| MapError::parse("rupture.json", "no feature geometry"))?;

        let gtype = geometry.get("type").and_then(Value::as_str).unwrap_or_default();
        let coords = geometry.get("coordinates");
        match (gtype, coords) {
            ("Point", _) => Ok(Rupture::Point),
            ("MultiPolygon", Some(c)) => {
                let polygons: Vec<Vec<Vec<Vec<f64>>>> = serde_json::from_value(c.clone())?;
                Ok(Rupture::Outline(
                    polygons.into_iter().flatten().map(ring_lon_lat).collect(),
                ))
            }
            ("Polygon", Some(c)) => {
                let rings: Vec<Vec<Vec<f64>>> = serde_json::from_value(c.clone())?;
                Ok(Rupture::Outline(rings.into_iter().map(ring_lon_lat).collect()))
            }
            (other, _) => Err(MapError::parse(
                "rupture.json",
                format!("unsupported rupture geometry '{}'", other),
            )),
        }
    }

    /// Outline rings to draw, empty for a point rupture.
    pub fn outlines(&self) -> &[Vec<(f64, f64)>] {
        match self {
            Rupture::Point => &[],
            Rupture::Outline(rings) => rings,
        }
    }
}

fn ring_lon_lat(ring: Vec<Vec<f64>>) -> Vec<(f64, f64)> {
    ring.into_iter()
        .filter(|p| p.len() >= 2)
        .map(|p| (p[0], p[1]))
        .collect()
}
