//! Station observation records.
//!
//! Stations arrive as a GeoJSON feature collection. Macroseismic networks
//! report MMI directly; instrumental stations report ground-motion
//! amplitudes plus an MMI value converted from them.

use std::io::Read;

use serde::Deserialize;
use serde_json::Value;

use crate::error::MapResult;
use crate::imt::Imt;

/// Networks whose observations are macroseismic intensity reports.
pub const MACROSEISMIC_NETWORKS: [&str; 4] = ["dyfi", "mmi", "intensity", "ciim"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationKind {
    Macroseismic,
    Instrumental,
}

/// One symbol to draw on a map.
#[derive(Debug, Clone, PartialEq)]
pub struct StationObservation {
    pub lon: f64,
    pub lat: f64,
    pub kind: StationKind,
    /// MMI for macroseismic stations, otherwise the amplitude of the mapped IMT.
    pub value: f64,
    /// MMI used to pick the symbol fill color.
    pub mmi: f64,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<StationFeature>,
}

#[derive(Debug, Clone, Deserialize)]
struct StationFeature {
    geometry: PointGeometry,
    properties: StationProperties,
}

#[derive(Debug, Clone, Deserialize)]
struct PointGeometry {
    coordinates: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct StationProperties {
    #[serde(default)]
    network: String,
    #[serde(default)]
    intensity: Value,
    #[serde(default)]
    channels: Vec<Channel>,
}

#[derive(Debug, Clone, Deserialize)]
struct Channel {
    #[serde(default)]
    amplitudes: Vec<Amplitude>,
}

#[derive(Debug, Clone, Deserialize)]
struct Amplitude {
    name: String,
    #[serde(default)]
    value: Value,
}

/// Numeric value of a JSON field; the string `"null"` counts as missing.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s != "null" => s.trim().parse().ok(),
        _ => None,
    }
}

impl StationFeature {
    fn kind(&self) -> StationKind {
        let net = self.properties.network.to_lowercase();
        if MACROSEISMIC_NETWORKS.contains(&net.as_str()) {
            StationKind::Macroseismic
        } else {
            StationKind::Instrumental
        }
    }

    fn location(&self) -> Option<(f64, f64)> {
        match self.geometry.coordinates.as_slice() {
            [lon, lat, ..] => Some((*lon, *lat)),
            _ => None,
        }
    }

    /// Amplitudes of the first channel with the given name.
    fn amplitudes<'a>(&'a self, name: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.properties
            .channels
            .first()
            .into_iter()
            .flat_map(|c| c.amplitudes.iter())
            .filter(move |a| a.name == name)
            .filter_map(|a| as_number(&a.value))
    }
}

/// Parsed station list for a single event.
#[derive(Debug, Clone, Default)]
pub struct StationList {
    features: Vec<StationFeature>,
}

impl StationList {
    pub fn from_json_reader<R: Read>(reader: R) -> MapResult<Self> {
        let collection: FeatureCollection = serde_json::from_reader(reader)?;
        Ok(Self {
            features: collection.features,
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Observations to draw on a map of the given measure.
    ///
    /// On an MMI map instrumental stations are shown with their converted
    /// intensity; on other maps with the matching channel amplitude.
    pub fn observations(&self, imt: &Imt) -> Vec<StationObservation> {
        let amp_name = imt.amplitude_name();
        let mut out = Vec::new();

        for feature in &self.features {
            let Some((lon, lat)) = feature.location() else {
                tracing::debug!("Skipping station without point coordinates");
                continue;
            };

            match feature.kind() {
                StationKind::Macroseismic => {
                    for mmi in feature.amplitudes("mmi") {
                        out.push(StationObservation {
                            lon,
                            lat,
                            kind: StationKind::Macroseismic,
                            value: mmi,
                            mmi,
                        });
                    }
                }
                StationKind::Instrumental => {
                    let Some(mmi_conv) = as_number(&feature.properties.intensity) else {
                        tracing::debug!(lon, lat, "Skipping instrument without converted intensity");
                        continue;
                    };
                    if imt.is_mmi() {
                        out.push(StationObservation {
                            lon,
                            lat,
                            kind: StationKind::Instrumental,
                            value: mmi_conv,
                            mmi: mmi_conv,
                        });
                    } else {
                        for value in feature.amplitudes(&amp_name) {
                            out.push(StationObservation {
                                lon,
                                lat,
                                kind: StationKind::Instrumental,
                                value,
                                mmi: mmi_conv,
                            });
                        }
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATIONS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature",
             "geometry": {"type": "Point", "coordinates": [-118.1, 34.2]},
             "properties": {"network": "DYFI", "intensity": 4.1,
                "channels": [{"amplitudes": [{"name": "mmi", "value": 4.3}]}]}},
            {"type": "Feature",
             "geometry": {"type": "Point", "coordinates": [-118.3, 34.0]},
             "properties": {"network": "CI", "intensity": "5.2",
                "channels": [{"amplitudes": [
                    {"name": "pga", "value": 12.5},
                    {"name": "pgv", "value": "null"},
                    {"name": "sa(1.0)", "value": 3.3}]}]}}
        ]
    }"#;

    fn stations() -> StationList {
        StationList::from_json_reader(STATIONS.as_bytes()).unwrap()
    }

    #[test]
    fn test_mmi_map_uses_converted_intensity() {
        let obs = stations().observations(&Imt::Mmi);
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].kind, StationKind::Macroseismic);
        assert_eq!(obs[0].value, 4.3);
        assert_eq!(obs[1].kind, StationKind::Instrumental);
        assert_eq!(obs[1].value, 5.2);
    }

    #[test]
    fn test_amplitude_selection() {
        let obs = stations().observations(&Imt::Pga);
        let inst: Vec<_> = obs
            .iter()
            .filter(|o| o.kind == StationKind::Instrumental)
            .collect();
        assert_eq!(inst.len(), 1);
        assert_eq!(inst[0].value, 12.5);
        assert_eq!(inst[0].mmi, 5.2);

        let sa = stations().observations(&Imt::Sa(1.0));
        assert!(sa.iter().any(|o| o.value == 3.3));
    }

    #[test]
    fn test_null_amplitudes_skipped() {
        let obs = stations().observations(&Imt::Pgv);
        assert!(obs.iter().all(|o| o.kind == StationKind::Macroseismic));
    }
}
