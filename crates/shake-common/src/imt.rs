//! Intensity measure types and their file naming.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MapError;

/// An intensity measure type (IMT) with a mapped product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Imt {
    /// Macroseismic intensity.
    Mmi,
    /// Peak ground acceleration, stored as ln(g).
    Pga,
    /// Peak ground velocity, stored as ln(cm/s).
    Pgv,
    /// 5% damped pseudo-spectral acceleration at a period in seconds.
    Sa(f64),
}

impl Imt {
    pub fn is_mmi(&self) -> bool {
        matches!(self, Imt::Mmi)
    }

    /// Convert a stored grid value to display units.
    ///
    /// MMI is unitless; PGV becomes cm/s; PGA and SA become %g.
    pub fn convert_units(&self, value: f64) -> f64 {
        match self {
            Imt::Mmi => value,
            Imt::Pgv => value.exp(),
            Imt::Pga | Imt::Sa(_) => value.exp() * 100.0,
        }
    }

    /// Tag used in product file names, e.g. `PGA` or `PSA0p3`.
    pub fn file_tag(&self) -> String {
        match self {
            Imt::Mmi => "MMI".to_string(),
            Imt::Pga => "PGA".to_string(),
            Imt::Pgv => "PGV".to_string(),
            Imt::Sa(period) => format!("PSA{}", format_period(*period).replace('.', "p")),
        }
    }

    /// Lower-case tag of the older naming scheme, e.g. `pga` or `psa03`.
    pub fn legacy_tag(&self) -> String {
        let tag = self.file_tag();
        if tag.contains("PSA") {
            tag.replace('p', "").to_lowercase()
        } else {
            tag.to_lowercase()
        }
    }

    /// Amplitude name used for this measure in station records.
    pub fn amplitude_name(&self) -> String {
        self.to_string().to_lowercase()
    }
}

fn format_period(period: f64) -> String {
    if period.fract() == 0.0 {
        format!("{:.1}", period)
    } else {
        format!("{}", period)
    }
}

impl fmt::Display for Imt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Imt::Mmi => write!(f, "MMI"),
            Imt::Pga => write!(f, "PGA"),
            Imt::Pgv => write!(f, "PGV"),
            Imt::Sa(period) => write!(f, "SA({})", format_period(*period)),
        }
    }
}

impl FromStr for Imt {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "MMI" => Ok(Imt::Mmi),
            "PGA" => Ok(Imt::Pga),
            "PGV" => Ok(Imt::Pgv),
            _ => {
                let period = upper
                    .strip_prefix("SA(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .and_then(|p| p.parse::<f64>().ok())
                    .filter(|p| p.is_finite() && *p > 0.0)
                    .ok_or_else(|| MapError::InvalidImt(s.to_string()))?;
                Ok(Imt::Sa(period))
            }
        }
    }
}

impl Serialize for Imt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Imt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!("mmi".parse::<Imt>().unwrap(), Imt::Mmi);
        assert_eq!("SA(0.3)".parse::<Imt>().unwrap(), Imt::Sa(0.3));
        assert_eq!(Imt::Sa(1.0).to_string(), "SA(1.0)");
        assert!("SA(x)".parse::<Imt>().is_err());
        assert!("PGD".parse::<Imt>().is_err());
    }

    #[test]
    fn test_file_tags() {
        assert_eq!(Imt::Pga.file_tag(), "PGA");
        assert_eq!(Imt::Sa(0.3).file_tag(), "PSA0p3");
        assert_eq!(Imt::Sa(3.0).file_tag(), "PSA3p0");
        assert_eq!(Imt::Sa(0.3).legacy_tag(), "psa03");
        assert_eq!(Imt::Sa(3.0).legacy_tag(), "psa30");
        assert_eq!(Imt::Pgv.legacy_tag(), "pgv");
    }

    #[test]
    fn test_unit_conversion() {
        assert!((Imt::Pga.convert_units(20.0_f64.ln()) - 2000.0).abs() < 1e-9);
        assert!((Imt::Pgv.convert_units(3.0_f64.ln()) - 3.0).abs() < 1e-12);
        assert_eq!(Imt::Mmi.convert_units(6.5), 6.5);
    }

    #[test]
    fn test_amplitude_name() {
        assert_eq!(Imt::Pga.amplitude_name(), "pga");
        assert_eq!(Imt::Sa(1.0).amplitude_name(), "sa(1.0)");
    }
}
