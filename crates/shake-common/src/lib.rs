//! Common types shared across the ShakeMap mapping crates.

pub mod error;
pub mod event;
pub mod extent;
pub mod geodict;
pub mod imt;
pub mod station;

pub use error::{MapError, MapResult};
pub use event::{EventInfo, Origin, Rupture};
pub use extent::GeoExtent;
pub use geodict::{sample_bilinear, GeoDict, RasterField};
pub use imt::Imt;
pub use station::{StationKind, StationList, StationObservation};
