//! ShakeMap map rendering session.
//!
//! Loads an event's products, clips the configured vector layers once and
//! renders the intensity map plus a contour map per configured measure.

pub mod cities;
pub mod composer;
pub mod config;
pub mod drawing;
pub mod inputs;

pub use cities::{CityLabel, CityPlacer, NoCities};
pub use composer::MapComposer;
pub use config::MappingConfig;
pub use inputs::EventInputs;
