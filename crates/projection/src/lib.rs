//! Map projection for ShakeMap products.
//!
//! Implements the ellipsoidal Mercator projection from scratch and the grid
//! reprojection used to draw lon/lat rasters on a projected map.

pub mod grid_projector;
pub mod mercator;

pub use grid_projector::{project_grid, project_points};
pub use mercator::{MapProjection, Mercator};
