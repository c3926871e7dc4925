//! Data handling for the viewer:
//! - resolving and loading the tier's point payload,
//! - GPU buffer layouts.

pub mod point_source;
pub mod types;

pub use self::point_source::{load_points, PointSource};
pub use self::types::PointUniforms;
