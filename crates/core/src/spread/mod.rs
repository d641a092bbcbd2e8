//! Fire spread geometry
//!
//! - [`polygon`]: closed lat/lon rings with area, centroid and containment
//! - [`projector`]: wind-driven elliptical perimeter

pub mod polygon;
pub mod projector;

pub use polygon::{Polygon, EDGE_TOLERANCE_DEG};
pub use projector::{project, SpreadPerimeter};
