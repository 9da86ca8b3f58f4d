//! Compensator sizing: margin policy, catalog rounding and the two-estimate engine.

pub mod engine;
/// Tiered safety-margin table keyed by power factor tangent.
pub mod margin;
/// Rounding of a required rating to a catalog rating.
pub mod rounding;

pub use engine::{MissingTangentPolicy, Sizing, SizingCalculation, SizingEngine, SizingParams};
pub use margin::{MarginTable, MarginTier};
pub use rounding::{is_beyond_catalog, round_to_standard};
