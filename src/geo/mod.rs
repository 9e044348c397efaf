//! Geographic data model: features and the visible longitude window.

pub mod feature;
pub mod window;

pub use feature::{Feature, FeatureId, Geometry, SharedFeature};
pub use window::VisibleWindow;
