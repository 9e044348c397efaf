//! Dateline-aware rendering of point features on pannable world maps.
//!
//! Ordinary layers plot a point at one fixed longitude, so the point
//! vanishes when the view crosses the antimeridian or pans onto a
//! wrapped copy of the world even though an equivalent copy (±360°)
//! should be visible. [`DatelineGroup`] wraps a feature collection,
//! listens for settled viewport changes on its host map, and
//! re-normalizes every point feature's longitude into the visible ±180°
//! window around the current center.
//!
//! The host map is abstracted behind [`MapSurface`]; [`MemoryMap`] is an
//! in-process implementation for development and testing.
//!
//! ```
//! use dateline_layer::{DatelineGroup, Feature, MapLayer, MapSurface, MemoryMap};
//! use std::rc::Rc;
//!
//! let map = MemoryMap::with_center(170.0);
//! let group = DatelineGroup::new();
//! let attu = group.add_feature(Feature::point(-175.0, 52.0));
//!
//! let surface: Rc<dyn MapSurface> = Rc::new(map.clone());
//! group.attach(&surface).unwrap();
//!
//! // The visible window is (-10, 350], so -175 displays as 185.
//! assert_eq!(attu.borrow().position().unwrap().x, 185.0);
//!
//! map.pan_to(0.0);
//! assert_eq!(attu.borrow().position().unwrap().x, -175.0);
//! ```

pub mod geo;
pub mod layer;
pub mod map;

pub use geo::{Feature, FeatureId, Geometry, SharedFeature, VisibleWindow};
pub use layer::{DatelineGroup, GroupOptions, LayerError, MapLayer};
pub use map::{MapSurface, MemoryMap, SettledHandler, SubscriptionId};
