//! Host map abstraction.
//!
//! The layer group never talks to a concrete map library; it consumes
//! the small contract defined here. A host adapter implements
//! [`MapSurface`] over the real map widget; [`memory::MemoryMap`]
//! provides an in-process implementation for development and testing.

mod memory;

pub use memory::MemoryMap;

use crate::geo::{FeatureId, SharedFeature};
use std::rc::Rc;

/// Callback fired once per completed pan-or-zoom gesture.
pub type SettledHandler = Rc<dyn Fn()>;

/// Token returned by [`MapSurface::on_viewport_settled`], used to
/// unsubscribe. Tokens are only meaningful on the map that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// The contract a live map exposes to layers.
///
/// Methods take `&self`; implementations use interior mutability since
/// the whole model is single-threaded and event-driven. Mount and
/// unmount are idempotent.
///
/// The settled event must fire only after a gesture completes, never on
/// intermediate frames: subscribers re-read the center longitude when
/// notified and expect a settled value.
pub trait MapSurface {
    /// Current center longitude of the visible map region, in degrees.
    fn center_longitude(&self) -> f64;

    /// Adds a feature to the live map. No-op if already mounted.
    fn mount_feature(&self, feature: &SharedFeature);

    /// Removes a feature from the live map. No-op if not mounted.
    fn unmount_feature(&self, id: FeatureId);

    /// Whether the feature is currently on the live map.
    fn is_mounted(&self, id: FeatureId) -> bool;

    /// Subscribes a handler to the settled event.
    fn on_viewport_settled(&self, handler: SettledHandler) -> SubscriptionId;

    /// Unsubscribes a previously registered handler. Unknown tokens are
    /// ignored.
    fn off_viewport_settled(&self, subscription: SubscriptionId);
}
