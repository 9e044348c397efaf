//! In-memory map surface for development and testing.

use super::{MapSurface, SettledHandler, SubscriptionId};
use crate::geo::{FeatureId, SharedFeature};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct MemoryMapState {
    center_lng: f64,
    mounted: Vec<SharedFeature>,
    handlers: Vec<(SubscriptionId, SettledHandler)>,
    next_subscription: u64,
}

/// A simple in-process map surface.
///
/// Holds the center longitude, the mounted feature set, and the
/// settled-handler registry, with no rendering attached. Primarily for
/// development and testing; a real host adapter wraps an actual map
/// widget instead.
#[derive(Clone, Default)]
pub struct MemoryMap {
    state: Rc<RefCell<MemoryMapState>>,
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map whose view starts centered on the given longitude.
    pub fn with_center(center_lng: f64) -> Self {
        let map = Self::new();
        map.state.borrow_mut().center_lng = center_lng;
        map
    }

    /// Pans the view to a new center longitude and fires the settled
    /// event, as a real map does once a gesture completes.
    pub fn pan_to(&self, center_lng: f64) {
        self.state.borrow_mut().center_lng = center_lng;
        log::debug!("MemoryMap: panned to center {center_lng}");
        self.fire_settled();
    }

    fn fire_settled(&self) {
        // Handlers re-enter the map (reading the center, mounting
        // features), so the borrow must be released before invoking.
        let handlers: Vec<SettledHandler> = self
            .state
            .borrow()
            .handlers
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in handlers {
            handler();
        }
    }

    /// Number of features currently mounted.
    pub fn mounted_count(&self) -> usize {
        self.state.borrow().mounted.len()
    }

    /// Number of settled-event subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().handlers.len()
    }

    /// Snapshot of the mounted features, in mount order.
    pub fn mounted(&self) -> Vec<SharedFeature> {
        self.state.borrow().mounted.clone()
    }
}

impl MapSurface for MemoryMap {
    fn center_longitude(&self) -> f64 {
        self.state.borrow().center_lng
    }

    fn mount_feature(&self, feature: &SharedFeature) {
        let id = feature.borrow().id();
        let mut state = self.state.borrow_mut();
        if state.mounted.iter().any(|f| f.borrow().id() == id) {
            return;
        }
        state.mounted.push(Rc::clone(feature));
    }

    fn unmount_feature(&self, id: FeatureId) {
        self.state
            .borrow_mut()
            .mounted
            .retain(|f| f.borrow().id() != id);
    }

    fn is_mounted(&self, id: FeatureId) -> bool {
        self.state
            .borrow()
            .mounted
            .iter()
            .any(|f| f.borrow().id() == id)
    }

    fn on_viewport_settled(&self, handler: SettledHandler) -> SubscriptionId {
        let mut state = self.state.borrow_mut();
        state.next_subscription += 1;
        let subscription = SubscriptionId(state.next_subscription);
        state.handlers.push((subscription, handler));
        subscription
    }

    fn off_viewport_settled(&self, subscription: SubscriptionId) {
        self.state
            .borrow_mut()
            .handlers
            .retain(|(id, _)| *id != subscription);
    }
}
