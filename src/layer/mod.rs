//! The dateline-aware layer group.
//!
//! A [`DatelineGroup`] owns a collection of features and, while attached
//! to a map, keeps every point feature displayed at a longitude inside
//! the map's currently visible ±180° window. The group re-derives the
//! window and repositions features on every settled viewport change, so
//! points stay visible as the user pans across the antimeridian or
//! wrapped copies of the world.

use crate::geo::{Feature, SharedFeature, VisibleWindow};
use crate::map::{MapSurface, SettledHandler, SubscriptionId};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Errors from layer lifecycle operations.
///
/// These signal usage errors; nothing here is a runtime condition to
/// retry or recover from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerError {
    /// The group is already attached to a map; detach it first.
    AlreadyAttached,
}

impl fmt::Display for LayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerError::AlreadyAttached => {
                write!(f, "group is already attached to a map; detach it first")
            }
        }
    }
}

impl std::error::Error for LayerError {}

/// Options supplied at group construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupOptions {
    /// Name used to label this group in log output.
    pub name: Option<String>,
}

/// The attach/detach contract any placeable layer exposes.
///
/// Implemented by [`DatelineGroup`] so a whole group composes wherever a
/// single layer is expected.
pub trait MapLayer {
    /// Binds the layer to a live map. Fails fast when already attached.
    fn attach(&self, map: &Rc<dyn MapSurface>) -> Result<(), LayerError>;

    /// Unbinds from the map. Safe to call when not attached.
    fn detach(&self);

    /// Whether the layer is currently bound to a map.
    fn is_attached(&self) -> bool;
}

struct Attachment {
    map: Rc<dyn MapSurface>,
    subscription: SubscriptionId,
}

#[derive(Default)]
struct GroupState {
    features: Vec<SharedFeature>,
    attachment: Option<Attachment>,
    options: GroupOptions,
}

impl GroupState {
    fn log_name(&self) -> &str {
        self.options.name.as_deref().unwrap_or("DatelineGroup")
    }
}

/// A feature group that re-normalizes point longitudes into the visible
/// window on every settled viewport change.
///
/// Cheap to clone; clones share the same underlying group. The group
/// exclusively owns feature positions while attached: callers add
/// features through [`DatelineGroup::add_feature`] and must not write
/// positions directly, or they race the next render pass.
#[derive(Clone, Default)]
pub struct DatelineGroup {
    state: Rc<RefCell<GroupState>>,
}

impl DatelineGroup {
    /// Creates an empty, unattached group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty group with the given options.
    pub fn with_options(options: GroupOptions) -> Self {
        let group = Self::new();
        group.state.borrow_mut().options = options;
        group
    }

    /// Creates a group from an initial feature collection.
    pub fn from_features(features: impl IntoIterator<Item = Feature>) -> Self {
        let group = Self::new();
        group.state.borrow_mut().features =
            features.into_iter().map(Feature::into_shared).collect();
        group
    }

    /// Creates a group from an already-parsed GeoJSON feature
    /// collection. Members with missing or unusable geometry are kept
    /// (they mount, but never move).
    pub fn from_geojson(collection: &geojson::FeatureCollection) -> Self {
        Self::from_features(collection.features.iter().map(Feature::from_geojson))
    }

    /// Adds a feature to the group and returns the shared handle.
    ///
    /// When attached, runs a render pass immediately so the feature
    /// appears correctly placed without waiting for the next pan.
    pub fn add_feature(&self, feature: Feature) -> SharedFeature {
        let shared = feature.into_shared();
        self.add_shared(Rc::clone(&shared));
        shared
    }

    /// Adds a pre-shared feature handle to the group.
    pub fn add_shared(&self, feature: SharedFeature) {
        let map = {
            let mut state = self.state.borrow_mut();
            state.features.push(feature);
            state.attachment.as_ref().map(|a| Rc::clone(&a.map))
        };
        if let Some(map) = map {
            self.render(map.as_ref());
        }
    }

    /// Snapshot of the group's features.
    pub fn features(&self) -> Vec<SharedFeature> {
        self.state.borrow().features.clone()
    }

    /// Number of features in the group.
    pub fn len(&self) -> usize {
        self.state.borrow().features.len()
    }

    /// Returns true if the group holds no features.
    pub fn is_empty(&self) -> bool {
        self.state.borrow().features.is_empty()
    }

    /// One full pass over the collection: derive the visible window from
    /// the map center, normalize each point feature into it, and mount
    /// anything not yet on the map.
    ///
    /// A position is written back only when normalization changed it, so
    /// hosts that animate every write see no redundant movement. A
    /// feature with missing or non-finite geometry is mounted as-is and
    /// never blocks placement of the others.
    fn render(&self, map: &dyn MapSurface) {
        let window = VisibleWindow::centered_on(map.center_longitude());
        let features = {
            let state = self.state.borrow();
            log::debug!(
                "{}: render pass over {} features, window ({}, {}]",
                state.log_name(),
                state.features.len(),
                window.min,
                window.max
            );
            state.features.clone()
        };

        for feature in &features {
            // Copy the position out first; holding the borrow across the
            // write below would conflict.
            let position = feature.borrow().position();
            if let Some(position) = position {
                let lng = position.x;
                if lng.is_finite() {
                    let normalized = window.normalize(lng);
                    if normalized != lng {
                        log::trace!(
                            "{}: moved to lng {normalized}",
                            feature.borrow().id()
                        );
                        feature.borrow_mut().set_longitude(normalized);
                    }
                }
            }

            let id = feature.borrow().id();
            if !map.is_mounted(id) {
                map.mount_feature(feature);
            }
        }
    }
}

impl MapLayer for DatelineGroup {
    fn attach(&self, map: &Rc<dyn MapSurface>) -> Result<(), LayerError> {
        if self.state.borrow().attachment.is_some() {
            return Err(LayerError::AlreadyAttached);
        }

        // The handler holds only weak references; the map keeps no
        // strong handle on the group and detach cannot leak either side.
        let group = Rc::downgrade(&self.state);
        let surface = Rc::downgrade(map);
        let handler: SettledHandler = Rc::new(move || {
            if let (Some(state), Some(map)) = (group.upgrade(), surface.upgrade()) {
                DatelineGroup { state }.render(map.as_ref());
            }
        });

        let subscription = map.on_viewport_settled(handler);
        {
            let mut state = self.state.borrow_mut();
            log::debug!("{}: attached to map", state.log_name());
            state.attachment = Some(Attachment {
                map: Rc::clone(map),
                subscription,
            });
        }

        // Initial placement, before any gesture fires.
        self.render(map.as_ref());
        Ok(())
    }

    fn detach(&self) {
        let Some(attachment) = self.state.borrow_mut().attachment.take() else {
            return;
        };

        attachment.map.off_viewport_settled(attachment.subscription);
        for feature in self.features() {
            let id = feature.borrow().id();
            if attachment.map.is_mounted(id) {
                attachment.map.unmount_feature(id);
            }
        }
        log::debug!("{}: detached from map", self.state.borrow().log_name());
    }

    fn is_attached(&self) -> bool {
        self.state.borrow().attachment.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Geometry;
    use crate::map::MemoryMap;
    use geo_types::Coord;

    fn surface(map: &MemoryMap) -> Rc<dyn MapSurface> {
        Rc::new(map.clone())
    }

    #[test]
    fn test_attach_renders_into_visible_window() {
        let memory = MemoryMap::with_center(170.0);
        let group = DatelineGroup::new();
        let feature = group.add_feature(Feature::point(-175.0, 52.0));

        group.attach(&surface(&memory)).unwrap();

        // Window is (-10, 350]; the visible copy of -175 is 185.
        assert_eq!(feature.borrow().position().unwrap().x, 185.0);
        assert!(memory.is_mounted(feature.borrow().id()));
    }

    #[test]
    fn test_pan_back_across_dateline_restores_longitude() {
        let memory = MemoryMap::with_center(170.0);
        let group = DatelineGroup::new();
        group.attach(&surface(&memory)).unwrap();
        let feature = group.add_feature(Feature::point(-175.0, 52.0));
        assert_eq!(feature.borrow().position().unwrap().x, 185.0);

        memory.pan_to(0.0);

        // Window is now (-180, 180]; the visible copy is -175 again.
        assert_eq!(feature.borrow().position().unwrap().x, -175.0);
    }

    #[test]
    fn test_repeated_render_makes_no_further_writes() {
        let memory = MemoryMap::with_center(170.0);
        let group = DatelineGroup::new();
        let moved = group.add_feature(Feature::point(-175.0, 52.0));
        let in_window = group.add_feature(Feature::point(160.0, 10.0));

        group.attach(&surface(&memory)).unwrap();
        assert_eq!(moved.borrow().revision(), 1);
        assert_eq!(in_window.borrow().revision(), 0);

        // Settling without a center change must not touch positions.
        memory.pan_to(170.0);
        memory.pan_to(170.0);

        assert_eq!(moved.borrow().revision(), 1);
        assert_eq!(in_window.borrow().revision(), 0);
    }

    #[test]
    fn test_boundary_point_lands_on_max_side() {
        let memory = MemoryMap::with_center(0.0);
        let group = DatelineGroup::new();
        let feature = group.add_feature(Feature::point(-180.0, 0.0));

        group.attach(&surface(&memory)).unwrap();

        assert_eq!(feature.borrow().position().unwrap().x, 180.0);
    }

    #[test]
    fn test_detach_unmounts_but_retains_features() {
        let memory = MemoryMap::with_center(170.0);
        let group = DatelineGroup::new();
        let feature = group.add_feature(Feature::point(-175.0, 52.0));
        group.attach(&surface(&memory)).unwrap();

        group.detach();

        assert_eq!(memory.mounted_count(), 0);
        assert_eq!(memory.subscriber_count(), 0);
        assert_eq!(group.len(), 1);
        assert!(!group.is_attached());

        // Panning while detached must not move anything.
        let revision = feature.borrow().revision();
        memory.pan_to(0.0);
        assert_eq!(feature.borrow().revision(), revision);
    }

    #[test]
    fn test_reattach_restores_and_renormalizes() {
        let memory = MemoryMap::with_center(170.0);
        let group = DatelineGroup::new();
        let feature = group.add_feature(Feature::point(-175.0, 52.0));

        group.attach(&surface(&memory)).unwrap();
        assert_eq!(feature.borrow().position().unwrap().x, 185.0);
        group.detach();

        memory.pan_to(0.0);
        group.attach(&surface(&memory)).unwrap();

        assert_eq!(feature.borrow().position().unwrap().x, -175.0);
        assert_eq!(memory.mounted_count(), 1);
    }

    #[test]
    fn test_detach_without_attach_is_noop() {
        let group = DatelineGroup::new();
        group.detach();
        group.detach();
        assert!(!group.is_attached());
    }

    #[test]
    fn test_attach_twice_is_a_usage_error() {
        let memory = MemoryMap::with_center(0.0);
        let group = DatelineGroup::new();

        group.attach(&surface(&memory)).unwrap();
        let err = group.attach(&surface(&memory)).unwrap_err();

        assert_eq!(err, LayerError::AlreadyAttached);
        assert_eq!(memory.subscriber_count(), 1);
    }

    #[test]
    fn test_add_while_attached_renders_immediately() {
        let memory = MemoryMap::with_center(170.0);
        let group = DatelineGroup::new();
        group.attach(&surface(&memory)).unwrap();

        let feature = group.add_feature(Feature::point(-175.0, 52.0));

        assert_eq!(feature.borrow().position().unwrap().x, 185.0);
        assert!(memory.is_mounted(feature.borrow().id()));
    }

    #[test]
    fn test_non_point_geometry_passes_through() {
        let coords = vec![Coord { x: -179.0, y: 0.0 }, Coord { x: 179.0, y: 1.0 }];
        let memory = MemoryMap::with_center(170.0);
        let group = DatelineGroup::new();
        let line = group.add_feature(Feature::new(Some(Geometry::LineString(coords.clone()))));

        group.attach(&surface(&memory)).unwrap();
        memory.pan_to(-170.0);

        assert_eq!(
            line.borrow().geometry(),
            Some(&Geometry::LineString(coords))
        );
        assert!(memory.is_mounted(line.borrow().id()));
    }

    #[test]
    fn test_malformed_feature_is_mounted_and_skipped() {
        let memory = MemoryMap::with_center(170.0);
        let group = DatelineGroup::new();
        let malformed = group.add_feature(Feature::new(None));
        let point = group.add_feature(Feature::point(-175.0, 52.0));

        group.attach(&surface(&memory)).unwrap();

        assert!(memory.is_mounted(malformed.borrow().id()));
        assert_eq!(point.borrow().position().unwrap().x, 185.0);
    }

    #[test]
    fn test_from_geojson_collection() {
        let collection = geojson::FeatureCollection {
            bbox: None,
            features: vec![
                geojson::Feature {
                    bbox: None,
                    geometry: Some(geojson::Geometry::new(geojson::Value::Point(vec![
                        -175.0, 52.0,
                    ]))),
                    id: None,
                    properties: None,
                    foreign_members: None,
                },
                geojson::Feature {
                    bbox: None,
                    geometry: None,
                    id: None,
                    properties: None,
                    foreign_members: None,
                },
            ],
            foreign_members: None,
        };

        let memory = MemoryMap::with_center(170.0);
        let group = DatelineGroup::from_geojson(&collection);
        assert_eq!(group.len(), 2);

        group.attach(&surface(&memory)).unwrap();
        assert_eq!(memory.mounted_count(), 2);
        assert_eq!(group.features()[0].borrow().position().unwrap().x, 185.0);
    }

    #[test]
    fn test_group_composes_as_a_map_layer() {
        let memory = MemoryMap::with_center(0.0);
        let layer: Box<dyn MapLayer> = Box::new(DatelineGroup::from_features([
            Feature::point(350.0, 0.0),
        ]));

        layer.attach(&surface(&memory)).unwrap();
        assert!(layer.is_attached());
        layer.detach();
        assert!(!layer.is_attached());
    }
}
