//! Geographic feature data structures.
//!
//! Geometry arrives as already-parsed GeoJSON objects and is converted
//! into a typed model. Only the `Point` variant participates in dateline
//! normalization; every other geometry is carried through untouched.

use geo_types::Coord;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier stamped onto a feature at creation.
///
/// Mount/unmount bookkeeping on the map surface is keyed by this id, so
/// two features with equal geometry are still distinct layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureId(pub u64);

impl FeatureId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feature#{}", self.0)
    }
}

/// A geographic geometry that can be placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// A single point (markers, cities, observations)
    Point(Coord<f64>),
    /// A series of connected line segments
    LineString(Vec<Coord<f64>>),
    /// Multiple line strings (for complex boundaries)
    MultiLineString(Vec<Vec<Coord<f64>>>),
    /// A closed polygon with optional holes
    Polygon {
        exterior: Vec<Coord<f64>>,
        holes: Vec<Vec<Coord<f64>>>,
    },
    /// Multiple polygons, each an (exterior, holes) pair
    MultiPolygon {
        polygons: Vec<(Vec<Coord<f64>>, Vec<Vec<Coord<f64>>>)>,
    },
}

impl Geometry {
    /// Returns true for the `Point` variant.
    pub fn is_point(&self) -> bool {
        matches!(self, Geometry::Point(_))
    }

    /// Converts an already-parsed GeoJSON geometry.
    ///
    /// Returns `None` when the geometry cannot be represented (empty
    /// coordinate lists, truncated positions); callers treat that the
    /// same as a missing geometry.
    pub fn from_geojson(geometry: &geojson::Geometry) -> Option<Geometry> {
        use geojson::Value;

        match &geometry.value {
            Value::Point(position) => coord_from(position).map(Geometry::Point),
            Value::MultiPoint(positions) => {
                // The first point stands in for the whole set, matching
                // how single-marker rendering treats MultiPoint.
                positions
                    .first()
                    .and_then(|p| coord_from(p))
                    .map(Geometry::Point)
            }
            Value::LineString(positions) => line_from(positions).map(Geometry::LineString),
            Value::MultiLineString(lines) => {
                let multi: Vec<Vec<Coord<f64>>> =
                    lines.iter().filter_map(|l| line_from(l)).collect();
                if multi.is_empty() {
                    None
                } else {
                    Some(Geometry::MultiLineString(multi))
                }
            }
            Value::Polygon(rings) => rings_from(rings).map(|(exterior, holes)| {
                Geometry::Polygon { exterior, holes }
            }),
            Value::MultiPolygon(polygons) => {
                let polygons: Vec<_> = polygons.iter().filter_map(|r| rings_from(r)).collect();
                if polygons.is_empty() {
                    None
                } else {
                    Some(Geometry::MultiPolygon { polygons })
                }
            }
            Value::GeometryCollection(geometries) => {
                // Take the first convertible member.
                geometries.iter().find_map(Geometry::from_geojson)
            }
        }
    }
}

fn coord_from(position: &[f64]) -> Option<Coord<f64>> {
    match position {
        [x, y, ..] => Some(Coord { x: *x, y: *y }),
        _ => None,
    }
}

fn line_from(positions: &[Vec<f64>]) -> Option<Vec<Coord<f64>>> {
    let line: Vec<Coord<f64>> = positions.iter().filter_map(|p| coord_from(p)).collect();
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

fn rings_from(rings: &[Vec<Vec<f64>>]) -> Option<(Vec<Coord<f64>>, Vec<Vec<Coord<f64>>>)> {
    let exterior = line_from(rings.first()?)?;
    let holes: Vec<Vec<Coord<f64>>> = rings[1..].iter().filter_map(|r| line_from(r)).collect();
    Some((exterior, holes))
}

/// A feature owned by a layer group and displayable on a map surface.
///
/// `geometry` is `None` for features whose input lacked a usable
/// geometry; such features are still mounted but never repositioned.
/// The revision counter increments on every position write, letting
/// callers observe whether a render pass actually moved the feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    // The id is a process-local stamp keying mount/unmount bookkeeping;
    // a deserialized feature mints a fresh one so it can never alias a
    // live feature on the map surface.
    #[serde(skip, default = "FeatureId::next")]
    id: FeatureId,
    geometry: Option<Geometry>,
    label: Option<String>,
    #[serde(skip)]
    revision: u64,
}

/// Handle shared between the owning group and the map surface.
pub type SharedFeature = Rc<RefCell<Feature>>;

impl Feature {
    /// Creates a feature from an optional geometry.
    pub fn new(geometry: Option<Geometry>) -> Self {
        Self {
            id: FeatureId::next(),
            geometry,
            label: None,
            revision: 0,
        }
    }

    /// Creates a point feature at the given longitude/latitude.
    pub fn point(lng: f64, lat: f64) -> Self {
        Self::new(Some(Geometry::Point(Coord { x: lng, y: lat })))
    }

    /// Sets a display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Converts an already-parsed GeoJSON feature.
    ///
    /// Absent or unusable geometry yields a feature with no geometry,
    /// never an error: one bad input must not block the rest of a
    /// collection.
    pub fn from_geojson(feature: &geojson::Feature) -> Self {
        let label = feature
            .properties
            .as_ref()
            .and_then(|p| p.get("name").or_else(|| p.get("NAME")))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let geometry = feature.geometry.as_ref().and_then(Geometry::from_geojson);

        Self {
            id: FeatureId::next(),
            geometry,
            label,
            revision: 0,
        }
    }

    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Current display position, for point features only.
    pub fn position(&self) -> Option<Coord<f64>> {
        match self.geometry {
            Some(Geometry::Point(coord)) => Some(coord),
            _ => None,
        }
    }

    /// Number of position writes applied to this feature so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Moves a point feature to a new display longitude.
    ///
    /// Bumps the revision on every call; callers that want to avoid
    /// redundant redraws check the current position first.
    pub(crate) fn set_longitude(&mut self, lng: f64) {
        if let Some(Geometry::Point(coord)) = &mut self.geometry {
            coord.x = lng;
            self.revision += 1;
        }
    }

    /// Wraps the feature in the shared handle used for mounting.
    pub fn into_shared(self) -> SharedFeature {
        Rc::new(RefCell::new(self))
    }
}
