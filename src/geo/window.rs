//! The visible longitude window and dateline normalization.
//!
//! A pannable world map shows a 360°-wide band of longitudes centered on
//! the current view. A point stored at a fixed longitude can sit outside
//! that band even though an equivalent copy of it (±360°) is visible, for
//! example when the view straddles the antimeridian or a wrapped world
//! copy. Normalizing into the window picks the copy the user can see.

/// The ±180° band of longitudes visible around the map's center.
///
/// Ephemeral: derived from the center on every render pass, never stored.
/// The interval is half-open, `min` exclusive and `max` inclusive, so a
/// point exactly 180° from center lands unambiguously on the `max` side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleWindow {
    pub min: f64,
    pub max: f64,
}

impl VisibleWindow {
    /// Builds the window for a view centered on the given longitude.
    pub fn centered_on(center_lng: f64) -> Self {
        Self {
            min: center_lng - 180.0,
            max: center_lng + 180.0,
        }
    }

    /// Half-open containment test: `min < lng <= max`.
    pub fn contains(&self, lng: f64) -> bool {
        self.min < lng && lng <= self.max
    }

    /// Shifts a longitude by whole world-widths until it falls inside
    /// the window.
    ///
    /// The window is exactly 360° wide, so each loop strictly approaches
    /// the window and terminates for every finite input. Non-finite
    /// input is returned unchanged: shifting an infinity by 360 would
    /// never approach the window.
    pub fn normalize(&self, mut lng: f64) -> f64 {
        if !lng.is_finite() {
            return lng;
        }
        while lng <= self.min {
            lng += 360.0;
        }
        while lng > self.max {
            lng -= 360.0;
        }
        lng
    }
}
