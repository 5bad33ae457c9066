//! # Runtest
//!
//! Timer and GPS tracking core for fixed-duration run tests (Cooper-style
//! 12-minute protocols).
//!
//! This library provides:
//! - Exact elapsed-time accounting across pause/resume cycles
//! - GPS fix filtering into a monotonic distance and a path log
//! - A ready/running/paused session state machine with a one-shot
//!   goal-reached snapshot event
//!
//! The host owns the event loop and the device APIs: it forwards gesture
//! actions, location fixes, and a periodic tick, supplies `now_ms` on
//! every call (the crate never reads a wall clock), and renders the
//! returned display values. Rendering, the gesture widget, and the
//! geolocation provider itself are all external collaborators.
//!
//! ## Quick Start
//!
//! ```rust
//! use runtest::{Action, GeoFix, Session};
//!
//! let mut session = Session::new();
//! session.apply(Action::Start, 0);
//!
//! // Fixes arrive from the host's geolocation subscription
//! session.ingest_fix(&GeoFix::new(51.5074, -0.1278, 1_000).with_accuracy(8.0));
//! session.ingest_fix(&GeoFix::new(51.5078, -0.1278, 11_000).with_accuracy(8.0));
//!
//! let view = session.snapshot(30_000);
//! assert_eq!(view.elapsed, "00:00:30");
//! assert!(session.total_distance_m() > 40.0);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{LocationError, PlatformError, UnknownAction};

// Elapsed-time accounting across pause/resume
pub mod clock;
pub use clock::{format_hms, format_hms_centis, Clock};

// Geographic utilities (distance, path length, display formatting)
pub mod geo_utils;
pub use geo_utils::{
    format_distance, haversine_distance, polyline_length, simplify_path, EARTH_RADIUS_M,
};

// GPS fix filtering and distance accumulation
pub mod filter;
pub use filter::{FixOutcome, Track, TrackConfig};

// Session state machine (clock + track orchestration, goal event)
pub mod session;
pub use session::{
    ActionOutcome, GoalReached, NoopPlatform, Phase, Platform, Session, SessionConfig, Snapshot,
    GOAL_VIBRATION_PATTERN_MS, LOCATION_MAX_AGE_MS, LOCATION_TIMEOUT_MS,
};

// Action tokens from the input surface
pub mod action;
pub use action::{available_actions, Action};

// ============================================================================
// Core Types
// ============================================================================

/// A single raw sample from the location provider.
///
/// # Example
/// ```
/// use runtest::GeoFix;
///
/// let fix = GeoFix::new(51.5074, -0.1278, 1_722_000_000_000)
///     .with_accuracy(12.0)
///     .with_speed(2.8);
/// assert!(fix.has_valid_coordinates());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported horizontal accuracy in meters, if available.
    pub accuracy: Option<f64>,
    /// Device-reported ground speed in m/s, if available.
    pub speed: Option<f64>,
    /// Provider timestamp, milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

impl GeoFix {
    /// Create a fix with no accuracy or speed information.
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            speed: None,
            timestamp_ms,
        }
    }

    /// Attach the reported horizontal accuracy in meters.
    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy = Some(meters);
        self
    }

    /// Attach the device-reported ground speed in m/s.
    pub fn with_speed(mut self, meters_per_second: f64) -> Self {
        self.speed = Some(meters_per_second);
        self
    }

    /// Check the coordinates are finite and within valid ranges.
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// The fix position as a path point.
    pub fn position(&self) -> TrackPoint {
        TrackPoint::new(self.latitude, self.longitude)
    }
}

/// A GPS coordinate with latitude and longitude; the path element type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl TrackPoint {
    /// Create a new track point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
