//! GPS fix filtering and distance accumulation.
//!
//! Raw fixes from a consumer GPS chipset jitter by several meters even at
//! rest and occasionally teleport when the receiver reacquires. The track
//! keeps an anchor at the last accepted position and only advances the
//! distance when a new fix survives the accuracy, jitter, jump, and speed
//! gates. Accepted fixes are appended to a path log for map rendering.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo_utils::{haversine_distance, simplify_path};
use crate::{GeoFix, TrackPoint};

/// Thresholds for fix acceptance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackConfig {
    /// Reject fixes whose reported horizontal accuracy is worse than this.
    /// Default: 25.0 meters
    pub max_accuracy_m: f64,

    /// Floor for the minimum accepted displacement; smaller steps are jitter.
    /// Default: 3.0 meters
    pub min_step_m: f64,

    /// Scales reported accuracy into the jitter floor: the effective minimum
    /// step is `max(min_step_m, accuracy * accuracy_step_factor)`, widening
    /// the floor when the signal degrades. Default: 0.6
    pub accuracy_step_factor: f64,

    /// Reject displacement larger than this as a spurious jump.
    /// Default: 80.0 meters
    pub max_jump_m: f64,

    /// Reject a fix when its reported speed, or the speed derived from the
    /// step and timestamps, exceeds this. Default: 8.0 m/s
    pub max_speed_mps: f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            max_accuracy_m: 25.0,
            min_step_m: 3.0,
            accuracy_step_factor: 0.6,
            max_jump_m: 80.0,
            max_speed_mps: 8.0,
        }
    }
}

/// Outcome of feeding one raw fix to [`Track::ingest`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FixOutcome {
    /// Accepted; the distance advanced by `step_m`.
    Accepted { step_m: f64 },
    /// First accepted fix: anchors the track but contributes no distance.
    AcceptedAnchor,
    /// Coordinates were non-finite or out of range.
    Discarded,
    /// Reported accuracy was worse than the configured maximum.
    DiscardedAccuracy,
    /// Displacement was below the jitter floor.
    DiscardedJitter,
    /// Displacement exceeded the maximum plausible jump.
    DiscardedJump,
    /// Reported or derived speed exceeded the maximum.
    DiscardedSpeed,
}

impl FixOutcome {
    /// Whether the fix was accepted (anchored or advanced the distance).
    pub fn is_accepted(&self) -> bool {
        matches!(self, FixOutcome::Accepted { .. } | FixOutcome::AcceptedAnchor)
    }
}

/// Accumulated track state: anchor, total distance, and path log.
///
/// The track has no notion of session phase; the owning session decides
/// whether to feed it fixes at all.
///
/// # Example
/// ```
/// use runtest::{GeoFix, Track};
///
/// let mut track = Track::new();
/// track.ingest(&GeoFix::new(51.5074, -0.1278, 0).with_accuracy(8.0));
/// track.ingest(&GeoFix::new(51.5078, -0.1278, 10_000).with_accuracy(8.0));
///
/// assert!(track.total_distance_m() > 40.0);
/// assert_eq!(track.path().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Track {
    config: TrackConfig,
    /// Last accepted position; the base for the next step measurement.
    anchor: Option<TrackPoint>,
    anchor_timestamp_ms: i64,
    total_distance_m: f64,
    path: Vec<TrackPoint>,
}

impl Track {
    /// Create an empty track with default thresholds.
    pub fn new() -> Self {
        Self::with_config(TrackConfig::default())
    }

    /// Create an empty track with custom thresholds.
    pub fn with_config(config: TrackConfig) -> Self {
        Self {
            config,
            anchor: None,
            anchor_timestamp_ms: 0,
            total_distance_m: 0.0,
            path: Vec::new(),
        }
    }

    /// Feed one raw fix through the acceptance gates.
    ///
    /// Gate order: coordinate validity, accuracy, first-fix anchoring,
    /// jitter floor, jump ceiling, speed ceiling. Rejected fixes never
    /// move the anchor, so sub-threshold drift cannot re-anchor its way
    /// into false distance.
    pub fn ingest(&mut self, fix: &GeoFix) -> FixOutcome {
        if !fix.has_valid_coordinates() {
            debug!("fix discarded: invalid coordinates");
            return FixOutcome::Discarded;
        }

        if let Some(accuracy) = fix.accuracy {
            if accuracy > self.config.max_accuracy_m {
                debug!(
                    "fix discarded: accuracy {:.1}m worse than {:.1}m",
                    accuracy, self.config.max_accuracy_m
                );
                return FixOutcome::DiscardedAccuracy;
            }
        }

        let point = fix.position();
        let anchor = match self.anchor {
            Some(anchor) => anchor,
            None => {
                // No prior point to measure from: anchor only
                self.anchor = Some(point);
                self.anchor_timestamp_ms = fix.timestamp_ms;
                self.path.push(point);
                return FixOutcome::AcceptedAnchor;
            }
        };

        let step = haversine_distance(&anchor, &point);
        let delta_secs = (fix.timestamp_ms - self.anchor_timestamp_ms).max(0) as f64 / 1000.0;

        let min_step = match fix.accuracy {
            Some(accuracy) => self
                .config
                .min_step_m
                .max(accuracy * self.config.accuracy_step_factor),
            None => self.config.min_step_m,
        };
        if step < min_step {
            return FixOutcome::DiscardedJitter;
        }

        if step > self.config.max_jump_m {
            debug!(
                "fix discarded: {:.0}m jump exceeds {:.0}m",
                step, self.config.max_jump_m
            );
            return FixOutcome::DiscardedJump;
        }

        // Prefer the device-reported speed; fall back to the derived one
        let speed = match fix.speed {
            Some(speed) if speed.is_finite() => Some(speed),
            _ if delta_secs > 0.0 => Some(step / delta_secs),
            _ => None,
        };
        if let Some(speed) = speed {
            if speed > self.config.max_speed_mps {
                debug!(
                    "fix discarded: {:.1}m/s exceeds {:.1}m/s",
                    speed, self.config.max_speed_mps
                );
                return FixOutcome::DiscardedSpeed;
            }
        }

        self.total_distance_m += step;
        self.anchor = Some(point);
        self.anchor_timestamp_ms = fix.timestamp_ms;
        self.path.push(point);
        FixOutcome::Accepted { step_m: step }
    }

    /// Clear anchor, distance, and path.
    pub fn reset(&mut self) {
        self.anchor = None;
        self.anchor_timestamp_ms = 0;
        self.total_distance_m = 0.0;
        self.path.clear();
    }

    /// Total accumulated distance in meters.
    pub fn total_distance_m(&self) -> f64 {
        self.total_distance_m
    }

    /// Every accepted fix, in acceptance order.
    pub fn path(&self) -> &[TrackPoint] {
        &self.path
    }

    /// The last accepted position, if any.
    pub fn last_position(&self) -> Option<TrackPoint> {
        self.anchor
    }

    /// Simplified copy of the path for map rendering.
    pub fn render_path(&self, tolerance_deg: f64) -> Vec<TrackPoint> {
        simplify_path(&self.path, tolerance_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // About 1 degree of latitude in meters, for offsetting test fixes
    const LAT_DEGREE_M: f64 = 111_195.0;

    fn fix_at_meters_north(meters: f64, timestamp_ms: i64) -> GeoFix {
        GeoFix::new(meters / LAT_DEGREE_M, 0.0, timestamp_ms).with_accuracy(5.0)
    }

    #[test]
    fn test_first_fix_anchors_without_distance() {
        let mut track = Track::new();
        let outcome = track.ingest(&fix_at_meters_north(0.0, 0));

        assert_eq!(outcome, FixOutcome::AcceptedAnchor);
        assert_eq!(track.total_distance_m(), 0.0);
        assert_eq!(track.path().len(), 1);
        assert!(track.last_position().is_some());
    }

    #[test]
    fn test_accepts_plausible_movement() {
        let mut track = Track::new();
        track.ingest(&fix_at_meters_north(0.0, 0));
        let outcome = track.ingest(&fix_at_meters_north(20.0, 10_000));

        assert!(matches!(outcome, FixOutcome::Accepted { .. }));
        assert!((track.total_distance_m() - 20.0).abs() < 0.5);
        assert_eq!(track.path().len(), 2);
    }

    #[test]
    fn test_rejects_poor_accuracy() {
        let mut track = Track::new();
        track.ingest(&fix_at_meters_north(0.0, 0));
        let bad = GeoFix::new(20.0 / LAT_DEGREE_M, 0.0, 10_000).with_accuracy(50.0);

        assert_eq!(track.ingest(&bad), FixOutcome::DiscardedAccuracy);
        assert_eq!(track.total_distance_m(), 0.0);
        assert_eq!(track.path().len(), 1);
    }

    #[test]
    fn test_rejects_non_finite_coordinates() {
        let mut track = Track::new();
        let nan = GeoFix::new(f64::NAN, 0.0, 0);
        let inf = GeoFix::new(0.0, f64::INFINITY, 0);

        assert_eq!(track.ingest(&nan), FixOutcome::Discarded);
        assert_eq!(track.ingest(&inf), FixOutcome::Discarded);
        assert!(track.path().is_empty());
    }

    #[test]
    fn test_rejects_jitter_below_min_step() {
        let mut track = Track::new();
        track.ingest(&fix_at_meters_north(0.0, 0));
        let outcome = track.ingest(&fix_at_meters_north(1.5, 5_000));

        assert_eq!(outcome, FixOutcome::DiscardedJitter);
        assert_eq!(track.total_distance_m(), 0.0);
    }

    #[test]
    fn test_jitter_does_not_advance_anchor() {
        let mut track = Track::new();
        track.ingest(&fix_at_meters_north(0.0, 0));

        // Creep north in 0.2m increments; each step stays under the floor
        // and the anchor must not follow, so no distance ever accrues.
        for i in 1..=10 {
            let outcome = track.ingest(&fix_at_meters_north(i as f64 * 0.2, i * 5_000));
            assert_eq!(outcome, FixOutcome::DiscardedJitter);
        }
        assert_eq!(track.total_distance_m(), 0.0);
        assert_eq!(track.path().len(), 1);
    }

    #[test]
    fn test_accuracy_scales_jitter_floor() {
        let mut track = Track::new();
        track.ingest(&GeoFix::new(0.0, 0.0, 0).with_accuracy(20.0));

        // 10m step passes the fixed 3m floor but not 20m * 0.6 = 12m
        let mushy = GeoFix::new(10.0 / LAT_DEGREE_M, 0.0, 10_000).with_accuracy(20.0);
        assert_eq!(track.ingest(&mushy), FixOutcome::DiscardedJitter);

        // The same step with tight accuracy is accepted
        let tight = GeoFix::new(10.0 / LAT_DEGREE_M, 0.0, 20_000).with_accuracy(5.0);
        assert!(track.ingest(&tight).is_accepted());
    }

    #[test]
    fn test_rejects_jump() {
        let mut track = Track::new();
        track.ingest(&fix_at_meters_north(0.0, 0));
        let outcome = track.ingest(&fix_at_meters_north(150.0, 10_000));

        assert_eq!(outcome, FixOutcome::DiscardedJump);
        assert_eq!(track.total_distance_m(), 0.0);
        assert_eq!(track.path().len(), 1);
    }

    #[test]
    fn test_rejects_derived_speed() {
        let mut track = Track::new();
        track.ingest(&fix_at_meters_north(0.0, 0));
        // 50m in one second is 50 m/s
        let outcome = track.ingest(&fix_at_meters_north(50.0, 1_000));

        assert_eq!(outcome, FixOutcome::DiscardedSpeed);
        assert_eq!(track.total_distance_m(), 0.0);
    }

    #[test]
    fn test_rejects_reported_speed() {
        let mut track = Track::new();
        track.ingest(&fix_at_meters_north(0.0, 0));
        // Plausible step but the device reports a sprint no runner sustains
        let fix = fix_at_meters_north(20.0, 10_000).with_speed(12.0);

        assert_eq!(track.ingest(&fix), FixOutcome::DiscardedSpeed);
    }

    #[test]
    fn test_reported_speed_preferred_over_derived() {
        let mut track = Track::new();
        track.ingest(&fix_at_meters_north(0.0, 0));
        // Derived speed would be 20 m/s, but the device says 4 m/s
        let fix = fix_at_meters_north(20.0, 1_000).with_speed(4.0);

        assert!(track.ingest(&fix).is_accepted());
    }

    #[test]
    fn test_distance_is_monotonic() {
        let mut track = Track::new();
        let mut last = 0.0;
        for i in 0..20 {
            track.ingest(&fix_at_meters_north(i as f64 * 10.0, i * 5_000));
            assert!(track.total_distance_m() >= last);
            last = track.total_distance_m();
        }
        assert!((last - 190.0).abs() < 2.0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut track = Track::new();
        track.ingest(&fix_at_meters_north(0.0, 0));
        track.ingest(&fix_at_meters_north(20.0, 10_000));
        track.reset();

        assert_eq!(track.total_distance_m(), 0.0);
        assert!(track.path().is_empty());
        assert!(track.last_position().is_none());
    }

    #[test]
    fn test_render_path_simplifies() {
        let mut track = Track::new();
        for i in 0..30 {
            track.ingest(&fix_at_meters_north(i as f64 * 10.0, i * 5_000));
        }
        let rendered = track.render_path(0.0001);
        assert!(rendered.len() <= track.path().len());
        assert!(rendered.len() >= 2);
    }
}
