//! Session state machine: the timer–GPS–state reconciliation loop.
//!
//! A [`Session`] owns one [`Clock`] and one [`Track`] and is the only
//! writer to either. The host forwards three event sources onto it —
//! gesture actions via [`Session::apply`], location fixes via
//! [`Session::ingest_fix`], and a periodic tick via [`Session::tick`] —
//! all on a single execution context, and reads display values back
//! through [`Session::snapshot`].
//!
//! The subscription to the location provider belongs to the host; it
//! should be live exactly while [`Session::is_tracking`] is true. Fixes
//! that arrive in any other phase are dropped without touching the track,
//! and the track anchor is retained across a pause so the first fix after
//! resume measures from the true last position instead of producing a
//! spurious jump.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::action::{available_actions, Action};
use crate::clock::{format_hms, Clock};
use crate::error::{LocationError, PlatformError};
use crate::filter::{FixOutcome, Track, TrackConfig};
use crate::geo_utils::format_distance;
use crate::{GeoFix, TrackPoint};

/// Acquisition timeout the host should pass to the location provider.
pub const LOCATION_TIMEOUT_MS: u32 = 5_000;

/// Maximum cached-fix age the host should accept from the provider.
pub const LOCATION_MAX_AGE_MS: u32 = 0;

/// Vibration pattern fired when the time limit is reached.
pub const GOAL_VIBRATION_PATTERN_MS: [u32; 3] = [200, 100, 200];

/// Session lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Ready,
    Running,
    Paused,
}

/// Configuration for a run-test session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Time limit in seconds; crossing it fires the one-shot goal event.
    /// Default: 720 (the 12-minute protocol)
    pub time_limit_secs: u32,

    /// Fix acceptance thresholds.
    pub track: TrackConfig,

    /// Suggested cadence for the host's display ticker in milliseconds.
    /// Default: 100
    pub tick_interval_ms: u32,
}

impl SessionConfig {
    /// The standard 12-minute run test.
    pub fn twelve_minute() -> Self {
        Self::default()
    }

    /// A protocol with a custom time limit in seconds.
    pub fn with_time_limit(time_limit_secs: u32) -> Self {
        Self {
            time_limit_secs,
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 720,
            track: TrackConfig::default(),
            tick_interval_ms: 100,
        }
    }
}

/// One-shot event fired the instant elapsed time crosses the limit.
///
/// The distance is frozen at the crossing instant; the timer keeps
/// advancing afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalReached {
    pub elapsed_ms: i64,
    pub distance_m: f64,
}

/// What [`Session::apply`] did with an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The phase changed.
    Transitioned { from: Phase, to: Phase },
    /// View request for the host to forward to the renderer.
    ShowDetails,
    /// The action is not legal in the current phase; nothing changed.
    Ignored,
}

/// Host-provided device side effects. All calls are fire-and-forget:
/// the session never reads a result beyond logging a wake-lock failure.
pub trait Platform {
    /// Ask the device to keep the display awake.
    fn acquire_wake_lock(&mut self) -> Result<(), PlatformError>;

    /// Release the display wake lock.
    fn release_wake_lock(&mut self);

    /// Trigger haptic feedback with the given on/off pattern.
    fn vibrate(&mut self, pattern_ms: &[u32]);
}

/// Platform that does nothing. Default for hosts without device access.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPlatform;

impl Platform for NoopPlatform {
    fn acquire_wake_lock(&mut self) -> Result<(), PlatformError> {
        Ok(())
    }

    fn release_wake_lock(&mut self) {}

    fn vibrate(&mut self, _pattern_ms: &[u32]) {}
}

/// Renderer-facing view of the session, serialized as camelCase JSON for
/// the JS consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub phase: Phase,
    /// Elapsed time as zero-padded `HH:MM:SS`.
    pub elapsed: String,
    pub elapsed_ms: i64,
    /// Distance formatted for display (meters below 1 km, else km).
    pub distance: String,
    pub distance_m: f64,
    pub goal_reached: bool,
    /// Informational text from the last location-provider error, if any.
    pub status: Option<String>,
    /// Actions the renderer should offer in the current phase.
    pub available_actions: Vec<Action>,
}

impl Snapshot {
    /// Serialize for the renderer bridge.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

/// The run-test session: phase, clock, track, and the one-shot goal flag.
///
/// # Example
/// ```
/// use runtest::{Action, GeoFix, Phase, Session};
///
/// let mut session = Session::new();
/// session.apply(Action::Start, 0);
/// assert_eq!(session.phase(), Phase::Running);
///
/// session.ingest_fix(&GeoFix::new(51.5074, -0.1278, 1_000).with_accuracy(8.0));
/// session.ingest_fix(&GeoFix::new(51.5078, -0.1278, 11_000).with_accuracy(8.0));
/// assert!(session.total_distance_m() > 40.0);
///
/// session.apply(Action::Pause, 30_000);
/// assert_eq!(session.elapsed_ms(90_000), 30_000);
/// ```
#[derive(Debug)]
pub struct Session<P: Platform = NoopPlatform> {
    config: SessionConfig,
    phase: Phase,
    clock: Clock,
    track: Track,
    goal_reached: bool,
    status: Option<String>,
    platform: P,
}

impl Session<NoopPlatform> {
    /// Create a session with default configuration and no device effects.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create a session with custom configuration and no device effects.
    pub fn with_config(config: SessionConfig) -> Self {
        Self::with_platform(config, NoopPlatform)
    }
}

impl Default for Session<NoopPlatform> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Platform> Session<P> {
    /// Create a session wired to host device effects.
    pub fn with_platform(config: SessionConfig, platform: P) -> Self {
        let track = Track::with_config(config.track.clone());
        Self {
            config,
            phase: Phase::Ready,
            clock: Clock::new(),
            track,
            goal_reached: false,
            status: None,
            platform,
        }
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Apply a discrete action from the input surface.
    ///
    /// Every (phase, action) pair outside the transition table is a no-op,
    /// which makes dispatch idempotent-safe: a second `start` while
    /// Running touches neither the clock nor the tracking gate, so the
    /// host can never double-subscribe or double-count.
    pub fn apply(&mut self, action: Action, now_ms: i64) -> ActionOutcome {
        match (self.phase, action) {
            (Phase::Ready, Action::Start) | (Phase::Paused, Action::Continue) => {
                self.clock.start(now_ms);
                if let Err(err) = self.platform.acquire_wake_lock() {
                    // Best effort: the session runs without the lock
                    warn!("wake lock not acquired: {}", err);
                }
                self.transition(Phase::Running)
            }
            (Phase::Running, Action::Pause) => {
                self.clock.pause(now_ms);
                // Track anchor is retained so resuming measures from the
                // true last position
                self.platform.release_wake_lock();
                self.transition(Phase::Paused)
            }
            (Phase::Running | Phase::Paused, Action::Restart) => {
                self.clock.reset();
                self.track.reset();
                self.goal_reached = false;
                self.status = None;
                self.platform.release_wake_lock();
                self.transition(Phase::Ready)
            }
            (_, Action::Details) => ActionOutcome::ShowDetails,
            (phase, action) => {
                debug!("ignoring '{}' while {:?}", action, phase);
                ActionOutcome::Ignored
            }
        }
    }

    fn transition(&mut self, to: Phase) -> ActionOutcome {
        let from = self.phase;
        self.phase = to;
        info!("session {:?} -> {:?}", from, to);
        ActionOutcome::Transitioned { from, to }
    }

    // ========================================================================
    // Ticks and fixes
    // ========================================================================

    /// Periodic update; call at roughly `config.tick_interval_ms` while
    /// running.
    ///
    /// Returns the goal event exactly once per session, the first tick at
    /// which elapsed time has crossed the limit. The timer is not stopped:
    /// later ticks keep advancing the display and return `None`.
    pub fn tick(&mut self, now_ms: i64) -> Option<GoalReached> {
        if self.phase != Phase::Running || self.goal_reached {
            return None;
        }

        let elapsed_ms = self.clock.elapsed_ms(now_ms);
        if elapsed_ms / 1000 < i64::from(self.config.time_limit_secs) {
            return None;
        }

        self.goal_reached = true;
        self.platform.vibrate(&GOAL_VIBRATION_PATTERN_MS);
        let event = GoalReached {
            elapsed_ms,
            distance_m: self.track.total_distance_m(),
        };
        info!(
            "time limit of {}s reached at {:.0}m",
            self.config.time_limit_secs, event.distance_m
        );
        Some(event)
    }

    /// Feed one raw fix from the location provider.
    ///
    /// Phase-gated: fixes are only ingested while Running. An accepted fix
    /// clears any provider-error status.
    pub fn ingest_fix(&mut self, fix: &GeoFix) -> FixOutcome {
        if self.phase != Phase::Running {
            debug!("dropping fix while {:?}", self.phase);
            return FixOutcome::Discarded;
        }

        let outcome = self.track.ingest(fix);
        if outcome.is_accepted() {
            self.status = None;
        }
        outcome
    }

    /// Record a provider error as informational status for the renderer.
    ///
    /// Non-fatal: the host keeps the subscription alive and distance
    /// resumes accumulating when a valid fix arrives.
    pub fn report_location_error(&mut self, err: LocationError) {
        info!("location provider error: {}", err);
        self.status = Some(err.to_string());
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn goal_reached(&self) -> bool {
        self.goal_reached
    }

    /// Whether the host's location subscription should currently be live.
    pub fn is_tracking(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        self.clock.elapsed_ms(now_ms)
    }

    pub fn total_distance_m(&self) -> f64 {
        self.track.total_distance_m()
    }

    /// Every accepted fix, in acceptance order.
    pub fn path(&self) -> &[TrackPoint] {
        self.track.path()
    }

    /// Simplified copy of the path for map rendering.
    pub fn render_path(&self, tolerance_deg: f64) -> Vec<TrackPoint> {
        self.track.render_path(tolerance_deg)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Build the renderer-facing view of the current state.
    pub fn snapshot(&self, now_ms: i64) -> Snapshot {
        let elapsed_ms = self.clock.elapsed_ms(now_ms);
        let distance_m = self.track.total_distance_m();
        Snapshot {
            phase: self.phase,
            elapsed: format_hms(elapsed_ms),
            elapsed_ms,
            distance: format_distance(distance_m),
            distance_m,
            goal_reached: self.goal_reached,
            status: self.status.clone(),
            available_actions: available_actions(self.phase).to_vec(),
        }
    }
}
