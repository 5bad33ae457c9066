//! Discrete action tokens from the input surface.
//!
//! The gesture widget (slide-to-confirm or swipe, out of scope here) emits
//! one of five tokens once a gesture crosses its threshold. The tokens are
//! lower-case on the wire, matching the widget's event names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownAction;
use crate::session::Phase;

/// A discrete user action from the input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Start,
    Pause,
    Continue,
    Restart,
    /// Pure view request; never mutates session state.
    Details,
}

impl Action {
    fn token(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Pause => "pause",
            Action::Continue => "continue",
            Action::Restart => "restart",
            Action::Details => "details",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Action::Start),
            "pause" => Ok(Action::Pause),
            "continue" => Ok(Action::Continue),
            "restart" => Ok(Action::Restart),
            "details" => Ok(Action::Details),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// The actions the renderer should offer in a given phase.
///
/// Ready shows only start; Running shows pause and restart; Paused shows
/// continue, restart, and details.
pub fn available_actions(phase: Phase) -> &'static [Action] {
    match phase {
        Phase::Ready => &[Action::Start],
        Phase::Running => &[Action::Pause, Action::Restart],
        Phase::Paused => &[Action::Continue, Action::Restart, Action::Details],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_wire_tokens() {
        for action in [
            Action::Start,
            Action::Pause,
            Action::Continue,
            Action::Restart,
            Action::Details,
        ] {
            assert_eq!(action.to_string().parse::<Action>(), Ok(action));
        }
    }

    #[test]
    fn test_unknown_token_is_an_error() {
        assert!("stop".parse::<Action>().is_err());
        assert!("START".parse::<Action>().is_err());
    }

    #[test]
    fn test_affordances_per_phase() {
        assert_eq!(available_actions(Phase::Ready), &[Action::Start]);
        assert_eq!(
            available_actions(Phase::Running),
            &[Action::Pause, Action::Restart]
        );
        assert_eq!(
            available_actions(Phase::Paused),
            &[Action::Continue, Action::Restart, Action::Details]
        );
    }
}
