//! Line following

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::rc::LinePattern;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::{
    module::{Module, ModuleError},
    vehicle::VehicleState,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Steering for each known line pattern. A line left of centre steers positive, right of centre
/// steers negative.
const STEERING_TABLE: [(LinePattern, f64); 13] = [
    ([0, 0, 1, 0, 0], 0.0),
    ([0, 1, 1, 1, 0], 0.0),
    ([1, 1, 1, 1, 1], 0.0),
    ([0, 1, 1, 0, 0], 0.2),
    ([0, 0, 1, 1, 0], -0.2),
    ([1, 1, 1, 0, 0], 0.3),
    ([0, 0, 1, 1, 1], -0.3),
    ([0, 1, 0, 0, 0], 0.4),
    ([0, 0, 0, 1, 0], -0.4),
    ([1, 1, 0, 0, 0], 0.6),
    ([0, 0, 0, 1, 1], -0.6),
    ([1, 0, 0, 0, 0], 0.8),
    ([0, 0, 0, 0, 1], -0.8),
];

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowLineStatus {
    /// On the line
    Driving,

    /// Line lost, reversing slowly to find it again
    Searching { since: Instant },

    /// Searching took too long, standing still until the line reappears
    Lost,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowLineParams {
    /// Speed while on the line
    pub drive_speed: f64,

    /// Speed while reversing in search of the line
    pub search_speed: f64,

    /// Time after which the search is given up
    ///
    /// Units: seconds
    pub search_timeout_s: f64,
}

pub struct FollowLineDrive {
    params: FollowLineParams,
    search_timeout: Duration,
    status: FollowLineStatus,

    /// Steering of the last known pattern
    steering: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for FollowLineParams {
    fn default() -> Self {
        Self {
            drive_speed: 0.5,
            search_speed: 0.4,
            search_timeout_s: 3.0,
        }
    }
}

impl FollowLineDrive {
    pub fn new(params: FollowLineParams) -> Result<Self, ModuleError> {
        if !params.search_timeout_s.is_finite() || params.search_timeout_s < 0.0 {
            return Err(ModuleError::InvalidParams(format!(
                "search timeout of {} s", params.search_timeout_s
            )))
        }

        Ok(Self {
            search_timeout: Duration::from_secs_f64(params.search_timeout_s),
            params,
            status: FollowLineStatus::Driving,
            steering: 0.0,
        })
    }

    pub fn status(&self) -> FollowLineStatus {
        self.status
    }

    pub fn step(&mut self, now: Instant, state: &mut VehicleState) {
        if state.line_pattern.iter().any(|&p| p != 0) {
            if self.status != FollowLineStatus::Driving {
                info!("Line found");
                self.status = FollowLineStatus::Driving;
            }

            if let Some(s) = steering(&state.line_pattern) {
                self.steering = s;
            }

            state.target_speed = self.params.drive_speed;
            state.direction = self.steering;
            return
        }

        match self.status {
            FollowLineStatus::Driving => {
                info!("Line lost, searching");
                self.status = FollowLineStatus::Searching { since: now };
            },
            FollowLineStatus::Searching { since } => {
                if now.saturating_duration_since(since) >= self.search_timeout {
                    warn!("Line not found within {} s, giving up", self.params.search_timeout_s);
                    self.status = FollowLineStatus::Lost;
                }
            },
            FollowLineStatus::Lost => ()
        }

        state.direction = 0.0;
        state.target_speed = match self.status {
            FollowLineStatus::Lost => 0.0,
            _ => -self.params.search_speed
        };
    }
}

impl Module for FollowLineDrive {
    fn update(&mut self, state: &mut VehicleState) -> Result<(), ModuleError> {
        self.step(Instant::now(), state);
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Steering for a line pattern, `None` if the pattern is not known.
pub fn steering(pattern: &LinePattern) -> Option<f64> {
    STEERING_TABLE
        .iter()
        .find(|(p, _)| p == pattern)
        .map(|(_, s)| *s)
}
