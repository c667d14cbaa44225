//! # Direction change strategies
//!
//! A direction change strategy is polled once per cycle by a drive module and decides whether the
//! module should pick a new speed and direction. Strategies compose, for instance
//!
//! ```ignore
//! log_changes(
//!     limit(any(vec![Box::new(on_obstacle(0.75)), Box::new(random_interval(10.0, 30.0))]), 1.0),
//!     "drive:random"
//! )
//! ```
//!
//! changes direction when an obstacle comes close or after 10 to 30 seconds, at most once per
//! second, logging every change.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::vehicle::VehicleState;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait DirectionChange {
    /// Poll the strategy, returns `true` if the direction shall change now.
    fn next(&mut self, now: Instant, state: &VehicleState) -> bool;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the standard strategy used by the autonomous drive modules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionChangeParams {
    /// Pushback at which an obstacle causes a change.
    pub obstacle_threshold: f64,

    /// Shortest random time between changes.
    ///
    /// Units: seconds
    pub min_interval_s: f64,

    /// Longest random time between changes.
    ///
    /// Units: seconds
    pub max_interval_s: f64,

    /// Minimum time between two changes.
    ///
    /// Units: seconds
    pub cooldown_s: f64,
}

/// Changes direction every `interval`.
pub struct FixedInterval {
    interval: Duration,
    last: Option<Instant>,
}

/// Changes direction after a random time, drawn again after each change.
pub struct RandomInterval<R = StdRng> {
    min_s: f64,
    max_s: f64,
    threshold: Duration,
    last: Option<Instant>,
    rng: R,
}

/// Changes direction when an obstacle in the direction of travel pushes back at least
/// `threshold`.
pub struct OnObstacle {
    threshold: f64,
}

/// Changes direction when any of the children does. Every child is polled on every call.
pub struct Any {
    children: Vec<Box<dyn DirectionChange>>,
}

/// Passes changes of the inner strategy through, except those within `cooldown` of the last
/// change passed.
pub struct Limit<C> {
    inner: C,
    cooldown: Duration,
    last_passed: Option<Instant>,
}

/// Passes changes of the inner strategy through, logging each one.
pub struct LogChanges<C> {
    inner: C,
    label: String,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for DirectionChangeParams {
    fn default() -> Self {
        Self {
            obstacle_threshold: 0.75,
            min_interval_s: 10.0,
            max_interval_s: 30.0,
            cooldown_s: 1.0,
        }
    }
}

impl DirectionChangeParams {
    /// Build the standard strategy: change on obstacles or after a random interval, rate limited,
    /// with each change logged under `label`.
    pub fn build(&self, label: &str) -> LogChanges<Limit<Any>> {
        log_changes(
            limit(
                any(vec![
                    Box::new(on_obstacle(self.obstacle_threshold)),
                    Box::new(random_interval(self.min_interval_s, self.max_interval_s)),
                ]),
                self.cooldown_s
            ),
            label
        )
    }
}

impl<D: DirectionChange + ?Sized> DirectionChange for Box<D> {
    fn next(&mut self, now: Instant, state: &VehicleState) -> bool {
        (**self).next(now, state)
    }
}

impl DirectionChange for FixedInterval {
    fn next(&mut self, now: Instant, _: &VehicleState) -> bool {
        match self.last {
            Some(t) if now.saturating_duration_since(t) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

impl<R: Rng> RandomInterval<R> {
    pub fn with_rng(min_s: f64, max_s: f64, rng: R) -> Self {
        let (min_s, max_s) = match min_s <= max_s {
            true => (non_negative(min_s), non_negative(max_s)),
            false => (non_negative(max_s), non_negative(min_s))
        };

        let mut interval = Self {
            min_s,
            max_s,
            threshold: Duration::default(),
            last: None,
            rng,
        };
        interval.draw();
        interval
    }

    /// Current time between changes.
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    fn draw(&mut self) {
        self.threshold = Duration::from_secs_f64(self.rng.gen_range(self.min_s..=self.max_s));
    }
}

impl<R: Rng> DirectionChange for RandomInterval<R> {
    fn next(&mut self, now: Instant, _: &VehicleState) -> bool {
        match self.last {
            Some(t) if now.saturating_duration_since(t) < self.threshold => false,
            _ => {
                self.last = Some(now);
                self.draw();
                true
            }
        }
    }
}

impl DirectionChange for OnObstacle {
    fn next(&mut self, _: Instant, state: &VehicleState) -> bool {
        if state.speed_total() >= 0.0 {
            state.obstacle_pushback >= self.threshold
        }
        else {
            state.obstacle_pushback <= -self.threshold
        }
    }
}

impl DirectionChange for Any {
    fn next(&mut self, now: Instant, state: &VehicleState) -> bool {
        self.children
            .iter_mut()
            .fold(false, |change, c| c.next(now, state) || change)
    }
}

impl<C: DirectionChange> DirectionChange for Limit<C> {
    fn next(&mut self, now: Instant, state: &VehicleState) -> bool {
        if !self.inner.next(now, state) {
            return false
        }

        match self.last_passed {
            Some(t) if now.saturating_duration_since(t) < self.cooldown => false,
            _ => {
                self.last_passed = Some(now);
                true
            }
        }
    }
}

impl<C: DirectionChange> DirectionChange for LogChanges<C> {
    fn next(&mut self, now: Instant, state: &VehicleState) -> bool {
        let change = self.inner.next(now, state);

        if change {
            info!(
                "{}: direction change (speed {:.2}, pushback {:.2})",
                self.label, state.speed_total(), state.obstacle_pushback
            );
        }

        change
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

pub fn any(children: Vec<Box<dyn DirectionChange>>) -> Any {
    Any { children }
}

pub fn limit<C: DirectionChange>(inner: C, cooldown_s: f64) -> Limit<C> {
    Limit {
        inner,
        cooldown: Duration::from_secs_f64(non_negative(cooldown_s)),
        last_passed: None,
    }
}

pub fn fixed_interval(interval_s: f64) -> FixedInterval {
    FixedInterval {
        interval: Duration::from_secs_f64(non_negative(interval_s)),
        last: None,
    }
}

pub fn random_interval(min_s: f64, max_s: f64) -> RandomInterval {
    RandomInterval::with_rng(min_s, max_s, StdRng::from_entropy())
}

pub fn on_obstacle(threshold: f64) -> OnObstacle {
    OnObstacle { threshold }
}

pub fn log_changes<C: DirectionChange>(inner: C, label: &str) -> LogChanges<C> {
    LogChanges {
        inner,
        label: label.to_string(),
    }
}

/// Replace negative and NaN durations with 0, and infinite ones with a day.
fn non_negative(seconds: f64) -> f64 {
    if seconds.is_nan() || seconds < 0.0 {
        0.0
    }
    else {
        seconds.min(86_400.0)
    }
}
