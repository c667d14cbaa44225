//! # Status cache
//!
//! Hand-off of status information from the control loop to the network thread.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::rc::{SensorStatus, SoundStatus, VehicleStatus};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Everything the vehicle reports to status queries, captured at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub vehicle: VehicleStatus,
    pub sensors: SensorStatus,
    pub sound: SoundStatus,
}

/// The last snapshot published by the control loop.
///
/// The control loop only ever publishes with a non-blocking lock attempt, so a reader holding the
/// lock delays the update by one cycle rather than stalling the loop.
#[derive(Debug, Default)]
pub struct StatusCache {
    snapshot: Mutex<StatusSnapshot>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StatusCache {
    /// Replace the cached snapshot if the lock is free.
    ///
    /// Returns `false` if the lock was held and the snapshot was dropped.
    pub fn try_publish(&self, snapshot: StatusSnapshot) -> bool {
        match self.snapshot.try_lock() {
            Some(mut s) => {
                *s = snapshot;
                true
            },
            None => false
        }
    }

    /// Copy of the whole cached snapshot.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.snapshot.lock().clone()
    }

    pub fn vehicle(&self) -> VehicleStatus {
        self.snapshot.lock().vehicle
    }

    pub fn sensors(&self) -> SensorStatus {
        self.snapshot.lock().sensors.clone()
    }

    pub fn sound(&self) -> SoundStatus {
        self.snapshot.lock().sound.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_publish_skipped_while_locked() {
        let cache = StatusCache::default();

        let mut first = StatusSnapshot::default();
        first.vehicle.target_speed = 0.5;
        assert!(cache.try_publish(first.clone()));

        {
            let _reader = cache.snapshot.lock();

            let mut second = StatusSnapshot::default();
            second.vehicle.target_speed = -0.5;
            assert!(!cache.try_publish(second));
        }

        assert_eq!(cache.snapshot(), first);
        assert_eq!(cache.vehicle().target_speed, 0.5);
    }
}
