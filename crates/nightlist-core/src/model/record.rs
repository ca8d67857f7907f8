use serde::{Deserialize, Serialize};
use std::fmt;

/// A storage record that can be shown as one list row
///
/// The record id is the caller-assigned, stable key of the record. It must not
/// change while the record is alive, even when its other fields do, and it must
/// never be [`HEADER_ID`](super::HEADER_ID).
pub trait Record: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    fn record_id(&self) -> i64;
}

/// Quality value of a night that has not been rated yet
pub const UNRATED_QUALITY: i32 = -1;

/// SleepNight - one tracked night of sleep
///
/// A night starts "in progress": its end time equals its start time and its
/// quality is [`UNRATED_QUALITY`]. Stopping the tracker sets the end time and
/// rating the night sets the quality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SleepNight {
    /// Unique, storage-assigned key
    pub night_id: i64,

    /// Start of the night in epoch milliseconds
    pub start_time_milli: i64,

    /// End of the night in epoch milliseconds (equal to the start while in progress)
    pub end_time_milli: i64,

    /// Quality rating from 0 to 5, or [`UNRATED_QUALITY`]
    pub sleep_quality: i32,
}

impl SleepNight {
    /// Create an in-progress night starting at `start_time_milli`
    pub fn started(night_id: i64, start_time_milli: i64) -> Self {
        Self {
            night_id,
            start_time_milli,
            end_time_milli: start_time_milli,
            sleep_quality: UNRATED_QUALITY,
        }
    }

    /// Return this night with its end time set
    pub fn ended_at(mut self, end_time_milli: i64) -> Self {
        self.end_time_milli = end_time_milli;
        self
    }

    /// Return this night with its quality set
    pub fn rated(mut self, sleep_quality: i32) -> Self {
        self.sleep_quality = sleep_quality;
        self
    }

    /// Check if the tracker has been stopped for this night
    pub fn is_complete(&self) -> bool {
        self.end_time_milli > self.start_time_milli
    }

    /// Check if the night has a quality rating
    pub fn is_rated(&self) -> bool {
        self.sleep_quality != UNRATED_QUALITY
    }
}

impl Record for SleepNight {
    fn record_id(&self) -> i64 {
        self.night_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_night_is_in_progress() {
        let night = SleepNight::started(1, 1_000);
        assert_eq!(night.end_time_milli, 1_000);
        assert!(!night.is_complete());
        assert!(!night.is_rated());
    }

    #[test]
    fn test_ended_and_rated_night() {
        let night = SleepNight::started(1, 1_000).ended_at(9_000).rated(4);
        assert!(night.is_complete());
        assert!(night.is_rated());
        assert_eq!(night.record_id(), 1);
    }
}
