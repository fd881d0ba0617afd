//! Component A: the trip bucketizer. Converts a day's trips into per-station
//! per-bucket pickup, dropoff, and net-delta arrays.

use chrono::NaiveDateTime;
use tracing::warn;

use crate::types::{BucketConfig, StationIdx, StationRegistry};

/// One trip record as read from the trips file (or any injectable source).
/// Timestamps are kept as raw strings so callers can supply their own parser.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub start_time: String,
    pub end_time: String,
    pub start_station_id: String,
    pub end_station_id: String,
}

/// Default timestamp format observed in the reference dataset:
/// `MM/DD/YYYY HH:MM`.
pub fn parse_mm_dd_yyyy_hh_mm(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), "%m/%d/%Y %H:%M").ok()
}

/// Counts of why rows were skipped, surfaced instead of silently swallowed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BucketizeDiagnostics {
    pub rows_seen: u64,
    pub rows_malformed_timestamp: u64,
    pub rows_self_loop: u64,
    pub rows_unknown_station: u64,
    pub rows_outside_window: u64,
    pub pickups_counted: u64,
    pub dropoffs_counted: u64,
}

/// Per-station per-bucket arrays for one day, indexed `[station_idx][bucket]`.
#[derive(Debug, Clone)]
pub struct BucketizedDay {
    pub bucket: BucketConfig,
    pub pickups: Vec<Vec<u32>>,
    pub dropoffs: Vec<Vec<u32>>,
    pub delta: Vec<Vec<i64>>,
    pub touch_total: Vec<u64>,
    pub diagnostics: BucketizeDiagnostics,
}

impl BucketizedDay {
    fn empty(registry: &StationRegistry, bucket: BucketConfig) -> Self {
        let b = bucket.bucket_count();
        let n = registry.len();
        Self {
            bucket,
            pickups: vec![vec![0u32; b]; n],
            dropoffs: vec![vec![0u32; b]; n],
            delta: vec![vec![0i64; b]; n],
            touch_total: vec![0u64; n],
            diagnostics: BucketizeDiagnostics::default(),
        }
    }

    pub fn pickups_for(&self, idx: StationIdx) -> &[u32] {
        &self.pickups[idx.0]
    }

    pub fn dropoffs_for(&self, idx: StationIdx) -> &[u32] {
        &self.dropoffs[idx.0]
    }

    pub fn delta_for(&self, idx: StationIdx) -> &[i64] {
        &self.delta[idx.0]
    }
}

/// Bucketize a day's trips against `registry`. `day_start` is local midnight;
/// the day window is `[day_start, day_start + 1 day)`. `parse_timestamp` is
/// the injectable parser; use [`parse_mm_dd_yyyy_hh_mm`] for the reference
/// dataset's format.
pub fn bucketize_trips<'a, I, P>(
    trips: I,
    registry: &StationRegistry,
    day_start: NaiveDateTime,
    bucket: BucketConfig,
    parse_timestamp: P,
) -> BucketizedDay
where
    I: IntoIterator<Item = &'a TripRecord>,
    P: Fn(&str) -> Option<NaiveDateTime>,
{
    let day_end = day_start + chrono::Duration::days(1);
    let mut day = BucketizedDay::empty(registry, bucket);

    for trip in trips {
        day.diagnostics.rows_seen += 1;

        let (Some(start_dt), Some(end_dt)) =
            (parse_timestamp(&trip.start_time), parse_timestamp(&trip.end_time))
        else {
            day.diagnostics.rows_malformed_timestamp += 1;
            continue;
        };

        let s0 = trip.start_station_id.trim();
        let s1 = trip.end_station_id.trim();
        if s0 == s1 {
            day.diagnostics.rows_self_loop += 1;
            continue;
        }

        let (Some(i0), Some(i1)) = (registry.idx(s0), registry.idx(s1)) else {
            day.diagnostics.rows_unknown_station += 1;
            continue;
        };

        let start_in_window = start_dt >= day_start && start_dt < day_end;
        let end_in_window = end_dt >= day_start && end_dt < day_end;
        if !start_in_window && !end_in_window {
            day.diagnostics.rows_outside_window += 1;
            continue;
        }

        if start_in_window {
            let minute = (start_dt - day_start).num_minutes();
            let b = day.bucket.bucket_of_minute(minute);
            day.pickups[i0.0][b] += 1;
            day.delta[i0.0][b] -= 1;
            day.touch_total[i0.0] += 1;
            day.diagnostics.pickups_counted += 1;
        }
        if end_in_window {
            let minute = (end_dt - day_start).num_minutes();
            let b = day.bucket.bucket_of_minute(minute);
            day.dropoffs[i1.0][b] += 1;
            day.delta[i1.0][b] += 1;
            day.touch_total[i1.0] += 1;
            day.diagnostics.dropoffs_counted += 1;
        }
    }

    if day.diagnostics.rows_malformed_timestamp > 0
        || day.diagnostics.rows_unknown_station > 0
    {
        warn!(
            malformed = day.diagnostics.rows_malformed_timestamp,
            unknown_station = day.diagnostics.rows_unknown_station,
            self_loop = day.diagnostics.rows_self_loop,
            outside_window = day.diagnostics.rows_outside_window,
            "skipped trip rows while bucketizing"
        );
    }

    day
}
