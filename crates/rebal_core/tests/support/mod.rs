#![allow(dead_code)]

//! Shared fixtures for the integration tests in this directory: a small
//! synthetic registry and a commuter-shaped trip stream, built without
//! touching the CSV/JSON loaders so these tests stay fast and dependency-free.

use chrono::NaiveDateTime;

use rebal_core::bucketize::{bucketize_trips, parse_mm_dd_yyyy_hh_mm, BucketizedDay, TripRecord};
use rebal_core::simulate::{build_event_stream, TripEvent};
use rebal_core::types::{BucketConfig, Station, StationRegistry};

pub fn day_start() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("01/01/2024 00:00", "%m/%d/%Y %H:%M").unwrap()
}

/// `n` stations in a line, alternating capacities so rounding/remainder
/// logic in the allocator has something to chew on.
pub fn registry(n: usize) -> StationRegistry {
    let stations = (0..n)
        .map(|i| Station {
            station_id: format!("S{i:03}"),
            capacity: 10 + (i % 3) as u32 * 5,
            lat: 43.6 + i as f64 * 0.01,
            lon: -79.4 + i as f64 * 0.01,
        })
        .collect();
    StationRegistry::from_stations(stations)
}

/// Deterministic commuter-shaped trips: morning moves bikes from the
/// "residential" half to the "downtown" half, evening reverses it.
pub fn commuter_trips(reg: &StationRegistry, count: usize) -> Vec<TripRecord> {
    let n = reg.len();
    let mut trips = Vec::with_capacity(count);
    for i in 0..count {
        let morning = i % 2 == 0;
        let (hour, from, to) = if morning {
            (7 + (i % 3), i % (n / 2), n / 2 + (i % (n - n / 2)))
        } else {
            (17 + (i % 3), n / 2 + (i % (n - n / 2)), i % (n / 2))
        };
        let minute = (i * 11) % 60;
        let end_total = hour * 60 + minute + 12 + (i % 20);
        let end_hour = (end_total / 60) % 24;
        let end_minute = end_total % 60;
        trips.push(TripRecord {
            start_time: format!("01/01/2024 {hour:02}:{minute:02}"),
            end_time: format!("01/01/2024 {end_hour:02}:{end_minute:02}"),
            start_station_id: reg.station_id(rebal_core::types::StationIdx(from)).to_string(),
            end_station_id: reg.station_id(rebal_core::types::StationIdx(to)).to_string(),
        });
    }
    trips
}

pub fn bucketized(reg: &StationRegistry, trips: &[TripRecord], bucket: BucketConfig) -> BucketizedDay {
    bucketize_trips(trips, reg, day_start(), bucket, parse_mm_dd_yyyy_hh_mm)
}

pub fn events(reg: &StationRegistry, trips: &[TripRecord]) -> Vec<TripEvent> {
    build_event_stream(trips, reg, day_start(), parse_mm_dd_yyyy_hh_mm)
}
