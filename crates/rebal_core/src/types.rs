//! Shared data model: stations, bucket indexing, the dense station arena,
//! and the move/plan/result types exchanged with callers.
//!
//! Internals (bucketizer, cost kernel, allocator, planner, simulator) operate
//! on dense `StationIdx` arrays; string ids are resolved to indices once at
//! load time via [`StationRegistry`] and only re-appear at the public
//! boundary (inputs/outputs keyed by `station_id`).

use std::collections::HashMap;

use crate::error::RebalError;

/// A station as loaded from the registry. Immutable for the lifetime of one
/// invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub station_id: String,
    pub capacity: u32,
    pub lat: f64,
    pub lon: f64,
}

/// Dense index into the station arena. Cheap to copy, used as the row index
/// into every per-station array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StationIdx(pub usize);

/// Maps station ids to dense indices once at load, and back. All hot-loop
/// components key off `StationIdx`; only the public boundary speaks ids.
#[derive(Debug, Clone)]
pub struct StationRegistry {
    stations: Vec<Station>,
    index_of: HashMap<String, StationIdx>,
}

impl StationRegistry {
    pub fn from_stations(stations: Vec<Station>) -> Self {
        let mut index_of = HashMap::with_capacity(stations.len());
        for (i, s) in stations.iter().enumerate() {
            index_of.insert(s.station_id.clone(), StationIdx(i));
        }
        Self { stations, index_of }
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn idx(&self, station_id: &str) -> Option<StationIdx> {
        self.index_of.get(station_id).copied()
    }

    pub fn station(&self, idx: StationIdx) -> &Station {
        &self.stations[idx.0]
    }

    pub fn station_id(&self, idx: StationIdx) -> &str {
        &self.stations[idx.0].station_id
    }

    pub fn capacity(&self, idx: StationIdx) -> u32 {
        self.stations[idx.0].capacity
    }

    pub fn total_capacity(&self) -> u64 {
        self.stations.iter().map(|s| s.capacity as u64).sum()
    }

    pub fn iter_idx(&self) -> impl Iterator<Item = StationIdx> {
        (0..self.stations.len()).map(StationIdx)
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }
}

/// Fixed-width slicing of the operating day. `B = 1440 / bucket_minutes`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketConfig {
    minutes: u32,
}

impl BucketConfig {
    pub fn new(minutes: u32) -> Result<Self, RebalError> {
        if minutes == 0 || 1440 % minutes != 0 {
            return Err(RebalError::InvalidBucketMinutes(minutes));
        }
        Ok(Self { minutes })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn bucket_count(&self) -> usize {
        (1440 / self.minutes) as usize
    }

    /// Bucket index for a minute-of-day offset, clamped into `[0, B)`.
    pub fn bucket_of_minute(&self, minute_of_day: i64) -> usize {
        let b = minute_of_day.div_euclid(self.minutes as i64);
        b.clamp(0, self.bucket_count() as i64 - 1) as usize
    }

    pub fn t_min_of_bucket(&self, b: usize) -> u32 {
        b as u32 * self.minutes
    }

    /// Number of buckets spanned by a lookahead window, at least 1.
    pub fn lookahead_buckets(&self, lookahead_minutes: u32) -> usize {
        ((lookahead_minutes as f64 / self.minutes as f64).ceil() as usize).max(1)
    }
}

/// A single relocation of bikes from one station to another at a
/// bucket-aligned minute of day. Externally keyed by station id.
#[derive(Debug, Clone, PartialEq)]
pub struct TruckMove {
    pub from_station: String,
    pub to_station: String,
    pub bikes: u32,
    pub t_min: u32,
    pub truck_id: Option<String>,
    pub distance_km: Option<f64>,
}

/// Ordered sequence of moves, always sorted by `t_min` ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub moves: Vec<TruckMove>,
}

impl Plan {
    pub fn empty() -> Self {
        Self { moves: Vec::new() }
    }

    pub fn sort(&mut self) {
        self.moves.sort_by_key(|m| m.t_min);
    }
}

/// Output of the midnight allocator.
#[derive(Debug, Clone, PartialEq)]
pub struct MidnightAllocation {
    pub bikes_by_station: HashMap<String, u32>,
    pub capacity_by_station: HashMap<String, u32>,
    pub bucket_minutes: u32,
    pub total_bikes: u32,
    pub w_empty: f64,
    pub w_full: f64,
    pub empty_threshold: f64,
    pub full_threshold: f64,
    pub initial_cost: f64,
    pub final_cost: f64,
    pub moves_count: u32,
}

/// How time is labeled in exported per-bucket rows. Replaces the source's
/// stringly-typed `"t_min"` vs `"hour"` mode switch with a sum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLabel {
    SubHour { bucket_minutes: u32 },
    Hourly,
}

impl TimeLabel {
    pub fn for_bucket_minutes(bucket_minutes: u32) -> Self {
        if bucket_minutes == 60 {
            TimeLabel::Hourly
        } else {
            TimeLabel::SubHour { bucket_minutes }
        }
    }
}

/// One row of the per-bucket state table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationSnapshot {
    pub station: StationIdx,
    pub t_min: u32,
    pub bikes: u32,
    pub empty_docks: u32,
    pub capacity: u32,
}

/// Full result of running allocator + planner + simulator for one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResult {
    pub name: String,
    pub bucket_minutes: u32,
    pub time_label: TimeLabel,
    pub snapshots: Vec<StationSnapshot>,
    pub applied_moves: Vec<TruckMove>,
    pub planned_moves: Vec<TruckMove>,
}

/// Optional station→cluster assignment, used only as a cost-weighting key.
#[derive(Debug, Clone, Default)]
pub struct StationCluster {
    cluster_of: HashMap<String, u32>,
}

impl StationCluster {
    pub fn from_map(cluster_of: HashMap<String, u32>) -> Self {
        Self { cluster_of }
    }

    pub fn cluster_of(&self, station_id: &str) -> Option<u32> {
        self.cluster_of.get(station_id).copied()
    }
}
