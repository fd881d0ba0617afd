//! Bike-share rebalancing planning and simulation engine.
//!
//! This crate computes where a fleet's bikes should start the day
//! (the midnight allocator), which truck moves to schedule during service
//! hours to keep stations from running empty or full (the day planner),
//! and replays those moves against the actual ride events of a day to see
//! what happened (the day simulator).
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`types`]: the dense station arena and shared value types
//! - [`bucketize`]: turns raw trips into per-station, per-bucket pickup/dropoff counts
//! - [`trajectory`]: the bike-count recurrence used by both planner and allocator
//! - [`cost`]: the per-station, per-bucket stress cost function
//! - [`midnight`]: the greedy starting-allocation optimizer
//! - [`planner`]: the greedy day planner that selects truck moves
//! - [`simulate`]: the bucketed day simulator that replays moves against real events
//! - [`config`]: the all-optional configuration surface and its defaults
//! - [`io`]: loaders for station registries, trip logs, and cluster assignments
//! - [`geo`]: haversine distance between stations
//! - [`error`]: the crate's error taxonomy
//!
//! # Quick Start
//!
//! ```no_run
//! use chrono::NaiveDateTime;
//! use rebal_core::config::RebalConfig;
//! use rebal_core::io::{stations::load_station_registry, trips::load_trips};
//! use rebal_core::bucketize::{bucketize_trips, parse_mm_dd_yyyy_hh_mm};
//!
//! let registry = load_station_registry("station_information.json").unwrap();
//! let trips = load_trips("trips.csv").unwrap();
//! let cfg = RebalConfig::default();
//! let bucket = cfg.bucket().unwrap();
//! let day_start = NaiveDateTime::parse_from_str("01/01/2024 00:00", "%m/%d/%Y %H:%M").unwrap();
//! let day = bucketize_trips(&trips, &registry, day_start, bucket, parse_mm_dd_yyyy_hh_mm);
//! let total_bikes = cfg.resolve_total_bikes(registry.total_capacity());
//! let allocation = cfg.midnight_allocator().unwrap().allocate_for_day(&registry, &day, total_bikes);
//! ```

pub mod bucketize;
pub mod config;
pub mod cost;
pub mod error;
pub mod geo;
pub mod io;
pub mod midnight;
pub mod planner;
pub mod simulate;
pub mod trajectory;
pub mod types;

pub use config::RebalConfig;
pub use error::{RebalError, Result};
