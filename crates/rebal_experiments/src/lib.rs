//! Parameter sweeps over the bike-share rebalancing pipeline.
//!
//! This crate runs the allocator/planner/simulator pipeline across many
//! `RebalConfig` variations in parallel, extracts comparable metrics from
//! each run, and scores them with a composite rebalancing-health metric.
//!
//! # Quick Start
//!
//! ```no_run
//! use chrono::NaiveDateTime;
//! use rebal_core::bucketize::{bucketize_trips, parse_mm_dd_yyyy_hh_mm};
//! use rebal_core::io::{stations::load_station_registry, trips::load_trips};
//! use rebal_core::config::RebalConfig;
//! use rebal_core::simulate::build_event_stream;
//! use rebal_experiments::{Dataset, ParameterSpace, run_parallel_experiments, HealthWeights, find_best_result_index};
//!
//! let registry = load_station_registry("station_information.json").unwrap();
//! let trips = load_trips("trips.csv").unwrap();
//! let day_start = NaiveDateTime::parse_from_str("01/01/2024 00:00", "%m/%d/%Y %H:%M").unwrap();
//! let bucket = RebalConfig::default().bucket().unwrap();
//! let day = bucketize_trips(&trips, &registry, day_start, bucket, parse_mm_dd_yyyy_hh_mm);
//! let events = build_event_stream(&trips, &registry, day_start, parse_mm_dd_yyyy_hh_mm);
//! let dataset = Dataset::new(&registry, &day, &events);
//!
//! // Define a parameter space (grid search)
//! let space = ParameterSpace::grid()
//!     .truck_cap(vec![10, 20, 30])
//!     .moves_budget(vec![20, 40]);
//!
//! // Generate parameter sets and run them in parallel
//! let parameter_sets = space.generate();
//! let results = run_parallel_experiments(&dataset, &parameter_sets, None);
//!
//! // Calculate health scores and find the best result
//! let weights = HealthWeights::default();
//! let best_idx = find_best_result_index(&results, &weights).unwrap();
//! ```
//!
//! # Architecture
//!
//! - [`parameters`]: parameter variation framework (grid search, random sampling)
//! - [`parameter_spaces`]: pre-defined sweep shapes for common questions
//! - [`runner`]: the shared dataset and parallel pipeline runner
//! - [`metrics`]: metrics extraction from a completed run
//! - [`health`]: rebalancing health score calculation
//! - [`export`]: result export to Parquet/JSON/CSV

pub mod export;
pub mod health;
pub mod metrics;
pub mod parameter_spaces;
pub mod parameters;
pub mod runner;

pub use export::{export_to_csv, export_to_json, export_to_parquet, find_best_parameters, find_best_result_index};
pub use health::{calculate_health_scores, HealthWeights};
pub use metrics::SimulationResult;
pub use parameters::{ParameterSet, ParameterSpace};
pub use runner::{run_parallel_experiments, Dataset};
