//! Parallel pipeline execution using rayon.
//!
//! A sweep shares one dataset (station registry, bucketized day, event
//! stream, optional cluster assignments) across every `ParameterSet`; only
//! the config varies per run. This module provides the single-run pipeline
//! (allocate → plan → replay → extract metrics) and a rayon-parallel runner
//! over a batch of parameter sets.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use rebal_core::bucketize::BucketizedDay;
use rebal_core::cost::{ClusterHourWeights, UnitWeights};
use rebal_core::error::RebalError;
use rebal_core::planner::plan_for_day;
use rebal_core::simulate::{DaySimulator, TripEvent};
use rebal_core::types::{StationCluster, StationRegistry};

use crate::metrics::{extract_metrics, SimulationResult};
use crate::parameters::ParameterSet;

/// The inputs every run in a sweep shares; only `RebalConfig` varies across
/// `ParameterSet`s run against the same dataset.
pub struct Dataset<'a> {
    pub registry: &'a StationRegistry,
    pub day: &'a BucketizedDay,
    pub events: &'a [TripEvent],
    pub clusters: Option<&'a StationCluster>,
    pub cluster_weights: &'a dyn ClusterHourWeights,
}

impl<'a> Dataset<'a> {
    /// Convenience constructor for a dataset with no cluster weighting.
    pub fn new(registry: &'a StationRegistry, day: &'a BucketizedDay, events: &'a [TripEvent]) -> Self {
        Self {
            registry,
            day,
            events,
            clusters: None,
            cluster_weights: &UnitWeights,
        }
    }
}

/// Runs one parameter set's full pipeline against `dataset`: midnight
/// allocation, day planning, and replay, then extracts metrics from the
/// result.
pub fn run_single_simulation(dataset: &Dataset, param_set: &ParameterSet) -> Result<SimulationResult, RebalError> {
    let cfg = &param_set.config;

    let total_bikes = cfg.resolve_total_bikes(dataset.registry.total_capacity());
    let allocator = cfg.midnight_allocator()?;
    let allocation = allocator.allocate_for_day(dataset.registry, dataset.day, total_bikes);

    let x0: Vec<u32> = dataset
        .registry
        .iter_idx()
        .map(|idx| {
            *allocation
                .bikes_by_station
                .get(dataset.registry.station_id(idx))
                .unwrap_or(&0)
        })
        .collect();

    let planner_cfg = cfg.planner_config()?;
    let plan = plan_for_day(
        &planner_cfg,
        dataset.registry,
        dataset.day,
        &x0,
        dataset.clusters,
        dataset.cluster_weights,
    )?;

    let simulator = DaySimulator {
        bucket: dataset.day.bucket,
        donor_min_bikes_left: cfg.donor_min_bikes_left,
        receiver_min_empty_docks_left: cfg.receiver_min_empty_docks_left,
        moves_per_hour: cfg.moves_per_hour,
    };
    let replay = simulator.replay(dataset.registry, &x0, dataset.events, &plan);

    Ok(extract_metrics(&allocation, &plan, &replay))
}

/// Run multiple parameter sets in parallel against the same dataset.
///
/// Uses rayon to execute runs concurrently across available CPU cores. A
/// run that fails (e.g. an invalid service window) is dropped from the
/// output rather than aborting the whole sweep.
pub fn run_parallel_experiments(
    dataset: &Dataset,
    parameter_sets: &[ParameterSet],
    num_threads: Option<usize>,
) -> Vec<SimulationResult> {
    run_parallel_experiments_with_progress(dataset, parameter_sets, num_threads, true)
}

/// Run multiple parameter sets in parallel with optional progress bar.
pub fn run_parallel_experiments_with_progress(
    dataset: &Dataset,
    parameter_sets: &[ParameterSet],
    num_threads: Option<usize>,
    show_progress: bool,
) -> Vec<SimulationResult> {
    let total = parameter_sets.len();
    let pb = if show_progress && total > 0 {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(bar)
    } else {
        None
    };

    let pool = if let Some(threads) = num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .expect("failed to create thread pool")
    } else {
        rayon::ThreadPoolBuilder::new()
            .build()
            .expect("failed to create thread pool")
    };

    let pb_clone = pb.clone();
    let results = pool.install(|| {
        parameter_sets
            .par_iter()
            .filter_map(|param_set| {
                let result = run_single_simulation(dataset, param_set).ok();
                if let Some(ref progress_bar) = pb_clone {
                    progress_bar.inc(1);
                }
                result
            })
            .collect()
    });

    if let Some(ref progress_bar) = pb {
        progress_bar.finish_with_message("done");
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebal_core::bucketize::{bucketize_trips, parse_mm_dd_yyyy_hh_mm, TripRecord};
    use rebal_core::config::RebalConfig;
    use rebal_core::simulate::build_event_stream;
    use rebal_core::types::Station;

    fn small_registry() -> StationRegistry {
        StationRegistry::from_stations(vec![
            Station { station_id: "A".into(), capacity: 20, lat: 0.0, lon: 0.0 },
            Station { station_id: "B".into(), capacity: 20, lat: 0.0, lon: 0.01 },
        ])
    }

    fn small_trips() -> Vec<TripRecord> {
        vec![TripRecord {
            start_time: "01/01/2024 08:00".into(),
            end_time: "01/01/2024 08:20".into(),
            start_station_id: "A".into(),
            end_station_id: "B".into(),
        }]
    }

    #[test]
    fn single_run_produces_plausible_metrics() {
        let registry = small_registry();
        let trips = small_trips();
        let cfg = RebalConfig::default();
        let bucket = cfg.bucket().unwrap();
        let day_start = chrono::NaiveDateTime::parse_from_str("01/01/2024 00:00", "%m/%d/%Y %H:%M").unwrap();
        let day = bucketize_trips(&trips, &registry, day_start, bucket, parse_mm_dd_yyyy_hh_mm);
        let events = build_event_stream(&trips, &registry, day_start, parse_mm_dd_yyyy_hh_mm);

        let dataset = Dataset::new(&registry, &day, &events);
        let param_set = ParameterSet::new(cfg, "test".into(), 0);
        let result = run_single_simulation(&dataset, &param_set).unwrap();

        assert!(result.snapshot_count > 0);
        assert!(result.initial_cost >= 0.0);
    }

    #[test]
    fn parallel_run_matches_sequential_count() {
        let registry = small_registry();
        let trips = small_trips();
        let cfg = RebalConfig::default();
        let bucket = cfg.bucket().unwrap();
        let day_start = chrono::NaiveDateTime::parse_from_str("01/01/2024 00:00", "%m/%d/%Y %H:%M").unwrap();
        let day = bucketize_trips(&trips, &registry, day_start, bucket, parse_mm_dd_yyyy_hh_mm);
        let events = build_event_stream(&trips, &registry, day_start, parse_mm_dd_yyyy_hh_mm);
        let dataset = Dataset::new(&registry, &day, &events);

        let sets = vec![
            ParameterSet::new(RebalConfig::default().with_truck_cap(10), "a".into(), 0),
            ParameterSet::new(RebalConfig::default().with_truck_cap(20), "b".into(), 0),
        ];
        let results = run_parallel_experiments_with_progress(&dataset, &sets, Some(2), false);
        assert_eq!(results.len(), 2);
    }
}
