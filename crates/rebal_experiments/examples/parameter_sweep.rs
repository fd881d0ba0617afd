//! Example: sweep planner/allocator parameters and rank results.
//!
//! This example demonstrates how to:
//! 1. Build a shared dataset (stations, bucketized trips, event stream)
//! 2. Define a parameter space (grid search)
//! 3. Run every combination in parallel
//! 4. Calculate health scores and find the best configuration
//! 5. Export results to JSON/Parquet/CSV

use rebal_core::bucketize::{bucketize_trips, parse_mm_dd_yyyy_hh_mm, TripRecord};
use rebal_core::simulate::build_event_stream;
use rebal_core::types::{Station, StationRegistry};
use rebal_experiments::parameter_spaces::truck_fleet_space;
use rebal_experiments::{
    export_to_csv, export_to_json, export_to_parquet, find_best_parameters, find_best_result_index,
    run_parallel_experiments, Dataset, HealthWeights,
};

fn synthetic_registry(n: usize) -> StationRegistry {
    let stations = (0..n)
        .map(|i| Station {
            station_id: format!("S{i:03}"),
            capacity: 12 + (i % 5) as u32 * 4,
            lat: 43.64 + (i as f64) * 0.004,
            lon: -79.40 + (i as f64 % 7.0) * 0.006,
        })
        .collect();
    StationRegistry::from_stations(stations)
}

/// Evenly spreads trips across the day between half the stations (the
/// "residential" half) and the other half (the "downtown" half) so the
/// swept truck-fleet parameters have real rebalancing work to trade off.
fn synthetic_trips(registry: &StationRegistry, count: usize) -> Vec<TripRecord> {
    let n = registry.len();
    let mut trips = Vec::with_capacity(count);
    for i in 0..count {
        let hour = 6 + (i % 14);
        let minute = (i * 7) % 60;
        let from = i % (n / 2);
        let to = n / 2 + (i % (n - n / 2));
        trips.push(TripRecord {
            start_time: format!("01/01/2024 {hour:02}:{minute:02}"),
            end_time: format!("01/01/2024 {:02}:{:02}", hour + 1, (minute + 15) % 60),
            start_station_id: registry.station_id(rebal_core::types::StationIdx(from)).to_string(),
            end_station_id: registry.station_id(rebal_core::types::StationIdx(to)).to_string(),
        });
    }
    trips
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Starting parameter sweep experiment...");

    let registry = synthetic_registry(30);
    let trips = synthetic_trips(&registry, 4_000);
    let day_start = chrono::NaiveDateTime::parse_from_str("01/01/2024 00:00", "%m/%d/%Y %H:%M").unwrap();
    let bucket = rebal_core::config::RebalConfig::default().bucket().unwrap();
    let day = bucketize_trips(&trips, &registry, day_start, bucket, parse_mm_dd_yyyy_hh_mm);
    let events = build_event_stream(&trips, &registry, day_start, parse_mm_dd_yyyy_hh_mm);
    let dataset = Dataset::new(&registry, &day, &events);

    println!("Generating parameter sets...");
    let space = truck_fleet_space();
    let parameter_sets = space.generate();
    println!("Generated {} parameter combinations", parameter_sets.len());

    println!("Running simulations in parallel...");
    let results = run_parallel_experiments(&dataset, &parameter_sets, None);
    println!("Completed {} simulations", results.len());

    println!("Calculating health scores...");
    let weights = HealthWeights::default();
    let best_idx = find_best_result_index(&results, &weights).expect("no results to analyze");

    println!("\n=== Best Configuration ===");
    let best_result = &results[best_idx];
    println!("Cost reduction: {:.1}%", best_result.cost_reduction_ratio * 100.0);
    println!("Applied move ratio: {:.1}%", best_result.applied_move_ratio * 100.0);
    println!("Stockout buckets: {}", best_result.stockout_bucket_count);
    println!("Full-dock buckets: {}", best_result.full_dock_bucket_count);

    if let Some(best_params) = find_best_parameters(&results, &parameter_sets, &weights) {
        println!("\n=== Best Parameters ===");
        println!("truck_cap: {:?}", best_params.config.truck_cap);
        println!("moves_budget: {:?}", best_params.config.moves_budget);
    }

    println!("\nExporting results...");
    export_to_json(&results, "experiment_results.json")?;
    println!("Exported to experiment_results.json");

    export_to_csv(&results, &parameter_sets, "experiment_results.csv")?;
    println!("Exported to experiment_results.csv");

    export_to_parquet(&results, "experiment_results.parquet")?;
    println!("Exported to experiment_results.parquet");

    println!("\nExperiment complete!");

    Ok(())
}
