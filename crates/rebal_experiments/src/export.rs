//! Result export and analysis utilities.
//!
//! Functions to export sweep results to Parquet, JSON, and CSV, and to find
//! the best-scoring parameter set out of a sweep.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::health::{calculate_health_scores, HealthWeights};
use crate::metrics::SimulationResult;
use crate::parameters::ParameterSet;

/// Export simulation results to Parquet format.
///
/// # Errors
///
/// Returns an error if `results` is empty, or if file creation or Parquet
/// writing fails.
pub fn export_to_parquet(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if results.is_empty() {
        return Err("no results to export".into());
    }

    let schema = Schema::new(vec![
        Field::new("initial_cost", DataType::Float64, false),
        Field::new("final_cost", DataType::Float64, false),
        Field::new("cost_reduction_ratio", DataType::Float64, false),
        Field::new("midnight_moves", DataType::UInt64, false),
        Field::new("planned_moves", DataType::UInt64, false),
        Field::new("applied_moves", DataType::UInt64, false),
        Field::new("applied_move_ratio", DataType::Float64, false),
        Field::new("bikes_planned", DataType::UInt64, false),
        Field::new("bikes_applied", DataType::UInt64, false),
        Field::new("avg_bikes_per_applied_move", DataType::Float64, false),
        Field::new("median_bikes_per_applied_move", DataType::Float64, false),
        Field::new("p90_bikes_per_applied_move", DataType::Float64, false),
        Field::new("stockout_bucket_count", DataType::UInt64, false),
        Field::new("full_dock_bucket_count", DataType::UInt64, false),
        Field::new("snapshot_count", DataType::UInt64, false),
    ]);

    let initial_cost: Vec<f64> = results.iter().map(|r| r.initial_cost).collect();
    let final_cost: Vec<f64> = results.iter().map(|r| r.final_cost).collect();
    let cost_reduction_ratio: Vec<f64> = results.iter().map(|r| r.cost_reduction_ratio).collect();
    let midnight_moves: Vec<u64> = results.iter().map(|r| r.midnight_moves as u64).collect();
    let planned_moves: Vec<u64> = results.iter().map(|r| r.planned_moves as u64).collect();
    let applied_moves: Vec<u64> = results.iter().map(|r| r.applied_moves as u64).collect();
    let applied_move_ratio: Vec<f64> = results.iter().map(|r| r.applied_move_ratio).collect();
    let bikes_planned: Vec<u64> = results.iter().map(|r| r.bikes_planned).collect();
    let bikes_applied: Vec<u64> = results.iter().map(|r| r.bikes_applied).collect();
    let avg_bikes_per_applied_move: Vec<f64> = results.iter().map(|r| r.avg_bikes_per_applied_move).collect();
    let median_bikes_per_applied_move: Vec<f64> = results.iter().map(|r| r.median_bikes_per_applied_move).collect();
    let p90_bikes_per_applied_move: Vec<f64> = results.iter().map(|r| r.p90_bikes_per_applied_move).collect();
    let stockout_bucket_count: Vec<u64> = results.iter().map(|r| r.stockout_bucket_count).collect();
    let full_dock_bucket_count: Vec<u64> = results.iter().map(|r| r.full_dock_bucket_count).collect();
    let snapshot_count: Vec<u64> = results.iter().map(|r| r.snapshot_count).collect();

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from(initial_cost)),
        Arc::new(Float64Array::from(final_cost)),
        Arc::new(Float64Array::from(cost_reduction_ratio)),
        Arc::new(UInt64Array::from(midnight_moves)),
        Arc::new(UInt64Array::from(planned_moves)),
        Arc::new(UInt64Array::from(applied_moves)),
        Arc::new(Float64Array::from(applied_move_ratio)),
        Arc::new(UInt64Array::from(bikes_planned)),
        Arc::new(UInt64Array::from(bikes_applied)),
        Arc::new(Float64Array::from(avg_bikes_per_applied_move)),
        Arc::new(Float64Array::from(median_bikes_per_applied_move)),
        Arc::new(Float64Array::from(p90_bikes_per_applied_move)),
        Arc::new(UInt64Array::from(stockout_bucket_count)),
        Arc::new(UInt64Array::from(full_dock_bucket_count)),
        Arc::new(UInt64Array::from(snapshot_count)),
    ];

    let batch = RecordBatch::try_new(Arc::new(schema), arrays)?;

    let file = File::create(path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

/// Export simulation results to JSON format, as an array of objects.
///
/// # Errors
///
/// Returns an error if file creation or JSON serialization fails.
pub fn export_to_json(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}

/// Export simulation results paired with their swept parameters to CSV.
///
/// `results[i]` must correspond to `parameter_sets[i]`.
///
/// # Errors
///
/// Returns an error if `results` is empty, if the lengths don't match, or
/// if file creation or CSV writing fails.
pub fn export_to_csv(
    results: &[SimulationResult],
    parameter_sets: &[ParameterSet],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if results.is_empty() {
        return Err("no results to export".into());
    }
    if results.len() != parameter_sets.len() {
        return Err(format!(
            "results length ({}) doesn't match parameter_sets length ({})",
            results.len(),
            parameter_sets.len()
        )
        .into());
    }

    let file = File::create(path)?;
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "experiment_id",
        "run_id",
        "bucket_minutes",
        "total_bikes_ratio",
        "empty_threshold",
        "full_threshold",
        "w_bike_need",
        "w_dock_need",
        "lookahead_minutes",
        "truck_cap",
        "moves_budget",
        "use_distance_penalty",
        "initial_cost",
        "final_cost",
        "cost_reduction_ratio",
        "midnight_moves",
        "planned_moves",
        "applied_moves",
        "applied_move_ratio",
        "bikes_planned",
        "bikes_applied",
        "avg_bikes_per_applied_move",
        "median_bikes_per_applied_move",
        "p90_bikes_per_applied_move",
        "stockout_bucket_count",
        "full_dock_bucket_count",
        "snapshot_count",
    ])?;

    for (result, param_set) in results.iter().zip(parameter_sets.iter()) {
        let cfg = &param_set.config;
        wtr.write_record([
            &param_set.experiment_id,
            &param_set.run_id.to_string(),
            &cfg.bucket_minutes_or_default().to_string(),
            &cfg.total_bikes_ratio.map(|v| v.to_string()).unwrap_or_default(),
            &cfg.empty_threshold.map(|v| v.to_string()).unwrap_or_default(),
            &cfg.full_threshold.map(|v| v.to_string()).unwrap_or_default(),
            &cfg.w_bike_need.map(|v| v.to_string()).unwrap_or_default(),
            &cfg.w_dock_need.map(|v| v.to_string()).unwrap_or_default(),
            &cfg.lookahead_minutes.map(|v| v.to_string()).unwrap_or_default(),
            &cfg.truck_cap.map(|v| v.to_string()).unwrap_or_default(),
            &cfg.moves_budget.map(|v| v.to_string()).unwrap_or_default(),
            &cfg.use_distance_penalty.map(|v| v.to_string()).unwrap_or_default(),
            &result.initial_cost.to_string(),
            &result.final_cost.to_string(),
            &result.cost_reduction_ratio.to_string(),
            &result.midnight_moves.to_string(),
            &result.planned_moves.to_string(),
            &result.applied_moves.to_string(),
            &result.applied_move_ratio.to_string(),
            &result.bikes_planned.to_string(),
            &result.bikes_applied.to_string(),
            &result.avg_bikes_per_applied_move.to_string(),
            &result.median_bikes_per_applied_move.to_string(),
            &result.p90_bikes_per_applied_move.to_string(),
            &result.stockout_bucket_count.to_string(),
            &result.full_dock_bucket_count.to_string(),
            &result.snapshot_count.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Find the parameter set with the highest health score.
///
/// Returns `None` if `results` is empty or its length doesn't match
/// `parameter_sets`.
pub fn find_best_parameters<'a>(
    results: &'a [SimulationResult],
    parameter_sets: &'a [ParameterSet],
    weights: &'a HealthWeights,
) -> Option<&'a ParameterSet> {
    if results.is_empty() || results.len() != parameter_sets.len() {
        return None;
    }

    let best_idx = find_best_result_index(results, weights)?;
    Some(&parameter_sets[best_idx])
}

/// Find the best result's index by health score (convenience function when
/// parameter sets aren't available).
pub fn find_best_result_index(results: &[SimulationResult], weights: &HealthWeights) -> Option<usize> {
    if results.is_empty() {
        return None;
    }

    let scores = calculate_health_scores(results, weights);
    scores
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebal_core::config::RebalConfig;
    use tempfile::NamedTempFile;

    fn sample_result(cost_reduction_ratio: f64) -> SimulationResult {
        SimulationResult {
            initial_cost: 100.0,
            final_cost: 100.0 * (1.0 - cost_reduction_ratio),
            cost_reduction_ratio,
            midnight_moves: 3,
            planned_moves: 10,
            applied_moves: 9,
            applied_move_ratio: 0.9,
            bikes_planned: 50,
            bikes_applied: 45,
            avg_bikes_per_applied_move: 5.0,
            median_bikes_per_applied_move: 5.0,
            p90_bikes_per_applied_move: 8.0,
            stockout_bucket_count: 2,
            full_dock_bucket_count: 1,
            snapshot_count: 96,
        }
    }

    #[test]
    fn export_to_json_writes_recognizable_fields() {
        let results = vec![sample_result(0.4)];
        let file = NamedTempFile::new().unwrap();
        export_to_json(&results, file.path()).unwrap();
        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.contains("cost_reduction_ratio"));
    }

    #[test]
    fn export_to_csv_rejects_length_mismatch() {
        let results = vec![sample_result(0.4), sample_result(0.5)];
        let sets = vec![ParameterSet::new(RebalConfig::default(), "a".into(), 0)];
        let file = NamedTempFile::new().unwrap();
        assert!(export_to_csv(&results, &sets, file.path()).is_err());
    }

    #[test]
    fn find_best_result_index_prefers_higher_cost_reduction() {
        let results = vec![sample_result(0.2), sample_result(0.6)];
        let weights = HealthWeights::default();
        let best_idx = find_best_result_index(&results, &weights).unwrap();
        assert_eq!(best_idx, 1);
    }
}
