//! Rebalancing health score calculation.
//!
//! Combines cost reduction, move adherence, and stockout/full-dock
//! incidence into a single weighted score so a sweep's results can be
//! ranked without eyeballing every field of `SimulationResult`.

use crate::metrics::SimulationResult;

/// Configurable weights for the rebalancing health score.
///
/// # Default Weights
///
/// - Cost reduction: 0.4 (40%)
/// - Applied-move ratio: 0.2 (20%)
/// - Stockout rate: -0.2 (20% penalty, lower is better)
/// - Full-dock rate: -0.2 (20% penalty, lower is better)
#[derive(Debug, Clone, Copy)]
pub struct HealthWeights {
    /// Weight for cost reduction ratio (higher is better).
    pub cost_reduction_weight: f64,
    /// Weight for the fraction of planned moves actually applied (higher
    /// is better).
    pub applied_move_weight: f64,
    /// Penalty weight for the stockout rate (negative — lower is better).
    pub stockout_penalty: f64,
    /// Penalty weight for the full-dock rate (negative — lower is better).
    pub full_dock_penalty: f64,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            cost_reduction_weight: 0.4,
            applied_move_weight: 0.2,
            stockout_penalty: -0.2,
            full_dock_penalty: -0.2,
        }
    }
}

impl HealthWeights {
    pub fn new(
        cost_reduction_weight: f64,
        applied_move_weight: f64,
        stockout_penalty: f64,
        full_dock_penalty: f64,
    ) -> Self {
        Self {
            cost_reduction_weight,
            applied_move_weight,
            stockout_penalty,
            full_dock_penalty,
        }
    }
}

/// Normalize a metric value to [0, 1] using min-max scaling. Returns 0.5
/// when `min == max` (no variation to rank on).
fn normalize_metric(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        0.5
    } else {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    }
}

fn stockout_rate(result: &SimulationResult) -> f64 {
    if result.snapshot_count == 0 {
        0.0
    } else {
        result.stockout_bucket_count as f64 / result.snapshot_count as f64
    }
}

fn full_dock_rate(result: &SimulationResult) -> f64 {
    if result.snapshot_count == 0 {
        0.0
    } else {
        result.full_dock_bucket_count as f64 / result.snapshot_count as f64
    }
}

/// Calculate health scores for all results in a sweep.
///
/// Normalizes each component metric across the whole result set, then
/// combines them with `weights`. Higher scores are healthier.
pub fn calculate_health_scores(results: &[SimulationResult], weights: &HealthWeights) -> Vec<f64> {
    if results.is_empty() {
        return vec![];
    }

    let (cost_min, cost_max) = results
        .iter()
        .map(|r| r.cost_reduction_ratio)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| (min.min(v), max.max(v)));

    let (applied_min, applied_max) = results
        .iter()
        .map(|r| r.applied_move_ratio)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| (min.min(v), max.max(v)));

    let (stockout_min, stockout_max) = results
        .iter()
        .map(stockout_rate)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| (min.min(v), max.max(v)));

    let (full_dock_min, full_dock_max) = results
        .iter()
        .map(full_dock_rate)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| (min.min(v), max.max(v)));

    results
        .iter()
        .map(|result| {
            let cost_norm = normalize_metric(result.cost_reduction_ratio, cost_min, cost_max);
            let applied_norm = normalize_metric(result.applied_move_ratio, applied_min, applied_max);
            let stockout_norm = 1.0 - normalize_metric(stockout_rate(result), stockout_min, stockout_max);
            let full_dock_norm = 1.0 - normalize_metric(full_dock_rate(result), full_dock_min, full_dock_max);

            cost_norm * weights.cost_reduction_weight
                + applied_norm * weights.applied_move_weight
                + stockout_norm * weights.stockout_penalty
                + full_dock_norm * weights.full_dock_penalty
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(cost_reduction_ratio: f64, applied_move_ratio: f64, stockout: u64, full_dock: u64, snapshots: u64) -> SimulationResult {
        SimulationResult {
            initial_cost: 100.0,
            final_cost: 100.0 * (1.0 - cost_reduction_ratio),
            cost_reduction_ratio,
            midnight_moves: 0,
            planned_moves: 1,
            applied_moves: 1,
            applied_move_ratio,
            bikes_planned: 5,
            bikes_applied: 5,
            avg_bikes_per_applied_move: 5.0,
            median_bikes_per_applied_move: 5.0,
            p90_bikes_per_applied_move: 5.0,
            stockout_bucket_count: stockout,
            full_dock_bucket_count: full_dock,
            snapshot_count: snapshots,
        }
    }

    #[test]
    fn normalize_metric_basic_cases() {
        assert_eq!(normalize_metric(50.0, 0.0, 100.0), 0.5);
        assert_eq!(normalize_metric(0.0, 0.0, 100.0), 0.0);
        assert_eq!(normalize_metric(100.0, 0.0, 100.0), 1.0);
        assert_eq!(normalize_metric(50.0, 50.0, 50.0), 0.5);
    }

    #[test]
    fn healthier_run_scores_higher() {
        let results = vec![
            result(0.3, 0.6, 40, 40, 100),
            result(0.6, 1.0, 5, 5, 100),
        ];
        let scores = calculate_health_scores(&results, &HealthWeights::default());
        assert_eq!(scores.len(), 2);
        assert!(scores[1] > scores[0]);
    }

    #[test]
    fn empty_results_yield_no_scores() {
        let scores = calculate_health_scores(&[], &HealthWeights::default());
        assert!(scores.is_empty());
    }
}
