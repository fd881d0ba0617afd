//! Metrics extraction from completed rebalancing runs.
//!
//! Pulls the midnight allocator's own before/after cost bookkeeping
//! together with the day simulator's replay to compute move-adherence
//! and stockout/full-dock statistics.

use rebal_core::simulate::Replay;
use rebal_core::types::{MidnightAllocation, Plan};

/// Aggregated metrics from a single end-to-end rebalancing run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SimulationResult {
    /// Total station cost at midnight, before any moves.
    pub initial_cost: f64,
    /// Total station cost after the midnight allocator's swaps.
    pub final_cost: f64,
    /// `(initial_cost - final_cost) / initial_cost`, or 0 if `initial_cost`
    /// is 0.
    pub cost_reduction_ratio: f64,
    /// Moves the midnight allocator made to reach `final_cost`.
    pub midnight_moves: u32,
    /// Moves the day planner scheduled.
    pub planned_moves: usize,
    /// Of those, how many the simulator actually applied (some are dropped
    /// for infeasibility or an hourly cap).
    pub applied_moves: usize,
    /// `applied_moves / planned_moves`, or 1.0 if nothing was planned.
    pub applied_move_ratio: f64,
    /// Sum of bikes across all planned moves.
    pub bikes_planned: u64,
    /// Sum of bikes across all applied moves.
    pub bikes_applied: u64,
    /// Average bikes per applied move.
    pub avg_bikes_per_applied_move: f64,
    /// Median bikes per applied move.
    pub median_bikes_per_applied_move: f64,
    /// P90 bikes per applied move.
    pub p90_bikes_per_applied_move: f64,
    /// Per-bucket station snapshots with zero bikes.
    pub stockout_bucket_count: u64,
    /// Per-bucket station snapshots with zero empty docks.
    pub full_dock_bucket_count: u64,
    /// Total snapshot rows examined (stations × buckets).
    pub snapshot_count: u64,
}

fn calculate_stats(values: &[u64]) -> (f64, f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let avg = sorted.iter().sum::<u64>() as f64 / sorted.len() as f64;
    let median = if sorted.len() % 2 == 0 {
        (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) as f64 / 2.0
    } else {
        sorted[sorted.len() / 2] as f64
    };
    let p90_idx = ((sorted.len() - 1) as f64 * 0.9) as usize;
    let p90 = sorted[p90_idx.min(sorted.len() - 1)] as f64;

    (avg, median, p90)
}

/// Extract metrics from one allocator/planner/simulator run.
pub fn extract_metrics(allocation: &MidnightAllocation, plan: &Plan, replay: &Replay) -> SimulationResult {
    let cost_reduction_ratio = if allocation.initial_cost > 0.0 {
        (allocation.initial_cost - allocation.final_cost) / allocation.initial_cost
    } else {
        0.0
    };

    let bikes_planned: u64 = plan.moves.iter().map(|m| m.bikes as u64).sum();
    let applied_bike_values: Vec<u64> = replay.applied_moves.iter().map(|m| m.bikes as u64).collect();
    let bikes_applied: u64 = applied_bike_values.iter().sum();
    let (avg_bikes, median_bikes, p90_bikes) = calculate_stats(&applied_bike_values);

    let applied_move_ratio = if plan.moves.is_empty() {
        1.0
    } else {
        replay.applied_moves.len() as f64 / plan.moves.len() as f64
    };

    let stockout_bucket_count = replay.snapshots.iter().filter(|s| s.bikes == 0).count() as u64;
    let full_dock_bucket_count = replay.snapshots.iter().filter(|s| s.empty_docks == 0).count() as u64;

    SimulationResult {
        initial_cost: allocation.initial_cost,
        final_cost: allocation.final_cost,
        cost_reduction_ratio,
        midnight_moves: allocation.moves_count,
        planned_moves: plan.moves.len(),
        applied_moves: replay.applied_moves.len(),
        applied_move_ratio,
        bikes_planned,
        bikes_applied,
        avg_bikes_per_applied_move: avg_bikes,
        median_bikes_per_applied_move: median_bikes,
        p90_bikes_per_applied_move: p90_bikes,
        stockout_bucket_count,
        full_dock_bucket_count,
        snapshot_count: replay.snapshots.len() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculate_stats_matches_textbook_percentiles() {
        let values = vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100];
        let (avg, median, p90) = calculate_stats(&values);
        assert_eq!(avg, 55.0);
        assert_eq!(median, 55.0);
        assert_eq!(p90, 90.0);
    }

    #[test]
    fn calculate_stats_empty_is_zero() {
        let (avg, median, p90) = calculate_stats(&[]);
        assert_eq!(avg, 0.0);
        assert_eq!(median, 0.0);
        assert_eq!(p90, 0.0);
    }

    #[test]
    fn applied_ratio_is_one_when_nothing_planned() {
        use rebal_core::types::Plan;
        let allocation = MidnightAllocation {
            bikes_by_station: Default::default(),
            capacity_by_station: Default::default(),
            bucket_minutes: 15,
            total_bikes: 0,
            w_empty: 1.0,
            w_full: 1.0,
            empty_threshold: 0.10,
            full_threshold: 0.90,
            initial_cost: 0.0,
            final_cost: 0.0,
            moves_count: 0,
        };
        let plan = Plan::empty();
        let replay = Replay {
            snapshots: vec![],
            applied_moves: vec![],
        };
        let metrics = extract_metrics(&allocation, &plan, &replay);
        assert_eq!(metrics.applied_move_ratio, 1.0);
        assert_eq!(metrics.cost_reduction_ratio, 0.0);
    }
}
