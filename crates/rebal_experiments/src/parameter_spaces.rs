//! Pre-defined parameter space configurations for experimentation.
//!
//! Ready-to-use parameter space definitions for common sweep shapes, so
//! callers don't have to rebuild them from scratch for every run.

use crate::ParameterSpace;

/// Broad sweep across every tunable this crate exposes. Expensive — use
/// for an overnight run, not an interactive one.
pub fn comprehensive_space() -> ParameterSpace {
    ParameterSpace::grid()
        .bucket_minutes(vec![15, 30, 60])
        .total_bikes_ratio(vec![0.4, 0.5, 0.6, 0.7])
        .empty_threshold(vec![0.05, 0.10, 0.15])
        .full_threshold(vec![0.85, 0.90, 0.95])
        .w_bike_need(vec![0.5, 1.0, 1.5])
        .w_dock_need(vec![1.0, 1.4, 2.0])
        .lookahead_minutes(vec![90, 180, 300])
        .truck_cap(vec![10, 20, 30])
        .moves_budget(vec![10, 30, 60])
        .use_distance_penalty(vec![false, true])
}

/// Sweeps only the midnight allocator's fleet-size ratio, holding every
/// planner/simulator knob at its default.
pub fn fleet_size_space() -> ParameterSpace {
    ParameterSpace::grid().total_bikes_ratio(vec![0.35, 0.45, 0.55, 0.65, 0.75, 0.85])
}

/// Sweeps the planner's truck-move budget and per-trip capacity — the two
/// knobs that most directly trade operating cost against how flat the
/// day's station trajectories end up.
pub fn truck_fleet_space() -> ParameterSpace {
    ParameterSpace::grid()
        .moves_budget(vec![5, 10, 20, 40, 80])
        .truck_cap(vec![5, 10, 15, 20, 30])
}

/// Sweeps the threshold-cost shape: where "empty" and "full" start being
/// penalized, and how heavily.
pub fn threshold_shape_space() -> ParameterSpace {
    ParameterSpace::grid()
        .empty_threshold(vec![0.05, 0.10, 0.15, 0.20])
        .full_threshold(vec![0.80, 0.85, 0.90, 0.95])
}

/// Sweeps the buffer-shortage term's relative weighting of bike-need vs.
/// dock-need, and how far ahead it looks.
pub fn lookahead_balance_space() -> ParameterSpace {
    ParameterSpace::grid()
        .w_bike_need(vec![0.5, 1.0, 1.5, 2.0])
        .w_dock_need(vec![0.7, 1.4, 2.1])
        .lookahead_minutes(vec![60, 120, 180, 240])
}

/// Minimal space useful for smoke-testing the pipeline end to end.
pub fn minimal_space() -> ParameterSpace {
    ParameterSpace::grid()
        .truck_cap(vec![10, 20])
        .moves_budget(vec![20])
}
