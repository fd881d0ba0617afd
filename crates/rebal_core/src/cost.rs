//! Component C: the station cost kernel. Threshold-depth cost and
//! buffer-shortage cost are composed additively per independently
//! configurable weights — the source's two divergent cost definitions are
//! exposed as composable terms rather than a single hardcoded choice.

/// Weights and thresholds shared by every cost evaluation in one scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostWeights {
    pub w_empty: f64,
    pub w_full: f64,
    pub empty_threshold: f64,
    pub full_threshold: f64,
    pub w_bike_need: f64,
    pub w_dock_need: f64,
    pub pickup_buffer_mult: f64,
    pub dropoff_buffer_mult: f64,
    pub lookahead_buckets: usize,
}

impl CostWeights {
    pub fn empty_thr(&self, capacity: u32) -> f64 {
        self.empty_threshold * capacity as f64
    }

    pub fn full_thr(&self, capacity: u32) -> f64 {
        self.full_threshold * capacity as f64
    }
}

/// Cluster-and-hour multiplier lookup for the buffer-shortage term. Default
/// is 1.0 everywhere; concrete policies (commuter inbound, residential
/// outbound, nightlife) implement this to elevate specific cluster/hour
/// combinations.
pub trait ClusterHourWeights: Send + Sync {
    fn bike_multiplier(&self, cluster: Option<u32>, hour: u32) -> f64;
    fn dock_multiplier(&self, cluster: Option<u32>, hour: u32) -> f64;
}

/// The default multiplier table: 1.0 for every cluster and hour.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitWeights;

impl ClusterHourWeights for UnitWeights {
    fn bike_multiplier(&self, _cluster: Option<u32>, _hour: u32) -> f64 {
        1.0
    }

    fn dock_multiplier(&self, _cluster: Option<u32>, _hour: u32) -> f64 {
        1.0
    }
}

/// A sparse override table keyed by `(cluster_id, hour)`, falling back to
/// 1.0 for anything not listed.
#[derive(Debug, Clone, Default)]
pub struct ClusterHourTable {
    bike: std::collections::HashMap<(u32, u32), f64>,
    dock: std::collections::HashMap<(u32, u32), f64>,
}

impl ClusterHourTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bike_multiplier(&mut self, cluster: u32, hour: u32, mult: f64) {
        self.bike.insert((cluster, hour), mult);
    }

    pub fn set_dock_multiplier(&mut self, cluster: u32, hour: u32, mult: f64) {
        self.dock.insert((cluster, hour), mult);
    }
}

impl ClusterHourWeights for ClusterHourTable {
    fn bike_multiplier(&self, cluster: Option<u32>, hour: u32) -> f64 {
        cluster
            .and_then(|c| self.bike.get(&(c, hour)))
            .copied()
            .unwrap_or(1.0)
    }

    fn dock_multiplier(&self, cluster: Option<u32>, hour: u32) -> f64 {
        cluster
            .and_then(|c| self.dock.get(&(c, hour)))
            .copied()
            .unwrap_or(1.0)
    }
}

/// Sum over `pickups[b..min(B,b+L))`.
pub fn future_sum(series: &[u32], b: usize, lookahead: usize) -> u64 {
    let end = (b + lookahead).min(series.len());
    series[b..end].iter().map(|&v| v as u64).sum()
}

fn hour_of_bucket(b: usize, bucket_minutes: u32) -> u32 {
    ((b as u32 * bucket_minutes) / 60) % 24
}

/// `Σ max(0, empty_thr - x[b]) * w_empty + max(0, x[b] - full_thr) * w_full`
/// over `b0..B`.
pub fn threshold_cost(trajectory: &[u32], capacity: u32, start_b: usize, w: &CostWeights) -> f64 {
    if capacity == 0 {
        return 0.0;
    }
    let empty_thr = w.empty_thr(capacity);
    let full_thr = w.full_thr(capacity);
    trajectory[start_b..]
        .iter()
        .map(|&x| {
            let x = x as f64;
            w.w_empty * (empty_thr - x).max(0.0) + w.w_full * (x - full_thr).max(0.0)
        })
        .sum()
}

/// Forward-looking buffer-shortage cost, weighted by cluster/hour
/// multipliers, over `b0..B`.
#[allow(clippy::too_many_arguments)]
pub fn buffer_shortage_cost(
    trajectory: &[u32],
    capacity: u32,
    pickups: &[u32],
    dropoffs: &[u32],
    start_b: usize,
    w: &CostWeights,
    bucket_minutes: u32,
    cluster: Option<u32>,
    cluster_weights: &dyn ClusterHourWeights,
) -> f64 {
    if capacity == 0 {
        return 0.0;
    }
    let cap = capacity as f64;
    let mut total = 0.0;
    for b in start_b..trajectory.len() {
        let x = trajectory[b] as f64;
        let fut_pu = future_sum(pickups, b, w.lookahead_buckets) as f64;
        let fut_do = future_sum(dropoffs, b, w.lookahead_buckets) as f64;
        let bike_short = (w.pickup_buffer_mult * fut_pu - x).max(0.0);
        let dock_short = (w.dropoff_buffer_mult * fut_do - (cap - x)).max(0.0);
        let hour = hour_of_bucket(b, bucket_minutes);
        total += w.w_bike_need * cluster_weights.bike_multiplier(cluster, hour) * bike_short
            + w.w_dock_need * cluster_weights.dock_multiplier(cluster, hour) * dock_short;
    }
    total
}

/// Total station cost from `b0` to end of day: `cost_thr + cost_buf`.
#[allow(clippy::too_many_arguments)]
pub fn station_cost(
    trajectory: &[u32],
    capacity: u32,
    pickups: &[u32],
    dropoffs: &[u32],
    start_b: usize,
    w: &CostWeights,
    bucket_minutes: u32,
    cluster: Option<u32>,
    cluster_weights: &dyn ClusterHourWeights,
) -> f64 {
    threshold_cost(trajectory, capacity, start_b, w)
        + buffer_shortage_cost(
            trajectory,
            capacity,
            pickups,
            dropoffs,
            start_b,
            w,
            bucket_minutes,
            cluster,
            cluster_weights,
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> CostWeights {
        CostWeights {
            w_empty: 1.0,
            w_full: 1.0,
            empty_threshold: 0.10,
            full_threshold: 0.90,
            w_bike_need: 1.0,
            w_dock_need: 1.4,
            pickup_buffer_mult: 1.0,
            dropoff_buffer_mult: 1.0,
            lookahead_buckets: 4,
        }
    }

    #[test]
    fn capacity_zero_is_always_free() {
        let traj = [0u32; 4];
        assert_eq!(threshold_cost(&traj, 0, 0, &weights()), 0.0);
        assert_eq!(
            buffer_shortage_cost(&traj, 0, &[0; 4], &[0; 4], 0, &weights(), 15, None, &UnitWeights),
            0.0
        );
    }

    #[test]
    fn threshold_cost_penalizes_empty_and_full() {
        let w = weights();
        let traj = [0u32, 10, 5];
        let cost = threshold_cost(&traj, 10, 0, &w);
        // bucket 0: empty_thr=1.0, x=0 -> depth 1.0
        // bucket 1: full_thr=9.0, x=10 -> depth 1.0
        // bucket 2: x=5, within both thresholds -> 0
        assert!((cost - 2.0).abs() < 1e-9);
    }

    #[test]
    fn kernel_is_evaluable_from_an_arbitrary_prefix() {
        let w = weights();
        let traj = [0u32, 10, 5, 0];
        let full = threshold_cost(&traj, 10, 0, &w);
        let tail = threshold_cost(&traj, 10, 2, &w);
        let prefix = threshold_cost(&traj[..2], 10, 0, &w);
        assert!((full - (prefix + tail)).abs() < 1e-9);
    }

    #[test]
    fn cluster_hour_table_overrides_only_listed_entries() {
        let mut t = ClusterHourTable::new();
        t.set_dock_multiplier(1, 8, 2.5);
        assert_eq!(t.dock_multiplier(Some(1), 8), 2.5);
        assert_eq!(t.dock_multiplier(Some(1), 9), 1.0);
        assert_eq!(t.dock_multiplier(Some(2), 8), 1.0);
        assert_eq!(t.dock_multiplier(None, 8), 1.0);
    }
}
