//! Component E: the day planner. Greedily selects up to `K` timed truck
//! moves within a service window to minimize total station cost, using a
//! candidate-time/source/sink narrowing pass before scoring full pairs.

use rayon::prelude::*;

use crate::bucketize::BucketizedDay;
use crate::cost::{future_sum, station_cost, ClusterHourWeights, CostWeights, UnitWeights};
use crate::error::RebalError;
use crate::geo::haversine_km;
use crate::trajectory::{resimulate_tail, simulate};
use crate::types::{Plan, StationCluster, StationIdx, StationRegistry, TruckMove};

const EPS: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub weights: CostWeights,
    pub bucket_minutes: u32,
    pub moves_budget: u32,
    pub truck_cap: u32,
    pub donor_min_bikes_left: u32,
    pub receiver_min_empty_docks_left: u32,
    pub service_start_hour: u32,
    pub service_end_hour: u32,
    pub candidate_time_top_k: usize,
    pub top_k_sources: usize,
    pub top_k_sinks: usize,
    pub use_distance_penalty: bool,
    pub distance_penalty_per_km: f64,
    pub max_pair_km: f64,
}

impl PlannerConfig {
    fn validate(&self) -> Result<(), RebalError> {
        if self.service_start_hour > 24 || self.service_end_hour > 24 {
            return Err(RebalError::ServiceHoursOutOfRange {
                start: self.service_start_hour,
                end: self.service_end_hour,
            });
        }
        if self.service_end_hour <= self.service_start_hour {
            return Err(RebalError::InvalidServiceWindow {
                start: self.service_start_hour,
                end: self.service_end_hour,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    b0: usize,
    src: usize,
    snk: usize,
    moved: u32,
    delta: f64,
}

/// Lexicographic tie-break on `(b0, src, snk)` for equal `delta`, per
/// the planner's ordering guarantee.
fn pick_better(a: Candidate, b: Candidate) -> Candidate {
    if a.delta > b.delta {
        a
    } else if b.delta > a.delta {
        b
    } else if (b.b0, b.src, b.snk) < (a.b0, a.src, a.snk) {
        b
    } else {
        a
    }
}

/// Plans truck moves for one day's bucketized trips starting from `x0`
/// (dense, one entry per station index). `clusters` assigns each station
/// to a cluster id; `cluster_weights` supplies the per-cluster,
/// per-hour multipliers the buffer-shortage term applies to that
/// assignment. Pass [`UnitWeights`] for `cluster_weights` when no
/// override table is available.
pub fn plan_for_day(
    cfg: &PlannerConfig,
    registry: &StationRegistry,
    day: &BucketizedDay,
    x0: &[u32],
    clusters: Option<&StationCluster>,
    cluster_weights: &dyn ClusterHourWeights,
) -> Result<Plan, RebalError> {
    cfg.validate()?;

    if cfg.moves_budget == 0 || registry.is_empty() {
        return Ok(Plan::empty());
    }

    let n = registry.len();
    let caps: Vec<u32> = (0..n).map(|i| registry.capacity(StationIdx(i))).collect();
    let cluster_of: Vec<Option<u32>> = (0..n)
        .map(|i| clusters.and_then(|c| c.cluster_of(registry.station_id(StationIdx(i)))))
        .collect();

    let mut trajectories: Vec<Vec<u32>> = (0..n)
        .map(|s| simulate(x0[s] as i64, caps[s], &day.delta[s]))
        .collect();

    let window = service_window_buckets(cfg, day.bucket.minutes(), day.bucket.bucket_count());
    if window.is_empty() {
        return Ok(Plan::empty());
    }
    let hourly_grid = hourly_grid_buckets(cfg, day.bucket.minutes(), &window);

    let mut moves: Vec<TruckMove> = Vec::new();

    for _ in 0..cfg.moves_budget {
        let badness = badness_series(cfg, &trajectories, &caps, day, &window);
        let candidate_times =
            candidate_time_buckets(&badness, &hourly_grid, cfg.candidate_time_top_k);

        let best = candidate_times
            .par_iter()
            .filter_map(|&b0| {
                best_candidate_at(
                    cfg,
                    registry,
                    day,
                    &caps,
                    &trajectories,
                    &cluster_of,
                    cluster_weights,
                    b0,
                )
            })
            .reduce_with(pick_better);

        let Some(best) = best else { break };
        if best.delta <= EPS {
            break;
        }

        let Candidate { b0, src, snk, moved, .. } = best;

        trajectories[src][b0] -= moved;
        resimulate_tail(&mut trajectories[src], caps[src], &day.delta[src], b0);
        trajectories[snk][b0] += moved;
        resimulate_tail(&mut trajectories[snk], caps[snk], &day.delta[snk], b0);

        moves.push(TruckMove {
            from_station: registry.station_id(StationIdx(src)).to_string(),
            to_station: registry.station_id(StationIdx(snk)).to_string(),
            bikes: moved,
            t_min: day.bucket.t_min_of_bucket(b0),
            truck_id: None,
            distance_km: cfg.use_distance_penalty.then(|| {
                let sa = registry.station(StationIdx(src));
                let sb = registry.station(StationIdx(snk));
                haversine_km(sa.lat, sa.lon, sb.lat, sb.lon)
            }),
        });
    }

    let mut plan = Plan { moves };
    plan.sort();
    Ok(plan)
}

fn service_window_buckets(cfg: &PlannerConfig, bucket_minutes: u32, b_count: usize) -> Vec<usize> {
    let lo = 60 * cfg.service_start_hour;
    let hi = 60 * cfg.service_end_hour;
    (0..b_count)
        .filter(|&b| {
            let t = b as u32 * bucket_minutes;
            t >= lo && t < hi
        })
        .collect()
}

fn hourly_grid_buckets(cfg: &PlannerConfig, bucket_minutes: u32, window: &[usize]) -> Vec<usize> {
    let window_set: std::collections::HashSet<usize> = window.iter().copied().collect();
    (cfg.service_start_hour..cfg.service_end_hour)
        .map(|h| (h * 60 / bucket_minutes) as usize)
        .filter(|b| window_set.contains(b))
        .collect()
}

/// `bike_short`/`dock_short` at bucket `b` for one station's pickup/dropoff
/// series, per spec.md §4.E's badness and risk-score formulas.
fn station_bike_dock_short(
    cfg: &PlannerConfig,
    pickups: &[u32],
    dropoffs: &[u32],
    cap: u32,
    x_b: u32,
    b: usize,
) -> (f64, f64) {
    let fut_pu = future_sum(pickups, b, cfg.weights.lookahead_buckets) as f64;
    let fut_do = future_sum(dropoffs, b, cfg.weights.lookahead_buckets) as f64;
    let bike_short = (cfg.weights.pickup_buffer_mult * fut_pu - x_b as f64).max(0.0);
    let dock_short = (cfg.weights.dropoff_buffer_mult * fut_do - (cap as f64 - x_b as f64)).max(0.0);
    (bike_short, dock_short)
}

fn badness_series(
    cfg: &PlannerConfig,
    trajectories: &[Vec<u32>],
    caps: &[u32],
    day: &BucketizedDay,
    window: &[usize],
) -> Vec<(usize, f64)> {
    window
        .iter()
        .map(|&b| {
            let total: f64 = (0..trajectories.len())
                .map(|s| {
                    let x_b = trajectories[s][b];
                    let (bike_short, dock_short) =
                        station_bike_dock_short(cfg, &day.pickups[s], &day.dropoffs[s], caps[s], x_b, b);
                    bike_short + dock_short
                })
                .sum();
            (b, total)
        })
        .collect()
}

fn candidate_time_buckets(
    badness: &[(usize, f64)],
    hourly_grid: &[usize],
    top_k: usize,
) -> Vec<usize> {
    let mut ranked: Vec<(usize, f64)> = badness.to_vec();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut set: std::collections::BTreeSet<usize> =
        ranked.iter().take(top_k).map(|&(b, _)| b).collect();
    for &b in hourly_grid {
        set.insert(b);
    }
    set.into_iter().collect()
}

#[allow(clippy::too_many_arguments)]
fn best_candidate_at(
    cfg: &PlannerConfig,
    registry: &StationRegistry,
    day: &BucketizedDay,
    caps: &[u32],
    trajectories: &[Vec<u32>],
    cluster_of: &[Option<u32>],
    cluster_weights: &dyn ClusterHourWeights,
    b0: usize,
) -> Option<Candidate> {
    let n = trajectories.len();
    let mut sink_risk: Vec<(usize, f64)> = Vec::with_capacity(n);
    let mut source_risk: Vec<(usize, f64)> = Vec::with_capacity(n);
    for s in 0..n {
        let x_b = trajectories[s][b0];
        let (bike_short, dock_short) =
            station_bike_dock_short(cfg, &day.pickups[s], &day.dropoffs[s], caps[s], x_b, b0);
        let touches = (1.0 + day.touch_total[s] as f64).ln();
        sink_risk.push((s, bike_short * touches));
        source_risk.push((s, dock_short * touches));
    }
    sink_risk.sort_by(|a, b| b.1.total_cmp(&a.1));
    source_risk.sort_by(|a, b| b.1.total_cmp(&a.1));

    let sinks: Vec<usize> = sink_risk.iter().take(cfg.top_k_sinks).map(|&(s, _)| s).collect();
    let sources: Vec<usize> = source_risk.iter().take(cfg.top_k_sources).map(|&(s, _)| s).collect();

    let mut best: Option<Candidate> = None;
    for &src in &sources {
        for &snk in &sinks {
            if src == snk {
                continue;
            }
            let x_src = trajectories[src][b0] as i64;
            let x_snk = trajectories[snk][b0] as i64;
            let moved = (cfg.truck_cap as i64)
                .min(x_src - cfg.donor_min_bikes_left as i64)
                .min((caps[snk] as i64 - x_snk) - cfg.receiver_min_empty_docks_left as i64);
            if moved <= 0 {
                continue;
            }
            let moved = moved as u32;

            let dist = if cfg.use_distance_penalty {
                let sa = registry.station(StationIdx(src));
                let sb = registry.station(StationIdx(snk));
                let d = haversine_km(sa.lat, sa.lon, sb.lat, sb.lon);
                if d > cfg.max_pair_km {
                    continue;
                }
                Some(d)
            } else {
                None
            };

            let x_src_now = trajectories[src][b0];
            let x_snk_now = trajectories[snk][b0];
            let cost_before = tail_cost_override(cfg, day, src, caps[src], b0, x_src_now, cluster_of[src], cluster_weights)
                + tail_cost_override(cfg, day, snk, caps[snk], b0, x_snk_now, cluster_of[snk], cluster_weights);
            let cost_after = tail_cost_override(cfg, day, src, caps[src], b0, x_src_now - moved, cluster_of[src], cluster_weights)
                + tail_cost_override(cfg, day, snk, caps[snk], b0, x_snk_now + moved, cluster_of[snk], cluster_weights);

            let mut delta = cost_before - cost_after;
            if let Some(d) = dist {
                delta -= cfg.distance_penalty_per_km * d;
            }

            let candidate = Candidate { b0, src, snk, moved, delta };
            best = Some(match best {
                None => candidate,
                Some(existing) => pick_better(existing, candidate),
            });
        }
    }
    best
}

/// Cost of station `s`'s tail `[b0, B)` if its bucket-`b0` count were
/// overridden to `value`, re-propagated forward with its own delta row.
/// The prefix `[0, b0)` never needs recomputing — earlier deltas didn't
/// change.
#[allow(clippy::too_many_arguments)]
fn tail_cost_override(
    cfg: &PlannerConfig,
    day: &BucketizedDay,
    s: usize,
    capacity: u32,
    b0: usize,
    value: u32,
    cluster: Option<u32>,
    cluster_weights: &dyn ClusterHourWeights,
) -> f64 {
    let tail_delta = &day.delta[s][b0..];
    let traj = simulate(value as i64, capacity, tail_delta);
    let pickups_tail = &day.pickups[s][b0..];
    let dropoffs_tail = &day.dropoffs[s][b0..];
    station_cost(
        &traj,
        capacity,
        pickups_tail,
        dropoffs_tail,
        0,
        &cfg.weights,
        cfg.bucket_minutes,
        cluster,
        cluster_weights,
    )
}
