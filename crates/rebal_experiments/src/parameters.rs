//! Parameter variation framework for exploring the rebalancing config
//! space. Supports grid search and random sampling strategies, mirroring
//! the allocator/planner knobs exposed by [`rebal_core::config::RebalConfig`].

use std::collections::HashSet;

use rebal_core::config::RebalConfig;

/// Represents a single parameter combination.
#[derive(Debug, Clone)]
struct ParameterCombination {
    bucket_minutes: u32,
    total_bikes_ratio: f64,
    empty_threshold: f64,
    full_threshold: f64,
    w_bike_need: f64,
    w_dock_need: f64,
    lookahead_minutes: u32,
    truck_cap: u32,
    moves_budget: u32,
    use_distance_penalty: bool,
}

/// Holds all parameter variations to explore.
struct ParameterVariations {
    bucket_minutes: Vec<u32>,
    total_bikes_ratios: Vec<f64>,
    empty_thresholds: Vec<f64>,
    full_thresholds: Vec<f64>,
    w_bike_needs: Vec<f64>,
    w_dock_needs: Vec<f64>,
    lookahead_minutes: Vec<u32>,
    truck_caps: Vec<u32>,
    moves_budgets: Vec<u32>,
    use_distance_penalties: Vec<bool>,
}

impl ParameterVariations {
    fn from_space(space: &ParameterSpace) -> Self {
        Self {
            bucket_minutes: if space.bucket_minutes.is_empty() {
                vec![space.base.bucket_minutes_or_default()]
            } else {
                space.bucket_minutes.clone()
            },
            total_bikes_ratios: if space.total_bikes_ratios.is_empty() {
                vec![space.base.total_bikes_ratio.unwrap_or(0.60)]
            } else {
                space.total_bikes_ratios.clone()
            },
            empty_thresholds: if space.empty_thresholds.is_empty() {
                vec![space.base.empty_threshold.unwrap_or(0.10)]
            } else {
                space.empty_thresholds.clone()
            },
            full_thresholds: if space.full_thresholds.is_empty() {
                vec![space.base.full_threshold.unwrap_or(0.90)]
            } else {
                space.full_thresholds.clone()
            },
            w_bike_needs: if space.w_bike_needs.is_empty() {
                vec![space.base.w_bike_need.unwrap_or(1.0)]
            } else {
                space.w_bike_needs.clone()
            },
            w_dock_needs: if space.w_dock_needs.is_empty() {
                vec![space.base.w_dock_need.unwrap_or(1.4)]
            } else {
                space.w_dock_needs.clone()
            },
            lookahead_minutes: if space.lookahead_minutes.is_empty() {
                vec![space.base.lookahead_minutes.unwrap_or(180)]
            } else {
                space.lookahead_minutes.clone()
            },
            truck_caps: if space.truck_caps.is_empty() {
                vec![space.base.truck_cap.unwrap_or(20)]
            } else {
                space.truck_caps.clone()
            },
            moves_budgets: if space.moves_budgets.is_empty() {
                vec![space.base.moves_budget.unwrap_or(0)]
            } else {
                space.moves_budgets.clone()
            },
            use_distance_penalties: if space.use_distance_penalties.is_empty() {
                vec![space.base.use_distance_penalty.unwrap_or(true)]
            } else {
                space.use_distance_penalties.clone()
            },
        }
    }

    /// Generate all combinations using Cartesian product.
    fn generate_combinations(&self) -> impl Iterator<Item = ParameterCombination> + '_ {
        self.bucket_minutes
            .iter()
            .flat_map(move |&bucket_minutes| self.expand_with_ratio(bucket_minutes))
    }

    fn expand_with_ratio(&self, bucket_minutes: u32) -> impl Iterator<Item = ParameterCombination> + '_ {
        self.total_bikes_ratios
            .iter()
            .flat_map(move |&total_bikes_ratio| self.expand_with_empty(bucket_minutes, total_bikes_ratio))
    }

    fn expand_with_empty(
        &self,
        bucket_minutes: u32,
        total_bikes_ratio: f64,
    ) -> impl Iterator<Item = ParameterCombination> + '_ {
        self.empty_thresholds
            .iter()
            .flat_map(move |&empty_threshold| {
                self.expand_with_full(bucket_minutes, total_bikes_ratio, empty_threshold)
            })
    }

    fn expand_with_full(
        &self,
        bucket_minutes: u32,
        total_bikes_ratio: f64,
        empty_threshold: f64,
    ) -> impl Iterator<Item = ParameterCombination> + '_ {
        self.full_thresholds.iter().flat_map(move |&full_threshold| {
            self.expand_with_bike_need(bucket_minutes, total_bikes_ratio, empty_threshold, full_threshold)
        })
    }

    fn expand_with_bike_need(
        &self,
        bucket_minutes: u32,
        total_bikes_ratio: f64,
        empty_threshold: f64,
        full_threshold: f64,
    ) -> impl Iterator<Item = ParameterCombination> + '_ {
        self.w_bike_needs.iter().flat_map(move |&w_bike_need| {
            self.expand_with_dock_need(
                bucket_minutes,
                total_bikes_ratio,
                empty_threshold,
                full_threshold,
                w_bike_need,
            )
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_with_dock_need(
        &self,
        bucket_minutes: u32,
        total_bikes_ratio: f64,
        empty_threshold: f64,
        full_threshold: f64,
        w_bike_need: f64,
    ) -> impl Iterator<Item = ParameterCombination> + '_ {
        self.w_dock_needs.iter().flat_map(move |&w_dock_need| {
            self.expand_with_lookahead(
                bucket_minutes,
                total_bikes_ratio,
                empty_threshold,
                full_threshold,
                w_bike_need,
                w_dock_need,
            )
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_with_lookahead(
        &self,
        bucket_minutes: u32,
        total_bikes_ratio: f64,
        empty_threshold: f64,
        full_threshold: f64,
        w_bike_need: f64,
        w_dock_need: f64,
    ) -> impl Iterator<Item = ParameterCombination> + '_ {
        self.lookahead_minutes.iter().flat_map(move |&lookahead_minutes| {
            self.expand_with_truck_cap(
                bucket_minutes,
                total_bikes_ratio,
                empty_threshold,
                full_threshold,
                w_bike_need,
                w_dock_need,
                lookahead_minutes,
            )
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_with_truck_cap(
        &self,
        bucket_minutes: u32,
        total_bikes_ratio: f64,
        empty_threshold: f64,
        full_threshold: f64,
        w_bike_need: f64,
        w_dock_need: f64,
        lookahead_minutes: u32,
    ) -> impl Iterator<Item = ParameterCombination> + '_ {
        self.truck_caps.iter().flat_map(move |&truck_cap| {
            self.expand_with_budget(
                bucket_minutes,
                total_bikes_ratio,
                empty_threshold,
                full_threshold,
                w_bike_need,
                w_dock_need,
                lookahead_minutes,
                truck_cap,
            )
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_with_budget(
        &self,
        bucket_minutes: u32,
        total_bikes_ratio: f64,
        empty_threshold: f64,
        full_threshold: f64,
        w_bike_need: f64,
        w_dock_need: f64,
        lookahead_minutes: u32,
        truck_cap: u32,
    ) -> impl Iterator<Item = ParameterCombination> + '_ {
        self.moves_budgets.iter().flat_map(move |&moves_budget| {
            self.expand_with_distance_penalty(
                bucket_minutes,
                total_bikes_ratio,
                empty_threshold,
                full_threshold,
                w_bike_need,
                w_dock_need,
                lookahead_minutes,
                truck_cap,
                moves_budget,
            )
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_with_distance_penalty(
        &self,
        bucket_minutes: u32,
        total_bikes_ratio: f64,
        empty_threshold: f64,
        full_threshold: f64,
        w_bike_need: f64,
        w_dock_need: f64,
        lookahead_minutes: u32,
        truck_cap: u32,
        moves_budget: u32,
    ) -> impl Iterator<Item = ParameterCombination> + '_ {
        self.use_distance_penalties.iter().map(move |&use_distance_penalty| {
            ParameterCombination {
                bucket_minutes,
                total_bikes_ratio,
                empty_threshold,
                full_threshold,
                w_bike_need,
                w_dock_need,
                lookahead_minutes,
                truck_cap,
                moves_budget,
                use_distance_penalty,
            }
        })
    }
}

/// A single parameter configuration for an experiment run.
///
/// Wraps `RebalConfig` with additional experiment metadata for tracking.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    /// Rebalancing config for this run.
    pub config: RebalConfig,
    /// Unique experiment ID for this parameter configuration.
    pub experiment_id: String,
    /// Run ID within the experiment (for multiple runs with the same config).
    pub run_id: usize,
}

impl ParameterSet {
    pub fn new(config: RebalConfig, experiment_id: String, run_id: usize) -> Self {
        Self {
            config,
            experiment_id,
            run_id,
        }
    }
}

/// Defines a parameter space for exploration.
///
/// Supports grid search (Cartesian product) and random sampling strategies.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    base: RebalConfig,
    bucket_minutes: Vec<u32>,
    total_bikes_ratios: Vec<f64>,
    empty_thresholds: Vec<f64>,
    full_thresholds: Vec<f64>,
    w_bike_needs: Vec<f64>,
    w_dock_needs: Vec<f64>,
    lookahead_minutes: Vec<u32>,
    truck_caps: Vec<u32>,
    moves_budgets: Vec<u32>,
    use_distance_penalties: Vec<bool>,
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self {
            base: RebalConfig::default(),
            bucket_minutes: vec![],
            total_bikes_ratios: vec![],
            empty_thresholds: vec![],
            full_thresholds: vec![],
            w_bike_needs: vec![],
            w_dock_needs: vec![],
            lookahead_minutes: vec![],
            truck_caps: vec![],
            moves_budgets: vec![],
            use_distance_penalties: vec![],
        }
    }

    /// Create a new parameter space for grid search.
    pub fn grid() -> Self {
        Self::new()
    }

    pub fn bucket_minutes(mut self, values: Vec<u32>) -> Self {
        self.bucket_minutes = values;
        self
    }

    pub fn total_bikes_ratio(mut self, values: Vec<f64>) -> Self {
        self.total_bikes_ratios = values;
        self
    }

    pub fn empty_threshold(mut self, values: Vec<f64>) -> Self {
        self.empty_thresholds = values;
        self
    }

    pub fn full_threshold(mut self, values: Vec<f64>) -> Self {
        self.full_thresholds = values;
        self
    }

    pub fn w_bike_need(mut self, values: Vec<f64>) -> Self {
        self.w_bike_needs = values;
        self
    }

    pub fn w_dock_need(mut self, values: Vec<f64>) -> Self {
        self.w_dock_needs = values;
        self
    }

    pub fn lookahead_minutes(mut self, values: Vec<u32>) -> Self {
        self.lookahead_minutes = values;
        self
    }

    pub fn truck_cap(mut self, values: Vec<u32>) -> Self {
        self.truck_caps = values;
        self
    }

    pub fn moves_budget(mut self, values: Vec<u32>) -> Self {
        self.moves_budgets = values;
        self
    }

    pub fn use_distance_penalty(mut self, values: Vec<bool>) -> Self {
        self.use_distance_penalties = values;
        self
    }

    /// Set base config (used as defaults for unspecified dimensions).
    pub fn with_base(mut self, base: RebalConfig) -> Self {
        self.base = base;
        self
    }

    /// Generate all parameter sets using grid search (Cartesian product).
    pub fn generate(&self) -> Vec<ParameterSet> {
        let variations = ParameterVariations::from_space(self);
        variations
            .generate_combinations()
            .enumerate()
            .map(|(experiment_id, combo)| {
                let config = self
                    .base
                    .clone()
                    .with_bucket_minutes(combo.bucket_minutes)
                    .with_total_bikes_ratio(combo.total_bikes_ratio)
                    .with_empty_threshold(combo.empty_threshold)
                    .with_full_threshold(combo.full_threshold)
                    .with_w_bike_need(combo.w_bike_need)
                    .with_w_dock_need(combo.w_dock_need)
                    .with_lookahead_minutes(combo.lookahead_minutes)
                    .with_truck_cap(combo.truck_cap)
                    .with_moves_budget(combo.moves_budget)
                    .with_use_distance_penalty(combo.use_distance_penalty);

                ParameterSet::new(config, format!("exp_{experiment_id}"), 0)
            })
            .collect()
    }

    /// Generate random parameter sets (Monte Carlo sampling).
    ///
    /// Samples `count` parameter sets randomly from the defined space.
    /// If duplicates are encountered, continues sampling until `count`
    /// unique sets are generated or attempts are exhausted.
    pub fn sample_random(&self, count: usize, seed: u64) -> Vec<ParameterSet> {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(seed);
        let mut parameter_sets = Vec::new();
        let mut seen = HashSet::new();
        let mut attempts = 0;
        const MAX_ATTEMPTS: usize = 10_000;

        while parameter_sets.len() < count && attempts < MAX_ATTEMPTS {
            attempts += 1;

            let bucket_minutes = pick(&mut rng, &self.bucket_minutes, self.base.bucket_minutes_or_default());
            let total_bikes_ratio = pick(&mut rng, &self.total_bikes_ratios, self.base.total_bikes_ratio.unwrap_or(0.60));
            let empty_threshold = pick(&mut rng, &self.empty_thresholds, self.base.empty_threshold.unwrap_or(0.10));
            let full_threshold = pick(&mut rng, &self.full_thresholds, self.base.full_threshold.unwrap_or(0.90));
            let w_bike_need = pick(&mut rng, &self.w_bike_needs, self.base.w_bike_need.unwrap_or(1.0));
            let w_dock_need = pick(&mut rng, &self.w_dock_needs, self.base.w_dock_need.unwrap_or(1.4));
            let lookahead_minutes = pick(&mut rng, &self.lookahead_minutes, self.base.lookahead_minutes.unwrap_or(180));
            let truck_cap = pick(&mut rng, &self.truck_caps, self.base.truck_cap.unwrap_or(20));
            let moves_budget = pick(&mut rng, &self.moves_budgets, self.base.moves_budget.unwrap_or(0));
            let use_distance_penalty = pick(&mut rng, &self.use_distance_penalties, self.base.use_distance_penalty.unwrap_or(true));

            let config = self
                .base
                .clone()
                .with_bucket_minutes(bucket_minutes)
                .with_total_bikes_ratio(total_bikes_ratio)
                .with_empty_threshold(empty_threshold)
                .with_full_threshold(full_threshold)
                .with_w_bike_need(w_bike_need)
                .with_w_dock_need(w_dock_need)
                .with_lookahead_minutes(lookahead_minutes)
                .with_truck_cap(truck_cap)
                .with_moves_budget(moves_budget)
                .with_use_distance_penalty(use_distance_penalty);

            let param_hash = format!("{config:?}");
            if seen.contains(&param_hash) {
                continue;
            }
            seen.insert(param_hash);

            let run_id = parameter_sets.len();
            parameter_sets.push(ParameterSet::new(config, format!("random_{run_id}"), 0));
        }

        parameter_sets
    }
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self::new()
    }
}

fn pick<T: Copy>(rng: &mut impl rand::Rng, values: &[T], default: T) -> T {
    if values.is_empty() {
        default
    } else {
        values[rng.gen_range(0..values.len())]
    }
}
