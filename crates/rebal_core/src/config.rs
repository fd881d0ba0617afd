//! Configuration surface. `RebalConfig` mirrors the teacher's
//! `ScenarioParams`: every tunable is an `Option<T>`, `Default` supplies the
//! spec's defaults, and `.with_x()` builder methods let callers override
//! only what they care about.

use serde::{Deserialize, Serialize};

use crate::cost::CostWeights;
use crate::error::RebalError;
use crate::midnight::MidnightAllocator;
use crate::planner::PlannerConfig;
use crate::types::BucketConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalConfig {
    pub bucket_minutes: Option<u32>,
    pub total_bikes_ratio: Option<f64>,
    pub total_bikes: Option<u32>,

    pub empty_threshold: Option<f64>,
    pub full_threshold: Option<f64>,
    pub w_empty: Option<f64>,
    pub w_full: Option<f64>,
    pub w_bike_need: Option<f64>,
    pub w_dock_need: Option<f64>,
    pub pickup_buffer_mult: Option<f64>,
    pub dropoff_buffer_mult: Option<f64>,
    pub lookahead_minutes: Option<u32>,

    pub moves_budget: Option<u32>,
    pub truck_cap: Option<u32>,
    pub donor_min_bikes_left: Option<u32>,
    pub receiver_min_empty_docks_left: Option<u32>,
    pub service_start_hour: Option<u32>,
    pub service_end_hour: Option<u32>,
    pub candidate_time_top_k: Option<usize>,
    pub top_k_sources: Option<usize>,
    pub top_k_sinks: Option<usize>,
    pub use_distance_penalty: Option<bool>,
    pub distance_penalty_per_km: Option<f64>,
    pub max_pair_km: Option<f64>,

    pub max_midnight_moves: Option<u32>,
    pub moves_per_hour: Option<u32>,
}

impl Default for RebalConfig {
    fn default() -> Self {
        Self {
            bucket_minutes: None,
            total_bikes_ratio: None,
            total_bikes: None,
            empty_threshold: None,
            full_threshold: None,
            w_empty: None,
            w_full: None,
            w_bike_need: None,
            w_dock_need: None,
            pickup_buffer_mult: None,
            dropoff_buffer_mult: None,
            lookahead_minutes: None,
            moves_budget: None,
            truck_cap: None,
            donor_min_bikes_left: None,
            receiver_min_empty_docks_left: None,
            service_start_hour: None,
            service_end_hour: None,
            candidate_time_top_k: None,
            top_k_sources: None,
            top_k_sinks: None,
            use_distance_penalty: None,
            distance_penalty_per_km: None,
            max_pair_km: None,
            max_midnight_moves: None,
            moves_per_hour: None,
        }
    }
}

macro_rules! with_field {
    ($name:ident, $setter:ident, $ty:ty) => {
        pub fn $setter(mut self, value: $ty) -> Self {
            self.$name = Some(value);
            self
        }
    };
}

impl RebalConfig {
    with_field!(bucket_minutes, with_bucket_minutes, u32);
    with_field!(total_bikes_ratio, with_total_bikes_ratio, f64);
    with_field!(total_bikes, with_total_bikes, u32);
    with_field!(empty_threshold, with_empty_threshold, f64);
    with_field!(full_threshold, with_full_threshold, f64);
    with_field!(w_empty, with_w_empty, f64);
    with_field!(w_full, with_w_full, f64);
    with_field!(w_bike_need, with_w_bike_need, f64);
    with_field!(w_dock_need, with_w_dock_need, f64);
    with_field!(pickup_buffer_mult, with_pickup_buffer_mult, f64);
    with_field!(dropoff_buffer_mult, with_dropoff_buffer_mult, f64);
    with_field!(lookahead_minutes, with_lookahead_minutes, u32);
    with_field!(moves_budget, with_moves_budget, u32);
    with_field!(truck_cap, with_truck_cap, u32);
    with_field!(donor_min_bikes_left, with_donor_min_bikes_left, u32);
    with_field!(receiver_min_empty_docks_left, with_receiver_min_empty_docks_left, u32);
    with_field!(service_start_hour, with_service_start_hour, u32);
    with_field!(service_end_hour, with_service_end_hour, u32);
    with_field!(candidate_time_top_k, with_candidate_time_top_k, usize);
    with_field!(top_k_sources, with_top_k_sources, usize);
    with_field!(top_k_sinks, with_top_k_sinks, usize);
    with_field!(use_distance_penalty, with_use_distance_penalty, bool);
    with_field!(distance_penalty_per_km, with_distance_penalty_per_km, f64);
    with_field!(max_pair_km, with_max_pair_km, f64);
    with_field!(max_midnight_moves, with_max_midnight_moves, u32);
    with_field!(moves_per_hour, with_moves_per_hour, u32);

    pub fn bucket_minutes_or_default(&self) -> u32 {
        self.bucket_minutes.unwrap_or(15)
    }

    pub fn bucket(&self) -> Result<BucketConfig, RebalError> {
        BucketConfig::new(self.bucket_minutes_or_default())
    }

    pub fn cost_weights(&self) -> Result<CostWeights, RebalError> {
        let empty_threshold = self.empty_threshold.unwrap_or(0.10);
        let full_threshold = self.full_threshold.unwrap_or(0.90);
        let w_empty = self.w_empty.unwrap_or(1.0);
        let w_full = self.w_full.unwrap_or(1.0);
        let w_bike_need = self.w_bike_need.unwrap_or(1.0);
        let w_dock_need = self.w_dock_need.unwrap_or(1.4);
        for (name, value) in [
            ("w_empty", w_empty),
            ("w_full", w_full),
            ("w_bike_need", w_bike_need),
            ("w_dock_need", w_dock_need),
        ] {
            if value < 0.0 {
                return Err(RebalError::NegativeWeight { name, value });
            }
        }
        let bucket_minutes = self.bucket_minutes_or_default();
        let lookahead_minutes = self.lookahead_minutes.unwrap_or(180);
        let bucket = BucketConfig::new(bucket_minutes)?;
        Ok(CostWeights {
            w_empty,
            w_full,
            empty_threshold,
            full_threshold,
            w_bike_need,
            w_dock_need,
            pickup_buffer_mult: self.pickup_buffer_mult.unwrap_or(1.0),
            dropoff_buffer_mult: self.dropoff_buffer_mult.unwrap_or(1.0),
            lookahead_buckets: bucket.lookahead_buckets(lookahead_minutes),
        })
    }

    /// Resolves the target fleet size against a known total capacity,
    /// preferring an explicit `total_bikes` over `total_bikes_ratio`.
    pub fn resolve_total_bikes(&self, total_capacity: u64) -> u32 {
        if let Some(total) = self.total_bikes {
            return total;
        }
        let ratio = self.total_bikes_ratio.unwrap_or(0.60);
        ((total_capacity as f64) * ratio).round() as u32
    }

    pub fn midnight_allocator(&self) -> Result<MidnightAllocator, RebalError> {
        Ok(MidnightAllocator {
            weights: self.cost_weights()?,
            bucket_minutes: self.bucket_minutes_or_default(),
            max_moves: self.max_midnight_moves,
        })
    }

    pub fn planner_config(&self) -> Result<PlannerConfig, RebalError> {
        Ok(PlannerConfig {
            weights: self.cost_weights()?,
            bucket_minutes: self.bucket_minutes_or_default(),
            moves_budget: self.moves_budget.unwrap_or(0),
            truck_cap: self.truck_cap.unwrap_or(20),
            donor_min_bikes_left: self.donor_min_bikes_left.unwrap_or(3),
            receiver_min_empty_docks_left: self.receiver_min_empty_docks_left.unwrap_or(2),
            service_start_hour: self.service_start_hour.unwrap_or(8),
            service_end_hour: self.service_end_hour.unwrap_or(20),
            candidate_time_top_k: self.candidate_time_top_k.unwrap_or(16),
            top_k_sources: self.top_k_sources.unwrap_or(16),
            top_k_sinks: self.top_k_sinks.unwrap_or(16),
            use_distance_penalty: self.use_distance_penalty.unwrap_or(true),
            distance_penalty_per_km: self.distance_penalty_per_km.unwrap_or(0.06),
            max_pair_km: self.max_pair_km.unwrap_or(10.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = RebalConfig::default();
        let w = cfg.cost_weights().unwrap();
        assert_eq!(w.empty_threshold, 0.10);
        assert_eq!(w.full_threshold, 0.90);
        assert_eq!(w.w_dock_need, 1.4);
        assert_eq!(cfg.resolve_total_bikes(1000), 600);
    }

    #[test]
    fn explicit_total_bikes_overrides_ratio() {
        let cfg = RebalConfig::default().with_total_bikes(42).with_total_bikes_ratio(0.1);
        assert_eq!(cfg.resolve_total_bikes(1000), 42);
    }

    #[test]
    fn negative_weight_is_rejected() {
        let cfg = RebalConfig::default().with_w_empty(-1.0);
        assert!(cfg.cost_weights().is_err());
    }

    #[test]
    fn invalid_bucket_minutes_is_rejected() {
        let cfg = RebalConfig::default().with_bucket_minutes(7);
        assert!(cfg.bucket().is_err());
    }
}
