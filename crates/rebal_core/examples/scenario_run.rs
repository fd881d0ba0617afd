//! Run a synthetic day end to end: midnight allocation, day planning, and
//! replay against a generated trip stream. Prints a summary comparable to
//! what `rebal_experiments`' sweep harness extracts per run.
//!
//! Run with: cargo run -p rebal_core --example scenario_run --release

use rebal_core::bucketize::{bucketize_trips, parse_mm_dd_yyyy_hh_mm, TripRecord};
use rebal_core::config::RebalConfig;
use rebal_core::simulate::{build_event_stream, DaySimulator};
use rebal_core::types::{Station, StationRegistry};

const NUM_STATIONS: usize = 40;
const NUM_TRIPS: usize = 6_000;

/// Deterministic xorshift so the example needs no `rand` dependency.
struct Rng(u64);

impl Rng {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn range(&mut self, n: usize) -> usize {
        (self.next_u64() as usize) % n
    }
}

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

/// Generates a commuter-shaped day: morning pickups cluster at
/// low-index ("residential") stations with dropoffs at high-index
/// ("downtown") stations, and the evening reverses the flow.
fn synthetic_trips(registry: &StationRegistry, count: usize, seed: u64) -> Vec<TripRecord> {
    let n = registry.len();
    let mut rng = Rng(seed | 1);
    let mut trips = Vec::with_capacity(count);

    for _ in 0..count {
        let morning = rng.range(2) == 0;
        let (start_hour, start_station, end_station) = if morning {
            let h = 6 + rng.range(4);
            let s = rng.range(n / 2);
            let e = n / 2 + rng.range(n - n / 2);
            (h, s, e)
        } else {
            let h = 16 + rng.range(5);
            let s = n / 2 + rng.range(n - n / 2);
            let e = rng.range(n / 2);
            (h, s, e)
        };
        let start_minute = rng.range(60);
        let duration = 6 + rng.range(25);
        let end_total_minute = start_hour * 60 + start_minute + duration;
        let end_hour = (end_total_minute / 60) % 24;
        let end_minute = end_total_minute % 60;

        trips.push(TripRecord {
            start_time: format!("01/01/2024 {start_hour:02}:{:02}", start_minute),
            end_time: format!("01/01/2024 {end_hour:02}:{end_minute:02}"),
            start_station_id: registry.station_id(rebal_core::types::StationIdx(start_station)).to_string(),
            end_station_id: registry.station_id(rebal_core::types::StationIdx(end_station)).to_string(),
        });
    }
    trips
}

fn main() {
    tracing_subscriber::fmt::init();

    let registry = synthetic_registry(NUM_STATIONS);
    let trips = synthetic_trips(&registry, NUM_TRIPS, 0x5EED);
    let day_start = chrono::NaiveDateTime::parse_from_str("01/01/2024 00:00", "%m/%d/%Y %H:%M").unwrap();

    let cfg = RebalConfig::default().with_moves_budget(60).with_truck_cap(15);
    let bucket = cfg.bucket().unwrap();
    let day = bucketize_trips(&trips, &registry, day_start, bucket, parse_mm_dd_yyyy_hh_mm);
    let events = build_event_stream(&trips, &registry, day_start, parse_mm_dd_yyyy_hh_mm);

    let total_bikes = cfg.resolve_total_bikes(registry.total_capacity());
    let allocator = cfg.midnight_allocator().unwrap();
    let allocation = allocator.allocate_for_day(&registry, &day, total_bikes);

    let x0: Vec<u32> = registry
        .iter_idx()
        .map(|idx| *allocation.bikes_by_station.get(registry.station_id(idx)).unwrap_or(&0))
        .collect();

    let planner_cfg = cfg.planner_config().unwrap();
    let plan = rebal_core::planner::plan_for_day(
        &planner_cfg,
        &registry,
        &day,
        &x0,
        None,
        &rebal_core::cost::UnitWeights,
    )
    .unwrap();

    let simulator = DaySimulator {
        bucket: day.bucket,
        donor_min_bikes_left: None,
        receiver_min_empty_docks_left: None,
        moves_per_hour: None,
    };
    let replay = simulator.replay(&registry, &x0, &events, &plan);

    println!("--- Scenario run ({NUM_STATIONS} stations, {NUM_TRIPS} trips) ---");
    println!("Fleet size: {total_bikes} bikes across {} docks", registry.total_capacity());
    println!(
        "Midnight allocator: {} swaps, cost {:.1} -> {:.1}",
        allocation.moves_count, allocation.initial_cost, allocation.final_cost
    );
    println!("Day planner: {} moves planned", plan.moves.len());
    println!(
        "Replay: {} moves applied ({} bikes moved of {} requested)",
        replay.applied_moves.len(),
        replay.applied_moves.iter().map(|m| m.bikes).sum::<u32>(),
        plan.moves.iter().map(|m| m.bikes).sum::<u32>(),
    );

    let stockouts = replay.snapshots.iter().filter(|s| s.bikes == 0).count();
    let full_docks = replay.snapshots.iter().filter(|s| s.empty_docks == 0).count();
    println!(
        "Snapshots: {} total, {} stockouts, {} full-dock buckets",
        replay.snapshots.len(),
        stockouts,
        full_docks
    );

    println!("\nFirst 10 planned moves:");
    for m in plan.moves.iter().take(10) {
        println!(
            "  t={:>4}  {} -> {}  {} bikes",
            m.t_min, m.from_station, m.to_station, m.bikes
        );
    }
}
