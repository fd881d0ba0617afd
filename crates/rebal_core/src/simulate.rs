//! Component F: the day simulator (replay). Steps through buckets applying
//! rider events and planned moves against the actual event stream,
//! clamping each move to feasibility and emitting a per-bucket snapshot.

use chrono::NaiveDateTime;

use crate::bucketize::TripRecord;
use crate::types::{
    BucketConfig, Plan, StationIdx, StationRegistry, StationSnapshot, TruckMove,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Start,
    End,
}

#[derive(Debug, Clone, Copy)]
pub struct TripEvent {
    minute: i64,
    kind: EventKind,
    station: StationIdx,
    seq: u32,
}

/// Builds the day's time-sorted `(timestamp, kind, station_id)` event
/// stream from raw trip records, applying the same discard rules as the
/// bucketizer (self-loop, unknown station, malformed timestamp, outside day
/// window) since both read the same input. Ties in timestamp are broken by
/// original trip-stream order.
pub fn build_event_stream<'a, I, P>(
    trips: I,
    registry: &StationRegistry,
    day_start: NaiveDateTime,
    parse_timestamp: P,
) -> Vec<TripEvent>
where
    I: IntoIterator<Item = &'a TripRecord>,
    P: Fn(&str) -> Option<NaiveDateTime>,
{
    let day_end = day_start + chrono::Duration::days(1);
    let mut events = Vec::new();

    for (seq, trip) in trips.into_iter().enumerate() {
        let (Some(start_dt), Some(end_dt)) =
            (parse_timestamp(&trip.start_time), parse_timestamp(&trip.end_time))
        else {
            continue;
        };
        let s0 = trip.start_station_id.trim();
        let s1 = trip.end_station_id.trim();
        if s0 == s1 {
            continue;
        }
        let (Some(i0), Some(i1)) = (registry.idx(s0), registry.idx(s1)) else {
            continue;
        };
        let seq = seq as u32;
        if start_dt >= day_start && start_dt < day_end {
            events.push(TripEvent {
                minute: (start_dt - day_start).num_minutes(),
                kind: EventKind::Start,
                station: i0,
                seq,
            });
        }
        if end_dt >= day_start && end_dt < day_end {
            events.push(TripEvent {
                minute: (end_dt - day_start).num_minutes(),
                kind: EventKind::End,
                station: i1,
                seq,
            });
        }
    }

    events.sort_by_key(|e| (e.minute, e.seq));
    events
}

#[derive(Debug, Clone)]
pub struct DaySimulator {
    pub bucket: BucketConfig,
    /// Second safety-floor clamp applied during move replay, for a sanity
    /// re-check mode; `None` applies only the base feasibility clamp.
    pub donor_min_bikes_left: Option<u32>,
    pub receiver_min_empty_docks_left: Option<u32>,
    /// At most this many planned moves are applied per wall-clock hour;
    /// excess is dropped, first-N by original plan order.
    pub moves_per_hour: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Replay {
    pub snapshots: Vec<StationSnapshot>,
    pub applied_moves: Vec<TruckMove>,
}

impl DaySimulator {
    /// Replays one day: `x0` is the starting bike count per station index.
    /// `events` must already be sorted by `(minute, seq)` — see
    /// [`build_event_stream`]. Unknown station ids referenced by a planned
    /// move are dropped silently.
    pub fn replay(
        &self,
        registry: &StationRegistry,
        x0: &[u32],
        events: &[TripEvent],
        plan: &Plan,
    ) -> Replay {
        let n = registry.len();
        let caps: Vec<u32> = (0..n).map(|i| registry.capacity(StationIdx(i))).collect();
        let mut bikes = x0.to_vec();

        let resolved_moves: Vec<Option<(StationIdx, StationIdx)>> = plan
            .moves
            .iter()
            .map(|m| {
                let from = registry.idx(&m.from_station);
                let to = registry.idx(&m.to_station);
                match (from, to) {
                    (Some(f), Some(t)) => Some((f, t)),
                    _ => None,
                }
            })
            .collect();

        let mut event_cursor = 0usize;
        let mut move_cursor = 0usize;
        let mut applied = Vec::new();
        let mut per_hour_count: std::collections::HashMap<u32, u32> = std::collections::HashMap::new();

        let b_count = self.bucket.bucket_count();
        let minutes = self.bucket.minutes();
        let mut snapshots = Vec::with_capacity(b_count * n);

        for b in 0..b_count {
            let threshold = (b as i64) * minutes as i64;

            while event_cursor < events.len() && events[event_cursor].minute <= threshold {
                let ev = events[event_cursor];
                let sid = ev.station.0;
                match ev.kind {
                    EventKind::Start => {
                        if bikes[sid] > 0 {
                            bikes[sid] -= 1;
                        }
                    }
                    EventKind::End => {
                        if bikes[sid] < caps[sid] {
                            bikes[sid] += 1;
                        }
                    }
                }
                event_cursor += 1;
            }

            let t_min = self.bucket.t_min_of_bucket(b);
            while move_cursor < plan.moves.len() && plan.moves[move_cursor].t_min == t_min {
                let requested = &plan.moves[move_cursor];
                if let Some((src, snk)) = resolved_moves[move_cursor] {
                    let mut moved = (requested.bikes as i64)
                        .min(bikes[src.0] as i64)
                        .min(caps[snk.0] as i64 - bikes[snk.0] as i64);

                    if let (Some(donor_min), Some(recv_min)) =
                        (self.donor_min_bikes_left, self.receiver_min_empty_docks_left)
                    {
                        moved = moved
                            .min(bikes[src.0] as i64 - donor_min as i64)
                            .min((caps[snk.0] as i64 - bikes[snk.0] as i64) - recv_min as i64);
                    }

                    if moved > 0 {
                        let hour = t_min / 60;
                        let allowed = match self.moves_per_hour {
                            Some(cap) => {
                                let count = per_hour_count.entry(hour).or_insert(0);
                                if *count < cap {
                                    *count += 1;
                                    true
                                } else {
                                    false
                                }
                            }
                            None => true,
                        };

                        if allowed {
                            let moved = moved as u32;
                            bikes[src.0] -= moved;
                            bikes[snk.0] += moved;
                            applied.push(TruckMove {
                                from_station: requested.from_station.clone(),
                                to_station: requested.to_station.clone(),
                                bikes: moved,
                                t_min,
                                truck_id: requested.truck_id.clone(),
                                distance_km: requested.distance_km,
                            });
                        }
                    }
                }
                move_cursor += 1;
            }

            for s in 0..n {
                snapshots.push(StationSnapshot {
                    station: StationIdx(s),
                    t_min,
                    bikes: bikes[s],
                    empty_docks: caps[s] - bikes[s],
                    capacity: caps[s],
                });
            }
        }

        Replay { snapshots, applied_moves: applied }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Station;

    fn registry2() -> StationRegistry {
        StationRegistry::from_stations(vec![
            Station { station_id: "A".into(), capacity: 10, lat: 0.0, lon: 0.0 },
            Station { station_id: "B".into(), capacity: 10, lat: 0.0, lon: 0.0 },
        ])
    }

    fn day_start() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("01/01/2024 00:00", "%m/%d/%Y %H:%M").unwrap()
    }

    fn snapshot_at(r: &Replay, t_min: u32, station: &str, registry: &StationRegistry) -> u32 {
        let idx = registry.idx(station).unwrap();
        r.snapshots
            .iter()
            .find(|s| s.t_min == t_min && s.station == idx)
            .unwrap()
            .bikes
    }

    #[test]
    fn scenario_one_trip_no_trucks() {
        let registry = registry2();
        let trips = vec![crate::bucketize::TripRecord {
            start_time: "01/01/2024 00:30".into(),
            end_time: "01/01/2024 00:40".into(),
            start_station_id: "A".into(),
            end_station_id: "B".into(),
        }];
        let events = build_event_stream(&trips, &registry, day_start(), crate::bucketize::parse_mm_dd_yyyy_hh_mm);
        let sim = DaySimulator {
            bucket: BucketConfig::new(15).unwrap(),
            donor_min_bikes_left: None,
            receiver_min_empty_docks_left: None,
            moves_per_hour: None,
        };
        let replay = sim.replay(&registry, &[5, 5], &events, &Plan::empty());
        assert_eq!(snapshot_at(&replay, 30, "A", &registry), 4);
        assert_eq!(snapshot_at(&replay, 30, "B", &registry), 5);
        assert_eq!(snapshot_at(&replay, 45, "A", &registry), 4);
        assert_eq!(snapshot_at(&replay, 45, "B", &registry), 6);
        assert!(replay.applied_moves.is_empty());
    }

    #[test]
    fn scenario_infeasible_move_dropped() {
        let registry = StationRegistry::from_stations(vec![
            Station { station_id: "A".into(), capacity: 5, lat: 0.0, lon: 0.0 },
            Station { station_id: "B".into(), capacity: 5, lat: 0.0, lon: 0.0 },
        ]);
        let plan = Plan {
            moves: vec![TruckMove {
                from_station: "A".into(),
                to_station: "B".into(),
                bikes: 3,
                t_min: 0,
                truck_id: None,
                distance_km: None,
            }],
        };
        let sim = DaySimulator {
            bucket: BucketConfig::new(15).unwrap(),
            donor_min_bikes_left: None,
            receiver_min_empty_docks_left: None,
            moves_per_hour: None,
        };
        let replay = sim.replay(&registry, &[4, 5], &[], &plan);
        assert!(replay.applied_moves.is_empty());
        assert_eq!(snapshot_at(&replay, 0, "A", &registry), 4);
        assert_eq!(snapshot_at(&replay, 0, "B", &registry), 5);
    }

    #[test]
    fn unknown_station_in_planned_move_is_dropped_silently() {
        let registry = registry2();
        let plan = Plan {
            moves: vec![TruckMove {
                from_station: "Z".into(),
                to_station: "B".into(),
                bikes: 3,
                t_min: 0,
                truck_id: None,
                distance_km: None,
            }],
        };
        let sim = DaySimulator {
            bucket: BucketConfig::new(15).unwrap(),
            donor_min_bikes_left: None,
            receiver_min_empty_docks_left: None,
            moves_per_hour: None,
        };
        let replay = sim.replay(&registry, &[5, 5], &[], &plan);
        assert!(replay.applied_moves.is_empty());
    }

    #[test]
    fn moves_per_hour_cap_drops_excess_by_plan_order() {
        let registry = StationRegistry::from_stations(vec![
            Station { station_id: "A".into(), capacity: 20, lat: 0.0, lon: 0.0 },
            Station { station_id: "B".into(), capacity: 20, lat: 0.0, lon: 0.0 },
            Station { station_id: "C".into(), capacity: 20, lat: 0.0, lon: 0.0 },
        ]);
        let plan = Plan {
            moves: vec![
                TruckMove { from_station: "A".into(), to_station: "B".into(), bikes: 2, t_min: 0, truck_id: None, distance_km: None },
                TruckMove { from_station: "A".into(), to_station: "C".into(), bikes: 2, t_min: 0, truck_id: None, distance_km: None },
            ],
        };
        let sim = DaySimulator {
            bucket: BucketConfig::new(15).unwrap(),
            donor_min_bikes_left: None,
            receiver_min_empty_docks_left: None,
            moves_per_hour: Some(1),
        };
        let replay = sim.replay(&registry, &[10, 0, 0], &[], &plan);
        assert_eq!(replay.applied_moves.len(), 1);
        assert_eq!(replay.applied_moves[0].to_station, "B");
    }
}
