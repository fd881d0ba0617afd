//! Station registry loader. Reads the GBFS-style `station_information.json`
//! shape the reference dataset uses: `{"data": {"stations": [...]}}`.

use std::path::Path;

use serde::Deserialize;

use crate::error::RebalError;
use crate::types::{Station, StationRegistry};

#[derive(Debug, Deserialize)]
struct StationInformationFile {
    data: StationInformationData,
}

#[derive(Debug, Deserialize)]
struct StationInformationData {
    stations: Vec<StationRecord>,
}

#[derive(Debug, Deserialize)]
struct StationRecord {
    station_id: serde_json::Value,
    capacity: u32,
    lat: f64,
    lon: f64,
    #[allow(dead_code)]
    #[serde(default)]
    name: Option<String>,
}

pub fn load_station_registry(path: impl AsRef<Path>) -> Result<StationRegistry, RebalError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| RebalError::Load {
        what: "station registry",
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let parsed: StationInformationFile = serde_json::from_str(&text).map_err(|e| RebalError::Load {
        what: "station registry",
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let stations = parsed
        .data
        .stations
        .into_iter()
        .map(|r| Station {
            station_id: station_id_to_string(&r.station_id),
            capacity: r.capacity,
            lat: r.lat,
            lon: r.lon,
        })
        .collect();

    Ok(StationRegistry::from_stations(stations))
}

fn station_id_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
