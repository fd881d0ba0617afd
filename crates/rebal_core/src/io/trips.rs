//! Trip log loader. Reads the reference dataset's CSV header shape
//! (`Start Time`, `End Time`, `Start Station Id`, `End Station Id`) into
//! [`TripRecord`]s; bucketizing and event-stream rules live in
//! [`crate::bucketize`] and [`crate::simulate`].

use std::path::Path;

use serde::Deserialize;

use crate::bucketize::TripRecord;
use crate::error::RebalError;

#[derive(Debug, Deserialize)]
struct TripRow {
    #[serde(rename = "Start Time")]
    start_time: String,
    #[serde(rename = "End Time")]
    end_time: String,
    #[serde(rename = "Start Station Id")]
    start_station_id: String,
    #[serde(rename = "End Station Id")]
    end_station_id: String,
}

pub fn load_trips(path: impl AsRef<Path>) -> Result<Vec<TripRecord>, RebalError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| RebalError::Load {
        what: "trips",
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut trips = Vec::new();
    for result in reader.deserialize::<TripRow>() {
        let row = result.map_err(|e| RebalError::Load {
            what: "trips",
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        trips.push(TripRecord {
            start_time: row.start_time,
            end_time: row.end_time,
            start_station_id: row.start_station_id,
            end_station_id: row.end_station_id,
        });
    }
    Ok(trips)
}
