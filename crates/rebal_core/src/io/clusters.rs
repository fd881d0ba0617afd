//! Station cluster assignment loader. Reads tabular `station_id,cluster_id`
//! pairs — the clustering algorithm itself (k-means over hourly signatures)
//! is an external collaborator; this crate only consumes its output.

use std::path::Path;

use serde::Deserialize;

use crate::error::RebalError;
use crate::types::StationCluster;

#[derive(Debug, Deserialize)]
struct ClusterRow {
    station_id: String,
    cluster_id: u32,
}

pub fn load_station_clusters(path: impl AsRef<Path>) -> Result<StationCluster, RebalError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| RebalError::Load {
        what: "station clusters",
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut map = std::collections::HashMap::new();
    for result in reader.deserialize::<ClusterRow>() {
        let row = result.map_err(|e| RebalError::Load {
            what: "station clusters",
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        map.insert(row.station_id, row.cluster_id);
    }
    Ok(StationCluster::from_map(map))
}
