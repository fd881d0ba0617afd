//! Great-circle distance between stations, used by the planner's optional
//! distance guard/penalty. Adapted from the teacher's H3-cell-pair haversine
//! to raw lat/lon pairs — this domain has no hex grid.

const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Haversine distance in kilometers between two lat/lon points in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}
