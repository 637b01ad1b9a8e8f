use ndarray::{Array1, ArrayView1, Zip};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points given in decimal degrees.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Distance in metres from every `(lat, lon)` pair to `origin`.
///
/// A missing coordinate on either side yields a missing distance.
pub fn distances_from(
    lat: ArrayView1<f64>,
    lon: ArrayView1<f64>,
    origin: (f64, f64),
) -> Array1<f64> {
    let (origin_lat, origin_lon) = origin;
    Zip::from(&lat).and(&lon).map_collect(|&la, &lo| {
        if la.is_nan() || lo.is_nan() || origin_lat.is_nan() || origin_lon.is_nan() {
            f64::NAN
        } else {
            haversine_distance(origin_lat, origin_lon, la, lo)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let dist = haversine_distance(0.0, 0.0, 0.0, 1.0);
        assert!((dist - 111_195.0).abs() < 200.0);
    }

    #[test]
    fn distances_start_at_zero_and_propagate_missing() {
        let lat = array![39.5, 39.5, 39.6];
        let lon = array![-74.0, f64::NAN, -74.0];
        let out = distances_from(lat.view(), lon.view(), (39.5, -74.0));
        assert_eq!(out[0], 0.0);
        assert!(out[1].is_nan());
        assert!((out[2] - 11_119.5).abs() < 5.0);
    }
}
