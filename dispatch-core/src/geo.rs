use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Great-circle distance in meters. Non-finite inputs yield NaN, which makes
/// every comparison against a tolerance false; coordinates are validated at
/// the wire boundary instead of here.
pub fn haversine_m(a: LatLon, b: LatLon) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lon - a.lon).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Destination point a given distance along a bearing (degrees, clockwise
/// from north) on the sphere.
pub fn destination(origin: LatLon, bearing_deg: f64, distance_m: f64) -> LatLon {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let phi1 = origin.lat.to_radians();
    let lambda1 = origin.lon.to_radians();

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    LatLon::new(phi2.to_degrees(), lambda2.to_degrees())
}

/// Geodesic circle approximated as a closed polygon ring, walked along
/// evenly spaced bearings.
pub fn circle_polygon(center: LatLon, radius_m: f64, steps: usize) -> Vec<LatLon> {
    let steps = steps.max(3);
    let mut ring: Vec<LatLon> = (0..steps)
        .map(|i| destination(center, 360.0 * i as f64 / steps as f64, radius_m))
        .collect();
    ring.push(ring[0]);
    ring
}

/// Ray-cast membership test over a closed ring (lon/lat treated as planar,
/// which is fine at geofence scale).
pub fn point_in_polygon(point: LatLon, ring: &[LatLon]) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 4 {
        return false;
    }

    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (ring[i], ring[j]);
        let crosses = (pi.lat > point.lat) != (pj.lat > point.lat);
        if crosses {
            let x = (pj.lon - pi.lon) * (point.lat - pi.lat) / (pj.lat - pi.lat) + pi.lon;
            if point.lon < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let p = LatLon::new(50.5652165, 9.6861753);
        assert_eq!(haversine_m(p, p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = LatLon::new(50.5652165, 9.6861753);
        let b = LatLon::new(50.561469999275005, 9.704481903105375);
        assert!((haversine_m(a, b) - haversine_m(b, a)).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(0.0, 1.0);
        let d = haversine_m(a, b);
        let expected = 111_195.0;
        assert!((d - expected).abs() / expected < 0.01, "got {d}");
    }

    #[test]
    fn destination_round_trips_distance() {
        let origin = LatLon::new(50.5652165, 9.6861753);
        for bearing in [0.0, 45.0, 90.0, 180.0, 270.0] {
            let there = destination(origin, bearing, 5_000.0);
            let d = haversine_m(origin, there);
            assert!((d - 5_000.0).abs() < 1.0, "bearing {bearing} gave {d}");
        }
    }

    #[test]
    fn circle_polygon_contains_center() {
        let center = LatLon::new(50.5652165, 9.6861753);
        let ring = circle_polygon(center, 15_000.0, 64);
        assert!(point_in_polygon(center, &ring));
    }

    #[test]
    fn circle_polygon_excludes_points_beyond_radius() {
        let center = LatLon::new(50.5652165, 9.6861753);
        let radius_m = 15_000.0;
        let ring = circle_polygon(center, radius_m, 64);

        for bearing in [0.0, 30.0, 95.0, 180.0, 250.0, 359.0] {
            let outside = destination(center, bearing, radius_m + 1_000.0);
            assert!(
                !point_in_polygon(outside, &ring),
                "bearing {bearing} should be outside"
            );
        }
    }
}
