//! Spherical measurements of drawn shapes, matching turf's `area` and
//! `length` so numbers agree with what a map frontend would show.

/// Radius used for polygon area (WGS84 semi-major axis), metres
pub const AREA_EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Mean earth radius used for great-circle distances, metres
pub const LENGTH_EARTH_RADIUS_M: f64 = 6_371_008.8;

pub const MILES_PER_KM: f64 = 0.621;

const SQUARE_METERS_PER_SQUARE_KM: f64 = 1_000_000.0;

/// Round half away from zero to 2 decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Signed ring area in m² (Chamberlain and Duquette)
fn ring_area(ring: &[[f64; 2]]) -> f64 {
    let len = ring.len();
    if len <= 2 {
        return 0.0;
    }

    let mut total = 0.0;
    for i in 0..len {
        let (lower, middle, upper) = if i == len - 2 {
            (len - 2, len - 1, 0)
        } else if i == len - 1 {
            (len - 1, 0, 1)
        } else {
            (i, i + 1, i + 2)
        };

        total += (ring[upper][0].to_radians() - ring[lower][0].to_radians())
            * ring[middle][1].to_radians().sin();
    }

    total * AREA_EARTH_RADIUS_M * AREA_EARTH_RADIUS_M / 2.0
}

/// Polygon area in m²: outer ring minus holes
pub fn polygon_area_m2(rings: &[Vec<[f64; 2]>]) -> f64 {
    let Some((outer, holes)) = rings.split_first() else {
        return 0.0;
    };

    let mut area = ring_area(outer).abs();
    for hole in holes {
        area -= ring_area(hole).abs();
    }
    area
}

/// Great-circle distance between two `[lon, lat]` positions, km
pub fn haversine_km(from: [f64; 2], to: [f64; 2]) -> f64 {
    let d_lat = (to[1] - from[1]).to_radians();
    let d_lon = (to[0] - from[0]).to_radians();
    let lat1 = from[1].to_radians();
    let lat2 = to[1].to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + (d_lon / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    c * LENGTH_EARTH_RADIUS_M / 1000.0
}

pub fn line_length_km(line: &[[f64; 2]]) -> f64 {
    line.windows(2).map(|pair| haversine_km(pair[0], pair[1])).sum()
}

/// Polygon area in km², rounded for display
pub fn area_square_km(rings: &[Vec<[f64; 2]>]) -> f64 {
    round2(polygon_area_m2(rings) / SQUARE_METERS_PER_SQUARE_KM)
}

/// Line length as rounded `(km, miles)`. Miles come from the unrounded km.
pub fn length_km_miles(line: &[[f64; 2]]) -> (f64, f64) {
    let km = line_length_km(line);
    (round2(km), round2(km * MILES_PER_KM))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Closed square with 1 km sides, south-west corner on the equator
    fn one_km_square() -> Vec<Vec<[f64; 2]>> {
        let side = (1000.0 / AREA_EARTH_RADIUS_M).to_degrees();
        vec![vec![
            [0.0, 0.0],
            [side, 0.0],
            [side, side],
            [0.0, side],
            [0.0, 0.0],
        ]]
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.235_1), 1.24);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_one_km_square_area() {
        let area = area_square_km(&one_km_square());
        assert!((area - 1.0).abs() < 0.011, "area was {}", area);
    }

    #[test]
    fn test_winding_order_does_not_matter() {
        let mut reversed = one_km_square();
        reversed[0].reverse();
        assert_eq!(area_square_km(&reversed), area_square_km(&one_km_square()));
    }

    #[test]
    fn test_hole_is_subtracted() {
        let side = (1000.0 / AREA_EARTH_RADIUS_M).to_degrees();
        let mut rings = one_km_square();
        rings.push(vec![
            [side * 0.25, side * 0.25],
            [side * 0.75, side * 0.25],
            [side * 0.75, side * 0.75],
            [side * 0.25, side * 0.75],
            [side * 0.25, side * 0.25],
        ]);

        let area = area_square_km(&rings);
        assert!((area - 0.75).abs() < 0.011, "area was {}", area);
    }

    #[test]
    fn test_degenerate_polygon() {
        assert_eq!(polygon_area_m2(&[]), 0.0);
        assert_eq!(polygon_area_m2(&[vec![[0.0, 0.0], [1.0, 1.0]]]), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let (km, miles) = length_km_miles(&[[0.0, 0.0], [0.0, 1.0]]);
        assert_eq!(km, 111.2);
        assert_eq!(miles, 69.05);
    }

    #[test]
    fn test_multi_segment_length() {
        let line = [[0.0, 0.0], [0.0, 1.0], [0.0, 2.0]];
        let direct = line_length_km(&[[0.0, 0.0], [0.0, 2.0]]);
        assert!((line_length_km(&line) - direct).abs() < 1e-9);
        assert_eq!(line_length_km(&[[3.0, 4.0]]), 0.0);
    }
}
