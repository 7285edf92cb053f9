//! Great-circle distance between coordinates.
//!
//! All distances in the crate are kilometres. The unit is fixed by
//! [`EARTH_RADIUS_KM`]; proximity thresholds passed to the store are compared
//! against values produced here and must use the same unit.

use geo::Coord;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two points.
///
/// Both coordinates use `x = longitude` and `y = latitude` in degrees.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use locus_core::haversine_km;
///
/// let origin = Coord { x: 20.0, y: 10.0 };
/// assert_eq!(haversine_km(origin, origin), 0.0);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "the haversine formula is floating-point trigonometry"
)]
pub fn haversine_km(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let d_lat = (to.y - from.y).to_radians();
    let d_lon = (to.x - from.x).to_radians();
    let half_lat = (d_lat / 2.0).sin();
    let half_lon = (d_lon / 2.0).sin();

    // Rounding can push the squared half-chord past 1 near antipodes.
    let a = half_lat
        .mul_add(
            half_lat,
            from.y.to_radians().cos() * to.y.to_radians().cos() * half_lon * half_lon,
        )
        .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "assertions compare distances within a tolerance"
)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn coord(latitude: f64, longitude: f64) -> Coord<f64> {
        Coord {
            x: longitude,
            y: latitude,
        }
    }

    #[rstest]
    #[case(coord(10.0, 20.0), coord(10.0, 20.0), 0.0)]
    // One degree of arc along a meridian.
    #[case(coord(0.0, 0.0), coord(1.0, 0.0), 111.194_926_644_558_73)]
    #[case(coord(0.0, 0.0), coord(0.0, 90.0), 10_007.543_398_010_286)]
    #[case(coord(10.0, 20.0), coord(30.0, 40.0), 3_040.602_818_068_2)]
    fn matches_reference_distances(
        #[case] from: Coord<f64>,
        #[case] to: Coord<f64>,
        #[case] expected_km: f64,
    ) {
        let distance = haversine_km(from, to);
        assert!(
            (distance - expected_km).abs() < 1e-3,
            "expected {expected_km} km, got {distance} km"
        );
    }

    #[rstest]
    #[case(coord(2.5, 0.0), coord(-2.5, -180.0))]
    #[case(coord(0.0, 0.0), coord(0.0, 180.0))]
    #[case(coord(45.3, 12.7), coord(-45.3, -167.3))]
    #[case(coord(90.0, 0.0), coord(-90.0, 0.0))]
    fn antipodes_are_half_a_circumference_apart(
        #[case] from: Coord<f64>,
        #[case] to: Coord<f64>,
    ) {
        let distance = haversine_km(from, to);
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!(distance.is_finite(), "distance was {distance}");
        assert!((distance - half_circumference).abs() < 1e-3);
    }

    #[rstest]
    fn antipodal_sweep_never_yields_nan() {
        for tenth in 0_i32..=900 {
            let latitude = f64::from(tenth) / 10.0;
            let distance = haversine_km(coord(latitude, 0.0), coord(-latitude, 180.0));
            assert!(!distance.is_nan(), "NaN at latitude {latitude}");
        }
    }

    #[rstest]
    fn is_symmetric() {
        let a = coord(48.8566, 2.3522);
        let b = coord(51.5074, 0.1278);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }
}
