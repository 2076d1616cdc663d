#![cfg(test)]

use crate::geo::{default_key, great_circle, Position, Vector};

#[test]
fn rounding_is_idempotent() {
    let samples = [
        Position::new(151.180025, -33.883572),
        Position::new(-77.02343850496823, 38.91261500917026),
        Position::new(0.0, 0.0),
        Position::new(-0.000004999, 0.000005001),
    ];

    for tolerance in [1e-5, 1e-3, 0.5] {
        for sample in samples {
            let once = sample.rounded(tolerance);
            let twice = once.rounded(tolerance);
            assert_eq!(once, twice, "rounding drifted at tolerance {}", tolerance);
        }
    }
}

#[test]
fn keys_are_stable_and_discriminating() {
    let tolerance = 1e-5;
    let a = Position::new(9.186777765, 48.773585361).rounded(tolerance);
    let b = Position::new(9.186777765, 48.773585361).rounded(tolerance);
    let c = Position::new(9.186877765, 48.773585361).rounded(tolerance);

    assert_eq!(default_key(&a), default_key(&b));
    assert_ne!(default_key(&a), default_key(&c));
}

#[test]
fn nearby_coordinates_snap_together() {
    let a = Position::new(1.000001, 2.000002);
    let b = Position::new(1.000003, 1.999998);

    assert!(a.snaps_to(&b, 1e-4));
    assert!(!a.snaps_to(&b, 1e-7));
}

#[test]
fn elevation_survives_rounding() {
    let position = Position::with_elevation(1.0000001, 2.0000001, 523.7);
    let rounded = position.rounded(1e-5);

    assert_eq!(rounded.elevation, Some(523.7));
}

#[test]
fn great_circle_is_positive_and_symmetric() {
    let a = Position::new(151.180025, -33.883572);
    let b = Position::new(151.201438, -33.890029);

    let forward = great_circle(&a, &b);
    let backward = great_circle(&b, &a);

    assert!(forward > 0f64);
    assert!((forward - backward).abs() < 1e-12);
}

#[test]
fn vector_dot_reflects_alignment() {
    let origin = Position::new(0.0, 0.0);
    let east = Vector::between(&origin, &Position::new(1.0, 0.0));
    let west = Vector::between(&origin, &Position::new(-1.0, 0.0));
    let north = Vector::between(&origin, &Position::new(0.0, 1.0));

    assert!(east.dot(&west) < 0f64);
    assert_eq!(east.dot(&north), 0f64);
    assert!(east.dot(&east) > 0f64);
    assert!(Vector::between(&origin, &origin).is_zero());
}
