//! Geometry service
//!
//! Planar configuration conversions and stitching of an ordered list of
//! configurations into a closed, densely sampled Dubins tour.

use itertools::Itertools;

use crate::common::{validate_turning_radius, Configuration, DtspnResult, Pose3D, TourPath};
use crate::path_planning::DubinsPath;

/// Sampling step along each Dubins segment, relative to the turning radius
pub const SAMPLING_STEP_RATIO: f64 = 0.01;

pub fn pose_to_configuration(pose: &Pose3D) -> Configuration {
    Configuration::from_pose(pose)
}

pub fn configuration_to_pose(configuration: &Configuration) -> Pose3D {
    configuration.to_pose()
}

/// Length of the shortest Dubins path from `a` to `b`
pub fn dubins_distance(a: &Configuration, b: &Configuration, turning_radius: f64) -> DtspnResult<f64> {
    Ok(DubinsPath::shortest(*a, *b, turning_radius)?.length())
}

/// Close the cycle a0 -> a1 -> ... -> a(n-1) -> a0 with Dubins segments.
///
/// Each segment contributes its samples up to (not including) its end, so the
/// dense sequence never repeats a waypoint. A single configuration produces a
/// zero-length tour holding that configuration once.
pub fn stitch(configurations: &[Configuration], turning_radius: f64) -> DtspnResult<TourPath> {
    validate_turning_radius(turning_radius)?;

    let step = SAMPLING_STEP_RATIO * turning_radius;
    let mut dense = Vec::new();
    let mut length = 0.0;

    for (start, end) in configurations.iter().circular_tuple_windows() {
        let segment = DubinsPath::shortest(*start, *end, turning_radius)?;
        dense.extend(segment.sample(step)?);
        length += segment.length();
    }

    Ok(TourPath {
        configurations: dense,
        length,
        waypoints: configurations.to_vec(),
        goal_order: (0..configurations.len()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DtspnError;
    use std::f64::consts::PI;

    fn square() -> Vec<Configuration> {
        vec![
            Configuration::new(0.0, 0.0, 0.0),
            Configuration::new(10.0, 0.0, PI / 2.0),
            Configuration::new(10.0, 10.0, PI),
            Configuration::new(0.0, 10.0, 1.5 * PI),
        ]
    }

    #[test]
    fn test_length_is_sum_of_segments() {
        let configs = square();
        let tour = stitch(&configs, 1.0).unwrap();

        let mut expected = 0.0;
        for i in 0..configs.len() {
            let j = (i + 1) % configs.len();
            expected += dubins_distance(&configs[i], &configs[j], 1.0).unwrap();
        }
        assert!((tour.length - expected).abs() < 1e-9);
        assert!(tour.length > 40.0);
        assert_eq!(tour.waypoints, configs);
    }

    #[test]
    fn test_dense_sampling_step() {
        let configs = square();
        let tour = stitch(&configs, 2.0).unwrap();
        // samples are 0.02 apart along the curve, chords never exceed that
        for w in tour.configurations.windows(2) {
            assert!(w[0].position().distance(&w[1].position()) <= 0.02 + 1e-9);
        }
        assert_eq!(tour.configurations[0], configs[0]);
    }

    #[test]
    fn test_single_configuration() {
        let config = Configuration::new(4.0, 2.0, 0.5);
        let tour = stitch(&[config], 1.0).unwrap();
        assert_eq!(tour.length, 0.0);
        assert_eq!(tour.configurations, vec![config]);
    }

    #[test]
    fn test_repeated_configuration_gives_zero_segment() {
        let a = Configuration::new(0.0, 0.0, 0.0);
        let b = Configuration::new(5.0, 0.0, 0.0);
        let with_repeat = stitch(&[a, a, b], 1.0).unwrap();
        let without = stitch(&[a, b], 1.0).unwrap();
        assert!((with_repeat.length - without.length).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        let tour = stitch(&[], 1.0).unwrap();
        assert!(tour.is_empty());
        assert_eq!(tour.length, 0.0);
    }

    #[test]
    fn test_invalid_turning_radius() {
        assert!(matches!(
            stitch(&square(), 0.0),
            Err(DtspnError::ConfigurationError(_))
        ));
        assert!(stitch(&square(), -1.0).is_err());
    }

    #[test]
    fn test_pose_roundtrip() {
        let config = Configuration::new(1.0, 2.0, 3.0);
        let back = pose_to_configuration(&configuration_to_pose(&config));
        assert!((back.heading - 3.0).abs() < 1e-9);
    }
}
