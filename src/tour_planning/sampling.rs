//! Neighborhood sampling
//!
//! Discretizes each goal region's boundary into a fixed grid of candidate
//! configurations: `position_resolution` points evenly spaced by angle on the
//! circle of radius `sensing_radius`, each crossed with `heading_resolution`
//! evenly spaced headings in [0, 2pi).

use std::f64::consts::TAU;

use crate::common::{Configuration, DtspnError, DtspnResult, Goal};

/// Configuration for neighborhood sampling
#[derive(Debug, Clone, Copy)]
pub struct SamplingConfig {
    /// Number of positions on each neighborhood boundary
    pub position_resolution: usize,
    /// Number of headings per position
    pub heading_resolution: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            position_resolution: 8,
            heading_resolution: 8,
        }
    }
}

impl SamplingConfig {
    pub fn new(position_resolution: usize, heading_resolution: usize) -> Self {
        Self {
            position_resolution,
            heading_resolution,
        }
    }

    pub fn validate(&self) -> DtspnResult<()> {
        if self.position_resolution < 1 || self.heading_resolution < 1 {
            return Err(DtspnError::ConfigurationError(format!(
                "sampling resolutions must be at least 1, got {}x{}",
                self.position_resolution, self.heading_resolution
            )));
        }
        Ok(())
    }

    /// Samples per goal
    pub fn cluster_size(&self) -> usize {
        self.position_resolution * self.heading_resolution
    }
}

/// Goal index -> candidate configurations, all rows of equal length
#[derive(Debug, Clone)]
pub struct SampleMatrix {
    rows: Vec<Vec<Configuration>>,
    cluster_size: usize,
}

impl SampleMatrix {
    pub fn goal_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cluster_size(&self) -> usize {
        self.cluster_size
    }

    /// Total number of samples over all goals
    pub fn len(&self) -> usize {
        self.rows.len() * self.cluster_size
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, goal: usize) -> &[Configuration] {
        &self.rows[goal]
    }

    pub fn rows(&self) -> &[Vec<Configuration>] {
        &self.rows
    }

    pub fn get(&self, goal: usize, sample: usize) -> Configuration {
        self.rows[goal][sample]
    }

    /// Index of (goal, sample) in the goal-major flattening
    pub fn flat_index(&self, goal: usize, sample: usize) -> usize {
        goal * self.cluster_size + sample
    }

    /// Inverse of `flat_index`
    pub fn split_index(&self, flat: usize) -> (usize, usize) {
        (flat / self.cluster_size, flat % self.cluster_size)
    }

    /// All samples in goal-major order
    pub fn flatten(&self) -> Vec<Configuration> {
        self.rows.iter().flatten().copied().collect()
    }
}

/// Boundary sampler for goal neighborhoods
#[derive(Debug, Clone)]
pub struct NeighborhoodSampler {
    config: SamplingConfig,
}

impl NeighborhoodSampler {
    pub fn new(config: SamplingConfig) -> DtspnResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    /// Sample index within a row is `position_index * heading_resolution + heading_index`,
    /// so the first sample of every goal sits at angle 0 with heading 0.
    pub fn sample(&self, goals: &[Goal], sensing_radius: f64) -> DtspnResult<SampleMatrix> {
        if !sensing_radius.is_finite() || sensing_radius < 0.0 {
            return Err(DtspnError::ConfigurationError(format!(
                "sensing radius must be finite and non-negative, got {}",
                sensing_radius
            )));
        }

        let pr = self.config.position_resolution;
        let hr = self.config.heading_resolution;

        let rows = goals
            .iter()
            .map(|goal| {
                let mut row = Vec::with_capacity(pr * hr);
                for sp in 0..pr {
                    let alpha = sp as f64 * TAU / pr as f64;
                    let position = goal.boundary_point(sensing_radius, alpha);
                    for sh in 0..hr {
                        let heading = sh as f64 * TAU / hr as f64;
                        row.push(Configuration::from_position(position, heading));
                    }
                }
                row
            })
            .collect();

        Ok(SampleMatrix {
            rows,
            cluster_size: pr * hr,
        })
    }
}

/// One-shot form of `NeighborhoodSampler::sample`
pub fn sample_neighborhoods(
    goals: &[Goal],
    sensing_radius: f64,
    position_resolution: usize,
    heading_resolution: usize,
) -> DtspnResult<SampleMatrix> {
    NeighborhoodSampler::new(SamplingConfig::new(position_resolution, heading_resolution))?
        .sample(goals, sensing_radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn goals() -> Vec<Goal> {
        vec![Goal::new(0.0, 0.0), Goal::new(10.0, -3.0)]
    }

    #[test]
    fn test_sample_layout() {
        let samples = sample_neighborhoods(&goals(), 2.0, 4, 2).unwrap();
        assert_eq!(samples.goal_count(), 2);
        assert_eq!(samples.cluster_size(), 8);
        assert_eq!(samples.len(), 16);

        // position 1 (angle pi/2), heading 1 (pi)
        let c = samples.get(1, 3);
        assert!((c.x - 10.0).abs() < 1e-12);
        assert!((c.y - -1.0).abs() < 1e-12);
        assert!((c.heading - PI).abs() < 1e-12);
    }

    #[test]
    fn test_first_sample_at_angle_zero() {
        let samples = sample_neighborhoods(&goals(), 1.5, 8, 8).unwrap();
        for (goal, row) in goals().iter().zip(samples.rows()) {
            assert!((row[0].x - (goal.center.x + 1.5)).abs() < 1e-12);
            assert!((row[0].y - goal.center.y).abs() < 1e-12);
            assert_eq!(row[0].heading, 0.0);
        }
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let a = sample_neighborhoods(&goals(), 0.7, 5, 3).unwrap();
        let b = sample_neighborhoods(&goals(), 0.7, 5, 3).unwrap();
        assert_eq!(a.flatten(), b.flatten());
    }

    #[test]
    fn test_samples_lie_on_boundary() {
        let samples = sample_neighborhoods(&goals(), 3.0, 7, 1).unwrap();
        for (goal, row) in goals().iter().zip(samples.rows()) {
            for c in row {
                assert!((c.position().distance(&goal.center) - 3.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_zero_radius_collapses_to_center() {
        let samples = sample_neighborhoods(&goals(), 0.0, 3, 2).unwrap();
        for c in samples.row(1) {
            assert_eq!(c.position(), goals()[1].center);
        }
    }

    #[test]
    fn test_flat_index_roundtrip() {
        let samples = sample_neighborhoods(&goals(), 1.0, 2, 3).unwrap();
        let flat = samples.flat_index(1, 4);
        assert_eq!(flat, 10);
        assert_eq!(samples.split_index(flat), (1, 4));
        assert_eq!(samples.flatten()[flat], samples.get(1, 4));
    }

    #[test]
    fn test_invalid_resolution() {
        assert!(matches!(
            sample_neighborhoods(&goals(), 1.0, 0, 8),
            Err(DtspnError::ConfigurationError(_))
        ));
        assert!(sample_neighborhoods(&goals(), 1.0, 8, 0).is_err());
        assert!(sample_neighborhoods(&goals(), -1.0, 8, 8).is_err());
    }
}
