//! Self-organizing map planner
//!
//! A ring of neurons is stretched over the goal neighborhoods. In each epoch
//! every goal pulls its closest free neuron onto the nearest point of its
//! neighborhood boundary, dragging ring neighbours along with a Gaussian
//! falloff over ring-index distance. The inhibited neurons, read in ring
//! order, give the visiting order. The result is a Euclidean polygon with no
//! curvature constraint.
//!
//! Reference: Faigl, J. et al. (2011). "An application of the self-organizing
//! map in the non-Euclidean Traveling Salesman Problem"

use log::{debug, info, warn};
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::common::{
    normalize_heading, Configuration, DtspnError, DtspnResult, Point2D, TourPath, TourPlanner,
    TourRequest,
};

/// Configuration for the SOM planner
#[derive(Debug, Clone)]
pub struct SomConfig {
    /// Adaptation rate of the winning neuron (mi)
    pub learning_rate: f64,
    /// Per-epoch decay of the neighbourhood width (alpha)
    pub gain_decrease: f64,
    pub max_iterations: usize,
    /// Neurons per goal
    pub neuron_ratio: f64,
    /// Stopping error relative to the spread of the goals
    pub tolerance: f64,
    /// Starting neighbourhood width; the goal count when `None`
    pub initial_sigma: Option<f64>,
    pub seed: u64,
}

impl Default for SomConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            gain_decrease: 0.1,
            max_iterations: 120,
            neuron_ratio: 2.5,
            tolerance: 1e-5,
            initial_sigma: None,
            seed: 42,
        }
    }
}

impl SomConfig {
    pub fn validate(&self) -> DtspnResult<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(DtspnError::ConfigurationError(format!(
                "learning rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.gain_decrease) {
            return Err(DtspnError::ConfigurationError(format!(
                "gain decrease must be in [0, 1), got {}",
                self.gain_decrease
            )));
        }
        if self.max_iterations == 0 {
            return Err(DtspnError::ConfigurationError(
                "at least one iteration is required".to_string(),
            ));
        }
        if !(self.neuron_ratio >= 1.0) {
            return Err(DtspnError::ConfigurationError(format!(
                "neuron ratio must be at least 1, got {}",
                self.neuron_ratio
            )));
        }
        if let Some(sigma) = self.initial_sigma {
            if !(sigma > 0.0 && sigma.is_finite()) {
                return Err(DtspnError::ConfigurationError(format!(
                    "initial sigma must be positive, got {}",
                    sigma
                )));
            }
        }
        if !(self.tolerance >= 0.0) {
            return Err(DtspnError::ConfigurationError(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Ring neuron; `owner` is set while a goal inhibits it in the current epoch
#[derive(Debug, Clone, PartialEq)]
pub struct Neuron {
    pub position: Vector2<f64>,
    pub owner: Option<usize>,
    /// Boundary point of the owner's neighborhood the neuron is pulled to
    pub goal_position: Option<Vector2<f64>>,
}

impl Neuron {
    fn new(position: Vector2<f64>) -> Self {
        Self {
            position,
            owner: None,
            goal_position: None,
        }
    }

    pub fn is_inhibited(&self) -> bool {
        self.owner.is_some()
    }

    fn adapt(&mut self, beta: f64, target: &Vector2<f64>) {
        self.position += beta * (target - self.position);
    }
}

/// State reported to an observer at the end of every epoch
#[derive(Debug, Clone)]
pub struct EpochSnapshot {
    pub epoch: usize,
    pub error: f64,
    pub sigma: f64,
    pub ring: Vec<Point2D>,
    /// (goal, neuron) pairs in the order goals were presented
    pub winners: Vec<(usize, usize)>,
}

/// Full result of a SOM run
#[derive(Debug, Clone)]
pub struct SomOutcome {
    pub tour: TourPath,
    /// Ring of the best epoch
    pub neurons: Vec<Neuron>,
    /// Epochs actually run
    pub epochs: usize,
    pub error: f64,
    pub converged: bool,
}

/// Circular distance between two ring indices
pub fn ring_distance(a: usize, b: usize, ring_size: usize) -> usize {
    let d = if a > b { a - b } else { b - a };
    d.min(ring_size - d)
}

fn mean_and_deviation(points: &[Vector2<f64>]) -> (Vector2<f64>, Vector2<f64>) {
    let n = points.len() as f64;
    let mean = points.iter().fold(Vector2::zeros(), |acc, p| acc + p) / n;
    let var = points
        .iter()
        .fold(Vector2::zeros(), |acc, p| acc + (p - mean).component_mul(&(p - mean)))
        / n;
    (mean, var.map(f64::sqrt))
}

/// Self-organizing map planner over goal neighborhoods
#[derive(Debug, Clone, Default)]
pub struct SomPlanner {
    config: SomConfig,
}

impl SomPlanner {
    pub fn new(config: SomConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SomConfig {
        &self.config
    }

    /// Neuron count for `goal_count` goals
    pub fn ring_size(&self, goal_count: usize) -> usize {
        ((self.config.neuron_ratio * goal_count as f64).ceil() as usize).max(goal_count)
    }

    pub fn solve(&self, request: &TourRequest) -> DtspnResult<SomOutcome> {
        self.run(request, None)
    }

    /// Plan while reporting every epoch to `observer`
    pub fn plan_with_observer(
        &self,
        request: &TourRequest,
        observer: &mut dyn FnMut(&EpochSnapshot),
    ) -> DtspnResult<TourPath> {
        Ok(self.solve_with_observer(request, observer)?.tour)
    }

    pub fn solve_with_observer(
        &self,
        request: &TourRequest,
        observer: &mut dyn FnMut(&EpochSnapshot),
    ) -> DtspnResult<SomOutcome> {
        self.run(request, Some(observer))
    }

    fn run(
        &self,
        request: &TourRequest,
        mut observer: Option<&mut dyn FnMut(&EpochSnapshot)>,
    ) -> DtspnResult<SomOutcome> {
        request.validate()?;
        self.config.validate()?;

        let goals = &request.goals;
        let centers: Vec<Vector2<f64>> = goals.iter().map(|g| g.center.to_vector()).collect();
        let (mean, dev) = mean_and_deviation(&centers);
        // the sensing radius keeps the threshold positive when all goals coincide
        let max_error = self.config.tolerance * dev.x.max(dev.y).max(request.sensing_radius);

        let m = self.ring_size(goals.len());
        let mut neurons: Vec<Neuron> = (0..m)
            .map(|k| {
                let angle = 2.0 * std::f64::consts::PI * k as f64 / m as f64;
                Neuron::new(mean + Vector2::new(angle.cos(), angle.sin()).component_mul(&dev))
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut order: Vec<usize> = (0..goals.len()).collect();
        let mut sigma = self.config.initial_sigma.unwrap_or(goals.len() as f64);
        let mi = self.config.learning_rate;

        let mut best: Option<(f64, Vec<Neuron>)> = None;
        let mut epochs = 0;
        let mut converged = false;

        for epoch in 0..self.config.max_iterations {
            for neuron in neurons.iter_mut() {
                neuron.owner = None;
                neuron.goal_position = None;
            }
            order.shuffle(&mut rng);

            let mut winners = Vec::with_capacity(goals.len());
            for &goal_idx in &order {
                let center = &centers[goal_idx];
                let mut winner = None;
                let mut best_sq = f64::INFINITY;
                for (k, neuron) in neurons.iter().enumerate() {
                    if neuron.is_inhibited() {
                        continue;
                    }
                    let d_sq = (neuron.position - center).norm_squared();
                    if d_sq < best_sq {
                        best_sq = d_sq;
                        winner = Some(k);
                    }
                }
                let winner = winner.ok_or_else(|| {
                    DtspnError::InvariantViolation(format!(
                        "no free neuron left for goal {}",
                        goal_idx
                    ))
                })?;

                let target = goals[goal_idx]
                    .closest_boundary_point(request.sensing_radius, &Point2D::from(neurons[winner].position))
                    .to_vector();
                neurons[winner].owner = Some(goal_idx);
                neurons[winner].goal_position = Some(target);
                winners.push((goal_idx, winner));

                for (k, neuron) in neurons.iter_mut().enumerate() {
                    let beta = if k == winner {
                        mi
                    } else {
                        let d = ring_distance(k, winner, m) as f64;
                        mi * (-d * d / (sigma * sigma)).exp()
                    };
                    neuron.adapt(beta, &target);
                }
            }

            sigma *= 1.0 - self.config.gain_decrease;
            epochs = epoch + 1;

            let error = neurons
                .iter()
                .filter_map(|n| n.goal_position.map(|g| (n.position - g).norm_squared()))
                .fold(0.0_f64, f64::max)
                .sqrt();
            debug!("SOM epoch {:3}: error {:.6}, sigma {:.4}", epoch, error, sigma);

            if let Some(observer) = observer.as_deref_mut() {
                observer(&EpochSnapshot {
                    epoch,
                    error,
                    sigma,
                    ring: neurons.iter().map(|n| Point2D::from(n.position)).collect(),
                    winners,
                });
            }

            if best.as_ref().map_or(true, |(best_error, _)| error < *best_error) {
                best = Some((error, neurons.clone()));
            }
            if error <= max_error {
                converged = true;
                break;
            }
        }

        let (error, neurons) = best.ok_or_else(|| {
            DtspnError::InvariantViolation("SOM finished without a single epoch".to_string())
        })?;
        if !converged {
            warn!(
                "SOM did not converge in {} epochs (best error {:.6}, threshold {:.6})",
                epochs, error, max_error
            );
        }

        let tour = reconstruct_tour(&neurons, goals.len())?;
        info!(
            "SOM tour over {} goals with {} neurons: length {:.3}, {} epochs",
            goals.len(),
            m,
            tour.length,
            epochs
        );

        Ok(SomOutcome {
            tour,
            neurons,
            epochs,
            error,
            converged,
        })
    }
}

/// Read inhibited neurons in ring order into a closed Euclidean tour
fn reconstruct_tour(neurons: &[Neuron], goal_count: usize) -> DtspnResult<TourPath> {
    let mut seen = vec![false; goal_count];
    let mut visits: Vec<(usize, Vector2<f64>)> = Vec::with_capacity(goal_count);

    for neuron in neurons {
        if let (Some(owner), Some(target)) = (neuron.owner, neuron.goal_position) {
            if owner >= goal_count || seen[owner] {
                return Err(DtspnError::InvariantViolation(format!(
                    "goal {} owns more than one neuron",
                    owner
                )));
            }
            seen[owner] = true;
            visits.push((owner, target));
        }
    }
    if visits.len() != goal_count {
        return Err(DtspnError::InvariantViolation(format!(
            "{} inhibited neurons for {} goals",
            visits.len(),
            goal_count
        )));
    }

    if let Some(pos) = visits.iter().position(|&(goal, _)| goal == 0) {
        visits.rotate_left(pos);
    }

    let n = visits.len();
    let mut length = 0.0;
    let mut waypoints = Vec::with_capacity(n);
    for k in 0..n {
        let here = visits[k].1;
        let step = visits[(k + 1) % n].1 - here;
        let heading = if step.norm() > 0.0 {
            normalize_heading(step.y.atan2(step.x))
        } else {
            0.0
        };
        length += step.norm();
        waypoints.push(Configuration::new(here.x, here.y, heading));
    }

    Ok(TourPath {
        configurations: waypoints.clone(),
        length,
        waypoints,
        goal_order: visits.iter().map(|&(goal, _)| goal).collect(),
    })
}

impl TourPlanner for SomPlanner {
    fn plan(&self, request: &TourRequest) -> DtspnResult<TourPath> {
        Ok(self.solve(request)?.tour)
    }
}
