//! Decoupled DTSPN planner
//!
//! The goal order comes from a Euclidean TSP over the goal centers. With the
//! order fixed, one boundary sample per goal is picked greedily: the sample
//! minimizing the Dubins distance from the previous pick plus a straight-line
//! estimate to the next goal center. The last goal uses the exact Dubins
//! distance back to the first pick instead of the estimate.

use log::info;

use crate::common::{DtspnError, DtspnResult, Point2D, TourPath, TourPlanner, TourRequest, TspSolver};
use crate::tour_planning::euclidean_tsp::EuclideanTspAdapter;
use crate::tour_planning::geometry::{dubins_distance, stitch};
use crate::tour_planning::sampling::{NeighborhoodSampler, SampleMatrix, SamplingConfig};
use crate::tour_planning::tsp_solver::LocalSearchSolver;

/// Configuration for the decoupled planner
#[derive(Debug, Clone)]
pub struct DecoupledConfig {
    pub sampling: SamplingConfig,
    /// Try every sample of the first goal as the start of the greedy chain
    /// and keep the cheapest closed chain; otherwise start from sample 0.
    pub multi_start: bool,
}

impl Default for DecoupledConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            multi_start: true,
        }
    }
}

/// Decoupled planner: sequence first, then pick the samples
#[derive(Debug, Clone)]
pub struct DecoupledPlanner<S: TspSolver = LocalSearchSolver> {
    config: DecoupledConfig,
    adapter: EuclideanTspAdapter<S>,
}

impl DecoupledPlanner<LocalSearchSolver> {
    pub fn new(config: DecoupledConfig) -> Self {
        Self::with_solver(config, LocalSearchSolver::default())
    }
}

impl Default for DecoupledPlanner<LocalSearchSolver> {
    fn default() -> Self {
        Self::new(DecoupledConfig::default())
    }
}

impl<S: TspSolver> DecoupledPlanner<S> {
    pub fn with_solver(config: DecoupledConfig, solver: S) -> Self {
        Self {
            config,
            adapter: EuclideanTspAdapter::new(solver),
        }
    }

    pub fn config(&self) -> &DecoupledConfig {
        &self.config
    }

    /// Sample index chosen for each goal of `order`, in the same order
    pub fn select_samples(
        &self,
        order: &[usize],
        samples: &SampleMatrix,
        centers: &[Point2D],
        turning_radius: f64,
    ) -> DtspnResult<Vec<usize>> {
        if order.is_empty() {
            return Ok(Vec::new());
        }

        let anchors = if self.config.multi_start {
            samples.cluster_size()
        } else {
            1
        };

        let mut best: Option<(Vec<usize>, f64)> = None;
        for anchor in 0..anchors {
            let (chain, cost) = greedy_chain(anchor, order, samples, centers, turning_radius)?;
            // strict comparison keeps the lowest anchor on ties
            if best.as_ref().map_or(true, |(_, best_cost)| cost < *best_cost) {
                best = Some((chain, cost));
            }
        }

        best.map(|(chain, _)| chain).ok_or_else(|| {
            DtspnError::InvariantViolation("sample matrix has empty rows".to_string())
        })
    }
}

/// Greedy selection starting from `anchor` in the first goal's row; returns
/// the chosen samples and the closed Dubins cost of the chain.
fn greedy_chain(
    anchor: usize,
    order: &[usize],
    samples: &SampleMatrix,
    centers: &[Point2D],
    turning_radius: f64,
) -> DtspnResult<(Vec<usize>, f64)> {
    let n = order.len();
    let first = samples.get(order[0], anchor);

    let mut chosen = Vec::with_capacity(n);
    chosen.push(anchor);
    let mut prev = first;
    let mut cost = 0.0;

    for k in 1..n {
        let goal = order[k];
        // (sample, score, Dubins distance from prev)
        let mut best: Option<(usize, f64, f64)> = None;

        for (s, candidate) in samples.row(goal).iter().enumerate() {
            let reach = dubins_distance(&prev, candidate, turning_radius)?;
            let lookahead = if k + 1 < n {
                candidate.position().distance(&centers[order[k + 1]])
            } else {
                dubins_distance(candidate, &first, turning_radius)?
            };
            let score = reach + lookahead;
            if best.map_or(true, |(_, best_score, _)| score < best_score) {
                best = Some((s, score, reach));
            }
        }

        let (s, _, reach) = best.ok_or_else(|| {
            DtspnError::InvariantViolation(format!("goal {} has no samples", goal))
        })?;
        chosen.push(s);
        cost += reach;
        prev = samples.get(goal, s);
    }

    cost += dubins_distance(&prev, &first, turning_radius)?;
    Ok((chosen, cost))
}

impl<S: TspSolver> TourPlanner for DecoupledPlanner<S> {
    fn plan(&self, request: &TourRequest) -> DtspnResult<TourPath> {
        request.validate()?;
        request.validate_turning_radius()?;

        let sampler = NeighborhoodSampler::new(self.config.sampling)?;
        let samples = sampler.sample(&request.goals, request.sensing_radius)?;
        let centers = request.centers();

        let order = self.adapter.solve_order(&centers)?;
        let selected = self.select_samples(&order, &samples, &centers, request.turning_radius)?;

        let configurations: Vec<_> = order
            .iter()
            .zip(selected.iter())
            .map(|(&goal, &sample)| samples.get(goal, sample))
            .collect();

        let tour = stitch(&configurations, request.turning_radius)?.with_goal_order(order);
        info!(
            "Decoupled tour over {} goals: length {:.3}, {} samples",
            request.goals.len(),
            tour.length,
            tour.len()
        );
        Ok(tour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Goal;
    use nalgebra::DMatrix;

    struct FixedOrder(Vec<usize>);

    impl TspSolver for FixedOrder {
        fn solve(&self, _distances: &DMatrix<f64>) -> DtspnResult<Vec<usize>> {
            Ok(self.0.clone())
        }
    }

    fn small_config() -> DecoupledConfig {
        DecoupledConfig {
            sampling: SamplingConfig::new(4, 4),
            multi_start: true,
        }
    }

    fn goals() -> Vec<Goal> {
        vec![
            Goal::new(0.0, 0.0),
            Goal::new(12.0, 1.0),
            Goal::new(14.0, 9.0),
            Goal::new(3.0, 11.0),
            Goal::new(-4.0, 6.0),
        ]
    }

    #[test]
    fn test_every_goal_visited_once() {
        let planner = DecoupledPlanner::new(small_config());
        let request = TourRequest::new(goals(), 1.0, 1.5);
        let tour = planner.plan(&request).unwrap();

        let mut order = tour.goal_order.clone();
        order.sort();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        assert_eq!(tour.waypoints.len(), 5);
        for (&goal, waypoint) in tour.goal_order.iter().zip(&tour.waypoints) {
            let d = waypoint.position().distance(&request.goals[goal].center);
            assert!((d - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_uses_solver_order() {
        let planner = DecoupledPlanner::with_solver(small_config(), FixedOrder(vec![3, 1, 4, 0, 2]));
        let tour = planner.plan(&TourRequest::new(goals(), 0.5, 1.0)).unwrap();
        assert_eq!(tour.goal_order, vec![3, 1, 4, 0, 2]);
    }

    #[test]
    fn test_malformed_solver_order_is_rejected() {
        let planner = DecoupledPlanner::with_solver(small_config(), FixedOrder(vec![0, 0, 1, 2, 3]));
        let result = planner.plan(&TourRequest::new(goals(), 0.5, 1.0));
        assert!(matches!(result, Err(DtspnError::PlanningError(_))));
    }

    #[test]
    fn test_multi_start_not_worse_than_single() {
        let request = TourRequest::new(goals(), 1.0, 2.0);
        let multi = DecoupledPlanner::new(small_config()).plan(&request).unwrap();
        let single = DecoupledPlanner::new(DecoupledConfig {
            multi_start: false,
            ..small_config()
        })
        .plan(&request)
        .unwrap();
        assert!(multi.length <= single.length + 1e-9);
    }

    #[test]
    fn test_greedy_prefers_aligned_heading() {
        // two goals on a line, zero sensing radius: heading 0 at the first
        // goal lets the vehicle drive straight to the second
        let planner = DecoupledPlanner::new(DecoupledConfig {
            sampling: SamplingConfig::new(1, 4),
            multi_start: false,
        });
        let goals = vec![Goal::new(0.0, 0.0), Goal::new(20.0, 0.0), Goal::new(40.0, 0.0)];
        let samples = NeighborhoodSampler::new(planner.config().sampling)
            .unwrap()
            .sample(&goals, 0.0)
            .unwrap();
        let centers: Vec<Point2D> = goals.iter().map(|g| g.center).collect();
        let selected = planner.select_samples(&[0, 1, 2], &samples, &centers, 1.0).unwrap();
        assert_eq!(selected[0], 0);
        // heading 0 (index 0) keeps going straight towards the third goal
        assert_eq!(selected[1], 0);
    }

    #[test]
    fn test_invalid_turning_radius() {
        let planner = DecoupledPlanner::new(small_config());
        let result = planner.plan(&TourRequest::new(goals(), 0.5, 0.0));
        assert!(matches!(result, Err(DtspnError::ConfigurationError(_))));
    }
}
