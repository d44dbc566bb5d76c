//! Noon-Bean DTSPN planner
//!
//! The generalized problem (visit exactly one sample per goal) is rewritten
//! as a single asymmetric TSP over all samples:
//!
//! - every goal's samples form a cluster with a fixed cyclic order, and the
//!   arc from a node to its in-cluster successor costs zero;
//! - an arc i -> j into another cluster costs `cost(successor(i), j) + BIG`,
//!   since a cluster entered at node e is left from the predecessor of e;
//! - every other in-cluster arc is forbidden.
//!
//! `BIG` exceeds any tour made of true costs, so a good ATSP tour enters each
//! cluster once, walks it along the zero arcs and leaves. The entry node of
//! each cluster is the sample chosen for that goal.
//!
//! Reference: Noon, C. E., & Bean, J. C. (1993).
//! "An efficient transformation of the generalized traveling salesman problem"

use log::info;
use nalgebra::DMatrix;

use crate::common::{DtspnError, DtspnResult, TourPath, TourPlanner, TourRequest, TspSolver};
use crate::tour_planning::geometry::{dubins_distance, stitch};
use crate::tour_planning::sampling::{NeighborhoodSampler, SampleMatrix, SamplingConfig};
use crate::tour_planning::tsp_solver::{validate_permutation, LocalSearchConfig, LocalSearchSolver};

/// True cost of moving between two samples of different goals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCost {
    /// Shortest Dubins path length
    Dubins,
    /// Straight-line distance, headings ignored
    Euclidean,
}

/// Configuration for the Noon-Bean planner
#[derive(Debug, Clone)]
pub struct NoonBeanConfig {
    pub sampling: SamplingConfig,
    pub transition_cost: TransitionCost,
}

impl Default for NoonBeanConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            transition_cost: TransitionCost::Dubins,
        }
    }
}

/// Successor of flat node `i` in its cluster's cyclic order
pub fn successor(i: usize, cluster_size: usize) -> usize {
    let base = i - i % cluster_size;
    base + (i % cluster_size + 1) % cluster_size
}

/// True transition costs between all samples; in-cluster entries stay zero
/// since the transformation never reads them.
pub fn transition_cost_matrix(
    samples: &SampleMatrix,
    transition_cost: TransitionCost,
    turning_radius: f64,
) -> DtspnResult<DMatrix<f64>> {
    let flat = samples.flatten();
    let m = samples.cluster_size();
    let n = flat.len();

    let mut costs = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            if i / m == j / m {
                continue;
            }
            costs[(i, j)] = match transition_cost {
                TransitionCost::Dubins => dubins_distance(&flat[i], &flat[j], turning_radius)?,
                TransitionCost::Euclidean => flat[i].position().distance(&flat[j].position()),
            };
        }
    }
    Ok(costs)
}

/// Penalty added to every inter-cluster arc
pub fn big_penalty(true_costs: &DMatrix<f64>, samples: &SampleMatrix) -> f64 {
    let max_cost = true_costs.iter().fold(0.0_f64, |acc, &v| acc.max(v));
    samples.goal_count() as f64 * max_cost + 1.0
}

/// Asymmetric TSP matrix of the Noon-Bean transformation
pub fn build_noon_bean_matrix(true_costs: &DMatrix<f64>, samples: &SampleMatrix) -> DMatrix<f64> {
    let m = samples.cluster_size();
    let n = samples.len();
    let big = big_penalty(true_costs, samples);

    DMatrix::from_fn(n, n, |i, j| {
        let next = successor(i, m);
        if i / m != j / m {
            true_costs[(next, j)] + big
        } else if j == next {
            0.0
        } else {
            f64::INFINITY
        }
    })
}

/// Extract the (goal, sample) entered in each cluster, in tour order starting
/// at goal 0.
///
/// Any in-cluster move other than the successor arc, or a cluster entered
/// zero or several times, means the transformation or the solver is broken.
pub fn decode_tour(tour: &[usize], samples: &SampleMatrix) -> DtspnResult<Vec<(usize, usize)>> {
    let m = samples.cluster_size();
    let goals = samples.goal_count();
    let len = tour.len();

    if len != samples.len() {
        return Err(DtspnError::InvariantViolation(format!(
            "tour has {} nodes, transformation has {}",
            len,
            samples.len()
        )));
    }
    if goals == 0 {
        return Ok(Vec::new());
    }

    let mut entered = vec![false; goals];
    let mut picks = Vec::with_capacity(goals);

    for k in 0..len {
        let u = tour[k];
        let v = tour[(k + 1) % len];
        let (cu, cv) = (u / m, v / m);

        if cu == cv {
            if v != successor(u, m) {
                return Err(DtspnError::InvariantViolation(format!(
                    "tour jumps from node {} to {} inside cluster {}",
                    u, v, cu
                )));
            }
        } else {
            if entered[cv] {
                return Err(DtspnError::InvariantViolation(format!(
                    "cluster {} is entered more than once",
                    cv
                )));
            }
            entered[cv] = true;
            picks.push((cv, v % m));
        }
    }

    if goals == 1 {
        // a lone cluster is never entered from outside; the tour start is its pick
        picks.push((0, tour[0] % m));
    } else if let Some(missing) = entered.iter().position(|&e| !e) {
        return Err(DtspnError::InvariantViolation(format!(
            "cluster {} is never entered",
            missing
        )));
    }

    if let Some(pos) = picks.iter().position(|&(goal, _)| goal == 0) {
        picks.rotate_left(pos);
    }
    Ok(picks)
}

/// Noon-Bean planner: one asymmetric TSP over all samples
#[derive(Debug, Clone)]
pub struct NoonBeanPlanner<S: TspSolver = LocalSearchSolver> {
    config: NoonBeanConfig,
    solver: S,
}

impl NoonBeanPlanner<LocalSearchSolver> {
    /// Default solver works on whole clusters: it re-picks entry nodes and
    /// relocates runs of up to three clusters.
    pub fn new(config: NoonBeanConfig) -> Self {
        let solver = LocalSearchSolver::new(LocalSearchConfig {
            restarts: 4,
            max_passes: 50,
            max_segment_len: 3,
            cluster_size: Some(config.sampling.cluster_size()),
        });
        Self::with_solver(config, solver)
    }
}

impl Default for NoonBeanPlanner<LocalSearchSolver> {
    fn default() -> Self {
        Self::new(NoonBeanConfig::default())
    }
}

impl<S: TspSolver> NoonBeanPlanner<S> {
    pub fn with_solver(config: NoonBeanConfig, solver: S) -> Self {
        Self { config, solver }
    }

    pub fn config(&self) -> &NoonBeanConfig {
        &self.config
    }
}

impl<S: TspSolver> TourPlanner for NoonBeanPlanner<S> {
    fn plan(&self, request: &TourRequest) -> DtspnResult<TourPath> {
        request.validate()?;
        request.validate_turning_radius()?;

        let sampler = NeighborhoodSampler::new(self.config.sampling)?;
        let samples = sampler.sample(&request.goals, request.sensing_radius)?;

        let true_costs = transition_cost_matrix(&samples, self.config.transition_cost, request.turning_radius)?;
        let atsp = build_noon_bean_matrix(&true_costs, &samples);

        let tour = self.solver.solve(&atsp)?;
        validate_permutation(&tour, atsp.nrows())?;
        let picks = decode_tour(&tour, &samples)?;

        let order: Vec<usize> = picks.iter().map(|&(goal, _)| goal).collect();
        let configurations: Vec<_> = picks
            .iter()
            .map(|&(goal, sample)| samples.get(goal, sample))
            .collect();

        let tour = stitch(&configurations, request.turning_radius)?.with_goal_order(order);
        info!(
            "Noon-Bean tour over {} goals ({} ATSP nodes): length {:.3}",
            request.goals.len(),
            atsp.nrows(),
            tour.length
        );
        Ok(tour)
    }
}
