//! Euclidean TSP over goal centers
//!
//! Builds the symmetric distance matrix between goal centers and hands it to
//! a `TspSolver`; the returned order is checked to be a permutation.

use nalgebra::DMatrix;

use crate::common::{DtspnResult, Point2D, TspSolver};
use crate::tour_planning::tsp_solver::{validate_permutation, LocalSearchSolver};

/// Visiting order of goal centers via a discrete TSP solver
#[derive(Debug, Clone)]
pub struct EuclideanTspAdapter<S: TspSolver = LocalSearchSolver> {
    solver: S,
}

impl<S: TspSolver> EuclideanTspAdapter<S> {
    pub fn new(solver: S) -> Self {
        Self { solver }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Pairwise Euclidean distances between centers
    pub fn distance_matrix(centers: &[Point2D]) -> DMatrix<f64> {
        let n = centers.len();
        DMatrix::from_fn(n, n, |i, j| centers[i].distance(&centers[j]))
    }

    pub fn solve_order(&self, centers: &[Point2D]) -> DtspnResult<Vec<usize>> {
        let distances = Self::distance_matrix(centers);
        let order = self.solver.solve(&distances)?;
        validate_permutation(&order, centers.len())?;
        Ok(order)
    }
}

impl Default for EuclideanTspAdapter<LocalSearchSolver> {
    fn default() -> Self {
        Self::new(LocalSearchSolver::default())
    }
}
