//! Common traits defining interfaces for tour planning algorithms

use nalgebra::DMatrix;

use crate::common::error::DtspnError;
use crate::common::types::*;

/// Trait for closed-tour planners over goal regions
pub trait TourPlanner {
    /// Plan a closed tour visiting every goal's neighborhood exactly once
    fn plan(&self, request: &TourRequest) -> Result<TourPath, DtspnError>;
}

/// Trait for discrete (symmetric or asymmetric) TSP solvers
pub trait TspSolver {
    /// Return a cyclic visiting order, a permutation of `0..distances.nrows()`.
    /// `distances[(i, j)]` is the cost of the arc i -> j; non-finite entries
    /// are forbidden arcs.
    fn solve(&self, distances: &DMatrix<f64>) -> Result<Vec<usize>, DtspnError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that traits compile correctly
    struct IdentitySolver;

    impl TspSolver for IdentitySolver {
        fn solve(&self, distances: &DMatrix<f64>) -> Result<Vec<usize>, DtspnError> {
            Ok((0..distances.nrows()).collect())
        }
    }

    struct DummyPlanner;

    impl TourPlanner for DummyPlanner {
        fn plan(&self, request: &TourRequest) -> Result<TourPath, DtspnError> {
            request.validate()?;
            Ok(TourPath::new().with_goal_order((0..request.goals.len()).collect()))
        }
    }

    #[test]
    fn test_tsp_solver_trait() {
        let solver = IdentitySolver;
        let order = solver.solve(&DMatrix::zeros(3, 3)).unwrap();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_tour_planner_trait() {
        let planner = DummyPlanner;
        let request = TourRequest::new(vec![Goal::new(0.0, 0.0), Goal::new(1.0, 1.0)], 0.0, 1.0);
        let tour = planner.plan(&request).unwrap();
        assert_eq!(tour.goal_order, vec![0, 1]);
    }
}
