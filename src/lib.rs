//! RustDTSPN - Dubins traveling salesman problem with neighborhoods
//!
//! This crate plans closed tours that visit a circular neighborhood around
//! every goal, either with curvature-constrained Dubins paths (decoupled and
//! Noon-Bean planners) or as a Euclidean polygon (self-organizing map).

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod path_planning;
pub mod tour_planning;

// Re-export common types for convenience
pub use common::{Configuration, Goal, Point2D, Pose3D, TourPath, TourRequest};
pub use common::{TourPlanner, TspSolver};
pub use common::{DtspnError, DtspnResult};
pub use tour_planning::{DecoupledPlanner, NoonBeanPlanner, SomPlanner};
