//! Tour planners for the Dubins TSP with neighborhoods
//!
//! Decoupled and Noon-Bean plan over sampled configurations and stitch the
//! result with Dubins paths; SOM relaxes a neuron ring onto the neighborhoods
//! and returns a Euclidean polygon.

pub mod sampling;
pub mod geometry;
pub mod tsp_solver;
pub mod euclidean_tsp;
pub mod decoupled;
pub mod noon_bean;
pub mod som;

pub use sampling::{sample_neighborhoods, NeighborhoodSampler, SampleMatrix, SamplingConfig};
pub use geometry::{configuration_to_pose, dubins_distance, pose_to_configuration, stitch, SAMPLING_STEP_RATIO};
pub use tsp_solver::{validate_permutation, LocalSearchConfig, LocalSearchSolver};
pub use euclidean_tsp::EuclideanTspAdapter;
pub use decoupled::{DecoupledConfig, DecoupledPlanner};
pub use noon_bean::{build_noon_bean_matrix, decode_tour, NoonBeanConfig, NoonBeanPlanner, TransitionCost};
pub use som::{EpochSnapshot, Neuron, SomConfig, SomOutcome, SomPlanner};
