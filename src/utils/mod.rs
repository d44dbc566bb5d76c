//! Utility modules for rust_dtspn

pub mod problem;
pub mod visualization;

pub use problem::{load_problem, parse_problem, Problem};
pub use visualization::{colors, PathStyle, PointStyle, Visualizer};
