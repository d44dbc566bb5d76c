// Curvature-constrained path primitives

pub mod dubins_path;

pub use dubins_path::*;
