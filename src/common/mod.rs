//! Common types, traits, and error definitions for rust_dtspn
//!
//! This module provides the foundational building blocks shared by the
//! sampling, geometry and tour planning modules.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
