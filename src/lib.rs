pub mod error;
pub mod feature;
pub mod geometry;
pub mod math;
pub mod reconstruction;
pub mod topology;
pub mod topology_utils;
pub mod triangulation;

pub use error::{ResolveError, Result};
