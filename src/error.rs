use thiserror::Error;

use crate::feature::FeatureId;

/// Top-level error type for topology resolution.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Triangulation(#[from] TriangulationError),
}

/// Errors related to geometric computations.
#[derive(Debug, Clone, Error)]
pub enum GeometryError {
    #[error("geometry has no points")]
    EmptyGeometry,

    #[error("a polygon cannot contribute a sub-segment to a topology")]
    PolygonNotAllowed,
}

/// Precondition violations detected while resolving a topological feature.
#[derive(Debug, Clone, Error)]
pub enum TopologyError {
    #[error("feature not found: {0}")]
    FeatureNotFound(String),

    #[error("section {section:?} has a polygon geometry, expected a point, multi-point or polyline")]
    PolygonSection { section: FeatureId },

    #[error("feature is not a topological {0}")]
    NotTopological(&'static str),
}

/// Errors reported by a triangulation engine.
#[derive(Debug, Clone, Error)]
pub enum TriangulationError {
    #[error("network boundary has {0} points, at least 3 are required")]
    DegenerateBoundary(usize),

    #[error("network does not fit in a hemisphere and cannot be projected")]
    ProjectionOutOfRange,

    #[error("triangulation failed: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`ResolveError`].
pub type Result<T> = std::result::Result<T, ResolveError>;
