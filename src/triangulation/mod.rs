mod delaunay;

pub use delaunay::DelaunayTriangulator;

use crate::error::TriangulationError;
use crate::math::PointOnSphere;

/// Parameters controlling network triangulation quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangulationParams {
    /// Controls the minimum triangle angle, `asin(sqrt(shape_factor))`. Zero
    /// disables angle refinement.
    pub shape_factor: f64,
    /// Longest allowed triangle edge, in radians. Zero means unlimited.
    pub max_edge_length: f64,
    /// Maximum number of vertices refinement may add.
    pub max_refinement_vertices: usize,
}

impl Default for TriangulationParams {
    fn default() -> Self {
        Self {
            shape_factor: 0.125,
            max_edge_length: 0.0,
            max_refinement_vertices: 10_000,
        }
    }
}

impl TriangulationParams {
    /// Minimum triangle angle in radians, capped at 30 degrees.
    #[must_use]
    pub fn min_angle(&self) -> f64 {
        self.shape_factor
            .clamp(0.0, 1.0)
            .sqrt()
            .asin()
            .min(30f64.to_radians())
    }
}

/// Everything a triangulation engine needs to triangulate one network.
#[derive(Debug, Clone, Default)]
pub struct TriangulationInput {
    /// The network boundary ring.
    pub boundary: Vec<PointOnSphere>,
    /// Interior polygon rings, inserted as closed constraints.
    pub interior_polygons: Vec<Vec<PointOnSphere>>,
    /// Interior polylines, inserted as open constraints.
    pub interior_polylines: Vec<Vec<PointOnSphere>>,
    /// Isolated interior points.
    pub interior_points: Vec<PointOnSphere>,
    /// Points marking regions to leave untriangulated.
    pub seeds: Vec<PointOnSphere>,
    pub params: TriangulationParams,
}

/// Triangles on the sphere.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triangulation {
    pub vertices: Vec<PointOnSphere>,
    /// Vertex indices of each triangle.
    pub triangles: Vec<[usize; 3]>,
}

impl Triangulation {
    #[must_use]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Triangulates the region enclosed by a network boundary.
pub trait TriangulationEngine: Sync {
    /// # Errors
    ///
    /// Returns an error if the boundary is degenerate or cannot be triangulated.
    fn triangulate(&self, input: &TriangulationInput) -> Result<Triangulation, TriangulationError>;
}
