pub mod geometry_resolver;
pub mod intersection;
pub mod intersector;
pub mod network_resolver;
pub mod resolved;
pub mod ring;
pub mod section;
pub mod sub_segment;

pub use geometry_resolver::{ResolveTopologicalGeometry, ResolvedTopologicalGeometry};
pub use intersection::{Intersection, IntersectionOrRubberBand, RubberBand, SegmentLocation};
pub use intersector::{GreatCircleIntersector, SectionIntersection, SectionIntersector};
pub use network_resolver::ResolveTopologicalNetwork;
pub use resolved::{
    ResolvedNetworkInterior, ResolvedSubSegment, ResolvedTopologicalBoundary, ResolvedTopologicalLine,
    ResolvedTopologicalNetwork,
};
pub use section::Section;
pub use sub_segment::ResolvedSubSegmentRangeInSection;

use crate::reconstruction::ReconstructHandle;

/// The reconstruction time, output handle and section scope of one resolution batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveContext {
    pub reconstruction_time: f64,
    /// Handle tagging every resolved output of the batch.
    pub reconstruct_handle: ReconstructHandle,
    /// Only section geometries tagged with one of these handles are used.
    /// `None` accepts any.
    pub scope: Option<Vec<ReconstructHandle>>,
}

impl ResolveContext {
    #[must_use]
    pub fn scope(&self) -> Option<&[ReconstructHandle]> {
        self.scope.as_deref()
    }
}
