use std::ops::Range;

use crate::error::TriangulationError;
use crate::feature::FeatureId;
use crate::geometry::GeometryOnSphere;
use crate::math::polygon_sphere::polygon_contains_point;
use crate::math::{points_coincide, PointOnSphere};
use crate::reconstruction::ReconstructHandle;
use crate::triangulation::Triangulation;

use super::sub_segment::ResolvedSubSegmentRangeInSection;

/// One section's contribution to a resolved topology.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSubSegment {
    /// The feature the section geometry was reconstructed from.
    pub source: FeatureId,
    pub range: ResolvedSubSegmentRangeInSection,
    /// The section was traversed from its last vertex to its first.
    pub use_reverse: bool,
    /// Indices of this sub-segment's points within the resolved points.
    pub point_range: Range<usize>,
}

impl ResolvedSubSegment {
    /// The sub-segment's points in traversal order.
    #[must_use]
    pub fn points(&self, include_rubber_band_points: bool) -> Vec<PointOnSphere> {
        self.range
            .reversed_geometry_points(self.use_reverse, include_rubber_band_points)
    }
}

/// A polyline assembled from clipped sections.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTopologicalLine {
    pub feature: FeatureId,
    pub reconstruct_handle: ReconstructHandle,
    pub points: Vec<PointOnSphere>,
    pub sub_segments: Vec<ResolvedSubSegment>,
}

impl ResolvedTopologicalLine {
    /// The resolved geometry: a polyline, or a point if only one point resolved.
    #[must_use]
    pub fn geometry(&self) -> GeometryOnSphere {
        GeometryOnSphere::from_points(self.points.clone())
    }
}

/// A closed ring assembled from clipped sections.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTopologicalBoundary {
    pub feature: FeatureId,
    pub reconstruct_handle: ReconstructHandle,
    /// Ring points; the closing edge back to the first point is implicit.
    pub points: Vec<PointOnSphere>,
    pub sub_segments: Vec<ResolvedSubSegment>,
    /// The ring has at least three distinct points.
    pub is_valid_polygon: bool,
}

impl ResolvedTopologicalBoundary {
    #[must_use]
    pub fn new(
        feature: FeatureId,
        reconstruct_handle: ReconstructHandle,
        points: Vec<PointOnSphere>,
        sub_segments: Vec<ResolvedSubSegment>,
    ) -> Self {
        let is_valid_polygon = count_distinct_in_ring(&points) >= 3;
        Self {
            feature,
            reconstruct_handle,
            points,
            sub_segments,
            is_valid_polygon,
        }
    }

    /// The resolved geometry: a polygon when valid, else the points as a
    /// polyline or single point.
    #[must_use]
    pub fn geometry(&self) -> GeometryOnSphere {
        if self.is_valid_polygon {
            return GeometryOnSphere::Polygon(self.points.clone());
        }
        GeometryOnSphere::from_points(self.points.clone())
    }

    /// Returns `true` if `point` is inside or on the boundary.
    ///
    /// Always `false` for an invalid polygon.
    #[must_use]
    pub fn contains_point(&self, point: &PointOnSphere) -> bool {
        self.is_valid_polygon && polygon_contains_point(&self.points, point)
    }
}

/// A geometry inside a network boundary that constrains its triangulation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNetworkInterior {
    pub source: FeatureId,
    pub geometry: GeometryOnSphere,
}

/// A network: its boundary, interior geometries and triangulation.
#[derive(Debug, Clone)]
pub struct ResolvedTopologicalNetwork {
    pub feature: FeatureId,
    pub reconstruct_handle: ReconstructHandle,
    pub boundary: ResolvedTopologicalBoundary,
    pub interiors: Vec<ResolvedNetworkInterior>,
    /// One point inside each interior polygon; triangles reached from a seed
    /// without crossing a constraint are left out of the triangulation.
    pub seeds: Vec<PointOnSphere>,
    pub triangulation: Result<Triangulation, TriangulationError>,
}

/// Number of points in a ring after merging runs of coincident neighbours.
fn count_distinct_in_ring(points: &[PointOnSphere]) -> usize {
    let mut distinct: Vec<&PointOnSphere> = Vec::with_capacity(points.len());
    for point in points {
        if distinct.last().is_none_or(|last| !points_coincide(last, point)) {
            distinct.push(point);
        }
    }
    while distinct.len() > 1 && distinct.first().zip(distinct.last()).is_some_and(|(a, b)| points_coincide(a, b)) {
        distinct.pop();
    }
    distinct.len()
}
