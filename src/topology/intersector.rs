use crate::geometry::GeometryOnSphere;
use crate::math::arc::arc_arc_intersect;
use crate::math::{points_coincide, PointOnSphere};

use super::intersection::{Intersection, SegmentLocation};

/// A crossing between two sections, located along each of them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionIntersection {
    pub position: PointOnSphere,
    /// Location along the first section passed to the intersector.
    pub first: SegmentLocation,
    /// Location along the second section passed to the intersector.
    pub second: SegmentLocation,
}

impl SectionIntersection {
    /// The crossing as seen by the first section.
    #[must_use]
    pub fn on_first(&self) -> Intersection {
        Intersection::new(self.position, self.first)
    }

    /// The crossing as seen by the second section.
    #[must_use]
    pub fn on_second(&self) -> Intersection {
        Intersection::new(self.position, self.second)
    }
}

/// Finds where two adjacent sections meet.
pub trait SectionIntersector: Sync {
    /// Returns every distinct crossing of `first` and `second`, ordered along `first`.
    fn intersect(&self, first: &GeometryOnSphere, second: &GeometryOnSphere) -> Vec<SectionIntersection>;
}

/// Intersects polyline sections arc by arc.
///
/// Points and multi-points never intersect; their neighbours are joined by
/// rubber bands.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreatCircleIntersector;

impl SectionIntersector for GreatCircleIntersector {
    fn intersect(&self, first: &GeometryOnSphere, second: &GeometryOnSphere) -> Vec<SectionIntersection> {
        let (GeometryOnSphere::Polyline(a), GeometryOnSphere::Polyline(b)) = (first, second) else {
            return Vec::new();
        };

        let mut hits: Vec<SectionIntersection> = Vec::new();
        for (i, arc_a) in a.windows(2).enumerate() {
            for (j, arc_b) in b.windows(2).enumerate() {
                let Some(hit) = arc_arc_intersect(&arc_a[0], &arc_a[1], &arc_b[0], &arc_b[1]) else {
                    continue;
                };
                // A crossing at a shared vertex is found on both arcs meeting there.
                if hits.iter().any(|h| points_coincide(&h.position, &hit.point)) {
                    continue;
                }
                hits.push(SectionIntersection {
                    position: hit.point,
                    first: SegmentLocation::new(i, hit.ratio_a),
                    second: SegmentLocation::new(j, hit.ratio_b),
                });
            }
        }

        hits.sort_by(|x, y| x.first.distance_along().total_cmp(&y.first.distance_along()));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::lat_lon;

    fn polyline(points: &[(f64, f64)]) -> GeometryOnSphere {
        GeometryOnSphere::Polyline(points.iter().map(|&(lat, lon)| lat_lon(lat, lon)).collect())
    }

    #[test]
    fn single_crossing_is_located_on_both() {
        let a = polyline(&[(0.0, -20.0), (0.0, -10.0), (0.0, 10.0)]);
        let b = polyline(&[(-10.0, 0.0), (10.0, 0.0)]);
        let hits = GreatCircleIntersector.intersect(&a, &b);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].first.segment_index(), 1);
        assert!(!hits[0].first.on_segment_start());
        assert_eq!(hits[0].second.segment_index(), 0);
    }

    #[test]
    fn crossing_at_shared_vertex_is_reported_once() {
        let a = polyline(&[(0.0, -10.0), (0.0, 0.0), (0.0, 10.0)]);
        let b = polyline(&[(-10.0, 0.0), (10.0, 0.0)]);
        let hits = GreatCircleIntersector.intersect(&a, &b);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].first, SegmentLocation::AtVertex(1));
    }

    #[test]
    fn t_junction_at_last_vertex_uses_sentinel() {
        let a = polyline(&[(10.0, 0.0), (0.0, 0.0)]);
        let b = polyline(&[(0.0, -10.0), (0.0, 10.0)]);
        let hits = GreatCircleIntersector.intersect(&a, &b);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].first, SegmentLocation::AtVertex(1));
        assert_eq!(hits[0].second.segment_index(), 0);
    }

    #[test]
    fn multiple_crossings_are_ordered_along_first() {
        let a = polyline(&[(0.0, -20.0), (0.0, 20.0)]);
        let b = polyline(&[(-5.0, 10.0), (5.0, 10.0), (5.0, -10.0), (-5.0, -10.0)]);
        let hits = GreatCircleIntersector.intersect(&a, &b);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].first.distance_along() < hits[1].first.distance_along());
        assert_eq!(hits[0].second.segment_index(), 2);
        assert_eq!(hits[1].second.segment_index(), 0);
    }

    #[test]
    fn points_never_intersect() {
        let a = GeometryOnSphere::Point(lat_lon(0.0, 0.0));
        let b = polyline(&[(0.0, -10.0), (0.0, 10.0)]);
        assert!(GreatCircleIntersector.intersect(&a, &b).is_empty());
    }
}
