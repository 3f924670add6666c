use super::arc::{midpoint, point_on_arc};
use super::{PointOnSphere, Vector3, COINCIDENT_TOLERANCE, TOLERANCE};

/// Point-in-polygon test for a ring of points on the sphere.
///
/// The ring's inside is the region not containing the antipode of its
/// centroid. The test counts how often the great-circle arc from `point` to
/// that antipode crosses the ring. Returns `true` if the point is inside or on
/// the boundary.
#[must_use]
pub fn polygon_contains_point(ring: &[PointOnSphere], point: &PointOnSphere) -> bool {
    if ring.len() < 3 {
        return false;
    }
    on_boundary(ring, point) || crosses_odd_times(ring, point)
}

fn on_boundary(ring: &[PointOnSphere], point: &PointOnSphere) -> bool {
    ring_edges(ring).any(|(a, b)| point_on_arc(point, a, b))
}

fn crosses_odd_times(ring: &[PointOnSphere], point: &PointOnSphere) -> bool {
    let Some(centre) = centroid(ring) else {
        return false;
    };
    let p = point.into_inner();
    let outside = -centre.into_inner();
    if (p - outside).norm() < COINCIDENT_TOLERANCE {
        return false;
    }
    if (p + outside).norm() < COINCIDENT_TOLERANCE {
        // No unique arc to the antipode; go through a point a quarter turn away.
        let via = perpendicular(&p);
        return (arc_crossings(ring, &p, &via) + arc_crossings(ring, &via, &outside)) % 2 == 1;
    }
    arc_crossings(ring, &p, &outside) % 2 == 1
}

/// Number of ring edges crossing the minor arc `from → to`.
///
/// An edge vertex lying on the arc's great circle counts as being on its
/// positive side, so a ring passing through the arc at a vertex is counted once.
fn arc_crossings(ring: &[PointOnSphere], from: &Vector3, to: &Vector3) -> usize {
    let normal = from.cross(to);
    ring_edges(ring)
        .filter(|(a, b)| {
            let (a, b) = (a.into_inner(), b.into_inner());
            let (da, db) = (normal.dot(&a), normal.dot(&b));
            if (da >= 0.0) == (db >= 0.0) {
                return false;
            }
            let x = a + (b - a) * (da / (da - db));
            x.norm() >= TOLERANCE && from.cross(&x).dot(&normal) >= 0.0 && x.cross(to).dot(&normal) >= 0.0
        })
        .count()
}

/// A unit vector perpendicular to `v`.
fn perpendicular(v: &Vector3) -> Vector3 {
    let axis = if v.x.abs() <= v.y.abs() && v.x.abs() <= v.z.abs() {
        Vector3::x()
    } else if v.y.abs() <= v.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    v.cross(&axis).normalize()
}

/// Iterates the edges of a closed ring, including the closing edge.
pub fn ring_edges(ring: &[PointOnSphere]) -> impl Iterator<Item = (&PointOnSphere, &PointOnSphere)> {
    let n = ring.len();
    (0..n).map(move |i| (&ring[i], &ring[(i + 1) % n]))
}

/// Normalized vector mean of the points, or `None` if they cancel out.
#[must_use]
pub fn centroid(points: &[PointOnSphere]) -> Option<PointOnSphere> {
    let sum: Vector3 = points.iter().map(|p| p.into_inner()).sum();
    (sum.norm() >= TOLERANCE).then(|| PointOnSphere::new_normalize(sum))
}

/// Finds a point strictly inside a polygon ring.
///
/// Tries the centroid first, then the centroids of the triangles fanned from
/// the first vertex, then edge midpoints nudged towards the centroid.
#[must_use]
pub fn interior_point(ring: &[PointOnSphere]) -> Option<PointOnSphere> {
    if ring.len() < 3 {
        return None;
    }
    let strictly_inside = |p: &PointOnSphere| !on_boundary(ring, p) && crosses_odd_times(ring, p);

    let center = centroid(ring);
    if let Some(c) = center.filter(|c| strictly_inside(c)) {
        return Some(c);
    }
    let fan = (1..ring.len() - 1).filter_map(|i| centroid(&[ring[0], ring[i], ring[i + 1]]));
    let nudged = ring_edges(ring).filter_map(|(a, b)| {
        let m = midpoint(a, b);
        center.map(|c| midpoint(&m, &midpoint(&m, &c)))
    });
    fan.chain(nudged).find(|p| strictly_inside(p))
}

/// A spherical cap enclosing a set of points, used for quick rejection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSmallCircle {
    centre: PointOnSphere,
    cos_radius: f64,
}

impl BoundingSmallCircle {
    /// Builds the cap centred on the points' centroid.
    ///
    /// Returns `None` when the points do not fit in an open hemisphere around
    /// their centroid, where a cap cannot bound the arcs between them.
    #[must_use]
    pub fn from_points(points: &[PointOnSphere]) -> Option<Self> {
        let centre = centroid(points)?;
        let cos_radius = points
            .iter()
            .map(|p| p.dot(centre.as_ref()))
            .fold(1.0_f64, f64::min);
        (cos_radius > TOLERANCE).then_some(Self { centre, cos_radius })
    }

    /// The cap centre.
    #[must_use]
    pub fn centre(&self) -> &PointOnSphere {
        &self.centre
    }

    /// Returns `false` only if the point is definitely outside the cap.
    #[must_use]
    pub fn may_contain(&self, point: &PointOnSphere) -> bool {
        point.dot(self.centre.as_ref()) >= self.cos_radius - TOLERANCE
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::lat_lon;

    fn square() -> Vec<PointOnSphere> {
        vec![
            lat_lon(-10.0, -10.0),
            lat_lon(-10.0, 10.0),
            lat_lon(10.0, 10.0),
            lat_lon(10.0, -10.0),
        ]
    }

    #[test]
    fn contains_centre_not_outside() {
        let ring = square();
        assert!(polygon_contains_point(&ring, &lat_lon(0.0, 0.0)));
        assert!(polygon_contains_point(&ring, &lat_lon(9.0, -9.0)));
        assert!(!polygon_contains_point(&ring, &lat_lon(0.0, 20.0)));
        assert!(!polygon_contains_point(&ring, &lat_lon(0.0, 180.0)));
    }

    #[test]
    fn orientation_does_not_matter() {
        let mut ring = square();
        ring.reverse();
        assert!(polygon_contains_point(&ring, &lat_lon(1.0, 1.0)));
        assert!(!polygon_contains_point(&ring, &lat_lon(30.0, 1.0)));
    }

    #[test]
    fn boundary_counts_as_inside() {
        let ring = square();
        assert!(polygon_contains_point(&ring, &lat_lon(-10.0, -10.0)));
    }

    #[test]
    fn antipodal_image_is_outside() {
        let ring = square();
        assert!(!polygon_contains_point(&ring, &lat_lon(3.0, 175.0)));
        assert!(!polygon_contains_point(&ring, &lat_lon(-5.0, -172.0)));
        let mut reversed = ring.clone();
        reversed.reverse();
        assert!(!polygon_contains_point(&reversed, &lat_lon(0.0, 180.0)));
    }

    #[test]
    fn ring_centroid_is_inside() {
        let ring = square();
        let c = centroid(&ring).unwrap();
        assert!(polygon_contains_point(&ring, &c));
    }

    /// A band from 45°S to 60°N spanning 300° of longitude.
    fn band() -> Vec<PointOnSphere> {
        let south = (0..=6).map(|i| lat_lon(-45.0, f64::from(i) * 50.0));
        let north = (0..=6).rev().map(|i| lat_lon(60.0, f64::from(i) * 50.0));
        south.chain(north).collect()
    }

    #[test]
    fn polygon_larger_than_hemisphere() {
        let ring = band();
        assert!(BoundingSmallCircle::from_points(&ring).is_none());
        for (lat, lon) in [(10.0, 150.0), (0.0, 25.0), (0.0, 275.0), (-40.0, 150.0), (55.0, 150.0)] {
            assert!(polygon_contains_point(&ring, &lat_lon(lat, lon)), "({lat}, {lon})");
        }
        for (lat, lon) in [(10.0, 330.0), (0.0, -30.0), (-80.0, 0.0), (80.0, 150.0)] {
            assert!(!polygon_contains_point(&ring, &lat_lon(lat, lon)), "({lat}, {lon})");
        }
    }

    #[test]
    fn crossing_at_a_vertex_counts_once() {
        // Arcs from the test points to (0, 180) run along the equator through
        // the vertices at (0, 10) and (0, -10).
        let diamond = vec![lat_lon(0.0, 10.0), lat_lon(10.0, 0.0), lat_lon(0.0, -10.0), lat_lon(-10.0, 0.0)];
        assert!(polygon_contains_point(&diamond, &lat_lon(0.0, 5.0)));
        assert!(polygon_contains_point(&diamond, &lat_lon(0.0, -5.0)));
        assert!(!polygon_contains_point(&diamond, &lat_lon(0.0, 15.0)));
    }

    #[test]
    fn degenerate_ring_contains_nothing() {
        let ring = vec![lat_lon(0.0, 0.0), lat_lon(0.0, 1.0)];
        assert!(!polygon_contains_point(&ring, &lat_lon(0.0, 0.5)));
    }

    #[test]
    fn interior_point_of_concave_ring() {
        // A "C" shape whose centroid falls in the notch.
        let ring = vec![
            lat_lon(0.0, 0.0),
            lat_lon(0.0, 10.0),
            lat_lon(2.0, 10.0),
            lat_lon(2.0, 2.0),
            lat_lon(8.0, 2.0),
            lat_lon(8.0, 10.0),
            lat_lon(10.0, 10.0),
            lat_lon(10.0, 0.0),
        ];
        let p = interior_point(&ring).unwrap();
        assert!(polygon_contains_point(&ring, &p));
    }

    #[test]
    fn bounding_circle_rejects_far_points() {
        let bounds = BoundingSmallCircle::from_points(&square()).unwrap();
        assert!(bounds.may_contain(&lat_lon(0.0, 0.0)));
        assert!(bounds.may_contain(&lat_lon(10.0, 10.0)));
        assert!(!bounds.may_contain(&lat_lon(45.0, 90.0)));
    }
}
