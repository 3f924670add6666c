use super::{points_coincide, PointOnSphere, Vector3, COINCIDENT_TOLERANCE, TOLERANCE};

/// Angular distance between two points on the sphere, in radians.
#[must_use]
pub fn angular_distance(a: &PointOnSphere, b: &PointOnSphere) -> f64 {
    let (a, b) = (a.into_inner(), b.into_inner());
    a.cross(&b).norm().atan2(a.dot(&b))
}

/// Great-circle midpoint of `a` and `b` (or `a` if they are antipodal).
#[must_use]
pub fn midpoint(a: &PointOnSphere, b: &PointOnSphere) -> PointOnSphere {
    let sum = a.into_inner() + b.into_inner();
    if sum.norm() < TOLERANCE {
        return *a;
    }
    PointOnSphere::new_normalize(sum)
}

/// Fraction of the arc `start → end` covered when travelling from `start` to `point`.
///
/// Zero-length arcs have ratio 0.
#[must_use]
pub fn arc_ratio(start: &PointOnSphere, end: &PointOnSphere, point: &PointOnSphere) -> f64 {
    let length = angular_distance(start, end);
    if length < TOLERANCE {
        return 0.0;
    }
    (angular_distance(start, point) / length).clamp(0.0, 1.0)
}

/// Returns `true` if `point` lies on the minor great-circle arc `start → end`
/// (endpoints included, within [`COINCIDENT_TOLERANCE`]).
#[must_use]
pub fn point_on_arc(point: &PointOnSphere, start: &PointOnSphere, end: &PointOnSphere) -> bool {
    if points_coincide(point, start) || points_coincide(point, end) {
        return true;
    }
    let Some(normal) = arc_normal(start, end) else {
        return false;
    };
    let p = point.into_inner();
    if p.dot(&normal).abs() > COINCIDENT_TOLERANCE {
        return false;
    }
    start.into_inner().cross(&p).dot(&normal) >= -COINCIDENT_TOLERANCE
        && p.cross(&end.into_inner()).dot(&normal) >= -COINCIDENT_TOLERANCE
}

/// A crossing between two great-circle arcs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcIntersection {
    /// The crossing point.
    pub point: PointOnSphere,
    /// Position of the crossing along the first arc, in `[0, 1]`.
    pub ratio_a: f64,
    /// Position of the crossing along the second arc, in `[0, 1]`.
    pub ratio_b: f64,
}

/// Intersection of the minor great-circle arcs `a0 → a1` and `b0 → b1`.
///
/// Endpoint contacts are tested first and returned exactly at the touching
/// endpoint (ratio snapped to 0 or 1), so a T-junction lands on the vertex
/// itself rather than a nearby numerical crossing. Arcs on the same great
/// circle only intersect through such contacts.
#[must_use]
pub fn arc_arc_intersect(
    a0: &PointOnSphere,
    a1: &PointOnSphere,
    b0: &PointOnSphere,
    b1: &PointOnSphere,
) -> Option<ArcIntersection> {
    for (point, ratio_a) in [(a0, 0.0), (a1, 1.0)] {
        if point_on_arc(point, b0, b1) {
            return Some(ArcIntersection {
                point: *point,
                ratio_a,
                ratio_b: snapped_ratio(b0, b1, point),
            });
        }
    }
    for (point, ratio_b) in [(b0, 0.0), (b1, 1.0)] {
        if point_on_arc(point, a0, a1) {
            return Some(ArcIntersection {
                point: *point,
                ratio_a: snapped_ratio(a0, a1, point),
                ratio_b,
            });
        }
    }

    let normal_a = arc_normal(a0, a1)?;
    let normal_b = arc_normal(b0, b1)?;
    let line = normal_a.cross(&normal_b);
    if line.norm() < TOLERANCE {
        return None;
    }
    let candidate = PointOnSphere::new_normalize(line);
    [candidate, PointOnSphere::new_unchecked(-candidate.into_inner())]
        .into_iter()
        .find(|p| point_on_arc(p, a0, a1) && point_on_arc(p, b0, b1))
        .map(|point| ArcIntersection {
            point,
            ratio_a: arc_ratio(a0, a1, &point),
            ratio_b: arc_ratio(b0, b1, &point),
        })
}

/// Unit normal of the great circle through `start` and `end`, if the arc has length.
fn arc_normal(start: &PointOnSphere, end: &PointOnSphere) -> Option<Vector3> {
    let normal = start.into_inner().cross(&end.into_inner());
    let len = normal.norm();
    (len >= TOLERANCE).then(|| normal / len)
}

fn snapped_ratio(start: &PointOnSphere, end: &PointOnSphere, point: &PointOnSphere) -> f64 {
    if points_coincide(point, start) {
        0.0
    } else if points_coincide(point, end) {
        1.0
    } else {
        arc_ratio(start, end, point)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::lat_lon;
    use approx::assert_relative_eq;

    #[test]
    fn quarter_circle_distance() {
        let d = angular_distance(&lat_lon(0.0, 0.0), &lat_lon(0.0, 90.0));
        assert_relative_eq!(d, std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn point_on_arc_excludes_far_side() {
        let a = lat_lon(0.0, 0.0);
        let b = lat_lon(0.0, 40.0);
        assert!(point_on_arc(&lat_lon(0.0, 20.0), &a, &b));
        assert!(!point_on_arc(&lat_lon(0.0, 200.0), &a, &b));
        assert!(!point_on_arc(&lat_lon(0.0, 50.0), &a, &b));
        assert!(!point_on_arc(&lat_lon(1.0, 20.0), &a, &b));
    }

    #[test]
    fn crossing_arcs_intersect() {
        let hit = arc_arc_intersect(
            &lat_lon(0.0, -10.0),
            &lat_lon(0.0, 10.0),
            &lat_lon(-10.0, 0.0),
            &lat_lon(10.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(hit.point.into_inner(), lat_lon(0.0, 0.0).into_inner(), epsilon = 1e-12);
        assert_relative_eq!(hit.ratio_a, 0.5, epsilon = 1e-9);
        assert_relative_eq!(hit.ratio_b, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn disjoint_arcs_do_not_intersect() {
        let hit = arc_arc_intersect(
            &lat_lon(0.0, -10.0),
            &lat_lon(0.0, 10.0),
            &lat_lon(5.0, 20.0),
            &lat_lon(15.0, 20.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn t_junction_snaps_to_endpoint() {
        let touching = lat_lon(0.0, 3.0);
        let hit = arc_arc_intersect(
            &lat_lon(0.0, -10.0),
            &lat_lon(0.0, 10.0),
            &lat_lon(10.0, 3.0),
            &touching,
        )
        .unwrap();
        assert_eq!(hit.point, touching);
        assert!((hit.ratio_b - 1.0).abs() < f64::EPSILON);
        assert_relative_eq!(hit.ratio_a, 13.0 / 20.0, epsilon = 1e-9);
    }

    #[test]
    fn shared_endpoint_is_exact() {
        let shared = lat_lon(5.0, 5.0);
        let hit = arc_arc_intersect(&lat_lon(0.0, 0.0), &shared, &shared, &lat_lon(10.0, 0.0))
            .unwrap();
        assert_eq!(hit.point, shared);
        assert!((hit.ratio_a - 1.0).abs() < f64::EPSILON);
        assert!(hit.ratio_b.abs() < f64::EPSILON);
    }
}
