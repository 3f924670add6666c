use super::{PointOnSphere, Vector3, TOLERANCE};

/// Gnomonic (central) projection onto the plane tangent to the sphere at `centre`.
///
/// Great-circle arcs project to straight lines, so constraint edges keep their
/// shape in the plane. Only points in the open hemisphere around the centre can
/// be projected.
#[derive(Debug, Clone, Copy)]
pub struct GnomonicProjection {
    centre: Vector3,
    u_dir: Vector3,
    v_dir: Vector3,
}

/// Smallest cosine of the angle to the centre that still projects stably.
const MIN_PROJECTION_COSINE: f64 = 1e-3;

impl GnomonicProjection {
    /// Creates a projection tangent at `centre`.
    #[must_use]
    pub fn new(centre: &PointOnSphere) -> Self {
        let c = centre.into_inner();
        // Any axis not parallel to the centre gives a valid tangent basis.
        let helper = if c.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let u_dir = helper.cross(&c).normalize();
        let v_dir = c.cross(&u_dir);
        Self {
            centre: c,
            u_dir,
            v_dir,
        }
    }

    /// Projects a point to tangent-plane coordinates, or `None` if it is too
    /// far from the centre.
    #[must_use]
    pub fn project(&self, point: &PointOnSphere) -> Option<(f64, f64)> {
        let p = point.into_inner();
        let cos = p.dot(&self.centre);
        if cos < MIN_PROJECTION_COSINE {
            return None;
        }
        Some((p.dot(&self.u_dir) / cos, p.dot(&self.v_dir) / cos))
    }

    /// Maps tangent-plane coordinates back onto the sphere.
    #[must_use]
    pub fn unproject(&self, x: f64, y: f64) -> PointOnSphere {
        let v = self.centre + self.u_dir * x + self.v_dir * y;
        if v.norm() < TOLERANCE {
            return PointOnSphere::new_unchecked(self.centre);
        }
        PointOnSphere::new_normalize(v)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::lat_lon;
    use approx::assert_relative_eq;

    #[test]
    fn centre_projects_to_origin() {
        let c = lat_lon(20.0, 30.0);
        let proj = GnomonicProjection::new(&c);
        let (x, y) = proj.project(&c).unwrap();
        assert_relative_eq!(x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn project_unproject_round_trip() {
        let proj = GnomonicProjection::new(&lat_lon(-40.0, 170.0));
        let p = lat_lon(-35.0, 160.0);
        let (x, y) = proj.project(&p).unwrap();
        let back = proj.unproject(x, y);
        assert_relative_eq!(back.into_inner(), p.into_inner(), epsilon = 1e-12);
    }

    #[test]
    fn far_hemisphere_is_rejected() {
        let proj = GnomonicProjection::new(&lat_lon(0.0, 0.0));
        assert!(proj.project(&lat_lon(0.0, 135.0)).is_none());
    }
}
