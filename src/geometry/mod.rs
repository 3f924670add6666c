use crate::math::{PointOnSphere, Rotation};

/// A reconstructed geometry on the unit sphere.
///
/// Polygons store their exterior ring without repeating the first vertex.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryOnSphere {
    Point(PointOnSphere),
    MultiPoint(Vec<PointOnSphere>),
    Polyline(Vec<PointOnSphere>),
    Polygon(Vec<PointOnSphere>),
}

impl GeometryOnSphere {
    /// Builds a point for a single point and a polyline otherwise.
    #[must_use]
    pub fn from_points(mut points: Vec<PointOnSphere>) -> Self {
        if points.len() == 1 {
            Self::Point(points.remove(0))
        } else {
            Self::Polyline(points)
        }
    }

    /// The geometry's vertices in order.
    #[must_use]
    pub fn points(&self) -> &[PointOnSphere] {
        match self {
            Self::Point(p) => std::slice::from_ref(p),
            Self::MultiPoint(points) | Self::Polyline(points) | Self::Polygon(points) => points,
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.points().len()
    }

    /// Number of great-circle arcs joining consecutive vertices.
    ///
    /// Only polylines and polygons have segments.
    #[must_use]
    pub fn num_segments(&self) -> usize {
        match self {
            Self::Polyline(points) => points.len().saturating_sub(1),
            Self::Polygon(points) => points.len(),
            Self::Point(_) | Self::MultiPoint(_) => 0,
        }
    }

    #[must_use]
    pub fn is_polygon(&self) -> bool {
        matches!(self, Self::Polygon(_))
    }

    /// Returns a copy rotated about the centre of the sphere.
    #[must_use]
    pub fn rotated(&self, rotation: &Rotation) -> Self {
        let rotate = |points: &[PointOnSphere]| points.iter().map(|p| rotation * p).collect();
        match self {
            Self::Point(p) => Self::Point(rotation * p),
            Self::MultiPoint(points) => Self::MultiPoint(rotate(points)),
            Self::Polyline(points) => Self::Polyline(rotate(points)),
            Self::Polygon(points) => Self::Polygon(rotate(points)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{lat_lon, Vector3};
    use approx::assert_relative_eq;

    #[test]
    fn from_points_single_is_point() {
        let p = lat_lon(1.0, 2.0);
        assert_eq!(GeometryOnSphere::from_points(vec![p]), GeometryOnSphere::Point(p));
    }

    #[test]
    fn from_points_many_is_polyline() {
        let g = GeometryOnSphere::from_points(vec![lat_lon(0.0, 0.0), lat_lon(0.0, 1.0)]);
        assert!(matches!(g, GeometryOnSphere::Polyline(_)));
        assert_eq!(g.num_segments(), 1);
    }

    #[test]
    fn from_points_empty_is_empty_polyline() {
        let g = GeometryOnSphere::from_points(Vec::new());
        assert_eq!(g, GeometryOnSphere::Polyline(Vec::new()));
        assert_eq!(g.num_points(), 0);
    }

    #[test]
    fn polygon_segments_include_closing_edge() {
        let g = GeometryOnSphere::Polygon(vec![lat_lon(0.0, 0.0), lat_lon(0.0, 1.0), lat_lon(1.0, 0.0)]);
        assert_eq!(g.num_segments(), 3);
        assert!(g.is_polygon());
    }

    #[test]
    fn rotation_about_z_shifts_longitude() {
        let r = Rotation::from_axis_angle(&Vector3::z_axis(), 90f64.to_radians());
        let g = GeometryOnSphere::Point(lat_lon(0.0, 0.0)).rotated(&r);
        assert_relative_eq!(
            g.points()[0].into_inner(),
            lat_lon(0.0, 90.0).into_inner(),
            epsilon = 1e-12
        );
    }
}
