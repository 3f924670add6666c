pub mod arc;
pub mod gnomonic;
pub mod polygon_sphere;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// A point on the unit sphere.
pub type PointOnSphere = nalgebra::Unit<Vector3>;

/// Rotation of the sphere about its centre.
pub type Rotation = nalgebra::UnitQuaternion<f64>;

/// Global geometric tolerance for degeneracy checks.
pub const TOLERANCE: f64 = 1e-10;

/// Chord distance below which two points on the sphere are the same point.
pub const COINCIDENT_TOLERANCE: f64 = 1e-9;

/// Creates a point on the sphere from a latitude and longitude in degrees.
#[must_use]
pub fn lat_lon(lat_deg: f64, lon_deg: f64) -> PointOnSphere {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    PointOnSphere::new_unchecked(Vector3::new(
        lat.cos() * lon.cos(),
        lat.cos() * lon.sin(),
        lat.sin(),
    ))
}

/// Returns `(latitude, longitude)` in degrees.
#[must_use]
pub fn to_lat_lon(point: &PointOnSphere) -> (f64, f64) {
    let lat = point.z.clamp(-1.0, 1.0).asin().to_degrees();
    let lon = point.y.atan2(point.x).to_degrees();
    (lat, lon)
}

/// Returns `true` if two points are within [`COINCIDENT_TOLERANCE`] of each other.
#[must_use]
pub fn points_coincide(a: &PointOnSphere, b: &PointOnSphere) -> bool {
    (a.into_inner() - b.into_inner()).norm() < COINCIDENT_TOLERANCE
}
