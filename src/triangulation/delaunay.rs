use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::{FixedFaceHandle, FixedVertexHandle, InnerTag};
use spade::{
    AngleLimit, ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2,
    PositionInTriangulation, RefinementParameters, Triangulation as _,
};

use crate::error::TriangulationError;
use crate::math::gnomonic::GnomonicProjection;
use crate::math::polygon_sphere::centroid;
use crate::math::{points_coincide, PointOnSphere};

use super::{Triangulation, TriangulationEngine, TriangulationInput, TriangulationParams};

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Constrained Delaunay triangulation in a gnomonic projection centred on the
/// network boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelaunayTriangulator;

impl TriangulationEngine for DelaunayTriangulator {
    fn triangulate(&self, input: &TriangulationInput) -> Result<Triangulation, TriangulationError> {
        let boundary = distinct_ring(&input.boundary);
        if boundary.len() < 3 {
            return Err(TriangulationError::DegenerateBoundary(boundary.len()));
        }
        let centre = centroid(&boundary).ok_or(TriangulationError::ProjectionOutOfRange)?;
        let projection = GnomonicProjection::new(&centre);

        let mut cdt = Cdt::new();
        let mut originals: HashMap<usize, PointOnSphere> = HashMap::new();
        let mut insert = |cdt: &mut Cdt, points: &[PointOnSphere]| -> Result<Vec<FixedVertexHandle>, TriangulationError> {
            let mut handles = Vec::with_capacity(points.len());
            for point in points {
                let (x, y) = projection
                    .project(point)
                    .ok_or(TriangulationError::ProjectionOutOfRange)?;
                let handle = cdt
                    .insert(SpadePoint2::new(x, y))
                    .map_err(|e: InsertionError| TriangulationError::Failed(format!("CDT insert: {e}")))?;
                originals.entry(handle.index()).or_insert(*point);
                handles.push(handle);
            }
            Ok(handles)
        };

        let boundary_handles = insert(&mut cdt, &boundary)?;
        let boundary_2d: Vec<SpadePoint2<f64>> = boundary_handles
            .iter()
            .map(|&h| cdt.vertex(h).position())
            .collect();
        add_constraint_chain(&mut cdt, &boundary_handles, true);

        for polygon in &input.interior_polygons {
            let ring = distinct_ring(polygon);
            if ring.len() < 3 {
                tracing::debug!(points = ring.len(), "skipping degenerate interior polygon");
                continue;
            }
            let handles = insert(&mut cdt, &ring)?;
            add_constraint_chain(&mut cdt, &handles, true);
        }
        for polyline in &input.interior_polylines {
            let handles = insert(&mut cdt, polyline)?;
            add_constraint_chain(&mut cdt, &handles, false);
        }
        insert(&mut cdt, &input.interior_points)?;

        refine(&mut cdt, &input.params, input.interior_polylines.is_empty());

        let mut seeds_2d = Vec::with_capacity(input.seeds.len());
        for seed in &input.seeds {
            let (x, y) = projection
                .project(seed)
                .ok_or(TriangulationError::ProjectionOutOfRange)?;
            seeds_2d.push(SpadePoint2::new(x, y));
        }
        let excluded = seeded_faces(&cdt, &seeds_2d);

        let mut triangulation = Triangulation::default();
        let mut vertex_map: HashMap<usize, usize> = HashMap::new();
        for face_handle in cdt.inner_faces() {
            if excluded.contains(&face_handle.fix().index()) {
                continue;
            }
            let verts = face_handle.vertices();
            let positions = verts.map(|vh| vh.position());
            let face_centre = SpadePoint2::new(
                (positions[0].x + positions[1].x + positions[2].x) / 3.0,
                (positions[0].y + positions[1].y + positions[2].y) / 3.0,
            );
            if !ring_contains_2d(&boundary_2d, face_centre) {
                continue;
            }

            let mut triangle = [0usize; 3];
            for (i, vh) in verts.iter().enumerate() {
                let idx = vh.fix().index();
                triangle[i] = *vertex_map.entry(idx).or_insert_with(|| {
                    let pos = vh.position();
                    let point = originals
                        .get(&idx)
                        .copied()
                        .unwrap_or_else(|| projection.unproject(pos.x, pos.y));
                    triangulation.vertices.push(point);
                    triangulation.vertices.len() - 1
                });
            }
            triangulation.triangles.push(triangle);
        }

        if triangulation.is_empty() {
            return Err(TriangulationError::Failed(
                "no triangles inside the network boundary".into(),
            ));
        }
        tracing::debug!(
            vertices = triangulation.vertices.len(),
            triangles = triangulation.triangles.len(),
            "triangulated network"
        );
        Ok(triangulation)
    }
}

/// Drops consecutive duplicate points and a repeated closing point.
fn distinct_ring(points: &[PointOnSphere]) -> Vec<PointOnSphere> {
    let mut ring: Vec<PointOnSphere> = Vec::with_capacity(points.len());
    for point in points {
        if ring.last().is_none_or(|last| !points_coincide(last, point)) {
            ring.push(*point);
        }
    }
    while ring.len() > 1 && points_coincide(&ring[0], &ring[ring.len() - 1]) {
        ring.pop();
    }
    ring
}

/// Adds constraint edges between consecutive vertices, skipping any that
/// would cross an existing constraint.
fn add_constraint_chain(cdt: &mut Cdt, handles: &[FixedVertexHandle], closed: bool) {
    let n = handles.len();
    let num_edges = if closed { n } else { n.saturating_sub(1) };
    for i in 0..num_edges {
        let from = handles[i];
        let to = handles[(i + 1) % n];
        if from == to {
            continue;
        }
        if cdt.can_add_constraint(from, to) {
            cdt.add_constraint(from, to);
        } else {
            tracing::debug!("skipping constraint edge that crosses an existing constraint");
        }
    }
}

/// Adds vertices until triangles meet the minimum angle and maximum edge length.
fn refine(cdt: &mut Cdt, params: &TriangulationParams, exclude_outer_faces: bool) {
    if params.shape_factor <= 0.0 && params.max_edge_length <= 0.0 {
        return;
    }
    let mut refinement = RefinementParameters::<f64>::new()
        .exclude_outer_faces(exclude_outer_faces)
        .with_max_additional_vertices(params.max_refinement_vertices)
        .with_angle_limit(AngleLimit::from_rad(params.min_angle()));
    if params.max_edge_length > 0.0 {
        // Area of an equilateral triangle with the longest allowed edge.
        let edge = params.max_edge_length.tan();
        refinement = refinement.with_max_allowed_area(3f64.sqrt() / 4.0 * edge * edge);
    }
    let result = cdt.refine(refinement);
    if !result.refinement_complete {
        tracing::debug!(
            max_additional_vertices = params.max_refinement_vertices,
            "network refinement stopped at its vertex limit"
        );
    }
}

/// Faces reachable from a seed without crossing a constraint edge.
fn seeded_faces(cdt: &Cdt, seeds: &[SpadePoint2<f64>]) -> HashSet<usize> {
    let mut reached = HashSet::new();
    let mut queue: VecDeque<FixedFaceHandle<InnerTag>> = VecDeque::new();
    for &seed in seeds {
        match cdt.locate(seed) {
            PositionInTriangulation::OnFace(face) => {
                if reached.insert(face.index()) {
                    queue.push_back(face);
                }
            }
            _ => tracing::debug!("network seed is not strictly inside a triangle"),
        }
    }

    // BFS flood-fill
    while let Some(face_fix) = queue.pop_front() {
        let face = cdt.face(face_fix);
        for edge in face.adjacent_edges() {
            if cdt.is_constraint_edge(edge.as_undirected().fix()) {
                continue;
            }
            if let Some(neighbor) = edge.rev().face().as_inner() {
                if reached.insert(neighbor.fix().index()) {
                    queue.push_back(neighbor.fix());
                }
            }
        }
    }
    reached
}

/// Even-odd test of a point against a closed ring in the plane.
fn ring_contains_2d(ring: &[SpadePoint2<f64>], p: SpadePoint2<f64>) -> bool {
    let n = ring.len();
    let mut inside = false;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::lat_lon;
    use crate::math::polygon_sphere::polygon_contains_point;

    fn square(lat0: f64, lon0: f64, size: f64) -> Vec<PointOnSphere> {
        vec![
            lat_lon(lat0, lon0),
            lat_lon(lat0, lon0 + size),
            lat_lon(lat0 + size, lon0 + size),
            lat_lon(lat0 + size, lon0),
        ]
    }

    fn unrefined() -> TriangulationParams {
        TriangulationParams {
            shape_factor: 0.0,
            max_edge_length: 0.0,
            max_refinement_vertices: 0,
        }
    }

    #[test]
    fn square_produces_2_triangles() {
        let input = TriangulationInput {
            boundary: square(0.0, 0.0, 10.0),
            params: unrefined(),
            ..TriangulationInput::default()
        };
        let tri = DelaunayTriangulator.triangulate(&input).unwrap();
        assert_eq!(tri.num_triangles(), 2);
        assert_eq!(tri.vertices.len(), 4);
    }

    #[test]
    fn boundary_vertices_are_kept_exactly() {
        let boundary = square(0.0, 0.0, 10.0);
        let input = TriangulationInput {
            boundary: boundary.clone(),
            params: unrefined(),
            ..TriangulationInput::default()
        };
        let tri = DelaunayTriangulator.triangulate(&input).unwrap();
        for v in &tri.vertices {
            assert!(boundary.contains(v));
        }
    }

    #[test]
    fn concave_boundary_drops_outside_triangles() {
        // L-shape
        let boundary = vec![
            lat_lon(0.0, 0.0),
            lat_lon(0.0, 10.0),
            lat_lon(5.0, 10.0),
            lat_lon(5.0, 5.0),
            lat_lon(10.0, 5.0),
            lat_lon(10.0, 0.0),
        ];
        let input = TriangulationInput {
            boundary: boundary.clone(),
            params: unrefined(),
            ..TriangulationInput::default()
        };
        let tri = DelaunayTriangulator.triangulate(&input).unwrap();
        assert_eq!(tri.num_triangles(), 4);
        for t in &tri.triangles {
            let c = centroid(&[tri.vertices[t[0]], tri.vertices[t[1]], tri.vertices[t[2]]]).unwrap();
            assert!(polygon_contains_point(&boundary, &c));
        }
    }

    #[test]
    fn seeded_interior_polygon_is_left_out() {
        let hole = square(4.0, 4.0, 2.0);
        let input = TriangulationInput {
            boundary: square(0.0, 0.0, 10.0),
            interior_polygons: vec![hole.clone()],
            seeds: vec![lat_lon(4.6, 5.3)],
            params: unrefined(),
            ..TriangulationInput::default()
        };
        let tri = DelaunayTriangulator.triangulate(&input).unwrap();
        // n + 2h - 2 triangles for 8 vertices around one hole.
        assert_eq!(tri.num_triangles(), 8);
        for t in &tri.triangles {
            let c = centroid(&[tri.vertices[t[0]], tri.vertices[t[1]], tri.vertices[t[2]]]).unwrap();
            assert!(!polygon_contains_point(&hole, &c));
        }
    }

    #[test]
    fn unseeded_interior_polygon_is_triangulated() {
        let input = TriangulationInput {
            boundary: square(0.0, 0.0, 10.0),
            interior_polygons: vec![square(4.0, 4.0, 2.0)],
            params: unrefined(),
            ..TriangulationInput::default()
        };
        let tri = DelaunayTriangulator.triangulate(&input).unwrap();
        assert_eq!(tri.num_triangles(), 10);
    }

    #[test]
    fn refinement_limits_edge_length() {
        let input = TriangulationInput {
            boundary: square(0.0, 0.0, 10.0),
            params: TriangulationParams {
                max_edge_length: 3f64.to_radians(),
                ..TriangulationParams::default()
            },
            ..TriangulationInput::default()
        };
        let tri = DelaunayTriangulator.triangulate(&input).unwrap();
        assert!(tri.num_triangles() > 2);
    }

    #[test]
    fn repeated_points_do_not_make_a_boundary() {
        let p = lat_lon(0.0, 0.0);
        let q = lat_lon(0.0, 1.0);
        let input = TriangulationInput {
            boundary: vec![p, p, q, p],
            ..TriangulationInput::default()
        };
        assert!(matches!(
            DelaunayTriangulator.triangulate(&input),
            Err(TriangulationError::DegenerateBoundary(2))
        ));
    }

    #[test]
    fn even_odd_test_in_plane() {
        let ring = [
            SpadePoint2::new(0.0, 0.0),
            SpadePoint2::new(1.0, 0.0),
            SpadePoint2::new(1.0, 1.0),
            SpadePoint2::new(0.0, 1.0),
        ];
        assert!(ring_contains_2d(&ring, SpadePoint2::new(0.5, 0.5)));
        assert!(!ring_contains_2d(&ring, SpadePoint2::new(1.5, 0.5)));
    }
}
