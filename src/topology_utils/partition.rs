use crate::geometry::GeometryOnSphere;
use crate::math::arc::{arc_arc_intersect, midpoint};
use crate::math::polygon_sphere::{polygon_contains_point, ring_edges, BoundingSmallCircle};
use crate::math::{points_coincide, PointOnSphere};
use crate::topology::ResolvedTopologicalBoundary;

struct PartitioningBoundary<'a> {
    boundary: &'a ResolvedTopologicalBoundary,
    bounds: Option<BoundingSmallCircle>,
}

impl PartitioningBoundary<'_> {
    fn contains_point(&self, point: &PointOnSphere) -> bool {
        if self.bounds.as_ref().is_some_and(|b| !b.may_contain(point)) {
            return false;
        }
        polygon_contains_point(&self.boundary.points, point)
    }
}

/// The pieces of a geometry inside one boundary.
#[derive(Debug, Clone)]
pub struct BoundaryPartition<'a> {
    pub boundary: &'a ResolvedTopologicalBoundary,
    pub inside: Vec<GeometryOnSphere>,
}

/// Result of [`ResolvedBoundariesForGeometryPartitioning::partition_geometry`].
#[derive(Debug, Clone, Default)]
pub struct GeometryPartition<'a> {
    /// Inside pieces per boundary, in boundary order. Boundaries with no
    /// inside pieces are omitted.
    pub inside: Vec<BoundaryPartition<'a>>,
    /// Pieces outside every boundary.
    pub outside: Vec<GeometryOnSphere>,
}

/// Point-in-polygon and geometry partitioning queries over a set of resolved
/// boundaries.
///
/// Boundaries that are not valid polygons are left out.
pub struct ResolvedBoundariesForGeometryPartitioning<'a> {
    boundaries: Vec<PartitioningBoundary<'a>>,
}

impl<'a> ResolvedBoundariesForGeometryPartitioning<'a> {
    #[must_use]
    pub fn new(boundaries: impl IntoIterator<Item = &'a ResolvedTopologicalBoundary>) -> Self {
        let boundaries = boundaries
            .into_iter()
            .filter(|boundary| {
                if !boundary.is_valid_polygon {
                    tracing::debug!(feature = ?boundary.feature, "skipping invalid boundary polygon");
                }
                boundary.is_valid_polygon
            })
            .map(|boundary| PartitioningBoundary {
                boundary,
                bounds: BoundingSmallCircle::from_points(&boundary.points),
            })
            .collect();
        Self { boundaries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Every boundary containing `point`, in boundary order. Overlapping
    /// boundaries are all reported; the point is contained by at least one
    /// boundary when the result is non-empty.
    #[must_use]
    pub fn find_resolved_topology_boundaries_containing_point(
        &self,
        point: &PointOnSphere,
    ) -> Vec<&'a ResolvedTopologicalBoundary> {
        self.boundaries
            .iter()
            .filter(|b| b.contains_point(point))
            .map(|b| b.boundary)
            .collect()
    }

    /// Splits `geometry` into the pieces inside each boundary and the pieces
    /// outside all of them.
    ///
    /// Boundaries are visited in order and only the outside remainder of one
    /// is clipped by the next, so a piece inside overlapping boundaries is
    /// assigned to the first. A geometry no boundary touches is returned
    /// unchanged as the single outside piece.
    #[must_use]
    pub fn partition_geometry(&self, geometry: &GeometryOnSphere) -> GeometryPartition<'a> {
        let mut partition = GeometryPartition::default();
        let mut remaining = vec![geometry.clone()];
        for boundary in &self.boundaries {
            if remaining.is_empty() {
                break;
            }
            let mut inside = Vec::new();
            let mut outside = Vec::new();
            for piece in remaining {
                let clipped = clip_geometry(&piece, boundary);
                inside.extend(clipped.inside);
                if clipped.untouched {
                    outside.push(piece);
                } else {
                    outside.extend(clipped.outside);
                }
            }
            if !inside.is_empty() {
                partition.inside.push(BoundaryPartition {
                    boundary: boundary.boundary,
                    inside,
                });
            }
            remaining = outside;
        }
        partition.outside = remaining;
        partition
    }
}

#[derive(Default)]
struct Clipped {
    inside: Vec<GeometryOnSphere>,
    outside: Vec<GeometryOnSphere>,
    /// The geometry lies entirely outside and was not split.
    untouched: bool,
}

fn clip_geometry(geometry: &GeometryOnSphere, boundary: &PartitioningBoundary<'_>) -> Clipped {
    match geometry {
        GeometryOnSphere::Point(point) => {
            if boundary.contains_point(point) {
                Clipped {
                    inside: vec![geometry.clone()],
                    ..Clipped::default()
                }
            } else {
                Clipped {
                    untouched: true,
                    ..Clipped::default()
                }
            }
        }
        GeometryOnSphere::MultiPoint(points) => {
            let (inside, outside): (Vec<PointOnSphere>, Vec<PointOnSphere>) =
                points.iter().copied().partition(|p| boundary.contains_point(p));
            if inside.is_empty() {
                return Clipped {
                    untouched: true,
                    ..Clipped::default()
                };
            }
            Clipped {
                inside: vec![GeometryOnSphere::MultiPoint(inside)],
                outside: if outside.is_empty() {
                    Vec::new()
                } else {
                    vec![GeometryOnSphere::MultiPoint(outside)]
                },
                untouched: false,
            }
        }
        GeometryOnSphere::Polyline(points) => clip_path(points, false, geometry, boundary),
        GeometryOnSphere::Polygon(ring) => {
            let mut closed = ring.clone();
            if let Some(first) = ring.first() {
                closed.push(*first);
            }
            clip_path(&closed, true, geometry, boundary)
        }
    }
}

/// Splits a path where it crosses the boundary and sorts the pieces.
fn clip_path(
    points: &[PointOnSphere],
    closed: bool,
    original: &GeometryOnSphere,
    boundary: &PartitioningBoundary<'_>,
) -> Clipped {
    let pieces = split_at_crossings(points, &boundary.boundary.points);
    let mut classified: Vec<(bool, Vec<PointOnSphere>)> = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let Some(inside) = classify_piece(&piece, boundary) else {
            // Zero-length piece: fold into its neighbour.
            if let Some((_, last)) = classified.last_mut() {
                last.extend(piece.into_iter().skip(1));
            }
            continue;
        };
        let same_class = classified.last().is_some_and(|(class, _)| *class == inside);
        if same_class {
            if let Some((_, last)) = classified.last_mut() {
                last.extend(piece.into_iter().skip(1));
            }
        } else {
            classified.push((inside, piece));
        }
    }
    if closed && classified.len() > 1 && classified.first().map(|c| c.0) == classified.last().map(|c| c.0) {
        if let Some((_, last)) = classified.pop() {
            let (_, first) = &mut classified[0];
            let mut joined = last;
            joined.extend(first.iter().skip(1).copied());
            *first = joined;
        }
    }

    let all_inside = match classified.as_slice() {
        [] => points.first().is_some_and(|p| boundary.contains_point(p)),
        [(inside, _)] => *inside,
        _ => false,
    };
    match classified.as_slice() {
        [] | [_] if !all_inside => Clipped {
            untouched: true,
            ..Clipped::default()
        },
        [] | [_] => Clipped {
            inside: vec![original.clone()],
            ..Clipped::default()
        },
        _ => {
            let mut clipped = Clipped::default();
            for (inside, piece) in classified {
                let geometry = GeometryOnSphere::Polyline(piece);
                if inside {
                    clipped.inside.push(geometry);
                } else {
                    clipped.outside.push(geometry);
                }
            }
            clipped
        }
    }
}

/// Cuts a path at every crossing with the ring, keeping the crossing point
/// at the end of one piece and the start of the next.
fn split_at_crossings(points: &[PointOnSphere], ring: &[PointOnSphere]) -> Vec<Vec<PointOnSphere>> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let mut pieces = vec![vec![*first]];
    for arc in points.windows(2) {
        let mut crossings: Vec<(f64, PointOnSphere)> = ring_edges(ring)
            .filter_map(|(c, d)| arc_arc_intersect(&arc[0], &arc[1], c, d))
            .filter(|hit| hit.ratio_a < 1.0)
            .map(|hit| (hit.ratio_a, hit.point))
            .collect();
        crossings.sort_by(|x, y| x.0.total_cmp(&y.0));
        crossings.dedup_by(|x, y| points_coincide(&x.1, &y.1));

        for (_, crossing) in crossings {
            let Some(current) = pieces.last_mut() else {
                continue;
            };
            if current.last().is_none_or(|last| !points_coincide(last, &crossing)) {
                current.push(crossing);
            }
            if current.len() > 1 {
                pieces.push(vec![crossing]);
            }
        }
        if let Some(current) = pieces.last_mut() {
            current.push(arc[1]);
        }
    }
    pieces
}

/// Whether a piece is inside, judged at the midpoint of its first arc of non-zero length.
fn classify_piece(piece: &[PointOnSphere], boundary: &PartitioningBoundary<'_>) -> Option<bool> {
    piece
        .windows(2)
        .find(|arc| !points_coincide(&arc[0], &arc[1]))
        .map(|arc| boundary.contains_point(&midpoint(&arc[0], &arc[1])))
}
