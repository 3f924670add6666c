use std::borrow::Cow;

use crate::error::GeometryError;
use crate::geometry::GeometryOnSphere;
use crate::math::PointOnSphere;

use super::intersection::{Intersection, IntersectionOrRubberBand};

/// The portion of a section's geometry that contributes to a resolved topology.
///
/// Each end is bounded by an optional [`IntersectionOrRubberBand`] marker. The
/// section vertices copied into the output are the half-open range
/// `[start_vertex_index, end_vertex_index)`; marker points are emitted around
/// that range and are not counted in it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSubSegmentRangeInSection {
    section_geometry: GeometryOnSphere,
    start: Option<IntersectionOrRubberBand>,
    end: Option<IntersectionOrRubberBand>,
    start_vertex_index: usize,
    end_vertex_index: usize,
}

impl ResolvedSubSegmentRangeInSection {
    /// Creates the range for a section bounded by the given markers.
    ///
    /// Markers are in the orientation of the section geometry: `start` bounds
    /// its first vertex, `end` its last.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::PolygonNotAllowed` for polygon sections and
    /// `GeometryError::EmptyGeometry` for geometries without points.
    pub fn new(
        section_geometry: GeometryOnSphere,
        start: Option<IntersectionOrRubberBand>,
        end: Option<IntersectionOrRubberBand>,
    ) -> Result<Self, GeometryError> {
        if section_geometry.is_polygon() {
            return Err(GeometryError::PolygonNotAllowed);
        }
        let num_vertices = section_geometry.num_points();
        if num_vertices == 0 {
            return Err(GeometryError::EmptyGeometry);
        }

        let (start_vertex_index, end_vertex_index) = vertex_index_range(
            num_vertices,
            start.as_ref().and_then(IntersectionOrRubberBand::as_intersection),
            end.as_ref().and_then(IntersectionOrRubberBand::as_intersection),
        );

        Ok(Self {
            section_geometry,
            start,
            end,
            start_vertex_index,
            end_vertex_index,
        })
    }

    /// The full, unclipped section geometry.
    #[must_use]
    pub fn section_geometry(&self) -> &GeometryOnSphere {
        &self.section_geometry
    }

    #[must_use]
    pub fn start(&self) -> Option<&IntersectionOrRubberBand> {
        self.start.as_ref()
    }

    #[must_use]
    pub fn end(&self) -> Option<&IntersectionOrRubberBand> {
        self.end.as_ref()
    }

    /// First section vertex copied into the output.
    #[must_use]
    pub fn start_vertex_index(&self) -> usize {
        self.start_vertex_index
    }

    /// One past the last section vertex copied into the output.
    #[must_use]
    pub fn end_vertex_index(&self) -> usize {
        self.end_vertex_index
    }

    #[must_use]
    pub fn num_section_vertices(&self) -> usize {
        self.section_geometry.num_points()
    }

    /// Number of points emitted by [`Self::geometry_points`].
    #[must_use]
    pub fn num_points(&self, include_rubber_band_points: bool) -> usize {
        let marker_count = [&self.start, &self.end]
            .into_iter()
            .flatten()
            .filter(|m| m.emitted_position(include_rubber_band_points).is_some())
            .count();
        self.end_vertex_index - self.start_vertex_index + marker_count
    }

    /// The contributing geometry.
    ///
    /// Returns the section geometry itself when nothing clips it. Otherwise a
    /// point when a single point remains, else a polyline.
    #[must_use]
    pub fn geometry(&self, include_rubber_band_points: bool) -> Cow<'_, GeometryOnSphere> {
        let clipped = [&self.start, &self.end].into_iter().flatten().any(|m| {
            matches!(m, IntersectionOrRubberBand::Intersection(_)) || include_rubber_band_points
        });
        if !clipped {
            return Cow::Borrowed(&self.section_geometry);
        }

        Cow::Owned(GeometryOnSphere::from_points(
            self.geometry_points(include_rubber_band_points),
        ))
    }

    /// Start marker, copied section vertices, then end marker.
    #[must_use]
    pub fn geometry_points(&self, include_rubber_band_points: bool) -> Vec<PointOnSphere> {
        let mut points = Vec::with_capacity(self.num_points(include_rubber_band_points));
        self.append_geometry_points(&mut points, include_rubber_band_points);
        points
    }

    /// Appends the points of [`Self::geometry_points`] to `points`.
    pub fn append_geometry_points(&self, points: &mut Vec<PointOnSphere>, include_rubber_band_points: bool) {
        if let Some(p) = marker_position(self.start.as_ref(), include_rubber_band_points) {
            points.push(p);
        }
        points.extend_from_slice(self.copied_vertices());
        if let Some(p) = marker_position(self.end.as_ref(), include_rubber_band_points) {
            points.push(p);
        }
    }

    /// The points of [`Self::geometry_points`], in reverse order if `use_reverse`.
    #[must_use]
    pub fn reversed_geometry_points(&self, use_reverse: bool, include_rubber_band_points: bool) -> Vec<PointOnSphere> {
        let mut points = Vec::with_capacity(self.num_points(include_rubber_band_points));
        self.append_reversed_geometry_points(&mut points, use_reverse, include_rubber_band_points);
        points
    }

    /// Appends the points of [`Self::reversed_geometry_points`] to `points`.
    pub fn append_reversed_geometry_points(
        &self,
        points: &mut Vec<PointOnSphere>,
        use_reverse: bool,
        include_rubber_band_points: bool,
    ) {
        if !use_reverse {
            self.append_geometry_points(points, include_rubber_band_points);
            return;
        }
        if let Some(p) = marker_position(self.end.as_ref(), include_rubber_band_points) {
            points.push(p);
        }
        points.extend(self.copied_vertices().iter().rev());
        if let Some(p) = marker_position(self.start.as_ref(), include_rubber_band_points) {
            points.push(p);
        }
    }

    /// First and last point of the contribution.
    ///
    /// A marker supplies the point if present (rubber bands only on request),
    /// otherwise the section's own first or last vertex does.
    #[must_use]
    pub fn end_points(&self, include_rubber_band_points: bool) -> (PointOnSphere, PointOnSphere) {
        let vertices = self.section_geometry.points();
        let first = marker_position(self.start.as_ref(), include_rubber_band_points)
            .unwrap_or(vertices[0]);
        let last = marker_position(self.end.as_ref(), include_rubber_band_points)
            .unwrap_or(vertices[vertices.len() - 1]);
        (first, last)
    }

    /// [`Self::end_points`], swapped if `use_reverse`.
    #[must_use]
    pub fn reversed_end_points(&self, use_reverse: bool, include_rubber_band_points: bool) -> (PointOnSphere, PointOnSphere) {
        let (first, last) = self.end_points(include_rubber_band_points);
        if use_reverse {
            (last, first)
        } else {
            (first, last)
        }
    }

    fn copied_vertices(&self) -> &[PointOnSphere] {
        &self.section_geometry.points()[self.start_vertex_index..self.end_vertex_index]
    }
}

fn marker_position(marker: Option<&IntersectionOrRubberBand>, include_rubber_band_points: bool) -> Option<PointOnSphere> {
    marker
        .and_then(|m| m.emitted_position(include_rubber_band_points))
        .copied()
}

/// Computes `[start, end)` of the section vertices kept between two intersections.
///
/// A start intersection never sits at the end of its segment, so the kept
/// vertices begin at the next vertex. An end intersection at the start of its
/// segment replaces that vertex, which is dropped unless that would cross the
/// start index.
fn vertex_index_range(
    num_vertices: usize,
    start: Option<&Intersection>,
    end: Option<&Intersection>,
) -> (usize, usize) {
    let start_index = start.map_or(0, |a| (a.segment_index() + 1).min(num_vertices));
    let end_index = end.map_or(num_vertices, |b| {
        let mut index = (b.segment_index() + 1).min(num_vertices);
        if b.on_segment_start() && index > start_index {
            index -= 1;
        }
        index.max(start_index)
    });
    (start_index, end_index)
}
