use crate::math::PointOnSphere;

/// Where a point lies along a section's vertices.
///
/// A point is never located at the *end* of a segment: it is instead located
/// at the vertex that starts the next segment. The section's final vertex is
/// `AtVertex(num_segments)`, a fictitious segment one past the last.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentLocation {
    /// Exactly at a vertex (the start of segment `vertex`).
    AtVertex(usize),
    /// Strictly inside segment `index`, `interpolate_ratio` of the way from its start vertex.
    OnSegment { index: usize, interpolate_ratio: f64 },
}

impl SegmentLocation {
    /// Locates a point `ratio` of the way along `segment_index`, normalized so a
    /// point at either end of the segment becomes a vertex location.
    #[must_use]
    pub fn new(segment_index: usize, ratio: f64) -> Self {
        if ratio <= 0.0 {
            Self::AtVertex(segment_index)
        } else if ratio >= 1.0 {
            Self::AtVertex(segment_index + 1)
        } else {
            Self::OnSegment {
                index: segment_index,
                interpolate_ratio: ratio,
            }
        }
    }

    /// Index of the segment the point lies on; the section's final vertex
    /// reports the one-past-the-last segment.
    #[must_use]
    pub fn segment_index(&self) -> usize {
        match *self {
            Self::AtVertex(vertex) => vertex,
            Self::OnSegment { index, .. } => index,
        }
    }

    /// `true` if the point coincides with the start vertex of [`Self::segment_index`].
    #[must_use]
    pub fn on_segment_start(&self) -> bool {
        matches!(self, Self::AtVertex(_))
    }

    /// Fraction of the segment from its start vertex, in `[0, 1)`.
    #[must_use]
    pub fn interpolate_ratio(&self) -> f64 {
        match *self {
            Self::AtVertex(_) => 0.0,
            Self::OnSegment {
                interpolate_ratio, ..
            } => interpolate_ratio,
        }
    }

    /// Position along the section, usable for ordering locations.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn distance_along(&self) -> f64 {
        self.segment_index() as f64 + self.interpolate_ratio()
    }
}

/// A point where a section crosses (or touches) a neighbouring section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub position: PointOnSphere,
    pub location: SegmentLocation,
}

impl Intersection {
    #[must_use]
    pub fn new(position: PointOnSphere, location: SegmentLocation) -> Self {
        Self { position, location }
    }

    #[must_use]
    pub fn segment_index(&self) -> usize {
        self.location.segment_index()
    }

    #[must_use]
    pub fn on_segment_start(&self) -> bool {
        self.location.on_segment_start()
    }

    #[must_use]
    pub fn interpolate_ratio(&self) -> f64 {
        self.location.interpolate_ratio()
    }
}

/// A soft junction used where a section does not meet its neighbour.
///
/// The position is the midpoint of the gap between the end of the current
/// section and the end of the adjacent section facing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RubberBand {
    pub position: PointOnSphere,
    /// The junction is at the first vertex of the current section's geometry
    /// (otherwise at its last vertex).
    pub is_at_start_of_current_section: bool,
    /// The junction is at the first vertex of the adjacent section's geometry.
    pub is_at_start_of_adjacent_section: bool,
}

impl RubberBand {
    /// Location of the current section's vertex the rubber band is anchored to.
    #[must_use]
    pub fn location(&self, num_vertices: usize) -> SegmentLocation {
        if self.is_at_start_of_current_section {
            SegmentLocation::AtVertex(0)
        } else {
            SegmentLocation::AtVertex(num_vertices.saturating_sub(1))
        }
    }
}

/// The marker bounding one end of a section's contribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntersectionOrRubberBand {
    Intersection(Intersection),
    RubberBand(RubberBand),
}

impl IntersectionOrRubberBand {
    #[must_use]
    pub fn position(&self) -> &PointOnSphere {
        match self {
            Self::Intersection(intersection) => &intersection.position,
            Self::RubberBand(rubber_band) => &rubber_band.position,
        }
    }

    #[must_use]
    pub fn as_intersection(&self) -> Option<&Intersection> {
        match self {
            Self::Intersection(intersection) => Some(intersection),
            Self::RubberBand(_) => None,
        }
    }

    #[must_use]
    pub fn as_rubber_band(&self) -> Option<&RubberBand> {
        match self {
            Self::Intersection(_) => None,
            Self::RubberBand(rubber_band) => Some(rubber_band),
        }
    }

    /// The marker's position if it should be emitted as a point.
    ///
    /// Intersections are always emitted, rubber bands only on request.
    #[must_use]
    pub fn emitted_position(&self, include_rubber_band_points: bool) -> Option<&PointOnSphere> {
        match self {
            Self::Intersection(intersection) => Some(&intersection.position),
            Self::RubberBand(rubber_band) => {
                include_rubber_band_points.then_some(&rubber_band.position)
            }
        }
    }
}

impl From<Intersection> for IntersectionOrRubberBand {
    fn from(intersection: Intersection) -> Self {
        Self::Intersection(intersection)
    }
}

impl From<RubberBand> for IntersectionOrRubberBand {
    fn from(rubber_band: RubberBand) -> Self {
        Self::RubberBand(rubber_band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::lat_lon;

    #[test]
    fn end_of_segment_becomes_start_of_next() {
        assert_eq!(SegmentLocation::new(1, 1.0), SegmentLocation::AtVertex(2));
        assert_eq!(SegmentLocation::new(1, 0.0), SegmentLocation::AtVertex(1));
    }

    #[test]
    fn interior_location_keeps_ratio() {
        let loc = SegmentLocation::new(2, 0.25);
        assert_eq!(loc.segment_index(), 2);
        assert!(!loc.on_segment_start());
        assert!((loc.interpolate_ratio() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn vertex_location_has_zero_ratio() {
        let loc = SegmentLocation::AtVertex(3);
        assert!(loc.on_segment_start());
        assert!(loc.interpolate_ratio().abs() < f64::EPSILON);
    }

    #[test]
    fn locations_order_along_section() {
        let a = SegmentLocation::new(0, 0.9);
        let b = SegmentLocation::AtVertex(1);
        let c = SegmentLocation::new(1, 0.1);
        assert!(a.distance_along() < b.distance_along());
        assert!(b.distance_along() < c.distance_along());
    }

    #[test]
    fn rubber_band_anchors_to_end_vertices() {
        let rb = RubberBand {
            position: lat_lon(0.0, 0.0),
            is_at_start_of_current_section: false,
            is_at_start_of_adjacent_section: true,
        };
        assert_eq!(rb.location(4), SegmentLocation::AtVertex(3));
        let start = RubberBand {
            is_at_start_of_current_section: true,
            ..rb
        };
        assert_eq!(start.location(4), SegmentLocation::AtVertex(0));
    }

    #[test]
    fn rubber_band_emitted_only_on_request() {
        let marker = IntersectionOrRubberBand::from(RubberBand {
            position: lat_lon(0.0, 0.0),
            is_at_start_of_current_section: true,
            is_at_start_of_adjacent_section: false,
        });
        assert!(marker.emitted_position(false).is_none());
        assert!(marker.emitted_position(true).is_some());
        assert!(marker.as_intersection().is_none());
    }
}
