//! Joins consecutive sections at their intersections and concatenates the
//! clipped pieces into a line or ring.

use crate::error::{Result, TopologyError};
use crate::math::arc::{angular_distance, midpoint};
use crate::math::PointOnSphere;

use super::intersection::{IntersectionOrRubberBand, RubberBand};
use super::intersector::{SectionIntersection, SectionIntersector};
use super::resolved::ResolvedSubSegment;
use super::section::Section;
use super::sub_segment::ResolvedSubSegmentRangeInSection;

/// Points and sub-segments of an assembled line or ring.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledRing {
    pub points: Vec<PointOnSphere>,
    pub sub_segments: Vec<ResolvedSubSegment>,
}

/// Markers bounding one section, in traversal order.
#[derive(Debug, Clone, Copy, Default)]
struct Junctions {
    head: Option<IntersectionOrRubberBand>,
    tail: Option<IntersectionOrRubberBand>,
}

/// Clips each section against its neighbours and concatenates the pieces.
///
/// With `closed` the last section is also joined to the first. Returns
/// `Ok(None)` when there are no sections.
///
/// # Errors
///
/// Returns `TopologyError::PolygonSection` if any section is a polygon.
pub fn assemble<I: SectionIntersector + ?Sized>(
    sections: Vec<Section>,
    closed: bool,
    intersector: &I,
) -> Result<Option<AssembledRing>> {
    if let Some(polygon) = sections.iter().find(|s| s.geometry().is_polygon()) {
        return Err(TopologyError::PolygonSection {
            section: polygon.source(),
        }
        .into());
    }
    if sections.is_empty() {
        return Ok(None);
    }

    let junctions = match (sections.len(), closed) {
        (1, _) => vec![Junctions::default()],
        (2, true) => join_two_section_ring(&sections, intersector),
        (n, _) => {
            let mut junctions = vec![Junctions::default(); n];
            for curr in 1..n {
                join(&sections, &mut junctions, curr - 1, curr, intersector);
            }
            if closed {
                join(&sections, &mut junctions, n - 1, 0, intersector);
            }
            junctions
        }
    };

    let mut points = Vec::new();
    let mut sub_segments = Vec::with_capacity(sections.len());
    for (section, junction) in sections.into_iter().zip(junctions) {
        let (source, geometry, reverse) = section.into_parts();
        // Sub-segment markers are kept in the orientation of the section geometry.
        let (start, end) = if reverse {
            (junction.tail, junction.head)
        } else {
            (junction.head, junction.tail)
        };
        let range = ResolvedSubSegmentRangeInSection::new(geometry, start, end)?;
        let begin = points.len();
        range.append_reversed_geometry_points(&mut points, reverse, false);
        sub_segments.push(ResolvedSubSegment {
            source,
            range,
            use_reverse: reverse,
            point_range: begin..points.len(),
        });
    }

    Ok(Some(AssembledRing {
        points,
        sub_segments,
    }))
}

/// Joins the tail of `prev` to the head of `curr`.
///
/// Where the sections cross more than once, the crossing reached first along
/// `curr` is used.
fn join<I: SectionIntersector + ?Sized>(
    sections: &[Section],
    junctions: &mut [Junctions],
    prev: usize,
    curr: usize,
    intersector: &I,
) {
    let (p, c) = (&sections[prev], &sections[curr]);
    let hits = intersector.intersect(p.geometry(), c.geometry());
    let first_along_curr = hits
        .iter()
        .min_by(|x, y| c.traversal_key(&x.second).total_cmp(&c.traversal_key(&y.second)));
    match first_along_curr {
        Some(hit) => set_intersection(junctions, prev, curr, hit),
        None => set_rubber_band(sections, junctions, prev, curr),
    }
}

/// A ring of two sections meets at two junctions, both found from one
/// intersection of the pair.
fn join_two_section_ring<I: SectionIntersector + ?Sized>(
    sections: &[Section],
    intersector: &I,
) -> Vec<Junctions> {
    let (a, b) = (&sections[0], &sections[1]);
    let mut junctions = vec![Junctions::default(); 2];
    let mut hits = intersector.intersect(a.geometry(), b.geometry());
    hits.sort_by(|x, y| a.traversal_key(&x.first).total_cmp(&a.traversal_key(&y.first)));

    match hits.as_slice() {
        [] => {
            set_rubber_band(sections, &mut junctions, 0, 1);
            set_rubber_band(sections, &mut junctions, 1, 0);
        }
        [hit] => {
            let gap_ab = midpoint(a.tail(), b.head());
            let gap_ba = midpoint(b.tail(), a.head());
            if angular_distance(&hit.position, &gap_ab) <= angular_distance(&hit.position, &gap_ba) {
                set_intersection(&mut junctions, 0, 1, hit);
                set_rubber_band(sections, &mut junctions, 1, 0);
            } else {
                set_intersection(&mut junctions, 1, 0, &swapped(hit));
                set_rubber_band(sections, &mut junctions, 0, 1);
            }
        }
        [first, .., last] => {
            // Along `a`, the first crossing is where `b` hands over to `a`.
            set_intersection(&mut junctions, 1, 0, &swapped(first));
            set_intersection(&mut junctions, 0, 1, last);
        }
    }
    junctions
}

/// `hit.first` is located on `prev`, `hit.second` on `curr`.
fn set_intersection(junctions: &mut [Junctions], prev: usize, curr: usize, hit: &SectionIntersection) {
    junctions[prev].tail = Some(hit.on_first().into());
    junctions[curr].head = Some(hit.on_second().into());
}

fn swapped(hit: &SectionIntersection) -> SectionIntersection {
    SectionIntersection {
        position: hit.position,
        first: hit.second,
        second: hit.first,
    }
}

fn set_rubber_band(sections: &[Section], junctions: &mut [Junctions], prev: usize, curr: usize) {
    let (p, c) = (&sections[prev], &sections[curr]);
    let position = midpoint(p.tail(), c.head());
    // A section's traversal tail is its geometry start when reversed.
    junctions[prev].tail = Some(
        RubberBand {
            position,
            is_at_start_of_current_section: p.reverse(),
            is_at_start_of_adjacent_section: !c.reverse(),
        }
        .into(),
    );
    junctions[curr].head = Some(
        RubberBand {
            position,
            is_at_start_of_current_section: !c.reverse(),
            is_at_start_of_adjacent_section: p.reverse(),
        }
        .into(),
    );
    tracing::debug!(
        prev = ?p.source(),
        curr = ?c.source(),
        "sections do not intersect, joined by rubber band"
    );
}
