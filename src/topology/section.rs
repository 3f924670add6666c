use crate::feature::{FeatureId, SectionElement};
use crate::geometry::GeometryOnSphere;
use crate::math::PointOnSphere;
use crate::reconstruction::{ReconstructHandle, ReconstructedSectionProvider};

use super::intersection::SegmentLocation;

/// A section geometry captured for one resolution.
///
/// Always has at least one point.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    source: FeatureId,
    geometry: GeometryOnSphere,
    reverse: bool,
}

impl Section {
    /// Returns `None` for a geometry without points.
    #[must_use]
    pub fn new(source: FeatureId, geometry: GeometryOnSphere, reverse: bool) -> Option<Self> {
        (geometry.num_points() > 0).then_some(Self {
            source,
            geometry,
            reverse,
        })
    }

    #[must_use]
    pub fn source(&self) -> FeatureId {
        self.source
    }

    #[must_use]
    pub fn geometry(&self) -> &GeometryOnSphere {
        &self.geometry
    }

    /// `true` if the section is traversed from its last vertex to its first.
    #[must_use]
    pub fn reverse(&self) -> bool {
        self.reverse
    }

    /// First point reached when traversing the section.
    #[must_use]
    pub fn head(&self) -> &PointOnSphere {
        let points = self.geometry.points();
        if self.reverse {
            &points[points.len() - 1]
        } else {
            &points[0]
        }
    }

    /// Last point reached when traversing the section.
    #[must_use]
    pub fn tail(&self) -> &PointOnSphere {
        let points = self.geometry.points();
        if self.reverse {
            &points[0]
        } else {
            &points[points.len() - 1]
        }
    }

    /// Orders locations along the traversal direction.
    #[must_use]
    pub fn traversal_key(&self, location: &SegmentLocation) -> f64 {
        if self.reverse {
            -location.distance_along()
        } else {
            location.distance_along()
        }
    }

    pub(crate) fn into_parts(self) -> (FeatureId, GeometryOnSphere, bool) {
        (self.source, self.geometry, self.reverse)
    }
}

/// Sections gathered from a topology's element list at one time.
#[derive(Debug, Default)]
pub(crate) struct SectionAccumulator {
    pub sections: Vec<Section>,
    pub inactive: usize,
    pub unresolved: usize,
}

impl SectionAccumulator {
    fn accumulate<P: ReconstructedSectionProvider>(
        mut self,
        element: &SectionElement,
        provider: &P,
        time: f64,
        scope: Option<&[ReconstructHandle]>,
    ) -> Self {
        let Some(active) = element.active_at(time) else {
            self.inactive += 1;
            return self;
        };
        match provider
            .resolve(active.source, scope)
            .and_then(|geometry| Section::new(active.source, geometry.clone(), active.reverse))
        {
            Some(section) => self.sections.push(section),
            None => self.unresolved += 1,
        }
        self
    }
}

/// Captures the geometries of the sections active at `time`, in order.
///
/// Inactive sections and sections the provider cannot resolve are skipped.
pub(crate) fn capture_sections<P: ReconstructedSectionProvider>(
    elements: &[SectionElement],
    provider: &P,
    time: f64,
    scope: Option<&[ReconstructHandle]>,
) -> Vec<Section> {
    let captured = elements.iter().fold(SectionAccumulator::default(), |acc, element| {
        acc.accumulate(element, provider, time, scope)
    });
    if captured.inactive + captured.unresolved > 0 {
        tracing::debug!(
            active = captured.sections.len(),
            inactive = captured.inactive,
            unresolved = captured.unresolved,
            "skipped topological sections"
        );
    }
    captured.sections
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::feature::{FeatureData, FeatureStore, TimePeriod};
    use crate::math::lat_lon;
    use crate::reconstruction::{ReconstructHandleGenerator, ReconstructedFeatureGeometry, ReconstructionSnapshot};

    fn line() -> GeometryOnSphere {
        GeometryOnSphere::Polyline(vec![lat_lon(0.0, 0.0), lat_lon(0.0, 10.0), lat_lon(0.0, 20.0)])
    }

    #[test]
    fn head_and_tail_follow_traversal() {
        let mut store = FeatureStore::new();
        let id = store.add_feature(FeatureData::topological_line("a", Vec::new()));
        let forward = Section::new(id, line(), false).unwrap();
        let reversed = Section::new(id, line(), true).unwrap();
        assert_eq!(forward.head(), reversed.tail());
        assert_eq!(forward.tail(), reversed.head());
        assert_eq!(*forward.head(), lat_lon(0.0, 0.0));
    }

    #[test]
    fn reversed_traversal_key_orders_backwards() {
        let mut store = FeatureStore::new();
        let id = store.add_feature(FeatureData::topological_line("a", Vec::new()));
        let reversed = Section::new(id, line(), true).unwrap();
        let near_start = SegmentLocation::new(0, 0.2);
        let near_end = SegmentLocation::new(1, 0.8);
        assert!(reversed.traversal_key(&near_end) < reversed.traversal_key(&near_start));
    }

    #[test]
    fn empty_geometry_is_not_a_section() {
        let mut store = FeatureStore::new();
        let id = store.add_feature(FeatureData::topological_line("a", Vec::new()));
        assert!(Section::new(id, GeometryOnSphere::MultiPoint(Vec::new()), false).is_none());
    }

    #[test]
    fn capture_skips_inactive_and_unresolved() {
        let mut store = FeatureStore::new();
        let present = store.add_feature(FeatureData::reconstructable("present", 1, line()));
        let missing = store.add_feature(FeatureData::reconstructable("missing", 1, line()));
        let handle = ReconstructHandleGenerator::new().next_handle();
        let mut snapshot = ReconstructionSnapshot::new(10.0);
        snapshot.insert(ReconstructedFeatureGeometry {
            feature: present,
            reconstruct_handle: handle,
            geometry: line(),
        });

        let elements = vec![
            SectionElement::line(present, false),
            SectionElement::line(missing, false),
            SectionElement::line(present, true).within(TimePeriod::new(5.0, 0.0)),
            SectionElement::point(present),
        ];
        let sections = capture_sections(&elements, &snapshot, 10.0, Some(&[handle]));
        assert_eq!(sections.len(), 2);
        assert!(sections.iter().all(|s| s.source() == present && !s.reverse()));
    }
}
