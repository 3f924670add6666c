use crate::error::{Result, TopologyError};
use crate::feature::{FeatureBody, FeatureData, FeatureId, SectionElement};
use crate::reconstruction::ReconstructedSectionProvider;

use super::intersector::SectionIntersector;
use super::resolved::{ResolvedTopologicalBoundary, ResolvedTopologicalLine};
use super::ring::{assemble, AssembledRing};
use super::section::capture_sections;
use super::ResolveContext;

/// A resolved topological line or boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedTopologicalGeometry {
    Line(ResolvedTopologicalLine),
    Boundary(ResolvedTopologicalBoundary),
}

/// Resolves topological lines and boundaries from their sections'
/// reconstructed geometries.
pub struct ResolveTopologicalGeometry<'a, P, I> {
    provider: &'a P,
    intersector: &'a I,
    context: &'a ResolveContext,
}

impl<'a, P: ReconstructedSectionProvider, I: SectionIntersector> ResolveTopologicalGeometry<'a, P, I> {
    #[must_use]
    pub fn new(provider: &'a P, intersector: &'a I, context: &'a ResolveContext) -> Self {
        Self {
            provider,
            intersector,
            context,
        }
    }

    /// Resolves a topological line or boundary feature.
    ///
    /// Returns `Ok(None)` if the feature does not exist at the reconstruction
    /// time or none of its sections resolve.
    ///
    /// # Errors
    ///
    /// Returns an error if the feature is not a topological line or boundary,
    /// or if one of its sections is a polygon.
    pub fn execute(&self, feature: FeatureId, data: &FeatureData) -> Result<Option<ResolvedTopologicalGeometry>> {
        if !data.valid_time.contains(self.context.reconstruction_time) {
            return Ok(None);
        }
        match &data.body {
            FeatureBody::TopologicalLine { sections } => Ok(self
                .resolve_line(feature, sections)?
                .map(ResolvedTopologicalGeometry::Line)),
            FeatureBody::TopologicalBoundary { sections } => Ok(self
                .resolve_boundary(feature, sections)?
                .map(ResolvedTopologicalGeometry::Boundary)),
            _ => Err(TopologyError::NotTopological("line or boundary").into()),
        }
    }

    /// Joins the sections end to end into an open polyline.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::PolygonSection` if a section is a polygon.
    pub fn resolve_line(&self, feature: FeatureId, sections: &[SectionElement]) -> Result<Option<ResolvedTopologicalLine>> {
        let Some(ring) = self.assemble(sections, false)? else {
            tracing::debug!(?feature, "topological line has no resolvable sections");
            return Ok(None);
        };
        Ok(Some(ResolvedTopologicalLine {
            feature,
            reconstruct_handle: self.context.reconstruct_handle,
            points: ring.points,
            sub_segments: ring.sub_segments,
        }))
    }

    /// Joins the sections into a closed ring, the last section wrapping
    /// around to the first.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::PolygonSection` if a section is a polygon.
    pub fn resolve_boundary(
        &self,
        feature: FeatureId,
        sections: &[SectionElement],
    ) -> Result<Option<ResolvedTopologicalBoundary>> {
        let Some(ring) = self.assemble(sections, true)? else {
            tracing::debug!(?feature, "topological boundary has no resolvable sections");
            return Ok(None);
        };
        let boundary = ResolvedTopologicalBoundary::new(
            feature,
            self.context.reconstruct_handle,
            ring.points,
            ring.sub_segments,
        );
        if !boundary.is_valid_polygon {
            tracing::debug!(
                ?feature,
                points = boundary.points.len(),
                "resolved boundary is not a valid polygon"
            );
        }
        Ok(Some(boundary))
    }

    fn assemble(&self, sections: &[SectionElement], closed: bool) -> Result<Option<AssembledRing>> {
        let captured = capture_sections(
            sections,
            self.provider,
            self.context.reconstruction_time,
            self.context.scope(),
        );
        assemble(captured, closed, self.intersector)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use crate::feature::{FeatureStore, TimePeriod};
    use crate::geometry::GeometryOnSphere;
    use crate::math::{lat_lon, points_coincide};
    use crate::reconstruction::{ReconstructHandleGenerator, ReconstructionSnapshot, RotationModel};
    use crate::topology::intersector::GreatCircleIntersector;

    fn polyline(points: &[(f64, f64)]) -> GeometryOnSphere {
        GeometryOnSphere::Polyline(points.iter().map(|&(lat, lon)| lat_lon(lat, lon)).collect())
    }

    struct Fixture {
        store: FeatureStore,
        sides: Vec<FeatureId>,
        snapshot: ReconstructionSnapshot,
        context: ResolveContext,
    }

    fn fixture() -> Fixture {
        let mut store = FeatureStore::new();
        let sides = [
            polyline(&[(0.0, -2.0), (0.0, 12.0)]),
            polyline(&[(-2.0, 10.0), (12.0, 10.0)]),
            polyline(&[(10.0, 12.0), (10.0, -2.0)]),
            polyline(&[(12.0, 0.0), (-2.0, 0.0)]),
        ]
        .into_iter()
        .map(|g| store.add_feature(FeatureData::reconstructable("side", 1, g)))
        .collect();
        let generator = ReconstructHandleGenerator::new();
        let handle = generator.next_handle();
        let snapshot = ReconstructionSnapshot::reconstruct(&store, &RotationModel::new(), 0.0, handle);
        let context = ResolveContext {
            reconstruction_time: 0.0,
            reconstruct_handle: generator.next_handle(),
            scope: Some(vec![handle]),
        };
        Fixture {
            store,
            sides,
            snapshot,
            context,
        }
    }

    fn sections(sides: &[FeatureId]) -> Vec<SectionElement> {
        sides.iter().map(|&id| SectionElement::line(id, false)).collect()
    }

    #[test]
    fn boundary_is_a_valid_polygon() {
        let mut f = fixture();
        let id = f
            .store
            .add_feature(FeatureData::topological_boundary("plate", sections(&f.sides)));
        let resolver = ResolveTopologicalGeometry::new(&f.snapshot, &GreatCircleIntersector, &f.context);
        let Some(ResolvedTopologicalGeometry::Boundary(boundary)) =
            resolver.execute(id, f.store.feature(id).unwrap()).unwrap()
        else {
            panic!("expected a boundary");
        };
        assert!(boundary.is_valid_polygon);
        assert_eq!(boundary.reconstruct_handle, f.context.reconstruct_handle);
        assert_eq!(boundary.sub_segments.len(), 4);
        assert!(boundary.contains_point(&lat_lon(5.0, 5.0)));
        assert!(!boundary.contains_point(&lat_lon(11.0, 5.0)));
    }

    #[test]
    fn line_keeps_open_ends() {
        let f = fixture();
        let resolver = ResolveTopologicalGeometry::new(&f.snapshot, &GreatCircleIntersector, &f.context);
        let line = resolver.resolve_line(f.sides[0], &sections(&f.sides[..2])).unwrap().unwrap();
        assert!(points_coincide(&line.points[0], &lat_lon(0.0, -2.0)));
        assert!(points_coincide(line.points.last().unwrap(), &lat_lon(12.0, 10.0)));
    }

    #[test]
    fn unresolvable_sections_are_skipped() {
        let mut f = fixture();
        let missing = f.store.add_feature(FeatureData::reconstructable(
            "not reconstructed",
            1,
            polyline(&[(0.0, 0.0), (1.0, 1.0)]),
        ));
        let mut elements = sections(&f.sides);
        elements.insert(1, SectionElement::line(missing, false));
        let resolver = ResolveTopologicalGeometry::new(&f.snapshot, &GreatCircleIntersector, &f.context);
        let boundary = resolver.resolve_boundary(missing, &elements).unwrap().unwrap();
        assert_eq!(boundary.sub_segments.len(), 4);
        assert!(boundary.sub_segments.iter().all(|s| s.source != missing));
    }

    #[test]
    fn no_sections_resolve_to_nothing() {
        let f = fixture();
        let resolver = ResolveTopologicalGeometry::new(&f.snapshot, &GreatCircleIntersector, &f.context);
        assert!(resolver.resolve_boundary(f.sides[0], &[]).unwrap().is_none());
    }

    #[test]
    fn out_of_scope_sections_do_not_resolve() {
        let mut f = fixture();
        f.context.scope = Some(vec![f.context.reconstruct_handle]);
        let resolver = ResolveTopologicalGeometry::new(&f.snapshot, &GreatCircleIntersector, &f.context);
        assert!(resolver.resolve_boundary(f.sides[0], &sections(&f.sides)).unwrap().is_none());
    }

    #[test]
    fn feature_outside_valid_time_is_not_resolved() {
        let mut f = fixture();
        let id = f.store.add_feature(
            FeatureData::topological_boundary("old plate", sections(&f.sides))
                .with_valid_time(TimePeriod::new(200.0, 100.0)),
        );
        let resolver = ResolveTopologicalGeometry::new(&f.snapshot, &GreatCircleIntersector, &f.context);
        assert!(resolver.execute(id, f.store.feature(id).unwrap()).unwrap().is_none());
    }

    #[test]
    fn reconstructable_feature_is_not_topological() {
        let f = fixture();
        let resolver = ResolveTopologicalGeometry::new(&f.snapshot, &GreatCircleIntersector, &f.context);
        let err = resolver
            .execute(f.sides[0], f.store.feature(f.sides[0]).unwrap())
            .unwrap_err();
        assert!(matches!(err, ResolveError::Topology(TopologyError::NotTopological(_))));
    }
}
