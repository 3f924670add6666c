use crate::error::{Result, TopologyError};
use crate::feature::{FeatureBody, FeatureData, FeatureId, TopologicalNetworkDefinition};
use crate::geometry::GeometryOnSphere;
use crate::math::polygon_sphere::interior_point;
use crate::reconstruction::ReconstructedSectionProvider;
use crate::triangulation::{TriangulationEngine, TriangulationInput};

use super::intersector::SectionIntersector;
use super::resolved::{ResolvedNetworkInterior, ResolvedTopologicalBoundary, ResolvedTopologicalNetwork};
use super::ring::assemble;
use super::section::capture_sections;
use super::ResolveContext;

/// Resolves topological networks: a boundary ring, its interior geometries,
/// and a triangulation of the enclosed region.
pub struct ResolveTopologicalNetwork<'a, P, I, T> {
    provider: &'a P,
    intersector: &'a I,
    triangulator: &'a T,
    context: &'a ResolveContext,
}

impl<'a, P, I, T> ResolveTopologicalNetwork<'a, P, I, T>
where
    P: ReconstructedSectionProvider,
    I: SectionIntersector,
    T: TriangulationEngine,
{
    #[must_use]
    pub fn new(provider: &'a P, intersector: &'a I, triangulator: &'a T, context: &'a ResolveContext) -> Self {
        Self {
            provider,
            intersector,
            triangulator,
            context,
        }
    }

    /// Resolves a topological network feature.
    ///
    /// Returns `Ok(None)` if the feature does not exist at the reconstruction
    /// time or none of its boundary sections resolve. A failed triangulation
    /// does not fail the network; it is reported in
    /// [`ResolvedTopologicalNetwork::triangulation`].
    ///
    /// # Errors
    ///
    /// Returns an error if the feature is not a network or a boundary section
    /// is a polygon.
    pub fn execute(&self, feature: FeatureId, data: &FeatureData) -> Result<Option<ResolvedTopologicalNetwork>> {
        let FeatureBody::TopologicalNetwork(network) = &data.body else {
            return Err(TopologyError::NotTopological("network").into());
        };
        if !data.valid_time.contains(self.context.reconstruction_time) {
            return Ok(None);
        }
        self.resolve(feature, network)
    }

    /// Resolves a network definition on behalf of `feature`.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::PolygonSection` if a boundary section is a polygon.
    pub fn resolve(
        &self,
        feature: FeatureId,
        network: &TopologicalNetworkDefinition,
    ) -> Result<Option<ResolvedTopologicalNetwork>> {
        let time = self.context.reconstruction_time;
        let scope = self.context.scope();

        let sections = capture_sections(&network.boundary, self.provider, time, scope);
        let Some(ring) = assemble(sections, true, self.intersector)? else {
            tracing::debug!(?feature, "network boundary has no resolvable sections");
            return Ok(None);
        };
        let boundary = ResolvedTopologicalBoundary::new(
            feature,
            self.context.reconstruct_handle,
            ring.points,
            ring.sub_segments,
        );

        let interiors: Vec<ResolvedNetworkInterior> = network
            .interiors
            .iter()
            .filter_map(|element| element.active_at(time))
            .filter_map(|active| {
                self.provider
                    .resolve(active.source, scope)
                    .map(|geometry| ResolvedNetworkInterior {
                        source: active.source,
                        geometry: geometry.clone(),
                    })
            })
            .collect();

        let mut input = TriangulationInput {
            boundary: boundary.points.clone(),
            params: network.params,
            ..TriangulationInput::default()
        };
        for interior in &interiors {
            match &interior.geometry {
                GeometryOnSphere::Polygon(ring) => match interior_point(ring) {
                    Some(seed) => {
                        input.interior_polygons.push(ring.clone());
                        input.seeds.push(seed);
                    }
                    None => tracing::debug!(source = ?interior.source, "interior polygon has no interior point"),
                },
                GeometryOnSphere::Polyline(points) => input.interior_polylines.push(points.clone()),
                GeometryOnSphere::Point(point) => input.interior_points.push(*point),
                GeometryOnSphere::MultiPoint(points) => input.interior_points.extend_from_slice(points),
            }
        }

        let triangulation = self.triangulator.triangulate(&input);
        if let Err(error) = &triangulation {
            tracing::warn!(?feature, %error, "network triangulation failed");
        }

        Ok(Some(ResolvedTopologicalNetwork {
            feature,
            reconstruct_handle: self.context.reconstruct_handle,
            boundary,
            interiors,
            seeds: input.seeds,
            triangulation,
        }))
    }
}
