use rayon::prelude::*;

use crate::error::{ResolveError, Result};
use crate::feature::{FeatureBody, FeatureCollection, FeatureData, FeatureId, FeatureStore};
use crate::reconstruction::{
    ReconstructHandle, ReconstructHandleGenerator, ReconstructedFeatureGeometry, ReconstructedSectionProvider,
    ReconstructionSnapshot,
};
use crate::topology::{
    GreatCircleIntersector, ResolveContext, ResolveTopologicalGeometry, ResolveTopologicalNetwork,
    ResolvedTopologicalBoundary, ResolvedTopologicalLine, ResolvedTopologicalNetwork,
};
use crate::triangulation::DelaunayTriangulator;

/// Parameters of a batch resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyResolveParams {
    pub reconstruction_time: f64,
    /// Only section geometries tagged with one of these handles are used.
    /// `None` accepts any.
    pub reconstruct_handles: Option<Vec<ReconstructHandle>>,
    /// Resolve features on the rayon thread pool.
    pub parallel: bool,
}

impl Default for TopologyResolveParams {
    fn default() -> Self {
        Self {
            reconstruction_time: 0.0,
            reconstruct_handles: None,
            parallel: true,
        }
    }
}

/// A feature whose resolution failed.
#[derive(Debug, Clone)]
pub struct ResolveFailure {
    pub feature: FeatureId,
    pub error: ResolveError,
}

/// Outcome of one batch: the handle stamped on its outputs and any failures.
#[derive(Debug, Clone)]
pub struct ResolveReport {
    pub reconstruct_handle: ReconstructHandle,
    pub failures: Vec<ResolveFailure>,
}

impl ResolveReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Resolves every topological line in `collections`, appending to `resolved`.
pub fn resolve_topological_lines<P: ReconstructedSectionProvider>(
    store: &FeatureStore,
    collections: &[FeatureCollection],
    provider: &P,
    params: &TopologyResolveParams,
    handles: &ReconstructHandleGenerator,
    resolved: &mut Vec<ResolvedTopologicalLine>,
) -> ResolveReport {
    let context = new_context(params, handles);
    let resolver = ResolveTopologicalGeometry::new(provider, &GreatCircleIntersector, &context);
    let (outputs, failures) = visit_features(store, collections, params, |id, data| match &data.body {
        FeatureBody::TopologicalLine { sections } => Some(resolver.resolve_line(id, sections)),
        _ => None,
    });
    finish_batch("lines", context.reconstruct_handle, outputs, failures, resolved)
}

/// Resolves every topological boundary in `collections`, appending to `resolved`.
pub fn resolve_topological_boundaries<P: ReconstructedSectionProvider>(
    store: &FeatureStore,
    collections: &[FeatureCollection],
    provider: &P,
    params: &TopologyResolveParams,
    handles: &ReconstructHandleGenerator,
    resolved: &mut Vec<ResolvedTopologicalBoundary>,
) -> ResolveReport {
    let context = new_context(params, handles);
    let resolver = ResolveTopologicalGeometry::new(provider, &GreatCircleIntersector, &context);
    let (outputs, failures) = visit_features(store, collections, params, |id, data| match &data.body {
        FeatureBody::TopologicalBoundary { sections } => Some(resolver.resolve_boundary(id, sections)),
        _ => None,
    });
    finish_batch("boundaries", context.reconstruct_handle, outputs, failures, resolved)
}

/// Resolves and triangulates every topological network in `collections`,
/// appending to `resolved`.
///
/// Networks whose triangulation fails are still appended and also reported
/// as failures.
pub fn resolve_topological_networks<P: ReconstructedSectionProvider>(
    store: &FeatureStore,
    collections: &[FeatureCollection],
    provider: &P,
    params: &TopologyResolveParams,
    handles: &ReconstructHandleGenerator,
    resolved: &mut Vec<ResolvedTopologicalNetwork>,
) -> ResolveReport {
    let context = new_context(params, handles);
    let resolver =
        ResolveTopologicalNetwork::new(provider, &GreatCircleIntersector, &DelaunayTriangulator, &context);
    let (outputs, mut failures) = visit_features(store, collections, params, |id, data| match &data.body {
        FeatureBody::TopologicalNetwork(network) => Some(resolver.resolve(id, network)),
        _ => None,
    });
    failures.extend(outputs.iter().filter_map(|network| {
        network.triangulation.as_ref().err().map(|error| ResolveFailure {
            feature: network.feature,
            error: error.clone().into(),
        })
    }));
    finish_batch("networks", context.reconstruct_handle, outputs, failures, resolved)
}

/// Everything resolved by [`resolve_topologies`].
#[derive(Debug, Clone)]
pub struct ResolvedTopologies {
    pub lines: Vec<ResolvedTopologicalLine>,
    pub boundaries: Vec<ResolvedTopologicalBoundary>,
    pub networks: Vec<ResolvedTopologicalNetwork>,
    pub line_report: ResolveReport,
    pub boundary_report: ResolveReport,
    pub network_report: ResolveReport,
}

impl ResolvedTopologies {
    /// All failures of the three batches.
    pub fn failures(&self) -> impl Iterator<Item = &ResolveFailure> {
        self.line_report
            .failures
            .iter()
            .chain(&self.boundary_report.failures)
            .chain(&self.network_report.failures)
    }
}

/// Resolves lines, then boundaries and networks that may use those lines as
/// sections.
///
/// Each resolved line's geometry is added to `snapshot` under the line batch's
/// handle, replacing any line geometry of an earlier call, and the boundary and
/// network batches include that handle in their scope.
pub fn resolve_topologies(
    store: &FeatureStore,
    collections: &[FeatureCollection],
    snapshot: &mut ReconstructionSnapshot,
    params: &TopologyResolveParams,
    handles: &ReconstructHandleGenerator,
) -> ResolvedTopologies {
    if !snapshot.is_at_time(params.reconstruction_time) {
        tracing::warn!(
            snapshot_time = snapshot.time(),
            reconstruction_time = params.reconstruction_time,
            "resolving topologies against a snapshot reconstructed for another time"
        );
    }
    for &feature in collections.iter().flat_map(|c| &c.features) {
        if matches!(store.feature(feature), Ok(data) if matches!(data.body, FeatureBody::TopologicalLine { .. })) {
            snapshot.remove(feature);
        }
    }

    let mut lines = Vec::new();
    let line_report = resolve_topological_lines(store, collections, &*snapshot, params, handles, &mut lines);
    for line in &lines {
        snapshot.insert(ReconstructedFeatureGeometry {
            feature: line.feature,
            reconstruct_handle: line.reconstruct_handle,
            geometry: line.geometry(),
        });
    }

    let mut params = params.clone();
    if let Some(scope) = params.reconstruct_handles.as_mut() {
        scope.push(line_report.reconstruct_handle);
    }
    let mut boundaries = Vec::new();
    let boundary_report =
        resolve_topological_boundaries(store, collections, &*snapshot, &params, handles, &mut boundaries);
    let mut networks = Vec::new();
    let network_report =
        resolve_topological_networks(store, collections, &*snapshot, &params, handles, &mut networks);

    ResolvedTopologies {
        lines,
        boundaries,
        networks,
        line_report,
        boundary_report,
        network_report,
    }
}

fn new_context(params: &TopologyResolveParams, handles: &ReconstructHandleGenerator) -> ResolveContext {
    ResolveContext {
        reconstruction_time: params.reconstruction_time,
        reconstruct_handle: handles.next_handle(),
        scope: params.reconstruct_handles.clone(),
    }
}

/// Runs `resolve_one` over the features of `collections` that exist at the
/// reconstruction time, in collection order.
///
/// `resolve_one` returns `None` for features of a kind it does not resolve.
fn visit_features<T, F>(
    store: &FeatureStore,
    collections: &[FeatureCollection],
    params: &TopologyResolveParams,
    resolve_one: F,
) -> (Vec<T>, Vec<ResolveFailure>)
where
    T: Send,
    F: Fn(FeatureId, &FeatureData) -> Option<Result<Option<T>>> + Sync,
{
    let ids: Vec<FeatureId> = collections
        .iter()
        .flat_map(|collection| collection.features.iter().copied())
        .collect();
    let visit = |&id: &FeatureId| -> Option<(FeatureId, Result<Option<T>>)> {
        let data = match store.feature(id) {
            Ok(data) => data,
            Err(error) => return Some((id, Err(error.into()))),
        };
        if !data.valid_time.contains(params.reconstruction_time) {
            return None;
        }
        resolve_one(id, data).map(|outcome| (id, outcome))
    };
    let outcomes: Vec<(FeatureId, Result<Option<T>>)> = if params.parallel {
        ids.par_iter().filter_map(visit).collect()
    } else {
        ids.iter().filter_map(visit).collect()
    };

    let mut outputs = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (feature, outcome) in outcomes {
        match outcome {
            Ok(Some(output)) => outputs.push(output),
            Ok(None) => {}
            Err(error) => failures.push(ResolveFailure { feature, error }),
        }
    }
    (outputs, failures)
}

fn finish_batch<T>(
    kind: &'static str,
    reconstruct_handle: ReconstructHandle,
    outputs: Vec<T>,
    failures: Vec<ResolveFailure>,
    resolved: &mut Vec<T>,
) -> ResolveReport {
    for failure in &failures {
        tracing::warn!(feature = ?failure.feature, error = %failure.error, "failed to resolve topology");
    }
    tracing::info!(
        kind,
        handle = reconstruct_handle.value(),
        resolved = outputs.len(),
        failed = failures.len(),
        "resolved topologies"
    );
    resolved.extend(outputs);
    ResolveReport {
        reconstruct_handle,
        failures,
    }
}
