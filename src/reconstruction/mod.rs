use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::SecondaryMap;

use crate::feature::{FeatureBody, FeatureId, FeatureStore, PlateId};
use crate::geometry::GeometryOnSphere;
use crate::math::Rotation;

/// Opaque tag identifying which reconstruction or resolution batch produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReconstructHandle(u64);

impl ReconstructHandle {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Hands out unique reconstruct handles.
///
/// Owned by whoever orchestrates reconstruction and resolution batches; safe to
/// share between threads.
#[derive(Debug, Default)]
pub struct ReconstructHandleGenerator {
    next: AtomicU64,
}

impl ReconstructHandleGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle not returned before by this generator.
    pub fn next_handle(&self) -> ReconstructHandle {
        ReconstructHandle(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Total rotations of plates, relative to the fixed reference frame, at one
/// reconstruction time.
#[derive(Debug, Clone, Default)]
pub struct RotationModel {
    rotations: HashMap<PlateId, Rotation>,
}

impl RotationModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, plate_id: PlateId, rotation: Rotation) {
        self.rotations.insert(plate_id, rotation);
    }

    /// The plate's total rotation, or the identity for plates with no rotation.
    #[must_use]
    pub fn rotation(&self, plate_id: PlateId) -> Rotation {
        self.rotations
            .get(&plate_id)
            .copied()
            .unwrap_or_else(Rotation::identity)
    }
}

/// A feature's geometry reconstructed to a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructedFeatureGeometry {
    pub feature: FeatureId,
    pub reconstruct_handle: ReconstructHandle,
    pub geometry: GeometryOnSphere,
}

/// Looks up the reconstructed geometry of a topological section.
///
/// Implementations must return the same answer for the same query while a
/// reconstruction time is fixed, and must be safe to query from several
/// resolvers at once.
pub trait ReconstructedSectionProvider: Sync {
    /// Returns the reconstructed geometry of `feature`.
    ///
    /// When `scope` is given, only geometries tagged with one of its handles
    /// are considered.
    fn resolve(
        &self,
        feature: FeatureId,
        scope: Option<&[ReconstructHandle]>,
    ) -> Option<&GeometryOnSphere>;
}

/// The reconstructed geometries of a set of features at one reconstruction time.
#[derive(Debug, Clone, Default)]
pub struct ReconstructionSnapshot {
    time: f64,
    geometries: SecondaryMap<FeatureId, Vec<ReconstructedFeatureGeometry>>,
}

impl ReconstructionSnapshot {
    /// Creates an empty snapshot for `time`.
    #[must_use]
    pub fn new(time: f64) -> Self {
        Self {
            time,
            geometries: SecondaryMap::new(),
        }
    }

    /// Reconstructs every reconstructable feature that exists at `time` by
    /// rotating its geometry with its plate's total rotation.
    #[must_use]
    pub fn reconstruct(
        store: &FeatureStore,
        rotations: &RotationModel,
        time: f64,
        handle: ReconstructHandle,
    ) -> Self {
        let mut snapshot = Self::new(time);
        for (feature, data) in store.iter() {
            let FeatureBody::Reconstructable { plate_id, geometry } = &data.body else {
                continue;
            };
            if !data.valid_time.contains(time) {
                continue;
            }
            snapshot.insert(ReconstructedFeatureGeometry {
                feature,
                reconstruct_handle: handle,
                geometry: geometry.rotated(&rotations.rotation(*plate_id)),
            });
        }
        tracing::debug!(time, handle = handle.value(), "reconstructed feature geometries");
        snapshot
    }

    /// The reconstruction time of this snapshot.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Adds a reconstructed geometry. A feature may hold one geometry per handle.
    pub fn insert(&mut self, geometry: ReconstructedFeatureGeometry) {
        let feature = geometry.feature;
        if let Some(entries) = self.geometries.get_mut(feature) {
            entries.retain(|g| g.reconstruct_handle != geometry.reconstruct_handle);
            entries.push(geometry);
        } else {
            self.geometries.insert(feature, vec![geometry]);
        }
    }

    /// Removes every reconstructed geometry of `feature`.
    pub fn remove(&mut self, feature: FeatureId) -> Vec<ReconstructedFeatureGeometry> {
        self.geometries.remove(feature).unwrap_or_default()
    }

    /// Returns `true` if the snapshot was reconstructed for `time`.
    #[must_use]
    pub fn is_at_time(&self, time: f64) -> bool {
        (self.time - time).abs() <= f64::EPSILON * self.time.abs().max(1.0)
    }

    /// Iterates over all reconstructed geometries.
    pub fn iter(&self) -> impl Iterator<Item = &ReconstructedFeatureGeometry> {
        self.geometries.values().flatten()
    }

    /// Number of reconstructed geometries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.geometries.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReconstructedSectionProvider for ReconstructionSnapshot {
    fn resolve(
        &self,
        feature: FeatureId,
        scope: Option<&[ReconstructHandle]>,
    ) -> Option<&GeometryOnSphere> {
        self.geometries
            .get(feature)?
            .iter()
            .rev()
            .find(|g| scope.is_none_or(|handles| handles.contains(&g.reconstruct_handle)))
            .map(|g| &g.geometry)
    }
}
