pub mod section;

pub use section::{ActiveSection, LineSection, PointSection, SectionElement, TimePeriod};

use crate::error::TopologyError;
use crate::geometry::GeometryOnSphere;
use crate::triangulation::TriangulationParams;
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Unique identifier for a feature in the feature store.
    pub struct FeatureId;
}

/// Identifier of a tectonic plate in the rotation model.
pub type PlateId = u32;

/// The sections and triangulation settings of a topological network.
#[derive(Debug, Clone, Default)]
pub struct TopologicalNetworkDefinition {
    /// Sections forming the network's outer boundary ring.
    pub boundary: Vec<SectionElement>,
    /// Geometries enclosed by the boundary that constrain the triangulation.
    pub interiors: Vec<SectionElement>,
    pub params: TriangulationParams,
}

/// What a feature is: a geometry reconstructed by plate rotation, or a
/// topology defined by references to other features.
#[derive(Debug, Clone)]
pub enum FeatureBody {
    Reconstructable {
        plate_id: PlateId,
        geometry: GeometryOnSphere,
    },
    TopologicalLine {
        sections: Vec<SectionElement>,
    },
    TopologicalBoundary {
        sections: Vec<SectionElement>,
    },
    TopologicalNetwork(TopologicalNetworkDefinition),
}

/// Data associated with a feature.
#[derive(Debug, Clone)]
pub struct FeatureData {
    pub name: String,
    /// Times at which the feature exists.
    pub valid_time: TimePeriod,
    pub body: FeatureBody,
}

impl FeatureData {
    /// A geometry carried by a plate.
    #[must_use]
    pub fn reconstructable(name: impl Into<String>, plate_id: PlateId, geometry: GeometryOnSphere) -> Self {
        Self::new(name, FeatureBody::Reconstructable { plate_id, geometry })
    }

    #[must_use]
    pub fn topological_line(name: impl Into<String>, sections: Vec<SectionElement>) -> Self {
        Self::new(name, FeatureBody::TopologicalLine { sections })
    }

    #[must_use]
    pub fn topological_boundary(name: impl Into<String>, sections: Vec<SectionElement>) -> Self {
        Self::new(name, FeatureBody::TopologicalBoundary { sections })
    }

    #[must_use]
    pub fn topological_network(name: impl Into<String>, network: TopologicalNetworkDefinition) -> Self {
        Self::new(name, FeatureBody::TopologicalNetwork(network))
    }

    /// Limits the feature to the given valid time.
    #[must_use]
    pub fn with_valid_time(mut self, valid_time: TimePeriod) -> Self {
        self.valid_time = valid_time;
        self
    }

    fn new(name: impl Into<String>, body: FeatureBody) -> Self {
        Self {
            name: name.into(),
            valid_time: TimePeriod::ALL_TIME,
            body,
        }
    }
}

/// Central arena that owns all features.
///
/// Topological features reference their sections by [`FeatureId`], so a
/// section may be shared by any number of topologies.
#[derive(Debug, Default)]
pub struct FeatureStore {
    features: SlotMap<FeatureId, FeatureData>,
}

impl FeatureStore {
    /// Creates a new, empty feature store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a feature and returns its ID.
    pub fn add_feature(&mut self, data: FeatureData) -> FeatureId {
        self.features.insert(data)
    }

    /// Returns a reference to the feature data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the feature is not in the store.
    pub fn feature(&self, id: FeatureId) -> Result<&FeatureData, TopologyError> {
        self.features
            .get(id)
            .ok_or_else(|| TopologyError::FeatureNotFound(format!("{id:?}")))
    }

    /// Returns a mutable reference to the feature data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the feature is not in the store.
    pub fn feature_mut(&mut self, id: FeatureId) -> Result<&mut FeatureData, TopologyError> {
        self.features
            .get_mut(id)
            .ok_or_else(|| TopologyError::FeatureNotFound(format!("{id:?}")))
    }

    /// Removes a feature. Topologies still referencing it will skip the section.
    pub fn remove_feature(&mut self, id: FeatureId) -> Option<FeatureData> {
        self.features.remove(id)
    }

    /// Iterates over all features in insertion order of their slots.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, &FeatureData)> {
        self.features.iter()
    }
}

/// A named, ordered group of features.
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub name: String,
    pub features: Vec<FeatureId>,
}

impl FeatureCollection {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            features: Vec::new(),
        }
    }

    /// Adds a feature to the store and records it in this collection.
    pub fn add(&mut self, store: &mut FeatureStore, data: FeatureData) -> FeatureId {
        let id = store.add_feature(data);
        self.features.push(id);
        id
    }
}
