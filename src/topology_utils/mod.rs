mod partition;
mod resolve;

pub use partition::{BoundaryPartition, GeometryPartition, ResolvedBoundariesForGeometryPartitioning};
pub use resolve::{
    resolve_topological_boundaries, resolve_topological_lines, resolve_topological_networks, resolve_topologies,
    ResolveFailure, ResolveReport, ResolvedTopologies, TopologyResolveParams,
};
