/// Cluster-unique identifier of a column builder.
///
/// Builders are visible cluster-wide before they are closed, so identifiers
/// are allocated from the store's key space rather than generated locally.
pub type BuilderId = u64;

/// Identifier of a chunk-layout group.
pub type GroupId = u64;
