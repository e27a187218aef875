/// Opaque 64-bit address in the chunk-store namespace.
/// Treated as an opaque handle by higher layers.
pub type ChunkKey = u64;
