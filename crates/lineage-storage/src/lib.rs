//! Persistence backends for the lineage engine.
//!
//! - [`MemoryBackend`]: every node resident, the default
//! - [`HybridBackend`]: indexed metadata in memory, node payloads in a
//!   [`BlobStore`] ([`MemoryBlobStore`] or [`FsBlobStore`])

pub mod blob;
pub mod codec;
mod edges;
pub mod hybrid;
pub mod memory;

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use hybrid::{HybridBackend, HybridStatistics};
pub use memory::MemoryBackend;
