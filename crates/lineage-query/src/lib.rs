//! Graph-based relationship query engine over genealogical records.
//!
//! A [`Graph`] is built from a [`RecordSource`](lineage_core::RecordSource)
//! by [`GraphBuilder`], or reopened lazily from a persisted backend with
//! [`Graph::open_lazy`]. It answers kinship walks, path and relationship
//! queries and indexed filters, caches results per mutation epoch, and
//! accepts incremental node and edge changes without a rebuild.
//!
//! ```ignore
//! let (graph, report) = Graph::from_records(&records)?;
//! let ancestors = graph.ancestors(&"I7".into(), 2)?;
//! let rel = graph.relationship_between(&"I7".into(), &"I12".into())?;
//! println!("{}", rel.description);
//! ```

mod analytics;
pub mod builder;
pub mod cache;
pub mod filter;
pub mod graph;
mod incremental;
pub mod index;
mod lazy;
pub mod metrics;
pub mod path;
pub mod relationship;
pub mod service;
pub mod store;
pub mod traversal;
mod validate;
pub mod warning;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::{BuildReport, GraphBuilder};
pub use cache::{CacheStatistics, QueryCache, QueryKey};
pub use filter::{Filter, Predicate};
pub use graph::Graph;
pub use index::IndexManager;
pub use metrics::{GraphMetrics, MetricsSnapshot};
pub use path::{Path, PathKind, PathOptions};
pub use relationship::{CommonAncestor, Relationship, RelationshipKind};
pub use service::GraphService;
pub use store::NodeLookup;
pub use traversal::{Generations, Subtree, SubtreeOptions};
pub use warning::BuildWarning;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        BuildReport, BuildWarning, Filter, Graph, GraphBuilder, GraphService, Path, PathKind,
        PathOptions, Predicate, Relationship, RelationshipKind, SubtreeOptions,
    };
    pub use lineage_core::prelude::*;
}
