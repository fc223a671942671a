//! Async facade for hosts running on tokio.
//!
//! Every call moves the synchronous operation onto the blocking pool, so
//! lazy fetches and long traversals never stall the async executor. The
//! wrapped graph behaves exactly as it does when called directly.

use crate::builder::{BuildReport, GraphBuilder};
use crate::filter::Filter;
use crate::graph::Graph;
use crate::path::{Path, PathOptions};
use crate::relationship::Relationship;
use crate::traversal::Generations;
use crate::warning::BuildWarning;
use anyhow::anyhow;
use lineage_core::{
    ComponentId, Edge, EdgeId, GraphConfig, LineageError, Record, RecordSource, Result, Xref,
};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct GraphService {
    graph: Arc<Graph>,
}

impl GraphService {
    pub fn new(graph: Arc<Graph>) -> Self {
        Self { graph }
    }

    /// Build a resident graph off the async executor
    pub async fn build<S>(source: Arc<S>, config: GraphConfig) -> Result<(Self, BuildReport)>
    where
        S: RecordSource + 'static,
    {
        let (graph, report) = tokio::task::spawn_blocking(move || {
            GraphBuilder::new(config).build(source.as_ref())
        })
        .await
        .map_err(|e| LineageError::Other(anyhow!("build task failed: {}", e)))??;
        Ok((Self::new(Arc::new(graph)), report))
    }

    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Graph) -> Result<T> + Send + 'static,
    {
        let graph = Arc::clone(&self.graph);
        tokio::task::spawn_blocking(move || f(&graph))
            .await
            .map_err(|e| LineageError::Other(anyhow!("{} task failed: {}", op, e)))?
    }

    pub async fn parents(&self, xref: Xref) -> Result<BTreeSet<Xref>> {
        self.run("parents", move |g| g.parents(&xref)).await
    }

    pub async fn children(&self, xref: Xref) -> Result<BTreeSet<Xref>> {
        self.run("children", move |g| g.children(&xref)).await
    }

    pub async fn spouses(&self, xref: Xref) -> Result<BTreeSet<Xref>> {
        self.run("spouses", move |g| g.spouses(&xref)).await
    }

    pub async fn siblings(&self, xref: Xref) -> Result<BTreeSet<Xref>> {
        self.run("siblings", move |g| g.siblings(&xref)).await
    }

    pub async fn ancestors(&self, xref: Xref, max_generations: i32) -> Result<Generations> {
        self.run("ancestors", move |g| g.ancestors(&xref, max_generations))
            .await
    }

    pub async fn descendants(&self, xref: Xref, max_generations: i32) -> Result<Generations> {
        self.run("descendants", move |g| g.descendants(&xref, max_generations))
            .await
    }

    pub async fn shortest_path(&self, from: Xref, to: Xref) -> Result<Option<Path>> {
        self.run("shortest_path", move |g| g.shortest_path(&from, &to))
            .await
    }

    pub async fn all_paths(&self, from: Xref, to: Xref, options: PathOptions) -> Result<Vec<Path>> {
        self.run("all_paths", move |g| g.all_paths_with(&from, &to, &options))
            .await
    }

    pub async fn relationship_between(&self, from: Xref, to: Xref) -> Result<Relationship> {
        self.run("relationship", move |g| g.relationship_between(&from, &to))
            .await
    }

    pub async fn filter(&self, filter: Filter) -> Result<BTreeSet<Xref>> {
        self.run("filter", move |g| g.filter(&filter)).await
    }

    pub async fn add_node(&self, xref: Xref, record: Record) -> Result<()> {
        self.run("add_node", move |g| g.add_node(xref, record)).await
    }

    pub async fn remove_node(&self, xref: Xref) -> Result<()> {
        self.run("remove_node", move |g| g.remove_node(&xref)).await
    }

    pub async fn add_edge(&self, edge: Edge) -> Result<()> {
        self.run("add_edge", move |g| g.add_edge(edge)).await
    }

    pub async fn remove_edge(&self, id: EdgeId) -> Result<()> {
        self.run("remove_edge", move |g| g.remove_edge(&id)).await
    }

    pub async fn load_component(&self, id: ComponentId) -> Result<usize> {
        self.run("load_component", move |g| g.load_component(id)).await
    }

    pub async fn validate(&self) -> Result<Vec<BuildWarning>> {
        self.run("validate", |g| g.validate()).await
    }
}
