//! Fixtures shared by unit tests.

use crate::builder::assemble;
use lineage_core::config::BuildConfig;
use lineage_core::{Node, RecordSet, Xref};
use std::collections::HashMap;
use std::sync::Arc;

/// Nodes with links attached, as a plain lookup table
pub(crate) fn lookup_from(records: &RecordSet) -> HashMap<Xref, Arc<Node>> {
    let config = BuildConfig {
        parallel: false,
        ..BuildConfig::default()
    };
    assemble(records, &config)
        .expect("record set assembles")
        .nodes
}
