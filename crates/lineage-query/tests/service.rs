//! Async facade tests

mod common;

use common::*;
use lineage_core::{Edge, EdgeKind, GraphConfig, Record};
use lineage_query::{Filter, GraphService, PathKind, PathOptions, RelationshipKind};
use std::sync::Arc;

async fn service() -> GraphService {
    let (service, report) = GraphService::build(Arc::new(extended()), GraphConfig::default())
        .await
        .unwrap();
    assert!(report.is_clean());
    service
}

#[tokio::test]
async fn test_queries_through_service() {
    init_tracing();
    let service = service().await;

    assert_eq!(service.parents(x("KID")).await.unwrap(), ids(&["FA", "MO"]));
    assert_eq!(service.children(x("GF")).await.unwrap(), ids(&["FA", "UNC"]));
    assert_eq!(service.siblings(x("UNC")).await.unwrap(), ids(&["FA"]));
    assert_eq!(service.ancestors(x("COU"), 0).await.unwrap().len(), 4);
    assert_eq!(service.descendants(x("GM"), 1).await.unwrap().len(), 2);

    let rel = service
        .relationship_between(x("GF"), x("KID"))
        .await
        .unwrap();
    assert_eq!(rel.kind, RelationshipKind::Descendant);
    assert_eq!(rel.generations, Some((0, 2)));

    let marital = service
        .all_paths(
            x("FA"),
            x("AUN"),
            PathOptions {
                marital_only: true,
                ..PathOptions::default()
            },
        )
        .await
        .unwrap();
    assert!(marital.is_empty());

    let any = service
        .all_paths(x("FA"), x("MO"), PathOptions::default())
        .await
        .unwrap();
    assert_eq!(any[0].kind, PathKind::Marital);
}

#[tokio::test]
async fn test_errors_cross_the_service_unchanged() {
    let service = service().await;
    let err = service.parents(x("NOBODY")).await.unwrap_err();
    assert!(err.is_not_found());

    let err = service
        .all_paths(
            x("FA"),
            x("MO"),
            PathOptions {
                blood_only: true,
                marital_only: true,
                ..PathOptions::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_invalid_parameter());
}

#[tokio::test]
async fn test_mutations_interleaved_with_queries() {
    let service = service().await;

    let mut readers = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        readers.push(tokio::spawn(async move {
            service.filter(Filter::new().name_contains("hale")).await
        }));
    }

    service
        .add_node(x("BABY"), Record::Individual(woman("Bea", "Hale", 1988)))
        .await
        .unwrap();
    service
        .add_edge(Edge::new(EdgeKind::Child, "F3", "BABY"))
        .await
        .unwrap();

    for reader in readers {
        let found = reader.await.unwrap().unwrap();
        // Each reader saw the graph either before or after the new node
        assert!(found.len() == 6 || found.len() == 7);
    }

    assert_eq!(service.siblings(x("COU")).await.unwrap(), ids(&["BABY"]));
    let path = service
        .shortest_path(x("BABY"), x("KID"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(path.len(), 6);
    assert!(service.validate().await.unwrap().is_empty());

    service.remove_node(x("BABY")).await.unwrap();
    assert!(service.siblings(x("COU")).await.unwrap().is_empty());
    assert_eq!(service.graph().metrics().mutations, 3);
}
