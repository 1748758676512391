//! End-to-end indexing pipeline tests.

use crate::common::{failing_embedder_services, mock_services, HANDBOOK, RUNBOOK};
use docbase::{IndexState, SearchOutcome};

#[tokio::test]
async fn test_index_document_end_to_end() {
    let services = mock_services();

    let report = services
        .indexer
        .index_document("acme", "handbook", HANDBOOK)
        .await;

    assert!(report.success, "index failed: {:?}", report.error);
    assert!(report.chunk_count >= 1);
    assert_eq!(
        services.indexer.index_state("acme", "handbook").await,
        IndexState::Indexed
    );
}

#[tokio::test]
async fn test_indexed_chunks_carry_headings() {
    let services = mock_services();
    services
        .indexer
        .index_document("acme", "handbook", HANDBOOK)
        .await;

    let outcome = services
        .retriever
        .search("acme", "employees receive 25 days of annual leave", None, None)
        .await
        .unwrap();

    let hits = outcome.hits();
    assert!(!hits.is_empty());
    // The handbook fixture fits one chunk, so every hit carries the
    // heading in effect at its start.
    assert_eq!(hits[0].chunk.heading.as_deref(), Some("Leave Policy"));
    assert!(hits[0].chunk.token_estimate > 0);
}

#[tokio::test]
async fn test_reindex_is_idempotent() {
    let services = mock_services();

    let first = services
        .indexer
        .index_document("acme", "handbook", HANDBOOK)
        .await;
    let second = services
        .indexer
        .index_document("acme", "handbook", HANDBOOK)
        .await;

    assert!(first.success && second.success);
    assert_eq!(first.chunk_count, second.chunk_count);
    assert_eq!(
        services.indexer.index_state("acme", "handbook").await,
        IndexState::Indexed
    );
}

#[tokio::test]
async fn test_reindex_with_new_content_replaces_old() {
    let services = mock_services();

    services
        .indexer
        .index_document("acme", "doc", "The cafeteria serves lunch at noon.")
        .await;
    services
        .indexer
        .index_document("acme", "doc", RUNBOOK)
        .await;

    // Old content is gone: a cafeteria query no longer matches text
    let outcome = services
        .retriever
        .search(
            "acme",
            "rotate kubernetes certificates every ninety days",
            None,
            None,
        )
        .await
        .unwrap();
    let hits = outcome.hits();
    assert!(!hits.is_empty());
    for hit in hits {
        assert!(!hit.chunk.text.contains("cafeteria"));
    }
}

#[tokio::test]
async fn test_empty_document_fails() {
    let services = mock_services();

    let report = services.indexer.index_document("acme", "empty", "").await;

    assert!(!report.success);
    assert_eq!(report.chunk_count, 0);
    assert_eq!(
        services.indexer.index_state("acme", "empty").await.as_str(),
        "failed"
    );
}

#[tokio::test]
async fn test_embedder_outage_fails_run_and_search_sees_nothing() {
    let services = failing_embedder_services();

    let report = services
        .indexer
        .index_document("acme", "handbook", HANDBOOK)
        .await;

    assert!(!report.success);
    assert!(report
        .error
        .as_deref()
        .unwrap_or("")
        .contains("unavailable"));
    match services.indexer.index_state("acme", "handbook").await {
        IndexState::Failed { error } => assert!(error.contains("unavailable")),
        other => panic!("expected failed, got {}", other.as_str()),
    }
}

#[tokio::test]
async fn test_tenant_isolation_end_to_end() {
    let services = mock_services();

    services
        .indexer
        .index_document("acme", "doc", HANDBOOK)
        .await;
    services
        .indexer
        .index_document("globex", "doc", RUNBOOK)
        .await;

    // acme's search never surfaces globex content, even for a query
    // aimed straight at it: acme's own candidates are all below the
    // floor, so nothing ranks.
    let outcome = services
        .retriever
        .search(
            "acme",
            "rotate kubernetes certificates every ninety days",
            None,
            None,
        )
        .await
        .unwrap();
    assert!(!outcome.is_ranked());

    // The same query from globex ranks its own content
    let outcome = services
        .retriever
        .search(
            "globex",
            "rotate kubernetes certificates every ninety days",
            None,
            None,
        )
        .await
        .unwrap();
    let hits = outcome.hits();
    assert!(!hits.is_empty());
    for hit in hits {
        assert_eq!(hit.chunk.tenant_id, "globex");
    }

    // And index state is tracked per tenant
    assert_eq!(
        services.indexer.index_state("acme", "doc").await,
        IndexState::Indexed
    );
    assert_eq!(
        services.indexer.index_state("globex", "doc").await,
        IndexState::Indexed
    );
    assert_eq!(
        services.indexer.index_state("initech", "doc").await,
        IndexState::NotIndexed
    );
}

#[tokio::test]
async fn test_unindexed_tenant_has_no_candidates() {
    let services = mock_services();
    services
        .indexer
        .index_document("acme", "doc", HANDBOOK)
        .await;

    let outcome = services
        .retriever
        .search("globex", "annual leave", None, None)
        .await
        .unwrap();
    assert!(matches!(outcome, SearchOutcome::NoCandidates));
}
