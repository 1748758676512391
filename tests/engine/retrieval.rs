//! End-to-end hybrid retrieval tests.

use crate::common::{degraded_services, mock_services, HANDBOOK, RUNBOOK};

use docbase::core::error::DocbaseError;
use docbase::SearchOutcome;

#[tokio::test]
async fn test_relevant_query_is_ranked() {
    let services = mock_services();
    services
        .indexer
        .index_document("acme", "handbook", HANDBOOK)
        .await;

    let outcome = services
        .retriever
        .search("acme", "how many days of annual leave", None, None)
        .await
        .unwrap();

    let results = match outcome {
        SearchOutcome::Ranked(results) => results,
        other => panic!("expected ranked, got {other:?}"),
    };
    assert!(!results.hits.is_empty());
    assert!(!results.lexical_degraded);
    for hit in &results.hits {
        assert!(hit.semantic_score >= 0.0 && hit.semantic_score <= 1.0);
        assert!(hit.lexical_score >= 0.0 && hit.lexical_score <= 1.0);
        assert!(hit.combined_score >= 0.0 && hit.combined_score <= 1.0);
    }
}

#[tokio::test]
async fn test_hits_sorted_and_truncated() {
    let services = mock_services();
    // Index several small documents so the candidate set is larger
    // than top_n.
    for i in 0..8 {
        services
            .indexer
            .index_document(
                "acme",
                &format!("doc-{i}"),
                &format!("Policy note {i}: annual leave requests go through the portal."),
            )
            .await;
    }

    let outcome = services
        .retriever
        .search("acme", "annual leave requests", Some(3), None)
        .await
        .unwrap();

    let hits = outcome.hits();
    assert_eq!(hits.len(), 3);
    for pair in hits.windows(2) {
        assert!(pair[0].combined_score >= pair[1].combined_score);
    }
}

#[tokio::test]
async fn test_relevance_floor_blocks_weak_matches() {
    let services = mock_services();
    services
        .indexer
        .index_document("acme", "runbook", RUNBOOK)
        .await;

    // Token-disjoint query: raw cosine near 0, below the default
    // 0.3 floor even though candidates exist.
    let outcome = services
        .retriever
        .search("acme", "chocolate cake recipe", None, None)
        .await
        .unwrap();

    match outcome {
        SearchOutcome::InsufficientRelevance { best_semantic } => {
            assert!(best_semantic < 0.3);
        }
        other => panic!("expected insufficient relevance, got {other:?}"),
    }
}

#[tokio::test]
async fn test_no_candidates_is_distinct_from_low_relevance() {
    let services = mock_services();

    // Nothing indexed at all
    let outcome = services
        .retriever
        .search("acme", "anything", None, None)
        .await
        .unwrap();
    assert!(matches!(outcome, SearchOutcome::NoCandidates));
    assert!(!outcome.is_ranked());
    assert!(outcome.hits().is_empty());
}

#[tokio::test]
async fn test_lexical_outage_degrades_to_semantic_only() {
    let services = degraded_services();
    services
        .indexer
        .index_document("acme", "handbook", HANDBOOK)
        .await;

    let outcome = services
        .retriever
        .search("acme", "employees receive 25 days of annual leave", None, None)
        .await
        .unwrap();

    let results = match outcome {
        SearchOutcome::Ranked(results) => results,
        other => panic!("expected ranked despite lexical outage, got {other:?}"),
    };
    assert!(results.lexical_degraded);
    assert!(!results.hits.is_empty());
    for hit in &results.hits {
        assert_eq!(hit.lexical_score, 0.0);
        assert!((hit.combined_score - hit.semantic_score).abs() < 1e-6);
    }
}

#[tokio::test]
async fn test_document_filter_scopes_search() {
    let services = mock_services();
    services
        .indexer
        .index_document("acme", "handbook", HANDBOOK)
        .await;
    services
        .indexer
        .index_document("acme", "runbook", RUNBOOK)
        .await;

    let outcome = services
        .retriever
        .search("acme", "drain nodes before kernel upgrades", None, Some("runbook"))
        .await
        .unwrap();
    let hits = outcome.hits();
    assert!(!hits.is_empty());
    for hit in hits {
        assert_eq!(hit.chunk.document_id, "runbook");
    }
}

#[tokio::test]
async fn test_empty_query_is_invalid() {
    let services = mock_services();
    let err = services
        .retriever
        .search("acme", "  \t ", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DocbaseError::InvalidQuery(_)));
}

#[tokio::test]
async fn test_search_is_deterministic() {
    let services = mock_services();
    services
        .indexer
        .index_document("acme", "handbook", HANDBOOK)
        .await;
    services
        .indexer
        .index_document("acme", "runbook", RUNBOOK)
        .await;

    let query = "incidents must be reported to the incident hotline immediately";
    let first = services
        .retriever
        .search("acme", query, None, None)
        .await
        .unwrap();
    let second = services
        .retriever
        .search("acme", query, None, None)
        .await
        .unwrap();

    assert!(!first.hits().is_empty());
    let ids = |outcome: &SearchOutcome| {
        outcome
            .hits()
            .iter()
            .map(|h| (h.chunk.document_id.clone(), h.chunk.ordinal))
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
}
