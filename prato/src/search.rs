//! Recall-oriented candidate fetch and verification.
//!
//! One membership query pulls a generous page of token-overlap candidates.
//! Token overlap is a lossy approximation, so every candidate is
//! re-verified with a real substring check before filtering and ranking.
//! When the store cannot answer the membership query the fetch degrades to
//! a prefix range scan on the stored normalized name: worse recall, same
//! verification.

use tracing::warn;

use crate::models::{ApprovalState, Dish, SearchQuery};
use crate::store::{
    Document, DocumentStore, StoreResult, DISHES_COLLECTION, FIELD_NAME_QUERY, FIELD_TOKENS,
    MEMBERSHIP_CANDIDATE_LIMIT, RANGE_END_SENTINEL,
};
use crate::tokenizer::{searchable_tokens, MIN_TOKEN_LEN};

/// Page size for the candidate fetch. Recall-oriented: the client filters
/// and ranks, so fetching wide is cheaper than missing.
pub(crate) const CANDIDATE_PAGE_SIZE: usize = 100;

/// Which query shape produced the candidate page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPath {
    /// Token-membership query.
    Tokens,
    /// Prefix range scan on the normalized name. Only finds prefix
    /// matches; availability over recall.
    NameRange,
}

/// Candidate tokens for the membership query: generation order (full
/// normalized query first), usable length only, truncated to the store's
/// candidate ceiling.
pub(crate) fn query_candidates(normalized_query: &str) -> Vec<String> {
    searchable_tokens(normalized_query)
        .into_iter()
        .filter(|token| token.chars().count() >= MIN_TOKEN_LEN)
        .take(MEMBERSHIP_CANDIDATE_LIMIT)
        .collect()
}

/// Fetch a candidate page, preferring the token path and falling back to
/// the range path when the store cannot answer it.
pub(crate) async fn fetch_candidates(
    store: &dyn DocumentStore,
    candidates: &[String],
    normalized_query: &str,
    page_size: usize,
) -> StoreResult<(Vec<Document>, SearchPath)> {
    match store
        .query_by_token_membership(DISHES_COLLECTION, FIELD_TOKENS, candidates, page_size)
        .await
    {
        Ok(documents) => Ok((documents, SearchPath::Tokens)),
        Err(err) => {
            warn!(error = %err, "token membership query failed, trying name range fallback");
            let upper = format!("{normalized_query}{RANGE_END_SENTINEL}");
            let documents = store
                .query_by_name_range(
                    DISHES_COLLECTION,
                    FIELD_NAME_QUERY,
                    normalized_query,
                    &upper,
                    page_size,
                )
                .await?;
            Ok((documents, SearchPath::NameRange))
        }
    }
}

/// Token overlap is necessary, not sufficient: a candidate survives only
/// if its normalized name really contains the normalized query, it carries
/// every requested tag, and it passes the approval filter.
pub(crate) fn verify_candidate(
    dish: &Dish,
    normalized_name: &str,
    normalized_query: &str,
    query: &SearchQuery,
) -> bool {
    if !normalized_name.contains(normalized_query) {
        return false;
    }
    if !query.tags.iter().all(|tag| dish.tags.contains(tag)) {
        return false;
    }
    query.include_all_states || dish.approval == ApprovalState::Approved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn dish(name: &str, tags: &[&str], approval: ApprovalState) -> Dish {
        Dish {
            id: "id".to_string(),
            name: name.to_string(),
            name_query: normalize(name),
            tokens: Vec::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            image_url: None,
            approval,
        }
    }

    // ── query candidates ─────────────────────────────────────────

    #[test]
    fn candidates_start_with_the_full_query_and_respect_the_ceiling() {
        let candidates = query_candidates("arroz de pato");
        assert_eq!(candidates[0], "arroz de pato");
        assert!(candidates.len() <= MEMBERSHIP_CANDIDATE_LIMIT);
        assert!(candidates.iter().all(|t| t.chars().count() >= MIN_TOKEN_LEN));
    }

    #[test]
    fn single_letter_queries_produce_no_candidates() {
        assert!(query_candidates("a").is_empty());
    }

    // ── containment gate ─────────────────────────────────────────

    #[test]
    fn containment_gate_rejects_token_only_overlap() {
        // Shares tokens with a "sopa" query family but does not contain
        // the query text itself.
        let d = dish("Sopa de Peixe", &[], ApprovalState::Approved);
        let query = SearchQuery::new("sopa de legumes");
        assert!(!verify_candidate(
            &d,
            &normalize(&d.name),
            "sopa de legumes",
            &query
        ));
    }

    #[test]
    fn containment_is_accent_insensitive() {
        let d = dish("Bacalhau à Brás", &[], ApprovalState::Approved);
        let query = SearchQuery::new("bras");
        assert!(verify_candidate(&d, &normalize(&d.name), "bras", &query));
    }

    // ── tag and approval filters ─────────────────────────────────

    #[test]
    fn all_requested_tags_must_be_present() {
        let d = dish("Sopa de Legumes", &["sopa", "vegetariano"], ApprovalState::Approved);
        let nn = normalize(&d.name);

        let query = SearchQuery::new("sopa").with_tags(vec!["vegetariano".to_string()]);
        assert!(verify_candidate(&d, &nn, "sopa", &query));

        let query = SearchQuery::new("sopa")
            .with_tags(vec!["vegetariano".to_string(), "carne".to_string()]);
        assert!(!verify_candidate(&d, &nn, "sopa", &query));
    }

    #[test]
    fn unapproved_dishes_are_filtered_unless_overridden() {
        let d = dish("Sopa de Legumes", &[], ApprovalState::Pending);
        let nn = normalize(&d.name);

        let query = SearchQuery::new("sopa");
        assert!(!verify_candidate(&d, &nn, "sopa", &query));

        let query = SearchQuery::new("sopa").including_all_states();
        assert!(verify_candidate(&d, &nn, "sopa", &query));
    }
}
