//! Main engine object.
//!
//! Owns the store handle and the write paths. Token derivation is coupled
//! to every name mutation here and nowhere else: [`Catalog::create_dish`]
//! and [`Catalog::rename_dish`] rewrite `tokens` and `nameQuery` together
//! with `name`, so the denormalized search fields can only go stale if a
//! writer bypasses the catalog.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{ApprovalState, Dish, SearchQuery};
use crate::normalize::normalize;
use crate::ranking::{rank, RankProfile, MAX_RESULTS};
use crate::search::{fetch_candidates, query_candidates, verify_candidate, CANDIDATE_PAGE_SIZE};
use crate::store::{
    DocumentStore, Fields, StoreError, DISHES_COLLECTION, FIELD_APPROVAL, FIELD_IMAGE_URL,
    FIELD_NAME, FIELD_NAME_QUERY, FIELD_TAGS, FIELD_TOKENS,
};
use crate::tokenizer::searchable_tokens;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("dish name is empty")]
    EmptyName,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Engine tunables. The store's membership-candidate ceiling is a protocol
/// constant, not a knob, and deliberately absent here.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Cap on ranked results returned to callers.
    pub max_results: usize,
    /// Candidate page size for the recall fetch.
    pub candidate_page_size: usize,
    /// Validity window of the resolution cache snapshot.
    pub cache_ttl: Duration,
    pub rank_profile: RankProfile,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_results: MAX_RESULTS,
            candidate_page_size: CANDIDATE_PAGE_SIZE,
            cache_ttl: Duration::seconds(60),
            rank_profile: RankProfile::default(),
        }
    }
}

pub struct Catalog {
    store: Arc<dyn DocumentStore>,
    config: EngineConfig,
}

impl Catalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: Arc<dyn DocumentStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Best-effort dish search.
    ///
    /// Store failures degrade to an empty result instead of propagating:
    /// search is advisory, and a transient outage should read as "nothing
    /// found", not break the caller.
    pub async fn search(&self, query: &SearchQuery) -> Vec<Dish> {
        let normalized_query = normalize(&query.text);
        if normalized_query.is_empty() {
            return Vec::new();
        }

        let candidates = query_candidates(&normalized_query);
        if candidates.is_empty() {
            return Vec::new();
        }

        let fetched = fetch_candidates(
            self.store.as_ref(),
            &candidates,
            &normalized_query,
            self.config.candidate_page_size,
        )
        .await;
        let (documents, path) = match fetched {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(error = %err, query = %query.text, "search degraded to empty result");
                return Vec::new();
            }
        };
        debug!(?path, candidates = documents.len(), "fetched candidate page");

        let mut seen = HashSet::new();
        let mut verified = Vec::new();
        for document in documents {
            if !seen.insert(document.id.clone()) {
                continue;
            }
            let Some(dish) = Dish::from_document(&document) else {
                continue;
            };
            let normalized_name = normalize(&dish.name);
            if verify_candidate(&dish, &normalized_name, &normalized_query, query) {
                verified.push(dish);
            }
        }

        rank(
            verified,
            &normalized_query,
            self.config.rank_profile,
            self.config.max_results,
        )
    }

    /// Create a dish with freshly derived search fields.
    pub async fn create_dish(
        &self,
        name: &str,
        tags: Vec<String>,
        image_url: Option<String>,
        approval: ApprovalState,
    ) -> Result<Dish, CatalogError> {
        let name = name.trim();
        if normalize(name).is_empty() {
            return Err(CatalogError::EmptyName);
        }

        let mut fields = reindex_fields(name);
        fields.insert(FIELD_NAME.to_string(), Value::String(name.to_string()));
        fields.insert(
            FIELD_TAGS.to_string(),
            Value::Array(tags.iter().cloned().map(Value::String).collect()),
        );
        if let Some(url) = &image_url {
            fields.insert(FIELD_IMAGE_URL.to_string(), Value::String(url.clone()));
        }
        fields.insert(
            FIELD_APPROVAL.to_string(),
            Value::String(approval.as_str().to_string()),
        );

        let id = self.store.create_document(DISHES_COLLECTION, fields).await?;
        debug!(%id, name, "created dish");

        Ok(Dish {
            id,
            name: name.to_string(),
            name_query: normalize(name),
            tokens: searchable_tokens(name),
            tags,
            image_url,
            approval,
        })
    }

    /// Rename a dish. The derived fields travel in the same update; a
    /// rename that skipped them would silently shrink recall until the
    /// next rewrite.
    pub async fn rename_dish(&self, id: &str, new_name: &str) -> Result<(), CatalogError> {
        let new_name = new_name.trim();
        if normalize(new_name).is_empty() {
            return Err(CatalogError::EmptyName);
        }

        let mut fields = reindex_fields(new_name);
        fields.insert(FIELD_NAME.to_string(), Value::String(new_name.to_string()));
        self.store
            .update_document(DISHES_COLLECTION, id, fields)
            .await?;
        debug!(%id, new_name, "renamed dish and rewrote derived fields");
        Ok(())
    }
}

/// The derived search fields every name write must carry.
fn reindex_fields(name: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        FIELD_NAME_QUERY.to_string(),
        Value::String(normalize(name)),
    );
    fields.insert(
        FIELD_TOKENS.to_string(),
        Value::Array(
            searchable_tokens(name)
                .into_iter()
                .map(Value::String)
                .collect(),
        ),
    );
    fields
}
