//! In-memory document store.
//!
//! Implements the remote store's query semantics over process-local maps;
//! backs the test suites and the application's offline mode. Collections
//! iterate in document-id order, so query results are deterministic.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::store::{
    Document, DocumentStore, Fields, StoreError, StoreResult, MEMBERSHIP_CANDIDATE_LIMIT,
};

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, Fields>>,
    next_id: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    refuse_membership: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make membership queries fail the way a deployment with an unindexed
    /// token field does, forcing callers onto their fallback path.
    pub fn refuse_membership_queries(&self, refuse: bool) {
        self.refuse_membership.store(refuse, Ordering::SeqCst);
    }

    pub fn document_count(&self, collection: &str) -> usize {
        self.inner
            .read()
            .collections
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

fn field_str<'a>(fields: &'a Fields, field: &str) -> Option<&'a str> {
    fields.get(field).and_then(Value::as_str)
}

fn array_intersects(fields: &Fields, field: &str, candidates: &[String]) -> bool {
    fields
        .get(field)
        .and_then(Value::as_array)
        .is_some_and(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .any(|value| candidates.iter().any(|c| c == value))
        })
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query_by_token_membership(
        &self,
        collection: &str,
        field: &str,
        candidates: &[String],
        limit: usize,
    ) -> StoreResult<Vec<Document>> {
        if self.refuse_membership.load(Ordering::SeqCst) {
            return Err(StoreError::QueryUnsupported(
                "membership index unavailable".to_string(),
            ));
        }
        if candidates.len() > MEMBERSHIP_CANDIDATE_LIMIT {
            return Err(StoreError::QueryUnsupported(format!(
                "membership query limited to {MEMBERSHIP_CANDIDATE_LIMIT} candidates"
            )));
        }

        let inner = self.inner.read();
        let documents = inner
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| array_intersects(fields, field, candidates))
                    .take(limit)
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(documents)
    }

    async fn query_by_name_range(
        &self,
        collection: &str,
        field: &str,
        lower: &str,
        upper: &str,
        limit: usize,
    ) -> StoreResult<Vec<Document>> {
        let inner = self.inner.read();
        let mut documents: Vec<Document> = inner
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| {
                        field_str(fields, field).is_some_and(|v| v >= lower && v < upper)
                    })
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        documents.sort_by(|a, b| {
            field_str(&a.fields, field)
                .unwrap_or_default()
                .cmp(field_str(&b.fields, field).unwrap_or_default())
        });
        documents.truncate(limit);
        Ok(documents)
    }

    async fn query_by_exact_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        limit: usize,
    ) -> StoreResult<Vec<Document>> {
        let inner = self.inner.read();
        let documents = inner
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| fields.get(field) == Some(value))
                    .take(limit)
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(documents)
    }

    async fn create_document(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        let mut inner = self.inner.write();
        inner.next_id += 1;
        let id = format!("doc-{}", inner.next_id);
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let document = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| {
                StoreError::Backend(anyhow::anyhow!("no document {id} in {collection}"))
            })?;
        for (key, value) in fields {
            document.insert(key, value);
        }
        Ok(())
    }
}
