//! TTL-bounded snapshot of approved dishes for entity resolution.
//!
//! One snapshot per process, rebuilt wholesale from the store when its
//! validity window lapses; there is no partial invalidation. Concurrent
//! callers racing past an expired window may each rebuild — rebuilds are
//! idempotent and the last writer's reference wins, so readers always see
//! a complete snapshot, never a torn one.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::models::ApprovalState;
use crate::normalize::normalize;
use crate::store::{
    DocumentStore, StoreResult, DISHES_COLLECTION, FIELD_APPROVAL, FIELD_NAME, FIELD_NAME_QUERY,
};

/// Upper bound for the snapshot fetch, comfortably above the realistic
/// catalog size.
const SNAPSHOT_FETCH_LIMIT: usize = 5_000;

/// One approved dish as the resolver sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedDish {
    pub id: String,
    pub name: String,
    pub name_query: String,
}

/// Shared, immutable view of the approved catalog, keyed by dish id.
pub type Snapshot = Arc<HashMap<String, CachedDish>>;

/// Injectable time source; production uses [`SystemClock`].
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct BuiltSnapshot {
    entries: Snapshot,
    built_at: DateTime<Utc>,
}

pub struct ResolutionCache {
    state: RwLock<Option<BuiltSnapshot>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResolutionCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(None),
            ttl,
            clock,
        }
    }

    /// Current snapshot, rebuilding from the store first if the validity
    /// window lapsed.
    pub async fn snapshot(&self, store: &dyn DocumentStore) -> StoreResult<Snapshot> {
        {
            let state = self.state.read();
            if let Some(built) = state.as_ref() {
                if self.clock.now() - built.built_at < self.ttl {
                    return Ok(Arc::clone(&built.entries));
                }
            }
        }

        let entries = Arc::new(fetch_approved(store).await?);
        debug!(entries = entries.len(), "rebuilt resolution cache snapshot");
        let built_at = self.clock.now();
        *self.state.write() = Some(BuiltSnapshot {
            entries: Arc::clone(&entries),
            built_at,
        });
        Ok(entries)
    }

    /// Drop the snapshot wholesale; the next call rebuilds.
    pub fn invalidate(&self) {
        *self.state.write() = None;
    }
}

async fn fetch_approved(store: &dyn DocumentStore) -> StoreResult<HashMap<String, CachedDish>> {
    let approved = Value::String(ApprovalState::Approved.as_str().to_string());
    let documents = store
        .query_by_exact_field(
            DISHES_COLLECTION,
            FIELD_APPROVAL,
            &approved,
            SNAPSHOT_FETCH_LIMIT,
        )
        .await?;

    let mut entries = HashMap::with_capacity(documents.len());
    for document in documents {
        let Some(name) = document.fields.get(FIELD_NAME).and_then(Value::as_str) else {
            continue;
        };
        let name_query = document
            .fields
            .get(FIELD_NAME_QUERY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| normalize(name));
        entries.insert(
            document.id.clone(),
            CachedDish {
                id: document.id.clone(),
                name: name.to_string(),
                name_query,
            },
        );
    }
    Ok(entries)
}
