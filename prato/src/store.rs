//! Document-store boundary.
//!
//! The engine talks to a remote, schemaless document database that can
//! filter on exact field values, test whether an array field intersects a
//! short candidate list, and scan ordered ranges. It cannot do substring
//! or full-text matching; [`crate::tokenizer`] exists to compensate at
//! write time. Everything the engine needs from the store fits in the
//! five operations of [`DocumentStore`].

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Collection holding one document per catalog dish.
pub const DISHES_COLLECTION: &str = "dishes";

pub const FIELD_NAME: &str = "name";
/// Accent-stripped lower-cased name; sort key for the range fallback.
pub const FIELD_NAME_QUERY: &str = "nameQuery";
/// Denormalized token array written by the catalog on every name change.
pub const FIELD_TOKENS: &str = "tokens";
pub const FIELD_TAGS: &str = "tags";
pub const FIELD_IMAGE_URL: &str = "imageUrl";
pub const FIELD_APPROVAL: &str = "approval";

/// The store rejects membership queries with more than this many candidate
/// values. A protocol ceiling of the backing database, not a tuning knob.
pub const MEMBERSHIP_CANDIDATE_LIMIT: usize = 10;

/// High code point closing a prefix range: `[q, q + SENTINEL)` covers every
/// indexed string that starts with `q`.
pub const RANGE_END_SENTINEL: char = '\u{f8ff}';

/// Schemaless field map, as the store sees it.
pub type Fields = Map<String, Value>;

/// A stored document: opaque store-assigned id plus its field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

#[derive(Error, Debug)]
pub enum StoreError {
    /// The store cannot answer this query shape: missing index, absent
    /// denormalized field on legacy documents, unsupported operator.
    #[error("query unsupported by store: {0}")]
    QueryUnsupported(String),
    /// Transport-level failure raised by the store client.
    #[error("store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Minimal query surface of the backing document database.
///
/// Implementations own their own timeouts and retries; the engine surfaces
/// whatever error the client raises.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents whose array `field` intersects `candidates`. The store
    /// enforces [`MEMBERSHIP_CANDIDATE_LIMIT`] on the candidate list.
    async fn query_by_token_membership(
        &self,
        collection: &str,
        field: &str,
        candidates: &[String],
        limit: usize,
    ) -> StoreResult<Vec<Document>>;

    /// Documents with `lower <= field < upper`, ordered by `field`.
    async fn query_by_name_range(
        &self,
        collection: &str,
        field: &str,
        lower: &str,
        upper: &str,
        limit: usize,
    ) -> StoreResult<Vec<Document>>;

    /// Documents where `field` equals `value` exactly.
    async fn query_by_exact_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        limit: usize,
    ) -> StoreResult<Vec<Document>>;

    /// Create a document; the store assigns and returns its id.
    async fn create_document(&self, collection: &str, fields: Fields) -> StoreResult<String>;

    /// Merge `fields` into an existing document.
    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()>;
}
