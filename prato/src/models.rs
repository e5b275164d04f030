//! Catalog data model and its document representation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::normalize;
use crate::store::{
    Document, FIELD_APPROVAL, FIELD_IMAGE_URL, FIELD_NAME, FIELD_NAME_QUERY, FIELD_TAGS,
    FIELD_TOKENS,
};

/// Moderation status of a dish. End-user search only surfaces
/// [`ApprovalState::Approved`]; ingestion and admin lookups may opt out of
/// the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalState {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalState {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalState::Pending => "pending",
            ApprovalState::Approved => "approved",
            ApprovalState::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ApprovalState::Pending),
            "approved" => Some(ApprovalState::Approved),
            "rejected" => Some(ApprovalState::Rejected),
            _ => None,
        }
    }
}

/// A named, searchable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub id: String,
    pub name: String,
    /// Accent-stripped lower-cased `name`; the store's range-scan sort key.
    pub name_query: String,
    /// Tokens derived from `name` at write time. Rewritten on every
    /// rename; staleness here silently loses recall, nothing enforces it
    /// store-side.
    pub tokens: Vec<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub approval: ApprovalState,
}

impl Dish {
    /// Read a dish out of a stored document.
    ///
    /// Legacy documents may lack the denormalized fields; those default
    /// (`name_query` is recomputed, missing `approval` reads as pending so
    /// the document stays invisible to end users). A document without a
    /// name is not a dish.
    pub fn from_document(document: &Document) -> Option<Self> {
        let name = document.fields.get(FIELD_NAME)?.as_str()?.to_string();

        let name_query = document
            .fields
            .get(FIELD_NAME_QUERY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| normalize(&name));

        let tokens = string_array(&document.fields, FIELD_TOKENS);
        let tags = string_array(&document.fields, FIELD_TAGS);

        let image_url = document
            .fields
            .get(FIELD_IMAGE_URL)
            .and_then(Value::as_str)
            .map(str::to_string);

        let approval = document
            .fields
            .get(FIELD_APPROVAL)
            .and_then(Value::as_str)
            .and_then(ApprovalState::parse)
            .unwrap_or(ApprovalState::Pending);

        Some(Dish {
            id: document.id.clone(),
            name,
            name_query,
            tokens,
            tags,
            image_url,
            approval,
        })
    }
}

fn string_array(fields: &crate::store::Fields, field: &str) -> Vec<String> {
    fields
        .get(field)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// A catalog match for one ingested item name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDish {
    pub id: String,
    pub name: String,
}

/// An end-user (or admin) search request.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub text: String,
    /// Every listed tag must be present on a dish for it to qualify.
    pub tags: Vec<String>,
    /// Admin and ingestion surfaces may look past the approval filter.
    pub include_all_states: bool,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn including_all_states(mut self) -> Self {
        self.include_all_states = true;
        self
    }
}
