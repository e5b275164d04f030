//! prato — search and matching engine for a canteen menu catalog.
//!
//! The backing document store only answers exact-value, short-membership,
//! and ordered-range queries; everything resembling text search is built
//! on top of that: write-time token expansion ([`tokenizer`]), a
//! recall-oriented membership fetch with client-side verification and
//! ranking ([`search`], [`ranking`]), and a cached entity-resolution pass
//! used by bulk menu ingestion ([`resolver`]).
//!
//! [`catalog::Catalog`] is the main entry point; [`resolver::MenuLinker`]
//! sits on top of it for ingestion.

pub mod cache;
pub mod catalog;
pub mod memory;
pub mod models;
pub mod normalize;
pub mod ranking;
pub mod resolver;
pub mod search;
pub mod store;
pub mod tokenizer;

pub use cache::{CachedDish, Clock, ResolutionCache, SystemClock};
pub use catalog::{Catalog, CatalogError, EngineConfig};
pub use memory::MemoryStore;
pub use models::{ApprovalState, Dish, ResolvedDish, SearchQuery};
pub use ranking::RankProfile;
pub use resolver::{IngestReport, LinkedItem, MenuLinker};
pub use search::SearchPath;
pub use store::{Document, DocumentStore, Fields, StoreError, StoreResult};
