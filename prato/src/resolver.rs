//! Entity resolution for bulk menu ingestion.
//!
//! Ingestion receives free-text item names scraped from weekly menus and
//! must decide, per item, whether a name refers to an already-known dish
//! or a new one. Matching runs against the TTL-cached snapshot of the
//! approved catalog: an exact normalized pass first, then a two-way
//! substring pass. Unlike search, failures here are loud — a half-linked
//! menu batch is worse than a failed one.

use std::sync::Arc;

use tracing::warn;

use crate::cache::{Clock, ResolutionCache, SystemClock};
use crate::catalog::{Catalog, CatalogError};
use crate::models::{ApprovalState, ResolvedDish};
use crate::normalize::normalize;

/// Outcome for one ingested item name.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedItem {
    pub id: String,
    /// Canonical catalog name, which may differ from the ingested text.
    pub name: String,
    pub created: bool,
}

/// Batch summary handed back to the menu-upload caller. `items` is
/// index-aligned with the input; unnameable items come back as `None`.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub items: Vec<Option<LinkedItem>>,
    pub linked: usize,
    pub created: usize,
    pub skipped: usize,
}

pub struct MenuLinker {
    catalog: Arc<Catalog>,
    cache: ResolutionCache,
}

impl MenuLinker {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_clock(catalog, Arc::new(SystemClock))
    }

    pub fn with_clock(catalog: Arc<Catalog>, clock: Arc<dyn Clock>) -> Self {
        let cache = ResolutionCache::with_clock(catalog.config().cache_ttl, clock);
        Self { catalog, cache }
    }

    /// Match one free-text name against the approved catalog.
    ///
    /// Exact normalized equality wins over any substring candidate. The
    /// substring pass accepts containment in either direction and takes
    /// the first hit in snapshot iteration order — *a* plausible match,
    /// not necessarily the best one.
    pub async fn resolve(&self, free_text: &str) -> Result<Option<ResolvedDish>, CatalogError> {
        let needle = normalize(free_text);
        if needle.is_empty() {
            return Ok(None);
        }

        let snapshot = self.cache.snapshot(self.catalog.store().as_ref()).await?;

        for entry in snapshot.values() {
            if entry.name_query == needle {
                return Ok(Some(ResolvedDish {
                    id: entry.id.clone(),
                    name: entry.name.clone(),
                }));
            }
        }

        for entry in snapshot.values() {
            if entry.name_query.contains(&needle) || needle.contains(&entry.name_query) {
                return Ok(Some(ResolvedDish {
                    id: entry.id.clone(),
                    name: entry.name.clone(),
                }));
            }
        }

        Ok(None)
    }

    /// Resolve, creating a new approved dish when nothing matches. The
    /// cache is discarded after a creation so the next resolution sees the
    /// new dish.
    pub async fn resolve_or_create(&self, free_text: &str) -> Result<LinkedItem, CatalogError> {
        if let Some(found) = self.resolve(free_text).await? {
            return Ok(LinkedItem {
                id: found.id,
                name: found.name,
                created: false,
            });
        }

        let dish = self
            .catalog
            .create_dish(free_text.trim(), Vec::new(), None, ApprovalState::Approved)
            .await?;
        self.cache.invalidate();
        Ok(LinkedItem {
            id: dish.id,
            name: dish.name,
            created: true,
        })
    }

    /// Link a whole ingestion batch, strictly in input order.
    ///
    /// Sequential on purpose: an item may match a dish created two lines
    /// above it, which only holds if creations land before later lookups.
    pub async fn link_items(&self, names: &[String]) -> Result<IngestReport, CatalogError> {
        let mut report = IngestReport::default();
        for name in names {
            if normalize(name).is_empty() {
                warn!(item = %name, "skipping menu item with unusable name");
                report.skipped += 1;
                report.items.push(None);
                continue;
            }

            let linked = self.resolve_or_create(name).await?;
            if linked.created {
                report.created += 1;
            } else {
                report.linked += 1;
            }
            report.items.push(Some(linked));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::SearchQuery;

    fn linker() -> (Arc<Catalog>, MenuLinker) {
        let catalog = Arc::new(Catalog::new(Arc::new(MemoryStore::new())));
        let linker = MenuLinker::new(Arc::clone(&catalog));
        (catalog, linker)
    }

    async fn seed(catalog: &Catalog, name: &str) -> String {
        catalog
            .create_dish(name, Vec::new(), None, ApprovalState::Approved)
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn exact_match_wins_over_substring_candidates() {
        let (catalog, linker) = linker();
        // The longer name contains the needle too; exact must win.
        seed(&catalog, "Bacalhau à Brás com Batata").await;
        let exact_id = seed(&catalog, "Bacalhau à Brás").await;

        let found = linker.resolve("bacalhau a bras").await.unwrap().unwrap();
        assert_eq!(found.id, exact_id);
        assert_eq!(found.name, "Bacalhau à Brás");
    }

    #[tokio::test]
    async fn substring_matches_in_either_direction() {
        let (catalog, linker) = linker();
        let id = seed(&catalog, "Sopa de Legumes").await;

        // Cached name contains the input.
        let found = linker.resolve("legumes").await.unwrap().unwrap();
        assert_eq!(found.id, id);

        // Input contains the cached name.
        let found = linker
            .resolve("Sopa de Legumes da Avó")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, id);
    }

    #[tokio::test]
    async fn unknown_and_empty_names_resolve_to_nothing() {
        let (_catalog, linker) = linker();
        assert!(linker.resolve("Cozido à Portuguesa").await.unwrap().is_none());
        assert!(linker.resolve("   ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn creation_is_visible_to_later_items_in_the_batch() {
        let (_catalog, linker) = linker();
        let names: Vec<String> = ["Sopa de Legumes", "Sopa de Legumes"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let report = linker.link_items(&names).await.unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.linked, 1);

        let first = report.items[0].as_ref().unwrap();
        let second = report.items[1].as_ref().unwrap();
        assert_eq!(first.id, second.id);
        assert!(first.created && !second.created);
    }

    #[tokio::test]
    async fn created_dishes_default_to_approved_with_search_fields() {
        let (catalog, linker) = linker();
        let linked = linker.resolve_or_create("Jardineira de Vaca").await.unwrap();
        assert!(linked.created);

        // Approved by default, so end-user search finds it immediately.
        let found = catalog.search(&SearchQuery::new("jardineira")).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, linked.id);
    }

    #[tokio::test]
    async fn batch_skips_unnameable_items() {
        let (_catalog, linker) = linker();
        let names: Vec<String> = ["", "Sopa de Legumes"].iter().map(|s| s.to_string()).collect();

        let report = linker.link_items(&names).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.created, 1);
        assert!(report.items[0].is_none());
        assert!(report.items[1].is_some());
    }
}
