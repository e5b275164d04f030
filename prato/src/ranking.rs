//! Bucket ordering for verified search candidates.
//!
//! The store returns candidates in no useful order, so ranking happens
//! client-side. A lexicographic bucket tuple keeps the comparison total
//! and cheap: a higher bucket always wins, ties fall through to the next
//! bucket, and fully equal keys keep alphabetical order on the normalized
//! name.

use crate::models::Dish;
use crate::normalize::normalize;

/// Hard ceiling on results handed back to any caller.
pub const MAX_RESULTS: usize = 30;

/// Whether display surfaces pull photo-bearing dishes ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankProfile {
    /// Pure text relevance.
    #[default]
    Relevance,
    /// Dishes with an image first, then text relevance.
    PhotosFirst,
}

/// Bucket tuple — derived Ord gives lexicographic comparison.
/// All components: higher = better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey {
    has_image: bool,
    match_tier: u8,
}

/// 3 = exact, 2 = whole-name prefix, 1 = some word starts with the query,
/// 0 = plain containment.
fn match_tier(normalized_name: &str, normalized_query: &str) -> u8 {
    if normalized_name == normalized_query {
        3
    } else if normalized_name.starts_with(normalized_query) {
        2
    } else if normalized_name
        .split_whitespace()
        .any(|word| word.starts_with(normalized_query))
    {
        1
    } else {
        0
    }
}

fn rank_key(dish: &Dish, normalized_name: &str, normalized_query: &str, profile: RankProfile) -> RankKey {
    let has_image = match profile {
        RankProfile::Relevance => false,
        RankProfile::PhotosFirst => dish.image_url.as_deref().is_some_and(|url| !url.is_empty()),
    };
    RankKey {
        has_image,
        match_tier: match_tier(normalized_name, normalized_query),
    }
}

/// Order `dishes` by match quality against `normalized_query`, best first,
/// alphabetical within a bucket, capped at `max_results`. The sort is
/// stable, so equal keys keep their incoming order.
pub fn rank(
    dishes: Vec<Dish>,
    normalized_query: &str,
    profile: RankProfile,
    max_results: usize,
) -> Vec<Dish> {
    let mut keyed: Vec<(RankKey, String, Dish)> = dishes
        .into_iter()
        .map(|dish| {
            let normalized_name = normalize(&dish.name);
            let key = rank_key(&dish, &normalized_name, normalized_query, profile);
            (key, normalized_name, dish)
        })
        .collect();

    keyed.sort_by(|(key_a, name_a, _), (key_b, name_b, _)| {
        key_b.cmp(key_a).then_with(|| name_a.cmp(name_b))
    });

    keyed.truncate(max_results);
    keyed.into_iter().map(|(_, _, dish)| dish).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApprovalState;

    fn dish(name: &str) -> Dish {
        Dish {
            id: format!("id-{name}"),
            name: name.to_string(),
            name_query: normalize(name),
            tokens: Vec::new(),
            tags: Vec::new(),
            image_url: None,
            approval: ApprovalState::Approved,
        }
    }

    fn dish_with_image(name: &str) -> Dish {
        Dish {
            image_url: Some("https://cdn.example/photo.jpg".to_string()),
            ..dish(name)
        }
    }

    fn names(dishes: &[Dish]) -> Vec<&str> {
        dishes.iter().map(|d| d.name.as_str()).collect()
    }

    // ── tier ordering ────────────────────────────────────────────

    #[test]
    fn prefix_matches_sort_alphabetically() {
        let ranked = rank(
            vec![
                dish("Arrozes Variados"),
                dish("Arroz de Pato"),
                dish("Arroz de Frango"),
            ],
            "arroz",
            RankProfile::Relevance,
            MAX_RESULTS,
        );
        assert_eq!(
            names(&ranked),
            vec!["Arroz de Frango", "Arroz de Pato", "Arrozes Variados"]
        );
    }

    #[test]
    fn exact_match_sorts_first() {
        let ranked = rank(
            vec![
                dish("Arroz de Frango"),
                dish("Arroz"),
                dish("Arrozes Variados"),
            ],
            "arroz",
            RankProfile::Relevance,
            MAX_RESULTS,
        );
        assert_eq!(ranked[0].name, "Arroz");
    }

    #[test]
    fn word_prefix_beats_plain_containment() {
        // "zarroz" contains the query mid-word only.
        let ranked = rank(
            vec![dish("Caldo Zarroz"), dish("Bife com Arroz")],
            "arroz",
            RankProfile::Relevance,
            MAX_RESULTS,
        );
        assert_eq!(
            names(&ranked),
            vec!["Bife com Arroz", "Caldo Zarroz"]
        );
    }

    #[test]
    fn accent_differences_do_not_break_ties() {
        // Tie-break compares normalized names, so accents don't reorder.
        let ranked = rank(
            vec![dish("Arroz à Valenciana"), dish("Arroz de Pato")],
            "arroz",
            RankProfile::Relevance,
            MAX_RESULTS,
        );
        assert_eq!(
            names(&ranked),
            vec!["Arroz à Valenciana", "Arroz de Pato"]
        );
    }

    // ── image bucket ─────────────────────────────────────────────

    #[test]
    fn photos_first_pulls_image_dishes_ahead() {
        let ranked = rank(
            vec![dish("Arroz de Frango"), dish_with_image("Arroz de Pato")],
            "arroz",
            RankProfile::PhotosFirst,
            MAX_RESULTS,
        );
        assert_eq!(ranked[0].name, "Arroz de Pato");
    }

    #[test]
    fn relevance_profile_ignores_images() {
        let ranked = rank(
            vec![dish_with_image("Arroz de Pato"), dish("Arroz de Frango")],
            "arroz",
            RankProfile::Relevance,
            MAX_RESULTS,
        );
        assert_eq!(ranked[0].name, "Arroz de Frango");
    }

    #[test]
    fn empty_image_url_counts_as_no_image() {
        let mut with_empty = dish("Arroz de Pato");
        with_empty.image_url = Some(String::new());
        let ranked = rank(
            vec![with_empty, dish("Arroz de Frango")],
            "arroz",
            RankProfile::PhotosFirst,
            MAX_RESULTS,
        );
        assert_eq!(ranked[0].name, "Arroz de Frango");
    }

    // ── bounds ───────────────────────────────────────────────────

    #[test]
    fn never_returns_more_than_the_cap() {
        let dishes: Vec<Dish> = (0..50).map(|i| dish(&format!("Arroz {i:02}"))).collect();
        let ranked = rank(dishes, "arroz", RankProfile::Relevance, MAX_RESULTS);
        assert_eq!(ranked.len(), MAX_RESULTS);
    }
}
