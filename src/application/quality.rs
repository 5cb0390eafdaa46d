//! Completeness scoring and display ordering
//!
//! Scores are derived from on-disk artifacts and field lengths at read time and
//! are never persisted.

use std::cmp::Reverse;

use crate::domain::constants::score;
use crate::domain::entities::{CatalogEntry, UrlState};
use crate::infrastructure::artifact_store::{ArtifactStore, HeroState};

/// Scores entries against one artifact cache
#[derive(Debug, Clone)]
pub struct QualityScorer {
    store: ArtifactStore,
}

impl QualityScorer {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    /// Non-negative completeness score. Never decreases as artifacts appear.
    pub fn score(&self, entry: &CatalogEntry) -> i32 {
        let mut total = 0;
        if self.store.has_usable_full(&entry.slug) {
            total += score::FULL_ARTIFACT;
        }
        if self.store.hero_state(&entry.slug) == HeroState::Present {
            total += score::HERO_ARTIFACT;
        }
        if entry.url_state != UrlState::Unresolvable {
            total += score::ABSOLUTE_URL;
        }
        if entry.description.chars().count() > score::DESCRIPTION_MIN_LEN {
            total += score::DESCRIPTION;
        }
        if entry.name.chars().count() > score::NAME_MIN_LEN {
            total += score::NAME;
        }
        total
    }
}

/// How entries with equal featured flag and name are ordered
#[derive(Debug, Clone, Copy)]
pub enum Tiebreak<'a> {
    /// Keep input order
    InputOrder,
    /// Higher score first, then input order
    Score(&'a QualityScorer),
}

/// Stable sort: featured first, then name (case-insensitive), then tiebreak
pub fn sort_catalog(entries: &mut [CatalogEntry], tiebreak: Tiebreak<'_>) {
    match tiebreak {
        Tiebreak::InputOrder => {
            entries.sort_by_cached_key(|e| (Reverse(e.featured), e.name.to_lowercase()));
        }
        Tiebreak::Score(scorer) => {
            entries.sort_by_cached_key(|e| {
                (Reverse(e.featured), e.name.to_lowercase(), Reverse(scorer.score(e)))
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::catalog_loader::CatalogLoader;
    use crate::domain::entities::RawRow;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn entries(rows: &[(&str, &str, bool)]) -> Vec<CatalogEntry> {
        let rows: Vec<RawRow> = rows
            .iter()
            .map(|(name, url, featured)| {
                let featured = if *featured { "true" } else { "false" };
                RawRow::from_fields([*name, *url, "", "", featured, ""])
            })
            .collect();
        CatalogLoader::default().load(&rows).0
    }

    #[test]
    fn featured_first_then_alphabetical() {
        let mut list = entries(&[
            ("zeta", "https://zeta.io", false),
            ("Alpha", "https://alpha.io", false),
            ("Mango", "https://mango.io", true),
            ("beta", "https://beta.io", false),
        ]);
        sort_catalog(&mut list, Tiebreak::InputOrder);
        let names: Vec<_> = list.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Mango", "Alpha", "beta", "zeta"]);
    }

    #[tokio::test]
    async fn score_grows_with_artifacts_and_breaks_ties() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("hero"), dir.path().join("full"), 10);
        let scorer = QualityScorer::new(store.clone());

        let mut list = entries(&[("Same", "https://one.io", false)]);
        let mut twin = list[0].clone();
        twin.slug = "same-2".to_string();
        twin.row = 1;
        list.push(twin);

        let base = scorer.score(&list[1]);
        assert_eq!(base, score::ABSOLUTE_URL + score::NAME);

        ArtifactStore::write_artifact(&store.hero_path("same-2"), &[0u8; 5]).await.unwrap();
        assert_eq!(scorer.score(&list[1]), base, "degenerate hero earns nothing");

        ArtifactStore::write_artifact(&store.hero_path("same-2"), &[0u8; 50]).await.unwrap();
        let with_hero = scorer.score(&list[1]);
        assert_eq!(with_hero, base + score::HERO_ARTIFACT);

        ArtifactStore::write_artifact(&store.full_path("same-2"), &[0u8; 50]).await.unwrap();
        assert_eq!(scorer.score(&list[1]), with_hero + score::FULL_ARTIFACT);

        sort_catalog(&mut list, Tiebreak::InputOrder);
        assert_eq!(list[0].slug, "same");
        sort_catalog(&mut list, Tiebreak::Score(&scorer));
        assert_eq!(list[0].slug, "same-2");
    }

    proptest! {
        #[test]
        fn sort_is_stable_for_equal_keys(flags in proptest::collection::vec(any::<bool>(), 0..24)) {
            let mut list: Vec<CatalogEntry> = Vec::new();
            let template = entries(&[("Dup", "https://dup.io", false)]).remove(0);
            for (i, featured) in flags.iter().enumerate() {
                let mut entry = template.clone();
                entry.row = i;
                entry.featured = *featured;
                list.push(entry);
            }

            sort_catalog(&mut list, Tiebreak::InputOrder);

            let featured_rows: Vec<usize> =
                list.iter().filter(|e| e.featured).map(|e| e.row).collect();
            let other_rows: Vec<usize> =
                list.iter().filter(|e| !e.featured).map(|e| e.row).collect();
            prop_assert!(featured_rows.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(other_rows.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(list.iter().take(featured_rows.len()).all(|e| e.featured));
        }
    }
}
