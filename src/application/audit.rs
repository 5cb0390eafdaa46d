//! Read-only coverage report over the artifact cache

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::category::MacroCategory;
use crate::domain::entities::{CatalogEntry, UrlState};
use crate::infrastructure::artifact_store::{ArtifactStore, HeroState};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeroCoverage {
    pub present: usize,
    pub degenerate: usize,
    /// No usable hero, but a fallback exists
    pub fallback_only: usize,
    /// Neither a usable hero nor a fallback
    pub missing: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogAudit {
    pub total: usize,
    pub visible: usize,
    pub hidden: usize,
    pub unresolvable: usize,
    pub excluded: usize,
    pub hero: HeroCoverage,
    pub full_page_present: usize,
    pub by_category: BTreeMap<MacroCategory, usize>,
    /// Heroes below the byte floor, left on disk for manual cleanup
    pub degenerate_heroes: Vec<String>,
    pub missing_previews: Vec<String>,
}

impl CatalogAudit {
    pub fn run(entries: &[CatalogEntry], store: &ArtifactStore) -> Self {
        let mut audit = Self {
            total: entries.len(),
            ..Self::default()
        };

        for entry in entries {
            if entry.hidden {
                audit.hidden += 1;
            } else {
                audit.visible += 1;
            }
            match entry.url_state {
                UrlState::Resolved => {}
                UrlState::Unresolvable => audit.unresolvable += 1,
                UrlState::Excluded => audit.excluded += 1,
            }
            *audit.by_category.entry(entry.macro_category).or_default() += 1;

            let state = store.hero_state(&entry.slug);
            match state {
                HeroState::Present => audit.hero.present += 1,
                HeroState::Degenerate => {
                    audit.hero.degenerate += 1;
                    audit.degenerate_heroes.push(entry.slug.clone());
                }
                HeroState::Missing => {}
            }
            if state != HeroState::Present {
                if store.has_fallback(&entry.slug) {
                    audit.hero.fallback_only += 1;
                } else {
                    audit.hero.missing += 1;
                    audit.missing_previews.push(entry.slug.clone());
                }
            }

            if store.has_usable_full(&entry.slug) {
                audit.full_page_present += 1;
            }
        }

        audit
    }

    /// Share of entries with a usable hero, in percent
    pub fn hero_coverage_percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.hero.present as f64 * 100.0 / self.total as f64
    }
}
