//! Read-time catalog view
//!
//! Loads the catalog, drops hidden and unpublishable entries, sorts for display
//! and resolves each entry's preview from the artifact cache.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use super::catalog_loader::{CatalogError, CatalogLoader};
use super::quality::{QualityScorer, Tiebreak, sort_catalog};
use crate::domain::category::MacroCategory;
use crate::domain::entities::CatalogEntry;
use crate::infrastructure::artifact_store::{ArtifactStore, PreviewTier, ResolvedPreview};
use crate::infrastructure::fallback_image::FallbackImageGenerator;
use crate::infrastructure::image_processing::ImageError;

/// One visible card as rendered downstream
#[derive(Debug, Clone, Serialize)]
pub struct CatalogCard {
    pub slug: String,
    pub name: String,
    pub url: String,
    pub description: String,
    pub macro_category: MacroCategory,
    pub featured: bool,
    pub tier: PreviewTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_path: Option<PathBuf>,
    pub score: i32,
}

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("failed to read preview {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Synthesize(#[from] ImageError),
}

pub struct CatalogReader {
    loader: CatalogLoader,
    store: ArtifactStore,
    scorer: QualityScorer,
    generator: FallbackImageGenerator,
}

impl CatalogReader {
    pub fn new(loader: CatalogLoader, store: ArtifactStore) -> Self {
        Self {
            loader,
            scorer: QualityScorer::new(store.clone()),
            store,
            generator: FallbackImageGenerator::new(),
        }
    }

    pub fn scorer(&self) -> &QualityScorer {
        &self.scorer
    }

    /// Visible entries of `csv_path` in display order.
    ///
    /// Hidden entries are dropped, as is anything that fails
    /// [`CatalogEntry::is_showcase_ready`].
    pub fn visible_entries(
        &self,
        csv_path: &Path,
        score_tiebreak: bool,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let (entries, _) = self.loader.load_file(csv_path)?;
        let total = entries.len();
        let mut visible: Vec<CatalogEntry> = entries
            .into_iter()
            .filter(|e| !e.hidden && e.is_showcase_ready())
            .collect();
        debug!("Catalog view: {} of {} entries visible", visible.len(), total);

        let tiebreak = if score_tiebreak {
            Tiebreak::Score(&self.scorer)
        } else {
            Tiebreak::InputOrder
        };
        sort_catalog(&mut visible, tiebreak);
        Ok(visible)
    }

    /// Build the card list for already-sorted entries
    pub fn cards(&self, entries: &[CatalogEntry]) -> Vec<CatalogCard> {
        entries.iter().map(|entry| self.card(entry)).collect()
    }

    pub fn card(&self, entry: &CatalogEntry) -> CatalogCard {
        let ResolvedPreview { tier, path } = self.store.resolve_preview(&entry.slug);
        CatalogCard {
            slug: entry.slug.clone(),
            name: entry.name.clone(),
            url: entry.capture_url().unwrap_or(&entry.source_url).to_string(),
            description: entry.description.clone(),
            macro_category: entry.macro_category,
            featured: entry.featured,
            tier,
            preview_path: path,
            score: self.scorer.score(entry),
        }
    }

    /// Preview bytes for `entry`, synthesizing a fallback in memory when
    /// nothing usable is on disk. Nothing is written.
    pub async fn preview_bytes(&self, entry: &CatalogEntry) -> Result<Vec<u8>, PreviewError> {
        match self.store.resolve_preview(&entry.slug) {
            ResolvedPreview { path: Some(path), .. } => {
                fs::read(&path).await.map_err(|source| PreviewError::Read { path, source })
            }
            ResolvedPreview { path: None, .. } => {
                Ok(self.generator.generate(&entry.name, entry.macro_category.label())?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const CSV: &str = "name,url,category,description,featured,hidden\n\
        Zed,https://zed.dev,Code Editor,A fast editor for teams of humans,false,false\n\
        Acme,acme.io,SaaS Tool,desc,true,false\n\
        Secret,https://secret.io,,,false,true\n\
        Platform Link,https://land-book.com/websites/123,SaaS,,false,false\n\
        Vague,https://vague.io,Other,,false,false\n";

    fn fixture() -> (TempDir, CatalogReader, PathBuf) {
        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("websites.csv");
        std::fs::File::create(&csv).unwrap().write_all(CSV.as_bytes()).unwrap();
        let store = ArtifactStore::new(dir.path().join("hero"), dir.path().join("full"), 10);
        (dir, CatalogReader::new(CatalogLoader::default(), store), csv)
    }

    #[test]
    fn hides_and_sorts() {
        let (_dir, reader, csv) = fixture();
        let entries = reader.visible_entries(&csv, false).unwrap();
        let slugs: Vec<_> = entries.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["acme", "zed"]);
    }

    #[test]
    fn gallery_links_and_vague_categories_stay_out_of_view() {
        let (_dir, reader, csv) = fixture();
        let (all, _) = reader.loader.load_file(&csv).unwrap();
        assert_eq!(all.len(), 5);

        let visible = reader.visible_entries(&csv, true).unwrap();
        assert!(visible.iter().all(|e| e.slug != "platform-link" && e.slug != "vague"));
        assert_eq!(visible.len(), 2);
    }

    #[tokio::test]
    async fn cards_follow_preview_tiers() {
        let (_dir, reader, csv) = fixture();
        let entries = reader.visible_entries(&csv, true).unwrap();

        let cards = reader.cards(&entries);
        assert!(cards.iter().all(|c| c.tier == PreviewTier::Synthesized));
        assert_eq!(cards[0].url, "https://acme.io/");

        let store = &reader.store;
        ArtifactStore::write_artifact(&store.fallback_path("acme"), &[1u8; 4]).await.unwrap();
        ArtifactStore::write_artifact(&store.hero_path("zed"), &[1u8; 64]).await.unwrap();

        let cards = reader.cards(&entries);
        assert_eq!(cards[0].tier, PreviewTier::Fallback);
        assert_eq!(cards[1].tier, PreviewTier::Hero);
        assert_eq!(reader.preview_bytes(&entries[1]).await.unwrap(), vec![1u8; 64]);
    }

    #[tokio::test]
    async fn synthesized_preview_is_a_decodable_image() {
        let (_dir, reader, csv) = fixture();
        let entries = reader.visible_entries(&csv, false).unwrap();
        let bytes = reader.preview_bytes(&entries[0]).await.unwrap();
        assert!(image::load_from_memory(&bytes).is_ok());
        assert!(!reader.store.has_fallback("acme"), "nothing written");
    }
}
