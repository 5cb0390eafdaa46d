//! Slug-addressed artifact cache on disk
//!
//! Layout:
//! - `{hero_dir}/{slug}.jpg`
//! - `{hero_dir}/fallbacks/{slug}.jpg`
//! - `{full_dir}/{slug}.jpg`
//!
//! The cache assumes a single writer. Files are written to a temporary name and
//! renamed into place so readers never see a partial artifact.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::domain::capture::CaptureMode;
use crate::domain::constants::artifact::{EXTENSION, FALLBACK_SUBDIR};
use crate::infrastructure::config::{CaptureConfig, PathsConfig};

/// State of the hero artifact for one slug
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeroState {
    Present,
    /// On disk but below the byte floor
    Degenerate,
    Missing,
}

/// Which tier a reader resolved a preview from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewTier {
    Hero,
    Fallback,
    /// Nothing on disk; the caller must synthesize one
    Synthesized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPreview {
    pub tier: PreviewTier,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    hero_dir: PathBuf,
    full_dir: PathBuf,
    min_bytes: u64,
}

impl ArtifactStore {
    pub fn new(hero_dir: impl Into<PathBuf>, full_dir: impl Into<PathBuf>, min_bytes: u64) -> Self {
        Self {
            hero_dir: hero_dir.into(),
            full_dir: full_dir.into(),
            min_bytes,
        }
    }

    pub fn from_config(paths: &PathsConfig, capture: &CaptureConfig) -> Self {
        Self::new(&paths.hero_dir, &paths.full_dir, capture.min_artifact_bytes)
    }

    pub fn min_bytes(&self) -> u64 {
        self.min_bytes
    }

    pub fn hero_path(&self, slug: &str) -> PathBuf {
        self.hero_dir.join(file_name(slug))
    }

    pub fn full_path(&self, slug: &str) -> PathBuf {
        self.full_dir.join(file_name(slug))
    }

    pub fn fallback_path(&self, slug: &str) -> PathBuf {
        self.hero_dir.join(FALLBACK_SUBDIR).join(file_name(slug))
    }

    /// Artifact a capture job in `mode` writes
    pub fn target_path(&self, slug: &str, mode: CaptureMode) -> PathBuf {
        match mode {
            CaptureMode::Hero => self.hero_path(slug),
            CaptureMode::Full => self.full_path(slug),
        }
    }

    /// Size of a regular file, `None` when absent
    pub fn artifact_size(path: &Path) -> Option<u64> {
        std::fs::metadata(path).ok().filter(|m| m.is_file()).map(|m| m.len())
    }

    /// Present and at or above the byte floor
    pub fn is_usable(&self, path: &Path) -> bool {
        Self::artifact_size(path).is_some_and(|size| size >= self.min_bytes)
    }

    pub fn hero_state(&self, slug: &str) -> HeroState {
        match Self::artifact_size(&self.hero_path(slug)) {
            Some(size) if size >= self.min_bytes => HeroState::Present,
            Some(_) => HeroState::Degenerate,
            None => HeroState::Missing,
        }
    }

    pub fn has_usable_full(&self, slug: &str) -> bool {
        self.is_usable(&self.full_path(slug))
    }

    pub fn has_fallback(&self, slug: &str) -> bool {
        Self::artifact_size(&self.fallback_path(slug)).is_some()
    }

    /// Read-time preview resolution: hero, then fallback, then synthesize.
    ///
    /// A degenerate hero is skipped in favor of the fallback but stays on disk.
    pub fn resolve_preview(&self, slug: &str) -> ResolvedPreview {
        if self.hero_state(slug) == HeroState::Present {
            return ResolvedPreview {
                tier: PreviewTier::Hero,
                path: Some(self.hero_path(slug)),
            };
        }
        if self.has_fallback(slug) {
            return ResolvedPreview {
                tier: PreviewTier::Fallback,
                path: Some(self.fallback_path(slug)),
            };
        }
        ResolvedPreview {
            tier: PreviewTier::Synthesized,
            path: None,
        }
    }

    /// Write an artifact, creating parent directories
    pub async fn write_artifact(path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension(format!("{EXTENSION}.part"));
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, path).await
    }
}

fn file_name(slug: &str) -> String {
    format!("{slug}.{EXTENSION}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ArtifactStore {
        ArtifactStore::new(dir.path().join("hero"), dir.path().join("full"), 100)
    }

    #[test]
    fn paths_follow_the_layout() {
        let store = ArtifactStore::new("/h", "/f", 1);
        assert_eq!(store.hero_path("acme"), PathBuf::from("/h/acme.jpg"));
        assert_eq!(store.fallback_path("acme"), PathBuf::from("/h/fallbacks/acme.jpg"));
        assert_eq!(store.full_path("acme"), PathBuf::from("/f/acme.jpg"));
        assert_eq!(store.target_path("acme", CaptureMode::Full), store.full_path("acme"));
    }

    #[tokio::test]
    async fn degenerate_hero_loses_to_fallback_but_stays() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert_eq!(store.resolve_preview("acme").tier, PreviewTier::Synthesized);

        ArtifactStore::write_artifact(&store.hero_path("acme"), &[0u8; 10]).await.unwrap();
        assert_eq!(store.hero_state("acme"), HeroState::Degenerate);

        ArtifactStore::write_artifact(&store.fallback_path("acme"), &[1u8; 10]).await.unwrap();
        let resolved = store.resolve_preview("acme");
        assert_eq!(resolved.tier, PreviewTier::Fallback);
        assert_eq!(resolved.path, Some(store.fallback_path("acme")));
        assert!(store.hero_path("acme").exists());

        ArtifactStore::write_artifact(&store.hero_path("acme"), &[0u8; 200]).await.unwrap();
        assert_eq!(store.resolve_preview("acme").tier, PreviewTier::Hero);
    }

    #[tokio::test]
    async fn write_leaves_no_temporary_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let path = store.full_path("acme");
        ArtifactStore::write_artifact(&path, b"bytes").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("acme.jpg")]);
    }
}
