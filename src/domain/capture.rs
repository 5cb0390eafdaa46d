//! Capture jobs and their outcomes

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::entities::CatalogEntry;

/// Which artifact a capture produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Fixed viewport clip at the top of the page
    #[default]
    Hero,
    /// Entire scrollable page, height-clamped afterwards
    Full,
}

impl CaptureMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hero" => Ok(Self::Hero),
            "full" | "fullpage" | "full-page" => Ok(Self::Full),
            other => Err(format!("unknown capture mode: {other}")),
        }
    }
}

/// Unit of work for the orchestrator. Consumed once.
#[derive(Debug, Clone)]
pub struct CaptureJob {
    pub entry: CatalogEntry,
    pub target_path: PathBuf,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub mode: CaptureMode,
}

impl CaptureJob {
    pub fn slug(&self) -> &str {
        &self.entry.slug
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureStatus {
    /// Artifact was already cached; no session opened
    Exists,
    /// A new artifact was written
    Success,
    /// No artifact written; a fallback stands in
    Error,
}

/// Immutable outcome of one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureResult {
    pub slug: String,
    pub status: CaptureStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl CaptureResult {
    pub fn exists(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            status: CaptureStatus::Exists,
            error: None,
        }
    }

    pub fn success(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            status: CaptureStatus::Success,
            error: None,
        }
    }

    pub fn error(slug: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            status: CaptureStatus::Error,
            error: Some(detail.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_aliases() {
        assert_eq!("HERO".parse::<CaptureMode>(), Ok(CaptureMode::Hero));
        assert_eq!("full-page".parse::<CaptureMode>(), Ok(CaptureMode::Full));
        assert!("thumbnail".parse::<CaptureMode>().is_err());
    }

    #[test]
    fn result_omits_empty_error_field() {
        let ok = serde_json::to_value(CaptureResult::success("acme")).unwrap();
        assert_eq!(ok, serde_json::json!({"slug": "acme", "status": "success"}));

        let failed = serde_json::to_value(CaptureResult::error("acme", "timeout")).unwrap();
        assert_eq!(failed["status"], "error");
        assert_eq!(failed["error"], "timeout");
    }
}
