//! # Capture Module
//!
//! Drives headless browser sessions to produce preview artifacts.
//! - `session`: the browser seam (traits only)
//! - `url_variants`: navigation candidates for a hand-entered URL
//! - `orchestrator`: batches, retries and artifact writing
//! - `report`: per-run outcome accumulation
//! - `pipeline`: job selection and the end-to-end run

use std::path::PathBuf;

use thiserror::Error;

use crate::infrastructure::image_processing::ImageError;

pub mod orchestrator;
pub mod pipeline;
pub mod report;
pub mod session;
pub mod url_variants;

pub use orchestrator::{CaptureOrchestrator, OrchestratorConfig};
pub use pipeline::{CapturePipeline, RunSummary, generate_missing_fallbacks, select_jobs};
pub use report::{CaptureReport, ReportAccumulator};
pub use session::{BrowserSession, SessionFactory};
pub use url_variants::url_variants;

/// Failure of one capture attempt. Contained to its job.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to open browser session: {0}")]
    Session(String),

    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("page script failed: {0}")]
    Script(String),

    #[error("screenshot failed: {0}")]
    Screenshot(String),

    #[error(transparent)]
    PostProcess(#[from] ImageError),
}

/// Failures that abort the whole run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to write artifact {path:?}: {source}")]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to generate fallback for {slug}: {source}")]
    Fallback {
        slug: String,
        #[source]
        source: ImageError,
    },

    #[error("failed to write report {path:?}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
