//! End-to-end capture run: select jobs, orchestrate, write the report

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use super::orchestrator::{CaptureOrchestrator, OrchestratorConfig, ensure_fallback};
use super::report::{CaptureReport, ReportAccumulator};
use super::session::SessionFactory;
use super::PipelineError;
use crate::domain::capture::{CaptureJob, CaptureMode};
use crate::domain::entities::CatalogEntry;
use crate::infrastructure::artifact_store::{ArtifactStore, HeroState};
use crate::infrastructure::config::{CaptureConfig, PathsConfig};
use crate::infrastructure::fallback_image::FallbackImageGenerator;

/// Build one job per selected entry, in catalog order.
///
/// The slug allow-list (case-insensitive) is applied before the `max_sites`
/// cap. Entries whose artifact is already cached still get a job so the
/// report counts them as `exists`.
pub fn select_jobs(
    entries: &[CatalogEntry],
    store: &ArtifactStore,
    capture: &CaptureConfig,
    mode: CaptureMode,
) -> Vec<CaptureJob> {
    let allow: Vec<String> =
        capture.include_slugs.iter().map(|s| s.trim().to_lowercase()).collect();
    let limit = capture.max_sites.unwrap_or(usize::MAX);

    entries
        .iter()
        .filter(|entry| allow.is_empty() || allow.contains(&entry.slug))
        .take(limit)
        .map(|entry| CaptureJob {
            entry: entry.clone(),
            target_path: store.target_path(&entry.slug, mode),
            timeout_ms: capture.timeout_ms,
            max_retries: capture.retries,
            mode,
        })
        .collect()
}

/// Outcome of a finished run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mode: CaptureMode,
    pub report_path: PathBuf,
    pub report: CaptureReport,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} capture: total {}, success {}, exists {}, error {} (report: {})",
            self.mode,
            self.report.total,
            self.report.success,
            self.report.exists,
            self.report.error,
            self.report_path.display()
        )
    }
}

pub struct CapturePipeline {
    orchestrator: CaptureOrchestrator,
    capture: CaptureConfig,
    report_path: PathBuf,
    mode: CaptureMode,
}

impl CapturePipeline {
    pub fn new(
        sessions: Arc<dyn SessionFactory>,
        paths: &PathsConfig,
        capture: &CaptureConfig,
        mode: CaptureMode,
    ) -> Self {
        let store = ArtifactStore::from_config(paths, capture);
        let report_path = match mode {
            CaptureMode::Hero => paths.hero_report.clone(),
            CaptureMode::Full => paths.full_report.clone(),
        };
        let config = OrchestratorConfig::from_capture(capture);
        Self {
            orchestrator: CaptureOrchestrator::new(sessions, store, config),
            capture: capture.clone(),
            report_path,
            mode,
        }
    }

    /// Capture every selected entry and write the report.
    ///
    /// The report is written even when the run aborts, covering the jobs
    /// that finished.
    pub async fn run(&self, entries: &[CatalogEntry]) -> Result<RunSummary, PipelineError> {
        let jobs = select_jobs(entries, self.orchestrator.store(), &self.capture, self.mode);
        info!("🚀 Starting {} capture: {} jobs", self.mode, jobs.len());

        let accumulator = ReportAccumulator::new();
        let outcome = self.orchestrator.run(&jobs, self.capture.concurrency, &accumulator).await;
        let written = accumulator.write(&self.report_path).await;

        outcome?;
        let report = written?;
        let summary = RunSummary {
            mode: self.mode,
            report_path: self.report_path.clone(),
            report,
        };
        info!("✅ {}", summary);
        Ok(summary)
    }
}

/// Offline pass: write a fallback for every entry without a usable hero.
///
/// Returns how many fallbacks were written.
pub async fn generate_missing_fallbacks(
    entries: &[CatalogEntry],
    store: &ArtifactStore,
) -> Result<usize, PipelineError> {
    let generator = FallbackImageGenerator::new();
    let mut written = 0;
    for entry in entries {
        if store.hero_state(&entry.slug) == HeroState::Present {
            continue;
        }
        if ensure_fallback(store, &generator, entry).await? {
            written += 1;
        }
    }
    info!("✅ Generated {} fallbacks", written);
    Ok(written)
}
