//! # Capture Orchestrator
//!
//! Runs capture jobs in fixed-size batches. Each job gets its own browser
//! session, a bounded retry loop across URL variants and a guaranteed close.
//! Job failures become `Error` results with a fallback on disk; only
//! filesystem and fallback failures abort the run.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::report::ReportAccumulator;
use super::session::{BrowserSession, SessionFactory};
use super::url_variants::{url_variants, variant_for_attempt};
use super::{CaptureError, PipelineError};
use crate::domain::capture::{CaptureJob, CaptureMode, CaptureResult};
use crate::domain::constants::viewport::{HERO_HEIGHT, WIDTH};
use crate::domain::entities::{CatalogEntry, UrlState, resolve_url};
use crate::infrastructure::artifact_store::ArtifactStore;
use crate::infrastructure::config::CaptureConfig;
use crate::infrastructure::fallback_image::FallbackImageGenerator;
use crate::infrastructure::image_processing::{ImagePostProcessor, ProcessOptions};

/// Timing and post-processing knobs shared by every job in a run
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Pause between overlay removal and capture
    pub settle_delay: Duration,

    /// Wait after failed attempt `i` is `backoff_base * (i + 1)`
    pub backoff_base: Duration,

    /// Full-page height cap
    pub max_height: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from_capture(&CaptureConfig::default())
    }
}

impl OrchestratorConfig {
    pub fn from_capture(capture: &CaptureConfig) -> Self {
        Self {
            settle_delay: Duration::from_millis(capture.settle_delay_ms),
            backoff_base: Duration::from_millis(capture.backoff_base_ms),
            max_height: capture.max_height,
        }
    }

    fn process_options(&self, mode: CaptureMode) -> ProcessOptions {
        match mode {
            CaptureMode::Hero => ProcessOptions::with_clip(WIDTH, HERO_HEIGHT),
            CaptureMode::Full => ProcessOptions::with_max_height(self.max_height),
        }
    }
}

pub struct CaptureOrchestrator {
    sessions: Arc<dyn SessionFactory>,
    store: ArtifactStore,
    processor: ImagePostProcessor,
    fallback: FallbackImageGenerator,
    config: OrchestratorConfig,
}

impl CaptureOrchestrator {
    pub fn new(
        sessions: Arc<dyn SessionFactory>,
        store: ArtifactStore,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            sessions,
            store,
            processor: ImagePostProcessor::new(),
            fallback: FallbackImageGenerator::new(),
            config,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Process `jobs` in catalog order, `concurrency` at a time.
    ///
    /// Every batch finishes before the next starts. Results are recorded in
    /// `report` as they complete; a fatal error stops the run after the
    /// current batch has been recorded.
    pub async fn run(
        &self,
        jobs: &[CaptureJob],
        concurrency: usize,
        report: &ReportAccumulator,
    ) -> Result<Vec<CaptureResult>, PipelineError> {
        let batch_size = concurrency.max(1);
        let total = jobs.len();
        let mut results = Vec::with_capacity(total);
        let mut processed = 0;

        info!("📸 Capturing {} sites, {} at a time", total, batch_size);

        for batch in jobs.chunks(batch_size) {
            let outcomes = join_all(batch.iter().map(|job| self.process_job(job))).await;

            let mut fatal = None;
            for outcome in outcomes {
                match outcome {
                    Ok(result) => {
                        report.record(result.clone());
                        results.push(result);
                    }
                    Err(e) => {
                        fatal.get_or_insert(e);
                    }
                }
            }
            if let Some(e) = fatal {
                return Err(e);
            }

            processed += batch.len();
            info!("🔄 Progress: {}/{}", processed, total);
        }

        Ok(results)
    }

    /// Run one job to a result. Only fatal errors are returned as `Err`.
    pub async fn process_job(&self, job: &CaptureJob) -> Result<CaptureResult, PipelineError> {
        let slug = job.slug();

        if self.store.is_usable(&job.target_path) {
            debug!(slug, "✓ Artifact exists");
            return Ok(CaptureResult::exists(slug));
        }
        if ArtifactStore::artifact_size(&job.target_path).is_some() {
            info!(slug, "↻ Replacing undersized artifact");
        }

        let target = match job.entry.url_state {
            UrlState::Resolved => job.entry.capture_url().and_then(resolve_url),
            UrlState::Unresolvable | UrlState::Excluded => None,
        };
        let Some(url) = target else {
            let reason = skip_reason(&job.entry);
            ensure_fallback(&self.store, &self.fallback, &job.entry).await?;
            info!(slug, "⏭️  {}", reason);
            return Ok(CaptureResult::error(slug, reason));
        };

        match self.capture(job, &url_variants(&url)).await {
            Ok(bytes) => {
                ArtifactStore::write_artifact(&job.target_path, &bytes)
                    .await
                    .map_err(|source| PipelineError::ArtifactWrite {
                        path: job.target_path.clone(),
                        source,
                    })?;
                info!(slug, bytes = bytes.len(), "✅ Captured");
                Ok(CaptureResult::success(slug))
            }
            Err(e) => {
                warn!(slug, error = %e, "❌ Capture failed");
                if ensure_fallback(&self.store, &self.fallback, &job.entry).await? {
                    info!(slug, "→ Generated fallback");
                }
                Ok(CaptureResult::error(slug, e.to_string()))
            }
        }
    }

    /// Open a session, capture, and close the session on every path
    async fn capture(
        &self,
        job: &CaptureJob,
        variants: &[String],
    ) -> Result<Vec<u8>, CaptureError> {
        let mut session = self.sessions.open(job.mode).await?;
        let outcome = self.attempt(session.as_mut(), job, variants).await;
        session.close().await;
        outcome
    }

    async fn attempt(
        &self,
        session: &mut dyn BrowserSession,
        job: &CaptureJob,
        variants: &[String],
    ) -> Result<Vec<u8>, CaptureError> {
        let slug = job.slug();
        let timeout = Duration::from_millis(job.timeout_ms);
        let mut last_error = None;

        for attempt in 0..=job.max_retries {
            let Some(url) = variant_for_attempt(variants, attempt) else {
                break;
            };

            // sessions may ignore `timeout`
            let navigation = tokio::time::timeout(timeout, session.navigate(url, timeout))
                .await
                .unwrap_or_else(|_| {
                    Err(CaptureError::Timeout {
                        url: url.to_string(),
                        timeout_ms: job.timeout_ms,
                    })
                });

            match navigation {
                Ok(()) => {
                    debug!(slug, attempt, url, "Navigation succeeded");
                    return self.capture_loaded_page(session, job).await;
                }
                Err(e) => {
                    warn!(slug, attempt, url, error = %e, "⚠️  Navigation failed");
                    last_error = Some(e);
                    if attempt < job.max_retries {
                        sleep(self.config.backoff_base * (attempt + 1)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CaptureError::Navigation {
            url: job.entry.source_url.clone(),
            message: "no navigation candidates".to_string(),
        }))
    }

    async fn capture_loaded_page(
        &self,
        session: &mut dyn BrowserSession,
        job: &CaptureJob,
    ) -> Result<Vec<u8>, CaptureError> {
        // overlay removal is best effort
        match session.strip_overlays().await {
            Ok(0) => {}
            Ok(removed) => debug!(slug = job.slug(), removed, "Removed overlays"),
            Err(e) => debug!(slug = job.slug(), error = %e, "Overlay removal failed"),
        }
        sleep(self.config.settle_delay).await;

        let raw = session.capture(job.mode).await?;
        let options = self.config.process_options(job.mode);
        Ok(self.processor.process(&raw, &options)?)
    }
}

fn skip_reason(entry: &CatalogEntry) -> String {
    match entry.url_state {
        UrlState::Excluded => format!("excluded host: {}", entry.source_url),
        UrlState::Unresolvable | UrlState::Resolved => {
            format!("unresolvable url: {:?}", entry.source_url)
        }
    }
}

/// Write the fallback for `entry` unless one exists. Returns whether it wrote.
pub async fn ensure_fallback(
    store: &ArtifactStore,
    generator: &FallbackImageGenerator,
    entry: &CatalogEntry,
) -> Result<bool, PipelineError> {
    let path = store.fallback_path(&entry.slug);
    if ArtifactStore::artifact_size(&path).is_some() {
        return Ok(false);
    }

    let bytes = generator
        .generate(&entry.name, entry.macro_category.label())
        .map_err(|source| PipelineError::Fallback {
            slug: entry.slug.clone(),
            source,
        })?;
    ArtifactStore::write_artifact(&path, &bytes)
        .await
        .map_err(|source| PipelineError::ArtifactWrite { path, source })?;
    Ok(true)
}
