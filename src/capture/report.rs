//! Per-run outcome accumulation
//!
//! One accumulator per run, passed explicitly to whoever records outcomes.
//! The report is written once at the end and never read back.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use super::PipelineError;
use crate::domain::capture::{CaptureResult, CaptureStatus};

/// Serialized run summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureReport {
    pub total: usize,
    pub success: usize,
    pub exists: usize,
    pub error: usize,
    pub items: Vec<CaptureResult>,
}

impl CaptureReport {
    fn push(&mut self, result: CaptureResult) {
        self.total += 1;
        match result.status {
            CaptureStatus::Success => self.success += 1,
            CaptureStatus::Exists => self.exists += 1,
            CaptureStatus::Error => self.error += 1,
        }
        self.items.push(result);
    }
}

/// Concurrent-append-safe collector of [`CaptureResult`]s
#[derive(Debug, Default)]
pub struct ReportAccumulator {
    inner: Mutex<CaptureReport>,
}

impl ReportAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, result: CaptureResult) {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).push(result);
    }

    /// Copy of the current totals and items
    pub fn snapshot(&self) -> CaptureReport {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn into_report(self) -> CaptureReport {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the report as pretty JSON, creating parent directories
    pub async fn write(&self, path: &Path) -> Result<CaptureReport, PipelineError> {
        let report = self.snapshot();
        let to_report_error = |source| PipelineError::Report {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(to_report_error)?;
        }
        let json = serde_json::to_string_pretty(&report).map_err(|e| to_report_error(e.into()))?;
        fs::write(path, json).await.map_err(to_report_error)?;

        info!("📁 Report written to {:?}", path);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn counts_match_items() {
        let acc = ReportAccumulator::new();
        acc.record(CaptureResult::success("a"));
        acc.record(CaptureResult::exists("b"));
        acc.record(CaptureResult::error("c", "timeout"));
        acc.record(CaptureResult::error("d", "dns"));

        let report = acc.into_report();
        assert_eq!((report.total, report.success, report.exists, report.error), (4, 1, 1, 2));
        assert_eq!(report.items.len(), 4);
    }

    #[tokio::test]
    async fn concurrent_records_are_not_lost() {
        let acc = Arc::new(ReportAccumulator::new());
        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let acc = Arc::clone(&acc);
                tokio::spawn(async move { acc.record(CaptureResult::success(format!("site-{i}"))) })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(acc.snapshot().success, 32);
    }

    #[tokio::test]
    async fn written_report_has_the_expected_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scripts/output/hero-report.json");
        let acc = ReportAccumulator::new();
        acc.record(CaptureResult::success("acme"));
        acc.record(CaptureResult::error("broken", "net::ERR_NAME_NOT_RESOLVED"));

        acc.write(&path).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["total"], 2);
        assert_eq!(json["success"], 1);
        assert_eq!(json["exists"], 0);
        assert_eq!(json["error"], 1);
        assert_eq!(json["items"][0], serde_json::json!({"slug": "acme", "status": "success"}));
        assert_eq!(json["items"][1]["error"], "net::ERR_NAME_NOT_RESOLVED");
    }
}
