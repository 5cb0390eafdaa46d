//! Browser seam
//!
//! The orchestrator only sees these traits. The Chromium implementation lives
//! in `infrastructure::browser`; tests use in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;

use super::CaptureError;
use crate::domain::capture::CaptureMode;

/// One isolated page. Never shared between jobs.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate and wait for load, bounded by `timeout`
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), CaptureError>;

    /// Remove cookie/consent interstitials; returns how many were removed
    async fn strip_overlays(&mut self) -> Result<usize, CaptureError>;

    /// Raw bitmap for `mode` (clipped viewport or full page)
    async fn capture(&mut self, mode: CaptureMode) -> Result<Vec<u8>, CaptureError>;

    /// Release the page. Called on every path, errors are logged not returned.
    async fn close(self: Box<Self>);
}

/// Opens sessions configured for a capture mode
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, mode: CaptureMode) -> Result<Box<dyn BrowserSession>, CaptureError>;
}
