//! Chromium-backed browser sessions
//!
//! One browser process is launched per run. Every session gets its own browser
//! context, so cookies and storage never leak between sites, and a single page
//! inside it with its own viewport and user-agent override. Pages have no async
//! `Drop`, so a session left unclosed on a panic path spawns its own cleanup.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, Viewport};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::ScreenshotParams;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::capture::session::{BrowserSession, SessionFactory};
use crate::capture::CaptureError;
use crate::domain::capture::CaptureMode;
use crate::domain::constants::viewport::{FULL_HEIGHT, HERO_HEIGHT, USER_AGENT, WIDTH};
use crate::infrastructure::config::CaptureConfig;

/// Interstitial containers considered for removal
pub const OVERLAY_SELECTORS: &[&str] = &[
    r#"[class*="cookie"]"#,
    r#"[class*="gdpr"]"#,
    r#"[id*="cookie"]"#,
    r#"[class*="banner"]"#,
    r#"[class*="consent"]"#,
    r#"[class*="popup"]"#,
    r#"[role="dialog"]"#,
];

/// Only containers whose text mentions one of these are removed
pub const OVERLAY_KEYWORDS: &[&str] = &["cookie", "accept", "consent"];

/// Script removing matching overlays; evaluates to the number removed
pub fn overlay_script() -> String {
    let selectors = serde_json::to_string(OVERLAY_SELECTORS).unwrap_or_else(|_| "[]".to_string());
    let keywords = serde_json::to_string(OVERLAY_KEYWORDS).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(() => {{
  const selectors = {selectors};
  const keywords = {keywords};
  let removed = 0;
  for (const sel of selectors) {{
    document.querySelectorAll(sel).forEach((el) => {{
      if (!el.isConnected) return;
      const text = (el.textContent || '').toLowerCase();
      if (keywords.some((k) => text.includes(k))) {{
        el.remove();
        removed += 1;
      }}
    }});
  }}
  return removed;
}})()"#
    )
}

const fn viewport_height(mode: CaptureMode) -> u32 {
    match mode {
        CaptureMode::Hero => HERO_HEIGHT,
        CaptureMode::Full => FULL_HEIGHT,
    }
}

/// Blank page opened inside `context`
fn blank_target(context: BrowserContextId) -> CreateTargetParams {
    let mut params = CreateTargetParams::new("about:blank");
    params.browser_context_id = Some(context);
    params
}

/// Close the page, then dispose its context. Disposing also closes anything
/// the page opened.
async fn release(browser: Arc<Browser>, page: Option<Page>, context: Option<BrowserContextId>) {
    if let Some(page) = page {
        if let Err(e) = page.close().await {
            warn!("Failed to close page: {}", e);
        }
    }
    if let Some(context) = context {
        if let Err(e) = browser.execute(DisposeBrowserContextParams::new(context)).await {
            warn!("Failed to dispose browser context: {}", e);
        }
    }
}

/// Owns the browser process and its CDP event loop
pub struct ChromiumSessionFactory {
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
}

impl ChromiumSessionFactory {
    pub async fn launch(capture: &CaptureConfig) -> Result<Self, CaptureError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(WIDTH, FULL_HEIGHT)
            .arg("--disable-dev-shm-usage")
            .arg("--ignore-certificate-errors")
            .arg("--hide-scrollbars");
        if !capture.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &capture.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(CaptureError::Session)?;

        let (browser, mut events) = Browser::launch(config)
            .await
            .map_err(|e| CaptureError::Session(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    trace!("CDP handler event error: {}", e);
                }
            }
        });

        info!("✅ Browser launched (headless: {})", capture.headless);
        Ok(Self {
            browser: Arc::new(browser),
            handler,
        })
    }

    /// Close the browser and stop the event loop. Call once every session is
    /// closed; a browser still shared with a session is left to its drop.
    pub async fn shutdown(self) {
        match Arc::try_unwrap(self.browser) {
            Ok(mut browser) => {
                if let Err(e) = browser.close().await {
                    warn!("Failed to close browser cleanly: {}", e);
                }
            }
            Err(_) => warn!("Browser still shared by an open session; skipping close"),
        }
        self.handler.abort();
        debug!("Browser shut down");
    }
}

#[async_trait]
impl SessionFactory for ChromiumSessionFactory {
    async fn open(&self, mode: CaptureMode) -> Result<Box<dyn BrowserSession>, CaptureError> {
        let context = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| CaptureError::Session(e.to_string()))?
            .result
            .browser_context_id;
        let mut session = ChromiumSession {
            page: None,
            context: Some(context.clone()),
            browser: self.browser.clone(),
        };

        match self.browser.new_page(blank_target(context)).await {
            Ok(page) => session.page = Some(page),
            Err(e) => {
                Box::new(session).close().await;
                return Err(CaptureError::Session(e.to_string()));
            }
        }
        if let Err(e) = session.configure(viewport_height(mode)).await {
            Box::new(session).close().await;
            return Err(e);
        }
        Ok(Box::new(session))
    }
}

pub struct ChromiumSession {
    page: Option<Page>,
    context: Option<BrowserContextId>,
    browser: Arc<Browser>,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, CaptureError> {
        self.page
            .as_ref()
            .ok_or_else(|| CaptureError::Session("page already closed".to_string()))
    }

    async fn configure(&self, height: u32) -> Result<(), CaptureError> {
        let page = self.page()?;
        page.execute(SetUserAgentOverrideParams::new(USER_AGENT))
            .await
            .map_err(|e| CaptureError::Session(e.to_string()))?;
        let metrics =
            SetDeviceMetricsOverrideParams::new(i64::from(WIDTH), i64::from(height), 1.0, false);
        page.execute(metrics).await.map_err(|e| CaptureError::Session(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), CaptureError> {
        let page = self.page()?;
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Err(_) => Err(CaptureError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
            Ok(Err(e)) => Err(CaptureError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Ok(Ok(_)) => Ok(()),
        }
    }

    async fn strip_overlays(&mut self) -> Result<usize, CaptureError> {
        let result = self
            .page()?
            .evaluate(overlay_script())
            .await
            .map_err(|e| CaptureError::Script(e.to_string()))?;
        result.into_value::<usize>().map_err(|e| CaptureError::Script(e.to_string()))
    }

    async fn capture(&mut self, mode: CaptureMode) -> Result<Vec<u8>, CaptureError> {
        let params = match mode {
            CaptureMode::Hero => ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .clip(Viewport {
                    x: 0.0,
                    y: 0.0,
                    width: f64::from(WIDTH),
                    height: f64::from(HERO_HEIGHT),
                    scale: 1.0,
                })
                .build(),
            CaptureMode::Full => ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .full_page(true)
                .build(),
        };

        self.page()?
            .screenshot(params)
            .await
            .map_err(|e| CaptureError::Screenshot(e.to_string()))
    }

    async fn close(self: Box<Self>) {
        let mut session = self;
        let (page, context) = (session.page.take(), session.context.take());
        release(session.browser.clone(), page, context).await;
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        let (page, context) = (self.page.take(), self.context.take());
        if page.is_none() && context.is_none() {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            debug!("Session dropped unclosed; spawning cleanup");
            handle.spawn(release(self.browser.clone(), page, context));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_script_embeds_selectors_and_keywords() {
        let script = overlay_script();
        for selector in OVERLAY_SELECTORS {
            let quoted = serde_json::to_string(selector).unwrap();
            assert!(script.contains(&quoted), "missing {selector}");
        }
        assert!(script.contains(r#"["cookie","accept","consent"]"#));
        assert!(script.trim_end().ends_with("})()"));
    }

    #[test]
    fn pages_open_inside_the_session_context() {
        let params = blank_target(BrowserContextId::new("ctx-1"));
        assert_eq!(params.url, "about:blank");
        assert_eq!(params.browser_context_id, Some(BrowserContextId::new("ctx-1")));
    }

    #[test]
    fn viewport_matches_mode() {
        assert_eq!(viewport_height(CaptureMode::Hero), 720);
        assert_eq!(viewport_height(CaptureMode::Full), 900);
    }
}
