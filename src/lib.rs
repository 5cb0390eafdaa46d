//! Site Showcase - catalog ingestion and screenshot capture
//!
//! Loads a hand-maintained table of websites, captures hero and full-page
//! previews with a headless browser, and falls back to generated cards when a
//! site cannot be captured.

// Module declarations
pub mod application;
pub mod capture;
pub mod domain;
pub mod infrastructure;
