//! Infrastructure layer for configuration, logging, images and the browser
//!
//! This module provides the on-disk artifact cache, image post-processing,
//! fallback rendering and the Chromium-backed browser sessions.

pub mod artifact_store;
pub mod browser;
pub mod config; // Configuration file, defaults and env overrides
pub mod fallback_image;
pub mod image_processing;
pub mod logging; // Logging infrastructure

// Re-export commonly used items
pub use artifact_store::{ArtifactStore, HeroState, PreviewTier, ResolvedPreview};
pub use browser::{ChromiumSession, ChromiumSessionFactory};
pub use config::{AppConfig, CaptureOverrides, ConfigManager};
pub use fallback_image::FallbackImageGenerator;
pub use image_processing::{ImageError, ImagePostProcessor, ProcessOptions};
pub use logging::{get_log_directory, init_logging_with_config};
