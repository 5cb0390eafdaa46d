//! Domain module - Core catalog entities and rules
//!
//! This module contains the catalog entities, the category taxonomy, slug
//! derivation and the capture job types. Nothing here touches the filesystem
//! or the network.
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod capture;
pub mod category;
pub mod constants;
pub mod entities;
pub mod slug;

// Re-export commonly used items for convenience
pub use capture::{CaptureJob, CaptureMode, CaptureResult, CaptureStatus};
pub use category::{CATEGORY_RULES, MacroCategory, classify, color_for_label};
pub use entities::{CatalogEntry, RawRow, UrlState};
pub use slug::slugify;
