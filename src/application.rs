//! Application layer module
//!
//! Catalog ingestion and the read-time views built on top of it:
//! - `catalog_loader`: raw rows to deduplicated entries
//! - `quality`: completeness score and display ordering
//! - `catalog_reader`: visible, sorted cards with resolved previews
//! - `audit`: artifact coverage report

pub mod audit;
pub mod catalog_loader;
pub mod catalog_reader;
pub mod quality;

pub use audit::{CatalogAudit, HeroCoverage};
pub use catalog_loader::{CatalogError, CatalogLoader, LoadSummary, read_rows, read_rows_from_path};
pub use catalog_reader::{CatalogCard, CatalogReader, PreviewError};
pub use quality::{QualityScorer, Tiebreak, sort_catalog};
