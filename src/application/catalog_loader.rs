//! Catalog ingestion
//!
//! Turns raw source rows into normalized, deduplicated [`CatalogEntry`]s.
//! Loading is pure and deterministic: identical rows give identical entries.

use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::category::classify;
use crate::domain::constants::catalog::MIN_FUZZY_NAME_LEN;
use crate::domain::entities::{CatalogEntry, RawRow, UrlState, resolve_url};
use crate::domain::slug::slugify;
use crate::infrastructure::config::CaptureConfig;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog source: {0}")]
    Csv(#[from] csv::Error),
}

/// Per-load counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub accepted: usize,
    pub duplicates: usize,
    pub skipped_invalid: usize,
    /// Accepted rows whose URL could not be resolved
    pub unresolvable: usize,
    /// Accepted rows on an excluded host
    pub excluded: usize,
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accepted {}, duplicates {}, invalid {}, unresolvable {}, excluded {}",
            self.accepted, self.duplicates, self.skipped_invalid, self.unresolvable, self.excluded
        )
    }
}

/// Why a row matched an existing member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DuplicateKind {
    Host,
    Name,
    Slug,
}

/// Keys of the members loaded so far
#[derive(Debug, Default)]
struct DedupIndex {
    hosts: HashSet<String>,
    slugs: HashSet<String>,
    names: Vec<String>,
}

impl DedupIndex {
    fn from_entries(entries: &[CatalogEntry]) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index.insert(entry);
        }
        index
    }

    fn insert(&mut self, entry: &CatalogEntry) {
        if let Some(host) = entry.normalized_host() {
            self.hosts.insert(host);
        }
        self.slugs.insert(entry.slug.clone());
        self.names.push(entry.normalized_name());
    }

    fn find(&self, host: Option<&str>, name: &str, slug: &str) -> Option<DuplicateKind> {
        if host.is_some_and(|h| self.hosts.contains(h)) {
            return Some(DuplicateKind::Host);
        }
        if self.names.iter().any(|existing| names_overlap(existing, name)) {
            return Some(DuplicateKind::Name);
        }
        if self.slugs.contains(slug) {
            return Some(DuplicateKind::Slug);
        }
        None
    }
}

/// Containment match, only when both names are long enough to be meaningful
fn names_overlap(a: &str, b: &str) -> bool {
    a.chars().count() > MIN_FUZZY_NAME_LEN
        && b.chars().count() > MIN_FUZZY_NAME_LEN
        && (a.contains(b) || b.contains(a))
}

#[derive(Debug, Clone, Default)]
pub struct CatalogLoader {
    excluded_hosts: Vec<String>,
}

impl CatalogLoader {
    pub fn new<I, S>(excluded_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excluded_hosts = excluded_hosts
            .into_iter()
            .map(|h| h.as_ref().trim().trim_start_matches("www.").to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        Self { excluded_hosts }
    }

    pub fn from_config(capture: &CaptureConfig) -> Self {
        Self::new(&capture.excluded_hosts)
    }

    /// Load a fresh catalog
    pub fn load(&self, rows: &[RawRow]) -> (Vec<CatalogEntry>, LoadSummary) {
        let mut entries = Vec::with_capacity(rows.len());
        let summary = self.load_into(&mut entries, rows);
        (entries, summary)
    }

    /// Append `rows` to an already-loaded catalog.
    ///
    /// Duplicates are checked against `existing` and against earlier rows of
    /// the same batch; the first seen wins.
    pub fn load_into(&self, existing: &mut Vec<CatalogEntry>, rows: &[RawRow]) -> LoadSummary {
        let mut index = DedupIndex::from_entries(existing);
        let mut summary = LoadSummary::default();

        for (row_index, raw) in rows.iter().enumerate() {
            let Some(entry) = self.normalize(row_index, raw) else {
                summary.skipped_invalid += 1;
                continue;
            };

            let host = entry.normalized_host();
            if let Some(kind) = index.find(host.as_deref(), &entry.normalized_name(), &entry.slug) {
                debug!(row = row_index, slug = %entry.slug, ?kind, "Skipping duplicate");
                summary.duplicates += 1;
                continue;
            }

            match entry.url_state {
                UrlState::Unresolvable => summary.unresolvable += 1,
                UrlState::Excluded => summary.excluded += 1,
                UrlState::Resolved => {}
            }
            summary.accepted += 1;
            index.insert(&entry);
            existing.push(entry);
        }

        info!("📋 Catalog loaded: {}", summary);
        summary
    }

    /// Build an entry from one row, `None` when the row is unusable
    fn normalize(&self, row: usize, raw: &RawRow) -> Option<CatalogEntry> {
        let name = raw.name.trim();
        let source_url = raw.url.trim();
        if name.is_empty() || source_url.is_empty() {
            return None;
        }
        let slug = slugify(name);
        if slug.is_empty() {
            return None;
        }

        let resolved = resolve_url(source_url);
        let url_state = match &resolved {
            None => UrlState::Unresolvable,
            Some(url) if self.is_excluded(url.host_str().unwrap_or_default()) => UrlState::Excluded,
            Some(_) => UrlState::Resolved,
        };
        let raw_category = raw.category.trim();

        Some(CatalogEntry {
            row,
            name: name.to_string(),
            source_url: source_url.to_string(),
            resolved_url: resolved.map(|u| u.to_string()),
            url_state,
            raw_category: raw_category.to_string(),
            description: raw.description.trim().to_string(),
            featured: raw.featured,
            hidden: raw.hidden,
            slug,
            macro_category: classify(raw_category, name, source_url),
        })
    }

    fn is_excluded(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        self.excluded_hosts
            .iter()
            .any(|excluded| host == excluded || host.ends_with(&format!(".{excluded}")))
    }

    /// Read and load a CSV catalog file
    pub fn load_file(&self, path: &Path) -> Result<(Vec<CatalogEntry>, LoadSummary), CatalogError> {
        let rows = read_rows_from_path(path)?;
        info!("Read {} rows from {:?}", rows.len(), path);
        Ok(self.load(&rows))
    }
}

/// Parse CSV with a header row. Columns are positional; short rows are padded
/// with empty fields and blank lines are skipped.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RawRow>, CatalogError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(RawRow::from_fields(record.iter()));
    }
    Ok(rows)
}

pub fn read_rows_from_path(path: &Path) -> Result<Vec<RawRow>, CatalogError> {
    let file = std::fs::File::open(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_rows(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::MacroCategory;

    fn row(name: &str, url: &str, category: &str) -> RawRow {
        RawRow::from_fields([name, url, category, "", "false", "false"])
    }

    fn loader() -> CatalogLoader {
        CatalogLoader::new(["impossiblefoods.com"])
    }

    #[test]
    fn canonical_row_is_normalized() {
        let rows = [RawRow::from_fields(["Acme", "acme.io", "SaaS Tool", "desc", "true", "false"])];
        let (entries, summary) = loader().load(&rows);

        assert_eq!(summary.accepted, 1);
        let acme = &entries[0];
        assert_eq!(acme.slug, "acme");
        assert_eq!(acme.macro_category, MacroCategory::Saas);
        assert!(acme.featured);
        assert!(!acme.hidden);
        assert_eq!(acme.resolved_url.as_deref(), Some("https://acme.io/"));
        assert_eq!(acme.url_state, UrlState::Resolved);
    }

    #[test]
    fn www_variant_of_known_host_is_dropped() {
        let rows = [
            row("Acme", "acme.io", "SaaS"),
            row("Acme Corp Site", "https://www.acme.io", "SaaS"),
        ];
        let (entries, summary) = loader().load(&rows);
        assert_eq!(entries.len(), 1);
        assert_eq!(summary.duplicates, 1);
    }

    #[test]
    fn name_containment_needs_long_names() {
        let rows = [
            row("Linear", "https://linear.app", ""),
            row("Linear App", "https://linear-app.com", ""),
            row("Arc", "https://arc.net", ""),
            row("Arcade", "https://arcade.software", ""),
        ];
        let (entries, summary) = loader().load(&rows);
        let slugs: Vec<_> = entries.iter().map(|e| e.slug.as_str()).collect();
        // "arc" is too short to take part in containment
        assert_eq!(slugs, vec!["linear", "arc", "arcade"]);
        assert_eq!(summary.duplicates, 1);
    }

    #[test]
    fn slug_collision_keeps_first_row() {
        let rows = [row("A.B.", "https://ab.one", ""), row("a b", "https://ab.two", "")];
        let (entries, _) = loader().load(&rows);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source_url, "https://ab.one");
        assert_eq!(entries[0].row, 0);
    }

    #[test]
    fn invalid_rows_are_skipped_or_flagged() {
        let rows = [
            row("", "https://nameless.io", ""),
            row("No Url", "", ""),
            row("???", "https://symbols.io", ""),
            row("Broken", "not a url", ""),
            row("Placeholder", "https://www.impossiblefoods.com/x", ""),
        ];
        let (entries, summary) = loader().load(&rows);
        assert_eq!(summary.skipped_invalid, 3);
        assert_eq!(summary.unresolvable, 1);
        assert_eq!(summary.excluded, 1);
        assert_eq!(entries[0].url_state, UrlState::Unresolvable);
        assert_eq!(entries[0].capture_url(), None);
        assert_eq!(entries[1].url_state, UrlState::Excluded);
        assert_eq!(entries[1].capture_url(), None);
    }

    #[test]
    fn load_into_checks_existing_and_new_rows() {
        let loader = loader();
        let (mut entries, _) = loader.load(&[row("Stripe", "https://stripe.com", "Payments")]);

        let summary = loader.load_into(
            &mut entries,
            &[
                row("Stripe Payments", "https://stripe.com/payments", ""),
                row("Vercel", "vercel.com", "Developer"),
                row("Vercel", "https://vercel.app", ""),
            ],
        );

        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.duplicates, 2);
        let slugs: Vec<_> = entries.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["stripe", "vercel"]);
    }

    #[test]
    fn loading_is_deterministic() {
        let rows = [
            row("Acme", "acme.io", "SaaS"),
            row("Beta", "beta.dev", "AI"),
            row("Gamma", "x y", ""),
        ];
        assert_eq!(loader().load(&rows).0, loader().load(&rows).0);
    }

    #[test]
    fn csv_reader_handles_header_blank_lines_and_short_rows() {
        let csv = "name,url,category,description,featured,hidden\n\
                   Acme,acme.io,SaaS Tool,\"Makes, things\",TRUE,false\n\
                   \n\
                   Beta,https://beta.dev\n";
        let rows = read_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description, "Makes, things");
        assert!(rows[0].featured);
        assert_eq!(rows[1].category, "");
        assert!(!rows[1].hidden);
    }
}
