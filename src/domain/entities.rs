//! Domain entities
//!
//! Contains the catalog entities and their logic.

use serde::{Deserialize, Serialize};
use url::Url;

use super::category::MacroCategory;
use super::constants::catalog::{
    MAX_HOST_LABEL_LEN, NAME_SLUG_PREFIX_LEN, PLATFORM_LINK_PATTERNS, SUSPECT_HOST_LABEL_LEN,
    SUSPECT_MAX_HYPHENS, SUSPECT_NAME_SLUG_LEN, UNCATEGORIZED,
};
use super::slug::slugify;

/// One source-table row with named fields.
///
/// Columns are positional in the source (name, url, category, description,
/// featured, hidden); this is the only place that knows the positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub name: String,
    pub url: String,
    pub category: String,
    pub description: String,
    pub featured: bool,
    pub hidden: bool,
}

impl RawRow {
    /// Build a row from positional fields. Missing trailing fields are empty.
    pub fn from_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut it = fields.into_iter().map(str::trim);
        let mut next = || it.next().unwrap_or_default().to_string();
        let name = next();
        let url = next();
        let category = next();
        let description = next();
        let featured = parse_flag(&next());
        let hidden = parse_flag(&next());
        Self {
            name,
            url,
            category,
            description,
            featured,
            hidden,
        }
    }
}

/// `"true"` in any case is true; everything else is false
fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Whether the capture pipeline may contact an entry's site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlState {
    /// Absolute http(s) URL with a host
    Resolved,
    /// Present but not parseable; always gets the fallback
    Unresolvable,
    /// Host is on the exclusion list; always gets the fallback
    Excluded,
}

/// A normalized, deduplicated catalog member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Zero-based index of the source data row (header excluded)
    pub row: usize,
    pub name: String,
    /// URL exactly as given in the source, trimmed
    pub source_url: String,
    /// Absolute URL used for capture, when resolvable
    pub resolved_url: Option<String>,
    pub url_state: UrlState,
    pub raw_category: String,
    pub description: String,
    pub featured: bool,
    pub hidden: bool,
    pub slug: String,
    pub macro_category: MacroCategory,
}

impl CatalogEntry {
    /// URL to navigate to, or `None` when the entry must not be captured
    pub fn capture_url(&self) -> Option<&str> {
        match self.url_state {
            UrlState::Resolved => self.resolved_url.as_deref(),
            UrlState::Unresolvable | UrlState::Excluded => None,
        }
    }

    /// Hostname used for duplicate detection
    pub fn normalized_host(&self) -> Option<String> {
        self.resolved_url.as_deref().and_then(normalized_host)
    }

    /// Name used for containment dedup
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Whether the entry may appear in the public showcase: it has a name, a
    /// specific category and an address that is the site's own.
    ///
    /// The check runs on the resolved URL, so a bare domain in the source
    /// qualifies once it resolves to https.
    pub fn is_showcase_ready(&self) -> bool {
        !self.name.trim().is_empty()
            && has_specific_category(&self.raw_category)
            && self
                .resolved_url
                .as_deref()
                .is_some_and(|url| is_official_url(url, &self.name))
    }
}

/// A category is specific unless blank, "Uncategorized" or any casing of "other"
pub fn has_specific_category(raw: &str) -> bool {
    let category = raw.trim();
    !category.is_empty() && category != UNCATEGORIZED && !category.eq_ignore_ascii_case("other")
}

/// Whether `url` is a site's own http(s) address.
///
/// Rejects gallery listings and domains that look guessed from the name:
/// an overlong leading label, a long label embedding the name slug, or a long
/// label stitched together from many hyphenated words.
pub fn is_official_url(url: &str, name: &str) -> bool {
    let lower = url.trim().to_lowercase();
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return false;
    }
    if PLATFORM_LINK_PATTERNS.iter().any(|pattern| lower.contains(pattern)) {
        return false;
    }
    let Some(host) = normalized_host(&lower) else {
        return false;
    };
    let label = host.split('.').next().unwrap_or_default();
    if label.len() > MAX_HOST_LABEL_LEN {
        return false;
    }

    let suspect = label.len() > SUSPECT_HOST_LABEL_LEN;
    let name_slug = slugify(name);
    if suspect && name_slug.len() > SUSPECT_NAME_SLUG_LEN {
        let prefix = &name_slug[..name_slug.len().min(NAME_SLUG_PREFIX_LEN)];
        if label.contains(prefix) {
            return false;
        }
    }
    !(suspect && label.matches('-').count() > SUSPECT_MAX_HYPHENS)
}

/// Lowercase host with a leading `www.` removed
pub fn normalized_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// Trimmed, lowercased name
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Resolve a hand-entered URL into an absolute http(s) URL.
///
/// Values with a scheme are parsed as given. A bare domain (contains a dot and
/// no whitespace) is assumed to be https. Anything else, or anything that does
/// not parse to an http(s) URL with a host, is unresolvable.
pub fn resolve_url(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    let lower = raw.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        raw.to_string()
    } else if raw.contains('.') && !raw.chars().any(char::is_whitespace) && !raw.contains("://") {
        format!("https://{raw}")
    } else {
        return None;
    };

    let url = Url::parse(&candidate).ok()?;
    let host_ok = url.host_str().is_some_and(|h| h.contains('.') || h == "localhost");
    (matches!(url.scheme(), "http" | "https") && host_ok).then_some(url)
}
