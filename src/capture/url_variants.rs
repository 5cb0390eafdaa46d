//! Navigation candidates for a hand-entered URL
//!
//! Catalog URLs are often subtly wrong: a site that only answers on `http`, or
//! only with (or without) `www.`. Each retry tries the next candidate.

use url::Url;

/// Candidates in attempt order: as given, protocol flipped, `www.` added,
/// `www.` removed. Path and query are kept; the fragment is dropped.
///
/// Entries are not deduplicated so attempt `i` always maps to the same kind
/// of variant.
pub fn url_variants(url: &Url) -> Vec<String> {
    let Some(host) = url.host_str() else {
        return vec![url.to_string()];
    };

    let authority = |host: &str| match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let tail = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };
    let scheme = url.scheme();
    let flipped = if scheme == "https" { "http" } else { "https" };
    let bare = host.strip_prefix("www.").unwrap_or(host);

    vec![
        url.to_string(),
        format!("{flipped}://{}{tail}", authority(host)),
        format!("{scheme}://{}{tail}", authority(&format!("www.{bare}"))),
        format!("{scheme}://{}{tail}", authority(bare)),
    ]
}

/// Candidate for zero-based `attempt`; later attempts reuse the last one
pub fn variant_for_attempt(variants: &[String], attempt: u32) -> Option<&str> {
    let last = variants.len().checked_sub(1)?;
    variants.get((attempt as usize).min(last)).map(String::as_str)
}
