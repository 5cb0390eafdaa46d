//! Catalog and capture domain constants
//!
//! Fixed characteristics of the showcase catalog and its preview artifacts.
//! Tunables that operators change per run live in `infrastructure::config`;
//! the values here are the ones every component must agree on.

/// Preview artifact characteristics
pub mod artifact {
    /// File extension shared by hero, full-page and fallback artifacts
    pub const EXTENSION: &str = "jpg";

    /// Sub-directory of the hero directory that holds synthesized placeholders
    pub const FALLBACK_SUBDIR: &str = "fallbacks";

    /// Byte floor below which an artifact counts as degenerate.
    ///
    /// A blank or error page encodes to a tiny file; anything smaller than this
    /// is treated as absent by the capture pass and loses to the fallback at
    /// read time.
    pub const MIN_ARTIFACT_BYTES: u64 = 20_000;

    /// Encoder quality applied uniformly to every artifact
    pub const ENCODE_QUALITY: u8 = 85;
}

/// Browser session characteristics
pub mod viewport {
    /// Viewport width for both capture modes
    pub const WIDTH: u32 = 1280;

    /// Hero capture height (the clip region is WIDTH x HERO_HEIGHT)
    pub const HERO_HEIGHT: u32 = 720;

    /// Viewport height used before a full-page capture
    pub const FULL_HEIGHT: u32 = 900;

    /// Desktop client identity presented to every site
    pub const USER_AGENT: &str = concat!(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
        "AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    );
}

/// Fallback placeholder canvas
pub mod fallback {
    /// Canvas width
    pub const WIDTH: u32 = 1280;

    /// Canvas height
    pub const HEIGHT: u32 = 720;

    /// Gradient end color (bottom-right corner)
    pub const GRADIENT_END: [u8; 3] = [0x1F, 0x29, 0x37];

    /// Color used for categories missing from the palette
    pub const NEUTRAL_GRAY: [u8; 3] = [0x6B, 0x72, 0x80];

    /// Integer scale applied to the 8x8 glyphs for the site name
    pub const NAME_SCALE: u32 = 7;

    /// Integer scale applied to the 8x8 glyphs for the category label
    pub const LABEL_SCALE: u32 = 3;
}

/// Catalog ingestion rules
pub mod catalog {
    /// Names at or below this length never take part in containment dedup
    pub const MIN_FUZZY_NAME_LEN: usize = 3;

    /// Separator used when building slugs
    pub const SLUG_SEPARATOR: char = '-';

    /// Gallery and site-builder links that point at a listing, not the site
    pub const PLATFORM_LINK_PATTERNS: &[&str] = &[
        "land-book.com",
        "saaslandingpage.com",
        "onepagelove.com",
        "webflow.com/made-in-webflow",
        "webflow.com/@",
        "a1.gallery",
    ];

    /// Raw category substituted for a blank cell; never specific
    pub const UNCATEGORIZED: &str = "Uncategorized";

    /// Leading host labels longer than this are treated as guessed domains
    pub const MAX_HOST_LABEL_LEN: usize = 30;

    /// Leading host labels longer than this are checked for guessed patterns
    pub const SUSPECT_HOST_LABEL_LEN: usize = 25;

    /// A suspect label with more hyphens than this is a guessed domain
    pub const SUSPECT_MAX_HYPHENS: usize = 3;

    /// Name slugs longer than this are matched against suspect labels
    pub const SUSPECT_NAME_SLUG_LEN: usize = 15;

    /// Length of the name-slug prefix searched for in a suspect label
    pub const NAME_SLUG_PREFIX_LEN: usize = 20;
}

/// Quality score weights
pub mod score {
    /// Full-page artifact present
    pub const FULL_ARTIFACT: i32 = 40;

    /// Non-degenerate hero artifact present
    pub const HERO_ARTIFACT: i32 = 20;

    /// Absolute http(s) source URL
    pub const ABSOLUTE_URL: i32 = 5;

    /// Description longer than [`DESCRIPTION_MIN_LEN`]
    pub const DESCRIPTION: i32 = 5;

    /// Name longer than [`NAME_MIN_LEN`]
    pub const NAME: i32 = 5;

    pub const DESCRIPTION_MIN_LEN: usize = 20;
    pub const NAME_MIN_LEN: usize = 2;
}
