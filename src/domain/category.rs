//! Macro-category taxonomy
//!
//! Free-text source categories are mapped into a small fixed set of labels by
//! an ordered rule table. The first matching rule wins, so the position of a
//! rule in [`CATEGORY_RULES`] decides ambiguous inputs: a site mentioning both
//! "ai" and "saas" is `AI`, never both.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::constants::fallback::NEUTRAL_GRAY;

/// Canonical grouping used for filtering and fallback coloring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MacroCategory {
    #[serde(rename = "AI Agent")]
    AiAgent,
    #[serde(rename = "AI")]
    Ai,
    #[serde(rename = "SaaS")]
    Saas,
    Fintech,
    #[serde(rename = "E-commerce")]
    Ecommerce,
    #[serde(rename = "Agency/Studio")]
    AgencyStudio,
    Portfolio,
    Developer,
    #[serde(rename = "Crypto/Web3")]
    CryptoWeb3,
    Health,
    Education,
    Template,
    Other,
}

impl MacroCategory {
    /// Every category in display order
    pub const ALL: [Self; 13] = [
        Self::Saas,
        Self::AgencyStudio,
        Self::Portfolio,
        Self::Fintech,
        Self::Ecommerce,
        Self::Developer,
        Self::Ai,
        Self::AiAgent,
        Self::CryptoWeb3,
        Self::Health,
        Self::Education,
        Self::Template,
        Self::Other,
    ];

    /// Human-readable label, identical to the serialized form
    pub const fn label(self) -> &'static str {
        match self {
            Self::AiAgent => "AI Agent",
            Self::Ai => "AI",
            Self::Saas => "SaaS",
            Self::Fintech => "Fintech",
            Self::Ecommerce => "E-commerce",
            Self::AgencyStudio => "Agency/Studio",
            Self::Portfolio => "Portfolio",
            Self::Developer => "Developer",
            Self::CryptoWeb3 => "Crypto/Web3",
            Self::Health => "Health",
            Self::Education => "Education",
            Self::Template => "Template",
            Self::Other => "Other",
        }
    }

    /// Parse a label produced by [`MacroCategory::label`]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label.trim())
    }

    /// Base color for fallback gradients
    pub const fn color(self) -> [u8; 3] {
        match self {
            Self::Saas => [0x4F, 0x46, 0xE5],
            Self::AgencyStudio => [0xEC, 0x48, 0x99],
            Self::Portfolio => [0x10, 0xB9, 0x81],
            Self::Fintech => [0x0D, 0x94, 0x88],
            Self::Ecommerce => [0xF5, 0x9E, 0x0B],
            Self::Developer => [0x8B, 0x5C, 0xF6],
            Self::Ai => [0x06, 0xB6, 0xD4],
            Self::AiAgent => [0xFF, 0x6B, 0x6B],
            Self::CryptoWeb3 => [0xF9, 0x73, 0x16],
            Self::Health => [0x84, 0xCC, 0x16],
            Self::Education => [0x25, 0x63, 0xEB],
            Self::Template => [0x9C, 0xA3, 0xAF],
            Self::Other => [0x64, 0x74, 0x8B],
        }
    }
}

impl fmt::Display for MacroCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Color for an arbitrary category label; unknown labels get neutral gray
pub fn color_for_label(label: &str) -> [u8; 3] {
    MacroCategory::from_label(label).map_or(NEUTRAL_GRAY, MacroCategory::color)
}

/// How a rule keyword is matched against the haystack
#[derive(Debug, Clone, Copy)]
pub enum Keyword {
    /// Plain substring match
    Substring(&'static str),
    /// Whole token match; tokens are split on non-alphanumerics
    Word(&'static str),
}

impl Keyword {
    fn matches(self, haystack: &str) -> bool {
        match self {
            Self::Substring(needle) => haystack.contains(needle),
            Self::Word(word) => haystack
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|token| token == word),
        }
    }
}

/// One classifier rule: any keyword hit assigns the category
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub category: MacroCategory,
    pub keywords: &'static [Keyword],
}

impl CategoryRule {
    fn matches(&self, haystack: &str) -> bool {
        self.keywords.iter().any(|k| k.matches(haystack))
    }
}

use Keyword::{Substring as S, Word as W};

/// Priority-ordered classifier rules. Order is significant.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: MacroCategory::AiAgent,
        keywords: &[S("ai tool / agents"), S("ai agent")],
    },
    CategoryRule {
        category: MacroCategory::Ai,
        keywords: &[W("ai")],
    },
    CategoryRule {
        category: MacroCategory::Saas,
        keywords: &[S("saas"), S("software"), S("tool"), S("platform")],
    },
    CategoryRule {
        category: MacroCategory::Fintech,
        keywords: &[S("fintech"), S("finance"), S("payments"), S("bank")],
    },
    CategoryRule {
        category: MacroCategory::Ecommerce,
        keywords: &[S("e-commerce"), S("ecommerce"), S("store"), S("shop")],
    },
    CategoryRule {
        category: MacroCategory::AgencyStudio,
        keywords: &[S("agency"), S("design studio"), S("studio"), S("creative")],
    },
    CategoryRule {
        category: MacroCategory::Portfolio,
        keywords: &[S("portfolio")],
    },
    CategoryRule {
        category: MacroCategory::Developer,
        keywords: &[S("devtool"), S("developer"), S("docs"), S("library")],
    },
    CategoryRule {
        category: MacroCategory::CryptoWeb3,
        keywords: &[S("crypto"), S("web3"), S("defi"), S("nft")],
    },
    CategoryRule {
        category: MacroCategory::Health,
        keywords: &[S("health"), S("wellness"), S("fitness"), S("medical")],
    },
    CategoryRule {
        category: MacroCategory::Education,
        keywords: &[S("education"), S("course")],
    },
    CategoryRule {
        category: MacroCategory::Template,
        keywords: &[S("template")],
    },
];

/// Classify an entry from its raw category, name and URL.
pub fn classify(raw_category: &str, name: &str, url: &str) -> MacroCategory {
    let haystack = format!("{raw_category} {name} {url}").to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|rule| rule.matches(&haystack))
        .map_or(MacroCategory::Other, |rule| rule.category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("SaaS Tool", "Acme", "https://acme.io", MacroCategory::Saas)]
    #[case("AI Tool / Agents", "Relay", "https://relay.app", MacroCategory::AiAgent)]
    #[case("AI SaaS", "Writer", "https://writer.com", MacroCategory::Ai)]
    #[case("Software", "Mailchimp", "https://mailchimp.com", MacroCategory::Saas)]
    #[case("", "Perplexity", "https://perplexity.ai", MacroCategory::Ai)]
    #[case("Payments", "Stripe", "https://stripe.com", MacroCategory::Fintech)]
    #[case("Crypto", "Uniswap", "https://uniswap.org", MacroCategory::CryptoWeb3)]
    #[case("Design Studio", "Locomotive", "https://locomotive.ca", MacroCategory::AgencyStudio)]
    #[case("Wellness", "Calm", "https://calm.com", MacroCategory::Health)]
    #[case("Online course", "Maven", "https://maven.com", MacroCategory::Education)]
    #[case("Uncategorized", "Domain Names", "https://example.org", MacroCategory::Other)]
    fn classifies_by_priority(
        #[case] category: &str,
        #[case] name: &str,
        #[case] url: &str,
        #[case] expected: MacroCategory,
    ) {
        assert_eq!(classify(category, name, url), expected);
    }

    #[test]
    fn ai_outranks_saas_for_ambiguous_input() {
        // both rules match; table order decides
        assert_eq!(classify("AI powered SaaS platform", "X", ""), MacroCategory::Ai);
        assert_eq!(classify("SaaS for fintech", "X", ""), MacroCategory::Saas);
    }

    #[test]
    fn word_match_ignores_embedded_letters() {
        assert!(!Keyword::Word("ai").matches("domain mail paint"));
        assert!(Keyword::Word("ai").matches("acme.ai"));
    }

    #[test]
    fn labels_round_trip_and_unknown_is_gray() {
        for category in MacroCategory::ALL {
            assert_eq!(MacroCategory::from_label(category.label()), Some(category));
        }
        assert_eq!(color_for_label("Space Tourism"), NEUTRAL_GRAY);
        assert_eq!(color_for_label("SaaS"), [0x4F, 0x46, 0xE5]);
    }

    #[test]
    fn serde_uses_display_labels() {
        let json = serde_json::to_string(&MacroCategory::CryptoWeb3).unwrap();
        assert_eq!(json, "\"Crypto/Web3\"");
    }
}
