//! Catalog of the content sources a scoring provider knows how to query.
//!
//! Each source maps to a query constructor understood by the provider
//! process, e.g. `google_news` → `GoogleNewsSource('acme')`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SentimyxError;

/// Source queried when the caller does not request any.
pub const DEFAULT_SOURCE: SourceKind = SourceKind::GoogleNews;

/// A known search backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    GoogleBlog,
    GoogleFinance,
    GoogleNews,
    /// Requires OAuth credentials forwarded to the provider.
    Twitter,
    YahooFinance,
    YahooInplay,
    YahooNews,
}

impl SourceKind {
    /// Stable identifier used on the command line, in config files and as
    /// the engine label in output tables.
    pub fn id(&self) -> &'static str {
        match self {
            Self::GoogleBlog => "google_blog",
            Self::GoogleFinance => "google_finance",
            Self::GoogleNews => "google_news",
            Self::Twitter => "twitter",
            Self::YahooFinance => "yahoo_finance",
            Self::YahooInplay => "yahoo_inplay",
            Self::YahooNews => "yahoo_news",
        }
    }

    /// Name of the provider-side constructor for this source.
    pub fn constructor(&self) -> &'static str {
        match self {
            Self::GoogleBlog => "GoogleBlogSearchSource",
            Self::GoogleFinance => "GoogleFinanceSource",
            Self::GoogleNews => "GoogleNewsSource",
            Self::Twitter => "TwitteRSource",
            Self::YahooFinance => "YahooFinanceSource",
            Self::YahooInplay => "YahooInplaySource",
            Self::YahooNews => "YahooNewsSource",
        }
    }

    pub fn requires_credentials(&self) -> bool {
        matches!(self, Self::Twitter)
    }

    /// Build the provider query expression for `term`.
    ///
    /// The term is embedded as a single-quoted literal; backslashes and
    /// single quotes are escaped.
    pub fn query_expression(&self, term: &str) -> String {
        let escaped = term.replace('\\', "\\\\").replace('\'', "\\'");
        format!("{}('{}')", self.constructor(), escaped)
    }

    pub fn all() -> &'static [SourceKind] {
        &[
            Self::GoogleBlog,
            Self::GoogleFinance,
            Self::GoogleNews,
            Self::Twitter,
            Self::YahooFinance,
            Self::YahooInplay,
            Self::YahooNews,
        ]
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SourceKind {
    type Err = SentimyxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::all().iter().map(|k| k.id()).collect();
                SentimyxError::Config(format!(
                    "unknown source '{s}' (known: {})",
                    known.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_through_from_str() {
        for kind in SourceKind::all() {
            assert_eq!(kind.id().parse::<SourceKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn test_unknown_source_lists_known_ids() {
        let err = "altavista".parse::<SourceKind>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("altavista"));
        assert!(msg.contains("google_news"));
    }

    #[test]
    fn test_query_expression() {
        assert_eq!(
            SourceKind::GoogleNews.query_expression("acme"),
            "GoogleNewsSource('acme')"
        );
        assert_eq!(
            SourceKind::YahooFinance.query_expression("O'Reilly"),
            "YahooFinanceSource('O\\'Reilly')"
        );
    }

    #[test]
    fn test_only_twitter_needs_credentials() {
        let needing: Vec<_> = SourceKind::all()
            .iter()
            .filter(|k| k.requires_credentials())
            .collect();
        assert_eq!(needing, vec![&SourceKind::Twitter]);
    }

    #[test]
    fn test_serde_uses_ids() {
        let json = serde_json::to_string(&SourceKind::YahooInplay).unwrap();
        assert_eq!(json, "\"yahoo_inplay\"");
    }
}
