//! Wiki-History: revision history ingestion for Wikipedia articles
//!
//! This crate turns a user-supplied Wikipedia article URL into a validated request,
//! follows the Wikimedia revision-history cursor page by page, merges every page into a
//! single time-ordered collection and derives per-editor summaries and page statistics.

pub mod config;
pub mod history;
pub mod state;
pub mod stats;
pub mod url;

use thiserror::Error;

use crate::stats::CounterKind;
use crate::url::{LanguageCode, Project};

/// Example shown with every URL validation message
pub const URL_EXAMPLE: &str = "https://fr.wikipedia.org/wiki/Louvre";

/// Main error type for Wiki-History operations
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Url(#[from] UrlError),

    #[error("Wikimedia API error: {status} {status_text}")]
    RemoteApi { status: u16, status_text: String },

    #[error(
        "Authentication required (editor: {}, wiki: {})",
        .editor.as_deref().unwrap_or("unknown"),
        auth_scope(.project, .lang)
    )]
    AuthRequired {
        editor: Option<String>,
        project: Option<Project>,
        lang: Option<LanguageCode>,
    },

    #[error("Request aborted")]
    Aborted,

    #[error("Page statistics incomplete: {kind} counter failed: {source}")]
    StatisticsIncomplete {
        kind: CounterKind,
        #[source]
        source: Box<HistoryError>,
    },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

impl HistoryError {
    /// Returns true if the error should be shown to the user
    ///
    /// An abort is always requested by the caller (new submission, Ctrl-C),
    /// so it is not reported as a failure.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Aborted)
    }
}

fn auth_scope(project: &Option<Project>, lang: &Option<LanguageCode>) -> String {
    match (project, lang) {
        (Some(project), Some(lang)) => format!("{}.{}", lang, project),
        (Some(project), None) => project.to_string(),
        (None, Some(lang)) => lang.to_string(),
        (None, None) => "unknown".to_string(),
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while validating a Wikipedia article URL
///
/// The variants are checked in a fixed order (see [`url::parse_wikipedia_url`]),
/// so the first rule an input violates decides which one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Invalid URL: {0} - Example: {example}", example = URL_EXAMPLE)]
    Malformed(String),

    #[error("The URL must use HTTPS, got '{0}' - Example: {example}", example = URL_EXAMPLE)]
    InsecureScheme(String),

    #[error("The URL must be a valid Wikipedia domain, got '{0}' - Example: {example}", example = URL_EXAMPLE)]
    UnsupportedHost(String),

    #[error("The language code \"{0}\" is not supported - Example: {example}", example = URL_EXAMPLE)]
    UnsupportedLanguage(String),

    #[error("The URL must follow the format /wiki/<title>, got '{0}' - Example: {example}", example = URL_EXAMPLE)]
    BadPathShape(String),
}

/// Result type alias for Wiki-History operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL validation
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use history::{AbortHandle, AbortSignal, HistoryFetcher, PaginationDriver, PaginationOptions};
pub use state::{DataSettings, EditorSummary, Revision, RevisionAggregate, RevisionAggregateState};
pub use stats::{PageStatistics, StatisticsFetcher};
pub use url::{parse_wikipedia_url, RequestDescriptor};
