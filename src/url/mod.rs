//! URL handling module for Wiki-History
//!
//! This module validates user-supplied article URLs and turns them into
//! [`RequestDescriptor`]s, the typed input of every network operation.

mod language;
mod parser;

use std::fmt;

pub use language::LanguageCode;
pub use parser::parse_wikipedia_url;

/// Wikimedia project an article belongs to (only Wikipedia is supported)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Project {
    Wikipedia,
}

impl Project {
    /// Returns the project name as used in Wikimedia API paths
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wikipedia => "wikipedia",
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated reference to one article's revision history
///
/// Produced by [`parse_wikipedia_url`]. The title is percent-decoded and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestDescriptor {
    pub project: Project,
    pub lang: LanguageCode,
    pub title: String,
}

impl RequestDescriptor {
    /// Creates a descriptor for a Wikipedia article
    pub fn wikipedia(lang: LanguageCode, title: impl Into<String>) -> Self {
        Self {
            project: Project::Wikipedia,
            lang,
            title: title.into(),
        }
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{}", self.lang, self.project, self.title)
    }
}
