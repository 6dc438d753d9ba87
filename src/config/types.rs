use serde::Deserialize;

/// Main configuration structure for Wiki-History
///
/// Every section is optional; missing sections and keys fall back to their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub pagination: PaginationConfig,
    pub filters: FilterConfig,
}

/// Wikimedia API endpoint configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the Wikimedia REST API
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.wikimedia.org".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Client identification sent with every request
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the client
    #[serde(rename = "client-name")]
    pub client_name: String,

    /// Version of the client
    #[serde(rename = "client-version")]
    pub client_version: String,

    /// Email address for API-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the identification string: `Name/Version (email)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} ({})",
            self.client_name, self.client_version, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            client_name: "WikiHistory".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_email: "wiki-history@example.org".to_string(),
        }
    }
}

/// Pagination behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Maximum number of pages fetched per driver run
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Pause between two page requests (milliseconds)
    #[serde(rename = "inter-page-delay")]
    pub inter_page_delay: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            inter_page_delay: 250,
        }
    }
}

/// Initial display filter settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    #[serde(rename = "allow-minors")]
    pub allow_minors: bool,

    #[serde(rename = "allow-unknown-editors")]
    pub allow_unknown_editors: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allow_minors: true,
            allow_unknown_editors: true,
        }
    }
}
