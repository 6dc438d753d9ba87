//! HTTP access to the Wikimedia REST API
//!
//! This module handles every request the crate makes, including:
//! - Building the HTTP client with the identifying headers
//! - Attaching the bearer token when one is supplied
//! - Racing requests against the abort signal
//! - Mapping HTTP statuses and malformed bodies to [`HistoryError`]s

use crate::config::Config;
use crate::history::AbortSignal;
use crate::url::RequestDescriptor;
use crate::{ConfigError, HistoryError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Header carrying the client identification string
pub const API_USER_AGENT_HEADER: &str = "api-user-agent";

/// Builds an HTTP client with the identifying headers of the configuration
///
/// Every request carries `Accept: application/json` and
/// `Api-User-Agent: Name/Version (email)`; the same string is the user agent.
///
/// # Errors
///
/// Fails with [`ConfigError::Validation`] if the identification string cannot be sent
/// as a header value.
///
/// # Example
///
/// ```
/// use wiki_history::config::Config;
/// use wiki_history::history::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client> {
    let identification = config.user_agent.header_value();
    let identification = HeaderValue::from_str(&identification).map_err(|_| {
        ConfigError::Validation(format!(
            "client identification {:?} is not a valid header value",
            identification
        ))
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(API_USER_AGENT_HEADER, identification.clone());

    Client::builder()
        .user_agent(identification)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.api.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(|source| HistoryError::Http {
            url: config.api.base_url.clone(),
            source,
        })
}

/// Wikimedia REST API client shared by the history and statistics fetchers
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Creates a client from the configuration
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.api.base_url)?;
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, base_url))
    }

    /// Wraps an already configured HTTP client
    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            token: None,
        }
    }

    /// Sets the bearer token
    ///
    /// The token is only sent to the origin of the base URL, never to cursors that
    /// point elsewhere.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns true if `url` shares scheme, host and port with the base URL
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.base_url.origin()
    }

    /// Builds `<base>/core/v1/<project>/<lang>/page/<title>/<tail...>`
    ///
    /// The title is pushed as a single path segment, so `/`, `?` and spaces are
    /// percent-encoded.
    pub fn page_endpoint(&self, descriptor: &RequestDescriptor, tail: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| HistoryError::UrlParse(url::ParseError::RelativeUrlWithoutBase))?;
            segments.pop_if_empty().extend([
                "core",
                "v1",
                descriptor.project.as_str(),
                descriptor.lang.as_str(),
                "page",
                descriptor.title.as_str(),
            ]);
            segments.extend(tail);
        }
        Ok(url)
    }

    /// GETs `url` and deserializes the JSON body
    ///
    /// Fails fast with [`HistoryError::Aborted`] if the signal already fired, and
    /// drops the in-flight request if it fires while waiting.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        descriptor: &RequestDescriptor,
        abort: &AbortSignal,
    ) -> Result<T> {
        if abort.is_aborted() {
            return Err(HistoryError::Aborted);
        }

        tokio::select! {
            biased;
            _ = abort.aborted() => {
                tracing::debug!("Request to {} aborted", url);
                Err(HistoryError::Aborted)
            }
            result = self.send(url, descriptor) => result,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        url: &str,
        descriptor: &RequestDescriptor,
    ) -> Result<T> {
        tracing::debug!("GET {}", url);

        let target = Url::parse(url)?;
        let mut request = self.client.get(target.clone());
        if let Some(token) = &self.token {
            if self.is_same_origin(&target) {
                request = request.bearer_auth(token);
            } else {
                tracing::debug!(
                    "Not sending the access token to {}",
                    target.origin().ascii_serialization()
                );
            }
        }

        let response = request.send().await.map_err(|source| HistoryError::Http {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        tracing::debug!("{} -> {}", url, status);

        if status == StatusCode::UNAUTHORIZED {
            return Err(HistoryError::AuthRequired {
                editor: None,
                project: Some(descriptor.project),
                lang: Some(descriptor.lang),
            });
        }

        if !status.is_success() {
            return Err(HistoryError::RemoteApi {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let body = response.text().await.map_err(|source| HistoryError::Http {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_str(&body).map_err(|e| HistoryError::RemoteApi {
            status: status.as_u16(),
            status_text: format!("malformed response body: {}", e),
        })
    }
}
