use std::sync::OnceLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

use crate::url::{LanguageCode, RequestDescriptor};
use crate::{UrlError, UrlResult};

const WIKI_PATH_PREFIX: &str = "/wiki/";

/// `<lang>.wikipedia.org` or the mobile `<lang>.m.wikipedia.org`
fn host_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(\w+)(?:\.m)?\.wikipedia\.org$").expect("host pattern is valid")
    })
}

/// Parses a Wikipedia article URL into a request descriptor
///
/// # Validation Steps
///
/// The checks run in a fixed order and the first failing one wins:
///
/// 1. Parse as an absolute URL → [`UrlError::Malformed`]
/// 2. Scheme must be `https` → [`UrlError::InsecureScheme`]
/// 3. Host must be `<lang>(.m)?.wikipedia.org` → [`UrlError::UnsupportedHost`]
/// 4. `<lang>` must be a supported language → [`UrlError::UnsupportedLanguage`]
/// 5. Path must start with `/wiki/` → [`UrlError::BadPathShape`]
/// 6. Percent-decoded remainder must be non-empty → [`UrlError::BadPathShape`]
///
/// Query string and fragment are ignored. No network access happens here.
///
/// # Examples
///
/// ```
/// use wiki_history::url::{parse_wikipedia_url, LanguageCode};
///
/// let descriptor = parse_wikipedia_url("https://de.m.wikipedia.org/wiki/S%C3%A3o_Paulo?x=1#Top").unwrap();
/// assert_eq!(descriptor.lang, LanguageCode::De);
/// assert_eq!(descriptor.title, "São_Paulo");
/// ```
pub fn parse_wikipedia_url(input: &str) -> UrlResult<RequestDescriptor> {
    let url = Url::parse(input.trim()).map_err(|e| UrlError::Malformed(e.to_string()))?;

    if url.scheme() != "https" {
        return Err(UrlError::InsecureScheme(url.scheme().to_string()));
    }

    let host = url.host_str().unwrap_or_default();
    let captures = host_pattern()
        .captures(host)
        .ok_or_else(|| UrlError::UnsupportedHost(host.to_string()))?;
    let lang_token = captures[1].to_lowercase();

    let lang = LanguageCode::from_code(&lang_token)
        .ok_or_else(|| UrlError::UnsupportedLanguage(lang_token.clone()))?;

    let raw_title = url
        .path()
        .strip_prefix(WIKI_PATH_PREFIX)
        .ok_or_else(|| UrlError::BadPathShape(url.path().to_string()))?;

    let title = percent_decode_str(raw_title)
        .decode_utf8()
        .map_err(|_| UrlError::BadPathShape(url.path().to_string()))?;

    if title.is_empty() {
        return Err(UrlError::BadPathShape(url.path().to_string()));
    }

    Ok(RequestDescriptor::wikipedia(lang, title.into_owned()))
}
