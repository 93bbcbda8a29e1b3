// src/utils/url.rs

//! Delivery URL construction.
//!
//! Every file resolves to three URL shapes: the direct-origin (raw) URL, the
//! CDN mirror URL, and the proxy fallback wrapping the direct URL.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::models::RepoConfig;

/// Escapes everything except `/` and the unreserved characters, matching the
/// encoding the delivery hosts expect for repository paths.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Percent-encode a repository path, keeping `/` separators intact.
///
/// # Examples
/// ```
/// use textbook_scanner::utils::url::encode_path;
///
/// assert_eq!(encode_path("a b/c.pdf"), "a%20b/c.pdf");
/// ```
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_ENCODE_SET).to_string()
}

/// Builds the three delivery URLs for repository paths.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    direct_base: String,
    mirror_base: String,
    proxy_host: String,
}

impl UrlBuilder {
    pub fn new(repo: &RepoConfig) -> Self {
        Self {
            direct_base: format!(
                "{}/{}/{}/{}",
                repo.origin_host, repo.owner, repo.repo, repo.branch
            ),
            mirror_base: format!(
                "{}/gh/{}/{}@{}",
                repo.cdn_host, repo.owner, repo.repo, repo.branch
            ),
            proxy_host: repo.proxy_host.clone(),
        }
    }

    /// Direct-origin URL for a repository path.
    pub fn direct_url(&self, path: &str) -> String {
        format!("{}/{}", self.direct_base, encode_path(path))
    }

    /// CDN mirror URL for a repository path.
    pub fn mirror_url(&self, path: &str) -> String {
        format!("{}/{}", self.mirror_base, encode_path(path))
    }

    /// Proxy fallback URL: the proxy host prefixing the full direct URL.
    pub fn fallback_url(&self, path: &str) -> String {
        format!("{}/{}", self.proxy_host, self.direct_url(path))
    }
}
