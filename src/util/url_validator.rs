use std::net::IpAddr;

use thiserror::Error;
use url::{Host, Url};

/// Reasons a subscription URL is refused.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
    #[error("Private or loopback address not allowed: {0}")]
    PrivateAddress(String),
}

/// Validates a URL before it is accepted as a feed subscription.
///
/// Only `http` and `https` are fetched. Loopback, private, link-local and
/// unspecified addresses are refused (SSRF), as is the name `localhost`.
///
/// ```
/// use flurry::util::validate_url;
///
/// assert!(validate_url("https://example.com/feed.xml").is_ok());
/// assert!(validate_url("http://localhost/feed").is_err());
/// assert!(validate_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = validate_local_url(url_str)?;

    let blocked = match url.host() {
        None => return Err(UrlValidationError::MissingHost),
        Some(Host::Domain(name)) => name.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => is_internal(&IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => is_internal(&IpAddr::V6(ip)),
    };
    if blocked {
        let host = url.host_str().unwrap_or_default().to_owned();
        return Err(UrlValidationError::PrivateAddress(host));
    }

    Ok(url)
}

/// Like [`validate_url`] but lets loopback and private hosts through, for
/// feeds the user serves on their own machine or network.
///
/// ```
/// use flurry::util::validate_local_url;
///
/// assert!(validate_local_url("http://localhost:8080/feed").is_ok());
/// assert!(validate_local_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_local_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlValidationError::UnsupportedScheme(url.scheme().to_owned()));
    }
    if url.host().is_none() {
        return Err(UrlValidationError::MissingHost);
    }
    Ok(url)
}

fn is_internal(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00 // unique local fc00::/7
                || (first & 0xffc0) == 0xfe80 // link local fe80::/10
        }
    }
}
