use std::fmt;
use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Ports an outbound request may target. Anything else explicit is refused;
/// an absent port (scheme default) is always allowed.
const ALLOWED_PORTS: [u16; 4] = [80, 443, 8080, 8443];

/// Errors produced by URL validation.
///
/// The messages are deliberately generic category strings: they are surfaced
/// to API clients and must never echo the rejected hostname or path.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The URL string could not be parsed as an absolute URL.
    #[error("invalid URL format")]
    InvalidFormat,
    /// The URL uses a scheme other than http or https.
    #[error("only HTTP/HTTPS protocols supported")]
    SchemeNotPermitted,
    /// The URL points at localhost or a loopback address.
    #[error("localhost not permitted")]
    LoopbackNotPermitted,
    /// The URL points at a private, link-local, or otherwise special-use IP.
    #[error("private IP not permitted")]
    PrivateIpNotPermitted,
    /// The URL carries an explicit port outside the allowed set.
    #[error("port not permitted")]
    PortNotPermitted,
}

/// A URL that has passed SSRF validation.
///
/// The inner [`Url`] is private and the only constructor is [`validate_url`],
/// so holding a `TargetUrl` is proof the policy checks ran. Everything that
/// issues an outbound request takes `&TargetUrl`; there is no unvalidated
/// path to the network.
#[derive(Debug, Clone)]
pub struct TargetUrl(Url);

impl TargetUrl {
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Test-only escape hatch so module tests can aim the fetch client at a
    /// local mock server, which the validator would otherwise reject.
    #[cfg(test)]
    pub(crate) fn trusted_for_tests(url: Url) -> Self {
        Self(url)
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validates a URL string for use as an outbound request target.
///
/// Rules are applied in order; the first failure wins:
///
/// 1. Must parse as an absolute URL.
/// 2. Scheme must be exactly `http` or `https`.
/// 3. The host must not be `localhost`, a `127.*` literal, or an IPv6
///    loopback literal in any spelling.
/// 4. The host must not be a literal IP in a private or special-use range
///    (RFC 1918, link-local/metadata `169.254.0.0/16`, IPv6 unique-local
///    `fc00::/7` and link-local `fe80::/10`, unspecified addresses).
/// 5. An explicit port must be one of 80, 443, 8080, 8443.
///
/// Only the literal hostname is inspected — the address a name resolves to
/// at connection time is not re-checked, so DNS rebinding is not defended
/// here (documented limitation).
///
/// # Errors
///
/// Returns the [`ValidationError`] for the first rule the URL breaks.
pub fn validate_url(url_str: &str) -> Result<TargetUrl, ValidationError> {
    let url = Url::parse(url_str).map_err(|_| ValidationError::InvalidFormat)?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(ValidationError::SchemeNotPermitted),
    }

    let host = url
        .host_str()
        .ok_or(ValidationError::InvalidFormat)?
        .to_ascii_lowercase();

    // Strip brackets from IPv6 literals for parsing
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(&host);
    let literal_ip = host_for_parse.parse::<IpAddr>().ok();

    // Loopback: the name itself, the 127/8 string form (also catches
    // non-IP hosts like "127.evil.example"), and ::1 in any spelling.
    if host == "localhost" || host.starts_with("127.") {
        return Err(ValidationError::LoopbackNotPermitted);
    }
    if let Some(ip) = literal_ip {
        if ip.is_loopback() {
            return Err(ValidationError::LoopbackNotPermitted);
        }
        if is_private_ip(&ip) {
            return Err(ValidationError::PrivateIpNotPermitted);
        }
    }

    if let Some(port) = url.port() {
        if !ALLOWED_PORTS.contains(&port) {
            return Err(ValidationError::PortNotPermitted);
        }
    }

    Ok(TargetUrl(url))
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => ipv4.is_private() || ipv4.is_link_local() || ipv4.is_unspecified(),
        IpAddr::V6(ipv6) => {
            if ipv6.is_unspecified() {
                return true;
            }
            let segments = ipv6.segments();
            // Unique Local (fc00::/7)
            let is_unique_local = (segments[0] & 0xfe00) == 0xfc00;
            // Link-Local (fe80::/10)
            let is_link_local = (segments[0] & 0xffc0) == 0xfe80;
            is_unique_local || is_link_local
        }
    }
}
