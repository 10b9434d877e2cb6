use url::Url;

use super::url_validator::ValidationError;

/// Turns loose user input into a well-formed absolute URL string.
///
/// Input that already begins with `http` is used as-is; anything else gets an
/// `https://` prefix. Either way the result must parse as an absolute URL.
/// The operation is idempotent: feeding the output back in returns it
/// unchanged.
///
/// Rejected before prefixing:
/// - empty or whitespace-only input
/// - a `://` separator with anything other than `http`/`https` in front of it
/// - truncated scheme forms (`http:/x`, `https:/x`) and bare trailing `://`
///
/// The WHATWG parser quietly repairs `http:/host` into `http://host`, which
/// is why the truncated forms must be caught here rather than left to the
/// parse step.
///
/// # Errors
///
/// All failure modes are [`ValidationError::InvalidFormat`]; the caller
/// cannot learn anything about the input from the error.
pub fn normalize(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidFormat);
    }

    if trimmed.ends_with("://") {
        return Err(ValidationError::InvalidFormat);
    }
    if trimmed.contains("://")
        && !trimmed.starts_with("http://")
        && !trimmed.starts_with("https://")
    {
        return Err(ValidationError::InvalidFormat);
    }
    if is_truncated_scheme(trimmed) {
        return Err(ValidationError::InvalidFormat);
    }

    let candidate = if trimmed.starts_with("http") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    Url::parse(&candidate).map_err(|_| ValidationError::InvalidFormat)?;
    Ok(candidate)
}

/// `http:/foo` or `https:/foo` — a scheme with one slash instead of two,
/// including the bare forms `http:` / `http:/`.
fn is_truncated_scheme(input: &str) -> bool {
    for scheme in ["http", "https"] {
        if let Some(rest) = input.strip_prefix(scheme) {
            if let Some(after_colon) = rest.strip_prefix(':') {
                if !after_colon.starts_with("//") {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bare_domain_gets_https_prefix() {
        assert_eq!(normalize("example.com").unwrap(), "https://example.com");
        assert_eq!(
            normalize("backlog.com/ja/blog/").unwrap(),
            "https://backlog.com/ja/blog/"
        );
    }

    #[test]
    fn test_existing_scheme_kept_as_is() {
        assert_eq!(
            normalize("http://example.com/feed").unwrap(),
            "http://example.com/feed"
        );
        assert_eq!(normalize("https://example.com").unwrap(), "https://example.com");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize("example.com").unwrap();
        let twice = normalize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        assert_eq!(normalize("  example.com \n").unwrap(), "https://example.com");
    }

    #[test]
    fn test_empty_and_whitespace_rejected() {
        assert!(normalize("").is_err());
        assert!(normalize("   ").is_err());
        assert!(normalize("\t\n").is_err());
    }

    #[test]
    fn test_foreign_scheme_rejected() {
        assert!(normalize("ftp://example.com").is_err());
        assert!(normalize("file:///etc/passwd").is_err());
        assert!(normalize("javascript://alert(1)").is_err());
    }

    #[test]
    fn test_truncated_scheme_rejected() {
        assert!(normalize("http:/example.com").is_err());
        assert!(normalize("https:/example.com").is_err());
        assert!(normalize("http:/").is_err());
        assert!(normalize("https:").is_err());
    }

    #[test]
    fn test_bare_scheme_separator_rejected() {
        assert!(normalize("http://").is_err());
        assert!(normalize("https://").is_err());
        assert!(normalize("://").is_err());
    }

    #[test]
    fn test_unparseable_after_prefixing_rejected() {
        // Prefixing produces "https://exa mple.com", which does not parse
        assert!(normalize("exa mple.com").is_err());
    }

    #[test]
    fn test_input_starting_with_http_but_not_a_url_rejected() {
        // Begins with "http" so no prefix is added, then fails to parse
        assert!(normalize("httpexample").is_err());
    }
}
