//! URL helpers for the configured service address.

/// Normalize a base URL by removing trailing slashes
///
/// Endpoints are appended as path segments, so a trailing slash would
/// otherwise produce an empty segment.
///
/// # Examples
///
/// ```
/// use crewdesk::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://desk.example.com/api"), "https://desk.example.com/api");
/// assert_eq!(normalize_base_url("https://desk.example.com/api/"), "https://desk.example.com/api");
/// assert_eq!(normalize_base_url("https://desk.example.com/api///"), "https://desk.example.com/api");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Checks that a base URL is absolute http(s) before it is saved.
///
/// Returns the normalized form.
///
/// ```
/// use crewdesk::utils::url::validate_base_url;
///
/// assert_eq!(validate_base_url("http://localhost:8788/api/").unwrap(), "http://localhost:8788/api");
/// assert!(validate_base_url("desk.example.com/api").is_err());
/// ```
pub fn validate_base_url(base_url: &str) -> Result<String, String> {
    let normalized = normalize_base_url(base_url);
    let url = reqwest::Url::parse(&normalized)
        .map_err(|err| format!("'{normalized}' is not a valid URL: {err}"))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(normalized),
        scheme => Err(format!(
            "'{normalized}' must be an http(s) URL with a host (got scheme '{scheme}')"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://desk.example.com/api"),
            "https://desk.example.com/api"
        );
        assert_eq!(
            normalize_base_url("  https://desk.example.com/api/ "),
            "https://desk.example.com/api"
        );
        assert_eq!(
            normalize_base_url("https://desk.example.com/"),
            "https://desk.example.com"
        );
        assert_eq!(normalize_base_url(""), "");
    }

    #[test]
    fn test_validate_base_url() {
        assert_eq!(
            validate_base_url("https://desk.example.com/api/").as_deref(),
            Ok("https://desk.example.com/api")
        );
        assert!(validate_base_url("ftp://desk.example.com").is_err());
        assert!(validate_base_url("not a url").is_err());
        assert!(validate_base_url("").is_err());
    }
}
