use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{DiscoverError, Result};

/// Bare domain syntax: label, hyphens allowed inside, alphabetic TLD.
/// No scheme, no path, no port.
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]{1,61}[a-zA-Z0-9]\.[a-zA-Z]{2,}$")
        .expect("domain regex is valid")
});

/// Trim and lowercase user-supplied domain input before validation.
pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Validate bare-domain syntax. This is the only hard failure in the
/// discovery pipeline and runs before any network request.
pub fn validate(domain: &str) -> Result<()> {
    if DOMAIN_RE.is_match(domain) {
        Ok(())
    } else {
        Err(DiscoverError::InvalidDomain(domain.to_string()))
    }
}

/// In-domain filter: admit a URL only when its hostname equals the target
/// domain or is a subdomain of it.
pub fn in_domain(url: &str, domain: &str) -> bool {
    if let Ok(parsed) = Url::parse(url)
        && let Some(host) = parsed.host_str()
    {
        return host == domain || host.ends_with(&format!(".{}", domain));
    }
    false
}
