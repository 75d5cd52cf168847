use anyhow::{bail, Result};
use regex::Regex;
use url::Url;

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Normalize raw analyst input into a bare lowercase domain, or reject it.
/// Accepts full URLs, schemeless host/path strings, and bare domains.
/// Nothing that fails here ever reaches a collector or the engine.
pub fn normalize(input: &str) -> Result<String> {
    let trimmed = input.trim().to_lowercase();
    if trimmed.is_empty() {
        bail!("domain cannot be empty");
    }

    let host = if trimmed.contains("://") {
        match Url::parse(&trimmed) {
            Ok(url) => url
                .host_str()
                .map(|h| h.to_string())
                .unwrap_or_else(|| strip_path(&strip_scheme(&trimmed))),
            Err(_) => strip_path(&strip_scheme(&trimmed)),
        }
    } else {
        strip_path(&trimmed)
    };

    let domain = host.strip_prefix("www.").unwrap_or(&host).to_string();

    if domain.is_empty() {
        bail!("no domain found in '{input}'");
    }
    if domain.len() > MAX_DOMAIN_LEN {
        bail!("domain exceeds maximum length of {MAX_DOMAIN_LEN} characters");
    }
    if !domain.contains('.') {
        bail!("'{domain}' is not a valid domain name");
    }
    for label in domain.split('.') {
        if label.len() > MAX_LABEL_LEN {
            bail!("domain label '{label}' exceeds {MAX_LABEL_LEN} characters");
        }
    }

    let pattern = Regex::new(
        r"^(?:[a-z0-9](?:[a-z0-9\-]{0,61}[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9\-]{0,61}[a-z0-9])?$",
    )
    .expect("domain pattern is valid");
    if !pattern.is_match(&domain) {
        bail!("'{domain}' is not a valid domain name");
    }

    Ok(domain)
}

fn strip_scheme(input: &str) -> String {
    match input.split_once("://") {
        Some((_, rest)) => rest.to_string(),
        None => input.to_string(),
    }
}

fn strip_path(input: &str) -> String {
    input
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(input)
        .to_string()
}

/// Suffix of the domain including the leading dot, e.g. ".tk".
pub fn extract_suffix(domain: &str) -> Option<String> {
    let last = domain.rsplit('.').next()?;
    if last == domain {
        return None;
    }
    Some(format!(".{last}"))
}

/// True when any label uses the ASCII-compatible-encoding prefix.
pub fn is_punycode(domain: &str) -> bool {
    domain.split('.').any(|label| label.starts_with("xn--"))
}
