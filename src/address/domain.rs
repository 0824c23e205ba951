use std::sync::LazyLock;

use regex::Regex;

use super::types::SyntaxIssue;

const MAX_DOMAIN_LEN: usize = 253;

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").expect("label pattern compiles")
});

/// Lower-cases and IDNA-encodes `domain`, then checks its labels.
pub(crate) fn to_ascii_domain(domain: &str) -> Result<String, SyntaxIssue> {
    let lower = domain.to_lowercase();
    if lower.is_empty() {
        return Err(SyntaxIssue::DomainTld);
    }
    let ascii = idna::domain_to_ascii(&lower).map_err(|_| SyntaxIssue::DomainIdna)?;
    if ascii.is_empty() {
        return Err(SyntaxIssue::DomainIdna);
    }
    if ascii.len() > MAX_DOMAIN_LEN {
        return Err(SyntaxIssue::DomainLength);
    }

    let labels: Vec<&str> = ascii.split('.').collect();
    if labels.len() < 2 {
        return Err(SyntaxIssue::DomainTld);
    }
    for label in &labels {
        if label.is_empty() || label.len() > 63 {
            return Err(SyntaxIssue::LabelLength);
        }
        if !LABEL.is_match(label) {
            return Err(SyntaxIssue::LabelChars);
        }
    }
    if labels.last().is_some_and(|tld| tld.len() < 2) {
        return Err(SyntaxIssue::TldLength);
    }
    Ok(ascii)
}
