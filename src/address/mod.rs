//! Address normalisation: split, trim, case-fold and IDNA-encode the domain,
//! then apply a permissive syntax check.

mod domain;
mod local;
mod types;

pub use types::{EmailAddress, NormalizeError, SyntaxIssue};

use domain::to_ascii_domain;
use local::check_local;

/// Parses `raw` into an [`EmailAddress`].
///
/// The input is split on the *last* `@` so that quoted local parts may
/// contain `@`. No network I/O is performed.
pub fn normalize_address(raw: &str) -> Result<EmailAddress, NormalizeError> {
    let input = raw.trim();
    let Some((local, domain)) = input.rsplit_once('@') else {
        return Err(NormalizeError::MissingAt);
    };
    let local = local.trim();
    let domain = domain.trim().to_lowercase();

    if input.chars().any(char::is_control) {
        return Err(invalid(local, &domain, SyntaxIssue::ControlChar));
    }
    check_local(local).map_err(|issue| invalid(local, &domain, issue))?;
    let ascii_domain = to_ascii_domain(&domain).map_err(|issue| invalid(local, &domain, issue))?;

    Ok(EmailAddress::new(raw, local, ascii_domain))
}

fn invalid(local: &str, domain: &str, issue: SyntaxIssue) -> NormalizeError {
    NormalizeError::InvalidFormat {
        local_part: local.to_string(),
        domain: domain.to_string(),
        issue,
    }
}
