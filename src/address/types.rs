use std::fmt;

use thiserror::Error;

/// A syntactically valid, normalised mailbox address.
///
/// The domain is always lower-case ASCII (IDNA encoded) and
/// `normalized_email` is always `local_part@domain`.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress {
    raw: String,
    normalized_email: String,
    local_part: String,
    domain: String,
}

impl EmailAddress {
    pub(crate) fn new(raw: &str, local_part: &str, ascii_domain: String) -> Self {
        Self {
            raw: raw.to_string(),
            normalized_email: format!("{local_part}@{ascii_domain}"),
            local_part: local_part.to_string(),
            domain: ascii_domain,
        }
    }

    /// The input exactly as submitted.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized_email(&self) -> &str {
        &self.normalized_email
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Same domain, different mailbox. Used to build catch-all probes.
    pub(crate) fn with_local_part(&self, local_part: &str) -> Self {
        Self::new(local_part, local_part, self.domain.clone())
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized_email)
    }
}

/// Detailed reason behind an `invalid_format` rejection.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxIssue {
    ControlChar,
    LocalLength,
    LocalDots,
    LocalChars,
    UnbalancedQuote,
    DomainIdna,
    DomainLength,
    DomainTld,
    LabelLength,
    LabelChars,
    TldLength,
}

impl SyntaxIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ControlChar => "control_char",
            Self::LocalLength => "local_length",
            Self::LocalDots => "local_dots",
            Self::LocalChars => "local_chars",
            Self::UnbalancedQuote => "unbalanced_quote",
            Self::DomainIdna => "domain_idna",
            Self::DomainLength => "domain_length",
            Self::DomainTld => "domain_tld",
            Self::LabelLength => "label_length",
            Self::LabelChars => "label_chars",
            Self::TldLength => "tld_length",
        }
    }
}

impl fmt::Display for SyntaxIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("address has no '@'")]
    MissingAt,
    #[error("invalid address format: {issue}")]
    InvalidFormat {
        local_part: String,
        domain: String,
        issue: SyntaxIssue,
    },
}

impl NormalizeError {
    /// Reason code reported in a [`ValidationResult`](crate::ValidationResult).
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingAt => "missing_at",
            Self::InvalidFormat { .. } => "invalid_format",
        }
    }
}
