use std::fmt;

/// Terminal verdict of one address. Exactly one per result.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    InvalidSyntax,
    InvalidDomain,
    Deliverable,
    Undeliverable,
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidSyntax => "invalid_syntax",
            Self::InvalidDomain => "invalid_domain",
            Self::Deliverable => "deliverable",
            Self::Undeliverable => "undeliverable",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::InvalidSyntax | Self::InvalidDomain)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat verdict record. Field names are part of the external contract.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// Input as submitted.
    pub email: String,
    pub normalized_email: Option<String>,
    pub domain: Option<String>,
    pub is_valid_syntax: bool,
    /// Real MX records exist; the A/AAAA fallback does not count.
    pub domain_has_mx: bool,
    pub smtp_connectable: bool,
    pub is_deliverable: Option<bool>,
    pub is_catch_all: Option<bool>,
    pub is_disposable: bool,
    pub status: Status,
    pub reason: Option<String>,
    /// Host names actually attempted, in trial order.
    pub mx_hosts: Vec<String>,
    pub bounce_likely: Option<bool>,
    pub bounce_reason: Option<String>,
}

impl ValidationResult {
    /// Stand-in for a pipeline that panicked.
    pub fn internal_failure(email: &str) -> Self {
        Self {
            email: email.to_string(),
            normalized_email: None,
            domain: None,
            is_valid_syntax: false,
            domain_has_mx: false,
            smtp_connectable: false,
            is_deliverable: None,
            is_catch_all: None,
            is_disposable: false,
            status: Status::Unknown,
            reason: Some("internal_error".to_string()),
            mx_hosts: Vec::new(),
            bounce_likely: None,
            bounce_reason: Some("verification aborted by an internal error".to_string()),
        }
    }
}
