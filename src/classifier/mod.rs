//! Turns pipeline findings into the final [`ValidationResult`].

mod disposition;
mod types;

pub use disposition::Disposition;
pub use types::{Status, ValidationResult};

use crate::address::{EmailAddress, NormalizeError};
use crate::disposable::DisposableDomains;
use crate::options::UnreachablePolicy;
use crate::resolver::NoMailHost;
use crate::smtp::ProbeRun;

/// What the pipeline learned about one address before classification.
#[derive(Debug)]
pub enum Findings<'a> {
    Malformed(&'a NormalizeError),
    NoMailHost {
        address: &'a EmailAddress,
        error: &'a NoMailHost,
    },
    Probed {
        address: &'a EmailAddress,
        domain_has_mx: bool,
        run: &'a ProbeRun,
        catch_all: Option<bool>,
    },
}

struct Verdict {
    status: Status,
    is_deliverable: Option<bool>,
    reason: Option<String>,
    bounce_likely: Option<bool>,
    bounce_reason: Option<String>,
}

impl Verdict {
    fn new(status: Status, is_deliverable: Option<bool>, reason: Option<String>) -> Self {
        let bounce_likely = match status {
            Status::Undeliverable => Some(true),
            Status::Deliverable if is_deliverable == Some(true) => Some(false),
            _ => None,
        };
        Self {
            status,
            is_deliverable,
            reason,
            bounce_likely,
            bounce_reason: None,
        }
    }

    /// An accept-all server cannot tell real mailboxes apart.
    fn unconfirmed(mut self) -> Self {
        self.bounce_likely = None;
        self
    }

    fn explained(mut self, why: impl Into<String>) -> Self {
        self.bounce_reason = Some(why.into());
        self
    }
}

/// Pure and deterministic: the same findings always give the same result.
pub fn classify(
    raw: &str,
    findings: Findings<'_>,
    disposable: &DisposableDomains,
    policy: UnreachablePolicy,
) -> ValidationResult {
    match findings {
        Findings::Malformed(err) => malformed(raw, err, disposable),
        Findings::NoMailHost { address, error } => {
            let verdict = Verdict::new(
                Status::InvalidDomain,
                Some(false),
                Some(error.reason().to_string()),
            )
            .explained(error.to_string());
            build(raw, address, disposable, verdict, false, false, Vec::new(), None)
        }
        Findings::Probed {
            address,
            domain_has_mx,
            run,
            catch_all,
        } => {
            let connected = run.connected();
            let verdict = probed_verdict(run, connected, catch_all, policy);
            build(
                raw,
                address,
                disposable,
                verdict,
                domain_has_mx,
                connected,
                run.hosts_tried(),
                catch_all,
            )
        }
    }
}

fn probed_verdict(
    run: &ProbeRun,
    connected: bool,
    catch_all: Option<bool>,
    policy: UnreachablePolicy,
) -> Verdict {
    match run.best_disposition() {
        Some(Disposition::Accepted(_)) if catch_all == Some(true) => {
            Verdict::new(Status::Deliverable, Some(true), Some("accepts_all".to_string()))
                .unconfirmed()
                .explained("domain accepts any recipient, mailbox existence unconfirmed")
        }
        Some(Disposition::Accepted(_)) => Verdict::new(Status::Deliverable, Some(true), None),
        Some(Disposition::HardReject(code)) => Verdict::new(
            Status::Undeliverable,
            Some(false),
            Some(format!("rcpt_{code}")),
        )
        .explained(format!("recipient rejected with {code}")),
        Some(Disposition::Temporary(code)) => {
            Verdict::new(Status::Unknown, None, Some(format!("temp_{code}")))
                .explained(format!("temporary failure {code}, possibly greylisting"))
        }
        Some(Disposition::Inconclusive(code)) => {
            Verdict::new(Status::Unknown, None, Some(format!("rcpt_{code}")))
                .explained(format!("inconclusive RCPT reply {code}"))
        }
        None if !connected => match policy {
            UnreachablePolicy::Unknown => {
                Verdict::new(Status::Unknown, None, Some("smtp_unreachable".to_string()))
                    .explained("no mail host could be reached")
            }
            UnreachablePolicy::AssumeDeliverable => Verdict::new(
                Status::Deliverable,
                None,
                Some("assumed_deliverable".to_string()),
            )
            .explained("no mail host could be reached, deliverability assumed"),
        },
        None => Verdict::new(Status::Unknown, None, Some("smtp_protocol_error".to_string()))
            .explained("mail host reached but no RCPT reply obtained"),
    }
}

fn malformed(raw: &str, err: &NormalizeError, disposable: &DisposableDomains) -> ValidationResult {
    let (normalized_email, domain) = match err {
        NormalizeError::MissingAt => (None, None),
        NormalizeError::InvalidFormat {
            local_part, domain, ..
        } => (Some(format!("{local_part}@{domain}")), Some(domain.clone())),
    };
    let verdict = Verdict::new(Status::InvalidSyntax, Some(false), Some(err.reason().to_string()))
        .explained(err.to_string());
    ValidationResult {
        email: raw.to_string(),
        is_disposable: domain.as_deref().is_some_and(|d| disposable.contains(d)),
        normalized_email,
        domain,
        is_valid_syntax: false,
        domain_has_mx: false,
        smtp_connectable: false,
        is_deliverable: verdict.is_deliverable,
        is_catch_all: None,
        status: verdict.status,
        reason: verdict.reason,
        mx_hosts: Vec::new(),
        bounce_likely: verdict.bounce_likely,
        bounce_reason: verdict.bounce_reason,
    }
}

#[allow(clippy::too_many_arguments)]
fn build(
    raw: &str,
    address: &EmailAddress,
    disposable: &DisposableDomains,
    verdict: Verdict,
    domain_has_mx: bool,
    smtp_connectable: bool,
    mx_hosts: Vec<String>,
    is_catch_all: Option<bool>,
) -> ValidationResult {
    ValidationResult {
        email: raw.to_string(),
        normalized_email: Some(address.normalized_email().to_string()),
        domain: Some(address.domain().to_string()),
        is_valid_syntax: true,
        domain_has_mx,
        smtp_connectable,
        is_deliverable: verdict.is_deliverable,
        is_catch_all,
        is_disposable: disposable.contains(address.domain()),
        status: verdict.status,
        reason: verdict.reason,
        mx_hosts,
        bounce_likely: verdict.bounce_likely,
        bounce_reason: verdict.bounce_reason,
    }
}

#[cfg(test)]
mod tests;
