use super::*;
use crate::address::normalize_address;
use crate::smtp::{ErrorKind, ProbeStage, SmtpOutcome};

fn attempt(host: &str, code: Option<u16>) -> SmtpOutcome {
    SmtpOutcome {
        host: host.to_string(),
        port: 25,
        connected: true,
        rcpt_code: code,
        stage: if code.is_some() { ProbeStage::Quit } else { ProbeStage::Banner },
        error_kind: if code.is_some() { ErrorKind::None } else { ErrorKind::Protocol },
    }
}

fn refused(host: &str) -> SmtpOutcome {
    SmtpOutcome {
        connected: false,
        stage: ProbeStage::Connect,
        error_kind: ErrorKind::Refused,
        ..attempt(host, None)
    }
}

fn probed(raw: &str, attempts: Vec<SmtpOutcome>, catch_all: Option<bool>) -> ValidationResult {
    probed_with(raw, attempts, catch_all, UnreachablePolicy::Unknown)
}

fn probed_with(
    raw: &str,
    attempts: Vec<SmtpOutcome>,
    catch_all: Option<bool>,
    policy: UnreachablePolicy,
) -> ValidationResult {
    let address = normalize_address(raw).unwrap();
    let run = ProbeRun { attempts };
    classify(
        raw,
        Findings::Probed {
            address: &address,
            domain_has_mx: true,
            run: &run,
            catch_all,
        },
        &DisposableDomains::builtin(),
        policy,
    )
}

#[test]
fn missing_at_is_invalid_syntax() {
    let err = normalize_address("not-an-email").unwrap_err();
    let result = classify(
        "not-an-email",
        Findings::Malformed(&err),
        &DisposableDomains::builtin(),
        UnreachablePolicy::Unknown,
    );
    assert_eq!(result.status, Status::InvalidSyntax);
    assert_eq!(result.reason.as_deref(), Some("missing_at"));
    assert_eq!(result.is_deliverable, Some(false));
    assert_eq!(result.normalized_email, None);
    assert_eq!(result.bounce_likely, None);
    assert!(result.bounce_reason.is_some());
}

#[test]
fn syntax_issue_is_surfaced_in_bounce_reason() {
    let err = normalize_address("a..b@mailinator.com").unwrap_err();
    let result = classify(
        "a..b@mailinator.com",
        Findings::Malformed(&err),
        &DisposableDomains::builtin(),
        UnreachablePolicy::Unknown,
    );
    assert_eq!(result.reason.as_deref(), Some("invalid_format"));
    assert!(result.bounce_reason.unwrap().contains("local_dots"));
    assert_eq!(result.domain.as_deref(), Some("mailinator.com"));
    assert!(result.is_disposable);
}

#[test]
fn no_mail_host_is_invalid_domain() {
    let address = normalize_address("user@nowhere.test").unwrap();
    let error = NoMailHost {
        domain: "nowhere.test".to_string(),
    };
    let result = classify(
        "user@nowhere.test",
        Findings::NoMailHost {
            address: &address,
            error: &error,
        },
        &DisposableDomains::builtin(),
        UnreachablePolicy::Unknown,
    );
    assert_eq!(result.status, Status::InvalidDomain);
    assert_eq!(result.reason.as_deref(), Some("no_mx_no_a"));
    assert_eq!(result.is_deliverable, Some(false));
    assert!(result.is_valid_syntax);
    assert!(result.mx_hosts.is_empty());
}

#[test]
fn accept_is_deliverable_with_low_bounce_risk() {
    let result = probed("user@example.com", vec![attempt("mx1.example.com", Some(250))], Some(false));
    assert_eq!(result.status, Status::Deliverable);
    assert_eq!(result.is_deliverable, Some(true));
    assert_eq!(result.reason, None);
    assert_eq!(result.bounce_likely, Some(false));
    assert_eq!(result.bounce_reason, None);
}

#[test]
fn catch_all_accept_leaves_bounce_unknown() {
    let result = probed("user@example.com", vec![attempt("mx1.example.com", Some(250))], Some(true));
    assert_eq!(result.status, Status::Deliverable);
    assert_eq!(result.is_catch_all, Some(true));
    assert_eq!(result.reason.as_deref(), Some("accepts_all"));
    assert_eq!(result.bounce_likely, None);
    assert!(result.bounce_reason.is_some());
}

#[test]
fn hard_reject_reports_code() {
    let result = probed("user@example.com", vec![attempt("mx1.example.com", Some(550))], None);
    assert_eq!(result.status, Status::Undeliverable);
    assert_eq!(result.reason.as_deref(), Some("rcpt_550"));
    assert_eq!(result.bounce_likely, Some(true));
}

#[test]
fn temporary_codes_stay_unknown() {
    let result = probed(
        "user@example.com",
        vec![attempt("mx1.example.com", Some(451)), attempt("mx2.example.com", Some(452))],
        None,
    );
    assert_eq!(result.status, Status::Unknown);
    assert_eq!(result.reason.as_deref(), Some("temp_451"));
    assert_eq!(result.is_deliverable, None);
    assert_eq!(result.mx_hosts, vec!["mx1.example.com", "mx2.example.com"]);
}

#[test]
fn later_accept_beats_earlier_temporary() {
    let result = probed(
        "user@example.com",
        vec![attempt("mx1.example.com", Some(421)), attempt("mx2.example.com", Some(250))],
        None,
    );
    assert_eq!(result.status, Status::Deliverable);
}

#[test]
fn inconclusive_code_is_reported_verbatim() {
    let result = probed("user@example.com", vec![attempt("mx1.example.com", Some(252))], None);
    assert_eq!(result.status, Status::Unknown);
    assert_eq!(result.reason.as_deref(), Some("rcpt_252"));
}

#[test]
fn unreachable_follows_policy() {
    let attempts = vec![refused("mx1.example.com"), refused("mx2.example.com")];
    let unknown = probed("user@example.com", attempts.clone(), None);
    assert_eq!(unknown.status, Status::Unknown);
    assert_eq!(unknown.reason.as_deref(), Some("smtp_unreachable"));
    assert!(!unknown.smtp_connectable);

    let assumed = probed_with(
        "user@example.com",
        attempts,
        None,
        UnreachablePolicy::AssumeDeliverable,
    );
    assert_eq!(assumed.status, Status::Deliverable);
    assert_eq!(assumed.reason.as_deref(), Some("assumed_deliverable"));
    assert_eq!(assumed.is_deliverable, None);
    assert_eq!(assumed.bounce_likely, None);
}

#[test]
fn connected_without_rcpt_reply_is_protocol_error() {
    let result = probed("user@example.com", vec![attempt("mx1.example.com", None)], None);
    assert!(result.smtp_connectable);
    assert_eq!(result.status, Status::Unknown);
    assert_eq!(result.reason.as_deref(), Some("smtp_protocol_error"));
}

#[test]
fn disposable_flag_is_independent_of_status() {
    let result = probed("temp@mailinator.com", vec![attempt("mx.mailinator.com", Some(250))], None);
    assert!(result.is_disposable);
    assert_eq!(result.status, Status::Deliverable);
}

#[cfg(feature = "with-serde")]
#[test]
fn json_shape_is_stable() {
    let result = probed("User@Example.com", vec![attempt("mx1.example.com", Some(250))], Some(false));
    insta::assert_snapshot!(serde_json::to_string_pretty(&result).unwrap(), @r#"
    {
      "email": "User@Example.com",
      "normalized_email": "User@example.com",
      "domain": "example.com",
      "is_valid_syntax": true,
      "domain_has_mx": true,
      "smtp_connectable": true,
      "is_deliverable": true,
      "is_catch_all": false,
      "is_disposable": false,
      "status": "deliverable",
      "reason": null,
      "mx_hosts": [
        "mx1.example.com"
      ],
      "bounce_likely": false,
      "bounce_reason": null
    }
    "#);
}
