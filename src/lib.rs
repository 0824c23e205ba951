#![forbid(unsafe_code)]
//! mailprobe_lib: SMTP deliverability probing without sending mail.
//!
//! An address goes through normalisation, MX (or implicit A/AAAA) lookup, an
//! `EHLO`/`MAIL FROM`/`RCPT TO` dialogue against the candidate hosts, a
//! catch-all check and finally classification into a [`ValidationResult`].
//! [`Verifier`] runs that pipeline for one address, [`BulkRunner`] for many.

pub mod address;
pub mod bulk;
pub mod catch_all;
pub mod classifier;
pub mod disposable;
pub mod options;
pub mod resolver;
pub mod smtp;
pub mod verifier;

#[cfg(test)]
mod testing;

pub use address::{EmailAddress, NormalizeError, SyntaxIssue, normalize_address};
pub use bulk::{
    BulkError, BulkJob, BulkOutput, BulkReport, BulkRunner, Completed, ResultStream, Summary,
};
pub use catch_all::{CatchAllCache, detect_catch_all, synthetic_local_part};
pub use classifier::{Disposition, Findings, Status, ValidationResult, classify};
pub use disposable::DisposableDomains;
pub use options::{ConfigError, ProbeConfig, UnreachablePolicy};
pub use resolver::{DnsError, DnsLookup, MxHost, NoMailHost, ResolvedHosts, SystemDns, resolve_mail_hosts};
pub use smtp::{
    Connector, ErrorKind, ProbeRun, ProbeStage, SessionError, SmtpOutcome, SmtpReply, TcpConnector,
    TcpTransport, Transport, probe_candidates, probe_host,
};
pub use verifier::Verifier;
