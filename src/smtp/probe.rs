use crate::classifier::Disposition;
use crate::options::ProbeConfig;

use super::error::SessionError;
use super::session::SmtpSession;
use super::transport::{Connector, Transport};
use super::types::{ErrorKind, ProbeStage, SmtpOutcome};

/// Every `(host, port)` attempt made for one recipient, in trial order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeRun {
    pub attempts: Vec<SmtpOutcome>,
}

impl ProbeRun {
    /// At least one TCP connection succeeded.
    pub fn connected(&self) -> bool {
        self.attempts.iter().any(|a| a.connected)
    }

    /// Distinct host names in the order they were first attempted.
    pub fn hosts_tried(&self) -> Vec<String> {
        let mut hosts: Vec<String> = Vec::new();
        for attempt in &self.attempts {
            if !hosts.iter().any(|h| *h == attempt.host) {
                hosts.push(attempt.host.clone());
            }
        }
        hosts
    }

    /// Strongest disposition observed: accept, then hard reject, then
    /// temporary, then anything else. Earlier attempts win ties.
    pub fn best_disposition(&self) -> Option<Disposition> {
        self.attempts
            .iter()
            .filter_map(|a| a.rcpt_code)
            .map(Disposition::from_code)
            .fold(None, |best: Option<Disposition>, next| match best {
                Some(current) if current.rank() >= next.rank() => Some(current),
                _ => Some(next),
            })
    }
}

/// Runs one full dialogue against `host:port` and reports how far it got.
/// Never fails: connect and session errors are folded into the outcome.
pub fn probe_host<C>(
    connector: &C,
    host: &str,
    port: u16,
    config: &ProbeConfig,
    recipient: &str,
) -> SmtpOutcome
where
    C: Connector + ?Sized,
{
    let mut outcome = SmtpOutcome::new(host, port);
    let stream = match connector.connect(host, port, config.timeout()) {
        Ok(stream) => stream,
        Err(err) => {
            outcome.error_kind = ErrorKind::from_connect(&err);
            tracing::debug!(host, port, error = %err, "connect failed");
            return outcome;
        }
    };
    outcome.connected = true;

    let mut session = SmtpSession::new(stream, format!("{host}:{port}"), config.verbose);
    match converse(&mut session, host, config, recipient) {
        Ok(code) => {
            outcome.rcpt_code = Some(code);
            session.quit();
            outcome.stage = ProbeStage::Quit;
        }
        Err(err) => {
            outcome.stage = session.state().into();
            outcome.error_kind = err.kind();
            tracing::debug!(host, port, stage = ?outcome.stage, error = %err, "SMTP attempt aborted");
        }
    }
    outcome
}

fn converse<T: Transport>(
    session: &mut SmtpSession<T>,
    host: &str,
    config: &ProbeConfig,
    recipient: &str,
) -> Result<u16, SessionError> {
    session.read_banner()?;
    let ehlo = session.ehlo(&config.helo_name)?;
    if config.starttls && ehlo.has_capability("STARTTLS") {
        session.starttls(host, &config.helo_name)?;
    }
    session.mail_from(&config.from_address)?;
    Ok(session.rcpt_to(recipient)?.code)
}

/// Tries every host in order and, within a host, every configured port,
/// stopping at the first conclusive RCPT disposition.
pub fn probe_candidates<C>(
    connector: &C,
    hosts: &[String],
    config: &ProbeConfig,
    recipient: &str,
) -> ProbeRun
where
    C: Connector + ?Sized,
{
    let mut run = ProbeRun::default();
    for host in hosts {
        for &port in config.ports() {
            let outcome = probe_host(connector, host, port, config, recipient);
            let conclusive = outcome
                .rcpt_code
                .is_some_and(|code| Disposition::from_code(code).is_conclusive());
            run.attempts.push(outcome);
            if conclusive {
                return run;
            }
        }
    }
    run
}
