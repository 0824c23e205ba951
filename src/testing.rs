//! Test doubles shared by the module tests: a scripted resolver, an
//! in-memory SMTP peer and a connector that hands those peers out per host.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};

use crate::resolver::{DnsLookup, MxHost};
use crate::smtp::{Connector, Transport};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub(crate) struct StubDns {
    mx: HashMap<String, Vec<MxHost>>,
    ips: HashMap<String, Vec<IpAddr>>,
    timeouts: Vec<String>,
    mx_calls: AtomicUsize,
    ip_calls: AtomicUsize,
}

impl StubDns {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_mx(mut self, domain: &str, hosts: &[(&str, u16)]) -> Self {
        self.mx.insert(
            domain.to_string(),
            hosts.iter().map(|(h, p)| MxHost::new(*h, *p)).collect(),
        );
        self
    }

    pub(crate) fn with_ip(mut self, domain: &str, ip: &str) -> Self {
        let addr: IpAddr = ip.parse().unwrap();
        self.ips.entry(domain.to_string()).or_default().push(addr);
        self
    }

    pub(crate) fn timing_out(mut self, domain: &str) -> Self {
        self.timeouts.push(domain.to_string());
        self
    }

    pub(crate) fn mx_calls(&self) -> usize {
        self.mx_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn ip_calls(&self) -> usize {
        self.ip_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> usize {
        self.mx_calls() + self.ip_calls()
    }

    fn answer<T: Clone>(
        &self,
        table: &HashMap<String, Vec<T>>,
        domain: &str,
    ) -> Result<Vec<T>, ResolveError> {
        if self.timeouts.iter().any(|d| d == domain) {
            return Err(ResolveErrorKind::Timeout.into());
        }
        match table.get(domain) {
            Some(records) => Ok(records.clone()),
            None => Err(ResolveError::from("no records found")),
        }
    }
}

impl DnsLookup for StubDns {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxHost>, ResolveError> {
        self.mx_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(&self.mx, domain)
    }

    fn lookup_ip(&self, domain: &str) -> Result<Vec<IpAddr>, ResolveError> {
        self.ip_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(&self.ips, domain)
    }
}

/// Maps one client command line to the raw reply bytes.
pub(crate) type Responder = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Answers every RCPT with `code(recipient)` and every other command with a
/// plausible 2xx reply.
pub(crate) fn rcpt_server(code: impl Fn(&str) -> u16 + Send + Sync + 'static) -> Responder {
    Arc::new(move |command: &str| {
        let upper = command.to_ascii_uppercase();
        if upper.starts_with("EHLO") {
            "250-mock.smtp.test\r\n250-SIZE 35882577\r\n250 8BITMIME\r\n".to_string()
        } else if upper.starts_with("HELO") || upper.starts_with("MAIL FROM") {
            "250 OK\r\n".to_string()
        } else if let Some(rest) = upper.strip_prefix("RCPT TO:<") {
            let recipient = rest.trim_end_matches('>').to_ascii_lowercase();
            match code(&recipient) {
                250 => "250 2.1.5 OK\r\n".to_string(),
                other => format!("{other} mailbox status\r\n"),
            }
        } else if upper == "STARTTLS" {
            "220 2.0.0 ready to start TLS\r\n".to_string()
        } else if upper == "QUIT" {
            "221 bye\r\n".to_string()
        } else {
            "502 unrecognized\r\n".to_string()
        }
    })
}

/// Accepts exactly `accepted`, rejects everyone else with 550.
pub(crate) fn mailbox_server(accepted: &[&str]) -> Responder {
    let accepted: Vec<String> = accepted.iter().map(|a| a.to_ascii_lowercase()).collect();
    rcpt_server(move |rcpt| {
        if accepted.iter().any(|a| a == rcpt) {
            250
        } else {
            550
        }
    })
}

/// Wraps `inner` so its EHLO reply also advertises `STARTTLS`.
pub(crate) fn with_starttls(inner: Responder) -> Responder {
    Arc::new(move |command: &str| {
        if command.to_ascii_uppercase().starts_with("EHLO") {
            "250-mock.smtp.test\r\n250-STARTTLS\r\n250 8BITMIME\r\n".to_string()
        } else {
            inner(command)
        }
    })
}

#[derive(Default)]
struct Wire {
    outgoing: Vec<u8>,
    incoming: Vec<u8>,
    commands: Vec<String>,
    closed: bool,
    tls: bool,
    tls_fails: bool,
}

/// In-memory SMTP peer. Clones share the same wire so a test can keep a
/// handle after the session took ownership.
#[derive(Clone)]
pub(crate) struct MemoryTransport {
    wire: Arc<Mutex<Wire>>,
    responder: Responder,
}

impl MemoryTransport {
    pub(crate) fn new(greeting: &str, responder: Responder) -> Self {
        let wire = Wire {
            outgoing: greeting.as_bytes().to_vec(),
            ..Wire::default()
        };
        Self {
            wire: Arc::new(Mutex::new(wire)),
            responder,
        }
    }

    pub(crate) fn clone_handle(&self) -> Self {
        self.clone()
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        lock(&self.wire).commands.clone()
    }

    pub(crate) fn is_closed(&self) -> bool {
        lock(&self.wire).closed
    }

    /// Makes every later TLS handshake fail.
    pub(crate) fn failing_tls(self) -> Self {
        lock(&self.wire).tls_fails = true;
        self
    }

    pub(crate) fn is_tls(&self) -> bool {
        lock(&self.wire).tls
    }
}

impl Read for MemoryTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut wire = lock(&self.wire);
        let n = buf.len().min(wire.outgoing.len());
        buf[..n].copy_from_slice(&wire.outgoing[..n]);
        wire.outgoing.drain(..n);
        Ok(n)
    }
}

impl Write for MemoryTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut wire = lock(&self.wire);
        if wire.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        }
        wire.incoming.extend_from_slice(buf);
        while let Some(pos) = wire.incoming.windows(2).position(|w| w == b"\r\n") {
            let line: Vec<u8> = wire.incoming.drain(..pos + 2).collect();
            let command = String::from_utf8_lossy(&line[..pos]).into_owned();
            let reply = (self.responder)(&command);
            wire.outgoing.extend_from_slice(reply.as_bytes());
            wire.commands.push(command);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn close(&mut self) -> io::Result<()> {
        lock(&self.wire).closed = true;
        Ok(())
    }

    fn supports_tls(&self) -> bool {
        true
    }

    fn start_tls(&mut self, _server_name: &str) -> io::Result<()> {
        let mut wire = lock(&self.wire);
        if wire.tls_fails {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "handshake failed"));
        }
        wire.tls = true;
        Ok(())
    }
}

#[derive(Clone)]
pub(crate) enum HostBehaviour {
    Refuse,
    Timeout,
    Serve {
        greeting: String,
        responder: Responder,
        delay: Duration,
    },
}

const GREETING: &str = "220 mock.smtp.test ESMTP\r\n";

impl HostBehaviour {
    pub(crate) fn serve(responder: Responder) -> Self {
        Self::delayed(responder, Duration::ZERO)
    }

    pub(crate) fn delayed(responder: Responder, delay: Duration) -> Self {
        Self::Serve {
            greeting: GREETING.to_string(),
            responder,
            delay,
        }
    }
}

/// Connector whose peers are looked up by `host:port`, then by `host`.
/// Unknown hosts refuse the connection.
#[derive(Default)]
pub(crate) struct ScriptedConnector {
    behaviours: HashMap<String, HostBehaviour>,
    connects: Mutex<Vec<(String, u16)>>,
    transports: Mutex<Vec<MemoryTransport>>,
}

impl ScriptedConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn host(mut self, host: &str, behaviour: HostBehaviour) -> Self {
        self.behaviours.insert(host.to_string(), behaviour);
        self
    }

    pub(crate) fn host_port(mut self, host: &str, port: u16, behaviour: HostBehaviour) -> Self {
        self.behaviours.insert(format!("{host}:{port}"), behaviour);
        self
    }

    pub(crate) fn connects(&self) -> Vec<(String, u16)> {
        lock(&self.connects).clone()
    }

    pub(crate) fn connect_count(&self) -> usize {
        lock(&self.connects).len()
    }

    /// Every transport handed out so far.
    pub(crate) fn transports(&self) -> Vec<MemoryTransport> {
        lock(&self.transports).clone()
    }

    /// RCPT recipients sent across all sessions, in connect order.
    pub(crate) fn recipients(&self) -> Vec<String> {
        self.transports()
            .iter()
            .flat_map(|t| t.commands())
            .filter_map(|c| c.strip_prefix("RCPT TO:<").map(|r| r.trim_end_matches('>').to_string()))
            .collect()
    }
}

impl Connector for ScriptedConnector {
    type Stream = MemoryTransport;

    fn connect(&self, host: &str, port: u16, _timeout: Duration) -> io::Result<MemoryTransport> {
        lock(&self.connects).push((host.to_string(), port));
        let behaviour = self
            .behaviours
            .get(&format!("{host}:{port}"))
            .or_else(|| self.behaviours.get(host))
            .cloned()
            .unwrap_or(HostBehaviour::Refuse);
        match behaviour {
            HostBehaviour::Refuse => Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            )),
            HostBehaviour::Timeout => Err(io::Error::new(io::ErrorKind::TimedOut, "timed out")),
            HostBehaviour::Serve {
                greeting,
                responder,
                delay,
            } => {
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                let transport = MemoryTransport::new(&greeting, responder);
                lock(&self.transports).push(transport.clone_handle());
                Ok(transport)
            }
        }
    }
}
