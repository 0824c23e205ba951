use std::fmt;
use std::io::{self, Read, Write};
use std::mem;
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use native_tls::{HandshakeError, TlsConnector, TlsStream};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};

use crate::resolver::DnsLookup;

/// Bidirectional byte stream an SMTP session runs over.
pub trait Transport: Read + Write + Send {
    /// Releases the underlying resource. Called exactly once per session.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Whether [`start_tls`](Self::start_tls) is worth attempting.
    fn supports_tls(&self) -> bool {
        false
    }

    /// Runs a TLS client handshake over the open connection. Later reads and
    /// writes go through the encrypted channel.
    fn start_tls(&mut self, _server_name: &str) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "transport cannot negotiate TLS",
        ))
    }
}

#[derive(Debug)]
enum StreamState {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
    Closed,
}

/// TCP connection that can be upgraded in place by `STARTTLS`.
#[derive(Debug)]
pub struct TcpTransport {
    state: StreamState,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            state: StreamState::Plain(stream),
        }
    }

    pub fn is_tls(&self) -> bool {
        matches!(self.state, StreamState::Tls(_))
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "connection closed")
}

impl Read for TcpTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.state {
            StreamState::Plain(stream) => stream.read(buf),
            StreamState::Tls(stream) => stream.read(buf),
            StreamState::Closed => Err(not_connected()),
        }
    }
}

impl Write for TcpTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.state {
            StreamState::Plain(stream) => stream.write(buf),
            StreamState::Tls(stream) => stream.write(buf),
            StreamState::Closed => Err(not_connected()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.state {
            StreamState::Plain(stream) => stream.flush(),
            StreamState::Tls(stream) => stream.flush(),
            StreamState::Closed => Err(not_connected()),
        }
    }
}

impl Transport for TcpTransport {
    fn close(&mut self) -> io::Result<()> {
        match mem::replace(&mut self.state, StreamState::Closed) {
            StreamState::Plain(stream) => stream.shutdown(Shutdown::Both),
            StreamState::Tls(mut stream) => {
                // close_notify is best effort.
                let _ = stream.shutdown();
                stream.get_ref().shutdown(Shutdown::Both)
            }
            StreamState::Closed => Ok(()),
        }
    }

    fn supports_tls(&self) -> bool {
        matches!(self.state, StreamState::Plain(_))
    }

    /// Certificates are not verified. A failed handshake leaves the
    /// transport closed.
    fn start_tls(&mut self, server_name: &str) -> io::Result<()> {
        let plain = match mem::replace(&mut self.state, StreamState::Closed) {
            StreamState::Plain(stream) => stream,
            StreamState::Tls(stream) => {
                self.state = StreamState::Tls(stream);
                return Ok(());
            }
            StreamState::Closed => return Err(not_connected()),
        };
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(io::Error::other)?;
        let tls = complete_handshake(&connector, server_name, plain)?;
        self.state = StreamState::Tls(Box::new(tls));
        Ok(())
    }
}

/// The socket is blocking with a read timeout, so a handshake that would
/// block has already waited the full timeout.
fn complete_handshake(
    connector: &TlsConnector,
    server_name: &str,
    stream: TcpStream,
) -> io::Result<TlsStream<TcpStream>> {
    match connector.connect(server_name, stream) {
        Ok(tls) => Ok(tls),
        Err(HandshakeError::Failure(err)) => Err(io::Error::other(err)),
        Err(HandshakeError::WouldBlock(_)) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "TLS handshake timed out",
        )),
    }
}

/// Opens transports to `(host, port)` candidates.
pub trait Connector: Send + Sync {
    type Stream: Transport;

    /// `timeout` bounds the connect and every later read and write.
    fn connect(&self, host: &str, port: u16, timeout: Duration) -> io::Result<Self::Stream>;
}

impl<T: Connector + ?Sized> Connector for Arc<T> {
    type Stream = T::Stream;

    fn connect(&self, host: &str, port: u16, timeout: Duration) -> io::Result<Self::Stream> {
        (**self).connect(host, port, timeout)
    }
}

/// TCP connector. Every resolved address is tried in order.
///
/// Host names go through the attached resolver, whose own timeout bounds
/// the lookup. Without one the platform resolver is used.
#[derive(Clone)]
pub struct TcpConnector {
    pub allow_ipv6: bool,
    dns: Option<Arc<dyn DnsLookup>>,
}

impl fmt::Debug for TcpConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpConnector")
            .field("allow_ipv6", &self.allow_ipv6)
            .field("resolver", &self.dns.is_some())
            .finish()
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self {
            allow_ipv6: true,
            dns: None,
        }
    }
}

impl TcpConnector {
    pub fn ipv4_only() -> Self {
        Self {
            allow_ipv6: false,
            ..Self::default()
        }
    }

    /// Resolves host names with `dns` instead of the platform resolver.
    pub fn with_resolver(mut self, dns: impl DnsLookup + 'static) -> Self {
        self.dns = Some(Arc::new(dns));
        self
    }

    fn socket_addrs(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = if let Ok(ip) = host.parse::<IpAddr>() {
            vec![SocketAddr::new(ip, port)]
        } else if let Some(dns) = &self.dns {
            dns.lookup_ip(host)
                .map_err(lookup_failure)?
                .into_iter()
                .map(|ip| SocketAddr::new(ip, port))
                .collect()
        } else {
            (host, port).to_socket_addrs()?.collect()
        };
        Ok(addrs
            .into_iter()
            .filter(|addr| self.allow_ipv6 || addr.is_ipv4())
            .collect())
    }
}

fn lookup_failure(err: ResolveError) -> io::Error {
    let kind = match err.kind() {
        ResolveErrorKind::Timeout => io::ErrorKind::TimedOut,
        _ => io::ErrorKind::NotFound,
    };
    io::Error::new(kind, err.to_string())
}

impl Connector for TcpConnector {
    type Stream = TcpTransport;

    fn connect(&self, host: &str, port: u16, timeout: Duration) -> io::Result<TcpTransport> {
        let mut last_err = None;
        for addr in self.socket_addrs(host, port)? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    return Ok(TcpTransport::new(stream));
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "no socket address available",
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::thread;

    use super::*;
    use crate::smtp::SmtpSession;
    use crate::testing::StubDns;

    #[test]
    fn ip_literal_skips_the_resolver() {
        let dns = Arc::new(StubDns::new());
        let connector = TcpConnector::default().with_resolver(Arc::clone(&dns));
        let addrs = connector.socket_addrs("192.0.2.7", 25).unwrap();
        assert_eq!(addrs, vec!["192.0.2.7:25".parse::<SocketAddr>().unwrap()]);
        assert_eq!(dns.ip_calls(), 0);
    }

    #[test]
    fn host_names_go_through_the_resolver() {
        let dns = Arc::new(
            StubDns::new()
                .with_ip("mx.example.test", "192.0.2.1")
                .with_ip("mx.example.test", "2001:db8::1"),
        );
        let connector = TcpConnector::default().with_resolver(Arc::clone(&dns));
        let addrs = connector.socket_addrs("mx.example.test", 587).unwrap();
        assert_eq!(addrs.len(), 2);
        assert_eq!(addrs[0], "192.0.2.1:587".parse::<SocketAddr>().unwrap());
        assert_eq!(dns.ip_calls(), 1);

        let v4 = TcpConnector::ipv4_only().with_resolver(Arc::clone(&dns));
        assert_eq!(v4.socket_addrs("mx.example.test", 25).unwrap().len(), 1);
    }

    #[test]
    fn resolver_failures_map_to_connect_errors() {
        let dns = StubDns::new().timing_out("slow.example.test");
        let connector = TcpConnector::default().with_resolver(dns);
        let err = connector
            .connect("slow.example.test", 25, Duration::from_secs(1))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        let err = connector
            .connect("missing.example.test", 25, Duration::from_secs(1))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    #[ignore = "needs a loopback socket"]
    fn tcp_connector_talks_to_loopback_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            writer.write_all(b"220 loopback ESMTP\r\n").unwrap();
            let mut lines = BufReader::new(stream).lines();
            let greeting = lines.next().unwrap().unwrap();
            writer.write_all(b"250 loopback\r\n").unwrap();
            greeting
        });

        let stream = TcpConnector::ipv4_only()
            .connect("127.0.0.1", port, Duration::from_secs(2))
            .unwrap();
        assert!(stream.supports_tls());
        assert!(!stream.is_tls());
        let mut session = SmtpSession::new(stream, format!("127.0.0.1:{port}"), false);
        assert_eq!(session.read_banner().unwrap().code, 220);
        assert_eq!(session.ehlo("client.test").unwrap().code, 250);
        drop(session);
        assert_eq!(server.join().unwrap(), "EHLO client.test");
    }
}
