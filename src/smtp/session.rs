use std::io;

use super::error::SessionError;
use super::reply::{ParseStep, ReplyParser, SmtpReply};
use super::transport::Transport;
use super::types::ProbeStage;

const MAX_LINE_LEN: usize = 4096;

/// Dialogue position. Each command is only legal in its own state and a
/// successful reply advances to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Banner,
    Ehlo,
    MailFrom,
    RcptTo,
    Quit,
    Closed,
}

impl From<SessionState> for ProbeStage {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::Banner => Self::Banner,
            SessionState::Ehlo => Self::Ehlo,
            SessionState::MailFrom => Self::MailFrom,
            SessionState::RcptTo => Self::RcptTo,
            SessionState::Quit | SessionState::Closed => Self::Quit,
        }
    }
}

/// Client side of one SMTP connection.
///
/// The transport is released when the session is dropped, whatever state it
/// reached.
pub struct SmtpSession<T: Transport> {
    transport: T,
    buffer: Vec<u8>,
    state: SessionState,
    peer: String,
    verbose: bool,
    broken: bool,
}

impl<T: Transport> SmtpSession<T> {
    /// Wraps an already connected transport; the next step is the banner.
    pub fn new(transport: T, peer: impl Into<String>, verbose: bool) -> Self {
        Self {
            transport,
            buffer: Vec::new(),
            state: SessionState::Banner,
            peer: peer.into(),
            verbose,
            broken: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn read_banner(&mut self) -> Result<SmtpReply, SessionError> {
        self.expect(SessionState::Banner, "banner")?;
        let reply = self.read_reply()?;
        if !reply.is_positive_completion() {
            return Err(SessionError::Protocol(format!(
                "unexpected greeting {}",
                reply.code
            )));
        }
        self.state = SessionState::Ehlo;
        Ok(reply)
    }

    /// Sends `EHLO`, falling back to `HELO` once when EHLO is refused. The
    /// dialogue proceeds whatever the final reply says.
    ///
    /// Replies are read leniently: a malformed line ends the reply with
    /// code 0 instead of failing the session.
    pub fn ehlo(&mut self, helo: &str) -> Result<SmtpReply, SessionError> {
        self.expect(SessionState::Ehlo, "EHLO")?;
        let mut reply = self.lenient_command(&format!("EHLO {helo}"))?;
        if !reply.is_positive_completion() {
            reply = self.lenient_command(&format!("HELO {helo}"))?;
        }
        self.state = SessionState::MailFrom;
        Ok(reply)
    }

    /// Sends `STARTTLS` and, once the transport is upgraded, repeats the
    /// greeting over the encrypted channel. Only legal right after EHLO.
    ///
    /// Returns the second EHLO reply, or `None` when the transport cannot
    /// do TLS, the server declines or the handshake fails. A failed upgrade
    /// is not an error here; whatever breaks afterwards is seen by the next
    /// command.
    pub fn starttls(
        &mut self,
        server_name: &str,
        helo: &str,
    ) -> Result<Option<SmtpReply>, SessionError> {
        self.expect(SessionState::MailFrom, "STARTTLS")?;
        if !self.transport.supports_tls() {
            return Ok(None);
        }
        let reply = self.lenient_command("STARTTLS")?;
        if !reply.is_positive_completion() {
            tracing::debug!(peer = %self.peer, code = reply.code, "STARTTLS declined");
            return Ok(None);
        }
        if let Err(err) = self.transport.start_tls(server_name) {
            tracing::debug!(peer = %self.peer, error = %err, "TLS upgrade failed");
            return Ok(None);
        }
        // Nothing read before the handshake may be trusted afterwards.
        self.buffer.clear();
        self.state = SessionState::Ehlo;
        self.ehlo(helo).map(Some)
    }

    /// The reply is returned but not judged; only RCPT matters. It is read
    /// as leniently as the EHLO reply.
    pub fn mail_from(&mut self, sender: &str) -> Result<SmtpReply, SessionError> {
        self.expect(SessionState::MailFrom, "MAIL FROM")?;
        let reply = self.lenient_command(&format!("MAIL FROM:<{sender}>"))?;
        self.state = SessionState::RcptTo;
        Ok(reply)
    }

    pub fn rcpt_to(&mut self, recipient: &str) -> Result<SmtpReply, SessionError> {
        self.expect(SessionState::RcptTo, "RCPT TO")?;
        let reply = self.command(&format!("RCPT TO:<{recipient}>"))?;
        self.state = SessionState::Quit;
        Ok(reply)
    }

    /// Best-effort `QUIT`, then closes the transport. Idempotent.
    ///
    /// After an I/O failure the QUIT exchange is skipped so a dead peer does
    /// not cost another timeout.
    pub fn quit(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if !self.broken {
            match self.command("QUIT") {
                Ok(_) => {}
                Err(err) => tracing::trace!(peer = %self.peer, error = %err, "QUIT failed"),
            }
        }
        if let Err(err) = self.transport.close() {
            tracing::trace!(peer = %self.peer, error = %err, "close failed");
        }
        self.state = SessionState::Closed;
    }

    fn expect(&self, wanted: SessionState, command: &'static str) -> Result<(), SessionError> {
        if self.state == wanted {
            Ok(())
        } else {
            Err(SessionError::OutOfOrder {
                command,
                state: self.state,
            })
        }
    }

    fn command(&mut self, line: &str) -> Result<SmtpReply, SessionError> {
        self.send(line)?;
        self.read_reply()
    }

    fn lenient_command(&mut self, line: &str) -> Result<SmtpReply, SessionError> {
        self.send(line)?;
        self.read_reply_lenient()
    }

    fn send(&mut self, line: &str) -> Result<(), SessionError> {
        self.log("C", line);
        let mut data = Vec::with_capacity(line.len() + 2);
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(b"\r\n");
        let written = self
            .transport
            .write_all(&data)
            .and_then(|()| self.transport.flush());
        written.map_err(|err| self.io_failure(err))
    }

    fn read_reply(&mut self) -> Result<SmtpReply, SessionError> {
        let mut parser = ReplyParser::default();
        loop {
            let line = self.read_line()?;
            self.log("S", &line);
            if let ParseStep::Done(reply) = parser.feed(&line)? {
                return Ok(reply);
            }
        }
    }

    fn read_reply_lenient(&mut self) -> Result<SmtpReply, SessionError> {
        let mut parser = ReplyParser::default();
        loop {
            let line = self.read_line()?;
            self.log("S", &line);
            match parser.feed(&line) {
                Ok(ParseStep::Done(reply)) => return Ok(reply),
                Ok(ParseStep::NeedMore) => {}
                Err(err) => {
                    tracing::debug!(peer = %self.peer, error = %err, "closing malformed reply");
                    return Ok(parser.salvage(&line));
                }
            }
        }
    }

    fn read_line(&mut self) -> Result<String, SessionError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
                let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }
            if self.buffer.len() > MAX_LINE_LEN {
                return Err(SessionError::Protocol("reply line too long".to_string()));
            }

            let mut chunk = [0u8; 512];
            let read = match self.transport.read(&mut chunk) {
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(self.io_failure(err)),
            };
            if read == 0 {
                return Err(self.io_failure(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }
            self.buffer.extend_from_slice(&chunk[..read]);
        }
    }

    fn io_failure(&mut self, err: io::Error) -> SessionError {
        self.broken = true;
        SessionError::io(err)
    }

    fn log(&self, direction: &str, line: &str) {
        if self.verbose {
            tracing::info!(peer = %self.peer, "{direction}: {line}");
        } else {
            tracing::debug!(peer = %self.peer, "{direction}: {line}");
        }
    }
}

impl<T: Transport> Drop for SmtpSession<T> {
    fn drop(&mut self) {
        self.quit();
    }
}
