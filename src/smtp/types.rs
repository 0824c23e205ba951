use std::io;

/// Step of the dialogue an attempt ended in.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStage {
    Connect,
    Banner,
    Ehlo,
    MailFrom,
    RcptTo,
    Quit,
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorKind {
    #[default]
    None,
    Timeout,
    Refused,
    Protocol,
}

impl ErrorKind {
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout,
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => Self::Refused,
            _ => Self::Protocol,
        }
    }

    /// Connect failures are either a timeout or a refusal.
    pub fn from_connect(err: &io::Error) -> Self {
        match Self::from_io(err) {
            Self::Timeout => Self::Timeout,
            _ => Self::Refused,
        }
    }
}

/// Result of one `(host, port)` attempt.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpOutcome {
    pub host: String,
    pub port: u16,
    /// TCP connection established.
    pub connected: bool,
    pub rcpt_code: Option<u16>,
    pub stage: ProbeStage,
    pub error_kind: ErrorKind,
}

impl SmtpOutcome {
    pub(crate) fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            connected: false,
            rcpt_code: None,
            stage: ProbeStage::Connect,
            error_kind: ErrorKind::None,
        }
    }
}
