use std::io;

use thiserror::Error;

use super::session::SessionState;
use super::types::ErrorKind;

/// Failure of one SMTP attempt. Never escapes the probe: it is folded into
/// the attempt's [`SmtpOutcome`](super::SmtpOutcome).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: io::Error,
    },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("{command} is not valid in state {state:?}")]
    OutOfOrder {
        command: &'static str,
        state: SessionState,
    },
}

impl SessionError {
    pub(crate) fn io(source: io::Error) -> Self {
        Self::Io { source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { source } => ErrorKind::from_io(source),
            Self::Protocol(_) | Self::OutOfOrder { .. } => ErrorKind::Protocol,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
