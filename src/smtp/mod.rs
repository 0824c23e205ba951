//! SMTP probing: the reply parser, the client session state machine and the
//! loop over candidate hosts and ports.

mod error;
mod probe;
mod reply;
mod session;
mod transport;
mod types;

pub use error::SessionError;
pub use probe::{ProbeRun, probe_candidates, probe_host};
pub use reply::SmtpReply;
pub use session::{SessionState, SmtpSession};
pub use transport::{Connector, TcpConnector, TcpTransport, Transport};
pub use types::{ErrorKind, ProbeStage, SmtpOutcome};
