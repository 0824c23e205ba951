use super::error::SessionError;

/// A complete (possibly multi-line) SMTP reply.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl SmtpReply {
    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_transient_failure(&self) -> bool {
        (400..500).contains(&self.code)
    }

    pub fn is_permanent_failure(&self) -> bool {
        (500..600).contains(&self.code)
    }

    pub fn has_capability(&self, cap: &str) -> bool {
        self.lines.iter().any(|line| {
            line.split_whitespace()
                .next()
                .is_some_and(|token| token.eq_ignore_ascii_case(cap))
        })
    }
}

#[derive(Debug)]
pub(crate) enum ParseStep {
    NeedMore,
    Done(SmtpReply),
}

/// Line-at-a-time reply assembler.
///
/// `250-text` continues a reply, `250 text` (or a bare `250`) ends it. All
/// lines of one reply must carry the same code.
#[derive(Debug, Default)]
pub(crate) struct ReplyParser {
    code: Option<u16>,
    lines: Vec<String>,
}

impl ReplyParser {
    pub(crate) fn feed(&mut self, line: &str) -> Result<ParseStep, SessionError> {
        let bytes = line.as_bytes();
        if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
            return Err(SessionError::Protocol(format!("invalid reply line: {line:?}")));
        }
        let code = bytes[..3]
            .iter()
            .fold(0u16, |acc, digit| acc * 10 + u16::from(digit - b'0'));
        match self.code {
            Some(existing) if existing != code => {
                return Err(SessionError::Protocol(format!(
                    "inconsistent reply codes: {existing} vs {code}"
                )));
            }
            _ => self.code = Some(code),
        }

        self.lines.push(line.get(4..).unwrap_or_default().to_string());
        if bytes.get(3) == Some(&b'-') {
            return Ok(ParseStep::NeedMore);
        }
        let reply = SmtpReply {
            code,
            lines: std::mem::take(&mut self.lines),
        };
        self.code = None;
        Ok(ParseStep::Done(reply))
    }

    /// Ends the pending reply at a line that does not parse. The code of
    /// earlier lines is kept; a reply with no valid line gets code 0.
    pub(crate) fn salvage(&mut self, line: &str) -> SmtpReply {
        self.lines.push(line.to_string());
        SmtpReply {
            code: self.code.take().unwrap_or(0),
            lines: std::mem::take(&mut self.lines),
        }
    }
}
