/// Meaning of an RCPT reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// 250, 251.
    Accepted(u16),
    /// 550 to 554.
    HardReject(u16),
    /// 421, 450, 451, 452: greylisting or a transient condition.
    Temporary(u16),
    Inconclusive(u16),
}

impl Disposition {
    pub fn from_code(code: u16) -> Self {
        match code {
            250 | 251 => Self::Accepted(code),
            550..=554 => Self::HardReject(code),
            421 | 450 | 451 | 452 => Self::Temporary(code),
            _ => Self::Inconclusive(code),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Accepted(code)
            | Self::HardReject(code)
            | Self::Temporary(code)
            | Self::Inconclusive(code) => code,
        }
    }

    /// Accepts and hard rejects end the search for further candidates.
    pub fn is_conclusive(self) -> bool {
        matches!(self, Self::Accepted(_) | Self::HardReject(_))
    }

    pub(crate) fn rank(self) -> u8 {
        match self {
            Self::Accepted(_) => 3,
            Self::HardReject(_) => 2,
            Self::Temporary(_) => 1,
            Self::Inconclusive(_) => 0,
        }
    }
}
