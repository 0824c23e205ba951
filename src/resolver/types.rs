/// One mail exchanger candidate. Lower `priority` is tried first.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MxHost {
    pub hostname: String,
    pub priority: u16,
}

impl MxHost {
    pub fn new(hostname: impl Into<String>, priority: u16) -> Self {
        Self {
            hostname: hostname.into(),
            priority,
        }
    }
}

/// Ordered, deduplicated and truncated mail hosts for one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHosts {
    pub hosts: Vec<MxHost>,
    /// `false` when `hosts` is the implicit A/AAAA fallback.
    pub from_mx: bool,
}

impl ResolvedHosts {
    pub fn hostnames(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(|h| h.hostname.as_str())
    }
}
