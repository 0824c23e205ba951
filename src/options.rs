use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub const DEFAULT_PORTS: &[u16] = &[25];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid port {0:?}")]
    InvalidPort(String),
}

/// What to report when DNS was healthy but no candidate host could be
/// reached and no RCPT code was obtained.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnreachablePolicy {
    /// Status `unknown`, reason `smtp_unreachable`.
    #[default]
    Unknown,
    /// Status `deliverable`, reason `assumed_deliverable`. Deliverability and
    /// bounce likelihood stay unknown since nothing was confirmed.
    AssumeDeliverable,
}

/// Probe settings shared by every address of a run.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Envelope sender used in `MAIL FROM`.
    #[cfg_attr(feature = "with-serde", serde(rename = "from"))]
    pub from_address: String,
    #[cfg_attr(feature = "with-serde", serde(rename = "helo"))]
    pub helo_name: String,
    /// Bound for every connect, read and write. Not a per-address deadline.
    #[cfg_attr(feature = "with-serde", serde(rename = "timeout"))]
    pub timeout_seconds: u64,
    #[cfg_attr(feature = "with-serde", serde(rename = "max_mx"))]
    pub max_mx_hosts: usize,
    #[cfg_attr(feature = "with-serde", serde(deserialize_with = "ports_from_text_or_list"))]
    pub ports: Vec<u16>,
    /// Upgrade with `STARTTLS` when the server advertises it.
    pub starttls: bool,
    pub verbose: bool,
    pub unreachable_policy: UnreachablePolicy,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            from_address: "verify@example.com".to_string(),
            helo_name: "example.com".to_string(),
            timeout_seconds: 7,
            max_mx_hosts: 3,
            ports: DEFAULT_PORTS.to_vec(),
            starttls: true,
            verbose: false,
            unreachable_policy: UnreachablePolicy::Unknown,
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }

    pub fn max_hosts(&self) -> usize {
        self.max_mx_hosts.max(1)
    }

    /// Ports in trial order; an empty list means port 25.
    pub fn ports(&self) -> &[u16] {
        if self.ports.is_empty() {
            DEFAULT_PORTS
        } else {
            &self.ports
        }
    }

    /// Parses a comma separated port list such as `"25, 587"`. Empty items
    /// are skipped.
    pub fn parse_ports(text: &str) -> Result<Vec<u16>, ConfigError> {
        text.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(parse_port)
            .collect()
    }
}

fn parse_port(item: &str) -> Result<u16, ConfigError> {
    match item.parse::<u16>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidPort(item.to_string())),
        Ok(port) => Ok(port),
    }
}

#[cfg(feature = "with-serde")]
fn ports_from_text_or_list<'de, D>(deserializer: D) -> Result<Vec<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Ports {
        List(Vec<u16>),
        Text(String),
    }

    match Ports::deserialize(deserializer)? {
        Ports::List(ports) if ports.contains(&0) => {
            Err(serde::de::Error::custom(ConfigError::InvalidPort("0".to_string())))
        }
        Ports::List(ports) => Ok(ports),
        Ports::Text(text) => ProbeConfig::parse_ports(&text).map_err(serde::de::Error::custom),
    }
}
