//! Accept-all detection: probe the domain with a mailbox that should not
//! exist and see whether it is accepted anyway.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::address::EmailAddress;
use crate::classifier::Disposition;
use crate::options::ProbeConfig;
use crate::smtp::{Connector, probe_candidates};

const SYNTHETIC_PREFIX: &str = "probe-";
const SYNTHETIC_LEN: usize = 20;

/// `probe-` followed by 20 random lowercase alphanumerics.
pub fn synthetic_local_part() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SYNTHETIC_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{SYNTHETIC_PREFIX}{token}")
}

/// Runs one synthetic probe against `hosts` in the usual order.
///
/// `Some(true)` when the synthetic mailbox is accepted, `Some(false)` on a
/// hard reject, `None` when nothing conclusive came back.
pub fn detect_catch_all<C>(
    connector: &C,
    address: &EmailAddress,
    hosts: &[String],
    config: &ProbeConfig,
) -> Option<bool>
where
    C: Connector + ?Sized,
{
    let probe = address.with_local_part(&synthetic_local_part());
    let run = probe_candidates(connector, hosts, config, probe.normalized_email());
    let verdict = match run.best_disposition() {
        Some(Disposition::Accepted(_)) => Some(true),
        Some(Disposition::HardReject(_)) => Some(false),
        _ => None,
    };
    tracing::debug!(domain = address.domain(), catch_all = ?verdict, "catch-all probe done");
    verdict
}

type Slot = Arc<OnceLock<Option<bool>>>;

/// Per-job memo of catch-all verdicts, keyed by domain.
///
/// Concurrent callers for the same domain wait for the first detection
/// instead of probing again.
#[derive(Debug, Default)]
pub struct CatchAllCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl CatchAllCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_detect(&self, domain: &str, detect: impl FnOnce() -> Option<bool>) -> Option<bool> {
        let slot = self.slot(domain);
        *slot.get_or_init(detect)
    }

    /// Verdict already computed for `domain`, if any.
    pub fn cached(&self, domain: &str) -> Option<bool> {
        let slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.get(domain).and_then(|slot| slot.get().copied().flatten())
    }

    fn slot(&self, domain: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(slots.entry(domain.to_string()).or_default())
    }
}
