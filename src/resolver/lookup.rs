use std::cell::RefCell;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use trust_dns_resolver::Resolver;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveError;
use trust_dns_resolver::system_conf::read_system_conf;

use super::error::DnsError;
use super::types::MxHost;

/// DNS queries needed by the probe pipeline.
pub trait DnsLookup: Send + Sync {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxHost>, ResolveError>;

    /// A records first, then AAAA.
    fn lookup_ip(&self, domain: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

impl<T: DnsLookup + ?Sized> DnsLookup for Arc<T> {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxHost>, ResolveError> {
        (**self).lookup_mx(domain)
    }

    fn lookup_ip(&self, domain: &str) -> Result<Vec<IpAddr>, ResolveError> {
        (**self).lookup_ip(domain)
    }
}

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static RESOLVER: RefCell<Option<(u64, Resolver)>> = const { RefCell::new(None) };
}

/// Blocking resolver built from the system configuration.
///
/// The synchronous `Resolver` serialises queries behind an internal runtime
/// lock, so each worker thread lazily builds its own instance.
#[derive(Debug, Clone)]
pub struct SystemDns {
    id: u64,
    config: ResolverConfig,
    opts: ResolverOpts,
}

impl SystemDns {
    /// Uses `/etc/resolv.conf` (or the platform equivalent) with every query
    /// bounded by `timeout` and a single attempt.
    pub fn from_system_conf(timeout: Duration) -> Result<Self, DnsError> {
        let (config, mut opts) = read_system_conf().map_err(DnsError::resolver_init)?;
        opts.timeout = timeout;
        opts.attempts = 1;
        Ok(Self::with_config(config, opts))
    }

    pub fn with_config(config: ResolverConfig, opts: ResolverOpts) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            config,
            opts,
        }
    }

    fn with_resolver<T>(
        &self,
        f: impl FnOnce(&Resolver) -> Result<T, ResolveError>,
    ) -> Result<T, ResolveError> {
        RESOLVER.with(|cell| {
            let mut slot = cell.borrow_mut();
            let stale = !matches!(slot.as_ref(), Some((id, _)) if *id == self.id);
            if stale {
                let resolver = Resolver::new(self.config.clone(), self.opts.clone())
                    .map_err(|err| ResolveError::from(format!("resolver init failed: {err}")))?;
                *slot = Some((self.id, resolver));
            }
            match slot.as_ref() {
                Some((_, resolver)) => f(resolver),
                None => Err(ResolveError::from("resolver unavailable")),
            }
        })
    }
}

impl DnsLookup for SystemDns {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxHost>, ResolveError> {
        self.with_resolver(|resolver| {
            let lookup = resolver.mx_lookup(domain)?;
            Ok(lookup
                .iter()
                .map(|mx| MxHost::new(normalize_exchange(&mx.exchange().to_utf8()), mx.preference()))
                .collect())
        })
    }

    fn lookup_ip(&self, domain: &str) -> Result<Vec<IpAddr>, ResolveError> {
        self.with_resolver(|resolver| {
            let lookup = resolver.lookup_ip(domain)?;
            Ok(lookup.iter().collect())
        })
    }
}

pub(crate) fn normalize_exchange(exchange: &str) -> String {
    exchange.trim_end_matches('.').to_ascii_lowercase()
}
