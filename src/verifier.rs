use crate::address::{EmailAddress, normalize_address};
use crate::catch_all::{CatchAllCache, detect_catch_all};
use crate::classifier::{Disposition, Findings, ValidationResult, classify};
use crate::disposable::DisposableDomains;
use crate::options::ProbeConfig;
use crate::resolver::{DnsError, DnsLookup, SystemDns, resolve_mail_hosts};
use crate::smtp::{Connector, TcpConnector, probe_candidates};

/// Single-address pipeline: normalise, resolve, probe, detect catch-all,
/// classify.
///
/// The resolver and connector are seams so the pipeline can run against
/// fakes. [`Verifier::system`] wires the real ones.
#[derive(Debug)]
pub struct Verifier<D = SystemDns, C = TcpConnector> {
    config: ProbeConfig,
    dns: D,
    connector: C,
    disposable: DisposableDomains,
}

impl Verifier {
    /// System resolver configuration and TCP. The connector resolves MX
    /// host names through the same resolver.
    pub fn system(config: ProbeConfig) -> Result<Self, DnsError> {
        let dns = SystemDns::from_system_conf(config.timeout())?;
        let connector = TcpConnector::default().with_resolver(dns.clone());
        Ok(Self::new(config, dns, connector))
    }
}

impl<D, C> Verifier<D, C>
where
    D: DnsLookup,
    C: Connector,
{
    pub fn new(config: ProbeConfig, dns: D, connector: C) -> Self {
        Self {
            config,
            dns,
            connector,
            disposable: DisposableDomains::builtin(),
        }
    }

    pub fn with_disposable(mut self, disposable: DisposableDomains) -> Self {
        self.disposable = disposable;
        self
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn dns(&self) -> &D {
        &self.dns
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Verifies one raw address. Never fails: every outcome is a result.
    pub fn verify(&self, raw: &str) -> ValidationResult {
        self.verify_cached(raw, &CatchAllCache::new())
    }

    /// Same as [`verify`](Self::verify) for an already normalised address.
    pub fn verify_address(&self, address: &EmailAddress) -> ValidationResult {
        let span = tracing::info_span!("verify", email = address.normalized_email());
        let _guard = span.enter();
        self.run_pipeline(address.raw(), address, &CatchAllCache::new())
    }

    /// Catch-all verdicts are shared through `cache`, so one bulk job probes
    /// each domain at most once.
    pub(crate) fn verify_cached(&self, raw: &str, cache: &CatchAllCache) -> ValidationResult {
        let span = tracing::info_span!("verify", email = raw);
        let _guard = span.enter();
        match normalize_address(raw) {
            Ok(address) => self.run_pipeline(raw, &address, cache),
            Err(err) => {
                tracing::debug!(reason = err.reason(), "rejected before any lookup");
                classify(
                    raw,
                    Findings::Malformed(&err),
                    &self.disposable,
                    self.config.unreachable_policy,
                )
            }
        }
    }

    fn run_pipeline(&self, raw: &str, address: &EmailAddress, cache: &CatchAllCache) -> ValidationResult {
        let domain = address.domain();
        let resolved = match resolve_mail_hosts(&self.dns, domain, self.config.max_hosts()) {
            Ok(resolved) => resolved,
            Err(error) => {
                return classify(
                    raw,
                    Findings::NoMailHost {
                        address,
                        error: &error,
                    },
                    &self.disposable,
                    self.config.unreachable_policy,
                );
            }
        };

        let hosts: Vec<String> = resolved.hostnames().map(str::to_string).collect();
        let run = probe_candidates(&self.connector, &hosts, &self.config, address.normalized_email());
        tracing::debug!(attempts = run.attempts.len(), best = ?run.best_disposition(), "probe finished");

        let catch_all = match run.best_disposition() {
            Some(Disposition::Accepted(_)) => cache.get_or_detect(domain, || {
                detect_catch_all(&self.connector, address, &hosts, &self.config)
            }),
            _ => cache.cached(domain),
        };

        classify(
            raw,
            Findings::Probed {
                address,
                domain_has_mx: resolved.from_mx,
                run: &run,
                catch_all,
            },
            &self.disposable,
            self.config.unreachable_policy,
        )
    }
}
