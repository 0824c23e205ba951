//! Mail host resolution: MX lookup ordered by preference, with the implicit
//! A/AAAA fallback of RFC 5321 §5.1.

mod error;
mod lookup;
mod types;

pub use error::{DnsError, NoMailHost};
pub use lookup::{DnsLookup, SystemDns};
pub use types::{MxHost, ResolvedHosts};

use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};

/// Resolves the candidate mail hosts for an ASCII `domain`.
///
/// Lookup failures of any kind, timeouts included, count as "no records".
pub fn resolve_mail_hosts<D>(
    dns: &D,
    domain: &str,
    max_hosts: usize,
) -> Result<ResolvedHosts, NoMailHost>
where
    D: DnsLookup + ?Sized,
{
    let records = records_or_empty(dns.lookup_mx(domain), "MX", domain);
    let null_mx = !records.is_empty() && records.iter().all(|r| r.hostname.is_empty());
    if null_mx {
        tracing::debug!(domain, "null MX published, domain accepts no mail");
        return Err(NoMailHost {
            domain: domain.to_string(),
        });
    }

    let mut hosts = dedup_lowest_priority(records);
    if !hosts.is_empty() {
        hosts.sort_by_key(|h| h.priority);
        hosts.truncate(max_hosts.max(1));
        tracing::debug!(domain, hosts = ?hosts, "MX hosts resolved");
        return Ok(ResolvedHosts {
            hosts,
            from_mx: true,
        });
    }

    let addrs = records_or_empty(dns.lookup_ip(domain), "A/AAAA", domain);
    if addrs.is_empty() {
        return Err(NoMailHost {
            domain: domain.to_string(),
        });
    }
    tracing::debug!(domain, addrs = ?addrs, "no MX, using implicit host");
    Ok(ResolvedHosts {
        hosts: vec![MxHost::new(domain, 0)],
        from_mx: false,
    })
}

fn dedup_lowest_priority(records: Vec<MxHost>) -> Vec<MxHost> {
    let mut out: Vec<MxHost> = Vec::with_capacity(records.len());
    for record in records {
        if record.hostname.is_empty() {
            continue;
        }
        match out.iter_mut().find(|h| h.hostname == record.hostname) {
            Some(existing) => existing.priority = existing.priority.min(record.priority),
            None => out.push(record),
        }
    }
    out
}

fn records_or_empty<T>(result: Result<Vec<T>, ResolveError>, kind: &str, domain: &str) -> Vec<T> {
    match result {
        Ok(records) => records,
        Err(err) => {
            match err.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => {
                    tracing::debug!(domain, kind, "no records")
                }
                ResolveErrorKind::Timeout => {
                    tracing::warn!(domain, kind, "lookup timed out, treating as no records")
                }
                _ => tracing::warn!(domain, kind, error = %err, "lookup failed, treating as no records"),
            }
            Vec::new()
        }
    }
}
