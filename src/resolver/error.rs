use thiserror::Error;

#[derive(Debug, Error)]
pub enum DnsError {
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: std::io::Error,
    },
}

impl DnsError {
    pub(crate) fn resolver_init(source: std::io::Error) -> Self {
        Self::ResolverInit { source }
    }
}

/// The domain has neither a usable MX record nor an A/AAAA address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no MX or A/AAAA record for {domain}")]
pub struct NoMailHost {
    pub domain: String,
}

impl NoMailHost {
    pub fn reason(&self) -> &'static str {
        "no_mx_no_a"
    }
}
