//! Disposable (throwaway) mailbox providers.

use std::collections::HashSet;

use phf::phf_set;

static BUILTIN: phf::Set<&'static str> = phf_set! {
    "mailinator.com",
    "10minutemail.com",
    "guerrillamail.com",
    "yopmail.com",
    "tempmail.com",
    "temp-mail.org",
    "throwawaymail.com",
    "moakt.com",
    "trashmail.com",
};

/// Swappable set of disposable domains. Lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisposableDomains {
    domains: HashSet<String>,
}

impl Default for DisposableDomains {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DisposableDomains {
    pub fn builtin() -> Self {
        BUILTIN.iter().copied().collect()
    }

    pub fn empty() -> Self {
        Self {
            domains: HashSet::new(),
        }
    }

    /// One domain per line; blank lines and `#` comments are ignored.
    pub fn from_list(text: &str) -> Self {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect()
    }

    pub fn contains(&self, domain: &str) -> bool {
        let domain = domain.trim_end_matches('.');
        if domain.bytes().any(|b| b.is_ascii_uppercase()) {
            self.domains.contains(&domain.to_ascii_lowercase())
        } else {
            self.domains.contains(domain)
        }
    }

    pub fn insert(&mut self, domain: &str) -> bool {
        self.domains.insert(domain.trim().to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for DisposableDomains {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = Self::empty();
        for domain in iter {
            set.insert(domain);
        }
        set
    }
}
