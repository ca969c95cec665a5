use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};
use tracing::warn;
use url::Host;

/// A domain split at its public suffix boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Leaf label plus public suffix, e.g. `example.co.uk`.
    pub registrable: String,
    /// The label immediately before the public suffix, e.g. `example`.
    pub leaf: String,
}

/// Public-suffix-aware domain decomposition with a per-instance cache.
///
/// Every stage goes through the same extractor, so each distinct domain is
/// looked up against the suffix list once per run.
#[derive(Debug, Default)]
pub struct DomainExtractor {
    cache: RwLock<HashMap<String, Option<Extracted>>>,
    warned: Mutex<HashSet<String>>,
}

impl DomainExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` for IP literals, single labels, and hosts whose suffix
    /// is not on the public suffix list.
    pub fn extract(&self, domain: &str) -> Option<Extracted> {
        if let Ok(cache) = self.cache.read() {
            if let Some(hit) = cache.get(domain) {
                return hit.clone();
            }
        }

        let result = extract_uncached(domain);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(domain.to_string(), result.clone());
        }
        result
    }

    /// Registrable domain, or the input itself when extraction fails.
    pub fn registrable_or_self(&self, domain: &str) -> String {
        match self.extract(domain) {
            Some(extracted) => extracted.registrable,
            None => {
                self.warn_once(domain);
                domain.to_string()
            }
        }
    }

    /// Leaf label, or everything before the first dot when extraction fails.
    pub fn leaf_or_prefix(&self, domain: &str) -> String {
        match self.extract(domain) {
            Some(extracted) => extracted.leaf,
            None => domain.split('.').next().unwrap_or(domain).to_string(),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    fn warn_once(&self, domain: &str) {
        let first = self
            .warned
            .lock()
            .map(|mut warned| warned.insert(domain.to_string()))
            .unwrap_or(true);
        if first {
            warn!(
                action = "extract",
                component = "registrable_domain",
                domain = domain,
                "Failed to extract base domain, using the full domain"
            );
        }
    }
}

/// Longest ICANN public suffix of `host`.
///
/// Private-section entries such as `cloudfront.net` are skipped by dropping
/// their first label and matching again, so `d1.cloudfront.net` resolves to
/// the ICANN suffix `net`.
fn icann_suffix(host: &str) -> Option<String> {
    let mut name = host;
    loop {
        let suffix = psl::suffix(name.as_bytes())?;
        if !suffix.is_known() {
            return None;
        }
        let matched = std::str::from_utf8(suffix.as_bytes()).ok()?;
        if suffix.typ() == Some(psl::Type::Icann) {
            return Some(matched.to_string());
        }
        // private rule: retry on what follows its first label
        let (_, rest) = matched.split_once('.')?;
        name = &name[name.len() - rest.len()..];
    }
}

fn extract_uncached(domain: &str) -> Option<Extracted> {
    let host = domain.strip_suffix('.').unwrap_or(domain).to_ascii_lowercase();
    if host.is_empty() || !host.contains('.') {
        return None;
    }

    match Host::parse(&host) {
        Ok(Host::Domain(_)) => {}
        Ok(Host::Ipv4(_)) | Ok(Host::Ipv6(_)) => return None,
        // Underscores and similar are legal in DNS labels even though
        // URL host parsing rejects them; let the suffix list decide.
        Err(_) => {}
    }

    let suffix = icann_suffix(&host)?;
    let prefix = host.strip_suffix(suffix.as_str())?.strip_suffix('.')?;
    let leaf = prefix.rsplit('.').next().unwrap_or(prefix).to_string();
    if leaf.is_empty() {
        return None;
    }
    let registrable = format!("{}.{}", leaf, suffix);

    Some(Extracted { registrable, leaf })
}
