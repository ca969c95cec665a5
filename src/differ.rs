use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

use crate::domain::DomainExtractor;
use crate::snapshot::{ActionMap, Snapshot};

/// Blocked domains grouped by registrable base. Bases iterate sorted; each
/// bucket keeps the action map's order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockBuckets {
    buckets: BTreeMap<String, Vec<String>>,
}

impl BlockBuckets {
    pub fn build(actions: &ActionMap, extractor: &DomainExtractor) -> Self {
        let mut buckets: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (domain, action) in actions.iter() {
            if !action.is_blocked() {
                continue;
            }
            let base = extractor.registrable_or_self(domain);
            buckets.entry(base).or_default().push(domain.to_string());
        }
        Self { buckets }
    }

    pub fn bases(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn get(&self, base: &str) -> Option<&[String]> {
        self.buckets.get(base).map(Vec::as_slice)
    }

    pub fn contains(&self, base: &str) -> bool {
        self.buckets.contains_key(base)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subdomain {
    pub domain: String,
    pub cookieblocked: bool,
    pub sites: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedBase {
    pub base: String,
    /// The base itself is cookie-blocked rather than blocked.
    pub cookieblocked: bool,
    pub sites: Option<Vec<String>>,
    /// Sorted, without the base. Empty when the base is the only member.
    pub subdomains: Vec<Subdomain>,
}

impl BlockedBase {
    fn from_bucket(base: &str, members: &[String], snapshot: &Snapshot) -> Self {
        let subdomains = if members.len() > 1 || members.first().map(String::as_str) != Some(base) {
            let mut sorted: Vec<&String> = members.iter().filter(|d| d.as_str() != base).collect();
            sorted.sort();
            sorted
                .into_iter()
                .map(|domain| Subdomain {
                    domain: domain.clone(),
                    cookieblocked: snapshot.is_cookieblocked(domain),
                    sites: snapshot.sorted_sites(domain),
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            base: base.to_string(),
            cookieblocked: snapshot.is_cookieblocked(base),
            sites: snapshot.sorted_sites(base),
            subdomains,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockDiff {
    pub old_count: usize,
    pub new_count: usize,
    pub newly_blocked: Vec<BlockedBase>,
    pub no_longer_blocked: Vec<BlockedBase>,
}

impl BlockDiff {
    /// Change in blocked base count, or `None` when the old snapshot had none.
    pub fn percent_change(&self) -> Option<f64> {
        if self.old_count == 0 {
            return None;
        }
        Some((self.new_count as f64 - self.old_count as f64) / self.old_count as f64 * 100.0)
    }
}

/// Bases present only in `minuend`, described with `snapshot`'s data.
fn missing_from(minuend: &BlockBuckets, subtrahend: &BlockBuckets, snapshot: &Snapshot) -> Vec<BlockedBase> {
    minuend
        .buckets
        .iter()
        .filter(|(base, _)| !subtrahend.contains(base))
        .map(|(base, members)| BlockedBase::from_bucket(base, members, snapshot))
        .collect()
}

pub fn diff_buckets(
    old_buckets: &BlockBuckets,
    new_buckets: &BlockBuckets,
    old: &Snapshot,
    new: &Snapshot,
) -> BlockDiff {
    BlockDiff {
        old_count: old_buckets.len(),
        new_count: new_buckets.len(),
        newly_blocked: missing_from(new_buckets, old_buckets, new),
        no_longer_blocked: missing_from(old_buckets, new_buckets, old),
    }
}

pub fn diff_blocked(old: &Snapshot, new: &Snapshot, extractor: &DomainExtractor) -> BlockDiff {
    let start_time = Instant::now();
    info!(action = "start", component = "block_differ", "Bucketing blocked domains");

    let old_buckets = BlockBuckets::build(&old.action_map, extractor);
    let new_buckets = BlockBuckets::build(&new.action_map, extractor);
    let diff = diff_buckets(&old_buckets, &new_buckets, old, new);

    info!(
        action = "complete",
        component = "block_differ",
        old_bases = diff.old_count,
        new_bases = diff.new_count,
        newly_blocked = diff.newly_blocked.len(),
        no_longer_blocked = diff.no_longer_blocked.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Block diff completed"
    );
    diff
}
