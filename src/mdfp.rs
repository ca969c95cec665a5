//! Multi-domain fingerprinting (MDFP) candidate detection.
//!
//! A tracker is a candidate when its own root and the roots of the sites it
//! was seen on share a common label, which suggests one organization running
//! many lookalike domains.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

use crate::domain::DomainExtractor;
use crate::highlight::{highlight_first, Highlighted};
use crate::infixes::default_infixes;
use crate::snapshot::SnitchMap;

pub const MIN_SHARED_ROOTS: usize = 3;
/// Pools larger than this skip exact-label promotion.
pub const MAX_POOL_SIZE: usize = 12;
/// Shared roots this short or shorter are discarded.
pub const MAX_TRIVIAL_ROOT_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdfpConfig {
    pub infixes: Vec<String>,
    pub min_shared_roots: usize,
    pub max_pool: usize,
}

impl Default for MdfpConfig {
    fn default() -> Self {
        Self {
            infixes: default_infixes(),
            min_shared_roots: MIN_SHARED_ROOTS,
            max_pool: MAX_POOL_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdfpCandidate {
    pub base: Highlighted,
    /// Sorted sites that contain a shared root, each highlighted.
    pub sites: Vec<Highlighted>,
    /// Sites containing none of the shared roots.
    pub other_sites: usize,
    pub shared_roots: Vec<String>,
}

/// Removes generic infrastructure fragments from a tracker root.
///
/// Each infix is removed as `-infix`, `infix-`, then bare, in list order.
/// Whenever a step would leave nothing, the result reverts to `root`.
pub fn strip_infixes<S: AsRef<str>>(root: &str, infixes: &[S]) -> String {
    let mut stripped = root.to_string();
    for infix in infixes.iter().map(AsRef::as_ref) {
        if infix.is_empty() {
            continue;
        }
        stripped = stripped
            .replace(&format!("-{infix}"), "")
            .replace(&format!("{infix}-"), "")
            .replace(infix, "");
        if stripped.is_empty() {
            stripped = root.to_string();
        }
    }
    stripped
}

/// Roots shared across `pool`, which must end with `tracker_root`.
pub fn shared_roots(pool: &[String], tracker_root: &str, config: &MdfpConfig) -> Vec<String> {
    let mut shared: Vec<String> = Vec::new();

    if pool.len() <= config.max_pool {
        for (i, root) in pool.iter().enumerate() {
            if pool[..i].contains(root) {
                continue;
            }
            let count = pool.iter().filter(|other| *other == root).count();
            if count >= config.min_shared_roots {
                shared.push(root.clone());
            }
        }
    }

    // Catches a tracker pattern that shows up inside many infra labels,
    // e.g. "adobedtm" in "adobedtm-cdn" and "adobedtm-1".
    if !shared.iter().any(|root| root == tracker_root) {
        let substring_matches = pool.iter().filter(|root| root.contains(tracker_root)).count();
        if substring_matches >= config.min_shared_roots {
            shared.push(tracker_root.to_string());
        }
    }

    shared.retain(|root| root.chars().count() > MAX_TRIVIAL_ROOT_LEN);
    shared
}

/// Checks one tracker base against the sites it was observed on.
pub fn evaluate_base(
    base: &str,
    sites: &[String],
    extractor: &DomainExtractor,
    config: &MdfpConfig,
) -> Option<MdfpCandidate> {
    let tracker_root = strip_infixes(&extractor.leaf_or_prefix(base), &config.infixes);

    let mut pool: Vec<String> = sites.iter().map(|site| extractor.leaf_or_prefix(site)).collect();
    pool.push(tracker_root.clone());

    let shared = shared_roots(&pool, &tracker_root, config);
    if shared.is_empty() {
        return None;
    }

    let mut sorted_sites: Vec<&String> = sites.iter().collect();
    sorted_sites.sort();

    let mut highlighted = Vec::new();
    let mut other_sites = 0;
    for site in sorted_sites {
        let site = highlight_first(site, &shared);
        if site.is_highlighted() {
            highlighted.push(site);
        } else {
            other_sites += 1;
        }
    }

    debug!(
        action = "promote",
        component = "mdfp_clusterer",
        base = base,
        tracker_root = %tracker_root,
        shared_roots = ?shared,
        "Found shared roots"
    );

    Some(MdfpCandidate {
        base: highlight_first(base, &shared),
        sites: highlighted,
        other_sites,
        shared_roots: shared,
    })
}

/// Evaluates every tracker in `snitch_map`, in sorted base order, on `workers` threads.
pub fn find_candidates(
    snitch_map: &SnitchMap,
    extractor: &DomainExtractor,
    config: &MdfpConfig,
    workers: usize,
) -> Result<Vec<MdfpCandidate>> {
    let start_time = Instant::now();
    info!(
        action = "start",
        component = "mdfp_clusterer",
        tracker_count = snitch_map.len(),
        worker_count = workers,
        "Looking for MDFP candidates"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .context("Failed to build worker pool")?;

    let entries: Vec<(&String, &Vec<String>)> = snitch_map.iter().collect();
    let candidates: Vec<MdfpCandidate> = pool.install(|| {
        entries
            .par_iter()
            .filter_map(|(base, sites)| evaluate_base(base, sites, extractor, config))
            .collect()
    });

    info!(
        action = "complete",
        component = "mdfp_clusterer",
        candidate_count = candidates.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "MDFP search completed"
    );
    Ok(candidates)
}
