use anyhow::{Context, Result};
use std::time::Instant;
use tracing::info;

use crate::canvas::find_canvas_fingerprinters;
use crate::differ::diff_blocked;
use crate::domain::DomainExtractor;
use crate::mdfp::{find_candidates, MdfpConfig};
use crate::report::{self, Colored, Plain, Style};
use crate::snapshot::Snapshot;
use crate::stats::{AnalysisResult, KeyStats};
use crate::{infixes, loader, utils, Args};

/// Runs every stage over an already loaded pair of snapshots.
pub fn analyze(
    old: &Snapshot,
    new: &Snapshot,
    config: &MdfpConfig,
    workers: usize,
) -> Result<AnalysisResult> {
    let extractor = DomainExtractor::new();

    let keys = KeyStats::compute(&old.action_map, &new.action_map);
    let blocked = diff_blocked(old, new, &extractor);
    let mdfp = find_candidates(&new.snitch_map, &extractor, config, workers)?;
    let canvas =
        find_canvas_fingerprinters(&new.action_map, new.tracking_map.as_ref(), &extractor);

    info!(
        action = "complete",
        component = "analysis",
        extracted_domains = extractor.cached_len(),
        "All stages completed"
    );

    Ok(AnalysisResult {
        keys,
        blocked,
        mdfp,
        canvas,
    })
}

pub fn analyze_snapshots(args: &Args) -> Result<AnalysisResult> {
    let total_start_time = Instant::now();
    info!(
        action = "start",
        component = "analysis",
        "Starting snapshot analysis"
    );

    let new_path = args.new_path().context("No snapshot given")?;
    let (old, new) = loader::load_snapshots(args.old_path().map(|p| p.as_path()), new_path)?;

    let config = MdfpConfig {
        infixes: infixes::load_root_infixes(args.infixes.as_deref())?,
        min_shared_roots: args.min_shared_roots,
        max_pool: args.max_pool,
    };
    let workers = args.workers.unwrap_or_else(utils::default_workers);

    let result = analyze(&old, &new, &config, workers)?;

    info!(
        action = "complete",
        component = "analysis",
        duration_ms = total_start_time.elapsed().as_millis(),
        "Analysis completed successfully"
    );
    Ok(result)
}

pub fn print_analysis_results(result: &AnalysisResult, args: &Args) {
    let style: &dyn Style = if args.no_color { &Plain } else { &Colored };
    println!("{}", report::render(result, style));
}
