use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "trackdiff",
    about = "Compare two tracker classification snapshots and flag multi-domain fingerprinting candidates",
    version,
    long_about = None
)]
pub struct Args {
    /// Snapshot files: `[OLD] NEW`. With a single file the old snapshot is empty
    #[arg(value_name = "SNAPSHOT", num_args = 1..=2, required_unless_present = "init")]
    pub snapshots: Vec<PathBuf>,

    /// Path to custom root infix file
    #[arg(short, long)]
    pub infixes: Option<PathBuf>,

    /// Number of observing sites that must share a root
    #[arg(long, default_value_t = crate::mdfp::MIN_SHARED_ROOTS)]
    pub min_shared_roots: usize,

    /// Largest root pool still checked for exact-label matches
    #[arg(long, default_value_t = crate::mdfp::MAX_POOL_SIZE)]
    pub max_pool: usize,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of worker threads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Initialize root_infixes.txt with default infixes
    #[arg(long)]
    pub init: bool,
}

impl Args {
    /// Old snapshot path, if two were given.
    pub fn old_path(&self) -> Option<&PathBuf> {
        match self.snapshots.as_slice() {
            [old, _] => Some(old),
            _ => None,
        }
    }

    pub fn new_path(&self) -> Option<&PathBuf> {
        self.snapshots.last()
    }
}
