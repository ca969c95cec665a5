pub mod analysis;
pub mod args;
pub mod canvas;
pub mod differ;
pub mod domain;
pub mod error;
pub mod highlight;
pub mod infixes;
pub mod loader;
pub mod mdfp;
pub mod report;
pub mod snapshot;
pub mod stats;
pub mod utils;

pub use analysis::{analyze, analyze_snapshots, print_analysis_results};
pub use args::Args;
pub use infixes::init_default_infixes;
pub use stats::AnalysisResult;
