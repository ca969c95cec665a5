use time::macros::format_description;
use tracing_subscriber::{fmt::time::LocalTime, EnvFilter};

/// Logs go to stderr so the report on stdout stays clean. `RUST_LOG` overrides `verbose`.
pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let timer = LocalTime::new(format_description!("[hour]:[minute]:[second].[subsecond digits:3]"));

    // Ignore the error if a subscriber is already installed (tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Signed percentage with two decimals, e.g. `+12.50%`.
pub fn format_percent(pct: f64) -> String {
    format!("{:+0.2}%", pct)
}

pub fn default_workers() -> usize {
    std::cmp::min(num_cpus::get(), 8)
}

pub fn validate_args(args: &crate::args::Args) -> anyhow::Result<()> {
    if let Some(workers) = args.workers {
        if workers == 0 {
            anyhow::bail!("--workers must be greater than 0");
        }
    }

    if args.min_shared_roots == 0 {
        anyhow::bail!("--min-shared-roots must be greater than 0");
    }

    if args.max_pool == 0 {
        anyhow::bail!("--max-pool must be greater than 0");
    }

    Ok(())
}
