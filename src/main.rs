use anyhow::Result;
use clap::Parser;
use tracing::error;

use trackdiff::error::{codes, exit_code, LoadError};
use trackdiff::utils::{setup_logging, validate_args};
use trackdiff::{analyze_snapshots, init_default_infixes, print_analysis_results, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    if args.init {
        return init_default_infixes();
    }

    validate_args(&args)?;

    match analyze_snapshots(&args) {
        Ok(result) => {
            print_analysis_results(&result, &args);
            Ok(())
        }
        Err(e) => {
            error!(action = "abort", component = "main", error = %e, "Analysis failed");
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<LoadError>()
                .map(exit_code)
                .unwrap_or(codes::INVALID_INPUT);
            std::process::exit(code);
        }
    }
}
