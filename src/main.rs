//! userlist-gen - Synthetic ranked user list generator
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use userlist_gen::cancel::CancelToken;
use userlist_gen::config::{CliArgs, Command, PipelineConfig};
use userlist_gen::merge::merge_files;
use userlist_gen::pipeline::Pipeline;
use userlist_gen::progress::{format_number, print_header, print_summary, ProgressReporter};
use userlist_gen::sample::{sample_file, SamplingStrategy};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.is_verbose())?;

    match args.command.clone() {
        Some(Command::Merge { output, inputs, .. }) => run_merge(output, inputs),
        Some(Command::Sample {
            input,
            output,
            rate,
            strategy,
            seed,
            ..
        }) => run_sample(input, output, rate, strategy, seed),
        None => run_pipeline(args),
    }
}

/// Generate, merge and sample a full population
fn run_pipeline(args: CliArgs) -> Result<()> {
    // Validate and create config
    let config = PipelineConfig::from_args(args).context("Invalid configuration")?;

    if config.show_progress {
        print_header(&config);
    }

    let pipeline = Pipeline::new(config.clone()).context("Failed to initialize pipeline")?;
    install_interrupt_handler(pipeline.cancel_token())?;

    let progress = if config.show_progress {
        Some(ProgressReporter::new())
    } else {
        None
    };

    let result = pipeline.run_with(|phase| {
        if let Some(ref p) = progress {
            p.set_phase(phase);
        }
    });

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            if let Some(ref p) = progress {
                p.finish(if e.is_cancelled() { "Run interrupted" } else { "Run failed" });
            }
            return Err(e).context("Pipeline failed");
        }
    };

    if let Some(ref p) = progress {
        p.finish("Run completed");
        print_summary(&report);
    }

    info!(
        seed = report.seed,
        identifiers = report.identifiers,
        "Done"
    );

    Ok(())
}

/// Merge already sorted files into one
fn run_merge(output: PathBuf, inputs: Vec<PathBuf>) -> Result<()> {
    let cancel = CancelToken::new();
    install_interrupt_handler(cancel.clone())?;

    let rows = merge_files(&inputs, &output, &cancel)
        .with_context(|| format!("Failed to merge into '{}'", output.display()))?;

    info!(
        rows,
        inputs = inputs.len(),
        output = %output.display(),
        "Merged {} rows",
        format_number(rows)
    );
    Ok(())
}

/// Sample an existing list file
fn run_sample(
    input: PathBuf,
    output: PathBuf,
    rate: f64,
    strategy: SamplingStrategy,
    seed: Option<u64>,
) -> Result<()> {
    let cancel = CancelToken::new();
    install_interrupt_handler(cancel.clone())?;

    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let rows = sample_file(&input, &output, strategy, rate, None, &mut rng, &cancel)
        .with_context(|| format!("Failed to sample '{}'", input.display()))?;

    info!(
        rows,
        strategy = %strategy,
        output = %output.display(),
        "Sampled {} rows",
        format_number(rows)
    );
    Ok(())
}

fn install_interrupt_handler(cancel: CancelToken) -> Result<()> {
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        cancel.cancel();
    })
    .context("Failed to set signal handler")
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("userlist_gen=debug,warn")
    } else {
        EnvFilter::new("userlist_gen=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
