//! Progress reporting for pipeline runs
//!
//! A spinner shows the current phase while a run is in flight; the header
//! and summary are printed before and after it.

use crate::config::PipelineConfig;
use crate::membership::Membership;
use crate::pipeline::{Phase, PipelineReport};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Spinner that displays the current pipeline phase
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Show the phase the pipeline just entered
    pub fn set_phase(&self, phase: Phase) {
        let msg = match phase {
            Phase::Idle => "Starting...",
            Phase::Generate => "Generating shards...",
            Phase::Merge => "Merging category lists...",
            Phase::Sample => "Sampling category lists...",
            Phase::Cleanup => "Removing work directory...",
            Phase::Failed => "Failed",
        };
        self.set_status(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

fn file_size(path: &Path) -> String {
    match fs::metadata(path) {
        Ok(meta) => format_size(meta.len(), BINARY),
        Err(_) => "-".to_string(),
    }
}

/// Print a header at the start of a run
pub fn print_header(config: &PipelineConfig) {
    let probabilities = Membership::ALL
        .iter()
        .map(|&m| format!("{}={:.4}", m.label(), config.table.probability(m)))
        .collect::<Vec<_>>()
        .join(" ");

    println!();
    println!(
        "{} {}",
        style("userlist-gen").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Probabilities:").bold(), probabilities);
    println!("  {} {}", style("Users:").bold(), format_number(config.users));
    println!(
        "  {} {} ({} threads)",
        style("Shards:").bold(),
        config.shards,
        config.generation_threads()
    );
    println!(
        "  {} {} ({})",
        style("Sampling:").bold(),
        config.sampling_rate,
        config.strategy
    );
    println!("  {} {}", style("Seed:").bold(), config.seed);
    println!("  {} {}", style("Output:").bold(), config.output_dir.display());
    println!();
}

/// Print a summary of a completed run
pub fn print_summary(report: &PipelineReport) {
    let total_secs = report.total.as_secs_f64();
    let rate = if total_secs > 0.0 {
        report.identifiers as f64 / total_secs
    } else {
        0.0
    };

    println!();
    println!("{}", style("Run Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Identifiers:").bold(),
        format_number(report.identifiers)
    );
    for category in &report.categories {
        println!(
            "  {} {} rows ({}), sample {} rows ({})",
            style(format!("List {}:", category.category)).bold(),
            format_number(category.list_rows),
            file_size(&category.list_path),
            format_number(category.sample_rows),
            file_size(&category.sample_path),
        );
    }
    let d = &report.durations;
    println!(
        "  {} generate {:.1}s, merge {:.1}s, sample {:.1}s, cleanup {:.1}s",
        style("Phases:").bold(),
        d.generate.as_secs_f64(),
        d.merge.as_secs_f64(),
        d.sample.as_secs_f64(),
        d.cleanup.as_secs_f64(),
    );
    println!(
        "  {} {:.1}s ({:.0} users/sec)",
        style("Duration:").bold(),
        total_secs,
        rate
    );
    if !report.work_removed {
        println!("  {} kept", style("Work dir:").yellow().bold());
    }
    println!();
}
