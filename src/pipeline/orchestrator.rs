//! Pipeline orchestrator - sequences the phases of a run
//!
//! ```text
//! IDLE ──► GENERATE ──► MERGE ──► SAMPLE ──► CLEANUP
//!              │          │         │
//!              └──────────┴─────────┴──────► FAILED (work tree kept)
//! ```
//!
//! Each phase runs its tasks on a [`TaskPool`] and is a barrier: the next
//! phase starts only after every task of the current one returned `Ok`.

use crate::cancel::CancelToken;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result, ShardResult};
use crate::generator::{generate_population, split_population, ShardBuffers};
use crate::membership::Category;
use crate::merge::merge_files;
use crate::pipeline::layout::OutputLayout;
use crate::pipeline::pool::{Task, TaskPool};
use crate::pipeline::seed::{task_rng, TaskStream};
use crate::sample::sample_file;
use crate::shard::{write_shard, ShardOutput};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// State of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Generate,
    Merge,
    Sample,
    Cleanup,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Generate => "generate",
            Phase::Merge => "merge",
            Phase::Sample => "sample",
            Phase::Cleanup => "cleanup",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Final files and counts of one category
#[derive(Debug, Clone)]
pub struct CategoryReport {
    /// Category
    pub category: Category,

    /// Merged list path
    pub list_path: PathBuf,

    /// Rows in the merged list
    pub list_rows: u64,

    /// Sample path
    pub sample_path: PathBuf,

    /// Rows in the sample
    pub sample_rows: u64,
}

/// Wall-clock time spent in each phase
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseDurations {
    pub generate: Duration,
    pub merge: Duration,
    pub sample: Duration,
    pub cleanup: Duration,
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Seed the run was generated from
    pub seed: u64,

    /// Unique identifiers generated
    pub identifiers: u64,

    /// Shards generated
    pub shards: usize,

    /// Per-category results, in category order
    pub categories: [CategoryReport; 3],

    /// Per-phase timings
    pub durations: PhaseDurations,

    /// Total run time
    pub total: Duration,

    /// Whether the work directory was deleted
    pub work_removed: bool,
}

impl PipelineReport {
    /// Report of one category
    pub fn category(&self, category: Category) -> &CategoryReport {
        &self.categories[category.index()]
    }
}

/// Runs GENERATE, MERGE, SAMPLE and CLEANUP for one configuration
pub struct Pipeline {
    /// Configuration
    config: Arc<PipelineConfig>,

    /// Output paths
    layout: OutputLayout,

    /// Shared cancellation flag
    cancel: CancelToken,

    /// Current phase
    phase: Phase,
}

impl Pipeline {
    /// Create a pipeline after validating the configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let layout = OutputLayout::new(&config.output_dir);

        Ok(Self {
            config: Arc::new(config),
            layout,
            cancel: CancelToken::new(),
            phase: Phase::Idle,
        })
    }

    /// Get a clone of the cancellation token (for signal handlers)
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Output layout of this run
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Run every phase
    pub fn run(self) -> Result<PipelineReport> {
        self.run_with(|_| {})
    }

    /// Run every phase, calling `on_phase` on each transition
    pub fn run_with<F: FnMut(Phase)>(mut self, mut on_phase: F) -> Result<PipelineReport> {
        let start = Instant::now();

        info!(
            users = self.config.users,
            shards = self.config.shards,
            workers = self.config.generation_threads(),
            seed = self.config.seed,
            output = %self.layout.base().display(),
            "Starting pipeline"
        );

        match self.execute(&mut on_phase, start) {
            Ok(report) => Ok(report),
            Err(e) => {
                let failed_in = self.phase;
                self.enter(Phase::Failed, &mut on_phase);
                if e.is_cancelled() {
                    warn!(phase = %failed_in, "Pipeline cancelled");
                } else {
                    error!(phase = %failed_in, error = %e, "Pipeline failed");
                }
                info!(work = %self.layout.work_dir().display(), "Work directory kept");
                Err(e)
            }
        }
    }

    fn execute<F: FnMut(Phase)>(
        &mut self,
        on_phase: &mut F,
        start: Instant,
    ) -> Result<PipelineReport> {
        let mut durations = PhaseDurations::default();

        self.prepare_dirs()?;

        self.enter(Phase::Generate, on_phase);
        let phase_start = Instant::now();
        let shards = self.generate()?;
        durations.generate = phase_start.elapsed();
        let identifiers: u64 = shards.iter().map(|s| s.identifiers).sum();
        info!(identifiers, shards = shards.len(), "Generation complete");

        self.enter(Phase::Merge, on_phase);
        let phase_start = Instant::now();
        let list_rows = self.merge(&shards)?;
        durations.merge = phase_start.elapsed();
        info!(
            list1 = list_rows[0],
            list2 = list_rows[1],
            list3 = list_rows[2],
            "Merge complete"
        );

        self.enter(Phase::Sample, on_phase);
        let phase_start = Instant::now();
        let sample_rows = self.sample(list_rows)?;
        durations.sample = phase_start.elapsed();
        info!(
            sample1 = sample_rows[0],
            sample2 = sample_rows[1],
            sample3 = sample_rows[2],
            "Sampling complete"
        );

        self.enter(Phase::Cleanup, on_phase);
        let phase_start = Instant::now();
        let work_removed = self.cleanup()?;
        durations.cleanup = phase_start.elapsed();

        let categories = Category::ALL.map(|category| {
            let i = category.index();
            CategoryReport {
                category,
                list_path: self.layout.list_file(category),
                list_rows: list_rows[i],
                sample_path: self.layout.sample_file(category),
                sample_rows: sample_rows[i],
            }
        });

        Ok(PipelineReport {
            seed: self.config.seed,
            identifiers,
            shards: shards.len(),
            categories,
            durations,
            total: start.elapsed(),
            work_removed,
        })
    }

    fn enter<F: FnMut(Phase)>(&mut self, phase: Phase, on_phase: &mut F) {
        debug!(from = %self.phase, to = %phase, "Phase transition");
        self.phase = phase;
        on_phase(phase);
    }

    fn prepare_dirs(&self) -> Result<()> {
        for dir in [self.layout.base().to_path_buf(), self.layout.work_dir()] {
            fs::create_dir_all(&dir).map_err(|source| PipelineError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// GENERATE: one task per shard, each writing `work/t<id>/list{1,2,3}.tsv`
    fn generate(&self) -> Result<Vec<ShardOutput>> {
        let sizes = split_population(self.config.users, self.config.shards);

        let tasks = sizes
            .into_iter()
            .enumerate()
            .map(|(shard_id, size)| {
                let config = Arc::clone(&self.config);
                let dir = self.layout.shard_dir(shard_id);

                Task::new(format!("shard-{}", shard_id), move |cancel: &CancelToken| {
                    generate_shard(&config, shard_id, size, &dir, cancel, write_shard)
                })
            })
            .collect();

        TaskPool::new("generate", self.config.generation_threads(), self.cancel.clone())
            .run(tasks)
    }

    /// MERGE: one task per category over every shard file of that category
    fn merge(&self, shards: &[ShardOutput]) -> Result<[u64; 3]> {
        let tasks = Category::ALL
            .iter()
            .map(|&category| {
                let inputs: Vec<PathBuf> = shards
                    .iter()
                    .map(|s| s.file(category).path().to_path_buf())
                    .collect();
                let dest = self.layout.list_file(category);

                Task::new(format!("merge-{}", category), move |cancel: &CancelToken| {
                    let rows = merge_files(&inputs, &dest, cancel)?;
                    debug!(category = %category, rows, inputs = inputs.len(), "List merged");
                    Ok(rows)
                })
            })
            .collect();

        let rows = TaskPool::new("merge", Category::ALL.len(), self.cancel.clone()).run(tasks)?;
        Ok(per_category(rows))
    }

    /// SAMPLE: one task per category, each with its own random stream
    fn sample(&self, list_rows: [u64; 3]) -> Result<[u64; 3]> {
        let tasks = Category::ALL
            .iter()
            .map(|&category| {
                let src = self.layout.list_file(category);
                let dest = self.layout.sample_file(category);
                let total = list_rows[category.index()];
                let strategy = self.config.strategy;
                let rate = self.config.sampling_rate;
                let seed = self.config.seed;

                Task::new(format!("sample-{}", category), move |cancel: &CancelToken| {
                    let mut rng = task_rng(seed, TaskStream::Sample(category));
                    let rows =
                        sample_file(&src, &dest, strategy, rate, Some(total), &mut rng, cancel)?;
                    debug!(category = %category, rows, strategy = %strategy, "Sample written");
                    Ok(rows)
                })
            })
            .collect();

        let rows = TaskPool::new("sample", Category::ALL.len(), self.cancel.clone()).run(tasks)?;
        Ok(per_category(rows))
    }

    /// CLEANUP: remove the work tree unless asked to keep it
    fn cleanup(&self) -> Result<bool> {
        let work = self.layout.work_dir();
        if self.config.keep_work {
            info!(work = %work.display(), "Keeping work directory");
            return Ok(false);
        }

        fs::remove_dir_all(&work).map_err(|source| PipelineError::Io {
            path: work.clone(),
            source,
        })?;
        debug!(work = %work.display(), "Work directory removed");
        Ok(true)
    }
}

/// Generate one shard and publish it with `write`, retrying transient I/O
/// failures
///
/// Every attempt restarts from the shard's own seed, so a retried shard
/// is identical to a first-try success.
fn generate_shard<W>(
    config: &PipelineConfig,
    shard_id: usize,
    size: u64,
    dir: &Path,
    cancel: &CancelToken,
    mut write: W,
) -> Result<ShardOutput>
where
    W: FnMut(usize, ShardBuffers, &Path, &CancelToken) -> ShardResult<ShardOutput>,
{
    let mut attempt = 0u32;
    loop {
        let mut rng = task_rng(config.seed, TaskStream::Shard(shard_id));
        let outcome = generate_population(size, &config.table, &mut rng, cancel)
            .and_then(|buffers| write(shard_id, buffers, dir, cancel));

        match outcome {
            Ok(output) => {
                debug!(shard = shard_id, identifiers = output.identifiers, "Shard complete");
                return Ok(output);
            }
            Err(e) if e.is_transient() && attempt < config.retries && !cancel.is_cancelled() => {
                attempt += 1;
                warn!(
                    shard = shard_id,
                    attempt,
                    retries = config.retries,
                    error = %e,
                    "Transient shard failure, retrying"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn per_category(rows: Vec<u64>) -> [u64; 3] {
    let mut out = [0u64; 3];
    for (slot, n) in out.iter_mut().zip(rows) {
        *slot = n;
    }
    out
}
