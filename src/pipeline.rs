use crate::config::RankConfig;
use crate::merger::{write_results_file, MergedResults};
use crate::oracle::{CommandOracle, SimilarityOracle};
use crate::pairs::count_pairs;
use crate::progress::{ProgressCounter, ProgressMonitor, WorkerSlots};
use crate::ranking::{Item, RankingLoader};
use crate::worker::{WorkerContext, WorkerResult, WorkerTask};
use crate::RankError;
use crossbeam_channel::bounded;
use std::io::{self, Write};
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Pool settings for [`rank_items`].
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub workers: usize,
    pub capacity: usize,
    pub cutoff: usize,
    pub poll_interval: Duration,
}

impl PoolOptions {
    pub fn from_config(config: &RankConfig) -> Self {
        Self {
            workers: config.workers,
            capacity: config.capacity,
            cutoff: config.cutoff,
            poll_interval: config.poll_interval,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub items: usize,
    pub total_pairs: u64,
    pub completed_pairs: u64,
    pub high: usize,
    pub low: usize,
}

/// Runs the worker pool over `items` and merges the per-worker results.
///
/// Progress goes to `progress_out` from a monitor thread. The first worker
/// error stops the rest of the pool and is returned; nothing is merged then.
pub fn rank_items<O, W>(
    items: &[Item],
    oracle: &O,
    options: &PoolOptions,
    mut progress_out: W,
) -> Result<(MergedResults, RunStats), RankError>
where
    O: SimilarityOracle + ?Sized,
    W: Write + Send,
{
    let workers = options.workers.max(1);
    let total = count_pairs(items, options.cutoff);
    info!("[pairrank] {} items, {} comparisons, {} workers", items.len(), total, workers);

    let counter = ProgressCounter::new();
    let slots = WorkerSlots::new(workers);
    let abort = AtomicBool::new(false);
    let ctx = WorkerContext {
        items,
        oracle,
        counter: &counter,
        slots: &slots,
        abort: &abort,
        workers,
        capacity: options.capacity,
    };
    let monitor = ProgressMonitor::new(total, options.poll_interval);
    let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

    let (outcomes, monitor_outcome) = thread::scope(|s| {
        let (counter, slots, shutdown_rx, monitor) = (&counter, &slots, &shutdown_rx, &monitor);
        let monitor_handle = s.spawn(move || monitor.run(counter, slots, shutdown_rx, &mut progress_out));

        let ctx = &ctx;
        let handles: Vec<_> = (0..workers)
            .map(|w| s.spawn(move || WorkerTask::new(w, ctx).run()))
            .collect();
        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join()).collect();

        drop(shutdown_tx);
        (outcomes, monitor_handle.join())
    });

    match monitor_outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("[pairrank] Progress display failed: {}", e),
        Err(_) => warn!("[pairrank] Progress monitor panicked"),
    }

    let mut results: Vec<WorkerResult> = Vec::with_capacity(workers);
    let mut first_error: Option<RankError> = None;
    for outcome in outcomes {
        let err = match outcome {
            Ok(Ok(result)) => {
                results.push(result);
                continue;
            }
            Ok(Err(e)) => e,
            Err(_) => RankError::Other("worker thread panicked".to_string()),
        };
        let replace = match &first_error {
            None => true,
            Some(RankError::Aborted) => !matches!(err, RankError::Aborted),
            Some(_) => false,
        };
        if replace {
            first_error = Some(err);
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    let completed = counter.get();
    if completed != total {
        warn!("[pairrank] Completed {} comparisons, expected {}", completed, total);
    }

    let merged = MergedResults::from_workers(results);
    let stats = RunStats {
        items: items.len(),
        total_pairs: total,
        completed_pairs: completed,
        high: merged.high.len(),
        low: merged.low.len(),
    };
    Ok((merged, stats))
}

/// Loads the ranking, runs the pool with `oracle`, and writes both outputs.
pub fn run_with_oracle<O, W>(config: &RankConfig, oracle: &O, progress_out: W) -> Result<RunStats, RankError>
where
    O: SimilarityOracle + ?Sized,
    W: Write + Send,
{
    config.validate()?;

    let start = Instant::now();
    let loader = RankingLoader::new(&config.sols).with_max_submission_bytes(config.max_submission_bytes);
    let items = loader.load_file(&config.ranking, config.cutoff)?;
    let submissions: usize = items.iter().map(Item::len).sum();
    info!("[pairrank] Loaded {} items with {} submissions", items.len(), submissions);

    let (merged, stats) = rank_items(&items, oracle, &PoolOptions::from_config(config), progress_out)?;

    write_results_file(&config.target_hi, &merged.high)?;
    write_results_file(&config.target_lo, &merged.low)?;
    info!(
        "[pairrank] Wrote {} high / {} low results in {:.1}s",
        stats.high,
        stats.low,
        start.elapsed().as_secs_f64()
    );
    Ok(stats)
}

/// Full run against the configured oracle executable, progress on stdout.
pub fn run(config: &RankConfig) -> Result<RunStats, RankError> {
    let oracle = CommandOracle::new(&config.oracle).with_args(config.oracle_args.clone());
    run_with_oracle(config, &oracle, io::stdout())
}
