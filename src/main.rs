use clap::Parser;
use pairrank::config::{RankConfig, DEFAULT_WORKERS};
use pairrank::oracle::DEFAULT_ORACLE;
use pairrank::pipeline;
use pairrank::topk::MAX_RESULTS;
use pairrank::RankError;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pairrank")]
#[command(about = "Rank the most similar submission pairs across a ranking", long_about = None)]
struct Cli {
    /// Directory with one subdirectory of submissions per item
    sols: PathBuf,
    /// Ranking file, one item identifier per line
    ranking_txt: PathBuf,
    /// Items ranked below this go to the high output
    cutoff: usize,
    /// Output file for the high partition
    target_hi: PathBuf,
    /// Output file for the low partition
    target_lo: PathBuf,
    /// Number of worker threads
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    threads: usize,
    /// Results kept per worker and partition
    #[arg(long, default_value_t = MAX_RESULTS)]
    capacity: usize,
    /// Similarity oracle executable, called as `<oracle> [args] <a> <b>`
    #[arg(long, default_value = DEFAULT_ORACLE)]
    oracle: PathBuf,
    /// Extra argument passed to the oracle before the two paths (repeatable)
    #[arg(long = "oracle-arg", allow_hyphen_values = true)]
    oracle_args: Vec<String>,
    /// Skip submission files larger than this many bytes
    #[arg(long)]
    max_submission_bytes: Option<u64>,
    /// Progress refresh interval in milliseconds
    #[arg(long, default_value_t = 200)]
    poll_ms: u64,
}

impl Cli {
    fn into_config(self) -> RankConfig {
        let mut config = RankConfig::new(self.sols, self.ranking_txt, self.cutoff, self.target_hi, self.target_lo);
        config.workers = self.threads;
        config.capacity = self.capacity;
        config.oracle = self.oracle;
        config.oracle_args = self.oracle_args;
        config.max_submission_bytes = self.max_submission_bytes;
        config.poll_interval = Duration::from_millis(self.poll_ms);
        config
    }
}

fn main() -> Result<(), RankError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_config();
    config.log_summary();

    let stats = pipeline::run(&config)?;
    tracing::info!(
        "[pairrank] Done: {} items, {}/{} comparisons",
        stats.items,
        stats.completed_pairs,
        stats.total_pairs
    );
    Ok(())
}
