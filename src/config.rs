use crate::oracle::DEFAULT_ORACLE;
use crate::progress::DEFAULT_POLL_INTERVAL;
use crate::topk::MAX_RESULTS;
use crate::RankError;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_WORKERS: usize = 8;

/// Everything one ranking run needs.
#[derive(Debug, Clone)]
pub struct RankConfig {
    /// `sols/<item>/<submission>` tree.
    pub sols: PathBuf,
    pub ranking: PathBuf,
    /// Items ranked below this go to the high output.
    pub cutoff: usize,
    pub target_hi: PathBuf,
    pub target_lo: PathBuf,
    pub workers: usize,
    /// Results kept per worker and partition.
    pub capacity: usize,
    pub oracle: PathBuf,
    pub oracle_args: Vec<String>,
    pub max_submission_bytes: Option<u64>,
    pub poll_interval: Duration,
}

impl RankConfig {
    pub fn new(
        sols: impl Into<PathBuf>,
        ranking: impl Into<PathBuf>,
        cutoff: usize,
        target_hi: impl Into<PathBuf>,
        target_lo: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sols: sols.into(),
            ranking: ranking.into(),
            cutoff,
            target_hi: target_hi.into(),
            target_lo: target_lo.into(),
            workers: DEFAULT_WORKERS,
            capacity: MAX_RESULTS,
            oracle: PathBuf::from(DEFAULT_ORACLE),
            oracle_args: Vec::new(),
            max_submission_bytes: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn validate(&self) -> Result<(), RankError> {
        if self.workers == 0 {
            return Err(RankError::Input("worker count must be at least 1".to_string()));
        }
        if self.capacity == 0 {
            return Err(RankError::Input("result capacity must be at least 1".to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(RankError::Input("poll interval must be positive".to_string()));
        }
        if !self.sols.is_dir() {
            return Err(RankError::Input(format!(
                "solutions directory {} does not exist",
                self.sols.display()
            )));
        }
        Ok(())
    }

    pub fn log_summary(&self) {
        info!("[config] Solutions: {}", self.sols.display());
        info!("[config] Ranking: {} (cutoff {})", self.ranking.display(), self.cutoff);
        info!("[config] Outputs: high {} / low {}", self.target_hi.display(), self.target_lo.display());
        info!("[config] Workers: {}, results kept per worker: {}", self.workers, self.capacity);
        info!("[config] Oracle: {} {:?}", self.oracle.display(), self.oracle_args);
        if let Some(limit) = self.max_submission_bytes {
            info!("[config] Ignoring submissions over {} bytes", limit);
        }
    }
}
