use crate::RankError;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DEFAULT_ORACLE: &str = "./build/compare";

/// Outcome of scoring one submission pair.
///
/// Ordered by score, then by the two paths as plain byte strings, so that any
/// two results compare deterministically. Scores use the IEEE total order.
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub score: f64,
    pub a: PathBuf,
    pub b: PathBuf,
}

impl ComparisonResult {
    pub fn new(score: f64, a: impl Into<PathBuf>, b: impl Into<PathBuf>) -> Self {
        Self {
            score,
            a: a.into(),
            b: b.into(),
        }
    }
}

impl PartialEq for ComparisonResult {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ComparisonResult {}

impl PartialOrd for ComparisonResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ComparisonResult {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_parts((self.score, self.a.as_path(), self.b.as_path()), other)
    }
}

/// Compares an unbuilt result against `other` with the same order as `Ord`.
///
/// Paths compare byte-wise, not component-wise: `sols/mario/x` sorts after
/// `sols/mario.rossi/x` because `/` is greater than `.`.
pub fn compare_parts((score, a, b): (f64, &Path, &Path), other: &ComparisonResult) -> Ordering {
    score
        .total_cmp(&other.score)
        .then_with(|| a.as_os_str().cmp(other.a.as_os_str()))
        .then_with(|| b.as_os_str().cmp(other.b.as_os_str()))
}

/// Output line format: `<score> <a> <b>`. Whole scores keep their `.0`.
impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} {}", self.score, self.a.display(), self.b.display())
    }
}

/// Scores two submissions. Called concurrently from every worker thread.
pub trait SimilarityOracle: Send + Sync {
    fn score(&self, a: &Path, b: &Path) -> Result<f64, RankError>;
}

impl<F> SimilarityOracle for F
where
    F: Fn(&Path, &Path) -> Result<f64, RankError> + Send + Sync,
{
    fn score(&self, a: &Path, b: &Path) -> Result<f64, RankError> {
        self(a, b)
    }
}

/// Runs an external program as `<program> [args...] <a> <b>` and reads the
/// score from the first line of its stdout.
#[derive(Debug, Clone)]
pub struct CommandOracle {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandOracle {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

impl SimilarityOracle for CommandOracle {
    fn score(&self, a: &Path, b: &Path) -> Result<f64, RankError> {
        let failure = |reason: String| RankError::Oracle {
            a: a.to_path_buf(),
            b: b.to_path_buf(),
            reason,
        };

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(a)
            .arg(b)
            .output()
            .map_err(|e| failure(format!("cannot run {}: {}", self.program.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failure(format!("{} ({})", output.status, stderr.trim())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_score(&stdout).map_err(failure)
    }
}

/// Parses the first stdout line of the oracle as a float.
pub fn parse_score(stdout: &str) -> Result<f64, String> {
    let line = stdout
        .lines()
        .next()
        .ok_or_else(|| "empty output".to_string())?;
    line.trim()
        .parse::<f64>()
        .map_err(|e| format!("unparsable score {:?}: {}", line, e))
}
