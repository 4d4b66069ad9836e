use crate::RankError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Which output file an item's best match ends up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    High,
    Low,
}

impl Partition {
    pub fn of(rank: usize, cutoff: usize) -> Self {
        if rank < cutoff {
            Partition::High
        } else {
            Partition::Low
        }
    }
}

/// One ranked entry and the submission files found for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    id: String,
    rank: usize,
    partition: Partition,
    submissions: Vec<PathBuf>,
}

impl Item {
    pub fn new(id: impl Into<String>, rank: usize, cutoff: usize, submissions: Vec<PathBuf>) -> Self {
        Self {
            id: id.into(),
            rank,
            partition: Partition::of(rank, cutoff),
            submissions,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn submissions(&self) -> &[PathBuf] {
        &self.submissions
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }
}

/// Splits ranking text into identifiers. Blank lines carry no identifier and
/// do not take a rank.
pub fn parse_ranking(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn read_ranking(path: &Path) -> Result<Vec<String>, RankError> {
    let text = fs::read_to_string(path).map_err(|e| {
        RankError::Input(format!("cannot read ranking {}: {}", path.display(), e))
    })?;
    Ok(parse_ranking(&text))
}

/// Resolves identifiers to items by listing `base_dir/<id>/`.
pub struct RankingLoader {
    base_dir: PathBuf,
    max_submission_bytes: Option<u64>,
}

impl RankingLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_submission_bytes: None,
        }
    }

    pub fn with_max_submission_bytes(mut self, limit: Option<u64>) -> Self {
        self.max_submission_bytes = limit;
        self
    }

    /// Submission files of one item, sorted by path. A missing directory is
    /// an empty set.
    pub fn discover(&self, id: &str) -> Result<Vec<PathBuf>, RankError> {
        let dir = self.base_dir.join(id);
        if !dir.is_dir() {
            warn!("[loader] No submissions directory for {} at {}", id, dir.display());
            return Ok(Vec::new());
        }

        let mut submissions = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(limit) = self.max_submission_bytes {
                let size = fs::metadata(&path)?.len();
                if size > limit {
                    warn!("[loader] Ignoring too big file {}: {} > {}", path.display(), size, limit);
                    continue;
                }
            }
            submissions.push(path);
        }
        submissions.sort();
        Ok(submissions)
    }

    pub fn load(&self, ids: Vec<String>, cutoff: usize) -> Result<Vec<Item>, RankError> {
        let mut items = Vec::with_capacity(ids.len());
        for (rank, id) in ids.into_iter().enumerate() {
            let submissions = self.discover(&id)?;
            debug!("[loader] {} (rank {}): {} submissions", id, rank, submissions.len());
            items.push(Item::new(id, rank, cutoff, submissions));
        }
        Ok(items)
    }

    pub fn load_file(&self, ranking_path: &Path, cutoff: usize) -> Result<Vec<Item>, RankError> {
        let ids = read_ranking(ranking_path)?;
        self.load(ids, cutoff)
    }
}
