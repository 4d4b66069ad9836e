use crate::oracle::ComparisonResult;
use crate::ranking::Partition;
use crate::topk::BoundedTopKHeap;
use crate::worker::WorkerResult;
use crate::RankError;
use itertools::Itertools;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Merges ascending runs into one ascending sequence, keeping each run's
/// relative order.
pub fn merge_ascending<T: Ord>(runs: Vec<Vec<T>>) -> Vec<T> {
    runs.into_iter().kmerge().collect()
}

/// Union of every worker's top-K set for one partition, best first.
///
/// Not re-bounded: with W workers the result can hold up to W * K entries.
pub fn merge_heaps(heaps: Vec<BoundedTopKHeap<ComparisonResult>>) -> Vec<ComparisonResult> {
    let runs = heaps.into_iter().map(BoundedTopKHeap::into_sorted_vec).collect();
    let mut merged = merge_ascending(runs);
    merged.reverse();
    merged
}

/// Final high and low result lists, each best first.
#[derive(Debug, Default)]
pub struct MergedResults {
    pub high: Vec<ComparisonResult>,
    pub low: Vec<ComparisonResult>,
}

impl MergedResults {
    pub fn from_workers(results: Vec<WorkerResult>) -> Self {
        let (high, low): (Vec<_>, Vec<_>) = results.into_iter().map(|r| (r.high, r.low)).unzip();
        Self {
            high: merge_heaps(high),
            low: merge_heaps(low),
        }
    }

    pub fn partition(&self, partition: Partition) -> &[ComparisonResult] {
        match partition {
            Partition::High => &self.high,
            Partition::Low => &self.low,
        }
    }
}

pub fn write_results<W: Write>(out: &mut W, results: &[ComparisonResult]) -> std::io::Result<()> {
    for result in results {
        writeln!(out, "{}", result)?;
    }
    out.flush()
}

pub fn write_results_file(path: &Path, results: &[ComparisonResult]) -> Result<(), RankError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut out = BufWriter::new(File::create(path)?);
    write_results(&mut out, results)?;
    Ok(())
}
