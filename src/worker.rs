use crate::oracle::{compare_parts, ComparisonResult, SimilarityOracle};
use crate::progress::{ProgressCounter, WorkerSlots};
use crate::ranking::{Item, Partition};
use crate::topk::BoundedTopKHeap;
use crate::RankError;
use std::cmp::Ordering;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use tracing::debug;

/// Item indices owned by `worker` out of `workers`: `worker, worker + workers, ...`.
pub fn stride_indices(worker: usize, workers: usize, len: usize) -> impl Iterator<Item = usize> {
    (worker..len).step_by(workers.max(1))
}

/// Per-worker top-K sets, one per partition.
#[derive(Debug)]
pub struct WorkerResult {
    pub worker: usize,
    pub high: BoundedTopKHeap<ComparisonResult>,
    pub low: BoundedTopKHeap<ComparisonResult>,
}

impl WorkerResult {
    pub fn new(worker: usize, capacity: usize) -> Self {
        Self {
            worker,
            high: BoundedTopKHeap::new(capacity),
            low: BoundedTopKHeap::new(capacity),
        }
    }

    pub fn heap_mut(&mut self, partition: Partition) -> &mut BoundedTopKHeap<ComparisonResult> {
        match partition {
            Partition::High => &mut self.high,
            Partition::Low => &mut self.low,
        }
    }
}

fn improves(best: &Option<ComparisonResult>, score: f64, a: &Path, b: &Path) -> bool {
    match best {
        None => true,
        Some(best) => compare_parts((score, a, b), best) == Ordering::Greater,
    }
}

/// Shared state every worker of one run sees.
pub struct WorkerContext<'a, O: SimilarityOracle + ?Sized> {
    pub items: &'a [Item],
    pub oracle: &'a O,
    pub counter: &'a ProgressCounter,
    pub slots: &'a WorkerSlots,
    pub abort: &'a AtomicBool,
    pub workers: usize,
    pub capacity: usize,
}

impl<'a, O: SimilarityOracle + ?Sized> WorkerContext<'a, O> {
    /// Best result of `items[index]` against every submission of every later
    /// item. The counter advances by `n_i * n_j` once each later item is done.
    pub fn best_match(&self, index: usize) -> Result<Option<ComparisonResult>, RankError> {
        let item = &self.items[index];
        if item.is_empty() {
            return Ok(None);
        }

        let mut best: Option<ComparisonResult> = None;
        for other in &self.items[index + 1..] {
            for a in item.submissions() {
                for b in other.submissions() {
                    if self.abort.load(AtomicOrdering::Relaxed) {
                        return Err(RankError::Aborted);
                    }
                    let score = self.oracle.score(a, b)?;
                    if improves(&best, score, a, b) {
                        best = Some(ComparisonResult::new(score, a, b));
                    }
                }
            }
            self.counter.add((item.len() * other.len()) as u64);
        }
        Ok(best)
    }

    fn raise_abort(&self, err: RankError) -> RankError {
        if !matches!(err, RankError::Aborted) {
            self.abort.store(true, AtomicOrdering::Relaxed);
        }
        err
    }
}

/// Processes one stride of the ranking.
pub struct WorkerTask<'a, O: SimilarityOracle + ?Sized> {
    id: usize,
    ctx: &'a WorkerContext<'a, O>,
}

impl<'a, O: SimilarityOracle + ?Sized> WorkerTask<'a, O> {
    pub fn new(id: usize, ctx: &'a WorkerContext<'a, O>) -> Self {
        Self { id, ctx }
    }

    pub fn run(&self) -> Result<WorkerResult, RankError> {
        let ctx = self.ctx;
        let mut result = WorkerResult::new(self.id, ctx.capacity);
        let mut recorded = 0usize;

        for index in stride_indices(self.id, ctx.workers, ctx.items.len()) {
            ctx.slots.set(self.id, index);
            let best = ctx.best_match(index).map_err(|e| ctx.raise_abort(e))?;
            if let Some(best) = best {
                let item = &ctx.items[index];
                result.heap_mut(item.partition()).push(best);
                recorded += 1;
            }
        }
        ctx.slots.clear(self.id);

        debug!(
            "[worker {}] Done: {} best matches, high {} / low {} retained",
            self.id,
            recorded,
            result.high.len(),
            result.low.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;

    fn items(layout: &[(&str, &[&str])], cutoff: usize) -> Vec<Item> {
        layout.iter()
            .enumerate()
            .map(|(rank, (id, subs))| {
                Item::new(*id, rank, cutoff, subs.iter().map(|s| PathBuf::from(*s)).collect())
            })
            .collect()
    }

    fn table_oracle(scores: &[(&str, &str, f64)]) -> impl Fn(&Path, &Path) -> Result<f64, RankError> + Send + Sync + use<> {
        let table: HashMap<(PathBuf, PathBuf), f64> = scores
            .iter()
            .map(|(a, b, s)| ((PathBuf::from(*a), PathBuf::from(*b)), *s))
            .collect();
        move |a: &Path, b: &Path| {
            table
                .get(&(a.to_path_buf(), b.to_path_buf()))
                .copied()
                .ok_or_else(|| RankError::Other(format!("no score for {:?} {:?}", a, b)))
        }
    }

    fn scenario_items() -> Vec<Item> {
        items(&[("u1", &["a", "b"]), ("u2", &["c"]), ("u3", &["d", "e"])], 1)
    }

    fn scenario_scores() -> Vec<(&'static str, &'static str, f64)> {
        vec![
            ("a", "c", 0.9),
            ("a", "d", 0.2),
            ("a", "e", 0.3),
            ("b", "c", 0.5),
            ("b", "d", 0.1),
            ("b", "e", 0.8),
            ("c", "d", 0.4),
            ("c", "e", 0.6),
        ]
    }

    #[test]
    fn test_stride_indices() {
        assert_eq!(stride_indices(1, 3, 8).collect::<Vec<_>>(), vec![1, 4, 7]);
        assert_eq!(stride_indices(0, 1, 3).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(stride_indices(5, 8, 3).count(), 0);
    }

    #[test]
    fn test_strides_cover_every_index_once() {
        let mut seen = vec![0; 23];
        for w in 0..4 {
            for i in stride_indices(w, 4, 23) {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_best_match_scenario() {
        let items = scenario_items();
        let oracle = table_oracle(&scenario_scores());
        let counter = ProgressCounter::new();
        let slots = WorkerSlots::new(1);
        let abort = AtomicBool::new(false);
        let ctx = WorkerContext {
            items: &items,
            oracle: &oracle,
            counter: &counter,
            slots: &slots,
            abort: &abort,
            workers: 1,
            capacity: 10,
        };

        assert_eq!(ctx.best_match(0).unwrap(), Some(ComparisonResult::new(0.9, "a", "c")));
        assert_eq!(ctx.best_match(1).unwrap(), Some(ComparisonResult::new(0.6, "c", "e")));
        assert_eq!(ctx.best_match(2).unwrap(), None);
        assert_eq!(counter.get(), 8);
    }

    #[test]
    fn test_tie_broken_by_paths() {
        let items = items(&[("u1", &["a", "b"]), ("u2", &["c", "d"])], 0);
        let oracle = |_: &Path, _: &Path| -> Result<f64, RankError> { Ok(1.0) };
        let counter = ProgressCounter::new();
        let slots = WorkerSlots::new(1);
        let abort = AtomicBool::new(false);
        let ctx = WorkerContext {
            items: &items,
            oracle: &oracle,
            counter: &counter,
            slots: &slots,
            abort: &abort,
            workers: 1,
            capacity: 10,
        };
        assert_eq!(ctx.best_match(0).unwrap(), Some(ComparisonResult::new(1.0, "b", "d")));
    }

    #[test]
    fn test_tie_across_sibling_item_dirs() {
        let items = items(
            &[
                ("u1", &["sols/u1/x"]),
                ("mario", &["sols/mario/x"]),
                ("mario.rossi", &["sols/mario.rossi/x"]),
            ],
            3,
        );
        let oracle = |_: &Path, _: &Path| -> Result<f64, RankError> { Ok(50.0) };
        let counter = ProgressCounter::new();
        let slots = WorkerSlots::new(1);
        let abort = AtomicBool::new(false);
        let ctx = WorkerContext {
            items: &items,
            oracle: &oracle,
            counter: &counter,
            slots: &slots,
            abort: &abort,
            workers: 1,
            capacity: 10,
        };
        assert_eq!(
            ctx.best_match(0).unwrap(),
            Some(ComparisonResult::new(50.0, "sols/u1/x", "sols/mario/x"))
        );
        assert_eq!(
            ctx.best_match(1).unwrap(),
            Some(ComparisonResult::new(50.0, "sols/mario/x", "sols/mario.rossi/x"))
        );
    }

    #[test]
    fn test_only_later_items_are_compared() {
        let items = items(&[("u1", &["a"]), ("u2", &["b"]), ("u3", &["c"])], 0);
        let calls = std::sync::Mutex::new(Vec::new());
        let oracle = |a: &Path, b: &Path| -> Result<f64, RankError> {
            calls.lock().unwrap().push((a.to_path_buf(), b.to_path_buf()));
            Ok(0.0)
        };
        let counter = ProgressCounter::new();
        let slots = WorkerSlots::new(1);
        let abort = AtomicBool::new(false);
        let ctx = WorkerContext {
            items: &items,
            oracle: &oracle,
            counter: &counter,
            slots: &slots,
            abort: &abort,
            workers: 1,
            capacity: 10,
        };
        ctx.best_match(1).unwrap();
        let calls = calls.into_inner().unwrap();
        assert_eq!(calls, vec![(PathBuf::from("b"), PathBuf::from("c"))]);
    }

    #[test]
    fn test_empty_item_is_skipped() {
        let items = items(&[("u1", &[]), ("u2", &["b"])], 0);
        let oracle = |_: &Path, _: &Path| -> Result<f64, RankError> { Ok(0.5) };
        let counter = ProgressCounter::new();
        let slots = WorkerSlots::new(1);
        let abort = AtomicBool::new(false);
        let ctx = WorkerContext {
            items: &items,
            oracle: &oracle,
            counter: &counter,
            slots: &slots,
            abort: &abort,
            workers: 1,
            capacity: 10,
        };
        let result = WorkerTask::new(0, &ctx).run().unwrap();
        assert!(result.high.is_empty());
        assert!(result.low.is_empty());
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn test_worker_routes_by_partition() {
        let items = scenario_items();
        let oracle = table_oracle(&scenario_scores());
        let counter = ProgressCounter::new();
        let slots = WorkerSlots::new(1);
        let abort = AtomicBool::new(false);
        let ctx = WorkerContext {
            items: &items,
            oracle: &oracle,
            counter: &counter,
            slots: &slots,
            abort: &abort,
            workers: 1,
            capacity: 10,
        };
        let result = WorkerTask::new(0, &ctx).run().unwrap();
        assert_eq!(result.high.into_sorted_vec(), vec![ComparisonResult::new(0.9, "a", "c")]);
        assert_eq!(result.low.into_sorted_vec(), vec![ComparisonResult::new(0.6, "c", "e")]);
        assert_eq!(slots.snapshot(), vec![None]);
    }

    #[test]
    fn test_failure_raises_abort() {
        let items = items(&[("u1", &["a"]), ("u2", &["b"])], 0);
        let oracle = |a: &Path, b: &Path| -> Result<f64, RankError> {
            Err(RankError::Oracle {
                a: a.to_path_buf(),
                b: b.to_path_buf(),
                reason: "boom".to_string(),
            })
        };
        let counter = ProgressCounter::new();
        let slots = WorkerSlots::new(1);
        let abort = AtomicBool::new(false);
        let ctx = WorkerContext {
            items: &items,
            oracle: &oracle,
            counter: &counter,
            slots: &slots,
            abort: &abort,
            workers: 1,
            capacity: 10,
        };
        let err = WorkerTask::new(0, &ctx).run().unwrap_err();
        assert!(matches!(err, RankError::Oracle { .. }));
        assert!(abort.load(AtomicOrdering::Relaxed));
    }

    #[test]
    fn test_raised_abort_stops_before_oracle() {
        let items = items(&[("u1", &["a"]), ("u2", &["b"])], 0);
        let calls = AtomicUsize::new(0);
        let oracle = |_: &Path, _: &Path| -> Result<f64, RankError> {
            calls.fetch_add(1, AtomicOrdering::Relaxed);
            Ok(0.0)
        };
        let counter = ProgressCounter::new();
        let slots = WorkerSlots::new(1);
        let abort = AtomicBool::new(true);
        let ctx = WorkerContext {
            items: &items,
            oracle: &oracle,
            counter: &counter,
            slots: &slots,
            abort: &abort,
            workers: 1,
            capacity: 10,
        };
        let err = WorkerTask::new(0, &ctx).run().unwrap_err();
        assert!(matches!(err, RankError::Aborted));
        assert_eq!(calls.load(AtomicOrdering::Relaxed), 0);
    }
}
