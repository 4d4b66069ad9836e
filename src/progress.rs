use crossbeam_channel::{select, tick, Receiver};
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

const IDLE: usize = usize::MAX;

/// Completed submission-pair comparisons across all workers.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    done: AtomicU64,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, n: u64) {
        self.done.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }
}

/// Item index each worker is currently on. Each slot has a single writer.
#[derive(Debug)]
pub struct WorkerSlots {
    slots: Vec<AtomicUsize>,
}

impl WorkerSlots {
    pub fn new(workers: usize) -> Self {
        Self {
            slots: (0..workers).map(|_| AtomicUsize::new(IDLE)).collect(),
        }
    }

    pub fn set(&self, worker: usize, index: usize) {
        if let Some(slot) = self.slots.get(worker) {
            slot.store(index, Ordering::Relaxed);
        }
    }

    pub fn clear(&self, worker: usize) {
        self.set(worker, IDLE);
    }

    pub fn snapshot(&self) -> Vec<Option<usize>> {
        self.slots
            .iter()
            .map(|slot| match slot.load(Ordering::Relaxed) {
                IDLE => None,
                index => Some(index),
            })
            .collect()
    }
}

/// Linear extrapolation of the remaining time. `None` until some work is done.
pub fn estimate_eta(elapsed: Duration, done: u64, total: u64) -> Option<Duration> {
    if done == 0 {
        return None;
    }
    let remaining = total.saturating_sub(done) as f64;
    Some(Duration::from_secs_f64(elapsed.as_secs_f64() * remaining / done as f64))
}

/// `h:mm:ss.s`, hours padded to four columns.
pub fn format_eta(eta: Duration) -> String {
    let secs = eta.as_secs_f64();
    let hours = (secs / 3600.0).floor() as u64;
    let minutes = ((secs % 3600.0) / 60.0).floor() as u64;
    let seconds = secs % 60.0;
    format!("{:4}:{:02}:{:04.1}", hours, minutes, seconds)
}

pub fn format_status(done: u64, total: u64, eta: Duration, current: &[Option<usize>]) -> String {
    let pct = if total == 0 { 100.0 } else { done as f64 / total as f64 * 100.0 };
    let cur = current
        .iter()
        .map(|slot| match slot {
            Some(index) => index.to_string(),
            None => "-".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "{:8} / {} ({:6.2}%) ETA {} | cur {}",
        done,
        total,
        pct,
        format_eta(eta),
        cur
    )
}

/// Prints a self-overwriting status line until the counter reaches `total`
/// or the pool hangs up the shutdown channel.
pub struct ProgressMonitor {
    total: u64,
    interval: Duration,
}

impl ProgressMonitor {
    pub fn new(total: u64, interval: Duration) -> Self {
        Self { total, interval }
    }

    pub fn run<W: Write>(
        &self,
        counter: &ProgressCounter,
        slots: &WorkerSlots,
        shutdown: &Receiver<()>,
        out: &mut W,
    ) -> io::Result<()> {
        if self.total == 0 {
            return Ok(());
        }

        let start = Instant::now();
        let ticker = tick(self.interval);
        loop {
            let done = counter.get();
            if done >= self.total {
                break;
            }
            if let Some(eta) = estimate_eta(start.elapsed(), done, self.total) {
                let line = format_status(done, self.total, eta, &slots.snapshot());
                write!(out, "\r\x1b[K{}", line)?;
                out.flush()?;
            }
            let stop = select! {
                recv(ticker) -> _ => false,
                recv(shutdown) -> _ => true,
            };
            if stop {
                break;
            }
        }
        writeln!(out)?;
        out.flush()
    }
}
