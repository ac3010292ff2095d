//! Bulk execution of independent lookups
//!
//! Used for fetching the value domain of every variable in a table. Both
//! strategies return results in input order and fail as a whole on the
//! first error.

use super::error::Result;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// How a batch of independent lookups is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStrategy {
    /// One lookup after the other on the calling thread
    #[default]
    Sequential,
    /// A bounded pool of scoped worker threads
    Concurrent { workers: usize },
}

impl FetchStrategy {
    /// Strategy for a worker count: 0 or 1 means sequential
    pub fn with_workers(workers: usize) -> Self {
        if workers <= 1 {
            FetchStrategy::Sequential
        } else {
            FetchStrategy::Concurrent { workers }
        }
    }

    /// Run `fetch` for every item, returning results in input order
    ///
    /// Stops at the first failure. With several workers, lookups already in
    /// flight finish but no new ones are started; the reported error is the
    /// one with the lowest input index among those observed.
    pub fn run<I, T, F>(&self, items: &[I], fetch: F) -> Result<Vec<T>>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> Result<T> + Sync,
    {
        match *self {
            FetchStrategy::Sequential => items.iter().map(&fetch).collect(),
            FetchStrategy::Concurrent { workers } => run_pooled(items, workers, &fetch),
        }
    }
}

fn run_pooled<I, T, F>(items: &[I], workers: usize, fetch: &F) -> Result<Vec<T>>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> Result<T> + Sync,
{
    let workers = workers.clamp(1, items.len().max(1));
    let next = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);

    let per_worker: Vec<Vec<(usize, Result<T>)>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    let mut done = Vec::new();
                    while !failed.load(Ordering::Acquire) {
                        let idx = next.fetch_add(1, Ordering::AcqRel);
                        if idx >= items.len() {
                            break;
                        }
                        let result = fetch(&items[idx]);
                        if result.is_err() {
                            failed.store(true, Ordering::Release);
                        }
                        done.push((idx, result));
                    }
                    done
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(done) => done,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut slots: Vec<Option<Result<T>>> = (0..items.len()).map(|_| None).collect();
    for (idx, result) in per_worker.into_iter().flatten() {
        slots[idx] = Some(result);
    }

    // Lowest-index error wins; without errors every slot is filled
    let mut results = Vec::with_capacity(items.len());
    let mut first_error = None;
    for slot in slots {
        match slot {
            Some(Ok(value)) => results.push(value),
            Some(Err(e)) => {
                first_error = Some(e);
                break;
            }
            None => {}
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(results),
    }
}
