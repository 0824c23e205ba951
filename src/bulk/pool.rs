use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};

use crate::catch_all::CatchAllCache;
use crate::classifier::ValidationResult;
use crate::resolver::DnsLookup;
use crate::smtp::Connector;
use crate::verifier::Verifier;

use super::types::{BulkError, BulkReport, Completed, Summary};

/// Results of a running job in completion order.
///
/// Yields exactly one [`Completed`] per submitted address. Worker threads
/// are joined once the stream is drained.
#[derive(Debug)]
pub struct ResultStream {
    rx: mpsc::Receiver<Completed>,
    handles: Vec<JoinHandle<()>>,
    total: usize,
}

impl ResultStream {
    /// Number of addresses submitted.
    pub fn total(&self) -> usize {
        self.total
    }

    fn join_workers(&mut self) {
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("bulk worker exited abnormally");
            }
        }
    }
}

impl Iterator for ResultStream {
    type Item = Completed;

    fn next(&mut self) -> Option<Completed> {
        match self.rx.recv() {
            Ok(completed) => Some(completed),
            Err(_) => {
                self.join_workers();
                None
            }
        }
    }
}

/// Starts `min(concurrency, addresses)` workers pulling indices from a
/// shared counter. Every worker shares one catch-all cache for the job.
///
/// The result channel holds one pending result per worker; a consumer that
/// stops reading stalls the workers instead of growing the queue.
pub(crate) fn spawn_pool<D, C>(
    verifier: Arc<Verifier<D, C>>,
    addresses: Arc<[String]>,
    concurrency: usize,
) -> Result<ResultStream, BulkError>
where
    D: DnsLookup + 'static,
    C: Connector + 'static,
{
    if concurrency == 0 {
        return Err(BulkError::InvalidConcurrency(concurrency));
    }
    let total = addresses.len();
    let workers = concurrency.min(total);
    let cache = Arc::new(CatchAllCache::new());
    let next = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::sync_channel(workers.max(1));

    let mut handles = Vec::with_capacity(workers);
    for id in 0..workers {
        let verifier = Arc::clone(&verifier);
        let addresses = Arc::clone(&addresses);
        let cache = Arc::clone(&cache);
        let next = Arc::clone(&next);
        let tx = tx.clone();
        let handle = thread::Builder::new()
            .name(format!("mailprobe-worker-{id}"))
            .spawn(move || {
                while let Some(completed) = run_next(&verifier, &addresses, &cache, &next) {
                    if tx.send(completed).is_err() {
                        break;
                    }
                }
            })
            .map_err(BulkError::spawn)?;
        handles.push(handle);
    }
    tracing::debug!(total, workers, "bulk job started");

    Ok(ResultStream { rx, handles, total })
}

fn run_next<D, C>(
    verifier: &Verifier<D, C>,
    addresses: &[String],
    cache: &CatchAllCache,
    next: &AtomicUsize,
) -> Option<Completed>
where
    D: DnsLookup,
    C: Connector,
{
    let index = next.fetch_add(1, Ordering::Relaxed);
    let raw = addresses.get(index)?;
    let result = panic::catch_unwind(AssertUnwindSafe(|| verifier.verify_cached(raw, cache)))
        .unwrap_or_else(|_| {
            tracing::warn!(index, email = %raw, "verification pipeline panicked");
            ValidationResult::internal_failure(raw)
        });
    Some(Completed { index, result })
}

/// Drains `stream` into input order. The collector is the only writer of
/// the summary.
pub(crate) fn collect_report(stream: ResultStream, addresses: &[String]) -> BulkReport {
    let total = stream.total();
    let mut slots: Vec<Option<ValidationResult>> = vec![None; total];
    let mut summary = Summary::default();
    for Completed { index, result } in stream {
        summary.record(result.status);
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(result);
        }
    }

    let results = slots
        .into_iter()
        .zip(addresses)
        .map(|(slot, raw)| {
            slot.unwrap_or_else(|| {
                let missing = ValidationResult::internal_failure(raw);
                summary.record(missing.status);
                missing
            })
        })
        .collect();
    BulkReport {
        results,
        summary,
        total,
    }
}
