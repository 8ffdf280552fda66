use crate::application::buffer::BoletoBuffer;
use crate::domain::boleto::Boleto;
use crate::domain::ports::SharedPublisher;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

/// Reference batch size used when nothing else is configured.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 10_000;

/// Lifecycle of a single flush. The dispatcher always returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Draining,
    Publishing,
}

impl DispatcherState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Draining,
            2 => Self::Publishing,
            _ => Self::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    /// Records taken out of the buffer for this batch.
    pub drained: usize,
    /// Records whose publish was initiated successfully.
    pub initiated: usize,
    /// Records whose publish failed to initiate.
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Another flush held the permit; nothing was done.
    Busy,
    /// The buffer had nothing to drain.
    Empty,
    Dispatched(DispatchReport),
    /// The publish loop panicked part way through the batch. Records left in the
    /// buffer are untouched; the rest of this batch is lost.
    Aborted(DispatchReport),
}

impl FlushOutcome {
    pub fn drained(&self) -> usize {
        match self {
            Self::Dispatched(report) | Self::Aborted(report) => report.drained,
            Self::Busy | Self::Empty => 0,
        }
    }
}

/// Point-in-time copy of the dispatcher counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatcherStats {
    pub batches: u64,
    pub busy_skips: u64,
    pub records_dispatched: u64,
    pub publish_failures: u64,
    pub aborted_flushes: u64,
    /// Highest number of flushes ever observed inside the critical section at once.
    pub peak_concurrency: usize,
}

#[derive(Default)]
struct Counters {
    batches: AtomicU64,
    busy_skips: AtomicU64,
    records_dispatched: AtomicU64,
    publish_failures: AtomicU64,
    aborted_flushes: AtomicU64,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Marks one flush inside the drain-and-dispatch section for as long as it lives.
struct CriticalSection<'a>(&'a Counters);

impl<'a> CriticalSection<'a> {
    fn enter(counters: &'a Counters) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        counters.peak.fetch_max(now, Ordering::AcqRel);
        Self(counters)
    }
}

impl Drop for CriticalSection<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Drains the buffer into bounded batches and hands each record to the publisher.
///
/// `flush` may be triggered from any number of places at once (the periodic
/// scheduler, eager ingestion triggers). A non-blocking permit guarantees that at
/// most one flush body runs at a time; every other trigger returns
/// [`FlushOutcome::Busy`] straight away. Enqueues never touch the permit.
///
/// The dispatcher is always used behind an `Arc`: each flush body runs on its
/// own task, so a caller that gives up waiting never interrupts a batch.
pub struct Dispatcher {
    buffer: Arc<BoletoBuffer>,
    publisher: SharedPublisher,
    topic: String,
    max_batch_size: usize,
    permit: Arc<Mutex<()>>,
    state: AtomicU8,
    counters: Counters,
}

impl Dispatcher {
    /// Creates a new `Dispatcher`.
    ///
    /// # Arguments
    ///
    /// * `buffer` - The buffer to drain, shared with the ingest side.
    /// * `publisher` - The broker client receiving each record.
    /// * `topic` - Topic every record is published to.
    /// * `max_batch_size` - Upper bound of records drained per flush (at least 1).
    pub fn new(
        buffer: Arc<BoletoBuffer>,
        publisher: SharedPublisher,
        topic: impl Into<String>,
        max_batch_size: usize,
    ) -> Self {
        Self {
            buffer,
            publisher,
            topic: topic.into(),
            max_batch_size: max_batch_size.max(1),
            permit: Arc::new(Mutex::new(())),
            state: AtomicU8::new(DispatcherState::Idle as u8),
            counters: Counters::default(),
        }
    }

    pub fn buffer(&self) -> &Arc<BoletoBuffer> {
        &self.buffer
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn state(&self) -> DispatcherState {
        DispatcherState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn stats(&self) -> DispatcherStats {
        let c = &self.counters;
        DispatcherStats {
            batches: c.batches.load(Ordering::Relaxed),
            busy_skips: c.busy_skips.load(Ordering::Relaxed),
            records_dispatched: c.records_dispatched.load(Ordering::Relaxed),
            publish_failures: c.publish_failures.load(Ordering::Relaxed),
            aborted_flushes: c.aborted_flushes.load(Ordering::Relaxed),
            peak_concurrency: c.peak.load(Ordering::Acquire),
        }
    }

    fn set_state(&self, state: DispatcherState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Drains at most one batch and initiates its publication.
    ///
    /// Dropping the returned future detaches from the flush without cancelling
    /// it: every drained record is still offered to the publisher and the state
    /// still returns to `Idle`.
    pub async fn flush(self: &Arc<Self>) -> FlushOutcome {
        let Ok(permit) = Arc::clone(&self.permit).try_lock_owned() else {
            self.counters.busy_skips.fetch_add(1, Ordering::Relaxed);
            debug!(topic = %self.topic, "flush already in progress, trigger skipped");
            return FlushOutcome::Busy;
        };
        self.run_detached(permit).await
    }

    async fn run_detached(self: &Arc<Self>, permit: OwnedMutexGuard<()>) -> FlushOutcome {
        let dispatcher = Arc::clone(self);
        let task = tokio::spawn(async move {
            let outcome = dispatcher.dispatch_batch().await;
            drop(permit);
            outcome
        });
        match task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                // Only happens when the runtime shuts down under the flush
                self.set_state(DispatcherState::Idle);
                error!(topic = %self.topic, error = %e, "flush task cancelled before completion");
                FlushOutcome::Aborted(DispatchReport::default())
            }
        }
    }

    /// Flush body. Callers must hold the permit.
    async fn dispatch_batch(&self) -> FlushOutcome {
        let _section = CriticalSection::enter(&self.counters);

        if self.buffer.is_empty() {
            return FlushOutcome::Empty;
        }

        self.set_state(DispatcherState::Draining);
        let batch = self.buffer.drain(self.max_batch_size);
        if batch.is_empty() {
            self.set_state(DispatcherState::Idle);
            return FlushOutcome::Empty;
        }

        self.set_state(DispatcherState::Publishing);
        let mut report = DispatchReport {
            drained: batch.len(),
            ..DispatchReport::default()
        };
        info!(topic = %self.topic, batch_size = report.drained, "dispatching boleto batch");

        let published = AssertUnwindSafe(self.publish_batch(batch, &mut report))
            .catch_unwind()
            .await;
        self.set_state(DispatcherState::Idle);

        self.counters
            .records_dispatched
            .fetch_add(report.initiated as u64, Ordering::Relaxed);
        self.counters
            .publish_failures
            .fetch_add(report.failed as u64, Ordering::Relaxed);

        match published {
            Ok(()) => {
                self.counters.batches.fetch_add(1, Ordering::Relaxed);
                if report.failed > 0 {
                    warn!(
                        topic = %self.topic,
                        failed = report.failed,
                        initiated = report.initiated,
                        "batch dispatched with publish failures"
                    );
                }
                FlushOutcome::Dispatched(report)
            }
            Err(panic) => {
                self.counters.aborted_flushes.fetch_add(1, Ordering::Relaxed);
                error!(
                    topic = %self.topic,
                    drained = report.drained,
                    initiated = report.initiated,
                    reason = panic_message(&*panic),
                    "flush aborted by unexpected failure"
                );
                FlushOutcome::Aborted(report)
            }
        }
    }

    async fn publish_batch(&self, batch: Vec<Boleto>, report: &mut DispatchReport) {
        for (position, boleto) in batch.into_iter().enumerate() {
            match self.publisher.publish(&self.topic, boleto).await {
                Ok(()) => report.initiated += 1,
                Err(e) => {
                    // No retry or dead-letter route: the record is dropped.
                    report.failed += 1;
                    error!(topic = %self.topic, position, error = %e, "failed to initiate publish");
                }
            }
        }
        if let Err(e) = self.publisher.flush().await {
            error!(topic = %self.topic, error = %e, "publisher flush failed after batch");
        }
    }

    /// Final flush on shutdown: dispatches what is buffered when it is called.
    ///
    /// Unlike [`flush`](Self::flush) it waits for a running flush instead of
    /// skipping. It stops once a flush finds the buffer empty or once as many
    /// records as were buffered at the call have been drained, so writers that
    /// keep enqueueing cannot hold it open. Returns the number of drained records.
    pub async fn drain_all(self: &Arc<Self>) -> usize {
        let target = self.buffer.size();
        let mut total = 0;
        while total < target {
            let permit = Arc::clone(&self.permit).lock_owned().await;
            match self.run_detached(permit).await {
                FlushOutcome::Dispatched(report) | FlushOutcome::Aborted(report)
                    if report.drained > 0 =>
                {
                    total += report.drained;
                }
                _ => break,
            }
        }
        total
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}
