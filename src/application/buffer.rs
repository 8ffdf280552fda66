use crate::domain::boleto::Boleto;
use crate::error::{IngestError, Result};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Concurrent FIFO of boletos waiting to be dispatched.
///
/// Backed by an unbounded `crossbeam_channel`, so enqueue never takes a lock and
/// never waits on a drain. The occupancy counter is bumped *before* a record is
/// pushed and lowered only *after* a record is popped, which keeps it from ever
/// dropping below the real number of queued records.
///
/// When a capacity is set, it is enforced on the counter: an enqueue that would
/// take the buffer past the capacity is rejected with [`IngestError::Overflow`]
/// and the buffer is left untouched.
pub struct BoletoBuffer {
    sender: Sender<Boleto>,
    receiver: Receiver<Boleto>,
    len: AtomicUsize,
    capacity: Option<usize>,
}

impl BoletoBuffer {
    pub fn new(capacity: Option<usize>) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender,
            receiver,
            len: AtomicUsize::new(0),
            capacity,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(Some(capacity))
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Appends a record at the tail.
    pub fn enqueue(&self, boleto: Boleto) -> Result<()> {
        self.reserve_slot()?;
        if self.sender.send(boleto).is_err() {
            // Only possible if the receiver is gone, which cannot happen while
            // `self` is alive.
            self.len.fetch_sub(1, Ordering::AcqRel);
            return Err(IngestError::Internal("buffer receiver disconnected".into()));
        }
        Ok(())
    }

    fn reserve_slot(&self) -> Result<()> {
        match self.capacity {
            None => {
                self.len.fetch_add(1, Ordering::AcqRel);
                Ok(())
            }
            Some(capacity) => self
                .len
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                    (n < capacity).then_some(n + 1)
                })
                .map(|_| ())
                .map_err(|current_size| IngestError::Overflow {
                    current_size,
                    capacity,
                }),
        }
    }

    /// Number of records enqueued but not yet drained.
    ///
    /// Lock-free snapshot; it may include a record whose push is still in flight.
    pub fn size(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Pops up to `max` records from the head, in FIFO order.
    ///
    /// Safe to call concurrently with `enqueue`. Concurrent drains are not
    /// corrupting, but batches only stay contiguous when drains are serialized,
    /// which is what the dispatcher's flush permit does.
    pub fn drain(&self, max: usize) -> Vec<Boleto> {
        let mut batch = Vec::with_capacity(max.min(self.size()));
        while batch.len() < max {
            match self.receiver.try_recv() {
                Ok(boleto) => {
                    self.len.fetch_sub(1, Ordering::AcqRel);
                    batch.push(boleto);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        batch
    }
}

impl Default for BoletoBuffer {
    fn default() -> Self {
        Self::unbounded()
    }
}
