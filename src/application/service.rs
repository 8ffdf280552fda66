use crate::application::buffer::BoletoBuffer;
use crate::application::dispatcher::Dispatcher;
use crate::config::EngineConfig;
use crate::domain::boleto::{Boleto, BoletoRequest};
use crate::domain::ports::SharedPublisher;
use crate::error::{IngestError, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::warn;

/// Ingest-side entry point of the engine.
///
/// `BoletoService` owns nothing but a handle to the shared [`Dispatcher`] (which in
/// turn shares the buffer), so it can be cloned freely into request handlers.
#[derive(Clone)]
pub struct BoletoService {
    dispatcher: Arc<Dispatcher>,
}

impl BoletoService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Wires buffer and dispatcher from a config.
    pub fn from_config(config: &EngineConfig, publisher: SharedPublisher) -> Self {
        let buffer = Arc::new(BoletoBuffer::new(config.capacity));
        let dispatcher = Dispatcher::new(
            buffer,
            publisher,
            config.topic.clone(),
            config.max_batch_size,
        );
        Self::new(Arc::new(dispatcher))
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Queues an already-validated boleto.
    ///
    /// Returns [`IngestError::Overflow`] when the buffer is full. Once the buffer
    /// reaches a full batch, a flush is triggered from the caller's context; if
    /// another flush is already running that trigger is a no-op.
    pub async fn register(&self, boleto: Boleto) -> Result<()> {
        let buffer = self.dispatcher.buffer();
        if let Err(e) = buffer.enqueue(boleto) {
            if let IngestError::Overflow {
                current_size,
                capacity,
            } = e
            {
                warn!(current_size, capacity, "buffer full, boleto rejected");
            }
            return Err(e);
        }

        if buffer.size() >= self.dispatcher.max_batch_size() {
            self.dispatcher.flush().await;
        }
        Ok(())
    }

    /// Validates a raw request against `today`, then registers it.
    pub async fn submit(&self, request: BoletoRequest, today: NaiveDate) -> Result<()> {
        let boleto = request.validate(today)?;
        self.register(boleto).await
    }

    /// Number of boletos waiting for the next flush.
    pub fn buffer_size(&self) -> usize {
        self.dispatcher.buffer().size()
    }
}
