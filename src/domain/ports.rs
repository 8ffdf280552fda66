use super::boleto::Boleto;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Broker-client abstraction consumed by the dispatcher.
///
/// `Ok(())` means the send was *initiated*; acknowledgments or failures that
/// arrive later are the implementation's business.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, boleto: Boleto) -> Result<()>;

    /// Called once after every batch. Clients that buffer sends push them out here.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

pub type SharedPublisher = Arc<dyn Publisher>;
