use crate::domain::boleto::{Boleto, Document};
use crate::domain::ports::Publisher;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory publisher.
///
/// Records every `(topic, boleto)` pair in the order publishes were initiated.
/// Optionally refuses to initiate publishes for a set of documents, which makes
/// per-record broker failures easy to reproduce.
#[derive(Default, Clone)]
pub struct InMemoryPublisher {
    published: Arc<RwLock<Vec<(String, Boleto)>>>,
    failing: Arc<HashSet<Document>>,
}

impl InMemoryPublisher {
    /// Creates a new publisher that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a publisher that fails initiation for the given documents.
    pub fn failing_for(documents: impl IntoIterator<Item = Document>) -> Self {
        Self {
            published: Arc::default(),
            failing: Arc::new(documents.into_iter().collect()),
        }
    }

    /// Snapshot of everything published so far.
    pub async fn published(&self) -> Vec<(String, Boleto)> {
        self.published.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.published.read().await.len()
    }
}

#[async_trait]
impl Publisher for InMemoryPublisher {
    async fn publish(&self, topic: &str, boleto: Boleto) -> Result<()> {
        if self.failing.contains(&boleto.document) {
            return Err(IngestError::Publish {
                topic: topic.to_string(),
                message: format!("send rejected for document {}", boleto.document.as_str()),
                recoverable: true,
            });
        }
        self.published.write().await.push((topic.to_string(), boleto));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::boleto;

    #[tokio::test]
    async fn test_records_in_order() {
        let publisher = InMemoryPublisher::new();
        publisher.publish("t", boleto(1)).await.unwrap();
        publisher.publish("t", boleto(2)).await.unwrap();

        let published = publisher.published().await;
        assert_eq!(
            published,
            vec![("t".to_string(), boleto(1)), ("t".to_string(), boleto(2))]
        );
    }

    #[tokio::test]
    async fn test_failing_documents() {
        let publisher = InMemoryPublisher::failing_for([boleto(7).document]);

        let err = publisher.publish("t", boleto(7)).await.unwrap_err();
        assert!(matches!(err, IngestError::Publish { recoverable: true, .. }));
        publisher.publish("t", boleto(8)).await.unwrap();
        assert_eq!(publisher.count().await, 1);
    }
}
