use super::BrokerMessage;
use crate::domain::boleto::Boleto;
use crate::domain::ports::Publisher;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};

/// Publisher that hands messages to a bounded in-process channel.
///
/// The receiving half plays the broker client's send loop. Publishing never
/// waits: a full channel or a dropped receiver is reported right away as a
/// failed initiation.
#[derive(Clone)]
pub struct ChannelPublisher {
    sender: Sender<BrokerMessage>,
}

impl ChannelPublisher {
    /// Creates the publisher together with the receiving end of its channel.
    pub fn new(capacity: usize) -> (Self, Receiver<BrokerMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl Publisher for ChannelPublisher {
    async fn publish(&self, topic: &str, boleto: Boleto) -> Result<()> {
        let message = BrokerMessage {
            topic: topic.to_string(),
            record: boleto,
        };
        self.sender.try_send(message).map_err(|e| {
            let (message, recoverable) = match e {
                TrySendError::Full(_) => ("broker queue is full", true),
                TrySendError::Closed(_) => ("broker client is closed", false),
            };
            IngestError::Publish {
                topic: topic.to_string(),
                message: message.to_string(),
                recoverable,
            }
        })
    }
}
