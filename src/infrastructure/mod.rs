//! Publisher adapters standing in for the broker client.

use crate::domain::boleto::Boleto;
use serde::Serialize;

pub mod channel;
pub mod in_memory;
pub mod json_lines;

/// A record paired with the topic it is published to, exactly as handed to the
/// broker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrokerMessage {
    pub topic: String,
    pub record: Boleto,
}
