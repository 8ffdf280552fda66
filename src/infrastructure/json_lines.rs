use super::BrokerMessage;
use crate::domain::boleto::Boleto;
use crate::domain::ports::Publisher;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use std::io::{BufWriter, Write};
use std::sync::{Mutex, MutexGuard};

/// Publisher that writes one JSON document per message to any `Write` sink.
///
/// The binary points it at stdout so published traffic can be piped or
/// inspected. Lines are buffered and reach the sink when the dispatcher
/// flushes the publisher at the end of a batch.
pub struct JsonLinesPublisher<W: Write + Send> {
    writer: Mutex<BufWriter<W>>,
}

impl<W: Write + Send> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
        }
    }

    /// Flushes pending lines and returns the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        let writer = match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        writer.into_inner().map_err(|e| IngestError::Io(e.into_error()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, BufWriter<W>>> {
        self.writer
            .lock()
            .map_err(|_| IngestError::Internal("json writer lock poisoned".into()))
    }

    fn write_message(&self, message: &BrokerMessage) -> Result<()> {
        let mut writer = self.lock()?;
        serde_json::to_writer(&mut *writer, message)?;
        writeln!(writer)?;
        Ok(())
    }

    fn publish_error(topic: &str, e: IngestError) -> IngestError {
        IngestError::Publish {
            topic: topic.to_string(),
            message: e.to_string(),
            recoverable: false,
        }
    }
}

#[async_trait]
impl<W: Write + Send> Publisher for JsonLinesPublisher<W> {
    async fn publish(&self, topic: &str, boleto: Boleto) -> Result<()> {
        let message = BrokerMessage {
            topic: topic.to_string(),
            record: boleto,
        };
        self.write_message(&message)
            .map_err(|e| Self::publish_error(topic, e))
    }

    async fn flush(&self) -> Result<()> {
        self.lock()?.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::boleto;

    #[tokio::test]
    async fn test_writes_one_line_per_message() {
        let publisher = JsonLinesPublisher::new(Vec::new());
        publisher.publish("boletos-registro", boleto(1)).await.unwrap();
        publisher.publish("boletos-registro", boleto(2)).await.unwrap();

        let output = String::from_utf8(publisher.into_inner().unwrap()).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["topic"], "boletos-registro");
        assert_eq!(lines[0]["record"]["document"], "00000000001");
        assert_eq!(lines[1]["record"]["payer"], "Payer 2");
        assert_eq!(lines[1]["record"]["amount"], "3");
    }

    /// Sink that counts how often it is flushed.
    #[derive(Default)]
    struct CountingSink {
        bytes: Vec<u8>,
        flushes: usize,
    }

    impl Write for CountingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sink_flushed_once_per_batch() {
        use crate::application::buffer::BoletoBuffer;
        use crate::application::dispatcher::Dispatcher;
        use std::sync::Arc;

        let publisher = Arc::new(JsonLinesPublisher::new(CountingSink::default()));
        let buffer = Arc::new(BoletoBuffer::unbounded());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&buffer),
            publisher.clone(),
            "boletos-registro",
            100,
        ));
        for i in 0..50 {
            buffer.enqueue(boleto(i)).unwrap();
        }
        dispatcher.flush().await;
        drop(dispatcher);

        let publisher = Arc::into_inner(publisher).unwrap();
        let sink = publisher.into_inner().unwrap();
        assert_eq!(sink.flushes, 1);
        assert_eq!(String::from_utf8(sink.bytes).unwrap().lines().count(), 50);
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("pipe closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sink_failure_surfaces_on_flush() {
        let publisher = JsonLinesPublisher::new(BrokenSink);
        publisher.publish("t", boleto(1)).await.unwrap();

        let err = publisher.flush().await.unwrap_err();
        assert!(matches!(err, IngestError::Io(_)));
    }
}
