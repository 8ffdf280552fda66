//! Application layer containing the buffering and batch-dispatch engine.
//!
//! `BoletoService` is the ingest entry point. It enqueues into the shared
//! `BoletoBuffer` and the `Dispatcher` drains that buffer in bounded batches,
//! triggered either eagerly by ingestion or periodically by the `FlushScheduler`.

pub mod buffer;
pub mod dispatcher;
pub mod scheduler;
pub mod service;
