//! Adapters that bring boleto requests into the engine.

pub mod csv;
