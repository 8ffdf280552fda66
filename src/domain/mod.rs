//! Domain layer: the boleto record, its value objects and the ports the
//! application layer depends on.

pub mod boleto;
pub mod ports;
