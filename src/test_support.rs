//! Fixtures shared by the unit tests.

use crate::domain::boleto::{Amount, Boleto, Document, PayerName};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Builds a valid boleto whose document encodes `seq`, so records stay
/// distinguishable after they move through the buffer.
pub fn boleto(seq: usize) -> Boleto {
    Boleto::new(
        PayerName::new(&format!("Payer {seq}")).unwrap(),
        Document::new(&format!("{seq:011}")).unwrap(),
        Amount::new(Decimal::from(seq as u64 + 1)).unwrap(),
        NaiveDate::from_ymd_opt(2099, 12, 31).unwrap(),
        None,
    )
}

/// Reads back the sequence number stored by [`boleto`].
pub fn seq_of(boleto: &Boleto) -> usize {
    boleto.document.as_str().parse().unwrap()
}
