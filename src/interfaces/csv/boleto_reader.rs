use crate::domain::boleto::BoletoRequest;
use crate::error::{IngestError, Result};
use std::io::Read;

/// Streams boleto rows (`payer,document,amount,due_date,barcode`) out of a CSV
/// file.
///
/// Cells are trimmed and `barcode` may be missing entirely. A row that does not
/// parse (bad decimal, date not in `YYYY-MM-DD`) comes back as an error for that
/// row only. Business rules are left to [`BoletoRequest::validate`].
pub struct BoletoReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> BoletoReader<R> {
    /// Wraps a byte source whose first line is the header row.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// One item per data row, parsed on demand.
    pub fn requests(self) -> impl Iterator<Item = Result<BoletoRequest>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(IngestError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "payer, document, amount, due_date, barcode\n\
                    Maria Souza, 12345678901, 150.75, 2099-01-31, 23790.50400\n\
                    ACME Ltda, 12345678000199, 0.01, 2099-02-01,";
        let reader = BoletoReader::new(data.as_bytes());
        let results: Vec<Result<BoletoRequest>> = reader.requests().collect();

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.payer, "Maria Souza");
        assert_eq!(first.amount, dec!(150.75));
        assert_eq!(first.due_date, NaiveDate::from_ymd_opt(2099, 1, 31).unwrap());
        assert_eq!(first.barcode.as_deref(), Some("23790.50400"));

        let second = results[1].as_ref().unwrap();
        assert_eq!(second.document, "12345678000199");
        assert!(second.barcode.as_deref().unwrap_or_default().is_empty());
    }

    #[test]
    fn test_reader_missing_barcode_column() {
        let data = "payer,document,amount,due_date\nMaria Souza,12345678901,10.00,2099-01-31";
        let reader = BoletoReader::new(data.as_bytes());
        let results: Vec<Result<BoletoRequest>> = reader.requests().collect();

        assert_eq!(results[0].as_ref().unwrap().barcode, None);
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "payer,document,amount,due_date,barcode\n\
                    Maria Souza,12345678901,not_a_number,2099-01-31,\n\
                    Maria Souza,12345678901,10.00,31/01/2099,";
        let reader = BoletoReader::new(data.as_bytes());
        let results: Vec<Result<BoletoRequest>> = reader.requests().collect();

        assert!(matches!(results[0], Err(IngestError::Csv(_))));
        assert!(matches!(results[1], Err(IngestError::Csv(_))));
    }
}
