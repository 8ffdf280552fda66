use crate::error::{IngestError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Smallest amount a boleto may carry.
pub const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

pub const PAYER_MIN_CHARS: usize = 3;
pub const PAYER_MAX_CHARS: usize = 100;

/// Represents a positive monetary amount for a boleto.
///
/// Ensures that amounts are never below one cent.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value >= MIN_AMOUNT {
            Ok(Self(value))
        } else {
            Err(IngestError::validation(
                "amount",
                value,
                "Amount must be greater than zero",
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = IngestError;

    fn try_from(value: Decimal) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Name of the person or company paying the boleto, trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayerName(String);

impl PayerName {
    pub fn new(raw: &str) -> Result<Self> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(IngestError::validation("payer", raw, "Payer name is required"));
        }
        let chars = name.chars().count();
        if !(PAYER_MIN_CHARS..=PAYER_MAX_CHARS).contains(&chars) {
            return Err(IngestError::validation(
                "payer",
                raw,
                format!(
                    "Payer name must have between {} and {} characters",
                    PAYER_MIN_CHARS, PAYER_MAX_CHARS
                ),
            ));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Individual taxpayer number, 11 digits.
    Cpf,
    /// Company taxpayer number, 14 digits.
    Cnpj,
}

/// A CPF or CNPJ, kept as the digit string the payer supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Document(String);

impl Document {
    pub fn new(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(IngestError::validation(
                "document",
                raw,
                "Document (CPF/CNPJ) is required",
            ));
        }
        let all_digits = raw.bytes().all(|b| b.is_ascii_digit());
        if !all_digits || !matches!(raw.len(), 11 | 14) {
            return Err(IngestError::validation(
                "document",
                raw,
                "Document must be a CPF (11 digits) or CNPJ (14 digits)",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn kind(&self) -> DocumentKind {
        if self.0.len() == 11 {
            DocumentKind::Cpf
        } else {
            DocumentKind::Cnpj
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A validated boleto registration.
///
/// Instances only come out of [`BoletoRequest::validate`] (or [`Boleto::new`] with
/// already-validated parts) and are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Boleto {
    pub payer: PayerName,
    pub document: Document,
    pub amount: Amount,
    pub due_date: NaiveDate,
    pub barcode: Option<String>,
}

impl Boleto {
    pub fn new(
        payer: PayerName,
        document: Document,
        amount: Amount,
        due_date: NaiveDate,
        barcode: Option<String>,
    ) -> Self {
        Self {
            payer,
            document,
            amount,
            due_date,
            barcode,
        }
    }
}

/// Raw registration request as it arrives from the outside world.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BoletoRequest {
    pub payer: String,
    pub document: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub barcode: Option<String>,
}

impl BoletoRequest {
    /// Validates the request against `today` and builds the immutable record.
    ///
    /// Fields are checked in declaration order; the first violation is returned.
    pub fn validate(self, today: NaiveDate) -> Result<Boleto> {
        let payer = PayerName::new(&self.payer)?;
        let document = Document::new(&self.document)?;
        let amount = Amount::new(self.amount)?;
        if self.due_date < today {
            return Err(IngestError::validation(
                "due_date",
                self.due_date,
                "Due date cannot be in the past",
            ));
        }
        let barcode = self.barcode.filter(|b| !b.trim().is_empty());

        Ok(Boleto::new(payer, document, amount, self.due_date, barcode))
    }
}
