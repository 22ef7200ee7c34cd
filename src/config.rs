use crate::error::{ReceiptLedgerError, Result};
use crate::money::Money;
use crate::schema::ImageMetadata;
use crate::utils::format_date;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Constants of the V1 payout formula and the thresholds used when
/// summarizing a shopper's or an area's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoutConfig {
    /// Share of the order total paid under V1.
    #[serde(with = "rust_decimal::serde::float")]
    pub v1_rate: Decimal,

    /// Flat amount added per order under V1.
    pub v1_base: Money,

    /// Maximum distance between actual and V1 pay for a record to count as V1.
    pub v1_tolerance: Money,

    /// Share of V1 records above which a shopper is considered to still be on V1.
    #[serde(with = "rust_decimal::serde::float")]
    pub likely_v1_threshold: Decimal,

    pub area_min_shoppers: usize,

    pub area_min_records: usize,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            v1_rate: Decimal::new(75, 3),
            v1_base: Money::from_cents(500),
            v1_tolerance: Money::from_cents(5),
            likely_v1_threshold: Decimal::new(75, 2),
            area_min_shoppers: 3,
            area_min_records: 5,
        }
    }
}

impl PayoutConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PayoutConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.v1_rate.is_sign_negative() {
            return Err(invalid("v1_rate", format!("{} must not be negative", self.v1_rate)));
        }
        if self.v1_base < Money::ZERO {
            return Err(invalid("v1_base", format!("{} must not be negative", self.v1_base)));
        }
        if self.v1_tolerance <= Money::ZERO {
            return Err(invalid(
                "v1_tolerance",
                format!("{} must be greater than zero", self.v1_tolerance),
            ));
        }
        if self.likely_v1_threshold < Decimal::ZERO || self.likely_v1_threshold > Decimal::ONE {
            return Err(invalid(
                "likely_v1_threshold",
                format!("{} must be between 0 and 1", self.likely_v1_threshold),
            ));
        }
        if self.area_min_shoppers == 0 {
            return Err(invalid("area_min_shoppers", "must be at least 1".to_string()));
        }
        if self.area_min_records == 0 {
            return Err(invalid("area_min_records", "must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn invalid(field: &str, details: String) -> ReceiptLedgerError {
    ReceiptLedgerError::InvalidConfig {
        field: field.to_string(),
        details,
    }
}

/// Everything a scan needs besides the text: the date the scan is treated as
/// running on, and the image's metadata. Passing the date in keeps a scan
/// repeatable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanContext {
    pub reference_date: NaiveDate,
    pub metadata: ImageMetadata,
}

impl ScanContext {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self {
            reference_date,
            metadata: ImageMetadata::default(),
        }
    }

    pub fn today() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    pub fn with_metadata(mut self, metadata: ImageMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Receipts omit the year; the reference year is assumed.
    pub fn year(&self) -> i32 {
        self.reference_date.year()
    }

    pub fn reference_date_string(&self) -> String {
        format_date(self.reference_date)
    }
}
