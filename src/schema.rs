use crate::money::Money;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Caller-supplied facts about one screenshot. Nothing here is read from the
/// OCR text; it is stamped onto every record the image produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImageMetadata {
    #[schemars(description = "Reference to the uploaded screenshot the text came from")]
    pub source_image: Option<String>,

    #[schemars(description = "Identifier of the shopper who submitted the screenshot")]
    pub phone: Option<String>,

    #[schemars(description = "Postal code the shopper reported")]
    pub from_zip: Option<String>,
}

impl ImageMetadata {
    pub fn new(source_image: impl Into<String>) -> Self {
        Self {
            source_image: Some(source_image.into()),
            ..Self::default()
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into().trim_start_matches('+').to_string());
        self
    }

    pub fn with_zip(mut self, zip: impl Into<String>) -> Self {
        self.from_zip = Some(zip.into());
        self
    }
}

/// One reconciled transaction parsed from a receipt screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AcceptedRecord {
    #[schemars(
        description = "Unique order key. Synthesized as <tip><total pay><day of month> when the screenshot's number was redacted or unreadable."
    )]
    pub order_number: String,

    #[schemars(description = "Pre-tip order subtotal. Absent when the token was unreadable.")]
    pub order_total: Option<Money>,

    #[schemars(description = "Base payout to the shopper")]
    pub order_pay: Option<Money>,

    #[schemars(description = "Customer tip")]
    pub tip: Option<Money>,

    #[serde(default)]
    #[schemars(description = "Promotional pay, zero when the receipt shows none")]
    pub promo_pay: Money,

    #[schemars(description = "order_pay + tip + promo_pay after reconciliation")]
    pub total_pay: Option<Money>,

    #[schemars(description = "Scheduled delivery date, MM/DD/YYYY")]
    pub delivery_date: Option<String>,

    #[schemars(description = "Actual delivery date, MM/DD/YYYY")]
    pub delivered_date: Option<String>,

    pub delivery_window_start: Option<String>,

    pub delivery_window_end: Option<String>,

    pub delivered_time: Option<String>,

    pub late: Option<bool>,

    #[serde(default)]
    #[schemars(description = "Fixed-pay delivery with no shopping; excluded from payout averages")]
    pub delivery_only: bool,

    #[schemars(
        description = "True when order_pay matches 7.5% of the order total plus $5. Unset until ingestion."
    )]
    pub is_v1: Option<bool>,

    pub order_source_image: Option<String>,

    #[schemars(description = "Date the screenshot was processed, MM/DD/YYYY")]
    pub submission_date: String,

    pub phone: Option<String>,

    pub from_zip: Option<String>,
}

impl AcceptedRecord {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AcceptedRecord)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    /// `order_pay + tip + promo_pay == total_pay`, within `tolerance`.
    /// Records missing any of those figures are never balanced.
    pub fn is_balanced(&self, tolerance: Money) -> bool {
        match (self.order_pay, self.tip, self.total_pay) {
            (Some(order_pay), Some(tip), Some(total_pay)) => {
                match order_pay.checked_add(tip).and_then(|sum| sum.checked_add(self.promo_pay)) {
                    Some(sum) => sum.abs_diff(total_pay) <= tolerance,
                    None => false,
                }
            }
            _ => false,
        }
    }
}
