//! # Shop Receipt Ledger
//!
//! Turns the OCR text of gig-shopping order history screenshots into
//! reconciled, deduplicated payout records.
//!
//! ## Core Concepts
//!
//! - **Scanning**: each transcript line is classified by its leading tokens and
//!   folded into an open record; a `Total` line closes it
//! - **Reconciliation**: OCR magnitude errors are repaired using the identity
//!   `order pay + tip + promo pay = total pay`
//! - **Order numbers**: redacted or unreadable numbers are replaced with a
//!   deterministic stand-in built from the pay figures and delivery day
//! - **Payout formula**: records whose pay equals 7.5% of the order total plus
//!   $5 are tagged V1; everything else is V2
//! - **Ingestion**: a submission is merged against the shopper's known order
//!   numbers so re-sent screenshots never duplicate history
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_receipt_ledger::*;
//! use chrono::NaiveDate;
//! use std::collections::HashSet;
//!
//! let images = vec![ReceiptImage {
//!     text: "Order #27852647 · $124.37 On Time\nOrder Pay $14.58\nTip $0.00\nTotal Pay $14.58"
//!         .to_string(),
//!     metadata: ImageMetadata::new("receipt.png").with_phone("+15555550100"),
//! }];
//!
//! let outcome = ReceiptProcessor::process_submission(
//!     &images,
//!     NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
//!     &HashSet::<String>::new(),
//!     &PayoutConfig::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(outcome.records.len(), 1);
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod export;
pub mod identifier;
pub mod ingestion;
pub mod line;
pub mod money;
pub mod reconcile;
pub mod scanner;
pub mod schema;
pub mod stats;
pub mod utils;

pub use classifier::{is_v1, likely_v1, PayoutClassifier};
pub use config::{PayoutConfig, ScanContext};
pub use error::{ReceiptLedgerError, Result};
pub use export::{to_csv_string, write_csv};
pub use identifier::{resolve_order_number, synthesize_order_number};
pub use ingestion::{existing_identifiers, merge_records, IdentifierLookup, IngestionMerger};
pub use line::{classify, LineKind};
pub use money::{Amount, Money};
pub use reconcile::{reconcile, Correction, PayFigures, ReconcileReport};
pub use scanner::{scan, scan_text, PartialRecord, ReceiptScanner, ScanState};
pub use schema::*;
pub use stats::{area_stats, summarize, AreaStats, PayAverage, PayoutStatistics, PayoutSummary, TipSummary};

use chrono::NaiveDate;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One screenshot's OCR text with the caller's metadata for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptImage {
    pub text: String,
    pub metadata: ImageMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    /// Records not seen before, tagged with their payout formula.
    pub records: Vec<AcceptedRecord>,
    pub images_submitted: usize,
    /// Images that produced at least one accepted record.
    pub images_with_records: usize,
    /// Accepted records across all images, before deduplication.
    pub records_scanned: usize,
}

impl SubmissionOutcome {
    pub fn found_receipts(&self) -> bool {
        self.images_with_records > 0
    }
}

pub struct ReceiptProcessor;

impl ReceiptProcessor {
    /// Scans every image of one submission and merges the results against
    /// the shopper's known order numbers.
    ///
    /// Images are scanned in parallel; the merge runs once, after all scans
    /// have finished. Callers must not run two submissions for the same
    /// shopper at the same time.
    pub fn process_submission<L>(
        images: &[ReceiptImage],
        reference_date: NaiveDate,
        existing: &L,
        config: &PayoutConfig,
    ) -> Result<SubmissionOutcome>
    where
        L: IdentifierLookup + ?Sized,
    {
        config.validate()?;

        let per_image = scan_images(images, reference_date);

        let images_with_records = per_image.iter().filter(|records| !records.is_empty()).count();
        let scanned: Vec<AcceptedRecord> = per_image.into_iter().flatten().collect();
        let records_scanned = scanned.len();

        debug!(
            "Scanned {} records from {} of {} images",
            records_scanned,
            images_with_records,
            images.len()
        );

        let records = IngestionMerger::new(config).merge(scanned, existing);

        info!(
            "Processed submission: {} images, {} records scanned, {} new",
            images.len(),
            records_scanned,
            records.len()
        );

        Ok(SubmissionOutcome {
            records,
            images_submitted: images.len(),
            images_with_records,
            records_scanned,
        })
    }
}

/// Scans each image independently on the rayon pool, returning results in
/// image order.
pub fn scan_images(images: &[ReceiptImage], reference_date: NaiveDate) -> Vec<Vec<AcceptedRecord>> {
    images
        .par_iter()
        .map(|image| {
            let context = ScanContext::new(reference_date).with_metadata(image.metadata.clone());
            scan_text(&image.text, &context)
        })
        .collect()
}

pub fn process_submission<L>(
    images: &[ReceiptImage],
    reference_date: NaiveDate,
    existing: &L,
    config: &PayoutConfig,
) -> Result<SubmissionOutcome>
where
    L: IdentifierLookup + ?Sized,
{
    ReceiptProcessor::process_submission(images, reference_date, existing, config)
}
