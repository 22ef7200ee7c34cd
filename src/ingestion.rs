use crate::classifier::PayoutClassifier;
use crate::config::PayoutConfig;
use crate::schema::AcceptedRecord;
use log::debug;
use std::collections::{BTreeSet, HashSet};

/// Answers whether a shopper already has a record with a given order number.
/// The merger only needs this one question answered, so any store can sit
/// behind it.
pub trait IdentifierLookup {
    fn contains(&self, order_number: &str) -> bool;
}

impl IdentifierLookup for HashSet<String> {
    fn contains(&self, order_number: &str) -> bool {
        HashSet::contains(self, order_number)
    }
}

impl IdentifierLookup for BTreeSet<String> {
    fn contains(&self, order_number: &str) -> bool {
        BTreeSet::contains(self, order_number)
    }
}

impl IdentifierLookup for [AcceptedRecord] {
    fn contains(&self, order_number: &str) -> bool {
        self.iter().any(|r| r.order_number == order_number)
    }
}

impl<T: IdentifierLookup + ?Sized> IdentifierLookup for &T {
    fn contains(&self, order_number: &str) -> bool {
        (**self).contains(order_number)
    }
}

pub struct IngestionMerger<'a> {
    classifier: PayoutClassifier<'a>,
}

impl<'a> IngestionMerger<'a> {
    pub fn new(config: &'a PayoutConfig) -> Self {
        Self {
            classifier: PayoutClassifier::new(config),
        }
    }

    /// Returns the records of `batch` that are genuinely new, in batch order,
    /// each tagged with its payout formula.
    ///
    /// A record is dropped when its order number is empty, already known to
    /// `existing`, or repeats an earlier record of the same batch. Calls for
    /// the same shopper must not overlap; the lookup is read once per record
    /// and nothing here locks it.
    pub fn merge<L>(&self, batch: Vec<AcceptedRecord>, existing: &L) -> Vec<AcceptedRecord>
    where
        L: IdentifierLookup + ?Sized,
    {
        let submitted = batch.len();
        let mut seen: HashSet<String> = HashSet::new();
        let mut merged = Vec::with_capacity(batch.len());

        for mut record in batch {
            if record.order_number.is_empty() {
                continue;
            }
            if existing.contains(&record.order_number) {
                continue;
            }
            if !seen.insert(record.order_number.clone()) {
                continue;
            }
            self.classifier.tag(&mut record);
            merged.push(record);
        }

        if merged.len() < submitted {
            debug!(
                "Merge kept {} of {} records; the rest were known or repeated",
                merged.len(),
                submitted
            );
        }

        merged
    }
}

pub fn merge_records<L>(
    batch: Vec<AcceptedRecord>,
    existing: &L,
    config: &PayoutConfig,
) -> Vec<AcceptedRecord>
where
    L: IdentifierLookup + ?Sized,
{
    IngestionMerger::new(config).merge(batch, existing)
}

/// Order numbers of a shopper's stored records, ready to use as a lookup.
pub fn existing_identifiers(records: &[AcceptedRecord]) -> HashSet<String> {
    records.iter().map(|r| r.order_number.clone()).collect()
}
