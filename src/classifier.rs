use crate::config::PayoutConfig;
use crate::money::Money;
use crate::schema::AcceptedRecord;
use rust_decimal::Decimal;

pub struct PayoutClassifier<'a> {
    config: &'a PayoutConfig,
}

impl<'a> PayoutClassifier<'a> {
    pub fn new(config: &'a PayoutConfig) -> Self {
        Self { config }
    }

    /// What the V1 formula would pay for an order of this size.
    pub fn v1_pay(&self, order_total: Money) -> Money {
        order_total.scale(self.config.v1_rate) + self.config.v1_base
    }

    /// Whether the record's pay matches the V1 formula within tolerance.
    /// Records without both an order total and an order pay cannot match.
    pub fn is_v1(&self, record: &AcceptedRecord) -> bool {
        match (record.order_total, record.order_pay) {
            (Some(order_total), Some(order_pay)) => {
                self.v1_pay(order_total).abs_diff(order_pay) < self.config.v1_tolerance
            }
            _ => false,
        }
    }

    pub fn tag(&self, record: &mut AcceptedRecord) {
        record.is_v1 = Some(self.is_v1(record));
    }

    /// Whether more than the configured share of a shopper's records follow V1.
    /// Delivery-only records are ignored; `None` when nothing is left to judge.
    pub fn likely_v1(&self, records: &[AcceptedRecord]) -> Option<bool> {
        let mut counted = 0u32;
        let mut v1 = 0u32;

        for record in records.iter().filter(|r| !r.delivery_only) {
            counted += 1;
            if record.is_v1.unwrap_or_else(|| self.is_v1(record)) {
                v1 += 1;
            }
        }

        if counted == 0 {
            return None;
        }

        let share = Decimal::from(v1) / Decimal::from(counted);
        Some(share > self.config.likely_v1_threshold)
    }
}

pub fn is_v1(record: &AcceptedRecord, config: &PayoutConfig) -> bool {
    PayoutClassifier::new(config).is_v1(record)
}

pub fn likely_v1(records: &[AcceptedRecord], config: &PayoutConfig) -> Option<bool> {
    PayoutClassifier::new(config).likely_v1(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(order_total: i64, order_pay: i64) -> AcceptedRecord {
        AcceptedRecord {
            order_number: format!("{}{}", order_total, order_pay),
            order_total: Some(Money::from_cents(order_total)),
            order_pay: Some(Money::from_cents(order_pay)),
            tip: Some(Money::ZERO),
            promo_pay: Money::ZERO,
            total_pay: Some(Money::from_cents(order_pay)),
            delivery_date: None,
            delivered_date: None,
            delivery_window_start: None,
            delivery_window_end: None,
            delivered_time: None,
            late: None,
            delivery_only: false,
            is_v1: None,
            order_source_image: None,
            submission_date: "03/15/2024".to_string(),
            phone: None,
            from_zip: None,
        }
    }

    #[test]
    fn test_exact_v1_pay() {
        let config = PayoutConfig::default();
        assert!(is_v1(&record(10000, 1250), &config));
        assert!(!is_v1(&record(10000, 2000), &config));
    }

    #[test]
    fn test_tolerance_is_strict() {
        let config = PayoutConfig::default();
        // 0.075 * 124.37 + 5 = 14.32775
        assert!(is_v1(&record(12437, 1436), &config));
        assert!(!is_v1(&record(12437, 1458), &config));
        // exactly five cents away
        assert!(!is_v1(&record(10000, 1255), &config));
    }

    #[test]
    fn test_missing_total_is_not_v1() {
        let config = PayoutConfig::default();
        let mut r = record(10000, 1250);
        r.order_total = None;
        assert!(!is_v1(&r, &config));
    }

    #[test]
    fn test_tag_sets_flag() {
        let config = PayoutConfig::default();
        let classifier = PayoutClassifier::new(&config);
        let mut r = record(10000, 1250);
        classifier.tag(&mut r);
        assert_eq!(r.is_v1, Some(true));
    }

    #[test]
    fn test_likely_v1_threshold() {
        let config = PayoutConfig::default();
        let mut records: Vec<_> = (0..4).map(|_| record(10000, 1250)).collect();
        assert_eq!(likely_v1(&records, &config), Some(true));

        // 3 of 4 is exactly 75%, not more
        records[0] = record(10000, 2000);
        assert_eq!(likely_v1(&records, &config), Some(false));
    }

    #[test]
    fn test_likely_v1_ignores_delivery_only() {
        let config = PayoutConfig::default();
        let mut delivery = record(0, 700);
        delivery.delivery_only = true;
        assert_eq!(likely_v1(&[delivery.clone()], &config), None);

        let records = vec![delivery, record(10000, 1250)];
        assert_eq!(likely_v1(&records, &config), Some(true));
    }

    #[test]
    fn test_likely_v1_unknown_without_records() {
        assert_eq!(likely_v1(&[], &PayoutConfig::default()), None);
    }

    #[test]
    fn test_likely_v1_prefers_existing_tag() {
        let config = PayoutConfig::default();
        let mut r = record(10000, 2000);
        r.is_v1 = Some(true);
        assert_eq!(likely_v1(&[r], &config), Some(true));
    }
}
