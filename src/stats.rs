//! Payout summaries over a shopper's history and over an area.
//!
//! Delivery-only records have fixed pay and are left out of every figure.

use crate::classifier::PayoutClassifier;
use crate::config::PayoutConfig;
use crate::money::Money;
use crate::schema::AcceptedRecord;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayAverage {
    pub count: usize,
    pub mean: Option<Money>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipSummary {
    pub mean_amount: Option<Money>,
    /// Mean of tip / total pay per record.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub mean_share: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutSummary {
    pub records: usize,
    pub v1: PayAverage,
    pub v2: PayAverage,
    /// Mean pay had every order been paid by the V1 formula.
    pub mean_pay_if_v1: Option<Money>,
    pub mean_pay: Option<Money>,
    pub tips: TipSummary,
    /// Total V1 formula pay minus total actual pay. Positive means V1 would
    /// have paid more.
    pub v1_v2_difference: Money,
    pub likely_v1: Option<bool>,
}

impl PayoutSummary {
    pub fn from_records(records: &[AcceptedRecord], config: &PayoutConfig) -> Self {
        PayoutStatistics::new(config).summarize(records)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaStats {
    pub shoppers: usize,
    pub records: usize,
    pub mean_pay: Option<Money>,
    pub mean_pay_v1: Option<Money>,
    #[serde(with = "rust_decimal::serde::float")]
    pub v1_share: Decimal,
    pub mean_tip: Option<Money>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub mean_tip_share: Option<Decimal>,
}

pub struct PayoutStatistics<'a> {
    config: &'a PayoutConfig,
    classifier: PayoutClassifier<'a>,
}

impl<'a> PayoutStatistics<'a> {
    pub fn new(config: &'a PayoutConfig) -> Self {
        Self {
            config,
            classifier: PayoutClassifier::new(config),
        }
    }

    fn is_v1(&self, record: &AcceptedRecord) -> bool {
        record.is_v1.unwrap_or_else(|| self.classifier.is_v1(record))
    }

    pub fn average_pay_v1(&self, records: &[AcceptedRecord]) -> PayAverage {
        self.average_pay_where(records, |r| self.is_v1(r))
    }

    pub fn average_pay_v2(&self, records: &[AcceptedRecord]) -> PayAverage {
        self.average_pay_where(records, |r| !self.is_v1(r))
    }

    fn average_pay_where<F>(&self, records: &[AcceptedRecord], keep: F) -> PayAverage
    where
        F: Fn(&AcceptedRecord) -> bool,
    {
        let pays: Vec<Money> = shop_records(records)
            .filter(|r| keep(r))
            .filter_map(|r| r.order_pay)
            .collect();
        PayAverage {
            count: pays.len(),
            mean: Money::mean(pays),
        }
    }

    pub fn average_pay_if_v1(&self, records: &[AcceptedRecord]) -> Option<Money> {
        Money::mean(
            shop_records(records)
                .filter_map(|r| r.order_total)
                .map(|total| self.classifier.v1_pay(total)),
        )
    }

    pub fn average_pay_true(&self, records: &[AcceptedRecord]) -> Option<Money> {
        Money::mean(shop_records(records).filter_map(|r| r.order_pay))
    }

    pub fn average_tips(&self, records: &[AcceptedRecord]) -> TipSummary {
        TipSummary {
            mean_amount: Money::mean(shop_records(records).filter_map(|r| r.tip)),
            mean_share: mean_tip_share(shop_records(records)),
        }
    }

    /// Sum of V1 formula pay minus sum of actual pay, over records that carry
    /// both an order total and an order pay.
    pub fn v1_v2_total_pay_difference(&self, records: &[AcceptedRecord]) -> Money {
        shop_records(records)
            .filter_map(|r| Some(self.classifier.v1_pay(r.order_total?) - r.order_pay?))
            .sum()
    }

    pub fn summarize(&self, records: &[AcceptedRecord]) -> PayoutSummary {
        PayoutSummary {
            records: shop_records(records).count(),
            v1: self.average_pay_v1(records),
            v2: self.average_pay_v2(records),
            mean_pay_if_v1: self.average_pay_if_v1(records),
            mean_pay: self.average_pay_true(records),
            tips: self.average_tips(records),
            v1_v2_difference: self.v1_v2_total_pay_difference(records),
            likely_v1: self.classifier.likely_v1(records),
        }
    }

    /// Statistics for an area, given each shopper's records keyed by shopper.
    /// `None` until the area has enough shoppers and records to say anything.
    pub fn area_stats(&self, shoppers: &BTreeMap<String, Vec<AcceptedRecord>>) -> Option<AreaStats> {
        if shoppers.len() < self.config.area_min_shoppers {
            debug!(
                "Area has {} shoppers, need {}",
                shoppers.len(),
                self.config.area_min_shoppers
            );
            return None;
        }

        let records: Vec<&AcceptedRecord> = shoppers
            .values()
            .flat_map(|records| shop_records(records))
            .collect();
        if records.len() < self.config.area_min_records {
            debug!(
                "Area has {} records, need {}",
                records.len(),
                self.config.area_min_records
            );
            return None;
        }

        let v1_pays: Vec<Money> = records
            .iter()
            .filter(|r| self.is_v1(r))
            .filter_map(|r| r.order_pay)
            .collect();
        let v1_count = records.iter().filter(|r| self.is_v1(r)).count();

        Some(AreaStats {
            shoppers: shoppers.len(),
            records: records.len(),
            mean_pay: Money::mean(records.iter().filter_map(|r| r.order_pay)),
            mean_pay_v1: Money::mean(v1_pays),
            v1_share: Decimal::from(v1_count as u64) / Decimal::from(records.len() as u64),
            mean_tip: Money::mean(records.iter().filter_map(|r| r.tip)),
            mean_tip_share: mean_tip_share(records.iter().copied()),
        })
    }
}

pub fn summarize(records: &[AcceptedRecord], config: &PayoutConfig) -> PayoutSummary {
    PayoutSummary::from_records(records, config)
}

pub fn area_stats(
    shoppers: &BTreeMap<String, Vec<AcceptedRecord>>,
    config: &PayoutConfig,
) -> Option<AreaStats> {
    PayoutStatistics::new(config).area_stats(shoppers)
}

fn shop_records(records: &[AcceptedRecord]) -> impl Iterator<Item = &AcceptedRecord> {
    records.iter().filter(|r| !r.delivery_only)
}

fn mean_tip_share<'r, I>(records: I) -> Option<Decimal>
where
    I: Iterator<Item = &'r AcceptedRecord>,
{
    let shares: Vec<Decimal> = records
        .filter_map(|r| {
            let tip = r.tip?;
            let total = r.total_pay?;
            if total.is_zero() {
                return None;
            }
            Some(tip.amount() / total.amount())
        })
        .collect();

    if shares.is_empty() {
        return None;
    }
    let count = Decimal::from(shares.len() as u64);
    Some(shares.into_iter().sum::<Decimal>() / count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(order_total: i64, order_pay: i64, tip: i64) -> AcceptedRecord {
        AcceptedRecord {
            order_number: format!("{}-{}-{}", order_total, order_pay, tip),
            order_total: Some(Money::from_cents(order_total)),
            order_pay: Some(Money::from_cents(order_pay)),
            tip: Some(Money::from_cents(tip)),
            promo_pay: Money::ZERO,
            total_pay: Some(Money::from_cents(order_pay + tip)),
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

    fn history() -> Vec<AcceptedRecord> {
        let mut delivery = record(0, 700, 0);
        delivery.delivery_only = true;
        vec![
            // V1: 0.075 * 100 + 5 = 12.50
            record(10000, 1250, 1250),
            // V2: V1 would have paid 20.00
            record(20000, 1500, 0),
            delivery,
        ]
    }

    #[test]
    fn test_v1_and_v2_averages() {
        let config = PayoutConfig::default();
        let stats = PayoutStatistics::new(&config);
        let records = history();

        let v1 = stats.average_pay_v1(&records);
        assert_eq!(v1.count, 1);
        assert_eq!(v1.mean, Some(Money::from_cents(1250)));

        let v2 = stats.average_pay_v2(&records);
        assert_eq!(v2.count, 1);
        assert_eq!(v2.mean, Some(Money::from_cents(1500)));
    }

    #[test]
    fn test_pay_if_v1_and_difference() {
        let config = PayoutConfig::default();
        let stats = PayoutStatistics::new(&config);
        let records = history();

        assert_eq!(stats.average_pay_if_v1(&records), Some(Money::from_cents(1625)));
        assert_eq!(stats.average_pay_true(&records), Some(Money::from_cents(1375)));
        assert_eq!(stats.v1_v2_total_pay_difference(&records), Money::from_cents(500));
    }

    #[test]
    fn test_tip_summary() {
        let config = PayoutConfig::default();
        let tips = PayoutStatistics::new(&config).average_tips(&history());
        assert_eq!(tips.mean_amount, Some(Money::from_cents(625)));
        // (0.5 + 0.0) / 2
        assert_eq!(tips.mean_share, Some(Decimal::new(25, 2)));
    }

    #[test]
    fn test_summary_for_empty_history() {
        let summary = summarize(&[], &PayoutConfig::default());
        assert_eq!(summary.records, 0);
        assert_eq!(summary.v1.mean, None);
        assert_eq!(summary.mean_pay, None);
        assert_eq!(summary.tips.mean_share, None);
        assert_eq!(summary.v1_v2_difference, Money::ZERO);
        assert_eq!(summary.likely_v1, None);
    }

    #[test]
    fn test_summary_counts_shop_records_only() {
        let summary = PayoutSummary::from_records(&history(), &PayoutConfig::default());
        assert_eq!(summary.records, 2);
        assert_eq!(summary.likely_v1, Some(false));
    }

    #[test]
    fn test_area_requires_enough_shoppers() {
        let config = PayoutConfig::default();
        let mut shoppers = BTreeMap::new();
        shoppers.insert("1".to_string(), history());
        shoppers.insert("2".to_string(), history());
        assert!(area_stats(&shoppers, &config).is_none());
    }

    #[test]
    fn test_area_requires_enough_records() {
        let config = PayoutConfig::default();
        let mut shoppers = BTreeMap::new();
        for id in ["1", "2", "3"] {
            shoppers.insert(id.to_string(), vec![record(10000, 1250, 0)]);
        }
        assert!(area_stats(&shoppers, &config).is_none());
    }

    #[test]
    fn test_area_stats() {
        let config = PayoutConfig::default();
        let mut shoppers = BTreeMap::new();
        for id in ["1", "2", "3"] {
            shoppers.insert(id.to_string(), history());
        }

        let area = area_stats(&shoppers, &config).unwrap();
        assert_eq!(area.shoppers, 3);
        assert_eq!(area.records, 6);
        assert_eq!(area.mean_pay, Some(Money::from_cents(1375)));
        assert_eq!(area.mean_pay_v1, Some(Money::from_cents(1250)));
        assert_eq!(area.v1_share, Decimal::new(5, 1));
        assert_eq!(area.mean_tip_share, Some(Decimal::new(25, 2)));
    }

    #[test]
    fn test_summary_serializes() {
        let json = serde_json::to_value(summarize(&history(), &PayoutConfig::default())).unwrap();
        assert_eq!(json["records"], serde_json::json!(2));
        assert_eq!(json["tips"]["mean_share"], serde_json::json!(0.25));
    }
}
