use crate::money::Money;
use log::debug;
use serde::{Deserialize, Serialize};

/// The pay figures of one receipt, coerced to numbers. Unreadable tokens
/// arrive here as `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayFigures {
    pub order_pay: Option<Money>,
    pub tip: Option<Money>,
    pub promo_pay: Money,
    pub total_pay: Option<Money>,
}

impl PayFigures {
    pub fn components_sum(&self) -> Option<Money> {
        self.order_pay?.checked_add(self.tip?)?.checked_add(self.promo_pay)
    }
}

/// Which correction, if any, was applied to make the pay figures add up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Correction {
    /// Order pay or total pay missing; nothing was touched.
    Incomplete,
    /// The identity held once magnitudes were repaired.
    Consistent,
    OrderPayRecomputed,
    TotalPayRecomputed,
    TipRecomputed,
    /// The identity is still violated. The figures are kept as they are.
    Irreconcilable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Number of times a figure was divided by ten.
    pub magnitude_repairs: usize,
    pub correction: Correction,
}

/// Repairs OCR magnitude errors and checks `order_pay + tip + promo_pay == total_pay`.
///
/// 1. While order pay exceeds total pay, move its decimal point one place left.
/// 2. The same for the tip.
/// 3. If the identity still fails, apply the first matching rule only:
///    recompute order pay, else total pay, else tip.
///
/// The rules run once and do not iterate to a fixed point, so a receipt with
/// several misread figures can stay inconsistent. A missing tip counts as zero.
pub fn reconcile(figures: &mut PayFigures) -> ReconcileReport {
    let (Some(mut order_pay), Some(mut total_pay)) = (figures.order_pay, figures.total_pay) else {
        return ReconcileReport {
            magnitude_repairs: 0,
            correction: Correction::Incomplete,
        };
    };
    let mut tip = figures.tip.unwrap_or(Money::ZERO);
    let promo_pay = figures.promo_pay;
    let mut magnitude_repairs = 0;

    while order_pay > total_pay && !order_pay.is_zero() {
        order_pay = order_pay.shift_decimal_left();
        magnitude_repairs += 1;
    }

    while tip > total_pay && !tip.is_zero() {
        tip = tip.shift_decimal_left();
        magnitude_repairs += 1;
    }

    // Sums that overflow leave the figures untouched.
    let components = order_pay.checked_add(tip).and_then(|sum| sum.checked_add(promo_pay));
    let correction = match components {
        None => Correction::Irreconcilable,
        Some(sum) if sum == total_pay => Correction::Consistent,
        Some(_) if order_pay > total_pay => {
            match total_pay.checked_sub(promo_pay).and_then(|rest| rest.checked_sub(tip)) {
                Some(recomputed) => {
                    order_pay = recomputed;
                    Correction::OrderPayRecomputed
                }
                None => Correction::Irreconcilable,
            }
        }
        Some(sum) if total_pay > sum => {
            total_pay = sum;
            Correction::TotalPayRecomputed
        }
        Some(_) if tip > total_pay => {
            match total_pay.checked_sub(order_pay).and_then(|rest| rest.checked_sub(promo_pay)) {
                Some(recomputed) => {
                    tip = recomputed;
                    Correction::TipRecomputed
                }
                None => Correction::Irreconcilable,
            }
        }
        Some(_) => Correction::Irreconcilable,
    };

    if magnitude_repairs > 0 || correction != Correction::Consistent {
        debug!(
            "Reconciled pay figures: {} magnitude repairs, {:?} (order pay {}, tip {}, promo {}, total {})",
            magnitude_repairs, correction, order_pay, tip, promo_pay, total_pay
        );
    }

    figures.order_pay = Some(order_pay);
    figures.tip = Some(tip);
    figures.total_pay = Some(total_pay);

    ReconcileReport {
        magnitude_repairs,
        correction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figures(order_pay: i64, tip: i64, promo_pay: i64, total_pay: i64) -> PayFigures {
        PayFigures {
            order_pay: Some(Money::from_cents(order_pay)),
            tip: Some(Money::from_cents(tip)),
            promo_pay: Money::from_cents(promo_pay),
            total_pay: Some(Money::from_cents(total_pay)),
        }
    }

    #[test]
    fn test_consistent_figures_untouched() {
        let mut f = figures(1021, 648, 0, 1669);
        let report = reconcile(&mut f);
        assert_eq!(report.correction, Correction::Consistent);
        assert_eq!(report.magnitude_repairs, 0);
        assert_eq!(f, figures(1021, 648, 0, 1669));
    }

    #[test]
    fn test_extra_trailing_digit_in_order_pay() {
        let mut f = figures(11170, 0, 0, 1117);
        let report = reconcile(&mut f);
        assert_eq!(f.order_pay, Some(Money::from_cents(1117)));
        assert_eq!(report.magnitude_repairs, 1);
        assert_eq!(report.correction, Correction::Consistent);
    }

    #[test]
    fn test_missing_decimal_point_needs_two_shifts() {
        let mut f = figures(145800, 0, 0, 1458);
        let report = reconcile(&mut f);
        assert_eq!(f.order_pay, Some(Money::from_cents(1458)));
        assert_eq!(report.magnitude_repairs, 2);
    }

    #[test]
    fn test_oversized_tip_repaired() {
        let mut f = figures(1182, 50000, 0, 6182);
        reconcile(&mut f);
        assert_eq!(f.tip, Some(Money::from_cents(5000)));
        assert_eq!(f.components_sum(), f.total_pay);
    }

    #[test]
    fn test_total_pay_lowered_to_sum() {
        let mut f = figures(1440, 0, 0, 1944);
        let report = reconcile(&mut f);
        assert_eq!(report.correction, Correction::TotalPayRecomputed);
        assert_eq!(f.total_pay, Some(Money::from_cents(1440)));
    }

    #[test]
    fn test_total_below_sum_is_left_alone() {
        let mut f = figures(1458, 1000, 0, 2000);
        let report = reconcile(&mut f);
        assert_eq!(report.correction, Correction::Irreconcilable);
        assert_eq!(f, figures(1458, 1000, 0, 2000));
    }

    #[test]
    fn test_promo_counts_toward_identity() {
        let mut f = figures(1263, 2500, 400, 4163);
        assert_eq!(reconcile(&mut f).correction, Correction::Consistent);
    }

    #[test]
    fn test_missing_tip_defaults_to_zero() {
        let mut f = PayFigures {
            order_pay: Some(Money::from_cents(943)),
            tip: None,
            promo_pay: Money::ZERO,
            total_pay: Some(Money::from_cents(943)),
        };
        assert_eq!(reconcile(&mut f).correction, Correction::Consistent);
        assert_eq!(f.tip, Some(Money::ZERO));
    }

    #[test]
    fn test_missing_total_is_incomplete() {
        let mut f = PayFigures {
            order_pay: Some(Money::from_cents(943)),
            tip: Some(Money::ZERO),
            promo_pay: Money::ZERO,
            total_pay: None,
        };
        let before = f;
        assert_eq!(reconcile(&mut f).correction, Correction::Incomplete);
        assert_eq!(f, before);
    }

    #[test]
    fn test_overflowing_sum_is_irreconcilable() {
        let max = Money::new(rust_decimal::Decimal::MAX);
        let mut f = PayFigures {
            order_pay: Some(max),
            tip: Some(max),
            promo_pay: Money::ZERO,
            total_pay: Some(max),
        };
        let before = f;
        assert_eq!(reconcile(&mut f).correction, Correction::Irreconcilable);
        assert_eq!(f, before);
        assert_eq!(f.components_sum(), None);
    }

    #[test]
    fn test_zero_total_terminates() {
        let mut f = figures(1458, 0, 0, 0);
        reconcile(&mut f);
        assert_eq!(f.order_pay, Some(Money::ZERO));
    }
}
