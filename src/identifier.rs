use crate::reconcile::PayFigures;
use crate::utils::day_of_month;
use log::debug;

/// True for a non-empty run of ASCII digits, the only shape a real order
/// number takes on a receipt.
pub fn is_usable_order_number(order_number: &str) -> bool {
    !order_number.is_empty() && order_number.chars().all(|c| c.is_ascii_digit())
}

/// Builds a stand-in order number from `<whole tip><whole total pay><day of month>`.
/// Returns `None` when any ingredient is missing.
pub fn synthesize_order_number(figures: &PayFigures, delivery_date: Option<&str>) -> Option<String> {
    let tip = figures.tip?;
    let total_pay = figures.total_pay?;
    let day = day_of_month(delivery_date?)?;

    Some(format!("{}{}{}", tip.whole_units(), total_pay.whole_units(), day))
}

/// Keeps a usable order number; otherwise synthesizes one from the reconciled
/// figures. Falls back to whatever was read (possibly nothing) when synthesis
/// is impossible, which leads to the record being rejected.
pub fn resolve_order_number(
    order_number: Option<&str>,
    figures: &PayFigures,
    delivery_date: Option<&str>,
) -> Option<String> {
    if let Some(number) = order_number.filter(|n| is_usable_order_number(n)) {
        return Some(number.to_string());
    }

    match synthesize_order_number(figures, delivery_date) {
        Some(synthesized) => {
            debug!(
                "Order number {:?} unusable, synthesized {}",
                order_number, synthesized
            );
            Some(synthesized)
        }
        None => order_number.map(str::to_string),
    }
}
