use serde::{Deserialize, Serialize};

/// The logical field a receipt line begins, decided from its leading tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineKind {
    /// `Window Mar 14, 4PM-5PM`
    WindowHeader,
    /// `Delivery window: 9AM to 10AM` or `Delivery Only`
    DeliveryHeader,
    /// `Delivered Today, 4:32 PM`
    DeliveredHeader,
    /// `Order Pay $14.58`
    OrderPayLine,
    /// `Order #27852647 · $124.37 On Time`
    OrderHeader,
    /// `Tip $25.00`
    TipLine,
    /// `Promo Pay $4.00`
    PromoLine,
    /// `Total Pay $39.58`, closes the record.
    TotalLine,
    Unrecognized,
}

impl LineKind {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LineKind::TotalLine)
    }
}

pub fn classify(line: &str) -> LineKind {
    let mut tokens = line.split_whitespace();
    let first = tokens.next().unwrap_or_default();

    match first {
        "Window" => LineKind::WindowHeader,
        "Delivery" => LineKind::DeliveryHeader,
        "Delivered" => LineKind::DeliveredHeader,
        "Order" => match tokens.next() {
            Some("Pay") => LineKind::OrderPayLine,
            _ => LineKind::OrderHeader,
        },
        "Tip" => LineKind::TipLine,
        "Promo" => LineKind::PromoLine,
        "Total" => LineKind::TotalLine,
        _ => LineKind::Unrecognized,
    }
}

pub fn tokens(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Removes ASCII punctuation, e.g. the `#` in front of an order number.
pub fn strip_punctuation(s: &str) -> String {
    s.chars().filter(|c| !c.is_ascii_punctuation()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_headers() {
        assert_eq!(classify("Window Mar 14, 4PM-5PM"), LineKind::WindowHeader);
        assert_eq!(classify("Delivery Only"), LineKind::DeliveryHeader);
        assert_eq!(classify("Delivered Today, 4:32 PM"), LineKind::DeliveredHeader);
        assert_eq!(classify("Tip $25.00"), LineKind::TipLine);
        assert_eq!(classify("Promo Pay $4.00"), LineKind::PromoLine);
        assert_eq!(classify("Total Pay $39.58"), LineKind::TotalLine);
    }

    #[test]
    fn test_classify_order_disambiguation() {
        assert_eq!(classify("Order Pay $14.58"), LineKind::OrderPayLine);
        assert_eq!(classify("Order #27852647 · $124.37"), LineKind::OrderHeader);
        assert_eq!(classify("Order"), LineKind::OrderHeader);
    }

    #[test]
    fn test_classify_is_case_sensitive_on_first_token() {
        assert_eq!(classify("total pay $1.00"), LineKind::Unrecognized);
        assert_eq!(classify(""), LineKind::Unrecognized);
        assert_eq!(classify("   "), LineKind::Unrecognized);
        assert_eq!(classify("Shop & Deliver"), LineKind::Unrecognized);
    }

    #[test]
    fn test_only_total_is_terminal() {
        assert!(LineKind::TotalLine.is_terminal());
        assert!(!LineKind::OrderHeader.is_terminal());
    }

    #[test]
    fn test_strip_punctuation() {
        assert_eq!(strip_punctuation("#27852647"), "27852647");
        assert_eq!(strip_punctuation("10AM,"), "10AM");
        assert_eq!(strip_punctuation("#"), "");
    }
}
