//! Line-by-line scanner that turns one screenshot's OCR transcript into
//! accepted records.
//!
//! The scanner walks the lines with a cursor. Each line is classified by its
//! leading tokens and routed to a field reader that fills the open
//! [`PartialRecord`]. A `Total` line closes the record: its pay figures are
//! reconciled, a missing order number is synthesized, and the record is
//! either accepted or dropped.

use crate::config::ScanContext;
use crate::identifier::resolve_order_number;
use crate::line::{classify, strip_punctuation, tokens, LineKind};
use crate::money::{Amount, Money};
use crate::reconcile::{reconcile, PayFigures};
use crate::schema::AcceptedRecord;
use crate::utils::{format_date, month_day_in_year, parse_slash_date};
use log::debug;

/// Characters OCR produces in place of the dot between an order number and
/// the order total.
const SEPARATOR_MARKERS: [char; 5] = ['+', '*', '-', '»', '«'];

/// Fields read so far for the transaction being scanned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialRecord {
    pub order_number: Option<String>,
    pub order_total: Option<Amount>,
    pub order_pay: Option<Amount>,
    pub tip: Option<Amount>,
    pub promo_pay: Option<Amount>,
    pub total_pay: Option<Amount>,
    pub delivery_date: Option<String>,
    pub delivered_date: Option<String>,
    pub delivery_window_start: Option<String>,
    pub delivery_window_end: Option<String>,
    pub delivered_time: Option<String>,
    pub late: Option<bool>,
    pub delivery_only: Option<bool>,
}

impl PartialRecord {
    pub fn pay_figures(&self) -> PayFigures {
        let promo_pay = match &self.promo_pay {
            None => Money::ZERO,
            Some(amount) => amount.money().unwrap_or_else(|| {
                debug!("Unreadable promo pay {:?}, treating as zero", amount);
                Money::ZERO
            }),
        };

        PayFigures {
            order_pay: self.order_pay.as_ref().and_then(Amount::money),
            tip: self.tip.as_ref().and_then(Amount::money),
            promo_pay,
            total_pay: self.total_pay.as_ref().and_then(Amount::money),
        }
    }

    /// Reconciles the figures, settles the order number and decides whether
    /// the record is usable. A record needs a non-empty order number and an
    /// order total line.
    pub fn finish(self, context: &ScanContext) -> Option<AcceptedRecord> {
        let mut figures = self.pay_figures();
        reconcile(&mut figures);

        let order_number = resolve_order_number(
            self.order_number.as_deref(),
            &figures,
            self.delivery_date.as_deref(),
        )
        .unwrap_or_default();

        if order_number.is_empty() {
            debug!("Discarding record without a usable order number");
            return None;
        }
        let Some(order_total) = self.order_total else {
            debug!("Discarding order {} without an order total", order_number);
            return None;
        };

        let metadata = &context.metadata;
        Some(AcceptedRecord {
            order_number,
            order_total: order_total.money(),
            order_pay: figures.order_pay,
            tip: figures.tip,
            promo_pay: figures.promo_pay,
            total_pay: figures.total_pay,
            delivery_date: self.delivery_date,
            delivered_date: self.delivered_date,
            delivery_window_start: self.delivery_window_start,
            delivery_window_end: self.delivery_window_end,
            delivered_time: self.delivered_time,
            late: self.late,
            delivery_only: self.delivery_only.unwrap_or(false),
            is_v1: None,
            order_source_image: metadata.source_image.clone(),
            submission_date: context.reference_date_string(),
            phone: metadata.phone.clone(),
            from_zip: metadata.from_zip.clone(),
        })
    }
}

/// Whether a transaction is being read, and what has been read of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState<'r> {
    Idle,
    Open(&'r PartialRecord),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DeliveryWindow {
    start: String,
    end: String,
    date: Option<String>,
}

/// Lazily yields the accepted records of one transcript, in order.
#[derive(Debug, Clone)]
pub struct ReceiptScanner<'a> {
    lines: Vec<&'a str>,
    cursor: usize,
    open: Option<PartialRecord>,
    context: &'a ScanContext,
}

impl<'a> ReceiptScanner<'a> {
    pub fn new(text: &'a str, context: &'a ScanContext) -> Self {
        Self::from_lines(text.lines().collect(), context)
    }

    pub fn from_lines(lines: Vec<&'a str>, context: &'a ScanContext) -> Self {
        Self {
            lines,
            cursor: 0,
            open: None,
            context,
        }
    }

    pub fn state(&self) -> ScanState<'_> {
        match &self.open {
            Some(record) => ScanState::Open(record),
            None => ScanState::Idle,
        }
    }

    /// The open record, starting a new one when idle.
    fn record(&mut self) -> &mut PartialRecord {
        self.open.get_or_insert_with(PartialRecord::default)
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.cursor).copied()
    }

    fn advance(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.cursor += 1;
        Some(line)
    }

    fn consume(&mut self, line: &str) -> Option<AcceptedRecord> {
        match classify(line) {
            LineKind::WindowHeader => self.read_window(line),
            LineKind::DeliveryHeader => self.read_delivery(line),
            LineKind::DeliveredHeader => self.read_delivered(line),
            LineKind::OrderPayLine => self.read_order_pay(line),
            LineKind::OrderHeader => self.read_order_header(line),
            LineKind::TipLine => self.read_tip(line),
            LineKind::PromoLine => self.read_promo(line),
            LineKind::TotalLine => return self.read_total(line),
            LineKind::Unrecognized => {}
        }
        None
    }

    /// `Window Mar 14, 4PM-5PM`
    fn read_window(&mut self, line: &str) {
        let toks = tokens(line);
        if toks.len() < 4 {
            return;
        }
        let Some(date) = month_day_in_year(toks[1], toks[2], self.context.year()) else {
            debug!("Unreadable window date in {:?}", line);
            return;
        };
        let Some((start, end)) = toks[3].split_once('-') else {
            return;
        };

        let date = format_date(date);
        let record = self.record();
        record.delivery_window_start = Some(start.to_string());
        record.delivery_window_end = Some(end.to_string());
        record.delivery_date = Some(date.clone());
        record.delivered_date = Some(date);
    }

    /// `Delivery Only`, or a delivery window that OCR may have wrapped onto
    /// the following line.
    fn read_delivery(&mut self, line: &str) {
        let toks = tokens(line);
        if toks.get(1) == Some(&"Only") {
            self.record().delivery_only = Some(true);
            return;
        }

        let year = self.context.year();
        let next = self.peek();
        let record = self.record();
        if record.delivery_only.is_none() {
            record.delivery_only = Some(false);
        }

        if !line.to_lowercase().contains("window") {
            return;
        }

        let merged = match next {
            Some(next) if toks.len() < 3 || !has_time_range(split_window_header(line).1) => {
                format!("{} {}", line, next)
            }
            _ => line.to_string(),
        };

        if let Some(window) = parse_delivery_window(&merged, year) {
            record.delivery_window_start = Some(window.start);
            record.delivery_window_end = Some(window.end);
            if window.date.is_some() {
                record.delivery_date = window.date;
            }
        }
    }

    /// `Delivered Today, 4:32 PM`
    fn read_delivered(&mut self, line: &str) {
        let toks = tokens(line);
        let Some(first) = toks.get(1) else {
            return;
        };

        let raw = first.trim_end_matches(',');
        let (date, time_from) = if raw == "Today" {
            (self.context.reference_date_string(), 2)
        } else if let Some(date) = parse_slash_date(raw) {
            (format_date(date), 2)
        } else if let Some(date) = toks
            .get(2)
            .and_then(|day| month_day_in_year(raw, day, self.context.year()))
        {
            (format_date(date), 3)
        } else {
            (raw.to_string(), 2)
        };

        let time = toks.get(time_from..).map(|t| t.join(" ")).unwrap_or_default();

        let record = self.record();
        record.delivered_date = Some(date);
        if !time.is_empty() {
            record.delivered_time = Some(time);
        }
    }

    /// `Order Pay $14.58`
    fn read_order_pay(&mut self, line: &str) {
        if let Some(token) = tokens(line).get(2) {
            self.record().order_pay = Some(Amount::from_token(token));
        }
    }

    /// `Order #27852647 · $124.37 On Time`
    ///
    /// The dot between number and total is sometimes read as a marker
    /// character, sometimes dropped entirely. Lines with fewer than four
    /// tokens carry no total.
    fn read_order_header(&mut self, line: &str) {
        let toks = tokens(line);
        let Some(number) = toks.get(1) else {
            return;
        };

        let order_total = if toks.len() >= 4 {
            let separator = toks[2];
            let marked = separator.chars().any(|c| SEPARATOR_MARKERS.contains(&c));
            let total_token = if marked || separator.chars().count() == 1 {
                toks[3]
            } else {
                toks[2]
            };
            Some(Amount::from_token(total_token))
        } else {
            None
        };

        let record = self.record();
        record.order_number = Some(strip_punctuation(number));
        record.order_total = order_total;

        if let Some(last) = toks.last() {
            if last.contains("Time") {
                record.late = Some(false);
            } else if last.contains("Late") {
                record.late = Some(true);
            }
        }
    }

    /// `Tip $25.00`
    fn read_tip(&mut self, line: &str) {
        let toks = tokens(line);
        if toks.len() < 2 {
            return;
        }
        if let Some(token) = toks.last() {
            self.record().tip = Some(Amount::from_token(token));
        }
    }

    /// `Promo Pay $4.00`
    fn read_promo(&mut self, line: &str) {
        if let Some(token) = tokens(line).get(2) {
            self.record().promo_pay = Some(Amount::from_token(token));
        }
    }

    /// `Total Pay $39.58` closes the open record.
    fn read_total(&mut self, line: &str) -> Option<AcceptedRecord> {
        let total_pay = tokens(line).get(2).map(|token| Amount::from_token(token));
        let mut record = self.open.take().unwrap_or_default();
        record.total_pay = total_pay;
        if record.promo_pay.is_none() {
            record.promo_pay = Some(Amount::Parsed(Money::ZERO));
        }
        record.finish(self.context)
    }
}

impl Iterator for ReceiptScanner<'_> {
    type Item = AcceptedRecord;

    fn next(&mut self) -> Option<AcceptedRecord> {
        while let Some(line) = self.advance() {
            if let Some(record) = self.consume(line) {
                return Some(record);
            }
        }
        None
    }
}

/// Text after the window header's colon, e.g. `9AM to 10AM` from
/// `Delivery window: 9AM to 10AM`. A colon inside a time is not a header colon.
fn split_window_header(line: &str) -> (&str, &str) {
    if let Some(idx) = line.find(": ") {
        return (&line[..idx], &line[idx + 2..]);
    }
    if let Some(stripped) = line.strip_suffix(':') {
        return (stripped, "");
    }
    ("", line)
}

fn has_time_range(range: &str) -> bool {
    range
        .split_whitespace()
        .any(|word| word.eq_ignore_ascii_case("to"))
}

fn is_meridiem(word: &str) -> bool {
    let word = strip_punctuation(word);
    word.eq_ignore_ascii_case("am") || word.eq_ignore_ascii_case("pm")
}

fn parse_delivery_window(line: &str, year: i32) -> Option<DeliveryWindow> {
    let (header, range) = split_window_header(line);
    let words: Vec<&str> = range.split_whitespace().collect();
    let to = words.iter().position(|w| w.eq_ignore_ascii_case("to"))?;

    // "9 AM" may be split into two tokens on either side of "to".
    let start = match &words[..to] {
        [.., number, meridiem] if is_meridiem(meridiem) => format!("{}{}", number, meridiem),
        [.., last] => last.to_string(),
        [] => return None,
    };
    let after = &words[to + 1..];
    let (end, rest) = match after {
        [number, meridiem, rest @ ..] if is_meridiem(meridiem) && !is_meridiem(number) => {
            (format!("{}{}", number, meridiem), rest)
        }
        [end, rest @ ..] => (end.to_string(), rest),
        [] => return None,
    };

    let start = strip_punctuation(&start);
    let end = strip_punctuation(&end);
    if start.is_empty() || end.is_empty() {
        return None;
    }

    let date = header
        .split_whitespace()
        .find_map(parse_slash_date)
        .or_else(|| match rest {
            [month, day, ..] => month_day_in_year(month, day, year),
            _ => None,
        })
        .map(format_date);

    Some(DeliveryWindow { start, end, date })
}

/// Scans a transcript into its accepted records.
pub fn scan<'a>(text: &'a str, context: &'a ScanContext) -> ReceiptScanner<'a> {
    ReceiptScanner::new(text, context)
}

pub fn scan_text(text: &str, context: &ScanContext) -> Vec<AcceptedRecord> {
    ReceiptScanner::new(text, context).collect()
}
