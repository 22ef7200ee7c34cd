use crate::error::Result;
use crate::money::Money;
use crate::schema::AcceptedRecord;
use log::info;
use serde::Serialize;
use std::io::Write;

/// One CSV row. Absent values become empty cells; money is written with
/// two decimals.
#[derive(Debug, Serialize)]
struct CsvRow<'r> {
    order_number: &'r str,
    order_total: String,
    late: Option<bool>,
    delivery_only: bool,
    delivery_window_start: Option<&'r str>,
    delivery_window_end: Option<&'r str>,
    delivery_date: Option<&'r str>,
    delivered_date: Option<&'r str>,
    delivered_time: Option<&'r str>,
    order_pay: String,
    tip: String,
    promo_pay: String,
    total_pay: String,
    filename: Option<&'r str>,
    date_submitted: &'r str,
    phone: Option<&'r str>,
    from_zip: Option<&'r str>,
    is_v1: Option<bool>,
}

fn money_cell(value: Option<Money>) -> String {
    value.map(|m| m.to_string()).unwrap_or_default()
}

impl<'r> From<&'r AcceptedRecord> for CsvRow<'r> {
    fn from(record: &'r AcceptedRecord) -> Self {
        Self {
            order_number: &record.order_number,
            order_total: money_cell(record.order_total),
            late: record.late,
            delivery_only: record.delivery_only,
            delivery_window_start: record.delivery_window_start.as_deref(),
            delivery_window_end: record.delivery_window_end.as_deref(),
            delivery_date: record.delivery_date.as_deref(),
            delivered_date: record.delivered_date.as_deref(),
            delivered_time: record.delivered_time.as_deref(),
            order_pay: money_cell(record.order_pay),
            tip: money_cell(record.tip),
            promo_pay: record.promo_pay.to_string(),
            total_pay: money_cell(record.total_pay),
            filename: record.order_source_image.as_deref(),
            date_submitted: &record.submission_date,
            phone: record.phone.as_deref(),
            from_zip: record.from_zip.as_deref(),
            is_v1: record.is_v1,
        }
    }
}

pub fn write_csv<W: Write>(records: &[AcceptedRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(CsvRow::from(record))?;
    }
    csv_writer.flush()?;
    info!("Exported {} records to CSV", records.len());
    Ok(())
}

pub fn to_csv_string(records: &[AcceptedRecord]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
