use chrono::NaiveDate;

/// Output format for every date field on a record.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Resolves a `"Mar" "14,"` pair against the given year. Full month names
/// are accepted too.
pub fn month_day_in_year(month: &str, day: &str, year: i32) -> Option<NaiveDate> {
    let month = month.trim().trim_end_matches(['.', ',']);
    let day = day.trim().trim_end_matches([',', '.', ':']);
    if month.is_empty() || day.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(&format!("{} {} {}", month, day, year), "%b %d %Y").ok()
}

/// Parses a date already written as MM/DD/YYYY, ignoring trailing punctuation.
pub fn parse_slash_date(token: &str) -> Option<NaiveDate> {
    let token = token.trim().trim_end_matches([',', ':', '.']);
    NaiveDate::parse_from_str(token, DATE_FORMAT).ok()
}

/// Day-of-month component of an MM/DD/YYYY string, exactly as written.
pub fn day_of_month(date: &str) -> Option<&str> {
    date.split('/')
        .nth(1)
        .map(str::trim)
        .filter(|day| !day.is_empty())
}
