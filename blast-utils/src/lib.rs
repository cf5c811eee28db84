//! Shared utility functions for blast analytics crates.

/// Date utility functions
pub mod dates {
    use chrono::NaiveDate;

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// Display label for a single day, e.g. "15 Mar 2024"
    pub fn day_label(date: &NaiveDate) -> String {
        date.format("%d %b %Y").to_string()
    }

    /// Display label for a calendar month, e.g. "Mar 2024".
    /// Falls back to "YYYY-MM" for a month outside 1..=12.
    pub fn month_label(year: i32, month: u32) -> String {
        match NaiveDate::from_ymd_opt(year, month, 1) {
            Some(first) => first.format("%b %Y").to_string(),
            None => format!("{:04}-{:02}", year, month),
        }
    }

    /// Display label for a year
    pub fn year_label(year: i32) -> String {
        year.to_string()
    }

    /// Sortable key for a calendar month, e.g. "2024-03"
    pub fn month_key(year: i32, month: u32) -> String {
        format!("{:04}-{:02}", year, month)
    }

}
