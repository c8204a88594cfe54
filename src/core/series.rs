//! Per-fund views over the quota table.
use crate::core::fund::QuotaRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A range is ordered when its start is not after its end.
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Records of one fund, ascending by date.
pub fn extract_series(tax_id: Option<&str>, records: &[QuotaRecord]) -> Vec<QuotaRecord> {
    let Some(tax_id) = tax_id else {
        return Vec::new();
    };
    let mut series: Vec<QuotaRecord> = records
        .iter()
        .filter(|r| r.fund_tax_id == tax_id)
        .cloned()
        .collect();
    // Stable, so same-date rows keep their source order.
    series.sort_by_key(|r| r.date);
    series
}

/// Records of a date-sorted series that fall inside `range`.
pub fn filter_range(series: &[QuotaRecord], range: DateRange) -> &[QuotaRecord] {
    let start = series.partition_point(|r| r.date < range.start);
    let end = series.partition_point(|r| r.date <= range.end);
    if start >= end {
        return &[];
    }
    &series[start..end]
}

/// First and last dates of a non-empty, date-sorted series.
pub fn span(series: &[QuotaRecord]) -> Option<DateRange> {
    match (series.first(), series.last()) {
        (Some(first), Some(last)) => Some(DateRange::new(first.date, last.date)),
        _ => None,
    }
}
