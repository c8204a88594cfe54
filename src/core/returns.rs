//! Cumulative return series and the two-fund investment simulation.
use crate::core::fund::QuotaRecord;
use crate::core::series::{DateRange, span};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

/// Return of a fund on `date` relative to the first quote of the range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Normalizes a range-filtered series against its first quota.
///
/// Returns `None` for an empty series or a non-positive first quota, where
/// no baseline exists.
pub fn cumulative_returns(series: &[QuotaRecord]) -> Option<Vec<ReturnPoint>> {
    let base = series.first()?.quota_value;
    if !usable_quota(base) {
        debug!("Unusable baseline quota {}", base);
        return None;
    }
    Some(
        series
            .iter()
            .map(|r| ReturnPoint {
                date: r.date,
                value: r.quota_value / base - 1.0,
            })
            .collect(),
    )
}

fn usable_quota(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Outcome of investing `amount` in one fund on the application date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    pub starting_quota: f64,
    pub ending_quota: f64,
    pub final_value: f64,
    pub return_pct: f64,
}

/// Projects `amount` from the first quote on or after `application_date`
/// to the last quote of `series`. `None` when no such quote exists or its
/// quota cannot be divided by.
pub fn project_investment(
    amount: f64,
    application_date: NaiveDate,
    series: &[QuotaRecord],
) -> Option<Projection> {
    let start = series
        .iter()
        .find(|r| r.date >= application_date)
        .filter(|r| usable_quota(r.quota_value))?;
    let end = series.last()?;
    let final_value = amount * (end.quota_value / start.quota_value);
    Some(Projection {
        starting_quota: start.quota_value,
        ending_quota: end.quota_value,
        final_value,
        return_pct: (final_value / amount - 1.0) * 100.0,
    })
}

/// Dates in which both series have quotes, or `None` when they do not overlap.
pub fn common_period(first: &[QuotaRecord], second: &[QuotaRecord]) -> Option<DateRange> {
    let a = span(first)?;
    let b = span(second)?;
    let common = DateRange::new(a.start.max(b.start), a.end.min(b.end));
    common.is_ordered().then_some(common)
}

/// Per-fund result card of a feasible simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationResult {
    pub projection: Projection,
    /// Strictly better return than the other fund. Ties lead neither.
    pub leading: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SimulationOutcome {
    /// The two series share no dates.
    NoCommonPeriod,
    /// The application date is outside the common period.
    OutOfRange {
        common: DateRange,
        application_date: NaiveDate,
    },
    /// No quote on or after the application date for fund `fund` (0 or 1).
    NoQuote {
        fund: usize,
        application_date: NaiveDate,
    },
    Ready {
        common: DateRange,
        application_date: NaiveDate,
        results: [SimulationResult; 2],
    },
}

/// Simulates `amount` applied to both funds on the same date.
///
/// Both series must already be filtered to the analysis range. Without an
/// explicit application date the start of the common period is used.
pub fn simulate(
    amount: f64,
    application_date: Option<NaiveDate>,
    first: &[QuotaRecord],
    second: &[QuotaRecord],
) -> SimulationOutcome {
    let Some(common) = common_period(first, second) else {
        debug!("No common period between the selected funds");
        return SimulationOutcome::NoCommonPeriod;
    };

    let application_date = application_date.unwrap_or(common.start);
    if !common.contains(application_date) {
        debug!("Application date {} outside {}", application_date, common);
        return SimulationOutcome::OutOfRange {
            common,
            application_date,
        };
    }

    let Some(a) = project_investment(amount, application_date, first) else {
        return SimulationOutcome::NoQuote {
            fund: 0,
            application_date,
        };
    };
    let Some(b) = project_investment(amount, application_date, second) else {
        return SimulationOutcome::NoQuote {
            fund: 1,
            application_date,
        };
    };

    SimulationOutcome::Ready {
        common,
        application_date,
        results: [
            SimulationResult {
                projection: a,
                leading: a.return_pct > b.return_pct,
            },
            SimulationResult {
                projection: b,
                leading: b.return_pct > a.return_pct,
            },
        ],
    }
}
