//! The comparison pipeline: raw inputs to resolved funds to filtered series
//! to derived metrics. Every call recomputes from scratch.
use crate::core::dataset::Dataset;
use crate::core::fund::QuotaRecord;
use crate::core::resolver::resolve_input;
use crate::core::returns::{ReturnPoint, SimulationOutcome, cumulative_returns, simulate};
use crate::core::series::{DateRange, extract_series, filter_range};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

/// Raw user inputs of one interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRequest {
    pub fund_a: String,
    pub fund_b: String,
    pub range: DateRange,
    pub amount: f64,
    pub application_date: Option<NaiveDate>,
}

/// A resolved fund and its latest quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundSummary {
    /// Text shown for the fund: the user's input, or the catalog name when
    /// the fund was picked by tax id.
    pub label: String,
    pub tax_id: String,
    pub latest: QuotaRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSeries {
    pub label: String,
    pub points: Vec<ReturnPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartOutcome {
    /// Start date is after end date.
    InvalidDateOrder,
    /// One or both funds have no quotes in the selected range, or the first
    /// one is not a positive quota.
    InsufficientData,
    Ready {
        series: [ReturnSeries; 2],
        simulation: SimulationOutcome,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundComparison {
    pub funds: [FundSummary; 2],
    pub chart: ChartOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Comparison {
    NoSelection,
    PartialSelection { fund: FundSummary },
    Ready(Box<FundComparison>),
}

struct Selection {
    summary: FundSummary,
    series: Vec<QuotaRecord>,
}

fn select(input: &str, dataset: &Dataset) -> Option<Selection> {
    let tax_id = resolve_input(input, &dataset.catalog)?;
    let series = extract_series(Some(&tax_id), &dataset.quotas);
    let latest = series.last()?.clone();
    let label = if input.contains(&tax_id) {
        dataset
            .catalog
            .name_for(&tax_id)
            .map_or_else(|| input.trim().to_string(), str::to_string)
    } else {
        input.trim().to_string()
    };
    Some(Selection {
        summary: FundSummary {
            label,
            tax_id,
            latest,
        },
        series,
    })
}

/// Runs the full pipeline for one set of inputs.
pub fn compare(dataset: &Dataset, request: &ComparisonRequest) -> Comparison {
    let first = select(&request.fund_a, dataset);
    let second = select(&request.fund_b, dataset);

    let (first, second) = match (first, second) {
        (None, None) => return Comparison::NoSelection,
        (Some(fund), None) | (None, Some(fund)) => {
            return Comparison::PartialSelection { fund: fund.summary };
        }
        (Some(a), Some(b)) => (a, b),
    };

    let chart = chart(&first, &second, request);
    Comparison::Ready(Box::new(FundComparison {
        funds: [first.summary, second.summary],
        chart,
    }))
}

fn chart(first: &Selection, second: &Selection, request: &ComparisonRequest) -> ChartOutcome {
    if !request.range.is_ordered() {
        return ChartOutcome::InvalidDateOrder;
    }

    let a = filter_range(&first.series, request.range);
    let b = filter_range(&second.series, request.range);
    debug!(
        "Range {} keeps {} and {} records",
        request.range,
        a.len(),
        b.len()
    );

    let (Some(points_a), Some(points_b)) = (cumulative_returns(a), cumulative_returns(b)) else {
        return ChartOutcome::InsufficientData;
    };

    ChartOutcome::Ready {
        series: [
            ReturnSeries {
                label: first.summary.label.clone(),
                points: points_a,
            },
            ReturnSeries {
                label: second.summary.label.clone(),
                points: points_b,
            },
        ],
        simulation: simulate(request.amount, request.application_date, a, b),
    }
}
