use super::ui;
use crate::core::compare::{ChartOutcome, Comparison, ComparisonRequest, FundSummary, ReturnSeries};
use crate::core::fund::truncate_label;
use crate::core::returns::{SimulationOutcome, SimulationResult};
use crate::core::{Dataset, compare};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::{Attribute, Cell, Color};
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::info;

/// Runs one render pass and prints it.
pub fn run(
    dataset: &Dataset,
    request: &ComparisonRequest,
    points: usize,
    json: bool,
) -> Result<()> {
    info!("Comparing '{}' and '{}'", request.fund_a, request.fund_b);
    let comparison = compare(dataset, request);
    if json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        print!("{}", render(&comparison, request, points));
    }
    Ok(())
}

/// Renders the whole comparison as terminal text.
pub fn render(comparison: &Comparison, request: &ComparisonRequest, points: usize) -> String {
    let mut output = String::new();
    match comparison {
        Comparison::NoSelection => {
            let _ = writeln!(
                output,
                "{}",
                ui::style_text(
                    "Select two funds by commercial name or tax id.",
                    ui::StyleType::Subtle
                )
            );
        }
        Comparison::PartialSelection { fund } => {
            let _ = writeln!(
                output,
                "{}",
                ui::style_text(
                    &format!(
                        "Only '{}' was found. Select a second fund to compare.",
                        truncate_label(&fund.label)
                    ),
                    ui::StyleType::Warning
                )
            );
        }
        Comparison::Ready(comparison) => {
            output.push_str(&render_funds(&comparison.funds));
            output.push_str(&render_chart(&comparison.chart, request, points));
        }
    }
    output
}

fn render_funds(funds: &[FundSummary; 2]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(""),
        ui::header_cell(&truncate_label(&funds[0].label)),
        ui::header_cell(&truncate_label(&funds[1].label)),
    ]);

    let rows: [(&str, fn(&FundSummary) -> String); 5] = [
        ("Tax ID", |f| f.tax_id.clone()),
        ("Shareholders", |f| {
            f.latest
                .shareholder_count
                .map_or_else(|| "-".to_string(), |count| count.to_string())
        }),
        ("Current Quota", |f| ui::format_quota(f.latest.quota_value)),
        ("Net Asset Value", |f| {
            f.latest
                .net_asset_value
                .map_or_else(|| "-".to_string(), |value| format!("R$ {value}"))
        }),
        ("Last Quote", |f| f.latest.date.to_string()),
    ];
    for (label, value) in rows {
        table.add_row(vec![
            Cell::new(label).add_attribute(Attribute::Bold),
            ui::value_cell(value(&funds[0])),
            ui::value_cell(value(&funds[1])),
        ]);
    }

    format!(
        "{}\n{table}\n",
        ui::style_text("Fund Information", ui::StyleType::Title)
    )
}

fn render_chart(chart: &ChartOutcome, request: &ComparisonRequest, points: usize) -> String {
    match chart {
        ChartOutcome::InvalidDateOrder => format!(
            "\n{}\n",
            ui::style_text(
                "The start date cannot be after the end date.",
                ui::StyleType::Error
            )
        ),
        ChartOutcome::InsufficientData => format!(
            "\n{}\n",
            ui::style_text(
                &format!(
                    "Not enough data between {} for one or both funds.",
                    request.range
                ),
                ui::StyleType::Warning
            )
        ),
        ChartOutcome::Ready { series, simulation } => {
            let mut output = render_returns(series, points);
            output.push_str(&render_simulation(simulation, series, request.amount));
            output
        }
    }
}

/// Evenly spaced indices into `len` items, always keeping the first and last.
pub fn sample_indices(len: usize, max_points: usize) -> Vec<usize> {
    let max_points = max_points.max(2);
    if len <= max_points {
        return (0..len).collect();
    }
    let mut indices: Vec<usize> = (0..max_points)
        .map(|i| i * (len - 1) / (max_points - 1))
        .collect();
    indices.dedup();
    indices
}

fn render_returns(series: &[ReturnSeries; 2], points: usize) -> String {
    let mut by_date: BTreeMap<NaiveDate, [Option<f64>; 2]> = BTreeMap::new();
    for (fund, s) in series.iter().enumerate() {
        for point in &s.points {
            by_date.entry(point.date).or_default()[fund] = Some(point.value);
        }
    }
    let rows: Vec<_> = by_date.into_iter().collect();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell(&truncate_label(&series[0].label)),
        ui::header_cell(&truncate_label(&series[1].label)),
    ]);
    for idx in sample_indices(rows.len(), points) {
        let (date, values) = &rows[idx];
        let mut cells = vec![Cell::new(date.to_string())];
        cells.extend(values.iter().map(|v| match v {
            Some(ratio) => ui::return_cell(*ratio),
            None => ui::value_cell("-").fg(Color::DarkGrey),
        }));
        table.add_row(cells);
    }

    format!(
        "\n{}\n{table}\n",
        ui::style_text("Cumulative Return", ui::StyleType::Title)
    )
}

fn result_cell(result: &SimulationResult) -> Cell {
    let cell = ui::value_cell(format!("{:.2}%", result.projection.return_pct));
    if result.leading {
        cell.fg(Color::Green).add_attribute(Attribute::Bold)
    } else {
        cell
    }
}

fn render_simulation(
    simulation: &SimulationOutcome,
    series: &[ReturnSeries; 2],
    amount: f64,
) -> String {
    let title = format!(
        "\n{} ({} invested)\n",
        ui::style_text("Investment Simulation", ui::StyleType::Title),
        ui::format_money(amount)
    );
    let body = match simulation {
        SimulationOutcome::NoCommonPeriod => ui::style_text(
            "There is no common date range between the selected funds to simulate an investment.",
            ui::StyleType::Error,
        ),
        SimulationOutcome::OutOfRange {
            common,
            application_date,
        } => ui::style_text(
            &format!(
                "The application date {application_date} is outside the range \
                 available for both funds ({common})."
            ),
            ui::StyleType::Warning,
        ),
        SimulationOutcome::NoQuote {
            fund,
            application_date,
        } => ui::style_text(
            &format!(
                "Could not find a quota for '{}' on or after {application_date}.",
                series.get(*fund).map_or("", |s| s.label.as_str())
            ),
            ui::StyleType::Error,
        ),
        SimulationOutcome::Ready {
            common,
            application_date,
            results,
        } => {
            let mut table = ui::new_styled_table();
            table.set_header(vec![
                ui::header_cell(""),
                ui::header_cell(&truncate_label(&series[0].label)),
                ui::header_cell(&truncate_label(&series[1].label)),
            ]);
            let rows: [(&str, fn(&SimulationResult) -> String); 3] = [
                ("Starting Quota", |r| ui::format_quota(r.projection.starting_quota)),
                ("Ending Quota", |r| ui::format_quota(r.projection.ending_quota)),
                ("Final Value", |r| ui::format_money(r.projection.final_value)),
            ];
            for (label, value) in rows {
                table.add_row(vec![
                    Cell::new(label).add_attribute(Attribute::Bold),
                    ui::value_cell(value(&results[0])),
                    ui::value_cell(value(&results[1])),
                ]);
            }
            table.add_row(vec![
                Cell::new("Return").add_attribute(Attribute::Bold),
                result_cell(&results[0]),
                result_cell(&results[1]),
            ]);
            let mut body = format!(
                "{}\n{table}",
                ui::style_text(
                    &format!("Applied on {application_date}, common period {common}"),
                    ui::StyleType::Subtle
                )
            );
            if let Some(idx) = results.iter().position(|r| r.leading) {
                let _ = write!(
                    body,
                    "\n{}",
                    ui::style_text(
                        &format!("{} had the higher return.", truncate_label(&series[idx].label)),
                        ui::StyleType::Leading
                    )
                );
            }
            body
        }
    };
    format!("{title}{body}\n")
}
