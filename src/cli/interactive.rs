//! Prompt loop that re-runs the whole comparison after every edit.
use super::input::{InputBounds, parse_amount, parse_date};
use super::{compare, funds, ui};
use crate::core::compare::ComparisonRequest;
use crate::core::series::DateRange;
use crate::core::{Dataset, compare as run_pipeline};
use anyhow::{Result, anyhow, bail};
use chrono::NaiveDate;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

const HELP: &str = "\
Commands:
  a <name or tax id>     select the first fund
  b <name or tax id>     select the second fund
  start <YYYY-MM-DD>     analysis start date
  end <YYYY-MM-DD>       analysis end date
  amount <value>         amount to simulate
  date <YYYY-MM-DD|auto> application date (auto = start of common period)
  points <n>             rows in the cumulative return table
  funds [filter]         list selectable funds
  json                   print the current comparison as JSON
  help                   show this message
  quit                   exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    FundA(String),
    FundB(String),
    Start(NaiveDate),
    End(NaiveDate),
    Amount(f64),
    ApplicationDate(Option<NaiveDate>),
    Points(usize),
    Funds(Option<String>),
    Json,
    Help,
    Quit,
}

pub fn parse_edit(line: &str) -> Result<Edit> {
    let line = line.trim();
    let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
    let arg = arg.trim();

    let edit = match command.to_lowercase().as_str() {
        "a" => Edit::FundA(arg.to_string()),
        "b" => Edit::FundB(arg.to_string()),
        "start" => Edit::Start(parse_date(arg)?),
        "end" => Edit::End(parse_date(arg)?),
        "amount" => Edit::Amount(parse_amount(arg)?),
        "date" if arg.eq_ignore_ascii_case("auto") => Edit::ApplicationDate(None),
        "date" => Edit::ApplicationDate(Some(parse_date(arg)?)),
        "points" => Edit::Points(
            arg.parse()
                .map_err(|_| anyhow!("Invalid number of points '{arg}'"))?,
        ),
        "funds" => Edit::Funds((!arg.is_empty()).then(|| arg.to_string())),
        "json" => Edit::Json,
        "help" | "?" => Edit::Help,
        "quit" | "q" | "exit" => Edit::Quit,
        other => bail!("Unknown command '{other}'. Type 'help' for the list of commands."),
    };
    Ok(edit)
}

/// Raw inputs kept between edits. Nothing derived is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub request: ComparisonRequest,
    pub points: usize,
    bounds: InputBounds,
}

impl Session {
    pub fn new(bounds: InputBounds, amount: f64, points: usize) -> Self {
        Self {
            request: ComparisonRequest {
                fund_a: String::new(),
                fund_b: String::new(),
                range: DateRange::new(bounds.first_date, bounds.last_date),
                amount,
                application_date: None,
            },
            points,
            bounds,
        }
    }

    /// Applies an input edit. Returns whether the comparison should be re-rendered.
    pub fn apply(&mut self, edit: Edit) -> Result<bool> {
        match edit {
            Edit::FundA(fund) => self.request.fund_a = fund,
            Edit::FundB(fund) => self.request.fund_b = fund,
            Edit::Start(date) => self.request.range.start = self.bounds.check_date(date)?,
            Edit::End(date) => self.request.range.end = self.bounds.check_date(date)?,
            Edit::Amount(amount) => self.request.amount = self.bounds.check_amount(amount)?,
            Edit::ApplicationDate(date) => {
                self.request.application_date =
                    date.map(|d| self.bounds.check_date(d)).transpose()?;
            }
            Edit::Points(points) => self.points = points.max(2),
            Edit::Funds(_) | Edit::Json | Edit::Help | Edit::Quit => return Ok(false),
        }
        Ok(true)
    }
}

fn prompt() -> Result<()> {
    print!("{} ", ui::style_text("fundcmp>", ui::StyleType::Subtle));
    std::io::stdout().flush()?;
    Ok(())
}

/// Reads edits from `reader` until `quit` or end of input.
pub async fn run<R>(dataset: &Dataset, mut session: Session, reader: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    println!("{HELP}\n");
    let mut lines = reader.lines();
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            prompt()?;
            continue;
        }

        let edit = match parse_edit(&line) {
            Ok(edit) => edit,
            Err(e) => {
                println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
                prompt()?;
                continue;
            }
        };
        debug!("Applying {:?}", edit);

        match &edit {
            Edit::Quit => break,
            Edit::Help => println!("{HELP}"),
            Edit::Funds(filter) => funds::run(&dataset.catalog, filter.as_deref()),
            Edit::Json => {
                let comparison = run_pipeline(dataset, &session.request);
                println!("{}", serde_json::to_string_pretty(&comparison)?);
            }
            _ => {}
        }

        match session.apply(edit) {
            Ok(true) => {
                ui::print_separator();
                compare::run(dataset, &session.request, session.points, false)?;
            }
            Ok(false) => {}
            Err(e) => println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error)),
        }
        prompt()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AppConfig;

    fn session() -> Session {
        Session::new(InputBounds::from(&AppConfig::default()), 1000.0, 12)
    }

    #[test]
    fn test_parse_edits() {
        assert_eq!(
            parse_edit("a Alpha FIA | 11.111.111/0001-11").unwrap(),
            Edit::FundA("Alpha FIA | 11.111.111/0001-11".to_string())
        );
        assert_eq!(
            parse_edit("START 2020-01-01").unwrap(),
            Edit::Start(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
        );
        assert_eq!(parse_edit("date auto").unwrap(), Edit::ApplicationDate(None));
        assert_eq!(parse_edit("amount 2500").unwrap(), Edit::Amount(2500.0));
        assert_eq!(parse_edit("funds").unwrap(), Edit::Funds(None));
        assert_eq!(parse_edit("q").unwrap(), Edit::Quit);
        assert!(parse_edit("start yesterday").is_err());
        assert!(parse_edit("dance").is_err());
    }

    #[test]
    fn test_apply_validates_bounds() {
        let mut session = session();

        assert!(session.apply(parse_edit("amount 50").unwrap()).is_err());
        assert_eq!(session.request.amount, 1000.0);

        assert!(session.apply(parse_edit("start 2010-01-01").unwrap()).is_err());
        assert!(session.apply(parse_edit("start 2020-01-01").unwrap()).unwrap());
        assert_eq!(
            session.request.range.start,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_apply_keeps_unordered_range_for_pipeline() {
        let mut session = session();
        session.apply(parse_edit("start 2024-01-01").unwrap()).unwrap();
        session.apply(parse_edit("end 2023-01-01").unwrap()).unwrap();
        assert!(!session.request.range.is_ordered());
    }

    #[test]
    fn test_non_input_commands_do_not_rerender() {
        let mut session = session();
        assert!(!session.apply(Edit::Help).unwrap());
        assert!(!session.apply(Edit::Funds(None)).unwrap());
        assert!(session.apply(Edit::FundA("x".to_string())).unwrap());
    }

    #[tokio::test]
    async fn test_run_stops_at_end_of_input() {
        let input: &[u8] = b"a Alpha\nbogus\n\nquit\nb never reached\n";
        let result = run(&Dataset::default(), session(), input).await;
        assert!(result.is_ok());
    }
}
