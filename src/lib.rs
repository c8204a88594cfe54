pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::input::InputBounds;
use crate::core::cache::Store;
use crate::core::config::AppConfig;
use crate::core::{ComparisonRequest, DateRange, Dataset, SharedDataset};
use crate::providers::CsvSource;
use crate::store::KeyValueStore;
use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

/// Quota history and fund registry, loaded once per process.
static DATASET: SharedDataset = SharedDataset::new();

pub const DEFAULT_POINTS: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct CompareArgs {
    pub fund_a: String,
    pub fund_b: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub application_date: Option<NaiveDate>,
    pub points: usize,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Funds { filter: Option<String> },
    Compare(CompareArgs),
    Interactive,
}

impl CompareArgs {
    /// Validates the raw arguments and fills unset values from `config`.
    pub fn to_request(&self, config: &AppConfig) -> Result<ComparisonRequest> {
        let bounds = InputBounds::from(config);
        let start = bounds.check_date(self.start.unwrap_or(config.window.start))?;
        let end = bounds.check_date(self.end.unwrap_or(config.window.end))?;
        let amount =
            bounds.check_amount(self.amount.unwrap_or(config.simulation.default_amount))?;
        let application_date = self
            .application_date
            .map(|d| bounds.check_date(d))
            .transpose()?;

        Ok(ComparisonRequest {
            fund_a: self.fund_a.clone(),
            fund_b: self.fund_b.clone(),
            range: DateRange::new(start, end),
            amount,
            application_date,
        })
    }
}

/// Returns the process-wide dataset, downloading it on first use.
pub async fn load_dataset(config: &AppConfig) -> Result<Arc<Dataset>> {
    DATASET
        .get_or_load(|| async move {
            let ttl = config.cache.ttl();
            let cache = match ttl {
                Some(_) => {
                    let data_path = config.default_data_path().ok();
                    let store = KeyValueStore::open(data_path.as_deref());
                    store.get_collection("downloads", store.is_persistent())
                }
                None => None,
            };
            let source = CsvSource::new(cache, ttl)?;

            let spinner = cli::ui::new_spinner("Loading fund data...");
            let result = Dataset::load(&config.sources, &source).await;
            spinner.finish_and_clear();

            result
        })
        .await
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fundcmp starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Funds { filter } => {
            let dataset = load_dataset(&config).await?;
            cli::funds::run(&dataset.catalog, filter.as_deref());
            Ok(())
        }
        AppCommand::Compare(args) => {
            let request = args.to_request(&config)?;
            let dataset = load_dataset(&config).await?;
            cli::compare::run(&dataset, &request, args.points, args.json)
        }
        AppCommand::Interactive => {
            let dataset = load_dataset(&config).await?;
            let session = cli::interactive::Session::new(
                InputBounds::from(&config),
                config.simulation.default_amount,
                DEFAULT_POINTS,
            );
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            cli::interactive::run(&dataset, session, stdin).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn args() -> CompareArgs {
        CompareArgs {
            fund_a: "a".to_string(),
            fund_b: "b".to_string(),
            start: None,
            end: None,
            amount: None,
            application_date: None,
            points: DEFAULT_POINTS,
            json: false,
        }
    }

    #[test]
    fn test_request_defaults_from_config() {
        let config = AppConfig::default();
        let request = args().to_request(&config).unwrap();

        assert_eq!(request.range.start, config.window.start);
        assert_eq!(request.range.end, config.window.end);
        assert_eq!(request.amount, 1000.0);
        assert_eq!(request.application_date, None);
    }

    #[test]
    fn test_request_rejects_out_of_window_inputs() {
        let config = AppConfig::default();

        let mut early = args();
        early.start = Some(date("2014-06-01"));
        assert!(early.to_request(&config).is_err());

        let mut small = args();
        small.amount = Some(10.0);
        assert!(small.to_request(&config).is_err());

        let mut late_application = args();
        late_application.application_date = Some(date("2030-01-01"));
        assert!(late_application.to_request(&config).is_err());
    }

    #[test]
    fn test_request_allows_reversed_range() {
        let mut reversed = args();
        reversed.start = Some(date("2024-01-01"));
        reversed.end = Some(date("2023-01-01"));
        let request = reversed.to_request(&AppConfig::default()).unwrap();
        assert!(!request.range.is_ordered());
    }
}
