use crate::core::config::AppConfig;
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;

/// Limits applied to user supplied dates and amounts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputBounds {
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub min_amount: f64,
}

impl From<&AppConfig> for InputBounds {
    fn from(config: &AppConfig) -> Self {
        InputBounds {
            first_date: config.window.start,
            last_date: config.window.end,
            min_amount: config.simulation.min_amount,
        }
    }
}

impl InputBounds {
    pub fn check_date(&self, date: NaiveDate) -> Result<NaiveDate> {
        if date < self.first_date || date > self.last_date {
            bail!(
                "Date {date} must be between {} and {}",
                self.first_date,
                self.last_date
            );
        }
        Ok(date)
    }

    pub fn check_amount(&self, amount: f64) -> Result<f64> {
        if !amount.is_finite() || amount < self.min_amount {
            bail!("Amount must be at least {:.2}", self.min_amount);
        }
        Ok(amount)
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value.trim()))
}

pub fn parse_amount(value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid amount '{}'", value.trim()))
}
