//! Fund reference rows, daily quota records and the catalog built from them.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum length of a fund label shown in legends and result cards.
pub const LABEL_LIMIT: usize = 50;

/// A commercial name and the tax identifier (CNPJ) of the fund class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundReference {
    pub commercial_name: String,
    pub tax_id: String,
}

/// One daily quote of a fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaRecord {
    pub fund_tax_id: String,
    pub date: NaiveDate,
    pub quota_value: f64,
    /// Blank or unreadable in the source. The quote still counts for returns.
    pub shareholder_count: Option<u64>,
    pub net_asset_value: Option<f64>,
}

/// Reference rows with one entry per commercial name.
#[derive(Debug, Clone, Default)]
pub struct FundCatalog {
    references: Vec<FundReference>,
}

impl FundCatalog {
    /// Builds the catalog, keeping the first row seen for each commercial name.
    pub fn new(rows: impl IntoIterator<Item = FundReference>) -> Self {
        let mut seen = HashSet::new();
        let references = rows
            .into_iter()
            .filter(|r| seen.insert(r.commercial_name.clone()))
            .collect();
        Self { references }
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Exact, case-sensitive lookup by commercial name.
    pub fn tax_id_for(&self, commercial_name: &str) -> Option<&str> {
        self.references
            .iter()
            .find(|r| r.commercial_name == commercial_name)
            .map(|r| r.tax_id.as_str())
    }

    /// Reverse lookup used to label a fund that was selected by tax id.
    pub fn name_for(&self, tax_id: &str) -> Option<&str> {
        self.references
            .iter()
            .find(|r| r.tax_id == tax_id)
            .map(|r| r.commercial_name.as_str())
    }

    /// Selectable entries sorted by commercial name.
    pub fn options(&self) -> Vec<&FundReference> {
        let mut options: Vec<_> = self.references.iter().collect();
        options.sort_by(|a, b| a.commercial_name.cmp(&b.commercial_name));
        options
    }

    /// Sorted entries whose name or tax id contains `filter` (case-insensitive).
    pub fn search(&self, filter: &str) -> Vec<&FundReference> {
        let needle = filter.to_lowercase();
        self.options()
            .into_iter()
            .filter(|r| {
                r.commercial_name.to_lowercase().contains(&needle) || r.tax_id.contains(filter)
            })
            .collect()
    }
}

/// Shortens a label to `LABEL_LIMIT` characters, ending in "..." when cut.
pub fn truncate_label(label: &str) -> String {
    if label.chars().count() <= LABEL_LIMIT {
        label.to_string()
    } else {
        let head: String = label.chars().take(LABEL_LIMIT - 3).collect();
        format!("{head}...")
    }
}
