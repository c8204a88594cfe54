//! The two read-only tables every comparison runs against, how they are
//! parsed, and the process-wide handle that loads them once.
use crate::core::config::SourcesConfig;
use crate::core::fund::{FundCatalog, FundReference, QuotaRecord};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

const QUOTA_COLUMNS: [&str; 5] = [
    "CNPJ_FUNDO",
    "DT_COMPTC",
    "VL_QUOTA",
    "NR_COTST",
    "VL_PATRIM_LIQ",
];
const INFO_COLUMNS: [&str; 2] = ["Nome Comercial", "CNPJ da Classe"];

/// Fetches the raw bytes of a resource.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>>;
}

/// Quota table plus fund catalog.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub quotas: Vec<QuotaRecord>,
    pub catalog: FundCatalog,
}

impl Dataset {
    /// Fetches both resources concurrently and parses them.
    pub async fn load(sources: &SourcesConfig, source: &dyn DataSource) -> Result<Self> {
        info!("Loading fund data...");
        let (quotas, info) = futures::future::try_join(
            source.fetch(&sources.quotas),
            source.fetch(&sources.info),
        )
        .await?;

        let delimiter = u8::try_from(sources.delimiter)
            .map_err(|_| anyhow!("CSV delimiter must be a single byte: {:?}", sources.delimiter))?;
        let dataset = Dataset {
            quotas: parse_quotas(&quotas, delimiter)
                .with_context(|| format!("Failed to parse quotas from {}", sources.quotas))?,
            catalog: parse_catalog(&info, delimiter)
                .with_context(|| format!("Failed to parse fund info from {}", sources.info))?,
        };
        info!(
            "Loaded {} quota records and {} funds",
            dataset.quotas.len(),
            dataset.catalog.len()
        );
        Ok(dataset)
    }
}

#[derive(Debug, Deserialize)]
struct QuotaRow {
    #[serde(rename = "CNPJ_FUNDO")]
    fund_tax_id: String,
    #[serde(rename = "DT_COMPTC")]
    date: String,
    #[serde(rename = "VL_QUOTA")]
    quota_value: f64,
    #[serde(rename = "NR_COTST", deserialize_with = "csv::invalid_option")]
    shareholder_count: Option<f64>,
    #[serde(rename = "VL_PATRIM_LIQ", deserialize_with = "csv::invalid_option")]
    net_asset_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct InfoRow {
    #[serde(rename = "Nome Comercial")]
    commercial_name: Option<String>,
    #[serde(rename = "CNPJ da Classe")]
    tax_id: Option<String>,
}

fn require_columns(headers: &StringRecord, required: &[&str]) -> Result<()> {
    let missing: Vec<_> = required
        .iter()
        .filter(|column| !headers.iter().any(|h| h.trim() == **column))
        .collect();
    if !missing.is_empty() {
        bail!("Missing required columns: {:?}", missing);
    }
    Ok(())
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(value: &str) -> Result<NaiveDate> {
    let date = value.trim().split([' ', 'T']).next().unwrap_or_default();
    NaiveDate::parse_from_str(date, "%Y-%m-%d").with_context(|| format!("Invalid date '{value}'"))
}

fn to_record(row: QuotaRow) -> Result<QuotaRecord> {
    let date = parse_date(&row.date)?;
    Ok(QuotaRecord {
        fund_tax_id: row.fund_tax_id,
        date,
        quota_value: row.quota_value,
        shareholder_count: row
            .shareholder_count
            .filter(|count| count.is_finite() && *count >= 0.0)
            .map(|count| count as u64),
        net_asset_value: row.net_asset_value.filter(|value| value.is_finite()),
    })
}

/// Parses the daily quota table. Malformed rows are skipped.
pub fn parse_quotas(bytes: &[u8], delimiter: u8) -> Result<Vec<QuotaRecord>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);
    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();
    debug!("Quota headers: {:?}", headers);
    require_columns(&headers, &QUOTA_COLUMNS)?;

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<QuotaRow>().enumerate() {
        match row.map_err(anyhow::Error::from).and_then(to_record) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping quota row {}: {}", idx + 2, e),
        }
    }
    Ok(records)
}

/// Parses the fund reference table into a catalog, dropping rows with a
/// missing name or tax id.
pub fn parse_catalog(bytes: &[u8], delimiter: u8) -> Result<FundCatalog> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);
    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();
    debug!("Info headers: {:?}", headers);
    require_columns(&headers, &INFO_COLUMNS)?;

    let mut references = Vec::new();
    for (idx, row) in reader.deserialize::<InfoRow>().enumerate() {
        match row {
            Ok(InfoRow {
                commercial_name: Some(commercial_name),
                tax_id: Some(tax_id),
            }) => references.push(FundReference {
                commercial_name,
                tax_id,
            }),
            Ok(_) => debug!("Dropping info row {} with missing values", idx + 2),
            Err(e) => warn!("Skipping info row {}: {}", idx + 2, e),
        }
    }
    Ok(FundCatalog::new(references))
}

/// Lazily initialized, read-only dataset shared by every render pass.
///
/// The first `get_or_load` runs the loader; concurrent callers wait for it
/// and every later call returns the same `Arc`. A failed load leaves the
/// handle empty, so the next call tries again.
pub struct SharedDataset {
    cell: OnceCell<Arc<Dataset>>,
}

impl SharedDataset {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    pub async fn get_or_load<F, Fut>(&self, loader: F) -> Result<Arc<Dataset>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Dataset>>,
    {
        self.cell
            .get_or_try_init(|| async { loader().await.map(Arc::new) })
            .await
            .map(Arc::clone)
    }

    pub fn get(&self) -> Option<Arc<Dataset>> {
        self.cell.get().cloned()
    }
}

impl Default for SharedDataset {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const QUOTAS_CSV: &str = "\
TP_FUNDO,CNPJ_FUNDO,DT_COMPTC,VL_TOTAL,VL_QUOTA,VL_PATRIM_LIQ,CAPTC_DIA,RESG_DIA,NR_COTST
FI,11.111.111/0001-11,2024-01-02,1.0,100.5,2500000.75,0,0,120
FI,11.111.111/0001-11,2024-01-03 00:00:00,1.0,101.0,2510000.0,0,0,121.0
FI,22.222.222/0001-22,not-a-date,1.0,10.0,1.0,0,0,5
FI,22.222.222/0001-22,2024-01-03,1.0,,1.0,0,0,5
FI,33.333.333/0001-33,2024-01-04,1.0,50.0,,0,0,
FI,33.333.333/0001-33,2024-01-05,1.0,51.0,n/a,0,0,-3
";

    const INFO_CSV: &str = "\
Nome Comercial,CNPJ da Classe,Gestor
Alpha FIA,11.111.111/0001-11,Gestora A
Alpha FIA,99.999.999/0001-99,Gestora B
,22.222.222/0001-22,Gestora C
Beta RF,,Gestora D
";

    struct StaticSource {
        files: HashMap<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    impl StaticSource {
        fn new() -> Self {
            Self {
                files: HashMap::from([("quotas.csv", QUOTAS_CSV), ("info.csv", INFO_CSV)]),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DataSource for StaticSource {
        async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.files
                .get(location)
                .map(|s| s.as_bytes().to_vec())
                .ok_or_else(|| anyhow!("not found: {location}"))
        }
    }

    fn sources() -> SourcesConfig {
        SourcesConfig {
            quotas: "quotas.csv".to_string(),
            info: "info.csv".to_string(),
            delimiter: ',',
        }
    }

    #[test]
    fn test_parse_quotas_skips_bad_rows() {
        let records = parse_quotas(QUOTAS_CSV.as_bytes(), b',').unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].fund_tax_id, "11.111.111/0001-11");
        assert_eq!(records[0].date.to_string(), "2024-01-02");
        assert_eq!(records[0].quota_value, 100.5);
        assert_eq!(records[0].net_asset_value, Some(2500000.75));
        assert_eq!(records[1].date.to_string(), "2024-01-03");
        assert_eq!(records[1].shareholder_count, Some(121));
    }

    #[test]
    fn test_parse_quotas_keeps_rows_with_blank_metrics() {
        let records = parse_quotas(QUOTAS_CSV.as_bytes(), b',').unwrap();
        let gamma: Vec<_> = records
            .iter()
            .filter(|r| r.fund_tax_id == "33.333.333/0001-33")
            .collect();

        assert_eq!(gamma.len(), 2);
        assert_eq!(gamma[0].quota_value, 50.0);
        assert_eq!(gamma[0].shareholder_count, None);
        assert_eq!(gamma[0].net_asset_value, None);
        assert_eq!(gamma[1].quota_value, 51.0);
        assert_eq!(gamma[1].shareholder_count, None);
        assert_eq!(gamma[1].net_asset_value, None);
    }

    #[test]
    fn test_parse_quotas_requires_columns() {
        let err = parse_quotas(b"CNPJ_FUNDO,DT_COMPTC\nx,2024-01-01\n", b',').unwrap_err();
        assert!(err.to_string().contains("VL_QUOTA"));
    }

    #[test]
    fn test_parse_quotas_with_semicolon() {
        let csv = "CNPJ_FUNDO;DT_COMPTC;VL_QUOTA;NR_COTST;VL_PATRIM_LIQ\nA;2024-01-01;1.5;3;10.0\n";
        let records = parse_quotas(csv.as_bytes(), b';').unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quota_value, 1.5);
    }

    #[test]
    fn test_parse_catalog_drops_missing_and_duplicates() {
        let catalog = parse_catalog(INFO_CSV.as_bytes(), b',').unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.tax_id_for("Alpha FIA"), Some("11.111.111/0001-11"));
        assert!(catalog.tax_id_for("Beta RF").is_none());
    }

    #[tokio::test]
    async fn test_dataset_load() {
        let source = StaticSource::new();
        let dataset = Dataset::load(&sources(), &source).await.unwrap();

        assert_eq!(dataset.quotas.len(), 4);
        assert_eq!(dataset.catalog.len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dataset_load_missing_resource() {
        let source = StaticSource::new();
        let mut sources = sources();
        sources.info = "missing.csv".to_string();

        let err = Dataset::load(&sources, &source).await.unwrap_err();
        assert!(err.to_string().contains("not found: missing.csv"));
    }

    #[tokio::test]
    async fn test_shared_dataset_loads_once() {
        let shared = SharedDataset::new();
        let source = StaticSource::new();
        let sources = sources();
        assert!(shared.get().is_none());

        let first = shared
            .get_or_load(|| Dataset::load(&sources, &source))
            .await
            .unwrap();
        let second = shared
            .get_or_load(|| Dataset::load(&sources, &source))
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(shared.get().is_some());
    }

    #[tokio::test]
    async fn test_shared_dataset_retries_after_failure() {
        let shared = SharedDataset::new();

        let failed = shared
            .get_or_load(|| async { Err(anyhow!("network down")) })
            .await;
        assert!(failed.is_err());
        assert!(shared.get().is_none());

        let loaded = shared
            .get_or_load(|| async { Ok(Dataset::default()) })
            .await;
        assert!(loaded.is_ok());
    }
}
