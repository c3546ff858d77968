//! Raw CSV loading for one reporting period
//! Folder layout: <raw_data_dir>/<YYYY-MM>/*.csv, optional manifest.json
//! mapping dataset keys to file names when a month's exports are named oddly.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::config::Period;
use crate::etl::clean;
use crate::etl::Datasets;

const MANIFEST_FILENAME: &str = "manifest.json";

/// A CSV file read as strings, header-addressed.
/// Header matching is fuzzy on purpose: bank exports carry bilingual column
/// names like "Phát sinh có (Credit Amount)".
#[derive(Debug, Clone)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("failed to open CSV {}", path.display()))?;
        let headers = reader
            .headers()
            .context("failed to read CSV headers")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect::<Vec<_>>();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("failed to read CSV record")?;
            let mut row: Vec<String> = record.iter().map(|v| v.to_string()).collect();
            // Pad short records so column indexing stays safe.
            while row.len() < headers.len() {
                row.push(String::new());
            }
            rows.push(row);
        }
        Ok(RawTable { headers, rows })
    }

    #[cfg(test)]
    pub fn from_parts(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        RawTable { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact header match, case-insensitive.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }

    /// First header whose lowercase form contains the needle.
    pub fn column_containing(&self, needle: &str) -> Option<usize> {
        let needle = needle.to_lowercase();
        self.headers
            .iter()
            .position(|h| h.to_lowercase().contains(&needle))
    }

    /// Cell value with the export's missing-value markers normalized away.
    pub fn value<'a>(&self, row: &'a [String], idx: Option<usize>) -> Option<&'a str> {
        let raw = row.get(idx?)?.trim();
        if raw.is_empty() || raw == "--" || raw.eq_ignore_ascii_case("n/a") {
            None
        } else {
            Some(raw)
        }
    }
}

/// Loads and cleans every dataset present in a period folder.
pub struct CsvLoader {
    period: Period,
    period_dir: PathBuf,
}

impl CsvLoader {
    pub fn new(raw_data_dir: &Path, period: Period) -> Result<Self> {
        let period_dir = raw_data_dir.join(period.to_string());
        if !period_dir.is_dir() {
            anyhow::bail!("data folder not found: {}", period_dir.display());
        }
        info!("CSV loader initialized for period {period}");
        Ok(CsvLoader { period, period_dir })
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn list_available_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        if let Ok(entries) = fs::read_dir(&self.period_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|e| e == "csv") {
                    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                        files.push(name.to_string());
                    }
                }
            }
        }
        files.sort();
        files
    }

    fn read_manifest(&self) -> HashMap<String, String> {
        let path = self.period_dir.join(MANIFEST_FILENAME);
        let Ok(text) = fs::read_to_string(&path) else {
            return HashMap::new();
        };
        match serde_json::from_str(&text) {
            Ok(map) => map,
            Err(e) => {
                warn!("ignoring malformed {MANIFEST_FILENAME}: {e}");
                HashMap::new()
            }
        }
    }

    /// Dataset key for a raw file name, by the Etsy export naming conventions.
    pub fn dataset_kind(filename: &str) -> Option<&'static str> {
        if filename == "EtsyListingsDownload.csv" {
            Some("listing")
        } else if filename.starts_with("EtsySoldOrderItems") {
            Some("sold_order_items")
        } else if filename.starts_with("EtsySoldOrders") {
            Some("sold_orders")
        } else if filename.starts_with("etsy_statement_") {
            Some("statement")
        } else if filename.starts_with("EtsyDeposits") {
            Some("deposits")
        } else if filename.starts_with("EtsyDirectCheckoutPayments") {
            Some("direct_checkout")
        } else if filename.starts_with("bank_transactions") || filename.starts_with("fact_bank_transactions") {
            Some("bank_transactions")
        } else if filename.starts_with("product_catalog") {
            Some("product_catalog")
        } else {
            None
        }
    }

    fn table_for(&self, kind: &str, manifest: &HashMap<String, String>) -> Result<Option<RawTable>> {
        // Manifest wins; fall back to scanning the folder by naming pattern.
        let filename = manifest.get(kind).cloned().or_else(|| {
            self.list_available_files()
                .into_iter()
                .find(|f| Self::dataset_kind(f) == Some(kind))
        });
        let Some(filename) = filename else {
            return Ok(None);
        };
        let path = self.period_dir.join(&filename);
        if !path.exists() {
            warn!("{kind}: file {filename} listed but not found, skipping");
            return Ok(None);
        }
        let table = RawTable::from_path(&path)?;
        info!("loaded {} rows from {filename}", table.rows().len());
        Ok(Some(table))
    }

    /// Load and clean everything present in the folder.
    pub fn load_datasets(&self, exchange_rate: rust_decimal::Decimal) -> Result<Datasets> {
        let manifest = self.read_manifest();
        let mut datasets = Datasets::default();

        if let Some(t) = self.table_for("listing", &manifest)? {
            datasets.listing = Some(clean::clean_listing(&t));
        }
        if let Some(t) = self.table_for("sold_orders", &manifest)? {
            datasets.sold_orders = Some(clean::clean_sold_orders(&t));
        }
        if let Some(t) = self.table_for("sold_order_items", &manifest)? {
            datasets.sold_order_items = Some(clean::clean_sold_order_items(&t));
        }
        if let Some(t) = self.table_for("statement", &manifest)? {
            datasets.statement = Some(clean::clean_statement(&t, exchange_rate));
        }
        if let Some(t) = self.table_for("deposits", &manifest)? {
            datasets.deposits = Some(clean::clean_deposits(&t, exchange_rate));
        }
        if let Some(t) = self.table_for("direct_checkout", &manifest)? {
            datasets.direct_checkout = Some(clean::clean_direct_checkout(&t));
        }
        if let Some(t) = self.table_for("bank_transactions", &manifest)? {
            datasets.bank_transactions = Some(clean::clean_bank_transactions(&t));
        }
        if let Some(t) = self.table_for("product_catalog", &manifest)? {
            datasets.product_catalog = Some(clean::clean_product_catalog(&t));
        }

        Ok(datasets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut f = fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn dataset_kind_matches_etsy_naming() {
        assert_eq!(CsvLoader::dataset_kind("EtsyListingsDownload.csv"), Some("listing"));
        assert_eq!(CsvLoader::dataset_kind("EtsySoldOrders2025-1.csv"), Some("sold_orders"));
        assert_eq!(
            CsvLoader::dataset_kind("EtsySoldOrderItems2025-1.csv"),
            Some("sold_order_items")
        );
        assert_eq!(CsvLoader::dataset_kind("etsy_statement_2025_1.csv"), Some("statement"));
        assert_eq!(CsvLoader::dataset_kind("random.csv"), None);
    }

    #[test]
    fn missing_period_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let period: Period = "2025-01".parse().unwrap();
        assert!(CsvLoader::new(dir.path(), period).is_err());
    }

    #[test]
    fn loads_datasets_with_manifest_override() {
        let dir = tempfile::tempdir().unwrap();
        let period_dir = dir.path().join("2025-01");
        fs::create_dir(&period_dir).unwrap();
        write_file(
            &period_dir,
            "weird_name.csv",
            "Date,Type,Title,Info,Currency,Amount,Fees & Taxes,Net\n\
             \"January 5, 2025\",Sale,Order,Order #101,USD,12.50,--,12.50\n",
        );
        write_file(
            &period_dir,
            "manifest.json",
            r#"{"statement": "weird_name.csv"}"#,
        );

        let period: Period = "2025-01".parse().unwrap();
        let loader = CsvLoader::new(dir.path(), period).unwrap();
        let datasets = loader
            .load_datasets(rust_decimal::Decimal::new(24708655, 3))
            .unwrap();
        let statement = datasets.statement.unwrap();
        assert_eq!(statement.len(), 1);
        assert_eq!(statement[0].extracted_id.as_deref(), Some("101"));
    }

    #[test]
    fn raw_table_normalizes_missing_markers() {
        let table = RawTable::from_parts(
            vec!["A".into(), "B".into()],
            vec![vec!["--".into(), "x".into()]],
        );
        let row = &table.rows()[0];
        assert_eq!(table.value(row, table.column("A")), None);
        assert_eq!(table.value(row, table.column("b")), Some("x"));
    }
}
