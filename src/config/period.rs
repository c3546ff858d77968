//! Reporting periods (YYYY-MM) and the raw CSV file layout per period

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{Datelike, Utc};

/// A seller reporting period, one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Period { year, month })
        } else {
            None
        }
    }

    pub fn current() -> Self {
        let now = Utc::now();
        Period {
            year: now.year(),
            month: now.month(),
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Period {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Period {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Canonical raw file name per dataset kind, as Etsy exports them.
    pub fn data_files(&self) -> HashMap<&'static str, String> {
        let (y, m) = (self.year, self.month);
        HashMap::from([
            ("statement", format!("etsy_statement_{y}_{m}.csv")),
            ("deposits", format!("EtsyDeposits{y}-{m}.csv")),
            (
                "direct_checkout",
                format!("EtsyDirectCheckoutPayments{y}-{m}.csv"),
            ),
            ("listing", "EtsyListingsDownload.csv".to_string()),
            ("sold_order_items", format!("EtsySoldOrderItems{y}-{m}.csv")),
            ("sold_orders", format!("EtsySoldOrders{y}-{m}.csv")),
        ])
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' || !s[..4].chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("invalid period format: {s}"));
        }
        let year: i32 = s[..4].parse().map_err(|_| format!("invalid year in {s}"))?;
        let month: u32 = s[5..]
            .parse()
            .map_err(|_| format!("invalid month in {s}"))?;
        Period::new(year, month).ok_or_else(|| format!("month out of range in {s}"))
    }
}

/// Scan a raw data directory for period-named folders, sorted ascending.
pub fn scan_raw_periods(raw_dir: &Path) -> Vec<Period> {
    let mut periods = Vec::new();
    if let Ok(entries) = std::fs::read_dir(raw_dir) {
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if let Ok(period) = name.parse::<Period>() {
                    periods.push(period);
                }
            }
        }
    }
    periods.sort();
    periods
}

/// Latest period with raw data on disk, or the current month when none exist.
pub fn latest_available(raw_dir: &Path) -> Period {
    scan_raw_periods(raw_dir)
        .last()
        .copied()
        .unwrap_or_else(Period::current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_round_trip() {
        let period: Period = "2025-01".parse().unwrap();
        assert_eq!(period.year, 2025);
        assert_eq!(period.month, 1);
        assert_eq!(period.to_string(), "2025-01");
    }

    #[test]
    fn rejects_malformed_periods() {
        assert!("2025-13".parse::<Period>().is_err());
        assert!("2025-00".parse::<Period>().is_err());
        assert!("25-01".parse::<Period>().is_err());
        assert!("2025/01".parse::<Period>().is_err());
        assert!("abcd-01".parse::<Period>().is_err());
    }

    #[test]
    fn previous_wraps_over_year_boundary() {
        let jan: Period = "2025-01".parse().unwrap();
        assert_eq!(jan.previous().to_string(), "2024-12");
        let jun: Period = "2025-06".parse().unwrap();
        assert_eq!(jun.previous().to_string(), "2025-05");
    }

    #[test]
    fn data_files_follow_etsy_naming() {
        let period: Period = "2025-01".parse().unwrap();
        let files = period.data_files();
        assert_eq!(files["statement"], "etsy_statement_2025_1.csv");
        assert_eq!(files["deposits"], "EtsyDeposits2025-1.csv");
        assert_eq!(files["listing"], "EtsyListingsDownload.csv");
        assert_eq!(files["sold_orders"], "EtsySoldOrders2025-1.csv");
    }

    #[test]
    fn scan_ignores_non_period_folders() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("2024-12")).unwrap();
        std::fs::create_dir(dir.path().join("2025-01")).unwrap();
        std::fs::create_dir(dir.path().join("archive")).unwrap();
        let periods = scan_raw_periods(dir.path());
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[1].to_string(), "2025-01");
        assert_eq!(latest_available(dir.path()).to_string(), "2025-01");
    }
}
