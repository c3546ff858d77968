//! Shared date and customer-type filters for report queries

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::Postgres;

/// New = exactly one distinct order, Return = more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CustomerType {
    #[default]
    All,
    New,
    Return,
}

impl FromStr for CustomerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" | "" => Ok(CustomerType::All),
            "new" => Ok(CustomerType::New),
            "return" => Ok(CustomerType::Return),
            other => Err(format!("unknown customer type: {other}")),
        }
    }
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CustomerType::All => "all",
            CustomerType::New => "new",
            CustomerType::Return => "return",
        };
        f.write_str(s)
    }
}

/// Standard report filter: inclusive date range over dim_time plus the
/// customer-type subquery over fact_sales.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub customer_type: CustomerType,
}

impl ReportFilter {
    pub fn dates(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        ReportFilter {
            start_date,
            end_date,
            customer_type: CustomerType::All,
        }
    }

    /// SQL fragment appended after `WHERE 1=1`. `bind_idx` advances past the
    /// date placeholders; the customer filter binds nothing.
    pub fn sql_clause(&self, table_alias: &str, date_column: &str, bind_idx: &mut usize) -> String {
        let mut clause = String::new();
        if self.start_date.is_some() {
            clause.push_str(&format!(" AND {date_column} >= ${bind_idx}"));
            *bind_idx += 1;
        }
        if self.end_date.is_some() {
            clause.push_str(&format!(" AND {date_column} <= ${bind_idx}"));
            *bind_idx += 1;
        }
        let condition = match self.customer_type {
            CustomerType::All => return clause,
            CustomerType::New => "= 1",
            CustomerType::Return => "> 1",
        };
        clause.push_str(&format!(
            " AND {table_alias}.customer_key IN (SELECT customer_key FROM fact_sales \
             GROUP BY customer_key HAVING COUNT(DISTINCT order_key) {condition})"
        ));
        clause
    }

    /// Bind the date params in the same order `sql_clause` emitted them.
    pub fn bind_dates<'q, T>(
        &self,
        mut query: QueryAs<'q, Postgres, T, PgArguments>,
    ) -> QueryAs<'q, Postgres, T, PgArguments> {
        if let Some(start) = self.start_date {
            query = query.bind(start);
        }
        if let Some(end) = self.end_date {
            query = query.bind(end);
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> Option<NaiveDate> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn no_filters_emit_nothing() {
        let filter = ReportFilter::default();
        let mut idx = 1;
        assert_eq!(filter.sql_clause("fs", "dt.full_date", &mut idx), "");
        assert_eq!(idx, 1);
    }

    #[test]
    fn date_filters_bind_in_order() {
        let filter = ReportFilter::dates(date("2025-01-01"), date("2025-01-31"));
        let mut idx = 1;
        let clause = filter.sql_clause("fs", "dt.full_date", &mut idx);
        assert_eq!(clause, " AND dt.full_date >= $1 AND dt.full_date <= $2");
        assert_eq!(idx, 3);
    }

    #[test]
    fn end_date_alone_takes_first_placeholder() {
        let filter = ReportFilter::dates(None, date("2025-01-31"));
        let mut idx = 1;
        let clause = filter.sql_clause("fs", "dt.full_date", &mut idx);
        assert_eq!(clause, " AND dt.full_date <= $1");
        assert_eq!(idx, 2);
    }

    #[test]
    fn customer_type_adds_distinct_order_subquery() {
        let filter = ReportFilter {
            customer_type: CustomerType::New,
            ..Default::default()
        };
        let mut idx = 1;
        let clause = filter.sql_clause("fs", "dt.full_date", &mut idx);
        assert!(clause.contains("HAVING COUNT(DISTINCT order_key) = 1"));
        assert!(clause.contains("fs.customer_key IN"));

        let filter = ReportFilter {
            customer_type: CustomerType::Return,
            ..Default::default()
        };
        let clause = filter.sql_clause("fs", "dt.full_date", &mut idx);
        assert!(clause.contains("> 1"));
    }

    #[test]
    fn customer_type_parses() {
        assert_eq!("all".parse::<CustomerType>().unwrap(), CustomerType::All);
        assert_eq!("new".parse::<CustomerType>().unwrap(), CustomerType::New);
        assert_eq!(
            "return".parse::<CustomerType>().unwrap(),
            CustomerType::Return
        );
        assert!("vip".parse::<CustomerType>().is_err());
    }
}
