//! Warehouse repository for PostgreSQL operations
//! Owns the pool, the DDL, and the star-schema load path.

use anyhow::{Context, Result};
use log::info;
use sqlx::PgPool;

use crate::etl::StarSchema;
use crate::warehouse::schema;
use crate::warehouse::types::*;

#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub struct WarehouseRepository {
    pool: PgPool,
}

impl WarehouseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database pool from connection string.
    pub async fn create_pool(database_url: &str) -> Result<PgPool> {
        sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL database")
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Test database connection.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database connection test failed")?;
        Ok(())
    }

    /// Create all warehouse tables and indexes; safe to run repeatedly.
    pub async fn init_schema(&self) -> Result<()> {
        for statement in schema::create_statements() {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to execute DDL statement")?;
        }
        info!("warehouse schema initialized");
        Ok(())
    }

    /// Replace the star schema contents with a freshly built one.
    /// dim_time upserts on its key; every other table is truncated first so
    /// the in-memory surrogate keys stay valid. Dimensions load before facts.
    pub async fn load_star_schema(&self, star: &StarSchema) -> Result<()> {
        sqlx::query(
            "TRUNCATE fact_sales, fact_financial_transactions, fact_deposits, \
             fact_payments, fact_bank_transactions, dim_product, dim_customer, \
             dim_geography, dim_order, dim_payment, dim_bank_account, \
             dim_product_catalog RESTART IDENTITY CASCADE",
        )
        .execute(&self.pool)
        .await
        .context("Failed to truncate warehouse tables")?;

        self.upsert_dim_time(&star.dim_time).await?;
        self.insert_dim_product(&star.dim_product).await?;
        self.insert_dim_customer(&star.dim_customer).await?;
        self.insert_dim_geography(&star.dim_geography).await?;
        self.insert_dim_order(&star.dim_order).await?;
        self.insert_dim_payment(&star.dim_payment).await?;
        self.insert_dim_bank_account(&star.dim_bank_account).await?;
        self.insert_dim_product_catalog(&star.dim_product_catalog)
            .await?;
        self.insert_fact_sales(&star.fact_sales).await?;
        self.insert_fact_financial_transactions(&star.fact_financial_transactions)
            .await?;
        self.insert_fact_deposits(&star.fact_deposits).await?;
        self.insert_fact_payments(&star.fact_payments).await?;
        self.insert_fact_bank_transactions(&star.fact_bank_transactions)
            .await?;

        for (table, count) in star.table_counts() {
            info!("loaded {table}: {count} rows");
        }
        Ok(())
    }

    pub async fn upsert_dim_time(&self, rows: &[DimTimeRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO dim_time (time_key, full_date, year, quarter, month,
                    week_of_year, day_of_month, day_of_week, day_of_year,
                    month_name, day_name, quarter_name, is_weekend,
                    is_peak_season, selling_season)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                ON CONFLICT (time_key) DO NOTHING
                "#,
            )
            .bind(row.time_key)
            .bind(row.full_date)
            .bind(row.year)
            .bind(row.quarter)
            .bind(row.month)
            .bind(row.week_of_year)
            .bind(row.day_of_month)
            .bind(row.day_of_week)
            .bind(row.day_of_year)
            .bind(&row.month_name)
            .bind(&row.day_name)
            .bind(&row.quarter_name)
            .bind(row.is_weekend)
            .bind(row.is_peak_season)
            .bind(&row.selling_season)
            .execute(&self.pool)
            .await
            .context("Failed to upsert dim_time row")?;
        }
        Ok(rows.len())
    }

    pub async fn insert_dim_product(&self, rows: &[DimProductRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO dim_product (product_key, product_name, description,
                    price, quantity, sku, tags, materials, is_current,
                    effective_date, expiry_date)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(row.product_key)
            .bind(&row.product_name)
            .bind(&row.description)
            .bind(row.price)
            .bind(row.quantity)
            .bind(&row.sku)
            .bind(&row.tags)
            .bind(&row.materials)
            .bind(row.is_current)
            .bind(row.effective_date)
            .bind(row.expiry_date)
            .execute(&self.pool)
            .await
            .context("Failed to insert dim_product row")?;
        }
        Ok(rows.len())
    }

    pub async fn insert_dim_customer(&self, rows: &[DimCustomerRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO dim_customer (customer_key, customer_id,
                    buyer_username, full_name, first_name, last_name,
                    order_count, total_spent, first_order_date, last_order_date,
                    is_current, effective_date, expiry_date)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                "#,
            )
            .bind(row.customer_key)
            .bind(&row.customer_id)
            .bind(&row.buyer_username)
            .bind(&row.full_name)
            .bind(&row.first_name)
            .bind(&row.last_name)
            .bind(row.order_count)
            .bind(row.total_spent)
            .bind(row.first_order_date)
            .bind(row.last_order_date)
            .bind(row.is_current)
            .bind(row.effective_date)
            .bind(row.expiry_date)
            .execute(&self.pool)
            .await
            .context("Failed to insert dim_customer row")?;
        }
        Ok(rows.len())
    }

    pub async fn insert_dim_geography(&self, rows: &[DimGeographyRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO dim_geography (geography_key, country_name,
                    state_name, city_name, zipcode)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(row.geography_key)
            .bind(&row.country_name)
            .bind(&row.state_name)
            .bind(&row.city_name)
            .bind(&row.zipcode)
            .execute(&self.pool)
            .await
            .context("Failed to insert dim_geography row")?;
        }
        Ok(rows.len())
    }

    pub async fn insert_dim_order(&self, rows: &[DimOrderRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO dim_order (order_key, order_id, order_date,
                    order_type, payment_type)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(row.order_key)
            .bind(&row.order_id)
            .bind(row.order_date)
            .bind(&row.order_type)
            .bind(&row.payment_type)
            .execute(&self.pool)
            .await
            .context("Failed to insert dim_order row")?;
        }
        Ok(rows.len())
    }

    pub async fn insert_dim_payment(&self, rows: &[DimPaymentRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                "INSERT INTO dim_payment (payment_key, payment_method, payment_type) \
                 VALUES ($1, $2, $3)",
            )
            .bind(row.payment_key)
            .bind(&row.payment_method)
            .bind(&row.payment_type)
            .execute(&self.pool)
            .await
            .context("Failed to insert dim_payment row")?;
        }
        Ok(rows.len())
    }

    pub async fn insert_dim_bank_account(&self, rows: &[DimBankAccountRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO dim_bank_account (bank_account_key, account_number,
                    account_name, cif_number, customer_address, opening_date,
                    currency_code)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(row.bank_account_key)
            .bind(&row.account_number)
            .bind(&row.account_name)
            .bind(&row.cif_number)
            .bind(&row.customer_address)
            .bind(row.opening_date)
            .bind(&row.currency_code)
            .execute(&self.pool)
            .await
            .context("Failed to insert dim_bank_account row")?;
        }
        Ok(rows.len())
    }

    pub async fn insert_dim_product_catalog(
        &self,
        rows: &[DimProductCatalogRow],
    ) -> Result<usize> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO dim_product_catalog (product_catalog_key,
                    product_line_id, product_name, product_id, variant_id,
                    variant_name)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(row.product_catalog_key)
            .bind(&row.product_line_id)
            .bind(&row.product_name)
            .bind(&row.product_id)
            .bind(&row.variant_id)
            .bind(&row.variant_name)
            .execute(&self.pool)
            .await
            .context("Failed to insert dim_product_catalog row")?;
        }
        Ok(rows.len())
    }

    pub async fn insert_fact_sales(&self, rows: &[FactSalesRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO fact_sales (time_key, product_key, order_key,
                    customer_key, geography_key, payment_key, order_id,
                    listing_id, transaction_id, item_name, price, quantity,
                    item_total, discount_amount, order_shipping,
                    shipping_discount, order_sales_tax, sku)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18)
                "#,
            )
            .bind(row.time_key)
            .bind(row.product_key)
            .bind(row.order_key)
            .bind(row.customer_key)
            .bind(row.geography_key)
            .bind(row.payment_key)
            .bind(&row.order_id)
            .bind(&row.listing_id)
            .bind(&row.transaction_id)
            .bind(&row.item_name)
            .bind(row.price)
            .bind(row.quantity)
            .bind(row.item_total)
            .bind(row.discount_amount)
            .bind(row.order_shipping)
            .bind(row.shipping_discount)
            .bind(row.order_sales_tax)
            .bind(&row.sku)
            .execute(&self.pool)
            .await
            .context("Failed to insert fact_sales row")?;
        }
        Ok(rows.len())
    }

    pub async fn insert_fact_financial_transactions(
        &self,
        rows: &[FactFinancialTransactionRow],
    ) -> Result<usize> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO fact_financial_transactions (transaction_date_key,
                    customer_key, order_key, transaction_type,
                    transaction_title, info, order_id, transaction_id,
                    currency, amount, fees_and_taxes, net_amount)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(row.transaction_date_key)
            .bind(row.customer_key)
            .bind(row.order_key)
            .bind(&row.transaction_type)
            .bind(&row.transaction_title)
            .bind(&row.info)
            .bind(&row.order_id)
            .bind(&row.transaction_id)
            .bind(&row.currency)
            .bind(row.amount)
            .bind(row.fees_and_taxes)
            .bind(row.net_amount)
            .execute(&self.pool)
            .await
            .context("Failed to insert fact_financial_transactions row")?;
        }
        Ok(rows.len())
    }

    pub async fn insert_fact_deposits(&self, rows: &[FactDepositRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO fact_deposits (deposit_date_key, amount, currency,
                    status, bank_account_ending)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(row.deposit_date_key)
            .bind(row.amount)
            .bind(&row.currency)
            .bind(&row.status)
            .bind(&row.bank_account_ending)
            .execute(&self.pool)
            .await
            .context("Failed to insert fact_deposits row")?;
        }
        Ok(rows.len())
    }

    pub async fn insert_fact_payments(&self, rows: &[FactPaymentRow]) -> Result<usize> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO fact_payments (payment_date_key, customer_key,
                    order_key, payment_id, order_id, gross_amount, fees,
                    net_amount, posted_gross, posted_fees, posted_net,
                    adjusted_gross, adjusted_fees, adjusted_net, exchange_rate,
                    vat_amount, refund_amount, payment_type, order_type)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19)
                "#,
            )
            .bind(row.payment_date_key)
            .bind(row.customer_key)
            .bind(row.order_key)
            .bind(&row.payment_id)
            .bind(&row.order_id)
            .bind(row.gross_amount)
            .bind(row.fees)
            .bind(row.net_amount)
            .bind(row.posted_gross)
            .bind(row.posted_fees)
            .bind(row.posted_net)
            .bind(row.adjusted_gross)
            .bind(row.adjusted_fees)
            .bind(row.adjusted_net)
            .bind(row.exchange_rate)
            .bind(row.vat_amount)
            .bind(row.refund_amount)
            .bind(&row.payment_type)
            .bind(&row.order_type)
            .execute(&self.pool)
            .await
            .context("Failed to insert fact_payments row")?;
        }
        Ok(rows.len())
    }

    pub async fn insert_fact_bank_transactions(
        &self,
        rows: &[FactBankTransactionRow],
    ) -> Result<usize> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO fact_bank_transactions (transaction_date_key,
                    bank_account_key, product_catalog_key, reference_number,
                    transaction_description, credit_amount, debit_amount,
                    balance_after_transaction, currency_code,
                    pl_account_number, parsed_product_line_id,
                    parsed_product_id, parsed_variant_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                "#,
            )
            .bind(row.transaction_date_key)
            .bind(row.bank_account_key)
            .bind(row.product_catalog_key)
            .bind(&row.reference_number)
            .bind(&row.transaction_description)
            .bind(row.credit_amount)
            .bind(row.debit_amount)
            .bind(row.balance_after_transaction)
            .bind(&row.currency_code)
            .bind(&row.pl_account_number)
            .bind(&row.parsed_product_line_id)
            .bind(&row.parsed_product_id)
            .bind(&row.parsed_variant_id)
            .execute(&self.pool)
            .await
            .context("Failed to insert fact_bank_transactions row")?;
        }
        Ok(rows.len())
    }
}
