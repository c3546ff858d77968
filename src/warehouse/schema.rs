//! Warehouse DDL, idempotent

pub const CREATE_DIM_TIME: &str = r#"
CREATE TABLE IF NOT EXISTS dim_time (
    time_key        INTEGER PRIMARY KEY,
    full_date       DATE NOT NULL,
    year            INTEGER NOT NULL,
    quarter         INTEGER NOT NULL,
    month           INTEGER NOT NULL,
    week_of_year    INTEGER NOT NULL,
    day_of_month    INTEGER NOT NULL,
    day_of_week     INTEGER NOT NULL,
    day_of_year     INTEGER NOT NULL,
    month_name      TEXT NOT NULL,
    day_name        TEXT NOT NULL,
    quarter_name    TEXT NOT NULL,
    is_weekend      BOOLEAN NOT NULL,
    is_peak_season  BOOLEAN NOT NULL,
    selling_season  TEXT NOT NULL
)
"#;

pub const CREATE_DIM_PRODUCT: &str = r#"
CREATE TABLE IF NOT EXISTS dim_product (
    product_key     BIGINT PRIMARY KEY,
    product_name    TEXT,
    description     TEXT,
    price           NUMERIC(14,2),
    quantity        INTEGER,
    sku             TEXT,
    tags            TEXT,
    materials       TEXT,
    is_current      BOOLEAN NOT NULL DEFAULT TRUE,
    effective_date  DATE,
    expiry_date     DATE
)
"#;

pub const CREATE_DIM_CUSTOMER: &str = r#"
CREATE TABLE IF NOT EXISTS dim_customer (
    customer_key     BIGINT PRIMARY KEY,
    customer_id      TEXT NOT NULL,
    buyer_username   TEXT,
    full_name        TEXT,
    first_name       TEXT,
    last_name        TEXT,
    order_count      INTEGER NOT NULL DEFAULT 0,
    total_spent      NUMERIC(14,2),
    first_order_date DATE,
    last_order_date  DATE,
    is_current       BOOLEAN NOT NULL DEFAULT TRUE,
    effective_date   DATE,
    expiry_date      DATE
)
"#;

pub const CREATE_DIM_GEOGRAPHY: &str = r#"
CREATE TABLE IF NOT EXISTS dim_geography (
    geography_key BIGINT PRIMARY KEY,
    country_name  TEXT,
    state_name    TEXT,
    city_name     TEXT,
    zipcode       TEXT
)
"#;

pub const CREATE_DIM_ORDER: &str = r#"
CREATE TABLE IF NOT EXISTS dim_order (
    order_key    BIGINT PRIMARY KEY,
    order_id     TEXT NOT NULL,
    order_date   DATE,
    order_type   TEXT,
    payment_type TEXT
)
"#;

pub const CREATE_DIM_PAYMENT: &str = r#"
CREATE TABLE IF NOT EXISTS dim_payment (
    payment_key    BIGINT PRIMARY KEY,
    payment_method TEXT,
    payment_type   TEXT
)
"#;

pub const CREATE_DIM_BANK_ACCOUNT: &str = r#"
CREATE TABLE IF NOT EXISTS dim_bank_account (
    bank_account_key BIGINT PRIMARY KEY,
    account_number   TEXT,
    account_name     TEXT,
    cif_number       TEXT,
    customer_address TEXT,
    opening_date     DATE,
    currency_code    TEXT
)
"#;

pub const CREATE_DIM_PRODUCT_CATALOG: &str = r#"
CREATE TABLE IF NOT EXISTS dim_product_catalog (
    product_catalog_key BIGINT PRIMARY KEY,
    product_line_id     TEXT,
    product_name        TEXT,
    product_id          TEXT,
    variant_id          TEXT,
    variant_name        TEXT
)
"#;

pub const CREATE_FACT_SALES: &str = r#"
CREATE TABLE IF NOT EXISTS fact_sales (
    sales_key         BIGSERIAL PRIMARY KEY,
    time_key          INTEGER REFERENCES dim_time(time_key),
    product_key       BIGINT REFERENCES dim_product(product_key),
    order_key         BIGINT REFERENCES dim_order(order_key),
    customer_key      BIGINT REFERENCES dim_customer(customer_key),
    geography_key     BIGINT REFERENCES dim_geography(geography_key),
    payment_key       BIGINT REFERENCES dim_payment(payment_key),
    order_id          TEXT,
    listing_id        TEXT,
    transaction_id    TEXT,
    item_name         TEXT,
    price             NUMERIC(14,2),
    quantity          INTEGER,
    item_total        NUMERIC(14,2),
    discount_amount   NUMERIC(14,2),
    order_shipping    NUMERIC(14,2),
    shipping_discount NUMERIC(14,2),
    order_sales_tax   NUMERIC(14,2),
    sku               TEXT
)
"#;

pub const CREATE_FACT_FINANCIAL_TRANSACTIONS: &str = r#"
CREATE TABLE IF NOT EXISTS fact_financial_transactions (
    financial_transaction_key BIGSERIAL PRIMARY KEY,
    transaction_date_key      INTEGER REFERENCES dim_time(time_key),
    customer_key              BIGINT REFERENCES dim_customer(customer_key),
    order_key                 BIGINT REFERENCES dim_order(order_key),
    transaction_type          TEXT,
    transaction_title         TEXT,
    info                      TEXT,
    order_id                  TEXT,
    transaction_id            TEXT,
    currency                  TEXT,
    amount                    NUMERIC(14,2),
    fees_and_taxes            NUMERIC(14,2),
    net_amount                NUMERIC(14,2)
)
"#;

pub const CREATE_FACT_DEPOSITS: &str = r#"
CREATE TABLE IF NOT EXISTS fact_deposits (
    deposit_key         BIGSERIAL PRIMARY KEY,
    deposit_date_key    INTEGER REFERENCES dim_time(time_key),
    amount              NUMERIC(14,2),
    currency            TEXT,
    status              TEXT,
    bank_account_ending TEXT
)
"#;

pub const CREATE_FACT_PAYMENTS: &str = r#"
CREATE TABLE IF NOT EXISTS fact_payments (
    payment_fact_key BIGSERIAL PRIMARY KEY,
    payment_date_key INTEGER REFERENCES dim_time(time_key),
    customer_key     BIGINT REFERENCES dim_customer(customer_key),
    order_key        BIGINT REFERENCES dim_order(order_key),
    payment_id       TEXT,
    order_id         TEXT,
    gross_amount     NUMERIC(14,2),
    fees             NUMERIC(14,2),
    net_amount       NUMERIC(14,2),
    posted_gross     NUMERIC(14,2),
    posted_fees      NUMERIC(14,2),
    posted_net       NUMERIC(14,2),
    adjusted_gross   NUMERIC(14,2),
    adjusted_fees    NUMERIC(14,2),
    adjusted_net     NUMERIC(14,2),
    exchange_rate    NUMERIC(18,8),
    vat_amount       NUMERIC(14,2),
    refund_amount    NUMERIC(14,2),
    payment_type     TEXT,
    order_type       TEXT
)
"#;

pub const CREATE_FACT_BANK_TRANSACTIONS: &str = r#"
CREATE TABLE IF NOT EXISTS fact_bank_transactions (
    bank_transaction_key      BIGSERIAL PRIMARY KEY,
    transaction_date_key      INTEGER REFERENCES dim_time(time_key),
    bank_account_key          BIGINT REFERENCES dim_bank_account(bank_account_key),
    product_catalog_key       BIGINT REFERENCES dim_product_catalog(product_catalog_key),
    reference_number          TEXT,
    transaction_description   TEXT,
    credit_amount             NUMERIC(18,2),
    debit_amount              NUMERIC(18,2),
    balance_after_transaction NUMERIC(18,2),
    currency_code             TEXT,
    pl_account_number         TEXT,
    parsed_product_line_id    TEXT,
    parsed_product_id         TEXT,
    parsed_variant_id         TEXT
)
"#;

pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_fact_sales_time ON fact_sales(time_key)",
    "CREATE INDEX IF NOT EXISTS idx_fact_sales_product ON fact_sales(product_key)",
    "CREATE INDEX IF NOT EXISTS idx_fact_sales_customer ON fact_sales(customer_key)",
    "CREATE INDEX IF NOT EXISTS idx_fact_sales_sku ON fact_sales(sku)",
    "CREATE INDEX IF NOT EXISTS idx_fact_fin_date ON fact_financial_transactions(transaction_date_key)",
    "CREATE INDEX IF NOT EXISTS idx_fact_fin_type ON fact_financial_transactions(transaction_type)",
    "CREATE INDEX IF NOT EXISTS idx_fact_deposits_date ON fact_deposits(deposit_date_key)",
    "CREATE INDEX IF NOT EXISTS idx_fact_payments_date ON fact_payments(payment_date_key)",
    "CREATE INDEX IF NOT EXISTS idx_fact_bank_date ON fact_bank_transactions(transaction_date_key)",
    "CREATE INDEX IF NOT EXISTS idx_fact_bank_account ON fact_bank_transactions(bank_account_key)",
    "CREATE INDEX IF NOT EXISTS idx_fact_bank_pl_account ON fact_bank_transactions(pl_account_number)",
    "CREATE INDEX IF NOT EXISTS idx_fact_bank_parsed_product ON fact_bank_transactions(parsed_product_id, parsed_variant_id)",
];

/// Tables in creation order (dimensions before facts, for the FK references).
pub fn create_statements() -> Vec<&'static str> {
    let mut statements = vec![
        CREATE_DIM_TIME,
        CREATE_DIM_PRODUCT,
        CREATE_DIM_CUSTOMER,
        CREATE_DIM_GEOGRAPHY,
        CREATE_DIM_ORDER,
        CREATE_DIM_PAYMENT,
        CREATE_DIM_BANK_ACCOUNT,
        CREATE_DIM_PRODUCT_CATALOG,
        CREATE_FACT_SALES,
        CREATE_FACT_FINANCIAL_TRANSACTIONS,
        CREATE_FACT_DEPOSITS,
        CREATE_FACT_PAYMENTS,
        CREATE_FACT_BANK_TRANSACTIONS,
    ];
    statements.extend_from_slice(CREATE_INDEXES);
    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_precede_facts() {
        let statements = create_statements();
        let pos = |needle: &str| {
            statements
                .iter()
                .position(|s| s.contains(needle))
                .unwrap()
        };
        assert!(pos("dim_time") < pos("fact_sales"));
        assert!(pos("dim_bank_account") < pos("fact_bank_transactions"));
    }

    #[test]
    fn every_statement_is_idempotent() {
        for statement in create_statements() {
            assert!(statement.contains("IF NOT EXISTS"), "{statement}");
        }
    }
}
