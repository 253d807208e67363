use sqlx::sqlite::SqliteQueryResult;

pub async fn create_transactions(
    connection: &sqlx::Pool<sqlx::Sqlite>,
) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account TEXT NOT NULL,
            transaction_date TEXT NOT NULL,
            transaction_type TEXT NOT NULL,
            symbol TEXT,
            quantity REAL,
            amount REAL NOT NULL,
            notes TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(connection)
    .await
}

pub async fn create_holdings(
    connection: &sqlx::Pool<sqlx::Sqlite>,
) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS holdings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account TEXT NOT NULL,
            symbol TEXT NOT NULL,
            quantity REAL NOT NULL,
            average_cost REAL NOT NULL,
            total_invested REAL NOT NULL,
            first_buy_date TEXT NOT NULL,
            estimated INTEGER NOT NULL DEFAULT 0,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (account, symbol)
        )
        "#,
    )
    .execute(connection)
    .await
}

pub async fn create_quotes(
    connection: &sqlx::Pool<sqlx::Sqlite>,
) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quotes (
            symbol TEXT NOT NULL,
            price_date TEXT NOT NULL,
            open REAL,
            high REAL,
            low REAL,
            close REAL NOT NULL,
            volume INTEGER,
            source TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (symbol, price_date)
        )
        "#,
    )
    .execute(connection)
    .await
}

/// Creates every table the engine needs. Safe to call on every start.
pub async fn create_all(connection: &sqlx::Pool<sqlx::Sqlite>) -> Result<(), sqlx::Error> {
    create_transactions(connection).await?;
    create_holdings(connection).await?;
    create_quotes(connection).await?;
    Ok(())
}
