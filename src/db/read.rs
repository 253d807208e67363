use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Pool, Sqlite};

use super::utils::{
    parse_date_from_row, parse_decimal_from_row, parse_i64_from_row, parse_string_from_row,
    parse_transaction,
};
use crate::models::{Candle, HoldingBasis, PriceSource, Quote, Transaction};

/// The full ledger of one account in replay order. A single query, so
/// the replay always works from one consistent snapshot.
pub async fn fetch_transactions(
    connection: &Pool<Sqlite>,
    account: &str,
) -> Result<Vec<Transaction>> {
    let rows = sqlx::query(
        r#"
        SELECT id, account, transaction_date, transaction_type, symbol, quantity, amount, notes
        FROM transactions
        WHERE account = ?
        ORDER BY transaction_date, id
        "#,
    )
    .bind(account)
    .fetch_all(connection)
    .await
    .with_context(|| format!("Failed to fetch transactions for account '{}'", account))?;

    rows.iter().map(parse_transaction).collect()
}

pub async fn fetch_recent_transactions(
    connection: &Pool<Sqlite>,
    account: &str,
    limit: i64,
) -> Result<Vec<Transaction>> {
    let rows = sqlx::query(
        r#"
        SELECT id, account, transaction_date, transaction_type, symbol, quantity, amount, notes
        FROM transactions
        WHERE account = ?
        ORDER BY transaction_date DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(account)
    .bind(limit)
    .fetch_all(connection)
    .await
    .with_context(|| format!("Failed to fetch recent transactions for '{}'", account))?;

    rows.iter().map(parse_transaction).collect()
}

/// The cached holdings projection. Empty when the account was never
/// rebuilt; callers fall back to deriving from the ledger.
pub async fn fetch_cached_holdings(
    connection: &Pool<Sqlite>,
    account: &str,
) -> Result<Vec<HoldingBasis>> {
    let rows = sqlx::query(
        r#"
        SELECT symbol, quantity, average_cost, total_invested, first_buy_date, estimated
        FROM holdings
        WHERE account = ?
        ORDER BY symbol
        "#,
    )
    .bind(account)
    .fetch_all(connection)
    .await
    .with_context(|| format!("Failed to fetch cached holdings for '{}'", account))?;

    rows.iter()
        .map(|row| {
            Ok(HoldingBasis::new(
                parse_string_from_row(row, "symbol")?,
                parse_decimal_from_row(row, "quantity")?,
                parse_decimal_from_row(row, "average_cost")?,
                parse_decimal_from_row(row, "total_invested")?,
                parse_date_from_row(row, "first_buy_date")?,
                parse_i64_from_row(row, "estimated")? != 0,
            ))
        })
        .collect()
}

/// Most recent stored close for a symbol, as a `PriceSource::Stored`
/// quote. Third tier of the resolver chain.
pub async fn latest_stored_quote(
    connection: &Pool<Sqlite>,
    symbol: &str,
) -> Result<Option<Quote>> {
    let row = sqlx::query(
        r#"
        SELECT symbol, price_date, close, volume
        FROM quotes
        WHERE symbol = ?
        ORDER BY price_date DESC
        LIMIT 1
        "#,
    )
    .bind(symbol)
    .fetch_optional(connection)
    .await
    .with_context(|| format!("Failed to fetch stored quote for '{}'", symbol))?;

    let Some(row) = row else {
        return Ok(None);
    };

    let close = parse_decimal_from_row(&row, "close")?;
    let volume: Option<i64> = sqlx::Row::try_get(&row, "volume")?;

    Ok(Some(Quote::new(
        parse_string_from_row(&row, "symbol")?,
        close,
        close,
        Decimal::ZERO,
        Decimal::ZERO,
        volume.unwrap_or(0),
        parse_date_from_row(&row, "price_date")?,
        PriceSource::Stored,
    )))
}

/// Dates already present in the store for a symbol and window, used to
/// decide between skipping, incremental and full backfills.
pub async fn stored_quote_dates(
    connection: &Pool<Sqlite>,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashSet<NaiveDate>> {
    let rows = sqlx::query(
        r#"
        SELECT price_date
        FROM quotes
        WHERE symbol = ? AND price_date >= ? AND price_date <= ?
        "#,
    )
    .bind(symbol)
    .bind(start)
    .bind(end)
    .fetch_all(connection)
    .await
    .with_context(|| format!("Failed to fetch stored quote dates for '{}'", symbol))?;

    rows.iter()
        .map(|row| parse_date_from_row(row, "price_date"))
        .collect()
}

pub async fn stored_candles(
    connection: &Pool<Sqlite>,
    symbol: &str,
    start: NaiveDate,
) -> Result<Vec<Candle>> {
    let rows = sqlx::query(
        r#"
        SELECT price_date, open, high, low, close, volume
        FROM quotes
        WHERE symbol = ? AND price_date >= ?
        ORDER BY price_date
        "#,
    )
    .bind(symbol)
    .bind(start)
    .fetch_all(connection)
    .await
    .with_context(|| format!("Failed to fetch stored candles for '{}'", symbol))?;

    rows.iter()
        .map(|row| {
            let close = parse_decimal_from_row(row, "close")?;
            let volume: Option<i64> = sqlx::Row::try_get(row, "volume")?;
            Ok(Candle::new(
                parse_date_from_row(row, "price_date")?,
                super::utils::parse_opt_decimal_from_row(row, "open")?.unwrap_or(close),
                super::utils::parse_opt_decimal_from_row(row, "high")?.unwrap_or(close),
                super::utils::parse_opt_decimal_from_row(row, "low")?.unwrap_or(close),
                close,
                volume.unwrap_or(0),
            ))
        })
        .collect()
}
