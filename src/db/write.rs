use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use sqlx::{Pool, Sqlite};

use crate::models::{Candle, HoldingBasis, PriceSource, Transaction};

pub async fn insert_transaction(
    connection: &Pool<Sqlite>,
    transaction: &Transaction,
) -> Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO transactions
        (account, transaction_date, transaction_type, symbol, quantity, amount, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(transaction.account())
    .bind(transaction.date())
    .bind(transaction.transaction_type().to_str())
    .bind(transaction.symbol())
    .bind(transaction.quantity().map(|q| q.round_dp(4).to_f64()))
    .bind(transaction.amount().round_dp(4).to_f64())
    .bind(transaction.notes())
    .execute(connection)
    .await
    .with_context(|| "Failed to insert transaction")?
    .last_insert_rowid();

    Ok(id)
}

/// Replaces an account's cached holdings with a freshly derived set.
/// Delete and insert run in one transaction so a failure half-way
/// never leaves a mixed cache behind.
pub async fn replace_holdings(
    connection: &Pool<Sqlite>,
    account: &str,
    holdings: &[HoldingBasis],
) -> Result<u64> {
    let mut tx = connection
        .begin()
        .await
        .with_context(|| "Failed to begin holdings rebuild transaction")?;

    sqlx::query("DELETE FROM holdings WHERE account = ?")
        .bind(account)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to clear cached holdings for '{}'", account))?;

    let mut inserted = 0u64;
    for holding in holdings {
        sqlx::query(
            r#"
            INSERT INTO holdings
            (account, symbol, quantity, average_cost, total_invested, first_buy_date, estimated)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account)
        .bind(holding.symbol())
        .bind(holding.quantity().round_dp(4).to_f64())
        .bind(holding.average_cost().round_dp(4).to_f64())
        .bind(holding.total_invested().round_dp(4).to_f64())
        .bind(holding.first_buy_date())
        .bind(*holding.estimated() as i64)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to insert holding '{}'", holding.symbol()))?;
        inserted += 1;
    }

    tx.commit()
        .await
        .with_context(|| "Failed to commit holdings rebuild transaction")?;

    Ok(inserted)
}

/// Upserts daily candles keyed by (symbol, price_date). Re-fetching an
/// overlapping window is therefore harmless.
pub async fn upsert_candles(
    connection: &Pool<Sqlite>,
    symbol: &str,
    candles: &[Candle],
    source: PriceSource,
) -> Result<u64> {
    let mut tx = connection
        .begin()
        .await
        .with_context(|| "Failed to begin quote upsert transaction")?;

    let mut written = 0u64;
    for candle in candles {
        sqlx::query(
            r#"
            INSERT INTO quotes (symbol, price_date, open, high, low, close, volume, source)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (symbol, price_date) DO UPDATE SET
                open = excluded.open,
                high = excluded.high,
                low = excluded.low,
                close = excluded.close,
                volume = excluded.volume,
                source = excluded.source
            "#,
        )
        .bind(symbol)
        .bind(candle.date())
        .bind(candle.open().round_dp(4).to_f64())
        .bind(candle.high().round_dp(4).to_f64())
        .bind(candle.low().round_dp(4).to_f64())
        .bind(candle.close().round_dp(4).to_f64())
        .bind(candle.volume())
        .bind(source.to_str())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to upsert quote for '{}' {}", symbol, candle.date()))?;
        written += 1;
    }

    tx.commit()
        .await
        .with_context(|| "Failed to commit quote upsert transaction")?;

    Ok(written)
}
