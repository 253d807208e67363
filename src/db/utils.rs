use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use sqlx::{Row, sqlite::SqliteRow};

use crate::models::{Transaction, TransactionType};

pub fn parse_i64_from_row(row: &SqliteRow, column: &str) -> Result<i64> {
    row.try_get::<i64, _>(column)
        .with_context(|| format!("Failed to parse i64 from column '{}'", column))
}

pub fn parse_string_from_row(row: &SqliteRow, column: &str) -> Result<String> {
    row.try_get::<String, _>(column)
        .with_context(|| format!("Failed to parse String from column '{}'", column))
}

pub fn parse_f64_from_row(row: &SqliteRow, column: &str) -> Result<f64> {
    let value: f64 = row
        .try_get(column)
        .with_context(|| format!("Failed to parse f64 from column '{}'", column))?;
    Ok(value)
}

pub fn parse_decimal_from_row(row: &SqliteRow, column: &str) -> Result<Decimal> {
    let value = parse_f64_from_row(row, column)?;
    Decimal::from_f64(value)
        .with_context(|| format!("Failed to convert f64 to Decimal for column '{}'", column))
}

pub fn parse_opt_decimal_from_row(row: &SqliteRow, column: &str) -> Result<Option<Decimal>> {
    let value: Option<f64> = row
        .try_get(column)
        .with_context(|| format!("Failed to parse nullable f64 from column '{}'", column))?;
    value
        .map(|v| {
            Decimal::from_f64(v).with_context(|| {
                format!("Failed to convert f64 to Decimal for column '{}'", column)
            })
        })
        .transpose()
}

pub fn parse_date_from_row(row: &SqliteRow, column: &str) -> Result<NaiveDate> {
    row.try_get::<NaiveDate, _>(column)
        .with_context(|| format!("Failed to parse date from column '{}'", column))
}

pub fn parse_transaction_type_from_row(row: &SqliteRow, column: &str) -> Result<TransactionType> {
    let type_str = parse_string_from_row(row, column)?;
    TransactionType::parse_str(&type_str)
        .with_context(|| format!("Failed to parse TransactionType from column '{}'", column))
}

pub fn parse_transaction(row: &SqliteRow) -> Result<Transaction> {
    let id = parse_i64_from_row(row, "id")?;
    let account = parse_string_from_row(row, "account")?;
    let date = parse_date_from_row(row, "transaction_date")?;
    let transaction_type = parse_transaction_type_from_row(row, "transaction_type")?;
    let symbol: Option<String> = row
        .try_get("symbol")
        .with_context(|| "Failed to parse nullable column 'symbol'")?;
    let quantity = parse_opt_decimal_from_row(row, "quantity")?;
    let amount = parse_decimal_from_row(row, "amount")?;
    let notes: Option<String> = row
        .try_get("notes")
        .with_context(|| "Failed to parse nullable column 'notes'")?;

    Ok(Transaction::new(
        id,
        account,
        date,
        transaction_type,
        symbol,
        quantity,
        amount,
        notes,
    ))
}
