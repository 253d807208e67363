use anyhow::{Context, Result};
use chrono::NaiveDate;
use derive_getters::Getters;
use derive_new::new;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use crate::models::{Candle, PriceSource, Quote};

#[derive(Debug, Deserialize, Getters, new)]
pub struct AvGlobalQuoteDto {
    #[serde(rename = "01. symbol")]
    symbol: String,
    #[serde(rename = "02. open")]
    open: String,
    #[serde(rename = "03. high")]
    high: String,
    #[serde(rename = "04. low")]
    low: String,
    #[serde(rename = "05. price")]
    price: String,
    #[serde(rename = "06. volume")]
    volume: String,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: String,
    #[serde(rename = "08. previous close")]
    previous_close: String,
    #[serde(rename = "09. change")]
    change: String,
    #[serde(rename = "10. change percent")]
    change_percent: String,
}

impl AvGlobalQuoteDto {
    pub fn to_quote(&self) -> Result<Quote> {
        let price = Decimal::from_str(&self.price)
            .with_context(|| format!("Alpha Vantage ({}): unparseable price", self.symbol))?;
        let previous_close = Decimal::from_str(&self.previous_close).unwrap_or_default();
        let change = Decimal::from_str(&self.change).unwrap_or_default();
        // Served as e.g. "1.2345%".
        let change_percent =
            Decimal::from_str(self.change_percent.trim_end_matches('%')).unwrap_or_default();
        let volume = self.volume.parse::<i64>().unwrap_or_default();
        let as_of = NaiveDate::parse_from_str(&self.latest_trading_day, "%Y-%m-%d")
            .with_context(|| format!("Alpha Vantage ({}): unparseable date", self.symbol))?;

        Ok(Quote::new(
            self.symbol.clone(),
            price,
            previous_close,
            change,
            change_percent,
            volume,
            as_of,
            PriceSource::AlphaVantage,
        ))
    }
}

#[derive(Debug, Deserialize, Getters, new)]
pub struct AvDailyBarDto {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

impl AvDailyBarDto {
    pub fn to_candle(&self, date: NaiveDate) -> Result<Candle> {
        Ok(Candle::new(
            date,
            Decimal::from_str(&self.open).with_context(|| "unparseable open")?,
            Decimal::from_str(&self.high).with_context(|| "unparseable high")?,
            Decimal::from_str(&self.low).with_context(|| "unparseable low")?,
            Decimal::from_str(&self.close).with_context(|| "unparseable close")?,
            self.volume.parse::<i64>().unwrap_or_default(),
        ))
    }
}
