use anyhow::Result;
use chrono::NaiveDate;
use derive_getters::Getters;
use derive_new::new;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A resolved price for one symbol, tagged with where it came from so a
/// market quote is never confused with an average-cost approximation.
#[derive(Clone, Debug, Deserialize, Getters, new, PartialEq, Serialize)]
pub struct Quote {
    symbol: String,
    price: Decimal,
    previous_close: Decimal,
    change: Decimal,
    change_percent: Decimal,
    volume: i64,
    as_of: NaiveDate,
    source: PriceSource,
}

/// One day of historical prices.
#[derive(Clone, Debug, Deserialize, Getters, new, PartialEq, Serialize)]
pub struct Candle {
    date: NaiveDate,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: i64,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PriceSource {
    Yahoo,
    AlphaVantage,
    Stored,
    AverageCost,
}

impl PriceSource {
    pub fn parse_str(s: &str) -> Result<PriceSource> {
        match s {
            "yahoo" => Ok(PriceSource::Yahoo),
            "alphavantage" => Ok(PriceSource::AlphaVantage),
            "stored" => Ok(PriceSource::Stored),
            "average_cost" => Ok(PriceSource::AverageCost),
            _ => Err(anyhow::anyhow!("Unknown price source '{}'", s)),
        }
    }

    pub fn to_str(&self) -> &str {
        match self {
            PriceSource::Yahoo => "yahoo",
            PriceSource::AlphaVantage => "alphavantage",
            PriceSource::Stored => "stored",
            PriceSource::AverageCost => "average_cost",
        }
    }

    /// True when the price came from a live or stored market quote
    /// rather than the holding's own cost basis.
    pub fn is_market(&self) -> bool {
        !matches!(self, PriceSource::AverageCost)
    }
}
