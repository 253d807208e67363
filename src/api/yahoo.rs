use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal_macros::dec;

use super::provider::PriceProvider;
use super::utils::make_request;
use super::yahoo_dto::{YahooChartDto, YahooChartResultDto};
use crate::models::{Candle, PriceSource, Quote};

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Primary quote source: no API key, generous rate limits, current and
/// historical prices from the same chart endpoint.
pub struct YahooProvider {
    client: Client,
}

impl YahooProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get_chart(&self, symbol: &str, range: &str) -> Result<YahooChartResultDto> {
        let params = format!("range={}&interval=1d", range);
        let res = make_request(&self.client, BASE_URL, symbol, &params).await?;

        let dto: YahooChartDto = serde_json::from_value(res)
            .with_context(|| format!("Malformed chart response for {}", symbol))?;

        if let Some(error) = dto.chart().error() {
            return Err(anyhow::anyhow!("Yahoo chart error for {}: {}", symbol, error));
        }

        dto.chart()
            .result()
            .as_ref()
            .and_then(|results| results.first())
            .cloned()
            .with_context(|| format!("Empty chart result for {}", symbol))
    }
}

#[async_trait]
impl PriceProvider for YahooProvider {
    fn id(&self) -> &'static str {
        "yahoo"
    }

    fn min_interval(&self) -> Duration {
        MIN_INTERVAL
    }

    async fn current_quote(&self, symbol: &str) -> Result<Quote> {
        let result = self.get_chart(symbol, "1d").await?;
        let meta = result.meta();

        let price = (*meta.regular_market_price())
            .and_then(Decimal::from_f64)
            .with_context(|| format!("No market price in chart meta for {}", symbol))?;
        let previous_close = (*meta.chart_previous_close())
            .and_then(Decimal::from_f64)
            .unwrap_or_default();
        let change = price - previous_close;
        let change_percent = if previous_close.is_zero() {
            Decimal::ZERO
        } else {
            change / previous_close * dec!(100)
        };
        let as_of = (*meta.regular_market_time())
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.date_naive())
            .unwrap_or_else(|| Local::now().date_naive());

        Ok(Quote::new(
            meta.symbol().clone(),
            price,
            previous_close,
            change,
            change_percent,
            (*meta.regular_market_volume()).unwrap_or(0),
            as_of,
            PriceSource::Yahoo,
        ))
    }

    async fn daily_history(&self, symbol: &str, start: NaiveDate) -> Result<Vec<Candle>> {
        let result = self.get_chart(symbol, "1y").await?;

        let timestamps = result
            .timestamp()
            .as_ref()
            .with_context(|| format!("No timestamps in chart for {}", symbol))?;
        let block = result
            .indicators()
            .quote()
            .first()
            .with_context(|| format!("No quote block in chart for {}", symbol))?;

        let series = |values: &Option<Vec<Option<f64>>>, index: usize| -> Option<f64> {
            values.as_ref().and_then(|v| v.get(index).copied().flatten())
        };

        let mut candles = Vec::with_capacity(timestamps.len());
        for (index, ts) in timestamps.iter().enumerate() {
            let Some(date) = DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()) else {
                continue;
            };
            if date < start {
                continue;
            }
            // A null close means the exchange reported no trade that day.
            let Some(close) = series(block.close(), index).and_then(Decimal::from_f64) else {
                continue;
            };

            candles.push(Candle::new(
                date,
                series(block.open(), index)
                    .and_then(Decimal::from_f64)
                    .unwrap_or(close),
                series(block.high(), index)
                    .and_then(Decimal::from_f64)
                    .unwrap_or(close),
                series(block.low(), index)
                    .and_then(Decimal::from_f64)
                    .unwrap_or(close),
                close,
                block
                    .volume()
                    .as_ref()
                    .and_then(|v| v.get(index).copied().flatten())
                    .unwrap_or_default(),
            ));
        }
        candles.sort_by_key(|candle| *candle.date());

        Ok(candles)
    }
}
