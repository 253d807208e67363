use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;

use super::av_dto::{AvDailyBarDto, AvGlobalQuoteDto};
use super::provider::PriceProvider;
use super::utils::{make_request, parse_response_object};
use crate::models::{Candle, Quote};

const BASE_URL: &str = "https://www.alphavantage.co";

/// Free tier allows 5 calls per minute.
const MIN_INTERVAL: Duration = Duration::from_secs(12);

/// Secondary quote source. Reliable but heavily rate limited, so the
/// resolver only reaches it when the primary fails.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }

    async fn query(&self, params: &str) -> Result<Value> {
        let params = format!("{}&apikey={}", params, self.api_key);
        let res = make_request(&self.client, BASE_URL, "query", &params).await?;

        // The API reports problems inside a 200 response.
        if let Some(message) = res.get("Error Message").and_then(Value::as_str) {
            return Err(anyhow::anyhow!("Alpha Vantage error: {}", message));
        }
        if let Some(note) = res.get("Note").and_then(Value::as_str) {
            return Err(anyhow::anyhow!("Alpha Vantage throttled: {}", note));
        }

        Ok(res)
    }
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        "alphavantage"
    }

    fn min_interval(&self) -> Duration {
        MIN_INTERVAL
    }

    async fn current_quote(&self, symbol: &str) -> Result<Quote> {
        let params = format!("function=GLOBAL_QUOTE&symbol={}", symbol);
        let res = self.query(&params).await?;

        let global_quote = res
            .get("Global Quote")
            .cloned()
            .with_context(|| format!("No 'Global Quote' in response for {}", symbol))?;

        let dto = parse_response_object::<AvGlobalQuoteDto>(
            global_quote,
            &format!("No quote results for symbol {}", symbol),
        )?;

        dto.to_quote()
    }

    async fn daily_history(&self, symbol: &str, start: NaiveDate) -> Result<Vec<Candle>> {
        let params = format!("function=TIME_SERIES_DAILY&symbol={}&outputsize=full", symbol);
        let res = self.query(&params).await?;

        let series = res
            .get("Time Series (Daily)")
            .cloned()
            .with_context(|| format!("No 'Time Series (Daily)' in response for {}", symbol))?;

        let bars: HashMap<String, AvDailyBarDto> = serde_json::from_value(series)
            .with_context(|| format!("Malformed daily series for {}", symbol))?;

        let mut candles = Vec::with_capacity(bars.len());
        for (date_str, bar) in bars {
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .with_context(|| format!("Unparseable series date '{}'", date_str))?;
            if date < start {
                continue;
            }
            candles.push(bar.to_candle(date)?);
        }
        candles.sort_by_key(|candle| *candle.date());

        Ok(candles)
    }
}
