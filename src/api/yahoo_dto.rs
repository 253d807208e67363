use derive_getters::Getters;
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, Deserialize, Getters)]
pub struct YahooChartDto {
    chart: YahooChartEnvelopeDto,
}

#[derive(Clone, Debug, Deserialize, Getters)]
pub struct YahooChartEnvelopeDto {
    result: Option<Vec<YahooChartResultDto>>,
    error: Option<Value>,
}

#[derive(Clone, Debug, Deserialize, Getters)]
pub struct YahooChartResultDto {
    meta: YahooMetaDto,
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicatorsDto,
}

#[derive(Clone, Debug, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct YahooMetaDto {
    symbol: String,
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    regular_market_volume: Option<i64>,
    regular_market_time: Option<i64>,
}

#[derive(Clone, Debug, Deserialize, Getters)]
pub struct YahooIndicatorsDto {
    quote: Vec<YahooQuoteBlockDto>,
}

/// Parallel arrays aligned with the result's timestamps; entries are
/// null on days the exchange reported no trade.
#[derive(Clone, Debug, Deserialize, Getters)]
pub struct YahooQuoteBlockDto {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<i64>>>,
}
