use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::instruments::Market;
use crate::market_data::market_data_errors::MarketDataError;
use crate::market_data::market_data_model::{DataSource, Quote};
use crate::market_data::market_data_traits::QuoteProvider;

const BASE_URL: &str = "https://mis.twse.com.tw/stock/api/getStockInfo.jsp";

/// Realtime quotes for TWSE/TPEx listed securities via the exchange's MIS
/// endpoint.
pub struct TwseProvider {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct StockInfoResponse {
    #[serde(rename = "msgArray", default)]
    msg_array: Vec<StockInfoItem>,
}

#[derive(Debug, Deserialize, Default)]
struct StockInfoItem {
    /// Last traded price; "-" before the first trade of the session
    #[serde(default)]
    z: String,
    /// Previous session close
    #[serde(default)]
    y: String,
    /// Security name
    #[serde(default)]
    n: String,
    /// Best bid prices, "_"-separated
    #[serde(default)]
    b: String,
}

impl TwseProvider {
    pub fn new() -> Self {
        TwseProvider {
            client: Client::new(),
        }
    }

    /// Maps a symbol to the MIS exchange channel:
    /// "2330.TW" / "2330" -> "tse_2330.tw", "3105.TWO" -> "otc_3105.tw".
    fn exchange_channel(symbol: &str) -> String {
        if let Some(code) = symbol.strip_suffix(".TWO") {
            format!("otc_{}.tw", code.to_lowercase())
        } else if let Some(code) = symbol.strip_suffix(".TW") {
            format!("tse_{}.tw", code.to_lowercase())
        } else {
            format!("tse_{}.tw", symbol.to_lowercase())
        }
    }

    fn parse_price(raw: &str) -> Option<Decimal> {
        let price = raw.trim().parse::<Decimal>().ok()?;
        if price > Decimal::ZERO {
            Some(price)
        } else {
            None
        }
    }

    /// Resolves the quote out of one MIS record. The last traded price is a
    /// dash until the first trade of the session; the best bid, then the
    /// prior close, stand in for it.
    fn quote_from_item(symbol: &str, item: &StockInfoItem) -> Result<Quote, MarketDataError> {
        let prev_close = Self::parse_price(&item.y).unwrap_or(Decimal::ZERO);

        let price = Self::parse_price(&item.z)
            .or_else(|| item.b.split('_').find_map(|bid| Self::parse_price(bid)))
            .or_else(|| Self::parse_price(&item.y))
            .ok_or_else(|| {
                MarketDataError::InvalidData(format!("No usable price for {}", symbol))
            })?;

        let display_name = if item.n.trim().is_empty() {
            None
        } else {
            Some(item.n.trim().to_string())
        };

        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            prev_close,
            display_name,
            currency: Market::Domestic.currency().to_string(),
            timestamp: Utc::now(),
            data_source: DataSource::Twse,
        })
    }
}

impl Default for TwseProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for TwseProvider {
    fn name(&self) -> &'static str {
        "TWSE"
    }

    fn priority(&self) -> u8 {
        1
    }

    fn supports(&self, market: Market) -> bool {
        market == Market::Domestic
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let channel = Self::exchange_channel(symbol);
        let url = reqwest::Url::parse_with_params(
            BASE_URL,
            &[
                ("ex_ch", channel.as_str()),
                ("json", "1"),
                ("delay", "0"),
            ],
        )
        .map_err(|e| MarketDataError::ProviderError(format!("Failed to build URL: {}", e)))?;

        debug!("Fetching TWSE quote for {} via {}", symbol, channel);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(MarketDataError::ProviderError(format!(
                "TWSE MIS returned status {}",
                response.status()
            )));
        }

        let body: StockInfoResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::ParsingError(e.to_string()))?;

        let item = body
            .msg_array
            .first()
            .ok_or_else(|| MarketDataError::NotFound(format!("No MIS record for {}", symbol)))?;

        Self::quote_from_item(symbol, item)
    }
}
