use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::valuation_service::{ValuationService, ValuationServiceTrait};
use crate::errors::{Error, Result};
use crate::fx::fx_service::make_fx_symbol;
use crate::fx::{FxError, FxServiceTrait};
use crate::ledger::{Ledger, Lot, Position, TradeKind};
use crate::market_data::{DataSource, MarketDataError, MarketDataServiceTrait, Quote};

// --- Mocks ---

struct MockMarketData {
    quotes: HashMap<String, Quote>,
}

impl MockMarketData {
    fn new() -> Self {
        MockMarketData {
            quotes: HashMap::new(),
        }
    }

    fn with_quote(mut self, symbol: &str, price: Decimal, prev_close: Decimal) -> Self {
        self.quotes.insert(
            symbol.to_string(),
            Quote {
                symbol: symbol.to_string(),
                price,
                prev_close,
                display_name: None,
                currency: "TWD".to_string(),
                timestamp: Utc::now(),
                data_source: DataSource::Twse,
            },
        );
        self
    }

    fn with_named_quote(
        mut self,
        symbol: &str,
        name: &str,
        price: Decimal,
        prev_close: Decimal,
    ) -> Self {
        self.quotes.insert(
            symbol.to_string(),
            Quote {
                symbol: symbol.to_string(),
                price,
                prev_close,
                display_name: Some(name.to_string()),
                currency: "TWD".to_string(),
                timestamp: Utc::now(),
                data_source: DataSource::Twse,
            },
        );
        self
    }
}

#[async_trait]
impl MarketDataServiceTrait for MockMarketData {
    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote> {
        self.quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| Error::MarketData(MarketDataError::NotFound(symbol.to_string())))
    }
}

struct MockFxService {
    rates: HashMap<String, Decimal>,
}

impl MockFxService {
    fn new() -> Self {
        MockFxService {
            rates: HashMap::new(),
        }
    }

    fn with_rate(from: &str, to: &str, rate: Decimal) -> Self {
        let mut service = Self::new();
        service.rates.insert(make_fx_symbol(from, to), rate);
        service
    }
}

#[async_trait]
impl FxServiceTrait for MockFxService {
    fn get_latest_exchange_rate(&self, from: &str, to: &str) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        self.rates
            .get(&make_fx_symbol(from, to))
            .copied()
            .ok_or_else(|| FxError::RateNotFound(format!("{}/{}", from, to)).into())
    }

    fn rate_or_default(&self, from: &str, to: &str) -> Decimal {
        self.get_latest_exchange_rate(from, to)
            .unwrap_or(Decimal::ONE)
    }

    fn set_rate(&self, _from: &str, _to: &str, _rate: Decimal) -> Result<()> {
        Err(Error::Unexpected("MockFxService::set_rate not implemented".to_string()))
    }

    async fn refresh_rates(&self) -> Result<()> {
        Ok(())
    }
}

// --- Helpers ---

fn service(market_data: MockMarketData, fx: MockFxService) -> ValuationService {
    ValuationService::new(Arc::new(market_data), Arc::new(fx))
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
}

fn lot(price: Decimal, shares: Decimal, debt: Decimal) -> Lot {
    Lot {
        id: format!("lot-{}", shares),
        purchase_date: day(1),
        unit_price: price,
        share_count: shares,
        trade_kind: if debt.is_zero() {
            TradeKind::Cash
        } else {
            TradeKind::Margin
        },
        debt_amount: debt,
    }
}

fn ledger_with_position(symbol: &str, lots: Vec<Lot>) -> Ledger {
    let mut ledger = Ledger::new("main".to_string());
    let mut position = Position::new(symbol.to_string());
    for l in lots {
        position.add_lot(l);
    }
    ledger.positions.insert(symbol.to_string(), position);
    ledger
}

// --- Valuation ---

#[tokio::test]
async fn test_domestic_position_valued_at_live_price() {
    let market_data = MockMarketData::new().with_quote("2330.TW", dec!(600), dec!(590));
    let mut ledger = ledger_with_position(
        "2330.TW",
        vec![lot(dec!(500), dec!(1000), Decimal::ZERO)],
    );
    ledger.cash_balance = dec!(100000);
    ledger.principal = dec!(600000);

    let report = service(market_data, MockFxService::new())
        .calculate(&mut ledger)
        .await
        .unwrap();

    assert_eq!(report.positions.len(), 1);
    let row = &report.positions[0];
    assert_eq!(row.market_value, dec!(600000));
    assert_eq!(row.cost_value, dec!(500000));
    assert_eq!(row.unrealized_pnl, dec!(100000));
    assert_eq!(row.unrealized_roi_pct, dec!(20));
    assert_eq!(row.day_pnl, dec!(10000));
    assert!(!row.is_stale);
    assert_eq!(report.net_asset_value, dec!(700000));
    assert_eq!(report.total_day_pnl, dec!(10000));
}

#[tokio::test]
async fn test_foreign_position_converted_at_fx_rate() {
    let market_data = MockMarketData::new().with_quote("AAPL", dec!(200), dec!(200));
    let fx = MockFxService::with_rate("USD", "TWD", dec!(32));
    let mut ledger =
        ledger_with_position("AAPL", vec![lot(dec!(150), dec!(10), Decimal::ZERO)]);

    let report = service(market_data, fx).calculate(&mut ledger).await.unwrap();

    let row = &report.positions[0];
    assert_eq!(row.fx_rate, dec!(32));
    assert_eq!(row.market_value, dec!(64000));
    assert_eq!(row.cost_value, dec!(48000));
    assert_eq!(row.unrealized_pnl, dec!(16000));
}

#[tokio::test]
async fn test_failed_quote_degrades_position_not_report() {
    // Three symbols, the middle one has no quote. The report still comes
    // back with all three rows, the failing one priced at cost and flagged.
    let market_data = MockMarketData::new()
        .with_quote("2330.TW", dec!(600), dec!(600))
        .with_quote("2882.TW", dec!(70), dec!(70));
    let mut ledger = Ledger::new("main".to_string());
    for (symbol, price, shares) in [
        ("2330.TW", dec!(500), dec!(1000)),
        ("2454.TW", dec!(900), dec!(100)),
        ("2882.TW", dec!(60), dec!(2000)),
    ] {
        let mut position = Position::new(symbol.to_string());
        position.add_lot(lot(price, shares, Decimal::ZERO));
        ledger.positions.insert(symbol.to_string(), position);
    }

    let report = service(market_data, MockFxService::new())
        .calculate(&mut ledger)
        .await
        .unwrap();

    assert_eq!(report.positions.len(), 3);
    let stale = report
        .positions
        .iter()
        .find(|row| row.symbol == "2454.TW")
        .unwrap();
    assert!(stale.is_stale);
    assert_eq!(stale.price, dec!(900));
    assert_eq!(stale.unrealized_pnl, Decimal::ZERO);
    assert_eq!(stale.day_pnl, Decimal::ZERO);
    assert!(report.positions.iter().filter(|row| !row.is_stale).count() == 2);
}

#[tokio::test]
async fn test_stale_position_prefers_last_known_price_over_cost() {
    let mut ledger =
        ledger_with_position("2330.TW", vec![lot(dec!(500), dec!(1000), Decimal::ZERO)]);
    ledger
        .positions
        .get_mut("2330.TW")
        .unwrap()
        .update_last_quote(dec!(580), Decimal::ZERO, Decimal::ZERO);

    let report = service(MockMarketData::new(), MockFxService::new())
        .calculate(&mut ledger)
        .await
        .unwrap();

    let row = &report.positions[0];
    assert!(row.is_stale);
    assert_eq!(row.price, dec!(580));
    assert_eq!(row.market_value, dec!(580000));
}

#[tokio::test]
async fn test_display_name_adopted_from_quote() {
    let market_data =
        MockMarketData::new().with_named_quote("2330.TW", "台積電", dec!(600), dec!(600));
    let mut ledger =
        ledger_with_position("2330.TW", vec![lot(dec!(500), dec!(1000), Decimal::ZERO)]);

    let report = service(market_data, MockFxService::new())
        .calculate(&mut ledger)
        .await
        .unwrap();

    assert_eq!(report.positions[0].display_name, "台積電");
    assert_eq!(
        ledger.positions.get("2330.TW").unwrap().display_name,
        "台積電"
    );
}

#[tokio::test]
async fn test_existing_display_name_survives_unnamed_quote() {
    let market_data = MockMarketData::new().with_quote("2330.TW", dec!(600), dec!(600));
    let mut ledger =
        ledger_with_position("2330.TW", vec![lot(dec!(500), dec!(1000), Decimal::ZERO)]);
    ledger
        .positions
        .get_mut("2330.TW")
        .unwrap()
        .display_name = "台積電".to_string();

    let report = service(market_data, MockFxService::new())
        .calculate(&mut ledger)
        .await
        .unwrap();

    assert_eq!(report.positions[0].display_name, "台積電");
}

#[tokio::test]
async fn test_margin_debt_reduces_nav_and_roi_denominator() {
    // 500k of stock financed with 200k cash and 300k debt, valued flat.
    let market_data = MockMarketData::new().with_quote("2330.TW", dec!(550), dec!(550));
    let mut ledger =
        ledger_with_position("2330.TW", vec![lot(dec!(500), dec!(1000), dec!(300000))]);
    ledger.cash_balance = dec!(100000);
    ledger.principal = dec!(300000);

    let report = service(market_data, MockFxService::new())
        .calculate(&mut ledger)
        .await
        .unwrap();

    let row = &report.positions[0];
    assert_eq!(row.debt, dec!(300000));
    // 50k gain on 200k of own capital
    assert_eq!(row.unrealized_roi_pct, dec!(25));
    assert_eq!(report.total_debt, dec!(300000));
    // 100k cash + 550k market value - 300k debt
    assert_eq!(report.net_asset_value, dec!(350000));
}

#[tokio::test]
async fn test_weights_sum_to_one_hundred() {
    let market_data = MockMarketData::new()
        .with_quote("2330.TW", dec!(600), dec!(600))
        .with_quote("2882.TW", dec!(100), dec!(100));
    let mut ledger = Ledger::new("main".to_string());
    for (symbol, price, shares) in [("2330.TW", dec!(600), dec!(1000)), ("2882.TW", dec!(100), dec!(2000))] {
        let mut position = Position::new(symbol.to_string());
        position.add_lot(lot(price, shares, Decimal::ZERO));
        ledger.positions.insert(symbol.to_string(), position);
    }

    let report = service(market_data, MockFxService::new())
        .calculate(&mut ledger)
        .await
        .unwrap();

    assert_eq!(report.total_market_value, dec!(800000));
    let weight_total: Decimal = report.positions.iter().map(|row| row.weight_pct).sum();
    assert_eq!(weight_total, dec!(100));
    let tsmc = report
        .positions
        .iter()
        .find(|row| row.symbol == "2330.TW")
        .unwrap();
    assert_eq!(tsmc.weight_pct, dec!(75));
}

#[tokio::test]
async fn test_roi_zero_when_principal_is_zero() {
    let market_data = MockMarketData::new().with_quote("2330.TW", dec!(600), dec!(600));
    let mut ledger =
        ledger_with_position("2330.TW", vec![lot(dec!(500), dec!(1000), Decimal::ZERO)]);
    assert_eq!(ledger.principal, Decimal::ZERO);

    let report = service(market_data, MockFxService::new())
        .calculate(&mut ledger)
        .await
        .unwrap();

    assert_eq!(report.roi_pct, Decimal::ZERO);
}

#[tokio::test]
async fn test_empty_ledger_yields_cash_only_report() {
    let mut ledger = Ledger::new("main".to_string());
    ledger.cash_balance = dec!(250000);
    ledger.principal = dec!(250000);

    let report = service(MockMarketData::new(), MockFxService::new())
        .calculate(&mut ledger)
        .await
        .unwrap();

    assert!(report.positions.is_empty());
    assert_eq!(report.total_market_value, Decimal::ZERO);
    assert_eq!(report.net_asset_value, dec!(250000));
}

#[tokio::test]
async fn test_non_positive_quote_price_treated_as_stale() {
    let market_data = MockMarketData::new().with_quote("2330.TW", Decimal::ZERO, dec!(600));
    let mut ledger =
        ledger_with_position("2330.TW", vec![lot(dec!(500), dec!(1000), Decimal::ZERO)]);

    let report = service(market_data, MockFxService::new())
        .calculate(&mut ledger)
        .await
        .unwrap();

    let row = &report.positions[0];
    assert!(row.is_stale);
    assert_eq!(row.price, dec!(500));
}

#[tokio::test]
async fn test_fresh_quote_written_back_onto_position() {
    let market_data = MockMarketData::new().with_quote("2330.TW", dec!(610), dec!(600));
    let mut ledger =
        ledger_with_position("2330.TW", vec![lot(dec!(500), dec!(1000), Decimal::ZERO)]);

    service(market_data, MockFxService::new())
        .calculate(&mut ledger)
        .await
        .unwrap();

    let position = ledger.positions.get("2330.TW").unwrap();
    assert_eq!(position.last_price, dec!(610));
    assert_eq!(position.last_change, dec!(10));
}
