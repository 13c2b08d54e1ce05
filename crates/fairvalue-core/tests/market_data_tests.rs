use std::sync::Arc;

use fairvalue_core::config::ProviderConfig;
use fairvalue_core::estimators::capm::{resolve_risk_free, FALLBACK_RISK_FREE_RATE};
use fairvalue_core::market_data::central_bank::CentralBankRate;
use fairvalue_core::market_data::http::ReqwestHttpClient;
use fairvalue_core::market_data::yahoo::YahooFinance;
use fairvalue_core::market_data::{
    fetch_market_facts, MarketDataProvider, RiskFreeRateProvider, Symbol,
};
use fairvalue_core::report::{build_report, evaluate};
use fairvalue_core::FairValueError;
use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

const CHART: &str = r#"{"chart":{"result":[{
    "meta":{"currency":"BRL"},
    "timestamp":[1729123200,1744848000,1760659200],
    "events":{"dividends":{"1744848000":{"amount":0.80,"date":1744848000}}},
    "indicators":{"quote":[{"close":[25.0,28.0,30.0]}]}
}],"error":null}}"#;

const BENCHMARK: &str = r#"{"chart":{"result":[{
    "meta":{"currency":"BRL"},
    "timestamp":[1729123200,1760659200],
    "indicators":{"quote":[{"close":[100000.0,115000.0]}]}
}],"error":null}}"#;

const QUOTE: &str = r#"{"quoteSummary":{"result":[{
    "price":{"regularMarketPrice":{"raw":30.0},"currency":"BRL"},
    "summaryDetail":{"beta":{"raw":0.9}},
    "defaultKeyStatistics":{"trailingEps":{"raw":4.0},"sharesOutstanding":{"raw":1000}}
}],"error":null}}"#;

const EARNINGS: &str = r#"{"quoteSummary":{"result":[{
    "incomeStatementHistory":{"incomeStatementHistory":[
        {"endDate":{"raw":1735603200},"netIncome":{"raw":1210}},
        {"endDate":{"raw":1703980800},"netIncome":{"raw":1100}},
        {"endDate":{"raw":1672444800},"netIncome":{"raw":1000}}
    ]}
}],"error":null}}"#;

fn config_for(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        yahoo_base_url: server.base_url(),
        yahoo_auth_url: None,
        risk_free_url: server.url("/rates/1178"),
        timeout_ms: 2_000,
        ..ProviderConfig::default()
    }
}

fn client(config: &ProviderConfig) -> Arc<ReqwestHttpClient> {
    Arc::new(ReqwestHttpClient::from_config(config).unwrap())
}

fn mount_yahoo(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET)
            .path("/v8/finance/chart/ABCD3.SA")
            .query_param("range", "5y");
        then.status(200).body(CHART);
    });
    server.mock(|when, then| {
        when.method(GET)
            .path_contains("/v8/finance/chart/")
            .path_contains("BVSP");
        then.status(200).body(BENCHMARK);
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/v10/finance/quoteSummary/ABCD3.SA")
            .query_param("modules", "price,summaryDetail,defaultKeyStatistics");
        then.status(200).body(QUOTE);
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/v10/finance/quoteSummary/ABCD3.SA")
            .query_param("modules", "incomeStatementHistory");
        then.status(200).body(EARNINGS);
    });
}

// ===========================================================================
// Risk-free rate
// ===========================================================================

#[test]
fn test_rate_server_value_is_used() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/rates/1178");
        then.status(200)
            .header("Content-Type", "application/json")
            .body(r#"[{"data":"16/10/2026","valor":"14,90"}]"#);
    });

    let config = config_for(&server);
    let provider = CentralBankRate::new(client(&config), config.risk_free_url.clone());
    let resolved = resolve_risk_free(provider.latest_rate());

    mock.assert();
    assert_eq!(resolved.rate, dec!(0.149));
    assert!(!resolved.is_fallback());
}

#[test]
fn test_rate_server_error_falls_back_to_exactly_0_105() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/rates/1178");
        then.status(500);
    });

    let config = config_for(&server);
    let provider = CentralBankRate::new(client(&config), config.risk_free_url.clone());
    let outcome = provider.latest_rate();
    assert!(matches!(outcome, Err(FairValueError::DataUnavailable(_))));

    let resolved = resolve_risk_free(outcome);
    mock.assert();
    assert_eq!(resolved.rate, dec!(0.105));
    assert_eq!(resolved.rate, FALLBACK_RISK_FREE_RATE);
    assert!(resolved.is_fallback());
}

#[test]
fn test_unreachable_rate_server_falls_back() {
    let config = ProviderConfig {
        risk_free_url: "http://127.0.0.1:9/unreachable".into(),
        timeout_ms: 500,
        ..ProviderConfig::default()
    };
    let provider = CentralBankRate::new(client(&config), config.risk_free_url.clone());
    let resolved = resolve_risk_free(provider.latest_rate());
    assert_eq!(resolved.rate, dec!(0.105));
}

// ===========================================================================
// Yahoo adapter
// ===========================================================================

#[test]
fn test_fetch_facts_from_mock_yahoo() {
    let server = MockServer::start();
    mount_yahoo(&server);
    let config = config_for(&server);
    let yahoo = YahooFinance::new(client(&config), &config);
    let symbol = Symbol::parse("abcd3", &config.exchange_suffix).unwrap();

    let facts = fetch_market_facts(&yahoo, &symbol).unwrap();
    assert_eq!(facts.symbol.as_str(), "ABCD3.SA");
    assert_eq!(facts.quote.price, Some(dec!(30)));
    assert_eq!(facts.quote.eps, Some(dec!(4)));
    assert_eq!(facts.quote.beta, Some(dec!(0.9)));
    assert_eq!(facts.prices.closes.len(), 3);
    assert_eq!(facts.dividends.events.len(), 1);
    assert_eq!(facts.benchmark.levels.len(), 2);
    // periods come back newest first and are sorted on construction
    let earnings = facts.earnings.as_ref().unwrap();
    assert_eq!(earnings.periods.first().unwrap().net_income, Some(dec!(1000)));
    assert_eq!(earnings.periods.last().unwrap().net_income, Some(dec!(1210)));
}

#[test]
fn test_full_pipeline_against_mock_servers() {
    let server = MockServer::start();
    mount_yahoo(&server);
    server.mock(|when, then| {
        when.method(GET).path("/rates/1178");
        then.status(200).body(r#"[{"data":"16/10/2026","valor":"10,00"}]"#);
    });

    let config = config_for(&server);
    let http = client(&config);
    let yahoo = YahooFinance::new(http.clone(), &config);
    let rates = CentralBankRate::new(http, config.risk_free_url.clone());

    let symbol = Symbol::parse("ABCD3", &config.exchange_suffix).unwrap();
    let facts = fetch_market_facts(&yahoo, &symbol).unwrap();
    let report = build_report(
        &facts,
        resolve_risk_free(rates.latest_rate()),
        config.dividend_yield_years,
    );

    // 0.10 + 0.9 * (0.15 - 0.10)
    assert_eq!(report.capm.as_ref().unwrap().discount_rate, dec!(0.145));
    // 1000 -> 1210 over two periods
    let growth = report.earnings_growth.unwrap();
    assert!((growth - dec!(0.1)).abs() < dec!(0.000001), "growth {growth}");
    // 0.80 / (4 * 1000)
    assert_eq!(report.payout_estimate, Some(dec!(0.0002)));

    let out = evaluate(&facts, &report, report.default_parameters(), None).unwrap();
    assert!(out.result.fair_value > rust_decimal::Decimal::ZERO);
}

#[test]
fn test_unknown_ticker_is_data_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path_contains("/v10/finance/quoteSummary/");
        then.status(404).body(
            r#"{"quoteSummary":{"result":null,"error":{"code":"Not Found","description":"Quote not found"}}}"#,
        );
    });
    let config = config_for(&server);
    let yahoo = YahooFinance::new(client(&config), &config);
    let symbol = Symbol::parse("ZZZZ9", &config.exchange_suffix).unwrap();

    match yahoo.quote(&symbol) {
        Err(FairValueError::DataUnavailable(_)) => {}
        other => panic!("expected DataUnavailable, got {other:?}"),
    }
}

#[test]
fn test_crumb_is_sent_when_handshake_succeeds() {
    let server = MockServer::start();
    let cookie = server.mock(|when, then| {
        when.method(GET).path("/consent");
        then.status(404).header("Set-Cookie", "A3=session; Path=/");
    });
    let crumb = server.mock(|when, then| {
        when.method(GET).path("/v1/test/getcrumb");
        then.status(200).body("AbCdEf12");
    });
    let summary = server.mock(|when, then| {
        when.method(GET)
            .path("/v10/finance/quoteSummary/ABCD3.SA")
            .query_param("crumb", "AbCdEf12");
        then.status(200).body(QUOTE);
    });

    let config = ProviderConfig {
        yahoo_auth_url: Some(server.url("/consent")),
        ..config_for(&server)
    };
    let yahoo = YahooFinance::new(client(&config), &config);
    let symbol = Symbol::parse("ABCD3", ".SA").unwrap();
    yahoo.quote(&symbol).unwrap();
    yahoo.quote(&symbol).unwrap();

    cookie.assert_hits(1);
    crumb.assert_hits(1);
    summary.assert_hits(2);
}
