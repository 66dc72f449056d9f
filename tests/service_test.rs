mod common_test_utils;
use common_test_utils::*;

use std::sync::Arc;
use trading_analysis::AnalysisError;
use trading_analysis::config_loader::{AnalysisConfig, ConfigFormat, ConfigLoader};
use trading_analysis::market_data::JsonFileMarketData;
use trading_analysis::model::{CandleInterval, OhlcvCandle};
use trading_analysis::repository::InMemoryOpportunityRepository;
use trading_analysis::service::MarketAnalysisService;

fn to_ohlcv(candles: &[TestCandle]) -> Vec<OhlcvCandle> {
    candles
        .iter()
        .map(|c| OhlcvCandle::new(c.timestamp, c.open, c.high, c.low, c.close, c.volume))
        .collect()
}

fn write_candles(dir: &std::path::Path, symbol: &str, interval: CandleInterval, candles: &[TestCandle]) {
    let source = JsonFileMarketData::new(dir);
    let json = serde_json::to_string(&to_ohlcv(candles)).unwrap();
    std::fs::write(source.path_for(symbol, interval), json).unwrap();
}

#[tokio::test]
async fn test_file_backed_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    write_candles(dir.path(), "ETHUSDT", CandleInterval::Day1, &create_consolidation_breakout_candles(80));

    let config_path = dir.path().join("analysis.toml");
    std::fs::write(&config_path, "min_risk_reward = 2.5\ndefault_limit = 60\n\n[levels]\nmax_levels = 3\n").unwrap();
    let config: AnalysisConfig = ConfigLoader::load_from_file(&config_path, ConfigFormat::Auto).unwrap();
    assert_eq!(config.default_limit, 60);

    let service = MarketAnalysisService::new(
        JsonFileMarketData::new(dir.path()),
        Arc::new(InMemoryOpportunityRepository::new()),
        config,
    );

    // 범위를 벗어난 limit → 기본 60개
    let analysis = service.analyze("ETHUSDT", "1d", 1_000).await.unwrap();
    assert_eq!(analysis.timestamp, 79 * DAY_MS);
    assert!(analysis.sr_levels.support.len() <= 3);
    assert!(analysis.sr_levels.resistance.len() <= 3);

    let response = service.opportunities("ETHUSDT", "1d", 60, None).await.unwrap();
    assert_eq!(response.summary.total_count, response.opportunities.len());
    assert!(response.opportunities.iter().all(|o| o.risk_reward.ratio >= 2.5));

    let json = serde_json::to_value(&response).unwrap();
    assert!(json["summary"]["total_opportunities"].is_u64());
}

#[tokio::test]
async fn test_missing_data_propagates_cause() {
    let dir = tempfile::tempdir().unwrap();
    let service = MarketAnalysisService::new(
        JsonFileMarketData::new(dir.path()),
        Arc::new(InMemoryOpportunityRepository::new()),
        AnalysisConfig::default(),
    );

    let err = service.analyze("BTCUSDT", "4h", 100).await.unwrap_err();
    match err {
        AnalysisError::MarketData { symbol, .. } => assert_eq!(symbol, "BTCUSDT"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_short_history_is_insufficient() {
    let dir = tempfile::tempdir().unwrap();
    write_candles(dir.path(), "ETHUSDT", CandleInterval::Hour1, &create_uptrend_candles(15, 100.0, 1.0));
    let service = MarketAnalysisService::new(
        JsonFileMarketData::new(dir.path()),
        Arc::new(InMemoryOpportunityRepository::new()),
        AnalysisConfig::default(),
    );

    let err = service.analyze("ETHUSDT", "1h", 100).await.unwrap_err();
    assert!(matches!(err, AnalysisError::InsufficientData { required: 20, actual: 15 }));
}
