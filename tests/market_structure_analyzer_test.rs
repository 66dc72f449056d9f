mod common_test_utils;
use common_test_utils::*;

use trading_analysis::analysis::MarketAnalyzer;
use trading_analysis::analyzer::market_structure_analyzer::{Signal, find_confluence};
use trading_analysis::analyzer::{SRLevel, SRLevels};
use trading_analysis::candle_series::CandleSeries;
use trading_analysis::indicator::{EmaIndicator, IndicatorSet};
use trading_analysis::model::TrendDirection;

fn bare_indicators() -> IndicatorSet {
    let mut indicators = IndicatorSet::from_candles(&create_flat_candles(30, 100.0), 14, 50);
    indicators.ema = EmaIndicator::default();
    indicators.fibonacci = None;
    indicators
}

fn support_at(price: f64) -> SRLevels {
    SRLevels {
        resistance: Vec::new(),
        support: vec![SRLevel { price, strength: 0.8 }],
    }
}

#[test]
fn test_confluence_zone_needs_two_factors() {
    let mut indicators = bare_indicators();
    indicators.ema.ema50 = 95.2;

    let confluence = find_confluence(100.0, &indicators, &support_at(95.0));
    assert_eq!(confluence.confluence_zones.len(), 1);
    let zone = &confluence.confluence_zones[0];
    assert_eq!(zone.factors, vec!["Support".to_string(), "EMA50".to_string()]);
    assert_eq!(zone.price_range, [95.0, 95.2]);

    // EMA50를 제거하면 요인이 하나만 남아 구간도 사라짐
    indicators.ema.ema50 = 0.0;
    let confluence = find_confluence(100.0, &indicators, &support_at(95.0));
    assert!(confluence.confluence_zones.is_empty());
    let nearest = confluence.nearest_support.unwrap();
    assert_eq!(nearest.price, 95.0);
    assert_eq!(nearest.factors, vec!["Support".to_string()]);
}

#[test]
fn test_distant_levels_do_not_merge() {
    let mut indicators = bare_indicators();
    indicators.ema.ema50 = 97.0;

    let confluence = find_confluence(100.0, &indicators, &support_at(95.0));
    assert!(confluence.confluence_zones.is_empty());
    assert_eq!(confluence.nearest_support.unwrap().price, 97.0);
    assert!(confluence.nearest_resistance.is_none());
}

#[test]
fn test_rising_series_improves_quality_over_flat() {
    let analyzer = MarketAnalyzer::default();
    let flat = analyzer
        .analyze("ETHUSDT", "1d", &CandleSeries::new(create_flat_candles(30, 100.0)))
        .unwrap();
    let rising = analyzer
        .analyze(
            "ETHUSDT",
            "1d",
            &CandleSeries::new(create_consolidation_breakout_candles(60)),
        )
        .unwrap();

    assert_eq!(flat.trend.direction, TrendDirection::Sideways);
    assert_eq!(flat.market_structure.trend_confirmation.ema_alignment, Signal::Neutral);

    let confirmation = &rising.market_structure.trend_confirmation;
    assert_eq!(confirmation.ema_alignment, Signal::Bullish);
    assert!(rising.indicators.macd.histogram > 0.0);
    assert!(
        rising.market_structure.market_quality.overall_score > flat.market_structure.market_quality.overall_score
    );
    assert!(!rising.market_structure.structure_break);
}

#[test]
fn test_downtrend_ema_alignment_is_bearish() {
    let analysis = MarketAnalyzer::default()
        .analyze("ETHUSDT", "1d", &CandleSeries::new(create_downtrend_candles(60, 200.0, 1.0)))
        .unwrap();
    assert_eq!(analysis.market_structure.trend_confirmation.ema_alignment, Signal::Bearish);
    assert!(analysis.indicators.macd.dif < 0.0);
}
