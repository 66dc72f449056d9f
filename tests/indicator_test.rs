mod common_test_utils;
use common_test_utils::*;

use proptest::prelude::*;
use trading_analysis::indicator::ema::{Crossover, detect_crossover};
use trading_analysis::indicator::fibonacci::{FibLevel, Retracement};
use trading_analysis::indicator::{ATR, EMA, FibonacciLevels, IndicatorSet, KdjIndicator, MacdIndicator, RsiIndicator};

#[test]
fn test_ema_of_constant_series_is_constant() {
    for period in [9, 21, 50] {
        let ema = EMA::from_prices(&vec![42.5; period + 30], period);
        assert!(ema.values().iter().all(|&v| v == 42.5));
    }
    assert!(!EMA::from_prices(&[1.0, 2.0], 9).is_ready());
    assert_eq!(EMA::from_prices(&[1.0, 2.0], 9).get(), 0.0);
}

#[test]
fn test_atr_of_flat_series_is_zero() {
    let candles = create_flat_candles(40, 100.0);
    let atr = ATR::from_candles(&candles, 14);
    assert_eq!(atr.values().len(), 40 - 14 + 1);
    assert!(atr.values().iter().all(|&v| v == 0.0));
    assert!(!atr.is_high_volatility(1.5));
}

#[test]
fn test_fibonacci_retracement_uptrend() {
    let fib = FibonacciLevels::new(100.0, 50.0, true);
    assert!((fib.retracement.get(Retracement::R382) - 80.9).abs() < 1e-9);
    assert!((fib.retracement.get(Retracement::R500) - 75.0).abs() < 1e-9);
    assert!((fib.retracement.get(Retracement::R618) - 69.1).abs() < 1e-9);
    assert!((fib.extension.e1618 - 130.9).abs() < 1e-9);

    assert_eq!(
        fib.is_near_level(75.1, 0.005),
        Some(FibLevel::Retracement(Retracement::R500))
    );
    assert_eq!(fib.is_near_level(90.0, 0.001), None);
}

#[test]
fn test_rsi_neutral_without_movement() {
    let flat = RsiIndicator::from_closes(&[100.0; 30]);
    assert_eq!(flat.rsi6, 50.0);
    assert_eq!(flat.rsi14, 50.0);

    let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let rsi = RsiIndicator::from_closes(&rising);
    assert_eq!(rsi.rsi14, 100.0);
    assert!(rsi.is_overbought());

    assert_eq!(RsiIndicator::from_closes(&[1.0; 5]), RsiIndicator::default());
}

#[test]
fn test_macd_on_linear_uptrend() {
    // 선형 상승에서는 두 EMA의 지연이 일정해 DIF = (26 - 12) / 2 × 기울기
    let closes = closes(&create_uptrend_candles(60, 100.0, 1.0));
    let macd = MacdIndicator::from_closes(&closes);
    assert!((macd.dif - 7.0).abs() < 1e-6);
    assert!(macd.histogram.abs() < 1e-6);

    let short = MacdIndicator::from_closes(&closes[..20]);
    assert_eq!(short, MacdIndicator::default());
}

#[test]
fn test_golden_cross() {
    let mut prices = vec![100.0; 30];
    prices.extend([90.0, 85.0, 80.0, 120.0]);
    let fast = EMA::from_prices(&prices, 3);
    let slow = EMA::from_prices(&prices, 10);
    assert_eq!(detect_crossover(&fast, &slow), Crossover::Golden);
}

#[test]
fn test_indicator_set_on_short_input() {
    let candles = create_flat_candles(5, 100.0);
    let set = IndicatorSet::from_candles(&candles, 14, 50);
    assert_eq!(set.atr.value, 0.0);
    assert_eq!(set.ema.ema9, 0.0);
    assert_eq!(set.kdj, KdjIndicator::default());
}

proptest! {
    #[test]
    fn prop_quick_kdj_is_clamped(
        bars in prop::collection::vec((1.0f64..1000.0, 0.0f64..50.0, 0.0f64..50.0), 9..60),
    ) {
        let candles: Vec<TestCandle> = bars
            .iter()
            .enumerate()
            .map(|(i, &(close, up, down))| TestCandle::new(i as i64, close, close + up, close - down, close, 1.0))
            .collect();
        let kdj = KdjIndicator::quick(&candles);
        prop_assert!((0.0..=100.0).contains(&kdj.k));
        prop_assert!((0.0..=100.0).contains(&kdj.d));
        prop_assert!((-20.0..=120.0).contains(&kdj.j));
    }
}
