//! 분석 파이프라인 진입점
//!
//! 캔들 시계열 → 지표 → 추세 → 지지/저항 → 패턴 → 시장 구조 순서로
//! 한 번의 분석 결과를 만듭니다. 호출 간에 공유되는 상태는 없습니다.

use crate::analyzer::{
    CandlestickPattern, MarketStructure, MarketStructureAnalyzer, SRLevels, SupportResistanceAnalyzer,
    TrendAnalysis, TrendAnalyzer, identify_patterns,
};
use crate::candle_series::CandleSeries;
use crate::config_loader::AnalysisConfig;
use crate::error::AnalysisError;
use crate::indicator::IndicatorSet;
use crate::model::{Candle, CandleInterval};
use serde::{Deserialize, Serialize};

/// 한 번의 분석 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub symbol: String,
    pub interval: CandleInterval,
    /// 마지막 캔들 타임스탬프 (밀리초)
    pub timestamp: i64,
    pub trend: TrendAnalysis,
    pub indicators: IndicatorSet,
    pub sr_levels: SRLevels,
    pub candlestick_patterns: Vec<CandlestickPattern>,
    pub market_structure: MarketStructure,
}

impl AnalysisResult {
    /// 신뢰도 기준을 넘는 첫 상승 패턴
    pub fn bullish_pattern(&self, min_reliability: f64) -> Option<&CandlestickPattern> {
        self.candlestick_patterns
            .iter()
            .find(|p| p.is_bullish() && p.reliability > min_reliability)
    }

    /// 신뢰도 기준을 넘는 첫 하락 패턴
    pub fn bearish_pattern(&self, min_reliability: f64) -> Option<&CandlestickPattern> {
        self.candlestick_patterns
            .iter()
            .find(|p| p.is_bearish() && p.reliability > min_reliability)
    }
}

/// 시장 분석기
#[derive(Debug, Clone)]
pub struct MarketAnalyzer {
    config: AnalysisConfig,
    trend_analyzer: TrendAnalyzer,
    sr_analyzer: SupportResistanceAnalyzer,
    structure_analyzer: MarketStructureAnalyzer,
}

impl Default for MarketAnalyzer {
    fn default() -> Self {
        MarketAnalyzer::new(AnalysisConfig::default())
    }
}

impl MarketAnalyzer {
    pub fn new(config: AnalysisConfig) -> MarketAnalyzer {
        MarketAnalyzer {
            trend_analyzer: TrendAnalyzer::new(),
            sr_analyzer: SupportResistanceAnalyzer::new(config.levels.clone(), config.atr_period),
            structure_analyzer: MarketStructureAnalyzer::new(config.atr_period),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// 전체 분석 실행
    ///
    /// # Arguments
    /// * `symbol` - 심볼 (예: "ETHUSDT")
    /// * `interval` - 캔들 간격 문자열 ("5m" ~ "1w")
    /// * `series` - 오름차순 캔들 시계열
    ///
    /// # Returns
    /// * `Result<AnalysisResult, AnalysisError>` - 간격이 잘못되었거나 캔들이 부족하면 오류
    pub fn analyze<C: Candle>(
        &self,
        symbol: &str,
        interval: &str,
        series: &CandleSeries<C>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let interval: CandleInterval = interval.parse().map_err(AnalysisError::InvalidInterval)?;
        self.analyze_interval(symbol, interval, series)
    }

    /// 파싱된 간격으로 전체 분석 실행
    pub fn analyze_interval<C: Candle>(
        &self,
        symbol: &str,
        interval: CandleInterval,
        series: &CandleSeries<C>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let required = self.config.min_candles;
        let last = match series.last() {
            Some(last) if series.len() >= required => last,
            _ => {
                log::warn!("{} {} 분석 불가: 캔들 {}개 (최소 {}개)", symbol, interval, series.len(), required);
                return Err(AnalysisError::InsufficientData {
                    required,
                    actual: series.len(),
                });
            }
        };

        let candles = series.items();
        let indicators = IndicatorSet::from_candles(candles, self.config.atr_period, self.config.fibonacci_lookback);
        let trend = self
            .trend_analyzer
            .analyze_indicators(&indicators.macd, &indicators.kdj, &indicators.rsi);
        let sr_levels = self.sr_analyzer.analyze(candles, interval);

        // 패턴과 구조 분석은 이동평균 기반 추세 라벨을 사용
        let trend_direction = self.trend_analyzer.determine_trend_direction(candles);
        let candlestick_patterns = identify_patterns(candles, trend_direction);
        let market_structure = self.structure_analyzer.analyze(
            candles,
            trend_direction,
            &indicators,
            &sr_levels,
            &candlestick_patterns,
        );

        log::info!(
            "{} {} 분석 완료: 추세 {} (강도 {:.2}), 지지 {}개, 저항 {}개, 패턴 {}개",
            symbol,
            interval,
            trend.direction,
            trend.strength,
            sr_levels.support.len(),
            sr_levels.resistance.len(),
            candlestick_patterns.len()
        );

        Ok(AnalysisResult {
            symbol: symbol.to_string(),
            interval,
            timestamp: last.timestamp(),
            trend,
            indicators,
            sr_levels,
            candlestick_patterns,
            market_structure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OhlcvCandle, TrendDirection};

    fn series(closes: impl Iterator<Item = f64>) -> CandleSeries<OhlcvCandle> {
        let candles: Vec<OhlcvCandle> = closes
            .enumerate()
            .map(|(i, c)| OhlcvCandle::new(i as i64 * 86_400_000, c, c * 1.005, c * 0.995, c, 100.0))
            .collect();
        CandleSeries::new(candles)
    }

    #[test]
    fn test_insufficient_data() {
        let analyzer = MarketAnalyzer::default();
        let result = analyzer.analyze("ETHUSDT", "1d", &series((0..19).map(|i| 100.0 + i as f64)));
        match result {
            Err(AnalysisError::InsufficientData { required, actual }) => {
                assert_eq!(required, 20);
                assert_eq!(actual, 19);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_interval() {
        let analyzer = MarketAnalyzer::default();
        let result = analyzer.analyze("ETHUSDT", "3d", &series((0..30).map(|_| 100.0)));
        assert!(matches!(result, Err(AnalysisError::InvalidInterval(_))));
    }

    #[test]
    fn test_flat_series_analysis() {
        let analyzer = MarketAnalyzer::default();
        let candles: Vec<OhlcvCandle> = (0..30)
            .map(|i| OhlcvCandle::new(i, 100.0, 100.0, 100.0, 100.0, 1.0))
            .collect();
        let result = analyzer.analyze("ETHUSDT", "1d", &CandleSeries::new(candles)).unwrap();

        assert_eq!(result.interval, CandleInterval::Day1);
        assert_eq!(result.timestamp, 29);
        assert_eq!(result.trend.direction, TrendDirection::Sideways);
        assert_eq!(result.indicators.atr.value, 0.0);
        assert_eq!(result.indicators.rsi.rsi14, 50.0);
        assert!(result.sr_levels.support.is_empty());
        assert!(result.candlestick_patterns.is_empty());
        assert!(result.bullish_pattern(0.0).is_none());
    }

    #[test]
    fn test_rising_series_analysis() {
        let analyzer = MarketAnalyzer::default();
        let result = analyzer
            .analyze("BTCUSDT", "4h", &series((0..60).map(|i| 100.0 * 1.01f64.powi(i))))
            .unwrap();
        assert_eq!(result.symbol, "BTCUSDT");
        assert_eq!(result.trend.direction, TrendDirection::Up);
        assert!(result.indicators.macd.histogram > 0.0);
        assert!(result.sr_levels.resistance.iter().all(|l| l.price > 100.0 * 1.01f64.powi(59)));
    }
}
