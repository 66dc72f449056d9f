use crate::analysis::AnalysisResult;
use crate::indicator::utils::{highest_high, lowest_low, mean};
use crate::model::{Candle, PositionType, TrendDirection};
use crate::strategy::opportunity::{
    ConfidenceInfo, StopLossMethod, TargetCandidate, TradingOpportunity, MIN_STRATEGY_RISK_REWARD,
    risk_reward_bonus, take_profit_ladder,
};
use crate::strategy::{DetectionContext, OpportunityDraft, OpportunityStrategy, StrategyType};
use std::fmt::Display;

/// 돌파 후 되돌림 확인 전략
///
/// 직전 박스권 상단을 돌파한 뒤 다시 상단까지 내려와 지지를 확인하면 롱 진입.
/// - 박스권: 최근 30~10번째 이전 캔들 (20개)
/// - 돌파: 그 이후 9개 캔들 중 종가가 상단 대비 0.5% 이상 위
/// - 되돌림: 마지막 캔들 저가가 상단 +0.5% 이내, 종가는 상단 위
#[derive(Debug, Clone, Copy, Default)]
pub struct BreakoutRetestStrategy;

/// 박스권 돌파 구조
#[derive(Debug, Clone, Copy, PartialEq)]
struct Breakout {
    /// 박스권 상단 (돌파 레벨)
    level: f64,
    /// 박스권 하단
    range_low: f64,
    /// 돌파 구간 평균 거래량 / 박스권 평균 거래량
    volume_ratio: f64,
}

impl BreakoutRetestStrategy {
    pub const MIN_CANDLES: usize = 50;
    const RANGE_START: usize = 30;
    const RANGE_END: usize = 10;
    /// 돌파/되돌림 허용 폭
    const BREAKOUT_MARGIN: f64 = 0.005;
    const MIN_TARGET_STRENGTH: f64 = 0.6;
    const MIN_PATTERN_RELIABILITY: f64 = 0.7;

    pub fn new() -> BreakoutRetestStrategy {
        BreakoutRetestStrategy
    }

    fn find_breakout<C: Candle>(candles: &[C]) -> Option<Breakout> {
        let n = candles.len();
        if n < Self::MIN_CANDLES {
            return None;
        }
        let range = &candles[n - Self::RANGE_START..n - Self::RANGE_END];
        let breakout_window = &candles[n - Self::RANGE_END..n - 1];
        let last = candles.last()?;

        let level = highest_high(range);
        let range_low = lowest_low(range);
        if level <= 0.0 {
            return None;
        }

        let broke_out = breakout_window
            .iter()
            .any(|c| c.close_price() >= level * (1.0 + Self::BREAKOUT_MARGIN));
        let retested = last.low_price() <= level * (1.0 + Self::BREAKOUT_MARGIN) && last.close_price() > level;
        if !broke_out || !retested {
            return None;
        }

        let volumes = |window: &[C]| mean(&window.iter().map(|c| c.volume()).collect::<Vec<f64>>());
        let range_volume = volumes(range);
        let volume_ratio = if range_volume > 0.0 {
            volumes(breakout_window) / range_volume
        } else {
            0.0
        };

        Some(Breakout {
            level,
            range_low,
            volume_ratio,
        })
    }
}

impl Display for BreakoutRetestStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BreakoutRetest")
    }
}

impl<C: Candle> OpportunityStrategy<C> for BreakoutRetestStrategy {
    fn detect(&self, candles: &[C], analysis: &AnalysisResult, ctx: &DetectionContext) -> Option<TradingOpportunity> {
        if analysis.trend.direction == TrendDirection::Down {
            return None;
        }
        let breakout = Self::find_breakout(candles)?;
        let last = candles.last()?;
        let entry = last.close_price();
        let atr = analysis.indicators.atr.value;

        let level_buffer = breakout.level * 0.01;
        let (stop, stop_method) = if atr > level_buffer {
            (breakout.level - atr, StopLossMethod::Atr)
        } else {
            (breakout.level - level_buffer, StopLossMethod::TechnicalLevel)
        };

        let mut resistances: Vec<f64> = analysis
            .sr_levels
            .resistance
            .iter()
            .filter(|r| r.price > entry && r.strength > Self::MIN_TARGET_STRENGTH)
            .map(|r| r.price)
            .collect();
        resistances.sort_by(f64::total_cmp);

        let mut candidates: Vec<TargetCandidate> = resistances
            .into_iter()
            .map(|price| TargetCandidate::new(price, "SR Level resistance"))
            .collect();
        candidates.push(TargetCandidate::new(
            breakout.level + (breakout.level - breakout.range_low),
            "Measured move target",
        ));
        if let Some(fib) = &analysis.indicators.fibonacci {
            candidates.push(TargetCandidate::new(fib.extension.e1618, "Fibonacci 1.618 extension"));
        }
        let targets = take_profit_ladder(entry, PositionType::Long, candidates);

        let mut reasons = vec![
            format!("Breakout above ${:.2} range high", breakout.level),
            format!("Retest held at ${:.2} (low ${:.2})", breakout.level, last.low_price()),
        ];
        let mut score = 50;
        let mut factors = Vec::new();

        if breakout.volume_ratio >= 1.5 {
            score += 10;
            reasons.push(format!("Breakout volume {:.1}x range average", breakout.volume_ratio));
            factors.push("Breakout volume expansion".to_string());
        }
        if analysis.trend.direction == TrendDirection::Up {
            score += 10;
            factors.push("Trend alignment".to_string());
        }
        if let Some(pattern) = analysis.bullish_pattern(Self::MIN_PATTERN_RELIABILITY) {
            score += 10;
            reasons.push(format!("{} pattern (reliability {:.1})", pattern.name, pattern.reliability));
            factors.push("Bullish confirmation pattern".to_string());
        }

        let draft = OpportunityDraft {
            position: PositionType::Long,
            entry,
            reasons,
            stop,
            stop_method,
            targets,
        };
        let risk_reward = draft.risk_reward()?;
        if risk_reward.ratio < MIN_STRATEGY_RISK_REWARD {
            log::debug!(
                "{} 돌파 되돌림 후보 제외: 손익비 {:.2} < {:.1}",
                analysis.symbol,
                risk_reward.ratio,
                MIN_STRATEGY_RISK_REWARD
            );
            return None;
        }

        score += risk_reward_bonus(risk_reward.ratio);
        if risk_reward.ratio >= 4.0 {
            factors.push("Excellent risk-reward ratio".to_string());
        }
        let confidence = ConfidenceInfo::new(score, factors);
        Some(draft.into_opportunity(StrategyType::BreakoutRetest, analysis, ctx, risk_reward, confidence))
    }

    fn name(&self) -> StrategyType {
        StrategyType::BreakoutRetest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MarketAnalyzer;
    use crate::analyzer::SRLevel;
    use crate::candle_series::CandleSeries;
    use crate::model::{CandleInterval, OhlcvCandle};
    use chrono::{TimeZone, Utc};

    /// 100 근처 박스권 → 101 상단 돌파 → 마지막 캔들에서 상단 되돌림
    fn breakout_candles() -> Vec<OhlcvCandle> {
        let mut candles: Vec<OhlcvCandle> = (0..50)
            .map(|i| OhlcvCandle::new(i, 100.0, 101.0, 99.0, 100.0, 10.0))
            .collect();
        for i in 50..59 {
            let close = 102.0 + 0.2 * (i - 50) as f64;
            candles.push(OhlcvCandle::new(i, close - 0.3, close + 0.5, close - 0.5, close, 30.0));
        }
        candles.push(OhlcvCandle::new(59, 102.5, 102.8, 101.2, 102.0, 20.0));
        candles
    }

    fn analysis(candles: &[OhlcvCandle]) -> AnalysisResult {
        let mut analysis = MarketAnalyzer::default()
            .analyze_interval("BTCUSDT", CandleInterval::Hour4, &CandleSeries::new(candles.to_vec()))
            .unwrap();
        analysis.trend.direction = TrendDirection::Up;
        analysis.sr_levels.resistance = vec![SRLevel {
            price: 115.0,
            strength: 0.8,
        }];
        analysis
    }

    fn ctx() -> DetectionContext {
        DetectionContext::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(), 4)
    }

    #[test]
    fn test_find_breakout() {
        let breakout = BreakoutRetestStrategy::find_breakout(&breakout_candles()).unwrap();
        assert_eq!(breakout.level, 101.0);
        assert_eq!(breakout.range_low, 99.0);
        assert!((breakout.volume_ratio - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_breakout_retest_detected() {
        let candles = breakout_candles();
        let analysis = analysis(&candles);
        let opp = BreakoutRetestStrategy::new().detect(&candles, &analysis, &ctx()).unwrap();

        assert_eq!(opp.id, "BTCUSDT_BREAKOUT_RETEST_59");
        assert_eq!(opp.entry.price, 102.0);
        assert!(opp.stop_loss.price < 101.0);
        assert_eq!(opp.take_profit[0].price, 115.0);
        assert_eq!(opp.take_profit[0].target, "SR Level resistance");
        assert!(opp.risk_reward.ratio >= MIN_STRATEGY_RISK_REWARD);
        assert!(opp.confidence.factors.contains(&"Breakout volume expansion".to_string()));
        assert!(opp.confidence.factors.contains(&"Trend alignment".to_string()));
    }

    #[test]
    fn test_no_breakout_in_flat_market() {
        let candles: Vec<OhlcvCandle> = (0..60)
            .map(|i| OhlcvCandle::new(i, 100.0, 101.0, 99.0, 100.0, 10.0))
            .collect();
        assert!(BreakoutRetestStrategy::find_breakout(&candles).is_none());
    }

    #[test]
    fn test_failed_retest_closes_below_level() {
        let mut candles = breakout_candles();
        candles[59] = OhlcvCandle::new(59, 102.0, 102.2, 100.2, 100.8, 20.0);
        assert!(BreakoutRetestStrategy::find_breakout(&candles).is_none());
    }

    #[test]
    fn test_skipped_in_downtrend() {
        let candles = breakout_candles();
        let mut analysis = analysis(&candles);
        analysis.trend.direction = TrendDirection::Down;
        assert!(BreakoutRetestStrategy::new().detect(&candles, &analysis, &ctx()).is_none());
    }

    #[test]
    fn test_measured_move_fallback_rejected_on_low_risk_reward() {
        // 박스권 높이 2 → 측정 목표 103, 손익비 미달
        let candles = breakout_candles();
        let mut analysis = analysis(&candles);
        analysis.sr_levels.resistance.clear();
        analysis.indicators.fibonacci = None;
        assert!(BreakoutRetestStrategy::new().detect(&candles, &analysis, &ctx()).is_none());
    }
}
