use crate::analysis::AnalysisResult;
use crate::analyzer::TrendAnalyzer;
use crate::analyzer::market_structure_analyzer::{ConfirmationStrength, Signal};
use crate::model::{Candle, PositionType, TrendDirection};
use crate::strategy::opportunity::{
    ConfidenceInfo, StopLossMethod, TargetCandidate, TradingOpportunity, MIN_STRATEGY_RISK_REWARD,
    risk_reward_bonus, take_profit_ladder,
};
use crate::strategy::{DetectionContext, OpportunityDraft, OpportunityStrategy, StrategyType};
use std::fmt::Display;

/// 추세 지속 전략
///
/// 지표 점수 추세와 이동평균 추세가 같은 방향이고 EMA 정렬도 일치할 때,
/// 가격이 EMA21 근처로 눌리면 추세 방향으로 진입합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendContinuationStrategy {
    trend_analyzer: TrendAnalyzer,
}

impl TrendContinuationStrategy {
    pub const MIN_CANDLES: usize = 50;
    const MIN_TREND_STRENGTH: f64 = 0.3;
    /// EMA21 최대 거리 (비율)
    const MAX_EMA21_DISTANCE: f64 = 0.01;
    const ATR_STOP_MULTIPLIER: f64 = 1.5;
    const MIN_TARGET_STRENGTH: f64 = 0.6;
    const MIN_PATTERN_RELIABILITY: f64 = 0.7;

    pub fn new() -> TrendContinuationStrategy {
        TrendContinuationStrategy {
            trend_analyzer: TrendAnalyzer::new(),
        }
    }

    /// 두 추세 판단과 EMA 정렬이 모두 일치하는 방향
    fn aligned_position<C: Candle>(&self, candles: &[C], analysis: &AnalysisResult) -> Option<PositionType> {
        if analysis.trend.strength < Self::MIN_TREND_STRENGTH {
            return None;
        }
        let ma_direction = self.trend_analyzer.determine_trend_direction(candles);
        let alignment = analysis.market_structure.trend_confirmation.ema_alignment;

        match (analysis.trend.direction, ma_direction, alignment) {
            (TrendDirection::Up, TrendDirection::Up, Signal::Bullish) => Some(PositionType::Long),
            (TrendDirection::Down, TrendDirection::Down, Signal::Bearish) => Some(PositionType::Short),
            _ => None,
        }
    }

    /// 추세 방향의 지지/저항, 그 다음 피보나치 확장 순서의 익절 후보
    fn target_candidates(position: PositionType, entry: f64, analysis: &AnalysisResult) -> Vec<TargetCandidate> {
        let strong = |strength: f64| strength > Self::MIN_TARGET_STRENGTH;
        let mut candidates: Vec<TargetCandidate> = match position {
            PositionType::Long => {
                let mut prices: Vec<f64> = analysis
                    .sr_levels
                    .resistance
                    .iter()
                    .filter(|r| r.price > entry && strong(r.strength))
                    .map(|r| r.price)
                    .collect();
                prices.sort_by(f64::total_cmp);
                prices
                    .into_iter()
                    .map(|p| TargetCandidate::new(p, "SR Level resistance"))
                    .collect()
            }
            PositionType::Short => {
                let mut prices: Vec<f64> = analysis
                    .sr_levels
                    .support
                    .iter()
                    .filter(|s| s.price < entry && strong(s.strength))
                    .map(|s| s.price)
                    .collect();
                prices.sort_by(|a, b| b.total_cmp(a));
                prices
                    .into_iter()
                    .map(|p| TargetCandidate::new(p, "SR Level support"))
                    .collect()
            }
        };

        if let Some(fib) = &analysis.indicators.fibonacci {
            candidates.extend([
                TargetCandidate::new(fib.extension.e1272, "Fibonacci 1.272 extension"),
                TargetCandidate::new(fib.extension.e1618, "Fibonacci 1.618 extension"),
                TargetCandidate::new(fib.extension.e2000, "Fibonacci 2.0 extension"),
            ]);
        }
        candidates
    }
}

impl Display for TrendContinuationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TrendContinuation")
    }
}

impl<C: Candle> OpportunityStrategy<C> for TrendContinuationStrategy {
    fn detect(&self, candles: &[C], analysis: &AnalysisResult, ctx: &DetectionContext) -> Option<TradingOpportunity> {
        if candles.len() < Self::MIN_CANDLES {
            return None;
        }
        let position = self.aligned_position(candles, analysis)?;

        let entry = candles.last()?.close_price();
        let ema = &analysis.indicators.ema;
        if ema.ema21 <= 0.0 || ema.ema50 <= 0.0 {
            return None;
        }
        let near_ema21 = ((entry - ema.ema21) / ema.ema21).abs() <= Self::MAX_EMA21_DISTANCE;
        let trend_side = match position {
            PositionType::Long => entry > ema.ema50,
            PositionType::Short => entry < ema.ema50,
        };
        if !near_ema21 || !trend_side {
            return None;
        }

        let atr_distance = analysis.indicators.atr.value * Self::ATR_STOP_MULTIPLIER;
        let (stop, stop_method) = match position {
            PositionType::Long if ema.ema50 < entry - atr_distance => (ema.ema50, StopLossMethod::TechnicalLevel),
            PositionType::Long => (entry - atr_distance, StopLossMethod::Atr),
            PositionType::Short if ema.ema50 > entry + atr_distance => (ema.ema50, StopLossMethod::TechnicalLevel),
            PositionType::Short => (entry + atr_distance, StopLossMethod::Atr),
        };

        let targets = take_profit_ladder(entry, position, Self::target_candidates(position, entry, analysis));

        let direction_label = match position {
            PositionType::Long => "Uptrend",
            PositionType::Short => "Downtrend",
        };
        let mut reasons = vec![
            format!("{} confirmed (strength {:.2})", direction_label, analysis.trend.strength),
            format!("Pullback to EMA(21) at ${:.2}", ema.ema21),
            format!("EMA(50) trend filter at ${:.2}", ema.ema50),
        ];

        let mut score = 50;
        let mut factors = Vec::new();
        if analysis.trend.strength >= 0.5 {
            score += 10;
            factors.push("Strong trend".to_string());
        } else {
            score += 5;
        }
        match analysis.market_structure.trend_confirmation.strength {
            ConfirmationStrength::Strong => {
                score += 10;
                factors.push("Multi-indicator trend confirmation".to_string());
            }
            ConfirmationStrength::Moderate => score += 5,
            ConfirmationStrength::Weak => {}
        }
        let pattern = match position {
            PositionType::Long => analysis.bullish_pattern(Self::MIN_PATTERN_RELIABILITY),
            PositionType::Short => analysis.bearish_pattern(Self::MIN_PATTERN_RELIABILITY),
        };
        if let Some(pattern) = pattern {
            score += 10;
            reasons.push(format!("{} pattern (reliability {:.1})", pattern.name, pattern.reliability));
            factors.push("Trend-aligned candlestick pattern".to_string());
        }

        let draft = OpportunityDraft {
            position,
            entry,
            reasons,
            stop,
            stop_method,
            targets,
        };
        let risk_reward = draft.risk_reward()?;
        if risk_reward.ratio < MIN_STRATEGY_RISK_REWARD {
            log::debug!(
                "{} 추세 지속 후보 제외: 손익비 {:.2} < {:.1}",
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
        Some(draft.into_opportunity(StrategyType::TrendContinuation, analysis, ctx, risk_reward, confidence))
    }

    fn name(&self) -> StrategyType {
        StrategyType::TrendContinuation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MarketAnalyzer;
    use crate::analyzer::SRLevel;
    use crate::candle_series::CandleSeries;
    use crate::indicator::EmaIndicator;
    use crate::model::{CandleInterval, OhlcvCandle};
    use chrono::{TimeZone, Utc};

    fn candles(step: f64) -> Vec<OhlcvCandle> {
        (0..60)
            .map(|i| {
                let close = 100.0 * step.powi(i);
                OhlcvCandle::new(i as i64, close, close * 1.002, close * 0.998, close, 10.0)
            })
            .collect()
    }

    /// 추세 조건이 모두 맞도록 지표를 고정한 분석 결과
    fn aligned_analysis(candles: &[OhlcvCandle], direction: TrendDirection) -> AnalysisResult {
        let mut analysis = MarketAnalyzer::default()
            .analyze_interval("SOLUSDT", CandleInterval::Day1, &CandleSeries::new(candles.to_vec()))
            .unwrap();
        let close = candles[candles.len() - 1].close;
        let sign = if direction == TrendDirection::Up { 1.0 } else { -1.0 };

        analysis.trend.direction = direction;
        analysis.trend.strength = 0.6;
        analysis.market_structure.trend_confirmation.ema_alignment =
            if direction == TrendDirection::Up { Signal::Bullish } else { Signal::Bearish };
        analysis.indicators.ema = EmaIndicator {
            ema9: close,
            ema21: close * (1.0 - sign * 0.005),
            ema50: close * (1.0 - sign * 0.03),
            ema200: 0.0,
        };
        analysis.indicators.atr.value = close * 0.01;
        analysis.indicators.fibonacci = None;
        analysis.sr_levels.resistance = vec![SRLevel {
            price: close * 1.08,
            strength: 0.8,
        }];
        analysis.sr_levels.support = vec![SRLevel {
            price: close * 0.9,
            strength: 0.8,
        }];
        analysis
    }

    fn ctx() -> DetectionContext {
        DetectionContext::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(), 4)
    }

    #[test]
    fn test_long_continuation() {
        let candles = candles(1.005);
        let analysis = aligned_analysis(&candles, TrendDirection::Up);
        let close = candles[59].close;
        let opp = TrendContinuationStrategy::new().detect(&candles, &analysis, &ctx()).unwrap();

        assert_eq!(opp.position_type, PositionType::Long);
        // EMA50(3% 아래)가 1.5 ATR(1.5%)보다 멀어 손절로 사용
        assert!((opp.stop_loss.price - close * 0.97).abs() < 1e-9);
        assert_eq!(opp.stop_loss.method, StopLossMethod::TechnicalLevel);
        assert!((opp.risk_reward.ratio - 8.0 / 3.0).abs() < 1e-9);
        assert!(opp.confidence.factors.contains(&"Strong trend".to_string()));
    }

    #[test]
    fn test_short_continuation() {
        let candles = candles(0.995);
        let analysis = aligned_analysis(&candles, TrendDirection::Down);
        let close = candles[59].close;
        let opp = TrendContinuationStrategy::new().detect(&candles, &analysis, &ctx()).unwrap();

        assert_eq!(opp.position_type, PositionType::Short);
        assert!((opp.stop_loss.price - close * 1.03).abs() < 1e-9);
        assert_eq!(opp.take_profit[0].target, "SR Level support");
        assert!((opp.risk_reward.ratio - 10.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_requires_pullback_to_ema21() {
        let candles = candles(1.005);
        let mut analysis = aligned_analysis(&candles, TrendDirection::Up);
        analysis.indicators.ema.ema21 = candles[59].close * 0.95;
        assert!(TrendContinuationStrategy::new().detect(&candles, &analysis, &ctx()).is_none());
    }

    #[test]
    fn test_requires_agreeing_trend_signals() {
        let candles = candles(1.005);
        let mut analysis = aligned_analysis(&candles, TrendDirection::Up);
        analysis.market_structure.trend_confirmation.ema_alignment = Signal::Neutral;
        assert!(TrendContinuationStrategy::new().detect(&candles, &analysis, &ctx()).is_none());

        // 지표 점수는 하락이지만 이동평균은 상승
        let analysis = aligned_analysis(&candles, TrendDirection::Down);
        assert!(TrendContinuationStrategy::new().detect(&candles, &analysis, &ctx()).is_none());
    }
}
