use crate::analysis::AnalysisResult;
use crate::analyzer::SRLevel;
use crate::indicator::FibonacciLevels;
use crate::model::{Candle, PositionType};
use crate::strategy::opportunity::{
    ConfidenceInfo, StopLossMethod, TargetCandidate, TradingOpportunity, MIN_STRATEGY_RISK_REWARD,
    risk_reward_bonus, take_profit_ladder,
};
use crate::strategy::{DetectionContext, OpportunityDraft, OpportunityStrategy, StrategyType};
use std::fmt::Display;

/// 지지선 반등 전략
///
/// 현재가 1% 이내 아래에 강한 지지선이 있고 신뢰도 높은 상승 패턴이 나타나면
/// 지지선 바로 위에서 롱 진입을 제안합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupportBounceStrategy;

impl SupportBounceStrategy {
    pub const MIN_CANDLES: usize = 50;
    /// 지지선 최대 거리 (%)
    const MAX_SUPPORT_DISTANCE_PCT: f64 = 1.0;
    const MIN_SUPPORT_STRENGTH: f64 = 0.7;
    const MIN_PATTERN_RELIABILITY: f64 = 0.7;
    const MIN_TARGET_STRENGTH: f64 = 0.6;

    pub fn new() -> SupportBounceStrategy {
        SupportBounceStrategy
    }

    /// 현재가 아래 1% 이내의 강한 지지선 중 가장 가까운 것
    fn nearest_strong_support(current_price: f64, supports: &[SRLevel]) -> Option<SRLevel> {
        supports
            .iter()
            .filter(|s| {
                s.price < current_price
                    && (current_price - s.price) / current_price * 100.0 < Self::MAX_SUPPORT_DISTANCE_PCT
                    && s.strength > Self::MIN_SUPPORT_STRENGTH
            })
            .min_by(|a, b| (current_price - a.price).total_cmp(&(current_price - b.price)))
            .copied()
    }

    /// 저항선 기반 익절 후보 (강도 0.6 초과, 가까운 순), 없으면 빈 목록
    fn resistance_targets(
        current_price: f64,
        resistances: &[SRLevel],
        fibonacci: Option<&FibonacciLevels>,
    ) -> Vec<TargetCandidate> {
        let mut valid: Vec<SRLevel> = resistances
            .iter()
            .filter(|r| r.price > current_price && r.strength > Self::MIN_TARGET_STRENGTH)
            .copied()
            .collect();
        if valid.is_empty() {
            return Vec::new();
        }
        valid.sort_by(|a, b| a.price.total_cmp(&b.price));

        let mut candidates: Vec<TargetCandidate> = valid
            .iter()
            .map(|r| TargetCandidate::new(r.price, "SR Level resistance"))
            .collect();
        if let Some(fib) = fibonacci {
            candidates.push(TargetCandidate::new(fib.extension.e1618, "Fibonacci 1.618 extension"));
        }
        candidates
    }

    fn confidence(reason_count: usize, support_strength: f64, ratio: f64) -> ConfidenceInfo {
        let mut score = 50;
        let mut factors = Vec::new();

        if reason_count >= 3 {
            score += 15;
            factors.push("Multiple support convergence".to_string());
        } else if reason_count >= 2 {
            score += 10;
        }

        score += 15;
        factors.push("Strong bullish pattern".to_string());

        if support_strength > 0.8 {
            score += 10;
            factors.push("High support strength".to_string());
        } else if support_strength > 0.7 {
            score += 5;
        }

        score += risk_reward_bonus(ratio);
        if ratio >= 4.0 {
            factors.push("Excellent risk-reward ratio".to_string());
        }

        ConfidenceInfo::new(score, factors)
    }
}

impl Display for SupportBounceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SupportBounce")
    }
}

impl<C: Candle> OpportunityStrategy<C> for SupportBounceStrategy {
    fn detect(&self, candles: &[C], analysis: &AnalysisResult, ctx: &DetectionContext) -> Option<TradingOpportunity> {
        if candles.len() < Self::MIN_CANDLES || analysis.sr_levels.support.is_empty() {
            return None;
        }
        let current_price = candles.last()?.close_price();
        let atr = analysis.indicators.atr.value;

        let support = Self::nearest_strong_support(current_price, &analysis.sr_levels.support)?;
        let pattern = analysis.bullish_pattern(Self::MIN_PATTERN_RELIABILITY)?;

        let entry = support.price * 1.002;
        let stop = support.price - (support.price * 0.015).max(atr);

        let fibonacci = analysis.indicators.fibonacci.as_ref();
        let candidates = Self::resistance_targets(current_price, &analysis.sr_levels.resistance, fibonacci);
        let targets = take_profit_ladder(current_price, PositionType::Long, candidates);
        if targets.is_empty() {
            log::debug!("{} 지지선 반등: 익절 목표 없음", analysis.symbol);
            return None;
        }

        let mut reasons = vec![
            format!("Strong support at ${:.2} (strength {:.2})", support.price, support.strength),
            format!("{} pattern (reliability {:.1})", pattern.name, pattern.reliability),
        ];
        let ema50 = analysis.indicators.ema.ema50;
        if ema50 > 0.0 && (ema50 - support.price).abs() < support.price * 0.01 {
            reasons.push(format!("EMA(50) support at ${:.2}", ema50));
        }
        if let Some(fib) = fibonacci {
            if let Some((level, price)) = fib
                .retracement
                .iter()
                .find(|(_, price)| (price - support.price).abs() < support.price * 0.01)
            {
                reasons.push(format!("Fibonacci {} retracement at ${:.2}", level.label(), price));
            }
        }

        let draft = OpportunityDraft {
            position: PositionType::Long,
            entry,
            reasons,
            stop,
            stop_method: StopLossMethod::TechnicalLevel,
            targets,
        };
        let risk_reward = draft.risk_reward()?;
        if risk_reward.ratio < MIN_STRATEGY_RISK_REWARD {
            log::debug!(
                "{} 지지선 반등 후보 제외: 손익비 {:.2} < {:.1}",
                analysis.symbol,
                risk_reward.ratio,
                MIN_STRATEGY_RISK_REWARD
            );
            return None;
        }

        let confidence = Self::confidence(draft.reasons.len(), support.strength, risk_reward.ratio);
        Some(draft.into_opportunity(StrategyType::SupportBounce, analysis, ctx, risk_reward, confidence))
    }

    fn name(&self) -> StrategyType {
        StrategyType::SupportBounce
    }
}
