//! 거래 기회 모델
//!
//! 진입/손절/익절 사다리/손익비/신뢰도/유효기간을 묶은 레코드와
//! API 응답 요약을 정의합니다.

use crate::model::PositionType;
use crate::strategy::StrategyType;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// 전략이 자체적으로 요구하는 최소 손익비
pub const MIN_STRATEGY_RISK_REWARD: f64 = 2.0;

/// 익절 단계별 청산 비율 (%)
const CLOSE_PCTS: [u32; 2] = [50, 30];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpportunityStatus {
    #[default]
    Active,
    Expired,
}

impl Display for OpportunityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpportunityStatus::Active => write!(f, "ACTIVE"),
            OpportunityStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

impl FromStr for OpportunityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(OpportunityStatus::Active),
            "EXPIRED" => Ok(OpportunityStatus::Expired),
            _ => Err(format!("알 수 없는 기회 상태: {}", s)),
        }
    }
}

/// 손절가 산정 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopLossMethod {
    TechnicalLevel,
    Atr,
    Percentage,
}

impl Display for StopLossMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopLossMethod::TechnicalLevel => write!(f, "TECHNICAL_LEVEL"),
            StopLossMethod::Atr => write!(f, "ATR"),
            StopLossMethod::Percentage => write!(f, "PERCENTAGE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: u32) -> ConfidenceLevel {
        if score >= 80 {
            ConfidenceLevel::High
        } else if score >= 60 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub price: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopLossInfo {
    pub price: f64,
    /// 진입가 대비 거리 (%)
    pub distance_pct: f64,
    pub method: StopLossMethod,
}

/// 익절 단계
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitLevel {
    /// 단계 (1부터)
    pub level: u32,
    pub price: f64,
    /// 기준가 대비 거리 (%)
    pub distance_pct: f64,
    /// 목표 근거 라벨
    pub target: String,
    /// 이 단계에서 청산할 포지션 비율 (%)
    pub position_close_pct: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskRewardInfo {
    pub ratio: f64,
    pub risk_amount: f64,
    pub reward_amount: f64,
    pub risk_pct: f64,
    pub reward_pct: f64,
}

impl RiskRewardInfo {
    /// 손익비 계산
    ///
    /// 위험(진입가와 손절가 차이)이 0 이하이거나 진입가가 0 이하이면 `None`입니다.
    pub fn compute(position: PositionType, entry: f64, stop: f64, target: f64) -> Option<RiskRewardInfo> {
        let (risk_amount, reward_amount) = match position {
            PositionType::Long => (entry - stop, target - entry),
            PositionType::Short => (stop - entry, entry - target),
        };
        if risk_amount <= 0.0 || entry <= 0.0 {
            return None;
        }

        Some(RiskRewardInfo {
            ratio: reward_amount / risk_amount,
            risk_amount,
            reward_amount,
            risk_pct: risk_amount / entry * 100.0,
            reward_pct: reward_amount / entry * 100.0,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInfo {
    /// 점수 (0~100)
    pub score: u32,
    pub level: ConfidenceLevel,
    pub factors: Vec<String>,
}

impl ConfidenceInfo {
    pub fn new(score: u32, factors: Vec<String>) -> ConfidenceInfo {
        let score = score.min(100);
        ConfidenceInfo {
            score,
            level: ConfidenceLevel::from_score(score),
            factors,
        }
    }
}

/// 손익비 구간별 신뢰도 가산점
pub fn risk_reward_bonus(ratio: f64) -> u32 {
    if ratio >= 5.0 {
        10
    } else if ratio >= 4.0 {
        7
    } else if ratio >= 3.0 {
        5
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidityInfo {
    /// 만료 시각 (밀리초)
    pub expires_at: i64,
    pub status: OpportunityStatus,
}

/// 거래 기회
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingOpportunity {
    pub id: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub position_type: PositionType,
    pub strategy: StrategyType,
    /// 탐지에 사용된 마지막 캔들 타임스탬프 (밀리초)
    pub timestamp: i64,
    pub entry: EntryPoint,
    pub stop_loss: StopLossInfo,
    pub take_profit: Vec<TakeProfitLevel>,
    pub risk_reward: RiskRewardInfo,
    pub confidence: ConfidenceInfo,
    pub validity: ValidityInfo,
}

impl TradingOpportunity {
    /// 심볼/전략/캔들 시각으로 결정되는 기회 ID
    pub fn make_id(symbol: &str, strategy: StrategyType, timestamp: i64) -> String {
        format!("{}_{}_{}", symbol, strategy, timestamp)
    }

    pub fn is_active(&self) -> bool {
        self.validity.status == OpportunityStatus::Active
    }

    /// 활성 상태이면서 만료 시각이 지났는지 확인
    pub fn is_overdue(&self, now_ms: i64) -> bool {
        self.is_active() && self.validity.expires_at < now_ms
    }
}

/// 익절 후보 가격
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCandidate {
    pub price: f64,
    pub label: &'static str,
}

impl TargetCandidate {
    pub fn new(price: f64, label: &'static str) -> TargetCandidate {
        TargetCandidate { price, label }
    }
}

/// 익절 사다리 구성
///
/// 후보를 주어진 순서대로 보면서 포지션 방향으로 기준가와 직전 목표를
/// 모두 넘어서는 가격만 채택합니다. 최대 2단계 (50% / 30% 청산).
pub fn take_profit_ladder(
    reference: f64,
    position: PositionType,
    candidates: impl IntoIterator<Item = TargetCandidate>,
) -> Vec<TakeProfitLevel> {
    let beyond = |price: f64, base: f64| match position {
        PositionType::Long => price > base,
        PositionType::Short => price < base,
    };

    let mut ladder: Vec<TakeProfitLevel> = Vec::with_capacity(CLOSE_PCTS.len());
    for candidate in candidates {
        if ladder.len() == CLOSE_PCTS.len() {
            break;
        }
        let base = ladder.last().map_or(reference, |last| last.price);
        if candidate.price <= 0.0 || !beyond(candidate.price, base) {
            continue;
        }
        ladder.push(TakeProfitLevel {
            level: ladder.len() as u32 + 1,
            price: candidate.price,
            distance_pct: ((candidate.price - reference) / reference * 100.0).abs(),
            target: candidate.label.to_string(),
            position_close_pct: CLOSE_PCTS[ladder.len()],
        });
    }
    ladder
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OpportunitySummary {
    #[serde(rename = "total_opportunities")]
    pub total_count: usize,
    pub avg_risk_reward: f64,
    pub high_confidence_count: usize,
}

/// 기회 목록 API 응답
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpportunitiesResponse {
    pub opportunities: Vec<TradingOpportunity>,
    pub summary: OpportunitySummary,
}

impl OpportunitiesResponse {
    pub fn from_opportunities(opportunities: Vec<TradingOpportunity>) -> OpportunitiesResponse {
        let total_count = opportunities.len();
        let avg_risk_reward = if total_count == 0 {
            0.0
        } else {
            opportunities.iter().map(|o| o.risk_reward.ratio).sum::<f64>() / total_count as f64
        };
        let high_confidence_count = opportunities
            .iter()
            .filter(|o| o.confidence.level == ConfidenceLevel::High)
            .count();

        OpportunitiesResponse {
            opportunities,
            summary: OpportunitySummary {
                total_count,
                avg_risk_reward,
                high_confidence_count,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_reward_requires_positive_risk() {
        let rr = RiskRewardInfo::compute(PositionType::Long, 100.0, 98.0, 106.0).unwrap();
        assert!((rr.ratio - 3.0).abs() < 1e-12);
        assert!((rr.risk_pct - 2.0).abs() < 1e-12);
        assert!((rr.reward_pct - 6.0).abs() < 1e-12);

        let short = RiskRewardInfo::compute(PositionType::Short, 100.0, 102.0, 95.0).unwrap();
        assert!((short.ratio - 2.5).abs() < 1e-12);

        assert!(RiskRewardInfo::compute(PositionType::Long, 100.0, 100.0, 110.0).is_none());
        assert!(RiskRewardInfo::compute(PositionType::Short, 100.0, 99.0, 90.0).is_none());
    }

    #[test]
    fn test_confidence_levels() {
        assert_eq!(ConfidenceInfo::new(80, vec![]).level, ConfidenceLevel::High);
        assert_eq!(ConfidenceInfo::new(79, vec![]).level, ConfidenceLevel::Medium);
        assert_eq!(ConfidenceInfo::new(59, vec![]).level, ConfidenceLevel::Low);
        assert_eq!(ConfidenceInfo::new(130, vec![]).score, 100);
        assert_eq!(risk_reward_bonus(4.5), 7);
        assert_eq!(risk_reward_bonus(2.9), 0);
    }

    #[test]
    fn test_ladder_skips_targets_behind() {
        let ladder = take_profit_ladder(
            100.0,
            PositionType::Long,
            [
                TargetCandidate::new(99.0, "below"),
                TargetCandidate::new(105.0, "first"),
                TargetCandidate::new(104.0, "behind first"),
                TargetCandidate::new(110.0, "second"),
                TargetCandidate::new(120.0, "third"),
            ],
        );
        assert_eq!(ladder.len(), 2);
        assert_eq!(ladder[0].target, "first");
        assert_eq!(ladder[0].position_close_pct, 50);
        assert!((ladder[0].distance_pct - 5.0).abs() < 1e-12);
        assert_eq!(ladder[1].level, 2);
        assert_eq!(ladder[1].target, "second");
        assert_eq!(ladder[1].position_close_pct, 30);

        let short = take_profit_ladder(100.0, PositionType::Short, [TargetCandidate::new(95.0, "support")]);
        assert_eq!(short.len(), 1);
        assert!((short[0].distance_pct - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_status_round_trip_text() {
        assert_eq!("EXPIRED".parse::<OpportunityStatus>(), Ok(OpportunityStatus::Expired));
        assert!("PENDING".parse::<OpportunityStatus>().is_err());
        assert_eq!(OpportunityStatus::Active.to_string(), "ACTIVE");
    }

    #[test]
    fn test_summary() {
        let response = OpportunitiesResponse::from_opportunities(vec![]);
        assert_eq!(response.summary.total_count, 0);
        assert_eq!(response.summary.avg_risk_reward, 0.0);
        let json = serde_json::to_value(&response.summary).unwrap();
        assert!(json.get("total_opportunities").is_some());
    }
}
