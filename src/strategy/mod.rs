pub mod breakout_retest_strategy;
pub mod detector;
pub mod opportunity;
pub mod support_bounce_strategy;
pub mod trend_continuation_strategy;

use crate::analysis::AnalysisResult;
use crate::model::{Candle, PositionType};
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use opportunity::{
    ConfidenceInfo, EntryPoint, RiskRewardInfo, StopLossInfo, StopLossMethod, TakeProfitLevel, ValidityInfo,
};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

pub use detector::OpportunityDetector;
pub use opportunity::{OpportunitiesResponse, OpportunityStatus, TradingOpportunity};

/// 기회 탐지 전략 유형
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyType {
    /// 지지선 반등 (롱)
    SupportBounce,
    /// 돌파 후 되돌림 확인 (롱)
    BreakoutRetest,
    /// 추세 지속 눌림목 (롱/숏)
    TrendContinuation,
}

impl StrategyType {
    /// 탐지 실행 순서
    pub const ALL: [StrategyType; 3] = [
        StrategyType::SupportBounce,
        StrategyType::BreakoutRetest,
        StrategyType::TrendContinuation,
    ];
}

impl Display for StrategyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyType::SupportBounce => write!(f, "SUPPORT_BOUNCE"),
            StrategyType::BreakoutRetest => write!(f, "BREAKOUT_RETEST"),
            StrategyType::TrendContinuation => write!(f, "TREND_CONTINUATION"),
        }
    }
}

impl FromStr for StrategyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyType::ALL
            .into_iter()
            .find(|strategy| strategy.to_string() == s)
            .ok_or_else(|| format!("알 수 없는 전략: {}", s))
    }
}

/// 탐지 실행 컨텍스트
///
/// 현재 시각을 외부에서 주입받아 같은 입력이면 같은 결과를 냅니다.
#[derive(Debug, Clone, Copy)]
pub struct DetectionContext {
    pub now: DateTime<Utc>,
    /// 기회 유효 기간
    pub validity: Duration,
}

impl DetectionContext {
    pub fn new(now: DateTime<Utc>, validity_hours: i64) -> DetectionContext {
        DetectionContext {
            now,
            validity: Duration::hours(validity_hours),
        }
    }

    /// 만료 시각 (밀리초)
    pub fn expires_at(&self) -> i64 {
        (self.now + self.validity).timestamp_millis()
    }
}

/// 기회 탐지 전략 인터페이스
///
/// 각 전략은 (캔들, 분석 결과)의 순수 함수이며 후보가 없으면 `None`을 반환합니다.
pub trait OpportunityStrategy<C: Candle>: Display + Send + Sync {
    /// 기회 후보 탐지
    ///
    /// # Arguments
    /// * `candles` - 분석에 사용된 오름차순 캔들 목록
    /// * `analysis` - 같은 캔들의 분석 결과
    /// * `ctx` - 탐지 시각과 유효 기간
    ///
    /// # Returns
    /// * `Option<TradingOpportunity>` - 손익비 2.0 이상인 후보
    fn detect(&self, candles: &[C], analysis: &AnalysisResult, ctx: &DetectionContext) -> Option<TradingOpportunity>;

    /// 전략의 타입 반환
    fn name(&self) -> StrategyType;
}

/// 전략 팩토리
pub struct StrategyFactory;

impl StrategyFactory {
    /// 전략 유형으로 전략 인스턴스 생성
    pub fn build<C: Candle + 'static>(strategy_type: StrategyType) -> Box<dyn OpportunityStrategy<C>> {
        debug!("전략 빌드: {strategy_type}");
        match strategy_type {
            StrategyType::SupportBounce => Box::new(support_bounce_strategy::SupportBounceStrategy::new()),
            StrategyType::BreakoutRetest => Box::new(breakout_retest_strategy::BreakoutRetestStrategy::new()),
            StrategyType::TrendContinuation => {
                Box::new(trend_continuation_strategy::TrendContinuationStrategy::new())
            }
        }
    }

    /// 모든 전략을 실행 순서대로 생성
    pub fn build_all<C: Candle + 'static>() -> Vec<Box<dyn OpportunityStrategy<C>>> {
        let strategies: Vec<Box<dyn OpportunityStrategy<C>>> =
            StrategyType::ALL.into_iter().map(|t| Self::build::<C>(t)).collect();
        info!("기회 탐지 전략 {}개 준비", strategies.len());
        strategies
    }
}

/// 손익비 검사 전 단계의 기회 초안
#[derive(Debug, Clone)]
pub struct OpportunityDraft {
    pub position: PositionType,
    pub entry: f64,
    pub reasons: Vec<String>,
    pub stop: f64,
    pub stop_method: StopLossMethod,
    pub targets: Vec<TakeProfitLevel>,
}

impl OpportunityDraft {
    /// 첫 번째 익절 목표 기준 손익비
    pub fn risk_reward(&self) -> Option<RiskRewardInfo> {
        let first = self.targets.first()?;
        RiskRewardInfo::compute(self.position, self.entry, self.stop, first.price)
    }

    /// 최종 기회 레코드 생성
    pub fn into_opportunity(
        self,
        strategy: StrategyType,
        analysis: &AnalysisResult,
        ctx: &DetectionContext,
        risk_reward: RiskRewardInfo,
        confidence: ConfidenceInfo,
    ) -> TradingOpportunity {
        TradingOpportunity {
            id: TradingOpportunity::make_id(&analysis.symbol, strategy, analysis.timestamp),
            symbol: analysis.symbol.clone(),
            position_type: self.position,
            strategy,
            timestamp: analysis.timestamp,
            stop_loss: StopLossInfo {
                price: self.stop,
                distance_pct: risk_reward.risk_pct,
                method: self.stop_method,
            },
            entry: EntryPoint {
                price: self.entry,
                reasons: self.reasons,
            },
            take_profit: self.targets,
            risk_reward,
            confidence,
            validity: ValidityInfo {
                expires_at: ctx.expires_at(),
                status: OpportunityStatus::Active,
            },
        }
    }
}
