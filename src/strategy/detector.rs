use crate::analysis::AnalysisResult;
use crate::error::AnalysisError;
use crate::model::Candle;
use crate::repository::OpportunityRepository;
use crate::strategy::opportunity::{MIN_STRATEGY_RISK_REWARD, OpportunityStatus, TradingOpportunity};
use crate::strategy::{DetectionContext, OpportunityStrategy, StrategyFactory};
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use std::collections::HashMap;
use std::sync::Arc;

/// 기회 탐지기
///
/// 전략 목록을 실행해 후보를 만들고, 저장소의 활성 기회와 병합합니다.
/// 탐지 전에 만료된 기회를 정리하고 새 후보는 즉시 저장합니다.
pub struct OpportunityDetector<C: Candle, R: OpportunityRepository> {
    repository: Arc<R>,
    strategies: Vec<Box<dyn OpportunityStrategy<C>>>,
    validity_hours: i64,
}

impl<C: Candle + 'static, R: OpportunityRepository> OpportunityDetector<C, R> {
    /// 모든 전략으로 탐지기 생성
    ///
    /// # Arguments
    /// * `repository` - 기회 저장소
    /// * `validity_hours` - 새 기회의 유효 기간 (시간)
    pub fn new(repository: Arc<R>, validity_hours: i64) -> OpportunityDetector<C, R> {
        Self::with_strategies(repository, StrategyFactory::build_all(), validity_hours)
    }

    pub fn with_strategies(
        repository: Arc<R>,
        strategies: Vec<Box<dyn OpportunityStrategy<C>>>,
        validity_hours: i64,
    ) -> OpportunityDetector<C, R> {
        OpportunityDetector {
            repository,
            strategies,
            validity_hours,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// 전략만 실행해 손익비 기준을 통과한 후보 반환 (저장소 접근 없음)
    ///
    /// # Arguments
    /// * `candles` - 분석에 사용된 캔들
    /// * `analysis` - 분석 결과
    /// * `min_risk_reward` - 호출자 최소 손익비 (2.0 미만이면 2.0 적용)
    /// * `now` - 탐지 시각
    pub fn detect_candidates(
        &self,
        candles: &[C],
        analysis: &AnalysisResult,
        min_risk_reward: f64,
        now: DateTime<Utc>,
    ) -> Vec<TradingOpportunity> {
        let threshold = min_risk_reward.max(MIN_STRATEGY_RISK_REWARD);
        let ctx = DetectionContext::new(now, self.validity_hours);

        self.strategies
            .iter()
            .filter_map(|strategy| {
                let candidate = strategy.detect(candles, analysis, &ctx)?;
                if candidate.risk_reward.ratio < threshold {
                    debug!(
                        "{} {} 후보 제외: 손익비 {:.2} < {:.2}",
                        analysis.symbol, strategy, candidate.risk_reward.ratio, threshold
                    );
                    return None;
                }
                Some(candidate)
            })
            .collect()
    }

    /// 만료 정리 → 활성 기회 조회 → 전략 실행 → 저장 → 병합
    ///
    /// # Returns
    /// * `Result<Vec<TradingOpportunity>, AnalysisError>` - 활성 기회와 새 기회의 병합 결과
    pub async fn detect(
        &self,
        candles: &[C],
        analysis: &AnalysisResult,
        min_risk_reward: f64,
        now: DateTime<Utc>,
    ) -> Result<Vec<TradingOpportunity>, AnalysisError> {
        self.repository.expire_overdue(now).await.map_err(|e| {
            error!("만료 기회 정리 실패: {}", e);
            e
        })?;

        let existing = self
            .repository
            .find_by_symbol(&analysis.symbol, OpportunityStatus::Active)
            .await
            .map_err(|e| {
                error!("{} 활성 기회 조회 실패: {}", analysis.symbol, e);
                e
            })?;

        let detected = self.detect_candidates(candles, analysis, min_risk_reward, now);
        for opportunity in &detected {
            self.repository.save(opportunity).await.map_err(|e| {
                error!("기회 저장 실패 {}: {}", opportunity.id, e);
                e
            })?;
            info!(
                "기회 저장: {} {} 진입 {:.2} 손익비 {:.2}",
                opportunity.id, opportunity.position_type, opportunity.entry.price, opportunity.risk_reward.ratio
            );
        }

        Ok(merge_opportunities(existing, detected))
    }
}

/// 저장된 활성 기회와 새 기회 병합
///
/// 같은 id면 새 기회가 우선합니다. 결과는 타임스탬프 내림차순, 같은 시각이면 id 오름차순.
pub fn merge_opportunities(
    existing: Vec<TradingOpportunity>,
    detected: Vec<TradingOpportunity>,
) -> Vec<TradingOpportunity> {
    let mut merged: HashMap<String, TradingOpportunity> =
        existing.into_iter().map(|o| (o.id.clone(), o)).collect();
    for opportunity in detected {
        merged.insert(opportunity.id.clone(), opportunity);
    }

    let mut result: Vec<TradingOpportunity> = merged.into_values().collect();
    result.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
    result
}
