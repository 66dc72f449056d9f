use crate::error::{StorageError, StorageResult};
use crate::strategy::opportunity::{
    ConfidenceInfo, EntryPoint, RiskRewardInfo, StopLossInfo, TakeProfitLevel, TradingOpportunity, ValidityInfo,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// 저장소 행 표현
///
/// 중첩 목록(진입 근거, 익절 사다리, 신뢰도 요인)은 JSON 텍스트로 보관하고
/// 읽을 때 다시 복원합니다. 열거형은 직렬화 문자열로 저장합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    pub id: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub position_type: String,
    pub strategy: String,
    pub timestamp: i64,
    pub entry_price: f64,
    pub entry_reasons: String,
    pub stop_loss_price: f64,
    pub stop_loss_distance_pct: f64,
    pub stop_loss_method: String,
    pub take_profit_levels: String,
    pub risk_reward_ratio: f64,
    pub risk_amount: f64,
    pub reward_amount: f64,
    pub risk_pct: f64,
    pub reward_pct: f64,
    pub confidence_score: u32,
    pub confidence_level: String,
    pub confidence_factors: String,
    pub expires_at: i64,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 단위 열거형을 직렬화 문자열로 변환 (예: `PositionType::Long` → "LONG")
fn enum_to_text<T: Serialize>(value: &T) -> StorageResult<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(text) => Ok(text),
        other => Err(StorageError::Backend(format!("문자열이 아닌 열거형 값: {}", other))),
    }
}

fn enum_from_text<T: DeserializeOwned>(text: &str) -> StorageResult<T> {
    Ok(serde_json::from_value(serde_json::Value::String(text.to_string()))?)
}

impl OpportunityRecord {
    /// 기회를 저장소 행으로 변환
    ///
    /// # Arguments
    /// * `opportunity` - 저장할 기회
    /// * `now_ms` - 생성/수정 시각 (밀리초)
    pub fn from_opportunity(opportunity: &TradingOpportunity, now_ms: i64) -> StorageResult<OpportunityRecord> {
        Ok(OpportunityRecord {
            id: opportunity.id.clone(),
            symbol: opportunity.symbol.clone(),
            position_type: enum_to_text(&opportunity.position_type)?,
            strategy: enum_to_text(&opportunity.strategy)?,
            timestamp: opportunity.timestamp,
            entry_price: opportunity.entry.price,
            entry_reasons: serde_json::to_string(&opportunity.entry.reasons)?,
            stop_loss_price: opportunity.stop_loss.price,
            stop_loss_distance_pct: opportunity.stop_loss.distance_pct,
            stop_loss_method: enum_to_text(&opportunity.stop_loss.method)?,
            take_profit_levels: serde_json::to_string(&opportunity.take_profit)?,
            risk_reward_ratio: opportunity.risk_reward.ratio,
            risk_amount: opportunity.risk_reward.risk_amount,
            reward_amount: opportunity.risk_reward.reward_amount,
            risk_pct: opportunity.risk_reward.risk_pct,
            reward_pct: opportunity.risk_reward.reward_pct,
            confidence_score: opportunity.confidence.score,
            confidence_level: enum_to_text(&opportunity.confidence.level)?,
            confidence_factors: serde_json::to_string(&opportunity.confidence.factors)?,
            expires_at: opportunity.validity.expires_at,
            status: enum_to_text(&opportunity.validity.status)?,
            created_at: now_ms,
            updated_at: now_ms,
        })
    }
}

impl TryFrom<&TradingOpportunity> for OpportunityRecord {
    type Error = StorageError;

    fn try_from(opportunity: &TradingOpportunity) -> Result<Self, Self::Error> {
        OpportunityRecord::from_opportunity(opportunity, Utc::now().timestamp_millis())
    }
}

impl TryFrom<&OpportunityRecord> for TradingOpportunity {
    type Error = StorageError;

    fn try_from(record: &OpportunityRecord) -> Result<Self, Self::Error> {
        let reasons: Vec<String> = serde_json::from_str(&record.entry_reasons)?;
        let take_profit: Vec<TakeProfitLevel> = serde_json::from_str(&record.take_profit_levels)?;
        let factors: Vec<String> = serde_json::from_str(&record.confidence_factors)?;

        Ok(TradingOpportunity {
            id: record.id.clone(),
            symbol: record.symbol.clone(),
            position_type: enum_from_text(&record.position_type)?,
            strategy: enum_from_text(&record.strategy)?,
            timestamp: record.timestamp,
            entry: EntryPoint {
                price: record.entry_price,
                reasons,
            },
            stop_loss: StopLossInfo {
                price: record.stop_loss_price,
                distance_pct: record.stop_loss_distance_pct,
                method: enum_from_text(&record.stop_loss_method)?,
            },
            take_profit,
            risk_reward: RiskRewardInfo {
                ratio: record.risk_reward_ratio,
                risk_amount: record.risk_amount,
                reward_amount: record.reward_amount,
                risk_pct: record.risk_pct,
                reward_pct: record.reward_pct,
            },
            confidence: ConfidenceInfo {
                score: record.confidence_score,
                level: enum_from_text(&record.confidence_level)?,
                factors,
            },
            validity: ValidityInfo {
                expires_at: record.expires_at,
                status: enum_from_text(&record.status)?,
            },
        })
    }
}

impl TryFrom<OpportunityRecord> for TradingOpportunity {
    type Error = StorageError;

    fn try_from(record: OpportunityRecord) -> Result<Self, Self::Error> {
        TradingOpportunity::try_from(&record)
    }
}
