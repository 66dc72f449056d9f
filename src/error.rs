//! 분석 파이프라인 오류 타입.

use crate::config_loader::ConfigError;
use thiserror::Error;

/// 분석/탐지 과정에서 발생하는 오류.
///
/// 지표 계산은 데이터가 부족해도 오류를 내지 않고 기본값을 반환합니다.
/// 이 타입은 분석 진입점의 최소 캔들 수 검사와 외부 협력자 실패만 다룹니다.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// 분석에 필요한 캔들 수 부족
    #[error("insufficient data: need at least {required} candles, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// 시세 데이터 조회 실패
    #[error("market data fetch failed for {symbol}: {source}")]
    MarketData {
        symbol: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 저장소 오류
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// 설정 오류
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 지원되지 않는 캔들 간격
    #[error("invalid interval: {0}")]
    InvalidInterval(String),
}

/// 기회 저장소 오류.
#[derive(Debug, Error)]
pub enum StorageError {
    /// JSON 직렬화/역직렬화 오류
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 저장소 백엔드 오류
    #[error("backend error: {0}")]
    Backend(String),

    /// 레코드를 찾을 수 없음
    #[error("record not found: {0}")]
    NotFound(String),
}

/// 저장소 결과 타입
pub type StorageResult<T> = Result<T, StorageError>;
