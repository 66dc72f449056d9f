pub mod memory;
pub mod record;

use crate::error::StorageResult;
use crate::strategy::TradingOpportunity;
use crate::strategy::opportunity::OpportunityStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::InMemoryOpportunityRepository;
pub use record::OpportunityRecord;

/// 기회 저장소 인터페이스
///
/// 탐지기에 생성 시점에 주입되며, 구현체가 자체 I/O 정책(재시도, 타임아웃)을 가집니다.
/// 조회 결과는 모두 타임스탬프 내림차순입니다.
#[async_trait]
pub trait OpportunityRepository: Send + Sync {
    /// id 기준 upsert
    async fn save(&self, opportunity: &TradingOpportunity) -> StorageResult<()>;

    async fn find_by_id(&self, id: &str) -> StorageResult<Option<TradingOpportunity>>;

    /// 심볼과 상태로 조회
    async fn find_by_symbol(&self, symbol: &str, status: OpportunityStatus) -> StorageResult<Vec<TradingOpportunity>>;

    /// 모든 심볼의 활성 기회
    async fn find_active(&self) -> StorageResult<Vec<TradingOpportunity>>;

    /// 상태 변경, 해당 id가 없으면 `StorageError::NotFound`
    async fn update_status(&self, id: &str, status: OpportunityStatus) -> StorageResult<()>;

    /// 만료 시각이 지난 활성 기회를 EXPIRED로 전환
    ///
    /// # Returns
    /// * `usize` - 전환된 기회 수
    async fn expire_overdue(&self, now: DateTime<Utc>) -> StorageResult<usize>;

    /// 탐지 시각이 `now - days` 이전인 기회 삭제
    ///
    /// # Returns
    /// * `usize` - 삭제된 기회 수
    async fn delete_older_than(&self, days: i64, now: DateTime<Utc>) -> StorageResult<usize>;

    /// 심볼의 최근 기회 이력 (상태 무관, 최대 `limit`개)
    async fn get_history(&self, symbol: &str, limit: usize) -> StorageResult<Vec<TradingOpportunity>>;
}
