use crate::error::{StorageError, StorageResult};
use crate::repository::OpportunityRepository;
use crate::repository::record::OpportunityRecord;
use crate::strategy::TradingOpportunity;
use crate::strategy::opportunity::OpportunityStatus;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// 메모리 기반 기회 저장소
///
/// 레코드는 직렬화된 행 형태로 보관되어 실제 저장소와 같은 변환 경로를 거칩니다.
#[derive(Debug, Default)]
pub struct InMemoryOpportunityRepository {
    records: RwLock<HashMap<String, OpportunityRecord>>,
}

impl InMemoryOpportunityRepository {
    pub fn new() -> InMemoryOpportunityRepository {
        InMemoryOpportunityRepository::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// 조건에 맞는 레코드를 타임스탬프 내림차순으로 복원
    async fn query<F>(&self, predicate: F, limit: Option<usize>) -> StorageResult<Vec<TradingOpportunity>>
    where
        F: Fn(&OpportunityRecord) -> bool,
    {
        let records = self.records.read().await;
        let mut matched: Vec<&OpportunityRecord> = records.values().filter(|r| predicate(r)).collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        if let Some(limit) = limit {
            matched.truncate(limit);
        }
        matched.into_iter().map(TradingOpportunity::try_from).collect()
    }
}

#[async_trait]
impl OpportunityRepository for InMemoryOpportunityRepository {
    async fn save(&self, opportunity: &TradingOpportunity) -> StorageResult<()> {
        let now_ms = Utc::now().timestamp_millis();
        let mut record = OpportunityRecord::from_opportunity(opportunity, now_ms)?;

        let mut records = self.records.write().await;
        if let Some(existing) = records.get(&record.id) {
            record.created_at = existing.created_at;
        }
        debug!("기회 저장: {}", record.id);
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> StorageResult<Option<TradingOpportunity>> {
        let records = self.records.read().await;
        records.get(id).map(TradingOpportunity::try_from).transpose()
    }

    async fn find_by_symbol(&self, symbol: &str, status: OpportunityStatus) -> StorageResult<Vec<TradingOpportunity>> {
        let status = status.to_string();
        self.query(|r| r.symbol == symbol && r.status == status, None).await
    }

    async fn find_active(&self) -> StorageResult<Vec<TradingOpportunity>> {
        let active = OpportunityStatus::Active.to_string();
        self.query(|r| r.status == active, None).await
    }

    async fn update_status(&self, id: &str, status: OpportunityStatus) -> StorageResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        record.status = status.to_string();
        record.updated_at = Utc::now().timestamp_millis();
        Ok(())
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> StorageResult<usize> {
        let now_ms = now.timestamp_millis();
        let active = OpportunityStatus::Active.to_string();
        let expired = OpportunityStatus::Expired.to_string();

        let mut records = self.records.write().await;
        let mut count = 0;
        for record in records.values_mut() {
            if record.status == active && record.expires_at < now_ms {
                record.status = expired.clone();
                record.updated_at = now_ms;
                count += 1;
            }
        }
        if count > 0 {
            info!("만료된 기회 {}개 EXPIRED 처리", count);
        }
        Ok(count)
    }

    async fn delete_older_than(&self, days: i64, now: DateTime<Utc>) -> StorageResult<usize> {
        let cutoff = (now - Duration::days(days)).timestamp_millis();
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.timestamp >= cutoff);
        let removed = before - records.len();
        if removed > 0 {
            info!("{}일 이전 기회 {}개 삭제", days, removed);
        }
        Ok(removed)
    }

    async fn get_history(&self, symbol: &str, limit: usize) -> StorageResult<Vec<TradingOpportunity>> {
        self.query(|r| r.symbol == symbol, Some(limit)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::record::tests::sample_opportunity;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_save_is_upsert_by_id() {
        let repo = InMemoryOpportunityRepository::new();
        let mut opportunity = sample_opportunity("ETHUSDT", 1_000, i64::MAX);
        repo.save(&opportunity).await.unwrap();

        opportunity.entry.price = 101.0;
        repo.save(&opportunity).await.unwrap();

        assert_eq!(repo.len().await, 1);
        let stored = repo.find_by_id(&opportunity.id).await.unwrap().unwrap();
        assert_eq!(stored.entry.price, 101.0);
    }

    #[tokio::test]
    async fn test_queries_ordered_by_timestamp_desc() {
        let repo = InMemoryOpportunityRepository::new();
        for ts in [1_000, 3_000, 2_000] {
            repo.save(&sample_opportunity("ETHUSDT", ts, i64::MAX)).await.unwrap();
        }
        repo.save(&sample_opportunity("BTCUSDT", 5_000, i64::MAX)).await.unwrap();

        let found = repo.find_by_symbol("ETHUSDT", OpportunityStatus::Active).await.unwrap();
        let timestamps: Vec<i64> = found.iter().map(|o| o.timestamp).collect();
        assert_eq!(timestamps, vec![3_000, 2_000, 1_000]);

        assert_eq!(repo.find_active().await.unwrap().len(), 4);
        let history = repo.get_history("ETHUSDT", 2).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].timestamp, 3_000);
    }

    #[tokio::test]
    async fn test_expire_overdue_only_flips_active() {
        let repo = InMemoryOpportunityRepository::new();
        let now_ms = now().timestamp_millis();
        repo.save(&sample_opportunity("ETHUSDT", 1_000, now_ms - 1)).await.unwrap();
        repo.save(&sample_opportunity("ETHUSDT", 2_000, now_ms + 1)).await.unwrap();

        assert_eq!(repo.expire_overdue(now()).await.unwrap(), 1);
        // 이미 만료된 기회는 다시 세지 않음
        assert_eq!(repo.expire_overdue(now()).await.unwrap(), 0);

        let active = repo.find_by_symbol("ETHUSDT", OpportunityStatus::Active).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].timestamp, 2_000);
        let expired = repo.find_by_symbol("ETHUSDT", OpportunityStatus::Expired).await.unwrap();
        assert_eq!(expired[0].validity.status, OpportunityStatus::Expired);
    }

    #[tokio::test]
    async fn test_update_status_missing_id() {
        let repo = InMemoryOpportunityRepository::new();
        let result = repo.update_status("missing", OpportunityStatus::Expired).await;
        assert!(matches!(result, Err(StorageError::NotFound(id)) if id == "missing"));
    }

    #[tokio::test]
    async fn test_delete_older_than() {
        let repo = InMemoryOpportunityRepository::new();
        let old = (now() - Duration::days(8)).timestamp_millis();
        let recent = (now() - Duration::days(1)).timestamp_millis();
        repo.save(&sample_opportunity("ETHUSDT", old, i64::MAX)).await.unwrap();
        repo.save(&sample_opportunity("ETHUSDT", recent, i64::MAX)).await.unwrap();

        assert_eq!(repo.delete_older_than(7, now()).await.unwrap(), 1);
        let remaining = repo.get_history("ETHUSDT", 10).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].timestamp, recent);
    }
}
