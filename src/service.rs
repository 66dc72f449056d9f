use crate::analysis::{AnalysisResult, MarketAnalyzer};
use crate::candle_series::CandleSeries;
use crate::config_loader::AnalysisConfig;
use crate::error::AnalysisError;
use crate::market_data::MarketDataSource;
use crate::model::{CandleInterval, OhlcvCandle};
use crate::repository::OpportunityRepository;
use crate::strategy::{OpportunitiesResponse, OpportunityDetector};
use chrono::{DateTime, Utc};
use log::{error, info};
use std::sync::Arc;

/// 시세 조회 → 분석 → 기회 탐지 오케스트레이션
pub struct MarketAnalysisService<M: MarketDataSource, R: OpportunityRepository> {
    market_data: M,
    analyzer: MarketAnalyzer,
    detector: OpportunityDetector<OhlcvCandle, R>,
}

impl<M: MarketDataSource, R: OpportunityRepository> MarketAnalysisService<M, R> {
    pub fn new(market_data: M, repository: Arc<R>, config: AnalysisConfig) -> MarketAnalysisService<M, R> {
        let detector = OpportunityDetector::new(repository, config.opportunity_validity_hours);
        MarketAnalysisService {
            market_data,
            analyzer: MarketAnalyzer::new(config),
            detector,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.analyzer.config()
    }

    pub fn detector(&self) -> &OpportunityDetector<OhlcvCandle, R> {
        &self.detector
    }

    async fn load_series(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<(CandleInterval, CandleSeries<OhlcvCandle>), AnalysisError> {
        let interval: CandleInterval = interval.parse().map_err(AnalysisError::InvalidInterval)?;
        let limit = self.config().clamp_limit(limit);
        let candles = self.market_data.fetch_candles(symbol, interval, limit).await?;
        Ok((interval, CandleSeries::new(candles)))
    }

    /// 시장 분석
    ///
    /// # Arguments
    /// * `symbol` - 심볼
    /// * `interval` - 캔들 간격 문자열
    /// * `limit` - 조회 캔들 수, (0, max_limit] 밖이면 기본값
    pub async fn analyze(&self, symbol: &str, interval: &str, limit: usize) -> Result<AnalysisResult, AnalysisError> {
        let (interval, series) = self.load_series(symbol, interval, limit).await?;
        self.analyzer.analyze_interval(symbol, interval, &series)
    }

    /// 기회 조회 (현재 시각 기준)
    ///
    /// `min_risk_reward`가 `None`이면 설정의 기본 최소 손익비를 사용합니다.
    pub async fn opportunities(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
        min_risk_reward: Option<f64>,
    ) -> Result<OpportunitiesResponse, AnalysisError> {
        let (_, response) = self
            .analyze_with_opportunities(symbol, interval, limit, min_risk_reward, Utc::now())
            .await?;
        Ok(response)
    }

    /// 한 번의 시세 조회로 분석과 기회 탐지를 함께 실행
    pub async fn analyze_with_opportunities(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
        min_risk_reward: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<(AnalysisResult, OpportunitiesResponse), AnalysisError> {
        let (interval, series) = self.load_series(symbol, interval, limit).await?;
        let analysis = self.analyzer.analyze_interval(symbol, interval, &series)?;

        let min_risk_reward = min_risk_reward.unwrap_or(self.config().min_risk_reward);
        let opportunities = self
            .detector
            .detect(series.items(), &analysis, min_risk_reward, now)
            .await
            .map_err(|e| {
                error!("{} 기회 탐지 실패: {}", symbol, e);
                e
            })?;

        let response = OpportunitiesResponse::from_opportunities(opportunities);
        info!(
            "{} {} 기회 {}개 (평균 손익비 {:.2})",
            symbol, interval, response.summary.total_count, response.summary.avg_risk_reward
        );
        Ok((analysis, response))
    }
}
