use crate::error::AnalysisError;
use crate::model::{CandleInterval, OhlcvCandle};
use async_trait::async_trait;
use log::{debug, error};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

/// 시세 데이터 협력자
///
/// 조회 실패는 재시도하지 않고 원인과 함께 `AnalysisError::MarketData`로 전달합니다.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// 캔들 조회
    ///
    /// # Arguments
    /// * `symbol` - 심볼 (예: "ETHUSDT")
    /// * `interval` - 캔들 간격
    /// * `limit` - 최대 캔들 수 (최근 것부터)
    ///
    /// # Returns
    /// * `Result<Vec<OhlcvCandle>, AnalysisError>` - 오름차순 캔들 목록
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        limit: usize,
    ) -> Result<Vec<OhlcvCandle>, AnalysisError>;
}

/// 오름차순 정렬 후 최근 `limit`개만 남김
fn take_latest(mut candles: Vec<OhlcvCandle>, limit: usize) -> Vec<OhlcvCandle> {
    candles.sort_by_key(|c| c.timestamp);
    let skip = candles.len().saturating_sub(limit);
    candles.split_off(skip)
}

fn market_data_error(symbol: &str, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> AnalysisError {
    AnalysisError::MarketData {
        symbol: symbol.to_string(),
        source: source.into(),
    }
}

/// JSON 파일 시세 데이터
///
/// `{dir}/{SYMBOL}_{interval}.json` 파일의 `OhlcvCandle` 배열을 읽습니다.
#[derive(Debug, Clone)]
pub struct JsonFileMarketData {
    dir: PathBuf,
}

impl JsonFileMarketData {
    pub fn new(dir: impl Into<PathBuf>) -> JsonFileMarketData {
        JsonFileMarketData { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str, interval: CandleInterval) -> PathBuf {
        self.dir.join(format!("{}_{}.json", symbol.to_uppercase(), interval))
    }
}

#[async_trait]
impl MarketDataSource for JsonFileMarketData {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        limit: usize,
    ) -> Result<Vec<OhlcvCandle>, AnalysisError> {
        let path = self.path_for(symbol, interval);
        debug!("시세 파일 읽기: {}", path.display());

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            error!("시세 파일 읽기 실패 {}: {}", path.display(), e);
            market_data_error(symbol, e)
        })?;
        let candles: Vec<OhlcvCandle> = serde_json::from_str(&content).map_err(|e| {
            error!("시세 파일 파싱 실패 {}: {}", path.display(), e);
            market_data_error(symbol, e)
        })?;

        Ok(take_latest(candles, limit))
    }
}

/// 메모리 고정 시세 데이터
#[derive(Debug, Clone, Default)]
pub struct StaticMarketData {
    series: HashMap<(String, CandleInterval), Vec<OhlcvCandle>>,
}

impl StaticMarketData {
    pub fn new() -> StaticMarketData {
        StaticMarketData::default()
    }

    /// 심볼/간격에 캔들 등록
    pub fn with_series(mut self, symbol: &str, interval: CandleInterval, candles: Vec<OhlcvCandle>) -> Self {
        self.series.insert((symbol.to_string(), interval), candles);
        self
    }
}

#[async_trait]
impl MarketDataSource for StaticMarketData {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        limit: usize,
    ) -> Result<Vec<OhlcvCandle>, AnalysisError> {
        match self.series.get(&(symbol.to_string(), interval)) {
            Some(candles) => Ok(take_latest(candles.clone(), limit)),
            None => Err(market_data_error(
                symbol,
                io::Error::new(io::ErrorKind::NotFound, format!("{} {} 데이터 없음", symbol, interval)),
            )),
        }
    }
}
