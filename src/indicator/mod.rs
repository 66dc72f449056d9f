// 기술적 지표 모듈
// 캔들 시계열에 대한 순수 수치 함수들을 제공합니다.

pub mod atr;
pub mod ema;
pub mod fibonacci;
pub mod kdj;
pub mod macd;
pub mod rsi;
pub mod utils;

use crate::model::Candle;
use serde::{Deserialize, Serialize};

pub use atr::{ATR, AtrIndicator};
pub use ema::{EMA, EmaIndicator};
pub use fibonacci::FibonacciLevels;
pub use kdj::KdjIndicator;
pub use macd::MacdIndicator;
pub use rsi::RsiIndicator;

/// 값들의 배열 정렬 여부를 확인하는 내부 함수
fn is_arrangement(values: &[f64], cmp: impl Fn(f64, f64) -> bool) -> bool {
    values.windows(2).all(|pair| cmp(pair[1], pair[0]))
}

/// 값들이 엄격한 내림차순인지 확인 (단기 > 장기 정배열)
pub fn is_regular_arrangement(values: &[f64]) -> bool {
    is_arrangement(values, |current, prev| current < prev)
}

/// 값들이 엄격한 오름차순인지 확인 (단기 < 장기 역배열)
pub fn is_reverse_arrangement(values: &[f64]) -> bool {
    is_arrangement(values, |current, prev| current > prev)
}

/// 한 번의 분석에서 계산되는 지표 모음
///
/// 모든 값은 윈도우의 마지막 캔들 기준 스냅샷입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub macd: MacdIndicator,
    pub kdj: KdjIndicator,
    pub rsi: RsiIndicator,
    pub atr: AtrIndicator,
    pub ema: EmaIndicator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fibonacci: Option<FibonacciLevels>,
}

impl IndicatorSet {
    /// 캔들 시계열에서 전체 지표 계산
    ///
    /// # Arguments
    /// * `candles` - 오름차순 캔들 목록
    /// * `atr_period` - ATR 기간
    /// * `fibonacci_lookback` - 피보나치 스윙 탐색 구간
    pub fn from_candles<C: Candle>(
        candles: &[C],
        atr_period: usize,
        fibonacci_lookback: usize,
    ) -> IndicatorSet {
        let closes: Vec<f64> = candles.iter().map(|c| c.close_price()).collect();
        let atr = ATR::from_candles(candles, atr_period);

        IndicatorSet {
            macd: MacdIndicator::from_closes(&closes),
            kdj: KdjIndicator::from_history(candles),
            rsi: RsiIndicator::from_closes(&closes),
            atr: AtrIndicator::from(&atr),
            ema: EmaIndicator::from_closes(&closes),
            fibonacci: FibonacciLevels::from_candles(candles, fibonacci_lookback),
        }
    }
}
