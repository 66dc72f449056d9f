use crate::indicator::utils::{clamp, highest_high, lowest_low, sma_series};
use crate::model::Candle;
use serde::{Deserialize, Serialize};

/// RSV 기간
const RSV_PERIOD: usize = 9;
/// K 평활 기간
const SMOOTH_K: usize = 3;
/// D 평활 기간
const SMOOTH_D: usize = 3;

/// KDJ 스냅샷
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KdjIndicator {
    pub k: f64,
    pub d: f64,
    pub j: f64,
}

/// 9캔들 구간의 RSV = (종가 - 최저가) / (최고가 - 최저가) × 100
///
/// 최고가와 최저가가 같으면 0.0
fn rsv<C: Candle>(window: &[C]) -> f64 {
    let high = highest_high(window);
    let low = lowest_low(window);
    if high == low {
        return 0.0;
    }
    match window.last() {
        Some(last) => (last.close_price() - low) / (high - low) * 100.0,
        None => 0.0,
    }
}

impl KdjIndicator {
    /// 전체 이력 기반 KDJ (분석 파이프라인 기본 경로)
    ///
    /// 각 위치의 9캔들 RSV를 구한 뒤 K = RSV의 3기간 SMA, D = K의 3기간 SMA,
    /// J = 3K - 2D 로 계산합니다. SMA를 만들 만큼 값이 없으면 직전 단계 값을 그대로 씁니다.
    pub fn from_history<C: Candle>(candles: &[C]) -> KdjIndicator {
        if candles.len() < RSV_PERIOD {
            log::debug!("KDJ 계산 데이터 부족: {}개", candles.len());
            return KdjIndicator::default();
        }

        let rsv_values: Vec<f64> = candles.windows(RSV_PERIOD).map(rsv).collect();

        let mut k_values = sma_series(&rsv_values, SMOOTH_K);
        if k_values.is_empty() {
            k_values = rsv_values;
        }
        let mut d_values = sma_series(&k_values, SMOOTH_D);
        if d_values.is_empty() {
            d_values = k_values.clone();
        }

        let k = k_values.last().copied().unwrap_or(0.0);
        let d = d_values.last().copied().unwrap_or(0.0);

        KdjIndicator { k, d, j: 3.0 * k - 2.0 * d }
    }

    /// 마지막 9캔들만 사용하는 간이 KDJ
    ///
    /// K = D = RSV 로 근사하고 K, D는 [0, 100], J는 [-20, 120] 으로 제한합니다.
    pub fn quick<C: Candle>(candles: &[C]) -> KdjIndicator {
        if candles.len() < RSV_PERIOD {
            return KdjIndicator::default();
        }

        let value = rsv(&candles[candles.len() - RSV_PERIOD..]);
        let k = clamp(value, 0.0, 100.0);
        let d = clamp(value, 0.0, 100.0);
        let j = clamp(3.0 * value - 2.0 * value, -20.0, 120.0);

        KdjIndicator { k, d, j }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OhlcvCandle;

    fn candles_from_closes(closes: &[f64]) -> Vec<OhlcvCandle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| OhlcvCandle::new(i as i64, c, c + 1.0, c - 1.0, c, 1.0))
            .collect()
    }

    #[test]
    fn test_history_is_sma_of_sma() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + ((i * 7) % 5) as f64).collect();
        let candles = candles_from_closes(&closes);

        let rsv_values: Vec<f64> = candles.windows(9).map(rsv).collect();
        let k_values = sma_series(&rsv_values, 3);
        let d_values = sma_series(&k_values, 3);

        let kdj = KdjIndicator::from_history(&candles);
        assert_eq!(kdj.k, *k_values.last().unwrap());
        assert_eq!(kdj.d, *d_values.last().unwrap());
        assert!((kdj.j - (3.0 * kdj.k - 2.0 * kdj.d)).abs() < 1e-12);
    }

    #[test]
    fn test_history_range_for_trending_series() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let kdj = KdjIndicator::from_history(&candles_from_closes(&closes));
        assert!((0.0..=100.0).contains(&kdj.k));
        assert!((0.0..=100.0).contains(&kdj.d));
        assert!(kdj.k > 80.0);
    }

    #[test]
    fn test_short_history_falls_back() {
        let closes: Vec<f64> = (0..9).map(|i| 100.0 + i as f64).collect();
        let kdj = KdjIndicator::from_history(&candles_from_closes(&closes));
        assert_eq!(kdj.k, kdj.d);
        assert!(kdj.k > 0.0);
    }

    #[test]
    fn test_quick_clamped() {
        let closes: Vec<f64> = (0..12).map(|i| 100.0 - i as f64).collect();
        let kdj = KdjIndicator::quick(&candles_from_closes(&closes));
        assert!((0.0..=100.0).contains(&kdj.k));
        assert!((0.0..=100.0).contains(&kdj.d));
        assert!((-20.0..=120.0).contains(&kdj.j));
        assert_eq!(kdj.k, kdj.d);
    }

    #[test]
    fn test_flat_candles_rsv_zero() {
        let candles = vec![OhlcvCandle::new(0, 100.0, 100.0, 100.0, 100.0, 1.0); 20];
        assert_eq!(KdjIndicator::from_history(&candles), KdjIndicator::default());
        assert_eq!(KdjIndicator::quick(&candles).k, 0.0);
    }
}
