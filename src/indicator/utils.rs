use crate::model::Candle;
use ta_lib::simple_moving_average;

/// 이동 구간별 단순이동평균 시계열
///
/// 결과의 `i`번째 값은 `values[i..i + period]`의 평균입니다.
/// 값이 기간보다 적거나 기간이 2 미만이면 빈 목록을 반환합니다.
pub fn sma_series(values: &[f64], period: usize) -> Vec<f64> {
    if period < 2 || values.len() < period {
        return Vec::new();
    }

    // ta-lib으로 SMA 계산
    match simple_moving_average(values, Some(period)) {
        Ok((result, _)) => result,
        Err(e) => {
            log::warn!("SMA({}) 계산 실패: {:?}", period, e);
            Vec::new()
        }
    }
}

/// 산술 평균 (빈 목록이면 0.0)
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// 값을 [min, max] 범위로 제한
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// 기준가 대비 거리 (%)
pub fn percent_distance(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        return 0.0;
    }
    (to - from) / from * 100.0
}

/// 캔들 구간의 최고가
pub fn highest_high<C: Candle>(candles: &[C]) -> f64 {
    candles
        .iter()
        .map(|candle| candle.high_price())
        .fold(f64::MIN, f64::max)
}

/// 캔들 구간의 최저가
pub fn lowest_low<C: Candle>(candles: &[C]) -> f64 {
    candles
        .iter()
        .map(|candle| candle.low_price())
        .fold(f64::MAX, f64::min)
}

/// 스윙 고점 위치 목록
///
/// 앞뒤 `radius`개 캔들 중 고가가 같거나 더 높은 캔들이 하나라도 있으면 제외됩니다.
pub fn swing_high_indices<C: Candle>(candles: &[C], radius: usize) -> Vec<usize> {
    swing_indices(candles, radius, |other, pivot| {
        other.high_price() >= pivot.high_price()
    })
}

/// 스윙 저점 위치 목록
///
/// 앞뒤 `radius`개 캔들 중 저가가 같거나 더 낮은 캔들이 하나라도 있으면 제외됩니다.
pub fn swing_low_indices<C: Candle>(candles: &[C], radius: usize) -> Vec<usize> {
    swing_indices(candles, radius, |other, pivot| {
        other.low_price() <= pivot.low_price()
    })
}

fn swing_indices<C: Candle>(
    candles: &[C],
    radius: usize,
    disqualifies: impl Fn(&C, &C) -> bool,
) -> Vec<usize> {
    if radius == 0 || candles.len() < radius * 2 + 1 {
        return Vec::new();
    }

    (radius..candles.len() - radius)
        .filter(|&i| {
            (i - radius..=i + radius)
                .filter(|&j| j != i)
                .all(|j| !disqualifies(&candles[j], &candles[i]))
        })
        .collect()
}
