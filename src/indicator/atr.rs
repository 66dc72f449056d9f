use crate::model::Candle;
use serde::{Deserialize, Serialize};

/// 단일 캔들의 True Range
///
/// max(고가-저가, |고가-이전종가|, |저가-이전종가|), 첫 캔들은 고가-저가
pub fn true_range<C: Candle>(candles: &[C], index: usize) -> f64 {
    let candle = &candles[index];
    let high_low = candle.high_price() - candle.low_price();
    if index == 0 {
        return high_low;
    }

    let prev_close = candles[index - 1].close_price();
    high_low
        .max((candle.high_price() - prev_close).abs())
        .max((candle.low_price() - prev_close).abs())
}

/// 평균 실제 범위(ATR) 시계열
///
/// 첫 값은 처음 `period`개 True Range의 단순평균이며,
/// 이후는 Wilder 평활화 `(이전 ATR * (period-1) + TR) / period` 로 갱신됩니다.
/// `values[k]`는 캔들 `k + period - 1`번째 위치에 대응합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct ATR {
    period: usize,
    values: Vec<f64>,
}

impl ATR {
    /// 캔들 목록에서 ATR 계산
    ///
    /// 캔들 수가 `period + 1`보다 적으면 빈 시계열을 반환합니다.
    pub fn from_candles<C: Candle>(candles: &[C], period: usize) -> ATR {
        if period == 0 || candles.len() < period + 1 {
            log::debug!("ATR 계산 데이터 부족: {}개 (필요: {})", candles.len(), period + 1);
            return ATR {
                period,
                values: Vec::new(),
            };
        }

        let ranges: Vec<f64> = (0..candles.len()).map(|i| true_range(candles, i)).collect();

        let mut values = Vec::with_capacity(candles.len() - period + 1);
        values.push(ranges[..period].iter().sum::<f64>() / period as f64);
        for &tr in &ranges[period..] {
            let prev = values[values.len() - 1];
            values.push((prev * (period as f64 - 1.0) + tr) / period as f64);
        }

        ATR { period, values }
    }

    /// 최신 ATR 값 (계산 불가 시 0.0)
    pub fn get(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 현재 ATR이 최근 `period`개 ATR 평균의 `threshold`배를 넘는지 확인
    ///
    /// ATR 값이 `period * 2`개 미만이면 항상 `false`입니다.
    pub fn is_high_volatility(&self, threshold: f64) -> bool {
        if self.period == 0 || self.values.len() < self.period * 2 {
            return false;
        }

        let recent = &self.values[self.values.len() - self.period..];
        let avg = recent.iter().sum::<f64>() / self.period as f64;
        self.get() > avg * threshold
    }
}

/// ATR 스냅샷
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AtrIndicator {
    /// 최신 ATR 값
    pub value: f64,
    /// 사용된 기간
    pub period: usize,
}

impl From<&ATR> for AtrIndicator {
    fn from(atr: &ATR) -> Self {
        AtrIndicator {
            value: atr.get(),
            period: atr.period(),
        }
    }
}
