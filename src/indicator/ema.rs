use crate::model::Candle;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use ta_lib::exponential_moving_average;

/// 지수이동평균(EMA) 시계열
///
/// 첫 값은 처음 `period`개 가격의 단순평균이며 이후 값은
/// `(가격 - 이전 EMA) * 2/(period+1) + 이전 EMA` 로 갱신됩니다.
/// `values[k]`는 입력 가격의 `k + period - 1`번째 위치에 대응합니다.
#[derive(Clone, Debug, PartialEq)]
pub struct EMA {
    /// EMA 계산 기간
    period: usize,
    /// 계산된 EMA 값
    values: Vec<f64>,
}

impl Display for EMA {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EMA({}: {:.2})", self.period, self.get())
    }
}

impl EMA {
    /// 가격 목록에서 EMA 계산
    ///
    /// # Arguments
    /// * `prices` - 오름차순 가격 목록
    /// * `period` - EMA 계산 기간
    ///
    /// # Returns
    /// * `EMA` - 가격 수가 기간보다 적거나 기간이 2 미만이면 빈 시계열
    pub fn from_prices(prices: &[f64], period: usize) -> EMA {
        if period < 2 || prices.len() < period {
            return EMA {
                period,
                values: Vec::new(),
            };
        }

        // ta-lib으로 EMA 계산
        let values = match exponential_moving_average(prices, Some(period)) {
            Ok((values, _)) => values,
            Err(e) => {
                log::warn!("EMA({}) 계산 실패: {:?}", period, e);
                Vec::new()
            }
        };

        EMA { period, values }
    }

    /// 캔들 종가로 EMA 계산
    pub fn from_candles<C: Candle>(candles: &[C], period: usize) -> EMA {
        let closes: Vec<f64> = candles.iter().map(|c| c.close_price()).collect();
        Self::from_prices(&closes, period)
    }

    /// 최신 EMA 값 (계산 불가 시 0.0)
    pub fn get(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }

    /// 직전 EMA 값
    pub fn previous(&self) -> Option<f64> {
        self.values.len().checked_sub(2).map(|idx| self.values[idx])
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 값이 하나 이상 계산되었는지 여부
    pub fn is_ready(&self) -> bool {
        !self.values.is_empty()
    }
}

/// 두 EMA 간 교차 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    /// 골든 크로스 (단기선이 장기선을 상향 돌파)
    Golden,
    /// 데드 크로스 (단기선이 장기선을 하향 돌파)
    Death,
    /// 교차 없음
    None,
}

/// 최근 두 값을 비교해 교차 여부를 판단합니다.
pub fn detect_crossover(fast: &EMA, slow: &EMA) -> Crossover {
    let (Some(prev_fast), Some(prev_slow)) = (fast.previous(), slow.previous()) else {
        return Crossover::None;
    };
    let (current_fast, current_slow) = (fast.get(), slow.get());

    if prev_fast <= prev_slow && current_fast > current_slow {
        Crossover::Golden
    } else if prev_fast >= prev_slow && current_fast < current_slow {
        Crossover::Death
    } else {
        Crossover::None
    }
}

/// 최근 캔들 기준 EMA 스냅샷 (9/21/50/200)
///
/// 데이터가 부족한 기간의 값은 0.0입니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmaIndicator {
    pub ema9: f64,
    pub ema21: f64,
    pub ema50: f64,
    pub ema200: f64,
}

impl EmaIndicator {
    pub fn from_closes(closes: &[f64]) -> EmaIndicator {
        EmaIndicator {
            ema9: EMA::from_prices(closes, 9).get(),
            ema21: EMA::from_prices(closes, 21).get(),
            ema50: EMA::from_prices(closes, 50).get(),
            ema200: EMA::from_prices(closes, 200).get(),
        }
    }
}
