use crate::indicator::ema::EMA;
use crate::indicator::utils::mean;
use serde::{Deserialize, Serialize};

/// MACD 스냅샷
///
/// DIF = EMA(12) - EMA(26), DEA = DIF의 9기간 EMA, 히스토그램 = 2 × (DIF - DEA)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacdIndicator {
    pub dif: f64,
    pub dea: f64,
    pub histogram: f64,
}

/// MACD 계산 파라미터
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdParams {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        MacdParams {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl MacdIndicator {
    /// 기본 파라미터(12/26/9)로 계산
    pub fn from_closes(closes: &[f64]) -> MacdIndicator {
        Self::with_params(closes, MacdParams::default())
    }

    /// 지정한 파라미터로 계산
    ///
    /// 종가 수가 장기 기간보다 적으면 0으로 채워진 기본값을 반환합니다.
    /// DIF 값이 시그널 기간보다 적을 때는 가용 DIF의 평균을 DEA로 사용합니다.
    pub fn with_params(closes: &[f64], params: MacdParams) -> MacdIndicator {
        if params.fast_period >= params.slow_period || closes.len() < params.slow_period {
            log::debug!("MACD 계산 데이터 부족: {}개", closes.len());
            return MacdIndicator::default();
        }

        let fast = EMA::from_prices(closes, params.fast_period);
        let slow = EMA::from_prices(closes, params.slow_period);

        // 두 EMA를 같은 캔들 위치로 정렬
        let offset = params.slow_period - params.fast_period;
        let dif_series: Vec<f64> = slow
            .values()
            .iter()
            .zip(&fast.values()[offset..])
            .map(|(slow, fast)| fast - slow)
            .collect();

        let dif = dif_series.last().copied().unwrap_or(0.0);
        let signal = EMA::from_prices(&dif_series, params.signal_period);
        let dea = if signal.is_ready() {
            signal.get()
        } else {
            mean(&dif_series)
        };

        MacdIndicator {
            dif,
            dea,
            histogram: 2.0 * (dif - dea),
        }
    }

    /// DIF와 DEA, 히스토그램이 모두 양수
    pub fn is_bullish(&self) -> bool {
        self.dif > self.dea && self.histogram > 0.0
    }

    /// DIF와 DEA, 히스토그램이 모두 음수 방향
    pub fn is_bearish(&self) -> bool {
        self.dif < self.dea && self.histogram < 0.0
    }
}
