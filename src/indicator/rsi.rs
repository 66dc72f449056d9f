use serde::{Deserialize, Serialize};

/// RSI 기본값 (중립)
pub const NEUTRAL_RSI: f64 = 50.0;

/// Wilder 방식 RSI 계산
///
/// 첫 평균 상승/하락폭은 처음 `period`개 변화량의 단순평균이고
/// 이후 `(이전 평균 * (period-1) + 현재 값) / period` 로 평활화합니다.
///
/// # Arguments
/// * `closes` - 오름차순 종가 목록
/// * `period` - RSI 기간
///
/// # Returns
/// * `f64` - 최신 RSI. 데이터가 부족하거나 가격 변화가 전혀 없으면 50.0
pub fn calculate_rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = closes
        .windows(2)
        .map(|pair| {
            let change = pair[1] - pair[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let p = period as f64;
    let mut avg_gain = gains[..period].iter().sum::<f64>() / p;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / p;

    for i in period..gains.len() {
        avg_gain = (avg_gain * (p - 1.0) + gains[i]) / p;
        avg_loss = (avg_loss * (p - 1.0) + losses[i]) / p;
    }

    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { NEUTRAL_RSI } else { 100.0 };
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// RSI 스냅샷 (6/14 기간)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiIndicator {
    pub rsi6: f64,
    pub rsi14: f64,
}

impl Default for RsiIndicator {
    fn default() -> Self {
        RsiIndicator {
            rsi6: NEUTRAL_RSI,
            rsi14: NEUTRAL_RSI,
        }
    }
}

impl RsiIndicator {
    /// 최소 필요 종가 수 (14 + 1)
    pub const MIN_CLOSES: usize = 15;

    pub fn from_closes(closes: &[f64]) -> RsiIndicator {
        if closes.len() < Self::MIN_CLOSES {
            log::debug!("RSI 계산 데이터 부족: {}개", closes.len());
            return RsiIndicator::default();
        }

        RsiIndicator {
            rsi6: calculate_rsi(closes, 6),
            rsi14: calculate_rsi(closes, 14),
        }
    }

    /// 과매수 여부 (RSI14 기준)
    pub fn is_overbought(&self) -> bool {
        self.rsi14 >= 70.0
    }

    /// 과매도 여부 (RSI14 기준)
    pub fn is_oversold(&self) -> bool {
        self.rsi14 <= 30.0
    }
}
