use crate::indicator::utils::clamp;
use crate::indicator::{KdjIndicator, MacdIndicator, RsiIndicator};
use crate::model::{Candle, TrendDirection};
use serde::{Deserialize, Serialize};

/// 지표 융합 기반 추세 판단 결과
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    /// 추세 강도 (0~1)
    pub strength: f64,
    /// 추세 전환 확률 (0~1)
    pub change_probability: f64,
}

impl Default for TrendAnalysis {
    fn default() -> Self {
        TrendAnalysis {
            direction: TrendDirection::Sideways,
            strength: 0.5,
            change_probability: 0.5,
        }
    }
}

/// 지표 가중치 (MACD / KDJ / RSI)
const MACD_WEIGHT: f64 = 0.4;
const KDJ_WEIGHT: f64 = 0.3;
const RSI_WEIGHT: f64 = 0.3;

/// 추세 분석기
///
/// MACD, KDJ, RSI를 각각 0~1 상승 척도(0.5 = 중립)로 점수화한 뒤
/// 가중 평균으로 추세 방향과 강도를 결정합니다.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrendAnalyzer;

impl TrendAnalyzer {
    /// MACD 계산에 필요한 최소 캔들 수
    pub const MIN_CANDLES: usize = 26;

    pub fn new() -> TrendAnalyzer {
        TrendAnalyzer
    }

    /// 캔들에서 지표를 직접 계산해 추세 판단
    pub fn analyze<C: Candle>(&self, candles: &[C]) -> TrendAnalysis {
        if candles.len() < Self::MIN_CANDLES {
            log::debug!("추세 분석 데이터 부족: {}개, 중립 반환", candles.len());
            return TrendAnalysis::default();
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close_price()).collect();
        self.analyze_indicators(
            &MacdIndicator::from_closes(&closes),
            &KdjIndicator::from_history(candles),
            &RsiIndicator::from_closes(&closes),
        )
    }

    /// 이미 계산된 지표로 추세 판단
    pub fn analyze_indicators(
        &self,
        macd: &MacdIndicator,
        kdj: &KdjIndicator,
        rsi: &RsiIndicator,
    ) -> TrendAnalysis {
        let score = score_macd(macd) * MACD_WEIGHT
            + score_kdj(kdj) * KDJ_WEIGHT
            + score_rsi(rsi) * RSI_WEIGHT;

        let (direction, strength, change_probability) = if score > 0.6 {
            let strength = (score - 0.5) * 2.0;
            (TrendDirection::Up, strength, 1.0 - strength)
        } else if score < 0.4 {
            let strength = (0.5 - score) * 2.0;
            (TrendDirection::Down, strength, 1.0 - strength)
        } else {
            // 횡보 구간은 전환 가능성을 높게 둠
            (TrendDirection::Sideways, 1.0 - (score - 0.5).abs() * 2.0, 0.6)
        };

        log::trace!("추세 점수 {:.3} → {} (강도 {:.2})", score, direction, strength);

        TrendAnalysis {
            direction,
            strength: clamp(strength, 0.0, 1.0),
            change_probability: clamp(change_probability, 0.0, 1.0),
        }
    }

    /// 이동평균 비교 기반 추세 라벨
    ///
    /// 최근 10개 종가 평균과 그 이전 10개 평균의 차이가 2%를 넘으면 상승/하락,
    /// 아니면 횡보입니다. 캔들이 20개 미만이면 횡보입니다.
    pub fn determine_trend_direction<C: Candle>(&self, candles: &[C]) -> TrendDirection {
        if candles.len() < 20 {
            return TrendDirection::Sideways;
        }

        let n = candles.len();
        let avg = |range: &[C]| range.iter().map(|c| c.close_price()).sum::<f64>() / 10.0;
        let recent = avg(&candles[n - 10..]);
        let older = avg(&candles[n - 20..n - 10]);
        if older == 0.0 {
            return TrendDirection::Sideways;
        }

        let diff = (recent - older) / older;
        if diff > 0.02 {
            TrendDirection::Up
        } else if diff < -0.02 {
            TrendDirection::Down
        } else {
            TrendDirection::Sideways
        }
    }
}

/// MACD 점수: DIF/DEA 관계 ±0.2, 히스토그램 크기 최대 ±0.3
pub fn score_macd(macd: &MacdIndicator) -> f64 {
    let mut score = 0.5;

    if macd.dif > macd.dea {
        score += 0.2;
    } else if macd.dif < macd.dea {
        score -= 0.2;
    }

    if macd.histogram > 0.0 {
        score += (macd.histogram / 10.0).min(0.3);
    } else {
        score -= (-macd.histogram / 10.0).min(0.3);
    }

    clamp(score, 0.0, 1.0)
}

/// KDJ 점수: K/D 관계 ±0.2, J 극단값 ±0.3, 중간 구간은 (J-50)/100
pub fn score_kdj(kdj: &KdjIndicator) -> f64 {
    let mut score = 0.5;

    if kdj.k > kdj.d {
        score += 0.2;
    } else if kdj.k < kdj.d {
        score -= 0.2;
    }

    if kdj.j > 80.0 {
        score += 0.3;
    } else if kdj.j < 20.0 {
        score -= 0.3;
    } else {
        score += (kdj.j - 50.0) / 100.0;
    }

    clamp(score, 0.0, 1.0)
}

/// RSI 점수: RSI14/100 기준, RSI6 극단값으로 ±0.1 보정
pub fn score_rsi(rsi: &RsiIndicator) -> f64 {
    let mut score = rsi.rsi14 / 100.0;

    if rsi.rsi6 > 70.0 && rsi.rsi14 > 60.0 {
        score += 0.1;
    } else if rsi.rsi6 < 30.0 && rsi.rsi14 < 40.0 {
        score -= 0.1;
    }

    clamp(score, 0.0, 1.0)
}
