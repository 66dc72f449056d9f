use crate::config_loader::LevelConfig;
use crate::indicator::ATR;
use crate::indicator::utils::{clamp, mean, swing_high_indices, swing_low_indices};
use crate::model::{Candle, CandleInterval};
use serde::{Deserialize, Serialize};

/// 지지/저항 레벨
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SRLevel {
    /// 레벨 가격
    pub price: f64,
    /// 강도 (0~1)
    pub strength: f64,
}

/// 현재가 기준으로 나뉜 지지/저항 레벨
///
/// 지지선은 가까운 순(가격 내림차순), 저항선도 가까운 순(가격 오름차순)입니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SRLevels {
    pub resistance: Vec<SRLevel>,
    pub support: Vec<SRLevel>,
}

impl SRLevels {
    /// 현재가에 가장 가까운 지지선
    pub fn nearest_support(&self) -> Option<&SRLevel> {
        self.support.first()
    }

    /// 현재가에 가장 가까운 저항선
    pub fn nearest_resistance(&self) -> Option<&SRLevel> {
        self.resistance.first()
    }

    /// 모든 레벨 (지지 → 저항 순)
    pub fn all(&self) -> impl Iterator<Item = &SRLevel> {
        self.support.iter().chain(self.resistance.iter())
    }
}

/// 캔들 간격별 클러스터링 파라미터
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalProfile {
    /// 분석 구간 캔들 수
    pub lookback: usize,
    /// 현재가 대비 클러스터 거리 (%)
    pub cluster_pct: f64,
    /// 지지/저항 각각 확보할 최소 레벨 수
    pub min_levels: usize,
}

impl IntervalProfile {
    pub fn for_interval(interval: CandleInterval) -> IntervalProfile {
        let (lookback, cluster_pct, min_levels) = match interval {
            CandleInterval::Minute5 => (288, 0.2, 3),
            CandleInterval::Minute15 => (96, 0.3, 3),
            CandleInterval::Hour1 => (168, 0.5, 3),
            CandleInterval::Hour4 => (84, 0.8, 3),
            CandleInterval::Day1 => (60, 1.5, 3),
            CandleInterval::Week1 => (52, 3.0, 2),
        };
        IntervalProfile {
            lookback,
            cluster_pct,
            min_levels,
        }
    }
}

/// 클러스터링 입력 포인트
#[derive(Debug, Clone, Copy)]
struct PricePoint {
    price: f64,
    volume: f64,
}

/// 병합된 가격 클러스터
#[derive(Debug, Clone, Copy)]
struct PriceCluster {
    price: f64,
    count: usize,
    volume: f64,
}

/// 지지/저항 레벨 클러스터링 분석기
///
/// 구간 내 고가/저가를 가격순으로 정렬한 뒤 인접 간격이 동적 임계값
/// `max(현재가 × 간격별%, atr_factor × ATR)` 이하인 포인트를 하나의 클러스터로 묶습니다.
#[derive(Debug, Clone)]
pub struct SupportResistanceAnalyzer {
    config: LevelConfig,
    atr_period: usize,
}

impl Default for SupportResistanceAnalyzer {
    fn default() -> Self {
        SupportResistanceAnalyzer::new(LevelConfig::default(), 14)
    }
}

impl SupportResistanceAnalyzer {
    pub fn new(config: LevelConfig, atr_period: usize) -> SupportResistanceAnalyzer {
        SupportResistanceAnalyzer { config, atr_period }
    }

    /// 지지/저항 레벨 계산
    ///
    /// # Arguments
    /// * `candles` - 오름차순 캔들 목록
    /// * `interval` - 캔들 간격 (구간 길이와 클러스터 거리 결정)
    ///
    /// # Returns
    /// * `SRLevels` - 현재가 주변 버퍼 구간을 제외한 지지/저항 레벨
    pub fn analyze<C: Candle>(&self, candles: &[C], interval: CandleInterval) -> SRLevels {
        let Some(last) = candles.last() else {
            return SRLevels::default();
        };

        let profile = IntervalProfile::for_interval(interval);
        let window = &candles[candles.len().saturating_sub(profile.lookback)..];
        let current_price = last.close_price();

        let atr = ATR::from_candles(candles, self.atr_period).get();
        let threshold = (current_price * profile.cluster_pct / 100.0).max(self.config.atr_factor * atr);
        let buffer = current_price * self.config.buffer_pct / 100.0;

        let clusters = self.cluster_points(window, threshold);
        let max_count = clusters.iter().map(|c| c.count).max().unwrap_or(0);
        let max_volume = clusters.iter().map(|c| c.volume).fold(0.0, f64::max);

        let mut levels = SRLevels::default();
        for cluster in &clusters {
            let level = SRLevel {
                price: cluster.price,
                strength: cluster_strength(cluster, max_count, max_volume),
            };
            if level.price > current_price + buffer {
                levels.resistance.push(level);
            } else if level.price < current_price - buffer {
                levels.support.push(level);
            }
        }

        self.backfill_swing_levels(window, &mut levels, current_price, buffer, threshold, profile.min_levels);

        levels.support.sort_by(|a, b| b.price.total_cmp(&a.price));
        levels.resistance.sort_by(|a, b| a.price.total_cmp(&b.price));
        levels.support.truncate(self.config.max_levels);
        levels.resistance.truncate(self.config.max_levels);

        log::debug!(
            "지지/저항 레벨 계산 ({}): 지지 {}개, 저항 {}개, 임계값 {:.4}",
            interval,
            levels.support.len(),
            levels.resistance.len(),
            threshold
        );
        levels
    }

    /// 가격순 스윕으로 인접 포인트 병합
    fn cluster_points<C: Candle>(&self, window: &[C], threshold: f64) -> Vec<PriceCluster> {
        let mut points: Vec<PricePoint> = window
            .iter()
            .flat_map(|candle| {
                [
                    PricePoint {
                        price: candle.high_price(),
                        volume: candle.volume(),
                    },
                    PricePoint {
                        price: candle.low_price(),
                        volume: candle.volume(),
                    },
                ]
            })
            .collect();
        points.sort_by(|a, b| a.price.total_cmp(&b.price));

        let mut clusters = Vec::new();
        let mut run: Vec<PricePoint> = Vec::new();
        for point in points {
            if let Some(prev) = run.last() {
                if point.price - prev.price > threshold {
                    self.finish_run(&mut run, &mut clusters);
                }
            }
            run.push(point);
        }
        self.finish_run(&mut run, &mut clusters);

        clusters
    }

    fn finish_run(&self, run: &mut Vec<PricePoint>, clusters: &mut Vec<PriceCluster>) {
        if run.len() >= self.config.min_cluster_size {
            let prices: Vec<f64> = run.iter().map(|p| p.price).collect();
            clusters.push(PriceCluster {
                price: mean(&prices),
                count: run.len(),
                volume: run.iter().map(|p| p.volume).sum(),
            });
        }
        run.clear();
    }

    /// 레벨이 부족한 쪽을 스윙 고/저점으로 보충
    ///
    /// 기존 레벨과 임계값 이내로 겹치는 스윙은 건너뜁니다.
    fn backfill_swing_levels<C: Candle>(
        &self,
        window: &[C],
        levels: &mut SRLevels,
        current_price: f64,
        buffer: f64,
        threshold: f64,
        min_levels: usize,
    ) {
        if levels.support.len() >= min_levels && levels.resistance.len() >= min_levels {
            return;
        }

        let mut swings: Vec<f64> = swing_high_indices(window, 2)
            .into_iter()
            .map(|i| window[i].high_price())
            .chain(
                swing_low_indices(window, 2)
                    .into_iter()
                    .map(|i| window[i].low_price()),
            )
            .collect();
        // 현재가에 가까운 스윙부터 사용
        swings.sort_by(|a, b| (a - current_price).abs().total_cmp(&(b - current_price).abs()));

        let strength = self.config.backfill_strength;
        for price in swings {
            let side = if price > current_price + buffer {
                &mut levels.resistance
            } else if price < current_price - buffer {
                &mut levels.support
            } else {
                continue;
            };

            if side.len() >= min_levels {
                continue;
            }
            if side.iter().any(|level| (level.price - price).abs() <= threshold) {
                continue;
            }
            log::trace!("스윙 레벨 보충: {:.4}", price);
            side.push(SRLevel { price, strength });
        }
    }
}

/// 클러스터 강도 = 0.6 × 포인트 수 비율 + 0.4 × 거래량 비율
fn cluster_strength(cluster: &PriceCluster, max_count: usize, max_volume: f64) -> f64 {
    let count_ratio = if max_count > 0 {
        cluster.count as f64 / max_count as f64
    } else {
        0.0
    };
    let volume_ratio = if max_volume > 0.0 {
        cluster.volume / max_volume
    } else {
        0.0
    };
    clamp(0.6 * count_ratio + 0.4 * volume_ratio, 0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OhlcvCandle;

    fn candle(i: i64, high: f64, low: f64, close: f64, volume: f64) -> OhlcvCandle {
        OhlcvCandle::new(i, close, high, low, close, volume)
    }

    /// 100 근처와 120 근처를 번갈아 오가다 110에서 끝나는 시계열
    fn ranging_candles() -> Vec<OhlcvCandle> {
        let mut candles: Vec<OhlcvCandle> = (0..40)
            .map(|i| {
                if i % 4 < 2 {
                    candle(i, 101.0, 99.5, 100.0, 1000.0)
                } else {
                    candle(i, 120.5, 119.0, 120.0, 500.0)
                }
            })
            .collect();
        candles.push(candle(40, 111.0, 109.0, 110.0, 100.0));
        candles
    }

    #[test]
    fn test_profiles() {
        let profile = IntervalProfile::for_interval(CandleInterval::Hour1);
        assert_eq!(profile.lookback, 168);
        assert_eq!(profile.cluster_pct, 0.5);
        assert_eq!(IntervalProfile::for_interval(CandleInterval::Week1).min_levels, 2);
    }

    #[test]
    fn test_levels_split_by_current_price() {
        let levels = SupportResistanceAnalyzer::default().analyze(&ranging_candles(), CandleInterval::Day1);

        assert!(!levels.support.is_empty());
        assert!(!levels.resistance.is_empty());
        let support = levels.nearest_support().unwrap();
        let resistance = levels.nearest_resistance().unwrap();
        assert!(support.price < 110.0 && support.price > 95.0);
        assert!(resistance.price > 110.0 && resistance.price < 125.0);
        // 거래량이 많은 100 근처 클러스터가 가장 강함
        assert!(support.strength > resistance.strength);
        assert!(levels.all().all(|l| (0.0..=1.0).contains(&l.strength)));
    }

    #[test]
    fn test_sorted_nearest_first_and_capped() {
        let candles: Vec<OhlcvCandle> = (0..60)
            .map(|i| {
                let base = 100.0 + (i % 12) as f64 * 10.0;
                candle(i, base + 0.5, base - 0.5, base, 100.0)
            })
            .chain(std::iter::once(candle(60, 161.0, 159.0, 160.0, 100.0)))
            .collect();
        let analyzer = SupportResistanceAnalyzer::default();
        let levels = analyzer.analyze(&candles, CandleInterval::Hour1);

        assert!(levels.support.len() <= 5);
        assert!(levels.resistance.len() <= 5);
        assert!(levels.support.windows(2).all(|w| w[0].price > w[1].price));
        assert!(levels.resistance.windows(2).all(|w| w[0].price < w[1].price));
    }

    #[test]
    fn test_flat_series_has_no_levels() {
        let candles: Vec<OhlcvCandle> = (0..30).map(|i| candle(i, 100.0, 100.0, 100.0, 1.0)).collect();
        let levels = SupportResistanceAnalyzer::default().analyze(&candles, CandleInterval::Day1);
        assert!(levels.support.is_empty());
        assert!(levels.resistance.is_empty());
    }

    #[test]
    fn test_backfill_uses_swing_strength() {
        // 단일 고점 스파이크는 클러스터를 만들지 못하므로 스윙으로 보충됨
        let mut candles: Vec<OhlcvCandle> = (0..20).map(|i| candle(i, 100.5, 99.5, 100.0, 10.0)).collect();
        candles[10] = candle(10, 130.0, 99.5, 100.0, 10.0);
        let config = LevelConfig {
            min_cluster_size: 2,
            ..LevelConfig::default()
        };
        let levels = SupportResistanceAnalyzer::new(config, 14).analyze(&candles, CandleInterval::Day1);
        let spike = levels.resistance.iter().find(|l| l.price == 130.0).unwrap();
        assert_eq!(spike.strength, 0.5);
    }

    #[test]
    fn test_empty_input() {
        let candles: Vec<OhlcvCandle> = Vec::new();
        assert_eq!(
            SupportResistanceAnalyzer::default().analyze(&candles, CandleInterval::Day1),
            SRLevels::default()
        );
    }
}
