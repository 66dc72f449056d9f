//! 시장 구조 분석
//!
//! 스윙 구조, 추세 확인, 변동성, 레벨 합류, 패턴 신호를 묶어
//! 0~100 시장 품질 점수로 요약합니다.

use crate::analyzer::candle_pattern_analyzer::{CandlestickPattern, PatternDirection};
use crate::analyzer::support_resistance_analyzer::SRLevels;
use crate::indicator::fibonacci::Retracement;
use crate::indicator::utils::{clamp, mean, percent_distance, swing_high_indices, swing_low_indices};
use crate::indicator::{ATR, IndicatorSet, is_regular_arrangement, is_reverse_arrangement};
use crate::model::{Candle, TrendDirection};
use serde::{Deserialize, Serialize};

/// 구조 분석에 필요한 최소 캔들 수
pub const MIN_STRUCTURE_CANDLES: usize = 20;

/// 레벨 병합 거리 (0.5%)
const MERGE_RATIO: f64 = 0.005;

/// 남길 최대 합류 구간 수
const MAX_ZONES: usize = 5;

/// 패턴 신호에 사용할 최근 패턴 수
const RECENT_PATTERNS: usize = 5;

/// 최근 ATR 평균 대비 급등 배수
const ATR_SPIKE_RATIO: f64 = 1.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// 방향성 신호
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

/// 주요 EMA 대비 가격 위치
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricePosition {
    AboveKeyEmas,
    BelowKeyEmas,
    AboveEma50,
    BelowEma50,
    #[default]
    Mixed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfirmationStrength {
    Strong,
    Moderate,
    #[default]
    Weak,
}

/// 다중 지표 추세 확인
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendConfirmation {
    pub ema_alignment: Signal,
    pub macd_signal: Signal,
    pub price_vs_ema: PricePosition,
    /// 확인 점수 (0~100)
    pub confirmation_score: f64,
    pub strength: ConfirmationStrength,
}

impl Default for TrendConfirmation {
    fn default() -> Self {
        TrendConfirmation {
            ema_alignment: Signal::Neutral,
            macd_signal: Signal::Neutral,
            price_vs_ema: PricePosition::Mixed,
            confirmation_score: 50.0,
            strength: ConfirmationStrength::Weak,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VolatilityLevel {
    High,
    #[default]
    Normal,
    Low,
}

/// 변동성에 따른 포지션 크기 조정 제안
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskAdjustment {
    Reduce,
    #[default]
    Standard,
    Increase,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VolatilityProfile {
    pub current_atr: f64,
    /// 가격 대비 ATR (%)
    pub atr_percentage: f64,
    pub volatility_level: VolatilityLevel,
    pub is_expanding: bool,
    /// 현재 ATR이 최근 ATR 평균의 1.5배 초과
    pub is_high_volatility: bool,
    pub risk_adjustment: RiskAdjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LevelSide {
    Support,
    Resistance,
}

/// 여러 근거가 겹친 핵심 레벨
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfluenceLevel {
    pub price: f64,
    /// 현재가 대비 거리 (%)
    pub distance: f64,
    pub factors: Vec<String>,
    /// 강도 (0~100)
    pub strength: f64,
    #[serde(rename = "type")]
    pub side: LevelSide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Significance {
    Critical,
    Important,
    Moderate,
}

/// 독립 근거 2개 이상이 겹치는 가격 구간
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfluenceZone {
    /// [하단, 상단]
    pub price_range: [f64; 2],
    pub factors: Vec<String>,
    pub strength: f64,
    pub significance: Significance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyLevelConfluence {
    pub nearest_support: Option<ConfluenceLevel>,
    pub nearest_resistance: Option<ConfluenceLevel>,
    pub confluence_zones: Vec<ConfluenceZone>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternSignals {
    pub recent_patterns: Vec<String>,
    pub bullish_count: usize,
    pub bearish_count: usize,
    pub dominant_signal: Signal,
    /// 평균 신뢰도 (0~100)
    pub pattern_reliability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Grade {
        match score {
            s if s >= 90.0 => Grade::A,
            s if s >= 80.0 => Grade::B,
            s if s >= 70.0 => Grade::C,
            s if s >= 60.0 => Grade::D,
            _ => Grade::F,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradingCondition {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl TradingCondition {
    pub fn from_score(score: f64) -> TradingCondition {
        match score {
            s if s >= 85.0 => TradingCondition::Excellent,
            s if s >= 70.0 => TradingCondition::Good,
            s if s >= 55.0 => TradingCondition::Fair,
            _ => TradingCondition::Poor,
        }
    }
}

/// 요소별 품질 점수 (각 0~100)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub trend: f64,
    pub volatility: f64,
    pub confluence: f64,
    pub pattern: f64,
    pub structure: f64,
}

impl ScoreBreakdown {
    const TREND_WEIGHT: f64 = 0.30;
    const VOLATILITY_WEIGHT: f64 = 0.20;
    const CONFLUENCE_WEIGHT: f64 = 0.25;
    const PATTERN_WEIGHT: f64 = 0.15;
    const STRUCTURE_WEIGHT: f64 = 0.10;

    pub fn weighted_score(&self) -> f64 {
        clamp(
            self.trend * Self::TREND_WEIGHT
                + self.volatility * Self::VOLATILITY_WEIGHT
                + self.confluence * Self::CONFLUENCE_WEIGHT
                + self.pattern * Self::PATTERN_WEIGHT
                + self.structure * Self::STRUCTURE_WEIGHT,
            0.0,
            100.0,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuality {
    pub overall_score: f64,
    pub grade: Grade,
    pub trading_condition: TradingCondition,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendation: String,
    pub score_breakdown: ScoreBreakdown,
}

/// 시장 구조 분석 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStructure {
    pub higher_high: bool,
    pub higher_low: bool,
    pub lower_high: bool,
    pub lower_low: bool,
    pub structure_break: bool,
    pub risk_level: RiskLevel,

    pub trend_confirmation: TrendConfirmation,
    pub volatility_profile: VolatilityProfile,
    pub key_level_confluence: KeyLevelConfluence,
    pub pattern_signals: PatternSignals,
    pub market_quality: MarketQuality,
}

impl Default for MarketStructure {
    /// 데이터 부족 시 사용하는 중립 구조
    fn default() -> Self {
        let trend_confirmation = TrendConfirmation::default();
        let volatility_profile = VolatilityProfile::default();
        let key_level_confluence = KeyLevelConfluence::default();
        let pattern_signals = PatternSignals::default();
        let market_quality = assess_market_quality(
            TrendDirection::Sideways,
            false,
            &trend_confirmation,
            &volatility_profile,
            &key_level_confluence,
            &pattern_signals,
        );

        MarketStructure {
            higher_high: false,
            higher_low: false,
            lower_high: false,
            lower_low: false,
            structure_break: false,
            risk_level: RiskLevel::Medium,
            trend_confirmation,
            volatility_profile,
            key_level_confluence,
            pattern_signals,
            market_quality,
        }
    }
}

/// 시장 구조 분석기
#[derive(Debug, Clone, Copy)]
pub struct MarketStructureAnalyzer {
    /// 스윙 판별 반경 (앞뒤 캔들 수)
    swing_radius: usize,
    atr_period: usize,
}

impl Default for MarketStructureAnalyzer {
    fn default() -> Self {
        MarketStructureAnalyzer::new(14)
    }
}

impl MarketStructureAnalyzer {
    pub fn new(atr_period: usize) -> MarketStructureAnalyzer {
        MarketStructureAnalyzer {
            swing_radius: 5,
            atr_period,
        }
    }

    /// 시장 구조 분석
    ///
    /// # Arguments
    /// * `candles` - 오름차순 캔들 목록
    /// * `trend` - 이동평균 기반 추세 라벨
    /// * `indicators` - 마지막 캔들 기준 지표 스냅샷
    /// * `sr_levels` - 지지/저항 레벨
    /// * `patterns` - 인식된 캔들 패턴
    ///
    /// # Returns
    /// * `MarketStructure` - 캔들이 20개 미만이면 중립 기본값
    pub fn analyze<C: Candle>(
        &self,
        candles: &[C],
        trend: TrendDirection,
        indicators: &IndicatorSet,
        sr_levels: &SRLevels,
        patterns: &[CandlestickPattern],
    ) -> MarketStructure {
        let Some(last) = candles.last() else {
            return MarketStructure::default();
        };
        if candles.len() < MIN_STRUCTURE_CANDLES {
            log::debug!("시장 구조 분석 데이터 부족: {}개, 중립 반환", candles.len());
            return MarketStructure::default();
        }
        let current_price = last.close_price();

        let swings = self.swing_flags(candles);
        let structure_break = match trend {
            TrendDirection::Up => swings.lower_low,
            TrendDirection::Down => swings.higher_high,
            TrendDirection::Sideways => false,
        };
        let risk_level = assess_risk_level(trend, &swings, structure_break);

        let trend_confirmation = confirm_trend(current_price, indicators);
        let volatility_profile = self.volatility_profile(candles, current_price, indicators);
        let key_level_confluence = find_confluence(current_price, indicators, sr_levels);
        let pattern_signals = summarize_patterns(patterns);
        let market_quality = assess_market_quality(
            trend,
            structure_break,
            &trend_confirmation,
            &volatility_profile,
            &key_level_confluence,
            &pattern_signals,
        );

        log::debug!(
            "시장 구조: 위험 {:?}, 구조 파괴 {}, 품질 {:.1} ({:?})",
            risk_level,
            structure_break,
            market_quality.overall_score,
            market_quality.grade
        );

        MarketStructure {
            higher_high: swings.higher_high,
            higher_low: swings.higher_low,
            lower_high: swings.lower_high,
            lower_low: swings.lower_low,
            structure_break,
            risk_level,
            trend_confirmation,
            volatility_profile,
            key_level_confluence,
            pattern_signals,
            market_quality,
        }
    }

    /// 최근 두 스윙 고점/저점 비교
    fn swing_flags<C: Candle>(&self, candles: &[C]) -> SwingFlags {
        let highs: Vec<f64> = swing_high_indices(candles, self.swing_radius)
            .into_iter()
            .map(|i| candles[i].high_price())
            .collect();
        let lows: Vec<f64> = swing_low_indices(candles, self.swing_radius)
            .into_iter()
            .map(|i| candles[i].low_price())
            .collect();

        let last_two = |values: &[f64]| match values {
            [.., prev, last] => Some((*prev, *last)),
            _ => None,
        };

        let mut flags = SwingFlags::default();
        if let Some((prev, last)) = last_two(&highs) {
            flags.higher_high = last > prev;
            flags.lower_high = last < prev;
        }
        if let Some((prev, last)) = last_two(&lows) {
            flags.higher_low = last > prev;
            flags.lower_low = last < prev;
        }
        flags
    }

    fn volatility_profile<C: Candle>(
        &self,
        candles: &[C],
        current_price: f64,
        indicators: &IndicatorSet,
    ) -> VolatilityProfile {
        let current_atr = indicators.atr.value;
        let atr_percentage = if current_price > 0.0 {
            current_atr / current_price * 100.0
        } else {
            0.0
        };

        let volatility_level = if atr_percentage > 5.0 {
            VolatilityLevel::High
        } else if atr_percentage < 2.0 {
            VolatilityLevel::Low
        } else {
            VolatilityLevel::Normal
        };

        let atr = ATR::from_candles(candles, self.atr_period);
        let values = atr.values();
        let window = self.atr_period;
        let is_expanding = window > 0 && values.len() >= window * 2 && {
            let recent = mean(&values[values.len() - window..]);
            let prior = mean(&values[values.len() - window * 2..values.len() - window]);
            prior > 0.0 && recent > prior * 1.2
        };
        let is_high_volatility = atr.is_high_volatility(ATR_SPIKE_RATIO);

        let risk_adjustment = match volatility_level {
            VolatilityLevel::High => RiskAdjustment::Reduce,
            VolatilityLevel::Normal => RiskAdjustment::Standard,
            VolatilityLevel::Low => RiskAdjustment::Increase,
        };

        VolatilityProfile {
            current_atr,
            atr_percentage,
            volatility_level,
            is_expanding,
            is_high_volatility,
            risk_adjustment,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct SwingFlags {
    higher_high: bool,
    higher_low: bool,
    lower_high: bool,
    lower_low: bool,
}

fn assess_risk_level(trend: TrendDirection, swings: &SwingFlags, structure_break: bool) -> RiskLevel {
    if structure_break {
        return RiskLevel::High;
    }
    let confirmed = match trend {
        TrendDirection::Up => swings.higher_high && swings.higher_low,
        TrendDirection::Down => swings.lower_high && swings.lower_low,
        TrendDirection::Sideways => false,
    };
    if confirmed { RiskLevel::Low } else { RiskLevel::Medium }
}

/// EMA 정렬, MACD, 가격 위치로 추세 확인 점수 계산
pub fn confirm_trend(current_price: f64, indicators: &IndicatorSet) -> TrendConfirmation {
    let ema = &indicators.ema;

    let full = [ema.ema9, ema.ema21, ema.ema50, ema.ema200];
    let partial = [ema.ema9, ema.ema21, ema.ema50];
    let (ema_alignment, ema_score) = if ema.ema200 > 0.0 && is_regular_arrangement(&full) {
        (Signal::Bullish, 85.0)
    } else if ema.ema200 > 0.0 && is_reverse_arrangement(&full) {
        (Signal::Bearish, 85.0)
    } else if ema.ema50 > 0.0 && is_regular_arrangement(&partial) {
        (Signal::Bullish, 65.0)
    } else if ema.ema50 > 0.0 && is_reverse_arrangement(&partial) {
        (Signal::Bearish, 65.0)
    } else {
        (Signal::Neutral, 50.0)
    };

    let macd = &indicators.macd;
    let bonus = if current_price > 0.0 {
        (macd.histogram.abs() / current_price * 100.0 * 10.0).min(15.0)
    } else {
        0.0
    };
    let (macd_signal, macd_score) = if macd.dif > macd.dea && macd.histogram > 0.0 {
        (Signal::Bullish, 70.0 + bonus)
    } else if macd.dif < macd.dea && macd.histogram < 0.0 {
        (Signal::Bearish, 70.0 + bonus)
    } else {
        (Signal::Neutral, 50.0)
    };

    let key_emas_ready = ema.ema9 > 0.0 && ema.ema21 > 0.0;
    let (price_vs_ema, price_score) = if key_emas_ready && current_price > ema.ema9 && current_price > ema.ema21 {
        (PricePosition::AboveKeyEmas, 75.0)
    } else if key_emas_ready && current_price < ema.ema9 && current_price < ema.ema21 {
        (PricePosition::BelowKeyEmas, 75.0)
    } else if ema.ema50 > 0.0 && current_price > ema.ema50 {
        (PricePosition::AboveEma50, 60.0)
    } else if ema.ema50 > 0.0 && current_price < ema.ema50 {
        (PricePosition::BelowEma50, 60.0)
    } else {
        (PricePosition::Mixed, 50.0)
    };

    let confirmation_score = clamp(ema_score * 0.4 + macd_score * 0.35 + price_score * 0.25, 0.0, 100.0);
    let strength = if confirmation_score >= 75.0 {
        ConfirmationStrength::Strong
    } else if confirmation_score >= 60.0 {
        ConfirmationStrength::Moderate
    } else {
        ConfirmationStrength::Weak
    };

    TrendConfirmation {
        ema_alignment,
        macd_signal,
        price_vs_ema,
        confirmation_score,
        strength,
    }
}

/// 합류 분석에 쓰이는 레벨 출처
#[derive(Debug, Clone, Copy, PartialEq)]
enum LevelSource {
    Support(f64),
    Resistance(f64),
    Fibonacci(Retracement),
    Ema(u32),
}

impl LevelSource {
    fn label(&self) -> String {
        match self {
            LevelSource::Support(_) => "Support".to_string(),
            LevelSource::Resistance(_) => "Resistance".to_string(),
            LevelSource::Fibonacci(level) => format!("Fib {}", level.label()),
            LevelSource::Ema(period) => format!("EMA{}", period),
        }
    }

    fn weight(&self) -> f64 {
        match self {
            LevelSource::Support(strength) | LevelSource::Resistance(strength) => 1.0 + strength,
            LevelSource::Fibonacci(Retracement::R618) => 1.5,
            LevelSource::Fibonacci(_) => 1.0,
            LevelSource::Ema(200) => 1.5,
            LevelSource::Ema(50) => 1.25,
            LevelSource::Ema(_) => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct KeyLevel {
    price: f64,
    source: LevelSource,
}

fn collect_key_levels(indicators: &IndicatorSet, sr_levels: &SRLevels) -> Vec<KeyLevel> {
    let mut levels: Vec<KeyLevel> = Vec::new();

    levels.extend(sr_levels.support.iter().map(|l| KeyLevel {
        price: l.price,
        source: LevelSource::Support(l.strength),
    }));
    levels.extend(sr_levels.resistance.iter().map(|l| KeyLevel {
        price: l.price,
        source: LevelSource::Resistance(l.strength),
    }));
    if let Some(fib) = &indicators.fibonacci {
        levels.extend(Retracement::KEY.iter().map(|&level| KeyLevel {
            price: fib.retracement.get(level),
            source: LevelSource::Fibonacci(level),
        }));
    }
    let ema = &indicators.ema;
    levels.extend([(21, ema.ema21), (50, ema.ema50), (200, ema.ema200)].map(|(period, price)| KeyLevel {
        price,
        source: LevelSource::Ema(period),
    }));

    levels.retain(|level| level.price > 0.0);
    levels
}

/// 순서를 유지한 중복 제거 라벨 목록
fn distinct_factors(group: &[KeyLevel]) -> Vec<String> {
    let mut factors: Vec<String> = Vec::new();
    for level in group {
        let label = level.source.label();
        if !factors.contains(&label) {
            factors.push(label);
        }
    }
    factors
}

fn group_strength(group: &[KeyLevel]) -> f64 {
    (group.iter().map(|l| l.source.weight()).sum::<f64>() * 20.0).min(100.0)
}

/// 핵심 레벨 합류 분석
pub fn find_confluence(current_price: f64, indicators: &IndicatorSet, sr_levels: &SRLevels) -> KeyLevelConfluence {
    let mut levels = collect_key_levels(indicators, sr_levels);
    levels.sort_by(|a, b| a.price.total_cmp(&b.price));

    KeyLevelConfluence {
        nearest_support: nearest_level(&levels, current_price, LevelSide::Support),
        nearest_resistance: nearest_level(&levels, current_price, LevelSide::Resistance),
        confluence_zones: confluence_zones(&levels),
    }
}

/// 가격순 레벨을 구간 시작점 기준 0.5% 이내로 묶어 합류 구간 생성
fn confluence_zones(sorted: &[KeyLevel]) -> Vec<ConfluenceZone> {
    let mut zones = Vec::new();
    let mut start = 0;

    while start < sorted.len() {
        let anchor = sorted[start].price;
        let end = sorted[start..]
            .iter()
            .position(|l| l.price - anchor > anchor * MERGE_RATIO)
            .map_or(sorted.len(), |offset| start + offset);
        let group = &sorted[start..end];

        let factors = distinct_factors(group);
        if factors.len() >= 2 {
            let significance = match factors.len() {
                n if n >= 4 => Significance::Critical,
                3 => Significance::Important,
                _ => Significance::Moderate,
            };
            zones.push(ConfluenceZone {
                price_range: [group[0].price, group[group.len() - 1].price],
                factors,
                strength: group_strength(group),
                significance,
            });
        }
        start = end;
    }

    zones.sort_by(|a, b| b.strength.total_cmp(&a.strength));
    zones.truncate(MAX_ZONES);
    zones
}

/// 현재가에 가장 가까운 같은 방향 레벨 묶음
fn nearest_level(levels: &[KeyLevel], current_price: f64, side: LevelSide) -> Option<ConfluenceLevel> {
    let mut candidates: Vec<KeyLevel> = levels
        .iter()
        .filter(|l| match side {
            LevelSide::Support => l.price < current_price,
            LevelSide::Resistance => l.price > current_price,
        })
        .copied()
        .collect();
    candidates.sort_by(|a, b| {
        (a.price - current_price)
            .abs()
            .total_cmp(&(b.price - current_price).abs())
    });

    let anchor = candidates.first()?.price;
    let group: Vec<KeyLevel> = candidates
        .into_iter()
        .filter(|l| (l.price - anchor).abs() <= anchor * MERGE_RATIO)
        .collect();
    let prices: Vec<f64> = group.iter().map(|l| l.price).collect();
    let price = mean(&prices);

    Some(ConfluenceLevel {
        price,
        distance: percent_distance(current_price, price).abs(),
        factors: distinct_factors(&group),
        strength: group_strength(&group),
        side,
    })
}

/// 최근 패턴 방향 집계
pub fn summarize_patterns(patterns: &[CandlestickPattern]) -> PatternSignals {
    let recent = &patterns[..patterns.len().min(RECENT_PATTERNS)];
    if recent.is_empty() {
        return PatternSignals::default();
    }

    let bullish_count = recent.iter().filter(|p| p.direction == PatternDirection::Bullish).count();
    let bearish_count = recent.iter().filter(|p| p.direction == PatternDirection::Bearish).count();
    let dominant_signal = match bullish_count.cmp(&bearish_count) {
        std::cmp::Ordering::Greater => Signal::Bullish,
        std::cmp::Ordering::Less => Signal::Bearish,
        std::cmp::Ordering::Equal => Signal::Neutral,
    };
    let reliabilities: Vec<f64> = recent.iter().map(|p| p.reliability).collect();

    PatternSignals {
        recent_patterns: recent.iter().map(|p| p.name.clone()).collect(),
        bullish_count,
        bearish_count,
        dominant_signal,
        pattern_reliability: mean(&reliabilities) * 100.0,
    }
}

fn assess_market_quality(
    trend: TrendDirection,
    structure_break: bool,
    confirmation: &TrendConfirmation,
    volatility: &VolatilityProfile,
    confluence: &KeyLevelConfluence,
    patterns: &PatternSignals,
) -> MarketQuality {
    let volatility_score = match volatility.volatility_level {
        VolatilityLevel::Normal => 80.0,
        VolatilityLevel::Low => 60.0,
        VolatilityLevel::High => 40.0,
    };

    let nearest: Vec<f64> = [&confluence.nearest_support, &confluence.nearest_resistance]
        .into_iter()
        .flatten()
        .map(|level| level.strength)
        .collect();
    let zone_bonus = if confluence.confluence_zones.is_empty() { 0.0 } else { 10.0 };
    let confluence_score = (mean(&nearest) + zone_bonus).min(100.0);

    let pattern_score = if patterns.recent_patterns.is_empty() {
        50.0
    } else {
        patterns.pattern_reliability
    };

    let score_breakdown = ScoreBreakdown {
        trend: confirmation.confirmation_score,
        volatility: volatility_score,
        confluence: confluence_score,
        pattern: pattern_score,
        structure: if structure_break { 30.0 } else { 80.0 },
    };
    let overall_score = score_breakdown.weighted_score();

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();

    if score_breakdown.trend >= 75.0 {
        strengths.push("Strong trend confirmation".to_string());
    } else if score_breakdown.trend < 60.0 {
        weaknesses.push("Weak trend confirmation".to_string());
    }
    match volatility.volatility_level {
        VolatilityLevel::Normal => strengths.push("Healthy volatility".to_string()),
        VolatilityLevel::High => weaknesses.push("High volatility".to_string()),
        VolatilityLevel::Low => weaknesses.push("Low volatility limits price movement".to_string()),
    }
    if score_breakdown.confluence >= 70.0 {
        strengths.push("Strong key level confluence".to_string());
    } else if score_breakdown.confluence < 40.0 {
        weaknesses.push("Weak key level support".to_string());
    }
    if patterns.recent_patterns.is_empty() {
        weaknesses.push("No clear candlestick signals".to_string());
    } else if patterns.pattern_reliability >= 70.0 && patterns.dominant_signal != Signal::Neutral {
        strengths.push("Reliable candlestick signals".to_string());
    }
    if structure_break {
        weaknesses.push("Market structure broken".to_string());
    } else {
        strengths.push("Market structure intact".to_string());
    }

    MarketQuality {
        overall_score,
        grade: Grade::from_score(overall_score),
        trading_condition: TradingCondition::from_score(overall_score),
        strengths,
        weaknesses,
        recommendation: recommend(trend, structure_break, confirmation.ema_alignment, overall_score).to_string(),
        score_breakdown,
    }
}

fn recommend(trend: TrendDirection, structure_break: bool, ema_alignment: Signal, score: f64) -> &'static str {
    match (trend, ema_alignment) {
        _ if structure_break => "Wait for structure to stabilize before entering new positions",
        (TrendDirection::Up, Signal::Bullish) if score >= 70.0 => "Favorable conditions for long positions",
        (TrendDirection::Down, Signal::Bearish) if score >= 70.0 => "Favorable conditions for short positions",
        (TrendDirection::Up, Signal::Bearish) | (TrendDirection::Down, Signal::Bullish) => {
            "Conflicting signals, reduce position size"
        }
        _ if score >= 55.0 => "Selective trading with tight risk management",
        _ => "Stay on the sidelines",
    }
}
