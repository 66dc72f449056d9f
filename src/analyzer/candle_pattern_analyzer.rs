use crate::model::{Candle, TrendDirection};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 패턴 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternCategory {
    /// 반전 패턴
    Reversal,
    /// 지속 패턴
    Continuation,
}

/// 패턴 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternDirection {
    Bullish,
    Bearish,
    Neutral,
}

/// 도지 세부 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DojiKind {
    /// 드래곤플라이 도지 - 긴 아랫꼬리
    Dragonfly,
    /// 그레이브스톤 도지 - 긴 윗꼬리
    Gravestone,
    /// 롱레그 도지 - 양쪽 꼬리가 모두 김
    LongLegged,
    /// 일반 도지
    Standard,
}

impl Display for DojiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DojiKind::Dragonfly => write!(f, "Dragonfly"),
            DojiKind::Gravestone => write!(f, "Gravestone"),
            DojiKind::LongLegged => write!(f, "Long-Legged"),
            DojiKind::Standard => write!(f, "Standard"),
        }
    }
}

/// 인식 가능한 캔들 패턴 목록
///
/// `CATALOG` 순서대로 평가되며, 새 패턴은 변형을 추가하고
/// `candle_count`, `base_direction`, `matches` 에 분기를 더하면 됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Hammer,
    HangingMan,
    InvertedHammer,
    ShootingStar,
    Doji,
    BullishEngulfing,
    BearishEngulfing,
    Piercing,
    DarkCloudCover,
    BullishHarami,
    BearishHarami,
    MorningStar,
    EveningStar,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
}

/// 인식된 캔들 패턴
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandlestickPattern {
    pub kind: PatternKind,
    /// 표시용 이름
    pub name: String,
    pub category: PatternCategory,
    pub direction: PatternDirection,
    /// 최근 캔들 기준 상대 위치 (0, -1, -2)
    pub position: i32,
    /// 신뢰도 (0~1)
    pub reliability: f64,
    pub description: String,
}

impl CandlestickPattern {
    pub fn is_bullish(&self) -> bool {
        self.direction == PatternDirection::Bullish
    }

    pub fn is_bearish(&self) -> bool {
        self.direction == PatternDirection::Bearish
    }
}

impl PatternKind {
    /// 평가 순서: 단일 → 2캔들 → 3캔들
    pub const CATALOG: [PatternKind; 15] = [
        PatternKind::Hammer,
        PatternKind::HangingMan,
        PatternKind::InvertedHammer,
        PatternKind::ShootingStar,
        PatternKind::Doji,
        PatternKind::BullishEngulfing,
        PatternKind::BearishEngulfing,
        PatternKind::Piercing,
        PatternKind::DarkCloudCover,
        PatternKind::BullishHarami,
        PatternKind::BearishHarami,
        PatternKind::MorningStar,
        PatternKind::EveningStar,
        PatternKind::ThreeWhiteSoldiers,
        PatternKind::ThreeBlackCrows,
    ];

    /// 패턴을 구성하는 캔들 수
    pub fn candle_count(self) -> usize {
        match self {
            PatternKind::Hammer
            | PatternKind::HangingMan
            | PatternKind::InvertedHammer
            | PatternKind::ShootingStar
            | PatternKind::Doji => 1,
            PatternKind::BullishEngulfing
            | PatternKind::BearishEngulfing
            | PatternKind::Piercing
            | PatternKind::DarkCloudCover
            | PatternKind::BullishHarami
            | PatternKind::BearishHarami => 2,
            PatternKind::MorningStar
            | PatternKind::EveningStar
            | PatternKind::ThreeWhiteSoldiers
            | PatternKind::ThreeBlackCrows => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PatternKind::Hammer => "Hammer",
            PatternKind::HangingMan => "Hanging Man",
            PatternKind::InvertedHammer => "Inverted Hammer",
            PatternKind::ShootingStar => "Shooting Star",
            PatternKind::Doji => "Doji",
            PatternKind::BullishEngulfing => "Bullish Engulfing",
            PatternKind::BearishEngulfing => "Bearish Engulfing",
            PatternKind::Piercing => "Piercing Pattern",
            PatternKind::DarkCloudCover => "Dark Cloud Cover",
            PatternKind::BullishHarami => "Bullish Harami",
            PatternKind::BearishHarami => "Bearish Harami",
            PatternKind::MorningStar => "Morning Star",
            PatternKind::EveningStar => "Evening Star",
            PatternKind::ThreeWhiteSoldiers => "Three White Soldiers",
            PatternKind::ThreeBlackCrows => "Three Black Crows",
        }
    }

    pub fn base_direction(self) -> PatternDirection {
        match self {
            PatternKind::Hammer
            | PatternKind::InvertedHammer
            | PatternKind::BullishEngulfing
            | PatternKind::Piercing
            | PatternKind::BullishHarami
            | PatternKind::MorningStar
            | PatternKind::ThreeWhiteSoldiers => PatternDirection::Bullish,
            PatternKind::HangingMan
            | PatternKind::ShootingStar
            | PatternKind::BearishEngulfing
            | PatternKind::DarkCloudCover
            | PatternKind::BearishHarami
            | PatternKind::EveningStar
            | PatternKind::ThreeBlackCrows => PatternDirection::Bearish,
            PatternKind::Doji => PatternDirection::Neutral,
        }
    }

    pub fn base_reliability(self) -> f64 {
        match self {
            PatternKind::Hammer => 0.80,
            PatternKind::HangingMan => 0.70,
            PatternKind::InvertedHammer => 0.65,
            PatternKind::ShootingStar => 0.75,
            PatternKind::Doji => 0.70,
            PatternKind::BullishEngulfing | PatternKind::BearishEngulfing => 0.90,
            PatternKind::Piercing | PatternKind::DarkCloudCover => 0.80,
            PatternKind::BullishHarami | PatternKind::BearishHarami => 0.70,
            PatternKind::MorningStar | PatternKind::EveningStar => 0.95,
            PatternKind::ThreeWhiteSoldiers | PatternKind::ThreeBlackCrows => 0.85,
        }
    }

    fn description(self) -> &'static str {
        match self {
            PatternKind::Hammer => "하락 추세 바닥에서 긴 아랫꼬리, 매수세 강화",
            PatternKind::HangingMan => "상승 추세 고점에서 긴 아랫꼬리, 다음 캔들 확인 필요",
            PatternKind::InvertedHammer => "하락 추세 바닥에서 긴 윗꼬리, 다음 양봉 확인 필요",
            PatternKind::ShootingStar => "상승 추세 고점에서 긴 윗꼬리, 고점 돌파 실패",
            PatternKind::Doji => "시장 우유부단, 추세 변화 가능성",
            PatternKind::BullishEngulfing => "큰 양봉이 직전 음봉을 감쌈, 강한 상승 신호",
            PatternKind::BearishEngulfing => "큰 음봉이 직전 양봉을 감쌈, 강한 하락 신호",
            PatternKind::Piercing => "갭 하락 후 강한 반등, 매수세 우위",
            PatternKind::DarkCloudCover => "갭 상승 후 밀림, 매도세 우위 시작",
            PatternKind::BullishHarami | PatternKind::BearishHarami => {
                "작은 캔들이 큰 캔들 몸통 안에 위치, 추세 반전 가능"
            }
            PatternKind::MorningStar => "바닥 반전의 가장 강한 신호 중 하나",
            PatternKind::EveningStar => "고점 반전의 가장 강한 신호 중 하나",
            PatternKind::ThreeWhiteSoldiers => "연속된 세 개의 양봉, 매수 압력 지속",
            PatternKind::ThreeBlackCrows => "연속된 세 개의 음봉, 매도 압력 지속",
        }
    }

    /// 패턴의 기하 조건 검사. `window`는 `candle_count()` 길이의 최근 캔들입니다.
    fn matches<C: Candle>(self, window: &[C], trend: TrendDirection) -> bool {
        match (self, window) {
            (PatternKind::Hammer, [c]) => is_hammer(c, trend),
            (PatternKind::HangingMan, [c]) => is_hanging_man(c, trend),
            (PatternKind::InvertedHammer, [c]) => is_inverted_hammer(c, trend),
            (PatternKind::ShootingStar, [c]) => is_shooting_star(c, trend),
            (PatternKind::Doji, [c]) => classify_doji(c).is_some(),
            (PatternKind::BullishEngulfing, [prev, curr]) => {
                is_bullish_engulfing(prev, curr, trend)
            }
            (PatternKind::BearishEngulfing, [prev, curr]) => {
                is_bearish_engulfing(prev, curr, trend)
            }
            (PatternKind::Piercing, [prev, curr]) => is_piercing(prev, curr, trend),
            (PatternKind::DarkCloudCover, [prev, curr]) => is_dark_cloud_cover(prev, curr, trend),
            (PatternKind::BullishHarami, [prev, curr]) => {
                classify_harami(prev, curr) == Some(PatternDirection::Bullish)
            }
            (PatternKind::BearishHarami, [prev, curr]) => {
                classify_harami(prev, curr) == Some(PatternDirection::Bearish)
            }
            (PatternKind::MorningStar, [c1, c2, c3]) => is_morning_star(c1, c2, c3, trend),
            (PatternKind::EveningStar, [c1, c2, c3]) => is_evening_star(c1, c2, c3, trend),
            (PatternKind::ThreeWhiteSoldiers, [c1, c2, c3]) => {
                is_three_white_soldiers(c1, c2, c3, trend)
            }
            (PatternKind::ThreeBlackCrows, [c1, c2, c3]) => {
                is_three_black_crows(c1, c2, c3, trend)
            }
            _ => false,
        }
    }

    /// 조건을 만족하면 패턴 레코드를 생성
    fn detect<C: Candle>(self, window: &[C], trend: TrendDirection) -> Option<CandlestickPattern> {
        if !self.matches(window, trend) {
            return None;
        }

        let mut pattern = CandlestickPattern {
            kind: self,
            name: self.name().to_string(),
            category: PatternCategory::Reversal,
            direction: self.base_direction(),
            position: 1 - self.candle_count() as i32,
            reliability: self.base_reliability(),
            description: self.description().to_string(),
        };

        // 도지는 세부 유형과 추세에 따라 이름/신뢰도가 달라짐
        if let (PatternKind::Doji, Some(doji)) = (self, window.first().and_then(classify_doji)) {
            pattern.name = format!("Doji ({})", doji);
            match (doji, trend) {
                (DojiKind::Dragonfly, TrendDirection::Down) => {
                    pattern.reliability = 0.75;
                    pattern.description = "바닥에서 나타난 드래곤플라이 도지, 상승 신호".to_string();
                }
                (DojiKind::Gravestone, TrendDirection::Up) => {
                    pattern.reliability = 0.75;
                    pattern.description = "고점에서 나타난 그레이브스톤 도지, 하락 신호".to_string();
                }
                _ => {}
            }
        }

        Some(pattern)
    }
}

/// 최근 캔들에서 모든 패턴을 찾습니다.
///
/// # Arguments
/// * `candles` - 오름차순 캔들 목록
/// * `trend` - 이동평균 기반 추세 라벨
///
/// # Returns
/// * `Vec<CandlestickPattern>` - 평가 순서대로 정렬된 일치 패턴 (복수 가능)
pub fn identify_patterns<C: Candle>(
    candles: &[C],
    trend: TrendDirection,
) -> Vec<CandlestickPattern> {
    let patterns: Vec<CandlestickPattern> = PatternKind::CATALOG
        .iter()
        .filter(|kind| candles.len() >= kind.candle_count())
        .filter_map(|kind| kind.detect(&candles[candles.len() - kind.candle_count()..], trend))
        .collect();

    log::trace!("캔들 패턴 {}개 인식 (추세: {})", patterns.len(), trend);
    patterns
}

pub fn is_hammer<C: Candle>(candle: &C, trend: TrendDirection) -> bool {
    let total = candle.range();
    if total == 0.0 {
        return false;
    }
    let body = candle.body_size();

    trend == TrendDirection::Down
        && candle.lower_shadow() >= body * 2.0
        && candle.upper_shadow() <= body * 0.1
        && body / total < 0.3
}

pub fn is_hanging_man<C: Candle>(candle: &C, trend: TrendDirection) -> bool {
    let body = candle.body_size();
    trend == TrendDirection::Up
        && candle.range() > 0.0
        && candle.lower_shadow() >= body * 2.0
        && candle.upper_shadow() <= body * 0.1
}

pub fn is_inverted_hammer<C: Candle>(candle: &C, trend: TrendDirection) -> bool {
    let body = candle.body_size();
    trend == TrendDirection::Down
        && candle.range() > 0.0
        && candle.upper_shadow() >= body * 2.0
        && candle.lower_shadow() <= body * 0.1
}

pub fn is_shooting_star<C: Candle>(candle: &C, trend: TrendDirection) -> bool {
    let body = candle.body_size();
    trend == TrendDirection::Up
        && candle.range() > 0.0
        && candle.upper_shadow() >= body * 2.0
        && candle.lower_shadow() <= body * 0.1
}

/// 도지 판별 및 세부 유형 분류
///
/// 몸통이 전체 범위의 5% 이하이면 도지입니다. 범위가 0인 캔들은 제외합니다.
pub fn classify_doji<C: Candle>(candle: &C) -> Option<DojiKind> {
    let total = candle.range();
    if total == 0.0 || candle.body_size() / total > 0.05 {
        return None;
    }

    let upper = candle.upper_shadow();
    let lower = candle.lower_shadow();

    let kind = if lower > total * 0.6 && upper < total * 0.1 {
        DojiKind::Dragonfly
    } else if upper > total * 0.6 && lower < total * 0.1 {
        DojiKind::Gravestone
    } else if lower > total * 0.3 && upper > total * 0.3 {
        DojiKind::LongLegged
    } else {
        DojiKind::Standard
    };
    Some(kind)
}

pub fn is_bullish_engulfing<C: Candle>(prev: &C, curr: &C, trend: TrendDirection) -> bool {
    trend == TrendDirection::Down
        && prev.is_bearish()
        && curr.is_bullish()
        && curr.open_price() < prev.close_price()
        && curr.close_price() > prev.open_price()
        && curr.body_size() > prev.body_size() * 1.5
}

pub fn is_bearish_engulfing<C: Candle>(prev: &C, curr: &C, trend: TrendDirection) -> bool {
    trend == TrendDirection::Up
        && prev.is_bullish()
        && curr.is_bearish()
        && curr.open_price() > prev.close_price()
        && curr.close_price() < prev.open_price()
        && curr.body_size() > prev.body_size() * 1.5
}

/// 관통형: 직전 음봉 저가 아래로 갭 하락 출발 후 몸통의 50% 이상 회복
pub fn is_piercing<C: Candle>(prev: &C, curr: &C, trend: TrendDirection) -> bool {
    if trend != TrendDirection::Down || !prev.is_bearish() || !curr.is_bullish() {
        return false;
    }
    let penetration = (curr.close_price() - prev.close_price()) / prev.body_size();

    curr.open_price() < prev.low_price()
        && curr.close_price() > prev.close_price()
        && curr.close_price() < prev.open_price()
        && penetration >= 0.5
}

/// 먹구름형: 직전 양봉 고가 위로 갭 상승 출발 후 몸통의 50% 이상 하락
pub fn is_dark_cloud_cover<C: Candle>(prev: &C, curr: &C, trend: TrendDirection) -> bool {
    if trend != TrendDirection::Up || !prev.is_bullish() || !curr.is_bearish() {
        return false;
    }
    let penetration = (prev.close_price() - curr.close_price()) / prev.body_size();

    curr.open_price() > prev.high_price()
        && curr.close_price() < prev.close_price()
        && curr.close_price() > prev.open_price()
        && penetration >= 0.5
}

/// 잉태형: 현재 몸통이 직전 몸통 안에 있고 색이 반대일 때 방향 반환
pub fn classify_harami<C: Candle>(prev: &C, curr: &C) -> Option<PatternDirection> {
    let prev_max = prev.open_price().max(prev.close_price());
    let prev_min = prev.open_price().min(prev.close_price());
    let curr_max = curr.open_price().max(curr.close_price());
    let curr_min = curr.open_price().min(curr.close_price());

    if curr_max >= prev_max || curr_min <= prev_min {
        return None;
    }

    if prev.is_bearish() && curr.is_bullish() {
        Some(PatternDirection::Bullish)
    } else if prev.is_bullish() && curr.is_bearish() {
        Some(PatternDirection::Bearish)
    } else {
        None
    }
}

fn midpoint<C: Candle>(candle: &C) -> f64 {
    (candle.open_price() + candle.close_price()) / 2.0
}

pub fn is_morning_star<C: Candle>(c1: &C, c2: &C, c3: &C, trend: TrendDirection) -> bool {
    trend == TrendDirection::Down
        && c1.is_bearish()
        && c2.body_size() < c1.body_size() * 0.3
        && c3.is_bullish()
        && c3.close_price() > midpoint(c1)
}

pub fn is_evening_star<C: Candle>(c1: &C, c2: &C, c3: &C, trend: TrendDirection) -> bool {
    trend == TrendDirection::Up
        && c1.is_bullish()
        && c2.body_size() < c1.body_size() * 0.3
        && c3.is_bearish()
        && c3.close_price() < midpoint(c1)
}

/// 적삼병: 세 양봉이 직전 몸통 안에서 출발하며 종가가 계속 상승
pub fn is_three_white_soldiers<C: Candle>(c1: &C, c2: &C, c3: &C, trend: TrendDirection) -> bool {
    let opens_inside = |prev: &C, curr: &C| {
        curr.open_price() > prev.open_price() && curr.open_price() < prev.close_price()
    };

    trend == TrendDirection::Down
        && c1.is_bullish()
        && c2.is_bullish()
        && c3.is_bullish()
        && opens_inside(c1, c2)
        && opens_inside(c2, c3)
        && c2.close_price() > c1.close_price()
        && c3.close_price() > c2.close_price()
}

/// 흑삼병: 세 음봉이 직전 몸통 안에서 출발하며 종가가 계속 하락
pub fn is_three_black_crows<C: Candle>(c1: &C, c2: &C, c3: &C, trend: TrendDirection) -> bool {
    let opens_inside = |prev: &C, curr: &C| {
        curr.open_price() < prev.open_price() && curr.open_price() > prev.close_price()
    };

    trend == TrendDirection::Up
        && c1.is_bearish()
        && c2.is_bearish()
        && c3.is_bearish()
        && opens_inside(c1, c2)
        && opens_inside(c2, c3)
        && c2.close_price() < c1.close_price()
        && c3.close_price() < c2.close_price()
}
