use crate::model::Candle;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 피보나치 되돌림 비율
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Retracement {
    #[serde(rename = "0%")]
    R0,
    #[serde(rename = "23.6%")]
    R236,
    #[serde(rename = "38.2%")]
    R382,
    #[serde(rename = "50%")]
    R500,
    #[serde(rename = "61.8%")]
    R618,
    #[serde(rename = "78.6%")]
    R786,
    #[serde(rename = "100%")]
    R1000,
}

impl Retracement {
    pub const ALL: [Retracement; 7] = [
        Retracement::R0,
        Retracement::R236,
        Retracement::R382,
        Retracement::R500,
        Retracement::R618,
        Retracement::R786,
        Retracement::R1000,
    ];

    /// 핵심 되돌림 구간 (38.2 / 50 / 61.8)
    pub const KEY: [Retracement; 3] = [Retracement::R382, Retracement::R500, Retracement::R618];

    pub fn ratio(self) -> f64 {
        match self {
            Retracement::R0 => 0.0,
            Retracement::R236 => 0.236,
            Retracement::R382 => 0.382,
            Retracement::R500 => 0.5,
            Retracement::R618 => 0.618,
            Retracement::R786 => 0.786,
            Retracement::R1000 => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Retracement::R0 => "0%",
            Retracement::R236 => "23.6%",
            Retracement::R382 => "38.2%",
            Retracement::R500 => "50%",
            Retracement::R618 => "61.8%",
            Retracement::R786 => "78.6%",
            Retracement::R1000 => "100%",
        }
    }
}

/// 피보나치 확장 비율
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Extension {
    #[serde(rename = "1.272")]
    E1272,
    #[serde(rename = "1.618")]
    E1618,
    #[serde(rename = "2.0")]
    E2000,
    #[serde(rename = "2.618")]
    E2618,
}

impl Extension {
    pub const ALL: [Extension; 4] = [
        Extension::E1272,
        Extension::E1618,
        Extension::E2000,
        Extension::E2618,
    ];

    pub fn ratio(self) -> f64 {
        match self {
            Extension::E1272 => 1.272,
            Extension::E1618 => 1.618,
            Extension::E2000 => 2.0,
            Extension::E2618 => 2.618,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Extension::E1272 => "1.272",
            Extension::E1618 => "1.618",
            Extension::E2000 => "2.0",
            Extension::E2618 => "2.618",
        }
    }
}

/// 되돌림 레벨 가격
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RetracementLevels {
    #[serde(rename = "0%")]
    pub r0: f64,
    #[serde(rename = "23.6%")]
    pub r236: f64,
    #[serde(rename = "38.2%")]
    pub r382: f64,
    #[serde(rename = "50%")]
    pub r500: f64,
    #[serde(rename = "61.8%")]
    pub r618: f64,
    #[serde(rename = "78.6%")]
    pub r786: f64,
    #[serde(rename = "100%")]
    pub r1000: f64,
}

impl RetracementLevels {
    fn build(price_at: impl Fn(f64) -> f64) -> Self {
        RetracementLevels {
            r0: price_at(Retracement::R0.ratio()),
            r236: price_at(Retracement::R236.ratio()),
            r382: price_at(Retracement::R382.ratio()),
            r500: price_at(Retracement::R500.ratio()),
            r618: price_at(Retracement::R618.ratio()),
            r786: price_at(Retracement::R786.ratio()),
            r1000: price_at(Retracement::R1000.ratio()),
        }
    }

    pub fn get(&self, level: Retracement) -> f64 {
        match level {
            Retracement::R0 => self.r0,
            Retracement::R236 => self.r236,
            Retracement::R382 => self.r382,
            Retracement::R500 => self.r500,
            Retracement::R618 => self.r618,
            Retracement::R786 => self.r786,
            Retracement::R1000 => self.r1000,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Retracement, f64)> + '_ {
        Retracement::ALL.into_iter().map(|level| (level, self.get(level)))
    }
}

/// 확장 레벨 가격
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionLevels {
    #[serde(rename = "1.272")]
    pub e1272: f64,
    #[serde(rename = "1.618")]
    pub e1618: f64,
    #[serde(rename = "2.0")]
    pub e2000: f64,
    #[serde(rename = "2.618")]
    pub e2618: f64,
}

impl ExtensionLevels {
    fn build(price_at: impl Fn(f64) -> f64) -> Self {
        ExtensionLevels {
            e1272: price_at(Extension::E1272.ratio()),
            e1618: price_at(Extension::E1618.ratio()),
            e2000: price_at(Extension::E2000.ratio()),
            e2618: price_at(Extension::E2618.ratio()),
        }
    }

    pub fn get(&self, level: Extension) -> f64 {
        match level {
            Extension::E1272 => self.e1272,
            Extension::E1618 => self.e1618,
            Extension::E2000 => self.e2000,
            Extension::E2618 => self.e2618,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Extension, f64)> + '_ {
        Extension::ALL.into_iter().map(|level| (level, self.get(level)))
    }
}

/// 스윙 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FibDirection {
    Uptrend,
    Downtrend,
}

/// 피보나치 되돌림/확장 레벨
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevels {
    /// 스윙 고점
    pub high: f64,
    /// 스윙 저점
    pub low: f64,
    pub retracement: RetracementLevels,
    pub extension: ExtensionLevels,
    pub direction: FibDirection,
}

/// 근접한 피보나치 레벨
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FibLevel {
    Retracement(Retracement),
    Extension(Extension),
}

impl Display for FibLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FibLevel::Retracement(level) => write!(f, "Retracement {}", level.label()),
            FibLevel::Extension(level) => write!(f, "Extension {}", level.label()),
        }
    }
}

/// 구간 내 스윙 고점/저점과 그 위치
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingRange {
    pub high: f64,
    pub low: f64,
    pub high_index: usize,
    pub low_index: usize,
}

/// 최근 `lookback`개 캔들에서 최고가/최저가와 위치를 찾습니다.
///
/// 같은 값이 여러 번 나오면 가장 먼저 나온 위치를 사용합니다.
pub fn find_swing_high_low<C: Candle>(candles: &[C], lookback: usize) -> Option<SwingRange> {
    let start = candles.len().saturating_sub(lookback.max(1));
    let first = candles.get(start)?;

    let mut range = SwingRange {
        high: first.high_price(),
        low: first.low_price(),
        high_index: start,
        low_index: start,
    };

    for (i, candle) in candles.iter().enumerate().skip(start + 1) {
        if candle.high_price() > range.high {
            range.high = candle.high_price();
            range.high_index = i;
        }
        if candle.low_price() < range.low {
            range.low = candle.low_price();
            range.low_index = i;
        }
    }

    Some(range)
}

impl FibonacciLevels {
    /// 스윙 고점/저점과 방향으로 레벨 계산
    ///
    /// 상승 추세: 되돌림은 고점에서 아래로, 확장은 저점 기준 위로.
    /// 하락 추세: 되돌림은 저점에서 위로, 확장은 고점 기준 아래로.
    pub fn new(high: f64, low: f64, is_uptrend: bool) -> FibonacciLevels {
        let diff = high - low;

        let (retracement, extension, direction) = if is_uptrend {
            (
                RetracementLevels::build(|r| high - diff * r),
                ExtensionLevels::build(|r| low + diff * r),
                FibDirection::Uptrend,
            )
        } else {
            (
                RetracementLevels::build(|r| low + diff * r),
                ExtensionLevels::build(|r| high - diff * r),
                FibDirection::Downtrend,
            )
        };

        FibonacciLevels {
            high,
            low,
            retracement,
            extension,
            direction,
        }
    }

    /// 캔들 구간에서 계산. 저점이 고점보다 먼저 나오면 상승 추세로 봅니다.
    pub fn from_candles<C: Candle>(candles: &[C], lookback: usize) -> Option<FibonacciLevels> {
        if candles.len() < 2 {
            return None;
        }
        let swing = find_swing_high_low(candles, lookback)?;
        Some(Self::new(
            swing.high,
            swing.low,
            swing.low_index < swing.high_index,
        ))
    }

    /// 핵심 되돌림 가격 (38.2 / 50 / 61.8)
    pub fn key_retracement_levels(&self) -> [f64; 3] {
        Retracement::KEY.map(|level| self.retracement.get(level))
    }

    /// 핵심 확장 가격 (1.272 / 1.618 / 2.0)
    pub fn key_extension_levels(&self) -> [f64; 3] {
        [
            self.extension.e1272,
            self.extension.e1618,
            self.extension.e2000,
        ]
    }

    /// 가격이 어떤 레벨의 `threshold` 비율 이내에 있는지 확인
    ///
    /// 되돌림 레벨을 먼저, 그 다음 확장 레벨을 정해진 순서로 검사합니다.
    pub fn is_near_level(&self, price: f64, threshold: f64) -> Option<FibLevel> {
        let near = |level: f64| level != 0.0 && ((price - level) / level).abs() < threshold;

        self.retracement
            .iter()
            .find(|(_, level)| near(*level))
            .map(|(label, _)| FibLevel::Retracement(label))
            .or_else(|| {
                self.extension
                    .iter()
                    .find(|(_, level)| near(*level))
                    .map(|(label, _)| FibLevel::Extension(label))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OhlcvCandle;

    #[test]
    fn test_uptrend_levels() {
        let fib = FibonacciLevels::new(100.0, 50.0, true);
        assert!((fib.retracement.r382 - 80.9).abs() < 1e-9);
        assert!((fib.retracement.r500 - 75.0).abs() < 1e-9);
        assert!((fib.retracement.r618 - 69.1).abs() < 1e-9);
        assert!((fib.extension.e1618 - 130.9).abs() < 1e-9);
        assert_eq!(fib.direction, FibDirection::Uptrend);
    }

    #[test]
    fn test_downtrend_levels() {
        let fib = FibonacciLevels::new(100.0, 50.0, false);
        assert!((fib.retracement.r382 - 69.1).abs() < 1e-9);
        assert!((fib.extension.e1618 - 19.1).abs() < 1e-9);
        assert_eq!(fib.direction, FibDirection::Downtrend);
    }

    #[test]
    fn test_direction_from_candle_order() {
        let candles = vec![
            OhlcvCandle::new(0, 55.0, 56.0, 50.0, 55.0, 1.0),
            OhlcvCandle::new(1, 80.0, 100.0, 75.0, 90.0, 1.0),
            OhlcvCandle::new(2, 90.0, 92.0, 85.0, 88.0, 1.0),
        ];
        let fib = FibonacciLevels::from_candles(&candles, 50).unwrap();
        assert_eq!(fib.direction, FibDirection::Uptrend);
        assert_eq!(fib.high, 100.0);
        assert_eq!(fib.low, 50.0);

        let reversed: Vec<OhlcvCandle> = candles.into_iter().rev().collect();
        let fib = FibonacciLevels::from_candles(&reversed, 50).unwrap();
        assert_eq!(fib.direction, FibDirection::Downtrend);
    }

    #[test]
    fn test_single_candle_has_no_levels() {
        let candles = vec![OhlcvCandle::new(0, 1.0, 2.0, 0.5, 1.5, 1.0)];
        assert!(FibonacciLevels::from_candles(&candles, 10).is_none());
    }

    #[test]
    fn test_is_near_level() {
        let fib = FibonacciLevels::new(100.0, 50.0, true);
        assert_eq!(
            fib.is_near_level(75.2, 0.005),
            Some(FibLevel::Retracement(Retracement::R500))
        );
        assert_eq!(
            fib.is_near_level(130.5, 0.005),
            Some(FibLevel::Extension(Extension::E1618))
        );
        assert_eq!(fib.is_near_level(72.0, 0.005), None);
        assert_eq!(
            FibLevel::Retracement(Retracement::R618).to_string(),
            "Retracement 61.8%"
        );
    }

    #[test]
    fn test_serialized_labels() {
        let fib = FibonacciLevels::new(100.0, 50.0, true);
        let json = serde_json::to_value(fib).unwrap();
        assert_eq!(json["retracement"]["50%"], 75.0);
        assert_eq!(json["extension"]["2.0"], 150.0);
        assert_eq!(json["direction"], "UPTREND");
    }
}
