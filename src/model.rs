use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::str::FromStr;

/// 캔들 데이터 접근 인터페이스
///
/// 분석 파이프라인은 이 트레이트만을 통해 OHLCV 값에 접근합니다.
/// 캔들은 한 번 생성되면 변경되지 않습니다.
pub trait Candle: Debug + Clone {
    /// 캔들 시작 시각 (밀리초 단위 유닉스 타임스탬프)
    fn timestamp(&self) -> i64;
    /// 시가
    fn open_price(&self) -> f64;
    /// 고가
    fn high_price(&self) -> f64;
    /// 저가
    fn low_price(&self) -> f64;
    /// 종가
    fn close_price(&self) -> f64;
    /// 거래량
    fn volume(&self) -> f64;

    /// 캔들 시작 시각을 UTC 시간으로 반환
    fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp()).unwrap_or_default()
    }

    /// 몸통 크기 (|종가 - 시가|)
    fn body_size(&self) -> f64 {
        (self.close_price() - self.open_price()).abs()
    }

    /// 전체 범위 (고가 - 저가)
    fn range(&self) -> f64 {
        self.high_price() - self.low_price()
    }

    /// 윗꼬리 길이
    fn upper_shadow(&self) -> f64 {
        self.high_price() - self.open_price().max(self.close_price())
    }

    /// 아랫꼬리 길이
    fn lower_shadow(&self) -> f64 {
        self.open_price().min(self.close_price()) - self.low_price()
    }

    /// 양봉 여부
    fn is_bullish(&self) -> bool {
        self.close_price() > self.open_price()
    }

    /// 음봉 여부
    fn is_bearish(&self) -> bool {
        self.close_price() < self.open_price()
    }
}

/// 기본 OHLCV 캔들
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcvCandle {
    /// 밀리초 단위 유닉스 타임스탬프
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvCandle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        OhlcvCandle {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl Display for OhlcvCandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "OhlcvCandle(t={}, o={}, h={}, l={}, c={}, v={})",
            self.timestamp, self.open, self.high, self.low, self.close, self.volume
        )
    }
}

impl Candle for OhlcvCandle {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
    fn open_price(&self) -> f64 {
        self.open
    }
    fn high_price(&self) -> f64 {
        self.high
    }
    fn low_price(&self) -> f64 {
        self.low
    }
    fn close_price(&self) -> f64 {
        self.close
    }
    fn volume(&self) -> f64 {
        self.volume
    }
}

/// 지원되는 캔들 간격
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandleInterval {
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "1w")]
    Week1,
}

impl CandleInterval {
    /// 모든 간격 목록
    pub const ALL: [CandleInterval; 6] = [
        CandleInterval::Minute5,
        CandleInterval::Minute15,
        CandleInterval::Hour1,
        CandleInterval::Hour4,
        CandleInterval::Day1,
        CandleInterval::Week1,
    ];

    /// 간격 문자열 표현
    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::Minute5 => "5m",
            CandleInterval::Minute15 => "15m",
            CandleInterval::Hour1 => "1h",
            CandleInterval::Hour4 => "4h",
            CandleInterval::Day1 => "1d",
            CandleInterval::Week1 => "1w",
        }
    }
}

impl Display for CandleInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CandleInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CandleInterval::ALL
            .iter()
            .find(|interval| interval.as_str() == s)
            .copied()
            .ok_or_else(|| format!("지원되지 않는 캔들 간격: {}", s))
    }
}

/// 추세 방향 라벨
///
/// 패턴 인식과 시장 구조 분석의 파라미터로 사용되는 이동평균 기반 방향과
/// 지표 융합 점수 기반 추세 판단 양쪽에서 공통으로 사용합니다.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// 상승
    Up,
    /// 하락
    Down,
    /// 횡보
    #[default]
    Sideways,
}

impl Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Up => write!(f, "up"),
            TrendDirection::Down => write!(f, "down"),
            TrendDirection::Sideways => write!(f, "sideways"),
        }
    }
}

/// 거래 방향
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionType {
    /// 롱 포지션
    Long,
    /// 숏 포지션
    Short,
}

impl Display for PositionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionType::Long => write!(f, "LONG"),
            PositionType::Short => write!(f, "SHORT"),
        }
    }
}
