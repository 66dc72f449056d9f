#![allow(dead_code)]

use trading_analysis::model::Candle;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestCandle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl std::fmt::Display for TestCandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TestCandle(t={}, o={}, h={}, l={}, c={}, v={})",
            self.timestamp, self.open, self.high, self.low, self.close, self.volume
        )
    }
}

impl Candle for TestCandle {
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

/// 일봉 간격 (밀리초)
pub const DAY_MS: i64 = 86_400_000;

impl TestCandle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        TestCandle {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// O=H=L=C=price, V=1 인 일봉
pub fn create_flat_candles(count: usize, price: f64) -> Vec<TestCandle> {
    (0..count)
        .map(|i| TestCandle::new(i as i64 * DAY_MS, price, price, price, price, 1.0))
        .collect()
}

pub fn create_uptrend_candles(count: usize, base_price: f64, step: f64) -> Vec<TestCandle> {
    let mut candles = Vec::with_capacity(count);
    for i in 0..count {
        let price = base_price + (i as f64 * step);
        candles.push(TestCandle {
            timestamp: i as i64 * DAY_MS,
            open: price - step / 2.0,
            high: price + step,
            low: price - step,
            close: price + step / 2.0,
            volume: 1000.0,
        });
    }
    candles
}

pub fn create_downtrend_candles(count: usize, base_price: f64, step: f64) -> Vec<TestCandle> {
    let mut candles = Vec::with_capacity(count);
    for i in 0..count {
        let price = base_price - (i as f64 * step);
        candles.push(TestCandle {
            timestamp: i as i64 * DAY_MS,
            open: price + step / 2.0,
            high: price + step,
            low: price - step,
            close: price - step / 2.0,
            volume: 1000.0,
        });
    }
    candles
}

pub fn create_sideways_candles(count: usize, base_price: f64, range: f64) -> Vec<TestCandle> {
    let mut candles = Vec::with_capacity(count);
    for i in 0..count {
        let oscillation = (i % 4) as f64 * range / 4.0 - range / 2.0;
        let price = base_price + oscillation;
        candles.push(TestCandle {
            timestamp: i as i64 * DAY_MS,
            open: price,
            high: price + range / 8.0,
            low: price - range / 8.0,
            close: price,
            volume: 1000.0,
        });
    }
    candles
}

/// 횡보 구간(20개) 이후 꾸준히 상승하는 시계열
pub fn create_consolidation_breakout_candles(count: usize) -> Vec<TestCandle> {
    let mut candles = create_sideways_candles(20.min(count), 100.0, 4.0);
    for i in candles.len()..count {
        let price = 100.0 + (i as f64 - 19.0) * 1.5;
        candles.push(TestCandle {
            timestamp: i as i64 * DAY_MS,
            open: price - 0.5,
            high: price + 1.0,
            low: price - 1.0,
            close: price + 0.5,
            volume: 1500.0,
        });
    }
    candles
}

pub fn closes(candles: &[TestCandle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}
