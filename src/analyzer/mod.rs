// 캔들 분석기 모듈
// 패턴 인식, 지지/저항 클러스터링, 추세 판단, 시장 구조 분석을 제공합니다.

pub mod candle_pattern_analyzer;
pub mod market_structure_analyzer;
pub mod support_resistance_analyzer;
pub mod trend_analyzer;

pub use candle_pattern_analyzer::{CandlestickPattern, PatternDirection, PatternKind, identify_patterns};
pub use market_structure_analyzer::{MarketStructure, MarketStructureAnalyzer};
pub use support_resistance_analyzer::{SRLevel, SRLevels, SupportResistanceAnalyzer};
pub use trend_analyzer::{TrendAnalysis, TrendAnalyzer};
