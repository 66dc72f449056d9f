pub mod analysis;
pub mod analyzer;
pub mod candle_series;
pub mod error;
pub mod indicator;
pub mod market_data;
pub mod model;
pub mod repository;
pub mod service;
pub mod strategy;

/// 설정 로더
pub mod config_loader;

pub use analysis::{AnalysisResult, MarketAnalyzer};
pub use error::{AnalysisError, StorageError};
