// 분석 설정 로드 모듈
// TOML/JSON 설정 파일에서 AnalysisConfig를 읽고 검증합니다.
use crate::model::CandleInterval;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// 설정 로드 오류
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 파일 오류
    #[error("설정 파일 오류: {0}")]
    FileError(String),
    /// 파싱 오류
    #[error("설정 파싱 오류: {0}")]
    ParseError(String),
    /// 유효성 검사 오류
    #[error("설정 유효성 검사 오류: {0}")]
    ValidationError(String),
}

/// 설정 로드 결과
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 설정 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON 형식
    Json,
    /// TOML 형식
    Toml,
    /// 자동 감지 (파일 확장자로부터)
    Auto,
}

/// 설정 유효성 검사 트레이트
pub trait ConfigValidation {
    /// 설정 유효성 검사
    fn validate(&self) -> ConfigResult<()>;
}

fn default_symbol() -> String {
    "ETHUSDT".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}

fn default_limit() -> usize {
    100
}

fn default_max_limit() -> usize {
    500
}

fn default_min_risk_reward() -> f64 {
    3.0
}

fn default_min_candles() -> usize {
    20
}

fn default_fibonacci_lookback() -> usize {
    50
}

fn default_atr_period() -> usize {
    14
}

fn default_validity_hours() -> i64 {
    4
}

/// 지지/저항 레벨 클러스터링 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// 현재가 주변 제외 구간 (%)
    #[serde(default = "LevelConfig::default_buffer_pct")]
    pub buffer_pct: f64,
    /// 지지/저항 각각의 최대 레벨 수
    #[serde(default = "LevelConfig::default_max_levels")]
    pub max_levels: usize,
    /// 클러스터로 인정되는 최소 포인트 수
    #[serde(default = "LevelConfig::default_min_cluster_size")]
    pub min_cluster_size: usize,
    /// 스윙 고/저점으로 보충한 레벨의 강도
    #[serde(default = "LevelConfig::default_backfill_strength")]
    pub backfill_strength: f64,
    /// 동적 임계값에 쓰이는 ATR 배수
    #[serde(default = "LevelConfig::default_atr_factor")]
    pub atr_factor: f64,
}

impl LevelConfig {
    fn default_buffer_pct() -> f64 {
        0.2
    }
    fn default_max_levels() -> usize {
        5
    }
    fn default_min_cluster_size() -> usize {
        2
    }
    fn default_backfill_strength() -> f64 {
        0.5
    }
    fn default_atr_factor() -> f64 {
        0.5
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        LevelConfig {
            buffer_pct: Self::default_buffer_pct(),
            max_levels: Self::default_max_levels(),
            min_cluster_size: Self::default_min_cluster_size(),
            backfill_strength: Self::default_backfill_strength(),
            atr_factor: Self::default_atr_factor(),
        }
    }
}

/// 분석 파이프라인 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// 기본 심볼
    #[serde(default = "default_symbol")]
    pub default_symbol: String,
    /// 기본 캔들 간격
    #[serde(default = "default_interval")]
    pub default_interval: String,
    /// 기본 캔들 조회 수
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// 최대 캔들 조회 수
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    /// 기회 필터링 최소 손익비
    #[serde(default = "default_min_risk_reward")]
    pub min_risk_reward: f64,
    /// 분석에 필요한 최소 캔들 수
    #[serde(default = "default_min_candles")]
    pub min_candles: usize,
    /// 피보나치 스윙 탐색 구간
    #[serde(default = "default_fibonacci_lookback")]
    pub fibonacci_lookback: usize,
    /// ATR 기간
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,
    /// 기회 유효 시간 (시간 단위)
    #[serde(default = "default_validity_hours")]
    pub opportunity_validity_hours: i64,
    /// 레벨 클러스터링 설정
    #[serde(default)]
    pub levels: LevelConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            default_symbol: default_symbol(),
            default_interval: default_interval(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            min_risk_reward: default_min_risk_reward(),
            min_candles: default_min_candles(),
            fibonacci_lookback: default_fibonacci_lookback(),
            atr_period: default_atr_period(),
            opportunity_validity_hours: default_validity_hours(),
            levels: LevelConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// 요청된 캔들 수를 허용 범위로 보정합니다.
    ///
    /// (0, max_limit] 범위를 벗어나면 기본 조회 수를 사용합니다.
    pub fn clamp_limit(&self, limit: usize) -> usize {
        if limit == 0 || limit > self.max_limit {
            debug!(
                "요청 캔들 수 {} 범위 초과, 기본값 {} 사용",
                limit, self.default_limit
            );
            self.default_limit
        } else {
            limit
        }
    }
}

impl ConfigValidation for AnalysisConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.default_interval
            .parse::<CandleInterval>()
            .map_err(ConfigError::ValidationError)?;
        if self.max_limit == 0 {
            return Err(ConfigError::ValidationError(
                "max_limit은 0보다 커야 합니다".to_string(),
            ));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(ConfigError::ValidationError(format!(
                "default_limit({})은 1 이상 max_limit({}) 이하여야 합니다",
                self.default_limit, self.max_limit
            )));
        }
        if self.min_risk_reward <= 0.0 {
            return Err(ConfigError::ValidationError(
                "min_risk_reward는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.min_candles < 20 {
            return Err(ConfigError::ValidationError(format!(
                "min_candles({})는 20 이상이어야 합니다",
                self.min_candles
            )));
        }
        if self.fibonacci_lookback < 2 || self.atr_period == 0 {
            return Err(ConfigError::ValidationError(
                "fibonacci_lookback은 2 이상, atr_period는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.opportunity_validity_hours <= 0 {
            return Err(ConfigError::ValidationError(
                "opportunity_validity_hours는 0보다 커야 합니다".to_string(),
            ));
        }

        let levels = &self.levels;
        if levels.buffer_pct < 0.0 || levels.atr_factor < 0.0 {
            return Err(ConfigError::ValidationError(
                "buffer_pct와 atr_factor는 음수일 수 없습니다".to_string(),
            ));
        }
        if levels.max_levels == 0 || levels.min_cluster_size == 0 {
            return Err(ConfigError::ValidationError(
                "max_levels와 min_cluster_size는 0보다 커야 합니다".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&levels.backfill_strength) {
            return Err(ConfigError::ValidationError(
                "backfill_strength는 0과 1 사이여야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

/// 설정 파일 로더
#[derive(Debug)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// 파일에서 설정 로드
    ///
    /// # Arguments
    /// * `path` - 설정 파일 경로
    /// * `format` - 설정 파일 형식 (Auto이면 확장자로 판단)
    ///
    /// # Returns
    /// * `ConfigResult<T>` - 검증된 설정 객체 또는 오류
    pub fn load_from_file<T>(path: &Path, format: ConfigFormat) -> ConfigResult<T>
    where
        T: DeserializeOwned + ConfigValidation,
    {
        debug!("설정 파일 로드 시작: {}", path.display());

        let format = match format {
            ConfigFormat::Auto => Self::detect_format(path)?,
            other => other,
        };

        let content = std::fs::read_to_string(path).map_err(|e| {
            error!("설정 파일 읽기 실패: {} - {}", path.display(), e);
            ConfigError::FileError(format!("파일 읽기 실패: {}", e))
        })?;

        let config: T = Self::parse(&content, format).inspect_err(|e| {
            error!("설정 파일 파싱 실패: {} - {}", path.display(), e);
        })?;

        config.validate().inspect_err(|e| {
            error!("설정 유효성 검사 실패: {}", e);
        })?;

        info!("설정 파일 로드 완료: {}", path.display());
        Ok(config)
    }

    /// 문자열에서 설정 로드
    ///
    /// Auto 형식이면 JSON을 먼저 시도하고 실패 시 TOML로 파싱합니다.
    pub fn load_from_string<T>(content: &str, format: ConfigFormat) -> ConfigResult<T>
    where
        T: DeserializeOwned + ConfigValidation,
    {
        let config: T = match format {
            ConfigFormat::Auto => {
                Self::parse_json(content).or_else(|_| Self::parse_toml(content))?
            }
            other => Self::parse(content, other)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일 저장
    ///
    /// # Arguments
    /// * `config` - 설정 객체
    /// * `path` - 저장할 파일 경로
    /// * `format` - 설정 파일 형식 (Auto이면 확장자, 없으면 TOML)
    pub fn save_to_file<T>(config: &T, path: &Path, format: ConfigFormat) -> ConfigResult<()>
    where
        T: Serialize + ConfigValidation,
    {
        let format = match format {
            ConfigFormat::Auto => Self::detect_format(path).unwrap_or(ConfigFormat::Toml),
            other => other,
        };

        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(config)
                .map_err(|e| ConfigError::ParseError(format!("JSON 직렬화 실패: {}", e)))?,
            _ => toml::to_string_pretty(config)
                .map_err(|e| ConfigError::ParseError(format!("TOML 직렬화 실패: {}", e)))?,
        };

        std::fs::write(path, content).map_err(|e| {
            error!("설정 파일 쓰기 실패: {} - {}", path.display(), e);
            ConfigError::FileError(format!("파일 쓰기 실패: {}", e))
        })?;

        info!("설정 파일 저장 완료: {}", path.display());
        Ok(())
    }

    fn parse<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> ConfigResult<T> {
        match format {
            ConfigFormat::Json => Self::parse_json(content),
            ConfigFormat::Toml => Self::parse_toml(content),
            ConfigFormat::Auto => Self::parse_json(content).or_else(|_| Self::parse_toml(content)),
        }
    }

    /// JSON 파싱
    fn parse_json<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
        serde_json::from_str(content).map_err(|e| {
            warn!("JSON 파싱 실패: {}", e);
            ConfigError::ParseError(format!("JSON 파싱 실패: {}", e))
        })
    }

    /// TOML 파싱
    fn parse_toml<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
        toml::from_str(content).map_err(|e| {
            warn!("TOML 파싱 실패: {}", e);
            ConfigError::ParseError(format!("TOML 파싱 실패: {}", e))
        })
    }

    /// 파일 형식 감지
    fn detect_format(path: &Path) -> ConfigResult<ConfigFormat> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(ConfigFormat::Json),
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => {
                warn!("지원되지 않는 파일 형식: {}", path.display());
                Err(ConfigError::FileError(format!(
                    "파일 형식을 감지할 수 없음: {}",
                    path.display()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: AnalysisConfig =
            ConfigLoader::load_from_string("", ConfigFormat::Toml).unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.default_symbol, "ETHUSDT");
        assert_eq!(config.levels.max_levels, 5);
    }

    #[test]
    fn test_partial_json_overrides() {
        let json = r#"{"min_risk_reward": 2.5, "levels": {"buffer_pct": 0.3}}"#;
        let config: AnalysisConfig =
            ConfigLoader::load_from_string(json, ConfigFormat::Auto).unwrap();
        assert_eq!(config.min_risk_reward, 2.5);
        assert_eq!(config.levels.buffer_pct, 0.3);
        assert_eq!(config.levels.min_cluster_size, 2);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let cases = [
            r#"{"min_risk_reward": 0.0}"#,
            r#"{"min_candles": 10}"#,
            r#"{"default_limit": 600}"#,
            r#"{"max_limit": 0}"#,
            r#"{"default_interval": "2h"}"#,
        ];
        for json in cases {
            let result = ConfigLoader::load_from_string::<AnalysisConfig>(json, ConfigFormat::Json);
            assert!(
                matches!(result, Err(ConfigError::ValidationError(_))),
                "{} 는 거부되어야 함",
                json
            );
        }
    }

    #[test]
    fn test_unsupported_default_interval_in_toml() {
        let result = ConfigLoader::load_from_string::<AnalysisConfig>(
            "default_interval = \"2h\"",
            ConfigFormat::Toml,
        );
        match result {
            Err(ConfigError::ValidationError(message)) => assert!(message.contains("2h")),
            other => panic!("2h 간격은 거부되어야 함: {:?}", other),
        }

        let config: AnalysisConfig =
            ConfigLoader::load_from_string("default_interval = \"15m\"", ConfigFormat::Toml).unwrap();
        assert_eq!(config.default_interval, "15m");
    }

    #[test]
    fn test_clamp_limit() {
        let config = AnalysisConfig::default();
        assert_eq!(config.clamp_limit(0), 100);
        assert_eq!(config.clamp_limit(501), 100);
        assert_eq!(config.clamp_limit(500), 500);
        assert_eq!(config.clamp_limit(42), 42);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = TempDir::new().unwrap();
        let config = AnalysisConfig {
            default_interval: "4h".to_string(),
            ..AnalysisConfig::default()
        };

        let json_path = dir.path().join("analysis.json");
        ConfigLoader::save_to_file(&config, &json_path, ConfigFormat::Auto).unwrap();
        let loaded: AnalysisConfig =
            ConfigLoader::load_from_file(&json_path, ConfigFormat::Auto).unwrap();
        assert_eq!(loaded.default_interval, "4h");

        let toml_path = dir.path().join("analysis.toml");
        ConfigLoader::save_to_file(&config, &toml_path, ConfigFormat::Auto).unwrap();
        let loaded: AnalysisConfig =
            ConfigLoader::load_from_file(&toml_path, ConfigFormat::Auto).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analysis.yaml");
        std::fs::write(&path, "").unwrap();
        let result = ConfigLoader::load_from_file::<AnalysisConfig>(&path, ConfigFormat::Auto);
        assert!(matches!(result, Err(ConfigError::FileError(_))));
    }
}
