//! 설정 관리 — apkinspect.toml 파싱 및 런타임 설정
//!
//! [`ApkInspectConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`APKINSPECT_SCANNER_DB_PATH=/tmp/scan.db` 형식)
//! 3. 설정 파일 (`apkinspect.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), apkinspect_core::error::ApkInspectError> {
//! use apkinspect_core::config::ApkInspectConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ApkInspectConfig::load("apkinspect.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ApkInspectConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ApkInspectError, ConfigError};

/// Apkinspect 통합 설정
///
/// `apkinspect.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApkInspectConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 스캐너 설정
    #[serde(default)]
    pub scanner: ScannerSection,
}

impl ApkInspectConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ApkInspectError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ApkInspectError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ApkInspectError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ApkInspectError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ApkInspectError> {
        toml::from_str(toml_str).map_err(|e| {
            ApkInspectError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `APKINSPECT_{SECTION}_{FIELD}`
    /// 예: `APKINSPECT_SCANNER_DB_PATH=/tmp/scan.db`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "APKINSPECT_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "APKINSPECT_GENERAL_LOG_FORMAT",
        );
        override_string(&mut self.general.data_dir, "APKINSPECT_GENERAL_DATA_DIR");

        // Scanner
        override_string(&mut self.scanner.java_path, "APKINSPECT_SCANNER_JAVA_PATH");
        override_string(
            &mut self.scanner.apktool_jar,
            "APKINSPECT_SCANNER_APKTOOL_JAR",
        );
        override_string(&mut self.scanner.work_dir, "APKINSPECT_SCANNER_WORK_DIR");
        override_string(&mut self.scanner.db_path, "APKINSPECT_SCANNER_DB_PATH");
        override_u64(
            &mut self.scanner.max_manifest_size,
            "APKINSPECT_SCANNER_MAX_MANIFEST_SIZE",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ApkInspectError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // 스캐너 필수 경로 검증
        if self.scanner.apktool_jar.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "scanner.apktool_jar".to_owned(),
                reason: "apktool_jar must not be empty".to_owned(),
            }
            .into());
        }
        if self.scanner.db_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "scanner.db_path".to_owned(),
                reason: "db_path must not be empty".to_owned(),
            }
            .into());
        }
        if self.scanner.max_manifest_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scanner.max_manifest_size".to_owned(),
                reason: "max_manifest_size must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 데이터 디렉토리
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            data_dir: "/var/lib/apkinspect".to_owned(),
        }
    }
}

/// 스캐너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSection {
    /// java 실행 파일 경로
    pub java_path: String,
    /// apktool jar 경로
    pub apktool_jar: String,
    /// 디코딩 작업 디렉토리
    pub work_dir: String,
    /// SQLite 데이터베이스 파일 경로
    pub db_path: String,
    /// 매니페스트 최대 크기 (바이트)
    pub max_manifest_size: u64,
}

impl Default for ScannerSection {
    fn default() -> Self {
        Self {
            java_path: "java".to_owned(),
            apktool_jar: "/usr/local/share/apktool/apktool.jar".to_owned(),
            work_dir: std::env::temp_dir().display().to_string(),
            db_path: "/var/lib/apkinspect/scans.db".to_owned(),
            max_manifest_size: 16 * 1024 * 1024, // 16MB
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = ApkInspectConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.scanner.java_path, "java");
        assert!(!config.scanner.apktool_jar.is_empty());
        assert!(config.scanner.max_manifest_size > 0);
    }

    #[test]
    fn default_config_passes_validation() {
        let config = ApkInspectConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = ApkInspectConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.scanner.java_path, "java");
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[general]
log_level = "debug"

[scanner]
db_path = "/data/scans.db"
"#;
        let config = ApkInspectConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        // log_format은 기본값 유지
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.scanner.db_path, "/data/scans.db");
        assert_eq!(config.scanner.java_path, "java");
    }

    #[test]
    fn from_str_full_toml() {
        let toml = r#"
[general]
log_level = "warn"
log_format = "pretty"
data_dir = "/opt/apkinspect/data"

[scanner]
java_path = "/usr/bin/java"
apktool_jar = "/opt/apktool/apktool.jar"
work_dir = "/opt/apkinspect/work"
db_path = "/opt/apkinspect/scans.db"
max_manifest_size = 1048576
"#;
        let config = ApkInspectConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.scanner.java_path, "/usr/bin/java");
        assert_eq!(config.scanner.apktool_jar, "/opt/apktool/apktool.jar");
        assert_eq!(config.scanner.max_manifest_size, 1_048_576);
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let result = ApkInspectConfig::parse("invalid = [[[toml");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            ApkInspectError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = ApkInspectConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = ApkInspectConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_empty_apktool_jar() {
        let mut config = ApkInspectConfig::default();
        config.scanner.apktool_jar = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("apktool_jar"));
    }

    #[test]
    fn validate_rejects_empty_db_path() {
        let mut config = ApkInspectConfig::default();
        config.scanner.db_path = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("db_path"));
    }

    #[test]
    fn validate_rejects_zero_max_manifest_size() {
        let mut config = ApkInspectConfig::default();
        config.scanner.max_manifest_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_manifest_size"));
    }

    #[test]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_APKINSPECT_STR", "overridden") };
        override_string(&mut val, "TEST_APKINSPECT_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_APKINSPECT_STR") };
    }

    #[test]
    fn env_override_u64_invalid_keeps_original() {
        let mut val = 42u64;
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_APKINSPECT_U64_BAD", "not-a-number") };
        override_u64(&mut val, "TEST_APKINSPECT_U64_BAD");
        assert_eq!(val, 42); // 원래 값 유지
        unsafe { std::env::remove_var("TEST_APKINSPECT_U64_BAD") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_APKINSPECT_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = ApkInspectConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = ApkInspectConfig::parse(&toml_str).unwrap();
        assert_eq!(config.general.log_level, parsed.general.log_level);
        assert_eq!(config.scanner.db_path, parsed.scanner.db_path);
        assert_eq!(
            config.scanner.max_manifest_size,
            parsed.scanner.max_manifest_size
        );
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = ApkInspectConfig::from_file("/nonexistent/path/apkinspect.toml").await;
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            ApkInspectError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
