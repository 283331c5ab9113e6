//! 스캐너 설정
//!
//! [`ScannerConfig`]는 core의 [`ScannerSection`](apkinspect_core::config::ScannerSection)에서
//! 파생되며, 스캔 파이프라인이 사용하는 경로와 크기 제한을 담습니다.
//!
//! # 사용 예시
//!
//! ```
//! use apkinspect_scanner::ScannerConfig;
//!
//! // 기본값으로 생성
//! let config = ScannerConfig::default();
//! config.validate().unwrap();
//!
//! // 빌더로 생성
//! use apkinspect_scanner::ScannerConfigBuilder;
//!
//! let config = ScannerConfigBuilder::new()
//!     .db_path("/tmp/scans.db")
//!     .apktool_jar("/opt/apktool/apktool.jar")
//!     .build()
//!     .unwrap();
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ScannerError;

/// 스캐너 설정
///
/// # 필드
///
/// - **java_path**: java 실행 파일 경로
/// - **apktool_jar**: apktool jar 경로
/// - **work_dir**: 디코딩 작업 디렉토리 (스캔마다 하위에 고유 디렉토리 생성)
/// - **db_path**: SQLite 데이터베이스 파일 경로
/// - **max_manifest_size**: 매니페스트 최대 크기 (바이트)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// java 실행 파일 경로
    pub java_path: String,
    /// apktool jar 경로
    pub apktool_jar: String,
    /// 디코딩 작업 디렉토리
    pub work_dir: PathBuf,
    /// SQLite 데이터베이스 파일 경로
    pub db_path: PathBuf,
    /// 매니페스트 최대 허용 크기 (바이트)
    pub max_manifest_size: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            java_path: "java".to_owned(),
            apktool_jar: "/usr/local/share/apktool/apktool.jar".to_owned(),
            work_dir: std::env::temp_dir(),
            db_path: PathBuf::from("/var/lib/apkinspect/scans.db"),
            max_manifest_size: 16 * 1024 * 1024, // 16 MB
        }
    }
}

/// 설정 상한값 상수
const MAX_MANIFEST_SIZE_LIMIT: u64 = 256 * 1024 * 1024; // 256 MB
const MAX_PATH_LEN: usize = 4096;

impl ScannerConfig {
    /// core의 `ScannerSection`에서 스캐너 설정을 생성합니다.
    pub fn from_core(core: &apkinspect_core::config::ScannerSection) -> Self {
        Self {
            java_path: core.java_path.clone(),
            apktool_jar: core.apktool_jar.clone(),
            work_dir: PathBuf::from(&core.work_dir),
            db_path: PathBuf::from(&core.db_path),
            max_manifest_size: core.max_manifest_size,
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `java_path`, `apktool_jar`, `db_path`: 비어있으면 안 됨
    /// - `max_manifest_size`: 1-268435456 (256MB)
    /// - 모든 경로: `..` 컴포넌트 금지, 길이 제한
    pub fn validate(&self) -> Result<(), ScannerError> {
        if self.java_path.is_empty() {
            return Err(ScannerError::Config {
                field: "java_path".to_owned(),
                reason: "java_path must not be empty".to_owned(),
            });
        }

        if self.apktool_jar.is_empty() {
            return Err(ScannerError::Config {
                field: "apktool_jar".to_owned(),
                reason: "apktool_jar must not be empty".to_owned(),
            });
        }

        if self.db_path.as_os_str().is_empty() {
            return Err(ScannerError::Config {
                field: "db_path".to_owned(),
                reason: "db_path must not be empty".to_owned(),
            });
        }

        if self.max_manifest_size == 0 || self.max_manifest_size > MAX_MANIFEST_SIZE_LIMIT {
            return Err(ScannerError::Config {
                field: "max_manifest_size".to_owned(),
                reason: format!("must be 1-{MAX_MANIFEST_SIZE_LIMIT}"),
            });
        }

        // 경로 순회 방어: ".." 컴포넌트 검출 + 길이 제한
        for (field, path) in [
            ("work_dir", &self.work_dir),
            ("db_path", &self.db_path),
            ("apktool_jar", &PathBuf::from(&self.apktool_jar)),
        ] {
            if path
                .components()
                .any(|c| c == std::path::Component::ParentDir)
            {
                return Err(ScannerError::Config {
                    field: field.to_owned(),
                    reason: format!(
                        "path '{}' contains path traversal pattern '..'",
                        path.display()
                    ),
                });
            }

            if path.as_os_str().len() > MAX_PATH_LEN {
                return Err(ScannerError::Config {
                    field: field.to_owned(),
                    reason: format!(
                        "path '{}' exceeds maximum length {}",
                        path.display(),
                        MAX_PATH_LEN
                    ),
                });
            }
        }

        Ok(())
    }
}

/// [`ScannerConfig`] 빌더
///
/// 유연한 설정 구성 및 빌드 시 유효성 검증을 제공합니다.
#[derive(Default)]
pub struct ScannerConfigBuilder {
    config: ScannerConfig,
}

impl ScannerConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// java 실행 파일 경로를 설정합니다.
    pub fn java_path(mut self, path: impl Into<String>) -> Self {
        self.config.java_path = path.into();
        self
    }

    /// apktool jar 경로를 설정합니다.
    pub fn apktool_jar(mut self, path: impl Into<String>) -> Self {
        self.config.apktool_jar = path.into();
        self
    }

    /// 디코딩 작업 디렉토리를 설정합니다.
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = dir.into();
        self
    }

    /// 데이터베이스 파일 경로를 설정합니다.
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    /// 매니페스트 최대 크기(바이트)를 설정합니다.
    pub fn max_manifest_size(mut self, size: u64) -> Self {
        self.config.max_manifest_size = size;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `ScannerError::Config` 반환
    pub fn build(self) -> Result<ScannerConfig, ScannerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
