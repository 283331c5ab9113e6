//! 스캐너 에러 타입
//!
//! [`ScannerError`]는 스캔 파이프라인 내에서 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<ScannerError> for ApkInspectError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 자연스럽게 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **언팩**: `UnpackFailed`
//! - **매니페스트**: `ManifestNotFound`, `ManifestParse`, `FileTooBig`
//! - **스토리지**: `Storage`
//! - **컴포넌트 블롭**: `ComponentDecode`
//! - **설정**: `Config`
//! - **파일 I/O**: `Io`

use apkinspect_core::error::{ApkInspectError, ScanError, StorageError};

/// 스캔 파이프라인 도메인 에러
///
/// # 에러 변환
///
/// `From<ScannerError> for ApkInspectError` 구현으로
/// CLI에서 사용하는 최상위 에러 타입으로 자동 변환됩니다.
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// 외부 언팩 도구 실패
    ///
    /// 도구의 stderr 진단 메시지를 가공 없이 그대로 담습니다.
    #[error("Error: {diagnostic}")]
    UnpackFailed {
        /// 도구가 출력한 진단 메시지 원문
        diagnostic: String,
    },

    /// 디코딩 결과에 매니페스트 파일 없음
    #[error("AndroidManifest.xml not found: {path}")]
    ManifestNotFound {
        /// 확인한 매니페스트 경로
        path: String,
    },

    /// 매니페스트 XML 파싱 실패
    #[error("manifest parse error: {0}")]
    ManifestParse(String),

    /// 매니페스트 파일 크기 초과
    #[error("manifest too large: {path}: {size} bytes (max: {max})")]
    FileTooBig {
        /// 파일 경로
        path: String,
        /// 실제 파일 크기 (바이트)
        size: u64,
        /// 최대 허용 크기 (바이트)
        max: u64,
    },

    /// 스토리지 작업 실패
    #[error("storage error: {0}")]
    Storage(String),

    /// 컴포넌트 JSON 블롭 디코딩 실패
    #[error("component decode error: record #{record_id}: {reason}")]
    ComponentDecode {
        /// 문제가 된 레코드 ID
        record_id: i64,
        /// 디코딩 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

impl From<ScannerError> for ApkInspectError {
    fn from(err: ScannerError) -> Self {
        match err {
            ScannerError::UnpackFailed { diagnostic } => {
                ApkInspectError::Scan(ScanError::UnpackFailed(diagnostic))
            }
            ScannerError::ManifestNotFound { path } => {
                ApkInspectError::Scan(ScanError::ManifestNotFound { path })
            }
            ScannerError::ManifestParse(msg) => {
                ApkInspectError::Scan(ScanError::ManifestParse(msg))
            }
            ScannerError::FileTooBig { path, size, max } => {
                ApkInspectError::Scan(ScanError::ManifestParse(format!(
                    "manifest too large: {path}: {size} bytes (max: {max})"
                )))
            }
            ScannerError::Storage(msg) => ApkInspectError::Storage(StorageError::Query(msg)),
            ScannerError::ComponentDecode { record_id, reason } => {
                ApkInspectError::Storage(StorageError::Query(format!(
                    "component decode error: record #{record_id}: {reason}"
                )))
            }
            ScannerError::Config { field, reason } => {
                ApkInspectError::Config(apkinspect_core::error::ConfigError::InvalidValue {
                    field,
                    reason,
                })
            }
            ScannerError::Io { source, .. } => ApkInspectError::Io(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_failed_prefixes_diagnostic_with_error() {
        let err = ScannerError::UnpackFailed {
            diagnostic: "brut.androlib.AndrolibException: Could not decode arsc".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "Error: brut.androlib.AndrolibException: Could not decode arsc"
        );
    }

    #[test]
    fn manifest_not_found_display() {
        let err = ScannerError::ManifestNotFound {
            path: "/tmp/scan-abc/AndroidManifest.xml".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("AndroidManifest.xml not found"));
        assert!(msg.contains("/tmp/scan-abc"));
    }

    #[test]
    fn file_too_big_display() {
        let err = ScannerError::FileTooBig {
            path: "AndroidManifest.xml".to_owned(),
            size: 20_000_000,
            max: 16_777_216,
        };
        let msg = err.to_string();
        assert!(msg.contains("20000000"));
        assert!(msg.contains("16777216"));
    }

    #[test]
    fn component_decode_display() {
        let err = ScannerError::ComponentDecode {
            record_id: 7,
            reason: "expected value at line 1".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("#7"));
        assert!(msg.contains("expected value"));
    }

    #[test]
    fn config_error_display() {
        let err = ScannerError::Config {
            field: "apktool_jar".to_owned(),
            reason: "must not be empty".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("apktool_jar"));
        assert!(msg.contains("must not be empty"));
    }

    #[test]
    fn io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = ScannerError::Io {
            path: "/tmp/test.apk".to_owned(),
            source: io_err,
        };
        assert!(err.to_string().contains("/tmp/test.apk"));
    }

    #[test]
    fn converts_to_top_level_unpack() {
        let err = ScannerError::UnpackFailed {
            diagnostic: "bad magic".to_owned(),
        };
        let top: ApkInspectError = err.into();
        assert!(matches!(
            top,
            ApkInspectError::Scan(ScanError::UnpackFailed(_))
        ));
        // 진단 메시지 원문이 최상위 에러에도 그대로 유지됨
        assert_eq!(top.to_string(), "scan error: Error: bad magic");
    }

    #[test]
    fn converts_to_top_level_manifest_not_found() {
        let err = ScannerError::ManifestNotFound {
            path: "x".to_owned(),
        };
        let top: ApkInspectError = err.into();
        assert!(matches!(
            top,
            ApkInspectError::Scan(ScanError::ManifestNotFound { .. })
        ));
    }

    #[test]
    fn converts_to_top_level_storage() {
        let err = ScannerError::Storage("no such table".to_owned());
        let top: ApkInspectError = err.into();
        assert!(matches!(
            top,
            ApkInspectError::Storage(StorageError::Query(_))
        ));
    }

    #[test]
    fn converts_to_top_level_component_decode() {
        let err = ScannerError::ComponentDecode {
            record_id: 1,
            reason: "bad".to_owned(),
        };
        let top: ApkInspectError = err.into();
        assert!(matches!(top, ApkInspectError::Storage(_)));
    }
}
