//! 에러 타입 — 도메인별 에러 정의

/// Apkinspect 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ApkInspectError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스캔 파이프라인 에러 (언팩/매니페스트 추출)
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// 스토리지 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스캔 파이프라인 에러
///
/// 언팩 도구의 진단 메시지는 가공 없이 그대로 전달됩니다.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 외부 언팩 도구 실패 (stderr 진단 메시지)
    #[error("Error: {0}")]
    UnpackFailed(String),

    /// 디코딩된 매니페스트 파일 없음
    #[error("AndroidManifest.xml not found: {path}")]
    ManifestNotFound { path: String },

    /// 매니페스트 파싱 실패
    #[error("manifest parse error: {0}")]
    ManifestParse(String),
}

/// 스토리지 에러
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 연결 실패
    #[error("connection failed: {0}")]
    Connection(String),

    /// 쿼리 실패
    #[error("query failed: {0}")]
    Query(String),
}
