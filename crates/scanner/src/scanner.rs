//! 스캔 오케스트레이터 -- 전체 스캔 흐름 관리
//!
//! [`ApkScanner`]는 언팩, 매니페스트 추출, 레코드 저장, 조회를 하나의
//! 파이프라인으로 묶습니다.
//!
//! # 내부 아키텍처
//!
//! ```text
//! apk path --> ApkUnpacker --> decoded dir --> ManifestExtractor
//!                                                     |
//!                                               ManifestData
//!                                                     |
//!                                               RecordStore (SQLite)
//!                                                     |
//!                             list / search --> FilterEngine --> QueryOutcome
//! ```
//!
//! # 작업 디렉토리
//!
//! 스캔마다 `work_dir` 아래에 `scan-<uuid>` 디렉토리를 새로 만들어
//! 디코딩 결과를 받습니다. 동시 스캔이 서로의 출력을 덮어쓰지 않으며,
//! 성공/실패와 무관하게 스캔 종료 시 디렉토리를 제거합니다.

use std::path::Path;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, info, warn};
use uuid::Uuid;

use apkinspect_core::metrics::{
    LABEL_STAGE, SCANNER_COMPONENTS_EXTRACTED_TOTAL, SCANNER_SCANS_COMPLETED_TOTAL,
    SCANNER_SCANS_FAILED_TOTAL, SCANNER_SCAN_DURATION_SECONDS,
};
use apkinspect_core::types::{encode_components, ScanRecord};

use crate::config::ScannerConfig;
use crate::error::ScannerError;
use crate::filter::{ComponentFilter, FilterEngine, QueryOutcome};
use crate::manifest::ManifestExtractor;
use crate::store::RecordStore;
use crate::unpack::{ApkUnpacker, ApktoolUnpacker};

/// 스캔 오케스트레이터
///
/// 언팩 구현은 제네릭 파라미터로 주입됩니다. 프로덕션에서는
/// [`ApktoolUnpacker`], 테스트에서는 목 언팩커를 사용합니다.
pub struct ApkScanner<U: ApkUnpacker> {
    config: ScannerConfig,
    unpacker: U,
    extractor: ManifestExtractor,
    store: RecordStore,
    engine: FilterEngine,
}

impl ApkScanner<ApktoolUnpacker> {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn builder() -> ApkScannerBuilder {
        ApkScannerBuilder::new()
    }
}

impl<U: ApkUnpacker> ApkScanner<U> {
    /// APK 하나를 스캔하고 저장된 레코드를 반환합니다.
    ///
    /// # 파이프라인
    ///
    /// 1. APK 경로 확인
    /// 2. 고유 작업 디렉토리 생성 (`scan-<uuid>`)
    /// 3. 언팩 (외부 도구)
    /// 4. 매니페스트 추출 (blocking I/O)
    /// 5. 컴포넌트 인코딩 후 스토어에 저장
    /// 6. 작업 디렉토리 제거 (성공/실패 무관)
    ///
    /// # Errors
    ///
    /// 각 단계의 실패는 해당 [`ScannerError`] 변형으로 반환됩니다.
    /// 저장 단계에 도달하기 전에 실패하면 레코드는 생성되지 않습니다.
    pub async fn scan(&self, apk_path: &Path) -> Result<ScanRecord, ScannerError> {
        let start = Instant::now();

        let result = self.scan_inner(apk_path).await;

        let elapsed = start.elapsed().as_secs_f64();
        histogram!(SCANNER_SCAN_DURATION_SECONDS).record(elapsed);

        match &result {
            Ok(record) => {
                counter!(SCANNER_SCANS_COMPLETED_TOTAL).increment(1);
                counter!(SCANNER_COMPONENTS_EXTRACTED_TOTAL)
                    .increment(record.components.len() as u64);
                info!(
                    apk_name = %record.apk_name,
                    record_id = record.id,
                    components = record.components.len(),
                    elapsed_secs = elapsed,
                    "scan completed"
                );
            }
            Err(e) => {
                counter!(SCANNER_SCANS_FAILED_TOTAL, LABEL_STAGE => failure_stage(e))
                    .increment(1);
                warn!(apk = %apk_path.display(), error = %e, "scan failed");
            }
        }

        result
    }

    async fn scan_inner(&self, apk_path: &Path) -> Result<ScanRecord, ScannerError> {
        tokio::fs::metadata(apk_path)
            .await
            .map_err(|e| ScannerError::Io {
                path: apk_path.display().to_string(),
                source: e,
            })?;

        let apk_name = apk_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ScannerError::Config {
                field: "apk_path".to_owned(),
                reason: format!("'{}' has no file name", apk_path.display()),
            })?;

        // 스캔별 고유 작업 디렉토리
        let out_dir = self
            .config
            .work_dir
            .join(format!("scan-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&out_dir)
            .await
            .map_err(|e| ScannerError::Io {
                path: out_dir.display().to_string(),
                source: e,
            })?;

        let result = self.decode_and_store(apk_path, &apk_name, &out_dir).await;

        // 작업 디렉토리 정리. 실패해도 스캔 결과에는 영향 없음
        if let Err(e) = tokio::fs::remove_dir_all(&out_dir).await {
            warn!(dir = %out_dir.display(), error = %e, "failed to remove scan work dir");
        }

        result
    }

    async fn decode_and_store(
        &self,
        apk_path: &Path,
        apk_name: &str,
        out_dir: &Path,
    ) -> Result<ScanRecord, ScannerError> {
        let decode_root = self.unpacker.unpack(apk_path, out_dir).await?;
        debug!(decode_root = %decode_root.display(), "apk decoded");

        // 매니페스트 파싱은 동기 파일 I/O라 blocking 풀에서 수행
        let extractor = self.extractor.clone();
        let manifest = tokio::task::spawn_blocking(move || extractor.extract_from_dir(&decode_root))
            .await
            .map_err(|e| ScannerError::ManifestParse(format!("extract task failed: {e}")))??;

        let components_json = encode_components(&manifest.components)
            .map_err(|e| ScannerError::Storage(format!("component encode failed: {e}")))?;

        let id = self
            .store
            .insert(apk_name, &manifest.sdk_version, &components_json)
            .await?;

        let stored = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| ScannerError::Storage(format!("record #{id} missing after insert")))?;

        Ok(ScanRecord {
            id,
            apk_name: apk_name.to_owned(),
            sdk_version: manifest.sdk_version,
            components: manifest.components,
            date_scanned: stored.date_scanned,
        })
    }

    /// 전체 레코드를 최신 스캔 순으로 반환합니다.
    pub async fn list(&self) -> Result<QueryOutcome, ScannerError> {
        self.search("").await
    }

    /// 텍스트 검색만 수행합니다 (컴포넌트 필터 없음).
    ///
    /// 컴포넌트가 없는 레코드도 포함됩니다.
    pub async fn search(&self, filter_text: &str) -> Result<QueryOutcome, ScannerError> {
        let stored = self.store.search(filter_text).await?;
        Ok(self.engine.decode(stored))
    }

    /// 텍스트 검색과 컴포넌트 필터를 결합한 조회를 수행합니다.
    ///
    /// `filter_text`는 `apk_name` / `sdk_version` 부분 일치로 스토어에서
    /// 선별하고, `component_filter`는 디코딩 후 메모리에서 적용합니다.
    /// 필터 조건이 비어 있어도 컴포넌트가 하나 이상 있는 레코드만 매칭됩니다.
    pub async fn query(
        &self,
        filter_text: &str,
        component_filter: &ComponentFilter,
    ) -> Result<QueryOutcome, ScannerError> {
        let stored = self.store.search(filter_text).await?;
        Ok(self.engine.query(stored, component_filter))
    }

    /// 스캐너 설정을 반환합니다.
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }
}

/// 실패 단계 레이블을 결정합니다.
fn failure_stage(err: &ScannerError) -> &'static str {
    match err {
        ScannerError::UnpackFailed { .. } => "unpack",
        ScannerError::ManifestNotFound { .. }
        | ScannerError::ManifestParse(_)
        | ScannerError::FileTooBig { .. } => "manifest",
        ScannerError::Storage(_) | ScannerError::ComponentDecode { .. } => "storage",
        ScannerError::Config { .. } | ScannerError::Io { .. } => "setup",
    }
}

/// [`ApkScanner`] 빌더
///
/// 설정 검증과 스토어 초기화를 수행한 뒤 스캐너를 생성합니다.
///
/// # 사용 예시
///
/// ```no_run
/// # async fn example() -> Result<(), apkinspect_scanner::ScannerError> {
/// use apkinspect_scanner::{ApkScannerBuilder, ScannerConfig};
///
/// let scanner = ApkScannerBuilder::new()
///     .config(ScannerConfig::default())
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ApkScannerBuilder {
    config: ScannerConfig,
}

impl ApkScannerBuilder {
    /// 기본 설정을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 스캐너 설정을 지정합니다.
    pub fn config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    /// apktool 언팩커를 사용하는 스캐너를 생성합니다.
    ///
    /// # Errors
    ///
    /// 설정이 유효하지 않거나 스토어 초기화에 실패하면 에러를 반환합니다.
    pub async fn build(self) -> Result<ApkScanner<ApktoolUnpacker>, ScannerError> {
        let unpacker = ApktoolUnpacker::new(&self.config.java_path, &self.config.apktool_jar);
        self.build_with_unpacker(unpacker).await
    }

    /// 지정된 언팩커를 사용하는 스캐너를 생성합니다 (테스트용 주입 지점).
    pub async fn build_with_unpacker<U: ApkUnpacker>(
        self,
        unpacker: U,
    ) -> Result<ApkScanner<U>, ScannerError> {
        self.config.validate()?;

        let store = RecordStore::open(&self.config.db_path).await?;
        let extractor = ManifestExtractor::new(self.config.max_manifest_size);

        Ok(ApkScanner {
            config: self.config,
            unpacker,
            extractor,
            store,
            engine: FilterEngine::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_stage_maps_error_variants() {
        assert_eq!(
            failure_stage(&ScannerError::UnpackFailed {
                diagnostic: "x".to_owned()
            }),
            "unpack"
        );
        assert_eq!(
            failure_stage(&ScannerError::ManifestNotFound {
                path: "x".to_owned()
            }),
            "manifest"
        );
        assert_eq!(
            failure_stage(&ScannerError::Storage("x".to_owned())),
            "storage"
        );
        assert_eq!(
            failure_stage(&ScannerError::Config {
                field: "f".to_owned(),
                reason: "r".to_owned()
            }),
            "setup"
        );
    }

    #[tokio::test]
    async fn builder_rejects_invalid_config() {
        let config = ScannerConfig {
            apktool_jar: String::new(),
            ..Default::default()
        };
        let result = ApkScannerBuilder::new().config(config).build().await;
        assert!(matches!(result, Err(ScannerError::Config { .. })));
    }

    #[tokio::test]
    async fn builder_creates_scanner_with_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScannerConfig {
            work_dir: dir.path().to_path_buf(),
            db_path: dir.path().join("scans.db"),
            ..Default::default()
        };
        let scanner = ApkScannerBuilder::new().config(config).build().await.unwrap();
        assert_eq!(scanner.config().java_path, "java");
    }

    #[tokio::test]
    async fn scan_missing_apk_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScannerConfig {
            work_dir: dir.path().to_path_buf(),
            db_path: dir.path().join("scans.db"),
            ..Default::default()
        };
        let scanner = ApkScannerBuilder::new().config(config).build().await.unwrap();
        let result = scanner.scan(Path::new("/nonexistent/app.apk")).await;
        assert!(matches!(result, Err(ScannerError::Io { .. })));
    }
}
