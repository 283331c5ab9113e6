//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `apkinspect_`
//! - 모듈명: `scanner_`, `store_`, `filter_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use apkinspect_core::metrics;
//! use metrics::counter;
//!
//! counter!(apkinspect_core::metrics::SCANNER_SCANS_COMPLETED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 실패 단계 레이블 키 (unpack, manifest, storage)
pub const LABEL_STAGE: &str = "stage";

// ─── Scanner 메트릭 ─────────────────────────────────────────────────

/// Scanner: 완료된 스캔 수 (counter)
pub const SCANNER_SCANS_COMPLETED_TOTAL: &str = "apkinspect_scanner_scans_completed_total";

/// Scanner: 실패한 스캔 수 (counter, label: stage)
pub const SCANNER_SCANS_FAILED_TOTAL: &str = "apkinspect_scanner_scans_failed_total";

/// Scanner: 스캔 소요 시간 (histogram, 초)
pub const SCANNER_SCAN_DURATION_SECONDS: &str = "apkinspect_scanner_scan_duration_seconds";

/// Scanner: 추출된 컴포넌트 수 (counter)
pub const SCANNER_COMPONENTS_EXTRACTED_TOTAL: &str =
    "apkinspect_scanner_components_extracted_total";

// ─── Store 메트릭 ───────────────────────────────────────────────────

/// Store: 저장된 레코드 수 (counter)
pub const STORE_RECORDS_INSERTED_TOTAL: &str = "apkinspect_store_records_inserted_total";

/// Store: 실행된 쿼리 수 (counter)
pub const STORE_QUERIES_TOTAL: &str = "apkinspect_store_queries_total";

// ─── Filter 메트릭 ──────────────────────────────────────────────────

/// Filter: 디코딩 실패로 건너뛴 레코드 수 (counter)
pub const FILTER_RECORDS_SKIPPED_TOTAL: &str = "apkinspect_filter_records_skipped_total";

/// Filter: 필터 평가 소요 시간 (histogram, 초)
pub const FILTER_DURATION_SECONDS: &str = "apkinspect_filter_duration_seconds";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// `metrics::describe_counter!()`, `describe_histogram!()`을 호출하여
/// Prometheus HELP 텍스트를 설정합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    // Scanner
    describe_counter!(
        SCANNER_SCANS_COMPLETED_TOTAL,
        "Total number of APK scans completed successfully"
    );
    describe_counter!(
        SCANNER_SCANS_FAILED_TOTAL,
        "Total number of APK scans that failed, by pipeline stage"
    );
    describe_histogram!(
        SCANNER_SCAN_DURATION_SECONDS,
        "Time to complete a single APK scan in seconds"
    );
    describe_counter!(
        SCANNER_COMPONENTS_EXTRACTED_TOTAL,
        "Total number of manifest components extracted across all scans"
    );

    // Store
    describe_counter!(
        STORE_RECORDS_INSERTED_TOTAL,
        "Total number of scan records inserted into the store"
    );
    describe_counter!(
        STORE_QUERIES_TOTAL,
        "Total number of record queries executed against the store"
    );

    // Filter
    describe_counter!(
        FILTER_RECORDS_SKIPPED_TOTAL,
        "Total number of records skipped due to component blob decode failures"
    );
    describe_histogram!(
        FILTER_DURATION_SECONDS,
        "Time to evaluate a component filter over a record set in seconds"
    );
}
