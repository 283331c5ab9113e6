//! 스캔 레코드 스토어
//!
//! SQLite에 스캔 레코드를 저장하고 조회합니다. 컴포넌트 목록은
//! 레코드당 하나의 JSON 텍스트 블롭(`components_json`)으로 저장하는
//! 의도적 비정규화 설계입니다. 스토어는 블롭 내용을 해석하지 않으며,
//! 컴포넌트 필터링은 [`filter`](crate::filter) 모듈이 담당합니다.
//!
//! # 스키마
//!
//! - `id`: 단조 증가 기본 키
//! - `apk_name`, `sdk_version`: 텍스트 검색 대상
//! - `components_json`: 인코딩된 컴포넌트 블롭
//! - `date_scanned`: RFC3339 텍스트 (고정 폭 마이크로초, 사전순 = 시간순)

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use tracing::{debug, info};

use apkinspect_core::metrics::{STORE_QUERIES_TOTAL, STORE_RECORDS_INSERTED_TOTAL};

use crate::error::ScannerError;

/// 스캔 레코드 테이블 DDL
const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS scan_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    apk_name TEXT NOT NULL,
    sdk_version TEXT NOT NULL,
    components_json TEXT NOT NULL,
    date_scanned TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_scan_records_date ON scan_records(date_scanned);
"#;

/// 스토어에 저장된 원시 레코드
///
/// `components_json`은 디코딩하지 않은 블롭 그대로입니다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct StoredRecord {
    /// 단조 증가 ID
    pub id: i64,
    /// APK 파일 이름
    pub apk_name: String,
    /// SDK 버전 문자열
    pub sdk_version: String,
    /// 인코딩된 컴포넌트 블롭
    pub components_json: String,
    /// 스캔 시각
    pub date_scanned: DateTime<Utc>,
}

/// SQLite 기반 스캔 레코드 스토어
///
/// 모든 쿼리는 바인딩 파라미터를 사용합니다. 검색어가 SQL 문자열에
/// 직접 삽입되는 일은 없습니다.
#[derive(Debug, Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    /// 지정된 경로의 데이터베이스를 열고 스키마를 초기화합니다.
    ///
    /// 파일이 없으면 생성합니다.
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self, ScannerError> {
        let db_path = db_path.as_ref();
        let connect_opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ScannerError::Storage(format!("db connect failed: {e}")))?;

        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s)
                .execute(&pool)
                .await
                .map_err(|e| ScannerError::Storage(format!("db schema init failed: {e}")))?;
        }

        info!(db_path = %db_path.display(), "record store initialized");
        Ok(Self { pool })
    }

    /// 새 스캔 레코드를 저장하고 부여된 ID를 반환합니다.
    ///
    /// `date_scanned`는 호출 시각으로 스토어가 부여합니다.
    pub async fn insert(
        &self,
        apk_name: &str,
        sdk_version: &str,
        components_json: &str,
    ) -> Result<i64, ScannerError> {
        // 고정 폭 마이크로초 RFC3339: TEXT 사전순 정렬이 시간순과 일치
        let date_scanned = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let res = sqlx::query(
            r#"
            INSERT INTO scan_records (apk_name, sdk_version, components_json, date_scanned)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(apk_name)
        .bind(sdk_version)
        .bind(components_json)
        .bind(&date_scanned)
        .execute(&self.pool)
        .await
        .map_err(|e| ScannerError::Storage(format!("insert failed: {e}")))?;

        let id = res.last_insert_rowid();
        counter!(STORE_RECORDS_INSERTED_TOTAL).increment(1);
        debug!(id, apk_name, "scan record inserted");
        Ok(id)
    }

    /// 전체 레코드를 최신 스캔 순으로 반환합니다.
    pub async fn list_all(&self) -> Result<Vec<StoredRecord>, ScannerError> {
        counter!(STORE_QUERIES_TOTAL).increment(1);
        sqlx::query_as::<_, StoredRecord>(
            r#"
            SELECT id, apk_name, sdk_version, components_json, date_scanned
            FROM scan_records
            ORDER BY date_scanned DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ScannerError::Storage(format!("list failed: {e}")))
    }

    /// `apk_name` 또는 `sdk_version`에 검색어가 부분 일치하는 레코드를
    /// 최신 스캔 순으로 반환합니다.
    ///
    /// 빈 검색어는 전체 목록과 동일합니다. 대소문자는 구분하지 않습니다
    /// (SQLite LIKE 기본 동작, ASCII 한정).
    pub async fn search(&self, filter_text: &str) -> Result<Vec<StoredRecord>, ScannerError> {
        if filter_text.is_empty() {
            return self.list_all().await;
        }

        counter!(STORE_QUERIES_TOTAL).increment(1);
        let pattern = format!("%{filter_text}%");
        sqlx::query_as::<_, StoredRecord>(
            r#"
            SELECT id, apk_name, sdk_version, components_json, date_scanned
            FROM scan_records
            WHERE apk_name LIKE ?1 OR sdk_version LIKE ?1
            ORDER BY date_scanned DESC, id DESC
            "#,
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ScannerError::Storage(format!("search failed: {e}")))
    }

    /// ID로 단일 레코드를 조회합니다.
    pub async fn get(&self, id: i64) -> Result<Option<StoredRecord>, ScannerError> {
        counter!(STORE_QUERIES_TOTAL).increment(1);
        sqlx::query_as::<_, StoredRecord>(
            r#"
            SELECT id, apk_name, sdk_version, components_json, date_scanned
            FROM scan_records
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ScannerError::Storage(format!("get failed: {e}")))
    }

    /// 테스트/관리용: 레코드의 컴포넌트 블롭을 직접 덮어씁니다.
    #[doc(hidden)]
    pub async fn overwrite_components_json(
        &self,
        id: i64,
        components_json: &str,
    ) -> Result<(), ScannerError> {
        sqlx::query("UPDATE scan_records SET components_json = ?1 WHERE id = ?2")
            .bind(components_json)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ScannerError::Storage(format!("update failed: {e}")))?;
        Ok(())
    }
}
