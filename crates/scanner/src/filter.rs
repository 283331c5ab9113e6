//! 컴포넌트 필터 엔진
//!
//! 스토어에서 가져온 원시 레코드([`StoredRecord`])의 컴포넌트 블롭을
//! 디코딩하고, 컴포넌트 속성 조건으로 레코드를 선별합니다.
//!
//! # 2단계 조회 구조
//!
//! 텍스트 검색(apk_name / sdk_version)은 스토어가 SQL로 수행하고,
//! 컴포넌트 속성 필터는 이 모듈이 디코딩 후 메모리에서 수행합니다.
//!
//! # 손상 블롭 처리
//!
//! 디코딩에 실패한 레코드는 전체 조회를 실패시키지 않고 건너뜁니다.
//! 건너뛴 수는 [`QueryOutcome::skipped_records`]로 노출되며 경고
//! 로그와 메트릭으로 기록됩니다.

use std::time::Instant;

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::warn;

use apkinspect_core::types::{decode_components, ComponentInfo, ComponentType, ScanRecord};

use crate::store::StoredRecord;

/// 컴포넌트 종류 필터
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeFilter {
    /// 모든 종류 허용
    All,
    /// 특정 종류만 허용
    Only(ComponentType),
}

impl Default for TypeFilter {
    fn default() -> Self {
        Self::All
    }
}

/// 컴포넌트 속성 필터 조건
///
/// 세 조건은 AND로 결합되며, 레코드는 조건을 모두 만족하는 컴포넌트가
/// 하나라도 있으면 매칭됩니다. 컴포넌트가 없는 레코드는 어떤 필터에도
/// 매칭되지 않습니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentFilter {
    /// 컴포넌트 종류 조건
    pub type_filter: TypeFilter,
    /// `exported` 값 일치 조건 ("true" / "false" / "Not Defined",
    /// 대소문자 무시). `None`이면 모든 값 허용
    pub exported: Option<String>,
    /// `taskAffinity` 부분 문자열 조건 (대소문자 무시).
    /// `None`이나 빈 문자열이면 모든 값 허용
    pub task_affinity_contains: Option<String>,
}

impl ComponentFilter {
    /// 아무 조건도 없는 필터인지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.type_filter == TypeFilter::All
            && self.exported.is_none()
            && self
                .task_affinity_contains
                .as_deref()
                .is_none_or(str::is_empty)
    }

    /// 단일 컴포넌트가 필터 조건을 모두 만족하는지 평가합니다.
    pub fn matches(&self, component: &ComponentInfo) -> bool {
        if let TypeFilter::Only(wanted) = self.type_filter {
            if component.component_type != wanted {
                return false;
            }
        }

        if let Some(exported) = &self.exported {
            // 매니페스트가 "True"처럼 다른 대소문자를 쓰는 경우도 매칭
            if !component.exported.eq_ignore_ascii_case(exported) {
                return false;
            }
        }

        if let Some(affinity) = &self.task_affinity_contains {
            if !affinity.is_empty()
                && !component
                    .task_affinity
                    .to_lowercase()
                    .contains(&affinity.to_lowercase())
            {
                return false;
            }
        }

        true
    }
}

/// 조회 결과
///
/// 디코딩에 실패해 건너뛴 레코드 수를 함께 전달합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// 디코딩/필터링을 통과한 레코드 (스토어 정렬 순서 유지)
    pub records: Vec<ScanRecord>,
    /// 블롭 디코딩 실패로 건너뛴 레코드 수
    pub skipped_records: usize,
}

/// 컴포넌트 필터 엔진
#[derive(Debug, Clone, Default)]
pub struct FilterEngine;

impl FilterEngine {
    /// 새 필터 엔진을 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 원시 레코드를 디코딩하여 도메인 레코드로 변환합니다.
    ///
    /// 손상된 블롭을 가진 레코드는 건너뛰고 집계합니다.
    pub fn decode(&self, stored: Vec<StoredRecord>) -> QueryOutcome {
        let mut records = Vec::with_capacity(stored.len());
        let mut skipped_records = 0usize;

        for row in stored {
            match decode_components(&row.components_json) {
                Ok(components) => records.push(ScanRecord {
                    id: row.id,
                    apk_name: row.apk_name,
                    sdk_version: row.sdk_version,
                    components,
                    date_scanned: row.date_scanned,
                }),
                Err(e) => {
                    warn!(
                        record_id = row.id,
                        apk_name = %row.apk_name,
                        error = %e,
                        "skipping record with corrupted component blob"
                    );
                    counter!(apkinspect_core::metrics::FILTER_RECORDS_SKIPPED_TOTAL).increment(1);
                    skipped_records += 1;
                }
            }
        }

        QueryOutcome {
            records,
            skipped_records,
        }
    }

    /// 레코드를 디코딩하고 필터 조건으로 선별합니다.
    ///
    /// 조건을 모두 만족하는 컴포넌트가 하나라도 있는 레코드만 남습니다.
    /// 빈 필터라도 컴포넌트가 하나 이상 있어야 매칭됩니다.
    pub fn query(&self, stored: Vec<StoredRecord>, filter: &ComponentFilter) -> QueryOutcome {
        let start = Instant::now();
        let mut outcome = self.decode(stored);

        outcome
            .records
            .retain(|record| record.components.iter().any(|c| filter.matches(c)));

        histogram!(apkinspect_core::metrics::FILTER_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());
        outcome
    }
}
