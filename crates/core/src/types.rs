//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 매니페스트에서 추출된 컴포넌트 모델과 스캔 레코드를 정의합니다.
//! 스캐너가 레코드를 생성하고, CLI가 조회 결과를 표시할 때 사용합니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 매니페스트가 속성을 생략했을 때 사용하는 대체 문자열
///
/// `exported`는 명시적 "false"와 속성 부재를 구분해야 하므로
/// bool 대신 문자열 3-상태("true"/"false"/"Not Defined")를 사용합니다.
pub const NOT_DEFINED: &str = "Not Defined";

/// 이름이나 SDK 버전이 매니페스트에 없을 때 사용하는 대체 문자열
pub const UNKNOWN: &str = "Unknown";

/// 매니페스트 컴포넌트 종류
///
/// 인식 대상은 4개 태그뿐이며 그 외 태그는 추출 단계에서 무시됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    /// `<activity>` 태그
    Activity,
    /// `<service>` 태그
    Service,
    /// `<receiver>` 태그
    Receiver,
    /// `<provider>` 태그
    Provider,
}

impl ComponentType {
    /// 인식 순서가 고정된 전체 컴포넌트 종류
    ///
    /// 추출 결과의 그룹 순서(activity -> service -> receiver -> provider)를
    /// 결정하는 기준이므로 순서를 바꾸면 안 됩니다.
    pub const ALL: [ComponentType; 4] = [
        ComponentType::Activity,
        ComponentType::Service,
        ComponentType::Receiver,
        ComponentType::Provider,
    ];

    /// 컴포넌트 종류에 대응하는 매니페스트 태그 이름을 반환합니다.
    pub fn tag_name(&self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::Service => "service",
            Self::Receiver => "receiver",
            Self::Provider => "provider",
        }
    }

    /// 문자열에서 컴포넌트 종류를 파싱합니다 (대소문자 구분 없음).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "activity" => Some(Self::Activity),
            "service" => Some(Self::Service),
            "receiver" => Some(Self::Receiver),
            "provider" => Some(Self::Provider),
            _ => None,
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag_name())
    }
}

/// 매니페스트에 선언된 단일 컴포넌트
///
/// 속성이 없을 때의 기본값: `name` -> [`UNKNOWN`],
/// `exported` / `task_affinity` -> [`NOT_DEFINED`].
/// 빈 문자열이나 null은 사용하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    /// 컴포넌트 종류
    pub component_type: ComponentType,
    /// `android:name` 속성 값
    pub name: String,
    /// `android:exported` 속성 값 ("true" / "false" / "Not Defined")
    pub exported: String,
    /// `android:taskAffinity` 속성 값
    pub task_affinity: String,
}

impl fmt::Display for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} exported={} taskAffinity={}",
            self.component_type, self.name, self.exported, self.task_affinity,
        )
    }
}

/// 완료된 스캔 한 건의 레코드
///
/// `components`는 매니페스트 스캔 순서(activity 전체 -> service 전체 ->
/// receiver 전체 -> provider 전체, 각 그룹은 문서 순서)를 유지합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// 스토어가 부여한 단조 증가 ID
    pub id: i64,
    /// APK 파일 이름 (전체 경로 아님)
    pub apk_name: String,
    /// minSdkVersion (없으면 targetSdkVersion, 둘 다 없으면 "Unknown")
    pub sdk_version: String,
    /// 추출된 컴포넌트 목록
    pub components: Vec<ComponentInfo>,
    /// 스캔 시각 (기본 정렬/표시 키, 내림차순)
    pub date_scanned: DateTime<Utc>,
}

impl fmt::Display for ScanRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ScanRecord(#{} {} sdk={} components={})",
            self.id,
            self.apk_name,
            self.sdk_version,
            self.components.len(),
        )
    }
}

/// 컴포넌트 목록을 저장용 JSON 블롭으로 인코딩합니다.
///
/// 레코드당 하나의 텍스트 블롭으로 저장하는 의도적 비정규화입니다.
/// 스토어는 컴포넌트 필드를 직접 필터링하지 않습니다.
pub fn encode_components(components: &[ComponentInfo]) -> Result<String, serde_json::Error> {
    serde_json::to_string(components)
}

/// 저장된 JSON 블롭을 컴포넌트 목록으로 디코딩합니다.
///
/// 순서는 인코딩 시점 그대로 보존됩니다.
pub fn decode_components(json: &str) -> Result<Vec<ComponentInfo>, serde_json::Error> {
    serde_json::from_str(json)
}
