//! 매니페스트 추출
//!
//! apktool이 디코딩한 `AndroidManifest.xml`에서 SDK 버전과 4종 컴포넌트
//! (activity, service, receiver, provider)를 추출합니다.
//!
//! # 추출 규칙
//!
//! - 속성은 android 네임스페이스(`http://schemas.android.com/apk/res/android`)로
//!   해석합니다. 접두어 문자열이 아니라 URI 기준입니다.
//! - SDK 버전: `<uses-sdk>`의 `minSdkVersion` 우선, 없으면 `targetSdkVersion`,
//!   둘 다 없으면 [`UNKNOWN`]
//! - 컴포넌트 속성 기본값: `name` -> [`UNKNOWN`],
//!   `exported` / `taskAffinity` -> [`NOT_DEFINED`]
//! - 결과 순서: activity 전체 -> service 전체 -> receiver 전체 -> provider 전체,
//!   각 그룹은 문서 등장 순서 유지

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use tracing::debug;

use apkinspect_core::types::{ComponentInfo, ComponentType, NOT_DEFINED, UNKNOWN};

use crate::error::ScannerError;

/// Android 리소스 속성 네임스페이스 URI
const ANDROID_NS: &[u8] = b"http://schemas.android.com/apk/res/android";

/// 매니페스트 파일 이름
pub const MANIFEST_FILE_NAME: &str = "AndroidManifest.xml";

/// 매니페스트에서 추출된 데이터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestData {
    /// SDK 버전 (minSdkVersion 우선)
    pub sdk_version: String,
    /// 추출된 컴포넌트 목록 (종류별 그룹 순서)
    pub components: Vec<ComponentInfo>,
}

/// 매니페스트 추출기
///
/// 디코딩 디렉토리에서 매니페스트 파일을 찾아 파싱합니다.
/// 파일 I/O가 동기이므로 비동기 컨텍스트에서는 `spawn_blocking`으로 감싸
/// 호출해야 합니다.
#[derive(Debug, Clone)]
pub struct ManifestExtractor {
    max_manifest_size: u64,
}

impl ManifestExtractor {
    /// 크기 제한을 가진 새 추출기를 생성합니다.
    pub fn new(max_manifest_size: u64) -> Self {
        Self { max_manifest_size }
    }

    /// 디코딩 디렉토리에서 매니페스트를 추출합니다.
    ///
    /// # Errors
    ///
    /// - `ScannerError::ManifestNotFound`: 디렉토리 최상위에 매니페스트 없음
    /// - `ScannerError::FileTooBig`: 크기 제한 초과
    /// - `ScannerError::ManifestParse`: XML 문법 오류
    pub fn extract_from_dir(&self, decode_root: &Path) -> Result<ManifestData, ScannerError> {
        let manifest_path = decode_root.join(MANIFEST_FILE_NAME);
        if !manifest_path.is_file() {
            return Err(ScannerError::ManifestNotFound {
                path: manifest_path.display().to_string(),
            });
        }

        let metadata = std::fs::metadata(&manifest_path).map_err(|e| ScannerError::Io {
            path: manifest_path.display().to_string(),
            source: e,
        })?;
        if metadata.len() > self.max_manifest_size {
            return Err(ScannerError::FileTooBig {
                path: manifest_path.display().to_string(),
                size: metadata.len(),
                max: self.max_manifest_size,
            });
        }

        let content = std::fs::read_to_string(&manifest_path).map_err(|e| ScannerError::Io {
            path: manifest_path.display().to_string(),
            source: e,
        })?;

        let data = self.parse(&content)?;
        debug!(
            sdk_version = %data.sdk_version,
            components = data.components.len(),
            "manifest extracted"
        );
        Ok(data)
    }

    /// 매니페스트 XML 문자열을 파싱합니다.
    ///
    /// 잘린 문서나 태그 불일치 등 문법 오류는 `ManifestParse`로 반환하며,
    /// 부분 결과를 돌려주지 않습니다.
    pub fn parse(&self, xml: &str) -> Result<ManifestData, ScannerError> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut min_sdk: Option<String> = None;
        let mut target_sdk: Option<String> = None;
        // 종류별로 모아 문서 순서를 유지한 뒤 고정된 그룹 순서로 병합
        let mut groups: [Vec<ComponentInfo>; 4] = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];

        loop {
            match reader.read_resolved_event() {
                Ok((_, Event::Eof)) => break,
                Ok((_, Event::Start(e))) | Ok((_, Event::Empty(e))) => {
                    let local = e.local_name();
                    if local.as_ref() == b"uses-sdk" {
                        if let Some(v) = android_attr(&reader, &e, b"minSdkVersion")? {
                            min_sdk = Some(v);
                        }
                        if let Some(v) = android_attr(&reader, &e, b"targetSdkVersion")? {
                            target_sdk = Some(v);
                        }
                        continue;
                    }

                    let tag = String::from_utf8_lossy(local.as_ref());
                    if let Some(component_type) = ComponentType::from_str_loose(&tag) {
                        let component = extract_component(&reader, &e, component_type)?;
                        let group = ComponentType::ALL
                            .iter()
                            .position(|t| *t == component_type)
                            .unwrap_or(0);
                        groups[group].push(component);
                    }
                }
                Ok(_) => {}
                Err(e) => return Err(ScannerError::ManifestParse(e.to_string())),
            }
        }

        let sdk_version = min_sdk
            .or(target_sdk)
            .unwrap_or_else(|| UNKNOWN.to_owned());

        let mut components = Vec::new();
        for group in groups {
            components.extend(group);
        }

        Ok(ManifestData {
            sdk_version,
            components,
        })
    }
}

/// 시작 태그에서 컴포넌트 정보를 추출합니다.
fn extract_component(
    reader: &NsReader<&[u8]>,
    tag: &BytesStart<'_>,
    component_type: ComponentType,
) -> Result<ComponentInfo, ScannerError> {
    let name = android_attr(reader, tag, b"name")?.unwrap_or_else(|| UNKNOWN.to_owned());
    let exported =
        android_attr(reader, tag, b"exported")?.unwrap_or_else(|| NOT_DEFINED.to_owned());
    let task_affinity =
        android_attr(reader, tag, b"taskAffinity")?.unwrap_or_else(|| NOT_DEFINED.to_owned());

    Ok(ComponentInfo {
        component_type,
        name,
        exported,
        task_affinity,
    })
}

/// android 네임스페이스에 바인딩된 속성 값을 찾습니다.
///
/// 접두어가 `android`가 아니어도 URI가 일치하면 인식합니다.
fn android_attr(
    reader: &NsReader<&[u8]>,
    tag: &BytesStart<'_>,
    local_name: &[u8],
) -> Result<Option<String>, ScannerError> {
    for attr in tag.attributes() {
        let attr = attr.map_err(|e| ScannerError::ManifestParse(e.to_string()))?;
        let (ns, local) = reader.resolve_attribute(attr.key);
        if local.as_ref() != local_name {
            continue;
        }
        if ns == ResolveResult::Bound(Namespace(ANDROID_NS)) {
            let value = attr
                .unescape_value()
                .map_err(|e| ScannerError::ManifestParse(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ManifestExtractor {
        ManifestExtractor::new(16 * 1024 * 1024)
    }

    const FULL_MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="com.example.app">
    <uses-sdk android:minSdkVersion="21" android:targetSdkVersion="33"/>
    <application android:label="Example">
        <activity android:name="com.example.MainActivity"
            android:exported="true"
            android:taskAffinity="com.example.main"/>
        <service android:name="com.example.SyncService"
            android:exported="false"/>
        <activity android:name="com.example.SettingsActivity"/>
        <receiver android:name="com.example.BootReceiver"
            android:exported="true"/>
        <provider android:name="com.example.DataProvider"
            android:exported="false"
            android:taskAffinity="com.example.data"/>
    </application>
</manifest>"#;

    #[test]
    fn parse_extracts_min_sdk_over_target() {
        let data = extractor().parse(FULL_MANIFEST).unwrap();
        assert_eq!(data.sdk_version, "21");
    }

    #[test]
    fn parse_falls_back_to_target_sdk() {
        let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
            <uses-sdk android:targetSdkVersion="33"/>
        </manifest>"#;
        let data = extractor().parse(xml).unwrap();
        assert_eq!(data.sdk_version, "33");
    }

    #[test]
    fn parse_uses_unknown_when_no_sdk() {
        let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
            <application/>
        </manifest>"#;
        let data = extractor().parse(xml).unwrap();
        assert_eq!(data.sdk_version, UNKNOWN);
    }

    #[test]
    fn parse_groups_components_by_type_in_fixed_order() {
        let data = extractor().parse(FULL_MANIFEST).unwrap();
        let types: Vec<ComponentType> =
            data.components.iter().map(|c| c.component_type).collect();
        assert_eq!(
            types,
            vec![
                ComponentType::Activity,
                ComponentType::Activity,
                ComponentType::Service,
                ComponentType::Receiver,
                ComponentType::Provider,
            ]
        );
        // 그룹 내 문서 순서 유지
        assert_eq!(data.components[0].name, "com.example.MainActivity");
        assert_eq!(data.components[1].name, "com.example.SettingsActivity");
    }

    #[test]
    fn parse_applies_attribute_defaults() {
        let data = extractor().parse(FULL_MANIFEST).unwrap();
        let settings = &data.components[1];
        assert_eq!(settings.exported, NOT_DEFINED);
        assert_eq!(settings.task_affinity, NOT_DEFINED);

        let service = &data.components[2];
        assert_eq!(service.exported, "false");
        assert_eq!(service.task_affinity, NOT_DEFINED);
    }

    #[test]
    fn parse_unnamed_component_gets_unknown() {
        let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
            <application>
                <activity android:exported="true"/>
            </application>
        </manifest>"#;
        let data = extractor().parse(xml).unwrap();
        assert_eq!(data.components[0].name, UNKNOWN);
        assert_eq!(data.components[0].exported, "true");
    }

    #[test]
    fn parse_ignores_attributes_outside_android_namespace() {
        // name 속성이 android 네임스페이스에 바인딩되지 않은 경우
        let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
            <application>
                <activity name="com.example.NoNamespace"/>
            </application>
        </manifest>"#;
        let data = extractor().parse(xml).unwrap();
        assert_eq!(data.components[0].name, UNKNOWN);
    }

    #[test]
    fn parse_recognizes_alternate_namespace_prefix() {
        // 접두어가 android가 아니어도 URI가 일치하면 인식
        let xml = r#"<manifest xmlns:a="http://schemas.android.com/apk/res/android">
            <application>
                <activity a:name="com.example.AltPrefix"/>
            </application>
        </manifest>"#;
        let data = extractor().parse(xml).unwrap();
        assert_eq!(data.components[0].name, "com.example.AltPrefix");
    }

    #[test]
    fn parse_ignores_unrelated_tags() {
        let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
            <uses-permission android:name="android.permission.INTERNET"/>
            <application>
                <meta-data android:name="key" android:value="v"/>
                <activity android:name="com.example.A"/>
            </application>
        </manifest>"#;
        let data = extractor().parse(xml).unwrap();
        assert_eq!(data.components.len(), 1);
    }

    #[test]
    fn parse_empty_manifest_yields_no_components() {
        let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
            <application/>
        </manifest>"#;
        let data = extractor().parse(xml).unwrap();
        assert!(data.components.is_empty());
        assert_eq!(data.sdk_version, UNKNOWN);
    }

    #[test]
    fn parse_malformed_xml_is_error() {
        let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
            <application>
                <activity android:name="com.example.A">
        "#;
        let result = extractor().parse(xml);
        assert!(matches!(result, Err(ScannerError::ManifestParse(_))));
    }

    #[test]
    fn extract_from_dir_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let result = extractor().extract_from_dir(dir.path());
        assert!(matches!(result, Err(ScannerError::ManifestNotFound { .. })));
    }

    #[test]
    fn extract_from_dir_reads_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE_NAME), FULL_MANIFEST).unwrap();
        let data = extractor().extract_from_dir(dir.path()).unwrap();
        assert_eq!(data.sdk_version, "21");
        assert_eq!(data.components.len(), 5);
    }

    #[test]
    fn extract_from_dir_rejects_oversized_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE_NAME), FULL_MANIFEST).unwrap();
        let small = ManifestExtractor::new(10);
        let result = small.extract_from_dir(dir.path());
        assert!(matches!(result, Err(ScannerError::FileTooBig { .. })));
    }
}
