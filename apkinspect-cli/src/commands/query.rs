//! `apkinspect query` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use apkinspect_core::types::{ComponentType, ScanRecord, NOT_DEFINED};
use apkinspect_scanner::{
    ApkScannerBuilder, ComponentFilter, QueryOutcome, ScannerConfig, TypeFilter,
};

use crate::cli::QueryArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `query` command.
///
/// Text filtering runs against the store; component filters are applied
/// to the decoded records afterwards.
pub async fn execute(
    args: QueryArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let component_filter = build_component_filter(&args)?;

    let config = super::load_config(config_path).await?;
    let scanner_config = ScannerConfig::from_core(&config.scanner);

    let scanner = ApkScannerBuilder::new()
        .config(scanner_config)
        .build()
        .await?;

    info!(text = %args.text, "querying scan records");

    // Without component flags this is a plain listing; records with no
    // components stay visible. Structured filters require a matching
    // component, so empty-component records drop out.
    let outcome = if component_filter.is_empty() {
        scanner.search(&args.text).await?
    } else {
        scanner.query(&args.text, &component_filter).await?
    };
    let report = QueryReport::from_outcome(outcome);

    writer.render(&report)?;

    Ok(())
}

/// Translate CLI flags into a [`ComponentFilter`].
fn build_component_filter(args: &QueryArgs) -> Result<ComponentFilter, CliError> {
    let type_filter = match args.component_type.as_deref() {
        None => TypeFilter::All,
        Some(s) => match ComponentType::from_str_loose(s) {
            Some(t) => TypeFilter::Only(t),
            None => {
                return Err(CliError::Command(format!(
                    "invalid component type: {} (expected: activity, service, receiver, provider)",
                    s
                )));
            }
        },
    };

    let exported = match args.exported.as_deref() {
        None => None,
        Some("true") => Some("true".to_owned()),
        Some("false") => Some("false".to_owned()),
        Some("not-defined") => Some(NOT_DEFINED.to_owned()),
        Some(s) => {
            return Err(CliError::Command(format!(
                "invalid exported value: {} (expected: true, false, not-defined)",
                s
            )));
        }
    };

    Ok(ComponentFilter {
        type_filter,
        exported,
        task_affinity_contains: args.affinity.clone(),
    })
}

/// Query results, newest scan first.
#[derive(Serialize)]
pub struct QueryReport {
    pub total: usize,
    pub skipped_records: usize,
    pub records: Vec<RecordEntry>,
}

#[derive(Serialize)]
pub struct RecordEntry {
    pub record_id: i64,
    pub apk_name: String,
    pub sdk_version: String,
    pub date_scanned: String,
    pub components: usize,
}

impl QueryReport {
    fn from_outcome(outcome: QueryOutcome) -> Self {
        Self {
            total: outcome.records.len(),
            skipped_records: outcome.skipped_records,
            records: outcome.records.into_iter().map(RecordEntry::from).collect(),
        }
    }
}

impl From<ScanRecord> for RecordEntry {
    fn from(record: ScanRecord) -> Self {
        Self {
            record_id: record.id,
            apk_name: record.apk_name,
            sdk_version: record.sdk_version,
            date_scanned: record.date_scanned.to_rfc3339(),
            components: record.components.len(),
        }
    }
}

impl Render for QueryReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Scan records: {}", self.total.to_string().bold())?;

        if self.skipped_records > 0 {
            let note = format!(
                "{} record(s) skipped due to corrupted component data",
                self.skipped_records
            );
            writeln!(w, "{}", note.yellow())?;
        }

        if !self.records.is_empty() {
            writeln!(w)?;
            writeln!(
                w,
                "{:<6} {:<35} {:<8} {:<32} Components",
                "ID", "APK", "SDK", "Scanned"
            )?;
            writeln!(w, "{}", "-".repeat(95))?;

            for r in &self.records {
                writeln!(
                    w,
                    "{:<6} {:<35} {:<8} {:<32} {}",
                    r.record_id, r.apk_name, r.sdk_version, r.date_scanned, r.components
                )?;
            }
        }

        Ok(())
    }
}
