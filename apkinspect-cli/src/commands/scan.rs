//! `apkinspect scan` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use apkinspect_core::types::ScanRecord;
use apkinspect_scanner::{ApkScannerBuilder, ScannerConfig};

use crate::cli::ScanArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `scan` command.
///
/// Decodes the APK with apktool, extracts manifest metadata, stores a
/// scan record and renders it.
pub async fn execute(
    args: ScanArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = super::load_config(config_path).await?;
    let scanner_config = ScannerConfig::from_core(&config.scanner);

    let scanner = ApkScannerBuilder::new()
        .config(scanner_config)
        .build()
        .await?;

    info!(apk = %args.apk.display(), "starting apk scan");

    let record = scanner.scan(&args.apk).await?;
    let report = ScanReport::from_record(record);

    writer.render(&report)?;

    Ok(())
}

/// Result of a single scan, rendered to the user.
#[derive(Serialize)]
pub struct ScanReport {
    pub record_id: i64,
    pub apk_name: String,
    pub sdk_version: String,
    pub date_scanned: String,
    pub components: Vec<ComponentEntry>,
}

#[derive(Serialize)]
pub struct ComponentEntry {
    pub component_type: String,
    pub name: String,
    pub exported: String,
    pub task_affinity: String,
}

impl ScanReport {
    fn from_record(record: ScanRecord) -> Self {
        Self {
            record_id: record.id,
            apk_name: record.apk_name,
            sdk_version: record.sdk_version,
            date_scanned: record.date_scanned.to_rfc3339(),
            components: record
                .components
                .into_iter()
                .map(|c| ComponentEntry {
                    component_type: c.component_type.to_string(),
                    name: c.name,
                    exported: c.exported,
                    task_affinity: c.task_affinity,
                })
                .collect(),
        }
    }
}

impl Render for ScanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Scan: {} (record #{})", self.apk_name.bold(), self.record_id)?;
        writeln!(w, "SDK version: {}", self.sdk_version)?;
        writeln!(w, "Scanned: {}", self.date_scanned)?;
        writeln!(w, "Components: {}", self.components.len())?;

        if !self.components.is_empty() {
            writeln!(w)?;
            writeln!(
                w,
                "{:<10} {:<50} {:<12} Affinity",
                "Type", "Name", "Exported"
            )?;
            writeln!(w, "{}", "-".repeat(90))?;

            for c in &self.components {
                let exported_colored = match c.exported.as_str() {
                    "true" => c.exported.red(),
                    "false" => c.exported.green(),
                    _ => c.exported.dimmed(),
                };
                writeln!(
                    w,
                    "{:<10} {:<50} {:<12} {}",
                    c.component_type, c.name, exported_colored, c.task_affinity
                )?;
            }
        }

        Ok(())
    }
}
