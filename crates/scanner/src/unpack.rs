//! APK decoding abstraction for testability.
//!
//! The [`ApkUnpacker`] trait abstracts the external decode tool, allowing
//! production code to use [`ApktoolUnpacker`] while tests use a mock unpacker.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │  ApkScanner  │
//! └──────┬───────┘
//!        │
//!        ▼
//!  ┌───────────┐
//!  │ApkUnpacker│ (trait)
//!  └───────────┘
//!      │     │
//!      ▼     ▼
//!  ┌───────┐ ┌────┐
//!  │Apktool│ │Mock│
//!  └───┬───┘ └────┘
//!      │
//!      ▼
//!  java -jar apktool.jar
//! ```
//!
//! # Failure Contract
//!
//! The external tool signals failure through stderr, not the exit code alone:
//! any non-empty stderr output is treated as a decode failure and surfaced
//! verbatim as [`ScannerError::UnpackFailed`]. A nonzero exit status with an
//! empty stderr is also a failure.
//!
//! # Examples
//!
//! ```ignore
//! use apkinspect_scanner::{ApkUnpacker, ApktoolUnpacker};
//!
//! let unpacker = ApktoolUnpacker::new("java", "/opt/apktool/apktool.jar");
//! let decoded = unpacker.unpack(Path::new("app.apk"), Path::new("/tmp/scan-1")).await?;
//! # Ok::<(), apkinspect_scanner::ScannerError>(())
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ScannerError;

/// Trait abstracting the APK decode step.
///
/// The scan pipeline calls this trait instead of spawning the tool directly,
/// enabling testability via mocking.
///
/// # Implementations
///
/// - [`ApktoolUnpacker`]: Production implementation spawning `java -jar apktool.jar`
/// - Mock unpackers in tests, returning a pre-built decode directory
pub trait ApkUnpacker: Send + Sync + 'static {
    /// Decodes an APK into `out_dir` and returns the decode root.
    ///
    /// The returned path is the directory expected to contain
    /// `AndroidManifest.xml` at its top level.
    ///
    /// # Errors
    ///
    /// Returns `ScannerError::UnpackFailed` carrying the tool's diagnostic
    /// output when decoding fails.
    fn unpack(
        &self,
        apk_path: &Path,
        out_dir: &Path,
    ) -> impl Future<Output = Result<PathBuf, ScannerError>> + Send;
}

/// Production unpacker spawning apktool as a subprocess.
///
/// Invokes `java -jar <apktool_jar> d <apk> -o <out_dir> -f`. The `-f` flag
/// forces overwrite of an existing output directory.
#[derive(Debug, Clone)]
pub struct ApktoolUnpacker {
    java_path: String,
    apktool_jar: String,
}

impl ApktoolUnpacker {
    /// Creates a new unpacker with the given java binary and apktool jar paths.
    pub fn new(java_path: impl Into<String>, apktool_jar: impl Into<String>) -> Self {
        Self {
            java_path: java_path.into(),
            apktool_jar: apktool_jar.into(),
        }
    }
}

impl ApkUnpacker for ApktoolUnpacker {
    async fn unpack(&self, apk_path: &Path, out_dir: &Path) -> Result<PathBuf, ScannerError> {
        debug!(
            apk = %apk_path.display(),
            out_dir = %out_dir.display(),
            "spawning apktool decode"
        );

        let output = Command::new(&self.java_path)
            .arg("-jar")
            .arg(&self.apktool_jar)
            .arg("d")
            .arg(apk_path)
            .arg("-o")
            .arg(out_dir)
            .arg("-f")
            .output()
            .await
            .map_err(|e| ScannerError::Io {
                path: self.java_path.clone(),
                source: e,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();

        // Non-empty stderr means failure even on exit code 0; apktool reports
        // decode errors on stderr while still exiting cleanly in some paths.
        if !stderr.is_empty() {
            warn!(apk = %apk_path.display(), "apktool reported errors on stderr");
            return Err(ScannerError::UnpackFailed {
                diagnostic: stderr.to_owned(),
            });
        }

        if !output.status.success() {
            return Err(ScannerError::UnpackFailed {
                diagnostic: format!("apktool exited with status {}", output.status),
            });
        }

        Ok(out_dir.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpacker_stores_paths() {
        let unpacker = ApktoolUnpacker::new("/usr/bin/java", "/opt/apktool.jar");
        assert_eq!(unpacker.java_path, "/usr/bin/java");
        assert_eq!(unpacker.apktool_jar, "/opt/apktool.jar");
    }

    #[tokio::test]
    async fn unpack_with_missing_java_binary_is_io_error() {
        let unpacker = ApktoolUnpacker::new("/nonexistent/java-binary-12345", "/opt/apktool.jar");
        let result = unpacker
            .unpack(Path::new("app.apk"), Path::new("/tmp/out"))
            .await;
        assert!(matches!(result, Err(ScannerError::Io { .. })));
    }
}
