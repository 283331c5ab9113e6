#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ScannerError`)
//! - [`config`]: Scanner configuration (`ScannerConfig`, builder)
//! - [`unpack`]: APK decoding (`ApkUnpacker` trait, `ApktoolUnpacker`)
//! - [`manifest`]: Manifest extraction (`ManifestExtractor`, `ManifestData`)
//! - [`store`]: Scan record persistence (`RecordStore`, `StoredRecord`)
//! - [`filter`]: Component filter engine (`FilterEngine`, `ComponentFilter`, `QueryOutcome`)
//! - [`scanner`]: Main orchestrator (`ApkScanner`, `ApkScannerBuilder`)
//!
//! # Architecture
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

pub mod config;
pub mod error;
pub mod filter;
pub mod manifest;
pub mod scanner;
pub mod store;
pub mod unpack;

// --- Public API Re-exports ---

// Scanner (main orchestrator)
pub use scanner::{ApkScanner, ApkScannerBuilder};

// Configuration
pub use config::{ScannerConfig, ScannerConfigBuilder};

// Error
pub use error::ScannerError;

// Unpack
pub use unpack::{ApkUnpacker, ApktoolUnpacker};

// Manifest
pub use manifest::{ManifestData, ManifestExtractor};

// Store
pub use store::{RecordStore, StoredRecord};

// Filter
pub use filter::{ComponentFilter, FilterEngine, QueryOutcome, TypeFilter};
