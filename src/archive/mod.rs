//! Zip archive extraction.
//!
//! This module handles:
//! - Re-creating an archive's directory entries under a target directory
//! - Writing file entries byte-for-byte, creating parent directories as needed
//! - Containment of entry paths that would escape the target

pub mod extractor;

pub use extractor::{EntryPathPolicy, ExtractOptions, ExtractionSummary, extract, extract_with};
