//! pkgpost - post-processing for uploaded application packages.
//!
//! This library provides:
//! - Zip archive extraction that mirrors the archive's directory tree
//! - In-place literal text patching through a temporary copy
//! - Package jobs combining the two, with settings and a task queue
//!
//! # Example
//!
//! ```no_run
//! use pkgpost::archive::extract;
//! use pkgpost::patch::patch;
//! use std::path::Path;
//!
//! let out = Path::new("/srv/builds/app");
//! extract(Path::new("/srv/uploads/app.zip"), out).unwrap();
//! patch(&out.join("AndroidManifest.xml"), "com.example.template", "com.acme.app").unwrap();
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod job;
pub mod patch;
pub mod queue;

pub use error::{ErrorKind, PkgpostError, Result};
