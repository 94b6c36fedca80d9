//! Package post-processing jobs.
//!
//! A job extracts an uploaded archive and then rewrites text inside the
//! extracted tree, for example to stamp a package identifier into a template.

pub mod runner;
pub mod types;

pub use runner::{parse_job_file, parse_job_str, run_job};
pub use types::{JobReport, PackageJob, PatchStep};
