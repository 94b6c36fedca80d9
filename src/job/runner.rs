use crate::archive::extract;
use crate::config::Settings;
use crate::error::{PkgpostError, Result};
use crate::job::types::{JobReport, PackageJob};
use crate::patch::{LiteralSubstitution, patch_file};
use std::path::{Path, PathBuf};
use tracing::info;

/// Parse a job description file.
pub fn parse_job_file(path: &Path) -> Result<PackageJob> {
	let content = std::fs::read_to_string(path).map_err(|source| PkgpostError::io(path, source))?;
	parse_job_str(&content, path)
}

/// Parse a job description from a string (useful for testing).
pub fn parse_job_str(content: &str, path: &Path) -> Result<PackageJob> {
	let job: PackageJob = toml::from_str(content).map_err(|source| PkgpostError::JobParseError {
		path: path.to_path_buf(),
		source,
	})?;

	job.validate()?;

	Ok(job)
}

/// Resolve `path` against `base` unless it is already absolute.
fn resolve(base: &Path, path: &Path) -> PathBuf {
	if path.is_absolute() {
		path.to_path_buf()
	} else {
		base.join(path)
	}
}

/// Run a job: extract its archive, then apply its patches in order.
///
/// Stops at the first failure. Files extracted or patched before the failure
/// stay as they are.
pub fn run_job(job: &PackageJob, settings: &Settings) -> Result<JobReport> {
	job.validate()?;

	let archive = resolve(&settings.working_dir, &job.archive);
	let output_dir = resolve(&settings.working_dir, &job.output_dir);

	let extraction = extract(&archive, &output_dir)?;

	let mut patched_files = Vec::with_capacity(job.patches.len());
	for step in &job.patches {
		let file = output_dir.join(&step.file);
		let sub = LiteralSubstitution::new(&step.pattern, &step.replacement)?;
		let report = patch_file(&file, std::slice::from_ref(&sub))?;
		patched_files.push((file, report));
	}

	info!(
		archive = %archive.display(),
		output_dir = %output_dir.display(),
		files = extraction.files,
		patches = patched_files.len(),
		"job finished"
	);

	Ok(JobReport {
		extraction,
		patched_files,
	})
}
