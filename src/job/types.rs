use crate::archive::ExtractionSummary;
use crate::error::PkgpostError;
use crate::patch::PatchReport;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// One post-processing unit of work: extract an archive, then patch files
/// inside the extracted tree.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageJob {
	/// The uploaded archive. Relative paths resolve against the working directory.
	pub archive: PathBuf,

	/// Where the archive is extracted. Relative paths resolve against the
	/// working directory.
	pub output_dir: PathBuf,

	/// Substitutions applied after extraction, in order.
	#[serde(default)]
	pub patches: Vec<PatchStep>,
}

/// A substitution applied to one extracted file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PatchStep {
	/// File to patch, relative to the job's output directory.
	pub file: PathBuf,

	/// Literal text to look for.
	pub pattern: String,

	/// Text that replaces every occurrence of `pattern`.
	#[serde(default)]
	pub replacement: String,
}

/// Outcome of a completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
	pub extraction: ExtractionSummary,

	/// Each patched file (absolute, under the output directory) with its report.
	pub patched_files: Vec<(PathBuf, PatchReport)>,
}

impl PackageJob {
	/// Check the job before anything touches the filesystem.
	pub fn validate(&self) -> Result<(), PkgpostError> {
		if self.archive.as_os_str().is_empty() {
			return Err(PkgpostError::InvalidJob {
				reason: "archive must not be empty".to_string(),
			});
		}

		if self.output_dir.as_os_str().is_empty() {
			return Err(PkgpostError::InvalidJob {
				reason: "output-dir must not be empty".to_string(),
			});
		}

		for (i, step) in self.patches.iter().enumerate() {
			if !is_contained(&step.file) {
				return Err(PkgpostError::InvalidJob {
					reason: format!(
						"patch {} file must be a relative path inside the output directory: {}",
						i + 1,
						step.file.display()
					),
				});
			}
		}

		Ok(())
	}
}

/// True if `path` is relative, non-empty and never steps above its base.
fn is_contained(path: &Path) -> bool {
	let mut saw_normal = false;
	for component in path.components() {
		match component {
			Component::Normal(_) => saw_normal = true,
			Component::CurDir => {}
			Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
		}
	}
	saw_normal
}
