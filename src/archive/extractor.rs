use crate::error::{PkgpostError, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// What to do with an entry whose stored path would land outside the target
/// directory (`../` components or an absolute path).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryPathPolicy {
	/// Abort extraction with [`PkgpostError::UnsafeEntryPath`].
	#[default]
	Reject,

	/// Leave the entry out and record its name in the summary.
	Skip,
}

/// Options for [`extract_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
	pub entry_paths: EntryPathPolicy,
}

/// Outcome of extracting one archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
	/// Directory entries created (or found already present).
	pub directories: usize,

	/// File entries written.
	pub files: usize,

	/// Total bytes written across all file entries.
	pub bytes: u64,

	/// Stored names of entries left out under [`EntryPathPolicy::Skip`].
	pub skipped: Vec<String>,
}

/// Extract the zip archive at `source` into `target` with default options.
pub fn extract(source: &Path, target: &Path) -> Result<ExtractionSummary> {
	extract_with(source, target, &ExtractOptions::default())
}

/// Extract the zip archive at `source` into `target`.
///
/// Entries are processed in archive order. Directory entries (stored names
/// ending in `/`) are created along with any missing ancestors; a directory
/// that already exists is not an error. File entries get their parent
/// directories created first, then are written with create-or-truncate
/// semantics.
///
/// The archive is opened and validated before anything is created under
/// `target`. A failure past that point, such as a damaged local header, is
/// reported as an I/O error; entries already written are left in place.
pub fn extract_with(
	source: &Path,
	target: &Path,
	options: &ExtractOptions,
) -> Result<ExtractionSummary> {
	let file = File::open(source).map_err(|err| PkgpostError::io(source, err))?;
	let mut archive = ZipArchive::new(file).map_err(|err| PkgpostError::zip(source, err))?;

	fs::create_dir_all(target).map_err(|err| PkgpostError::io(target, err))?;

	let mut summary = ExtractionSummary::default();

	for index in 0..archive.len() {
		let mut entry = archive
			.by_index(index)
			.map_err(|err| PkgpostError::entry(source, index, err))?;
		let name = entry.name().to_string();

		let Some(relative) = entry.enclosed_name() else {
			match options.entry_paths {
				EntryPathPolicy::Reject => {
					return Err(PkgpostError::UnsafeEntryPath { entry: name });
				}
				EntryPathPolicy::Skip => {
					warn!(entry = %name, "skipping archive entry outside the target directory");
					summary.skipped.push(name);
					continue;
				}
			}
		};
		let dest = target.join(relative);

		if entry.is_dir() {
			fs::create_dir_all(&dest).map_err(|err| PkgpostError::io(&dest, err))?;
			debug!(entry = %name, "created directory");
			summary.directories += 1;
			continue;
		}

		if let Some(parent) = dest.parent() {
			fs::create_dir_all(parent).map_err(|err| PkgpostError::io(parent, err))?;
		}

		let mut out = File::create(&dest).map_err(|err| PkgpostError::io(&dest, err))?;
		let written = io::copy(&mut entry, &mut out).map_err(|err| PkgpostError::io(&dest, err))?;
		debug!(entry = %name, bytes = written, "extracted file");

		summary.files += 1;
		summary.bytes += written;
	}

	info!(
		archive = %source.display(),
		target = %target.display(),
		directories = summary.directories,
		files = summary.files,
		bytes = summary.bytes,
		skipped = summary.skipped.len(),
		"extracted archive"
	);

	Ok(summary)
}
