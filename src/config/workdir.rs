use crate::error::{PkgpostError, Result};
use std::path::Path;
use tracing::debug;

/// Make sure `dir` exists and is writable.
///
/// Missing directories are created. Writability is checked by creating (and
/// immediately removing) a temporary file inside `dir`.
pub fn ensure_working_dir(dir: &Path) -> Result<()> {
	std::fs::create_dir_all(dir).map_err(|source| PkgpostError::WorkingDirNotWritable {
		path: dir.to_path_buf(),
		source,
	})?;

	tempfile::tempfile_in(dir).map_err(|source| PkgpostError::WorkingDirNotWritable {
		path: dir.to_path_buf(),
		source,
	})?;

	debug!(path = %dir.display(), "working directory ready");
	Ok(())
}
