use std::io;
use std::path::{Path, PathBuf};

/// Library-level structured errors for pkgpost.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum PkgpostError {
	#[error("No such file or directory: {path}")]
	NotFound { path: PathBuf },

	#[error("Permission denied: {path}")]
	PermissionDenied {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("I/O error on {path}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("Not a regular file: {path}")]
	NotAFile { path: PathBuf },

	#[error("Failed to replace {path} with the patched copy")]
	ReplaceFailed {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("Not a valid zip archive: {path}")]
	InvalidArchive {
		path: PathBuf,
		#[source]
		source: zip::result::ZipError,
	},

	#[error("Archive entry {index} of {path} is corrupt")]
	CorruptEntry {
		path: PathBuf,
		index: usize,
		#[source]
		source: zip::result::ZipError,
	},

	#[error("Archive entry escapes the target directory: {entry}")]
	UnsafeEntryPath { entry: String },

	#[error("Substitution pattern is too large to match: {len} bytes")]
	PatternTooLarge { len: usize },

	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid setting {key}: {reason}")]
	InvalidSetting { key: String, reason: String },

	#[error("Failed to parse job file: {path}")]
	JobParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid job: {reason}")]
	InvalidJob { reason: String },

	#[error("Working directory is not writable: {path}")]
	WorkingDirNotWritable {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Coarse classification of a [`PkgpostError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// A source file or archive is missing, or is not a readable archive.
	NotFound,
	/// Read or write access was denied.
	PermissionDenied,
	/// Any other I/O fault.
	Io,
	/// Rejected input: bad configuration, job description or entry path.
	Invalid,
}

impl PkgpostError {
	/// Build an error for an I/O failure on `path`, classified by the
	/// underlying error kind.
	pub fn io(path: &Path, source: io::Error) -> Self {
		match source.kind() {
			io::ErrorKind::NotFound => PkgpostError::NotFound {
				path: path.to_path_buf(),
			},
			io::ErrorKind::PermissionDenied => PkgpostError::PermissionDenied {
				path: path.to_path_buf(),
				source,
			},
			_ => PkgpostError::Io {
				path: path.to_path_buf(),
				source,
			},
		}
	}

	/// Build an error for a zip-level failure on the archive at `path`.
	pub fn zip(path: &Path, source: zip::result::ZipError) -> Self {
		match source {
			zip::result::ZipError::Io(err) => PkgpostError::io(path, err),
			source => PkgpostError::InvalidArchive {
				path: path.to_path_buf(),
				source,
			},
		}
	}

	/// Build an error for a failure reading entry `index` of the archive at
	/// `path`, after the archive itself was opened.
	pub fn entry(path: &Path, index: usize, source: zip::result::ZipError) -> Self {
		match source {
			zip::result::ZipError::Io(err) => PkgpostError::io(path, err),
			source => PkgpostError::CorruptEntry {
				path: path.to_path_buf(),
				index,
				source,
			},
		}
	}

	/// Classify this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			PkgpostError::NotFound { .. } | PkgpostError::InvalidArchive { .. } => {
				ErrorKind::NotFound
			}
			PkgpostError::PermissionDenied { .. } | PkgpostError::WorkingDirNotWritable { .. } => {
				ErrorKind::PermissionDenied
			}
			PkgpostError::ReplaceFailed { source, .. } => match source.kind() {
				io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
				_ => ErrorKind::Io,
			},
			PkgpostError::Io { .. }
			| PkgpostError::CorruptEntry { .. }
			| PkgpostError::NotAFile { .. }
			| PkgpostError::ConfigReadError { .. }
			| PkgpostError::HomeDirectoryNotFound => ErrorKind::Io,
			PkgpostError::UnsafeEntryPath { .. }
			| PkgpostError::PatternTooLarge { .. }
			| PkgpostError::ConfigParseError { .. }
			| PkgpostError::InvalidSetting { .. }
			| PkgpostError::JobParseError { .. }
			| PkgpostError::InvalidJob { .. } => ErrorKind::Invalid,
		}
	}
}

/// Result type alias using PkgpostError.
pub type Result<T> = std::result::Result<T, PkgpostError>;
