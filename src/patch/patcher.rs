use crate::error::{PkgpostError, Result};
use crate::patch::substitution::{LiteralSubstitution, apply_all};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Outcome of patching one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchReport {
	/// Lines read from the original file.
	pub lines: usize,

	/// Occurrences replaced across all lines.
	pub replacements: usize,
}

/// Replace every literal occurrence of `pattern` with `substitution` in the
/// file at `path`.
pub fn patch(path: &Path, pattern: &str, substitution: &str) -> Result<PatchReport> {
	let sub = LiteralSubstitution::new(pattern, substitution)?;
	patch_file(path, std::slice::from_ref(&sub))
}

/// Apply `substitutions`, in order, to every line of the file at `path`.
///
/// The rewritten content goes to a temporary file next to `path`, which then
/// replaces the original in a single rename. Until that rename the original
/// is untouched, and the temporary file is removed on every failure path.
/// The file is rewritten even when nothing matched.
pub fn patch_file(path: &Path, substitutions: &[LiteralSubstitution]) -> Result<PatchReport> {
	let metadata = std::fs::metadata(path).map_err(|source| PkgpostError::io(path, source))?;
	if !metadata.is_file() {
		return Err(PkgpostError::NotAFile {
			path: path.to_path_buf(),
		});
	}

	let source = File::open(path).map_err(|source| PkgpostError::io(path, source))?;
	let mut reader = BufReader::new(source);

	let dir = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};
	let temp = NamedTempFile::new_in(dir).map_err(|source| PkgpostError::io(dir, source))?;
	let temp_path = temp.path().to_path_buf();
	let mut writer = BufWriter::new(temp);

	let mut report = PatchReport::default();
	let mut line = Vec::new();

	loop {
		line.clear();
		let read = reader
			.read_until(b'\n', &mut line)
			.map_err(|source| PkgpostError::io(path, source))?;
		if read == 0 {
			break;
		}

		let (rewritten, count) = apply_all(substitutions, &line);
		writer
			.write_all(&rewritten)
			.map_err(|source| PkgpostError::io(&temp_path, source))?;

		report.lines += 1;
		report.replacements += count;
	}

	let temp = writer
		.into_inner()
		.map_err(|err| PkgpostError::io(&temp_path, err.into_error()))?;
	temp.as_file()
		.set_permissions(metadata.permissions())
		.map_err(|source| PkgpostError::io(&temp_path, source))?;
	temp.as_file()
		.sync_all()
		.map_err(|source| PkgpostError::io(&temp_path, source))?;

	// Release the source handle before the original is replaced.
	drop(reader);

	temp.persist(path)
		.map_err(|err| PkgpostError::ReplaceFailed {
			path: path.to_path_buf(),
			source: err.error,
		})?;

	debug!(
		path = %path.display(),
		lines = report.lines,
		replacements = report.replacements,
		"patched file"
	);

	Ok(report)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;
	use std::fs;

	#[test]
	fn test_patch_version_line() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("version.properties");
		fs::write(&file, "version=1.0.0\n").unwrap();

		let report = patch(&file, "1.0.0", "2.0.0").unwrap();

		assert_eq!(fs::read_to_string(&file).unwrap(), "version=2.0.0\n");
		assert_eq!(report, PatchReport { lines: 1, replacements: 1 });
	}

	#[test]
	fn test_absent_pattern_leaves_file_identical() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("mixed.txt");
		let content: &[u8] = b"first\r\nsecond\n\xff\xfe raw bytes\nno trailing newline";
		fs::write(&file, content).unwrap();

		let report = patch(&file, "absent", "anything").unwrap();

		assert_eq!(fs::read(&file).unwrap(), content);
		assert_eq!(report.lines, 4);
		assert_eq!(report.replacements, 0);
	}

	#[test]
	fn test_round_trip_restores_original() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("AndroidManifest.xml");
		let original = "<manifest package=\"com.example.template\">\n  <application android:label=\"com.example.template\"/>\n</manifest>\n";
		fs::write(&file, original).unwrap();

		patch(&file, "com.example.template", "org.acme.shop").unwrap();
		let patched = fs::read_to_string(&file).unwrap();
		assert!(!patched.contains("com.example.template"));
		assert_eq!(patched.matches("org.acme.shop").count(), 2);

		patch(&file, "org.acme.shop", "com.example.template").unwrap();
		assert_eq!(fs::read_to_string(&file).unwrap(), original);
	}

	#[test]
	fn test_identity_substitution_still_rewrites() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("same.txt");
		fs::write(&file, "same same\n").unwrap();

		let report = patch(&file, "same", "same").unwrap();

		assert_eq!(fs::read_to_string(&file).unwrap(), "same same\n");
		assert_eq!(report.replacements, 2);
	}

	#[test]
	fn test_empty_file() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("empty.txt");
		fs::write(&file, "").unwrap();

		let report = patch(&file, "x", "y").unwrap();

		assert_eq!(fs::read(&file).unwrap(), b"");
		assert_eq!(report.lines, 0);
	}

	#[test]
	fn test_pattern_does_not_span_lines() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("split.txt");
		fs::write(&file, "ab\ncd\n").unwrap();

		let report = patch(&file, "b\nc", "X").unwrap();

		assert_eq!(fs::read_to_string(&file).unwrap(), "ab\ncd\n");
		assert_eq!(report.replacements, 0);
	}

	#[test]
	fn test_multiple_substitutions_single_pass() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("build.gradle");
		fs::write(
			&file,
			"applicationId \"com.example.template\"\nversionName \"0.0.1\"\n",
		)
		.unwrap();

		let subs = vec![
			LiteralSubstitution::new("com.example.template", "io.pkg.demo").unwrap(),
			LiteralSubstitution::new("0.0.1", "3.1.4").unwrap(),
		];
		let report = patch_file(&file, &subs).unwrap();

		assert_eq!(
			fs::read_to_string(&file).unwrap(),
			"applicationId \"io.pkg.demo\"\nversionName \"3.1.4\"\n"
		);
		assert_eq!(report.replacements, 2);
	}

	#[test]
	fn test_missing_file_is_not_found_without_mutation() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("missing").join("file");

		let err = patch(&file, "a", "b").unwrap_err();

		assert_eq!(err.kind(), ErrorKind::NotFound);
		assert!(!file.exists());
		assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
	}

	#[test]
	fn test_empty_pattern_inserts_between_characters() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("short.txt");
		fs::write(&file, "ab\n").unwrap();

		let report = patch(&file, "", "x").unwrap();

		assert_eq!(fs::read_to_string(&file).unwrap(), "xaxbx\nx");
		assert_eq!(report, PatchReport { lines: 1, replacements: 4 });
	}

	#[test]
	fn test_missing_file_with_empty_pattern_is_not_found() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("missing.txt");

		let err = patch(&file, "", "x").unwrap_err();

		assert_eq!(err.kind(), ErrorKind::NotFound);
		assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
	}

	#[test]
	fn test_directory_is_not_a_file() {
		let dir = tempfile::tempdir().unwrap();

		let err = patch(dir.path(), "a", "b").unwrap_err();

		assert!(matches!(err, PkgpostError::NotAFile { .. }));
	}

	#[test]
	fn test_no_temp_files_left_behind() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("config.txt");
		fs::write(&file, "name=old\n").unwrap();

		patch(&file, "old", "new").unwrap();

		let entries: Vec<_> = fs::read_dir(dir.path())
			.unwrap()
			.map(|e| e.unwrap().file_name())
			.collect();
		assert_eq!(entries, vec![std::ffi::OsString::from("config.txt")]);
	}

	#[cfg(unix)]
	#[test]
	fn test_permissions_preserved() {
		use std::os::unix::fs::PermissionsExt;

		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("gradlew");
		fs::write(&file, "#!/bin/sh\necho template\n").unwrap();
		fs::set_permissions(&file, fs::Permissions::from_mode(0o755)).unwrap();

		patch(&file, "template", "app").unwrap();

		let mode = fs::metadata(&file).unwrap().permissions().mode() & 0o777;
		assert_eq!(mode, 0o755);
	}

	#[cfg(unix)]
	#[test]
	fn test_unwritable_directory_leaves_original_untouched() {
		use std::os::unix::fs::PermissionsExt;

		let dir = tempfile::tempdir().unwrap();
		let locked = dir.path().join("locked");
		fs::create_dir(&locked).unwrap();
		let file = locked.join("config.txt");
		fs::write(&file, "name=old\n").unwrap();
		fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

		// Root ignores the mode bits, so there is no failure to observe.
		if fs::write(locked.join("writable"), b"").is_ok() {
			fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
			return;
		}

		let result = patch(&file, "old", "new");
		let entries: Vec<_> = fs::read_dir(&locked)
			.unwrap()
			.map(|e| e.unwrap().file_name())
			.collect();
		fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

		assert_eq!(result.unwrap_err().kind(), ErrorKind::PermissionDenied);
		assert_eq!(fs::read(&file).unwrap(), b"name=old\n");
		assert_eq!(entries, vec![std::ffi::OsString::from("config.txt")]);
	}
}
