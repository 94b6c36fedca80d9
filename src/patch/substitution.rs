use crate::error::{PkgpostError, Result};
use regex::bytes::{NoExpand, Regex};
use std::borrow::Cow;

/// A literal pattern and the text that replaces it.
///
/// The pattern is matched byte-for-byte: no wildcards, no regex syntax and no
/// case folding. Every non-overlapping occurrence is replaced.
///
/// An empty pattern matches at every character boundary of a line: before
/// each character (the line terminator included) and once at the end. Bytes
/// that are not valid UTF-8 count as one character each.
#[derive(Debug, Clone)]
pub struct LiteralSubstitution {
	pattern: String,
	replacement: String,
	finder: Option<Regex>,
}

impl LiteralSubstitution {
	pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
		let finder = if pattern.is_empty() {
			None
		} else {
			// An escaped literal always compiles; the size limit is the only way out.
			let finder = Regex::new(&regex::escape(pattern)).map_err(|_| {
				PkgpostError::PatternTooLarge {
					len: pattern.len(),
				}
			})?;
			Some(finder)
		};

		Ok(LiteralSubstitution {
			pattern: pattern.to_string(),
			replacement: replacement.to_string(),
			finder,
		})
	}

	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	pub fn replacement(&self) -> &str {
		&self.replacement
	}

	/// Apply this substitution to one line of bytes.
	///
	/// Returns the rewritten line and the number of occurrences replaced.
	/// Bytes that are not valid UTF-8 pass through untouched.
	pub fn apply<'a>(&self, line: &'a [u8]) -> (Cow<'a, [u8]>, usize) {
		let Some(finder) = &self.finder else {
			let (rewritten, count) = self.insert_between_chars(line);
			return (Cow::Owned(rewritten), count);
		};

		let count = finder.find_iter(line).count();
		if count == 0 {
			return (Cow::Borrowed(line), 0);
		}

		let rewritten = finder.replace_all(line, NoExpand(self.replacement.as_bytes()));
		(rewritten, count)
	}

	fn insert_between_chars(&self, line: &[u8]) -> (Vec<u8>, usize) {
		let insert = self.replacement.as_bytes();
		let mut out = Vec::with_capacity(line.len() * (insert.len() + 1) + insert.len());
		let mut count = 0;
		let mut buf = [0u8; 4];

		for chunk in line.utf8_chunks() {
			for ch in chunk.valid().chars() {
				out.extend_from_slice(insert);
				out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
				count += 1;
			}
			for &byte in chunk.invalid() {
				out.extend_from_slice(insert);
				out.push(byte);
				count += 1;
			}
		}
		out.extend_from_slice(insert);

		(out, count + 1)
	}
}

/// Apply several substitutions to a line, in order.
pub fn apply_all(substitutions: &[LiteralSubstitution], line: &[u8]) -> (Vec<u8>, usize) {
	let mut current = line.to_vec();
	let mut total = 0;

	for sub in substitutions {
		let (rewritten, count) = sub.apply(&current);
		if count > 0 {
			current = rewritten.into_owned();
			total += count;
		}
	}

	(current, total)
}
