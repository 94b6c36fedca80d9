//! In-place literal text patching.
//!
//! This module handles:
//! - Literal (non-regex) pattern substitution on byte lines
//! - Rewriting a file through a temporary copy that replaces the original

pub mod patcher;
pub mod substitution;

pub use patcher::{PatchReport, patch, patch_file};
pub use substitution::{LiteralSubstitution, apply_all};
