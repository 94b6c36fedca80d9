//! Settings loading for pkgpost.
//!
//! This module handles:
//! - TOML settings file parsing
//! - Directory cascade discovery
//! - Environment overrides
//! - Working directory preparation

pub mod cascade;
pub mod parser;
pub mod types;
pub mod workdir;

pub use cascade::{
	CONFIG_FILE_NAME, apply_env_overrides, discover_config, load_settings, user_config_path,
};
pub use parser::{generate_init_template, parse_config_file, parse_config_str};
pub use types::{DEFAULT_BROKER_URL, LoadedSettings, Settings};
pub use workdir::ensure_working_dir;
