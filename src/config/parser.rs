use crate::config::types::Settings;
use crate::error::{PkgpostError, Result};
use std::path::Path;

/// Parse a settings file from the given path.
pub fn parse_config_file(path: &Path) -> Result<Settings> {
	let content = std::fs::read_to_string(path).map_err(|source| PkgpostError::ConfigReadError {
		path: path.to_path_buf(),
		source,
	})?;

	parse_config_str(&content, path)
}

/// Parse settings from a string (useful for testing).
pub fn parse_config_str(content: &str, path: &Path) -> Result<Settings> {
	let settings: Settings =
		toml::from_str(content).map_err(|source| PkgpostError::ConfigParseError {
			path: path.to_path_buf(),
			source,
		})?;

	settings.validate()?;

	Ok(settings)
}

/// Template written by `pkgpost --init`.
pub fn generate_init_template() -> String {
	format!(
		r#"# pkgpost settings
#
# Looked up in the current directory and its parents, then in ~/.pkgpost.toml.
# REDIS_URL, FORCE_SSL and PKGPOST_WORKING_DIR override the values below.

# Uploads and extracted packages live here. Relative job paths resolve against it.
working-dir = "/var/lib/pkgpost"

# Broker the background workers consume jobs from.
broker-url = "{broker}"

# Treat every request as https, whatever the reverse proxy reports.
force-ssl = false
"#,
		broker = crate::config::types::DEFAULT_BROKER_URL
	)
}
