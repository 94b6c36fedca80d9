use crate::config::parser::parse_config_file;
use crate::config::types::{LoadedSettings, Settings};
use crate::error::{PkgpostError, Result};
use std::path::{Path, PathBuf};

/// Name of the settings file looked up in each directory.
pub const CONFIG_FILE_NAME: &str = ".pkgpost.toml";

/// Environment variable overriding `broker-url`.
pub const ENV_BROKER_URL: &str = "REDIS_URL";

/// Environment variable that, if truthy, turns on `force-ssl`.
pub const ENV_FORCE_SSL: &str = "FORCE_SSL";

/// Environment variable overriding `working-dir`.
pub const ENV_WORKING_DIR: &str = "PKGPOST_WORKING_DIR";

/// Find the settings file that applies to `start_dir`.
///
/// The lookup order is:
/// 1. `.pkgpost.toml` in `start_dir`, then in each ancestor up to the root
/// 2. `~/.pkgpost.toml`
///
/// The first file found wins; settings are not merged across files.
pub fn discover_config(start_dir: &Path) -> Result<Option<PathBuf>> {
	if let Some(path) = find_in_ancestors(start_dir) {
		return Ok(Some(path));
	}

	let user_path = user_config_path()?;
	if user_path.exists() {
		Ok(Some(user_path))
	} else {
		Ok(None)
	}
}

/// Walk up from `start_dir` looking for a settings file.
fn find_in_ancestors(start_dir: &Path) -> Option<PathBuf> {
	start_dir
		.ancestors()
		.map(|dir| dir.join(CONFIG_FILE_NAME))
		.find(|candidate| candidate.is_file())
}

/// Load the effective settings.
///
/// `explicit` bypasses discovery. Without a settings file the built-in
/// defaults are used. Environment overrides are applied last.
pub fn load_settings(start_dir: &Path, explicit: Option<&Path>) -> Result<LoadedSettings> {
	let path = match explicit {
		Some(path) => Some(path.to_path_buf()),
		None => discover_config(start_dir)?,
	};

	let mut settings = match &path {
		Some(path) => parse_config_file(path)?,
		None => Settings::default(),
	};

	apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
	settings.validate()?;

	Ok(LoadedSettings { settings, path })
}

/// Apply environment overrides, reading variables through `lookup`.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
	F: Fn(&str) -> Option<String>,
{
	if let Some(url) = lookup(ENV_BROKER_URL).filter(|v| !v.is_empty()) {
		settings.broker_url = url;
	}

	if lookup(ENV_FORCE_SSL).is_some_and(|v| is_truthy(&v)) {
		settings.force_ssl = true;
	}

	if let Some(dir) = lookup(ENV_WORKING_DIR).filter(|v| !v.is_empty()) {
		settings.working_dir = PathBuf::from(dir);
	}
}

/// Check if an environment value counts as "on": `1`, `true`, `yes` or `on`,
/// ignoring case and surrounding whitespace. Anything else is off.
fn is_truthy(value: &str) -> bool {
	matches!(
		value.trim().to_ascii_lowercase().as_str(),
		"1" | "true" | "yes" | "on"
	)
}

/// Get the path to the user's settings file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(PkgpostError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |name: &str| map.get(name).cloned()
	}

	#[test]
	fn test_is_truthy() {
		assert!(!is_truthy(""));
		assert!(!is_truthy("0"));
		assert!(!is_truthy("false"));
		assert!(!is_truthy("FALSE"));
		assert!(!is_truthy("no"));
		assert!(!is_truthy("off"));
		assert!(!is_truthy("disabled"));
		assert!(!is_truthy("2"));
		assert!(is_truthy("1"));
		assert!(is_truthy("true"));
		assert!(is_truthy("YES"));
		assert!(is_truthy(" on "));
	}

	#[test]
	fn test_env_overrides() {
		let mut settings = Settings::default();
		apply_env_overrides(
			&mut settings,
			env_of(&[
				("REDIS_URL", "redis://cache:6379/1"),
				("FORCE_SSL", "yes"),
				("PKGPOST_WORKING_DIR", "/srv/uploads"),
			]),
		);

		assert_eq!(settings.broker_url, "redis://cache:6379/1");
		assert!(settings.force_ssl);
		assert_eq!(settings.working_dir, PathBuf::from("/srv/uploads"));
	}

	#[test]
	fn test_env_overrides_ignore_empty_and_falsy() {
		let mut settings = Settings::default();
		apply_env_overrides(
			&mut settings,
			env_of(&[("REDIS_URL", ""), ("FORCE_SSL", "off")]),
		);

		assert_eq!(settings, Settings::default());
	}

	#[test]
	fn test_find_in_ancestors() {
		let temp = tempfile::tempdir().unwrap();
		let nested = temp.path().join("a").join("b");
		std::fs::create_dir_all(&nested).unwrap();
		let config_path = temp.path().join("a").join(CONFIG_FILE_NAME);
		std::fs::write(&config_path, "force-ssl = true\n").unwrap();

		assert_eq!(find_in_ancestors(&nested), Some(config_path.clone()));
		assert_eq!(find_in_ancestors(&temp.path().join("a")), Some(config_path));
	}

	#[test]
	fn test_nearest_config_wins() {
		let temp = tempfile::tempdir().unwrap();
		let nested = temp.path().join("project");
		std::fs::create_dir_all(&nested).unwrap();
		std::fs::write(temp.path().join(CONFIG_FILE_NAME), "").unwrap();
		std::fs::write(nested.join(CONFIG_FILE_NAME), "").unwrap();

		assert_eq!(
			find_in_ancestors(&nested),
			Some(nested.join(CONFIG_FILE_NAME))
		);
	}

	#[test]
	fn test_load_settings_explicit_path() {
		let temp = tempfile::tempdir().unwrap();
		let config_path = temp.path().join("custom.toml");
		std::fs::write(&config_path, "working-dir = \"/data/pkgpost\"\n").unwrap();

		let loaded = load_settings(temp.path(), Some(config_path.as_path())).unwrap();

		assert_eq!(loaded.path, Some(config_path));
		// PKGPOST_WORKING_DIR may be set by the environment running the tests.
		if std::env::var(ENV_WORKING_DIR).is_err() {
			assert_eq!(loaded.settings.working_dir, PathBuf::from("/data/pkgpost"));
		}
	}
}
