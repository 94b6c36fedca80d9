use crate::error::PkgpostError;
use serde::Deserialize;
use std::path::PathBuf;

/// Default broker the surrounding task queue connects to.
pub const DEFAULT_BROKER_URL: &str = "redis://localhost:6379/0";

/// Top-level settings from a `.pkgpost.toml` file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
	/// Directory that uploads and extracted packages live under.
	/// Relative job paths resolve against it.
	pub working_dir: PathBuf,

	/// URL of the task broker.
	pub broker_url: String,

	/// If true, every generated URL uses `https` regardless of proxy headers.
	pub force_ssl: bool,
}

impl Default for Settings {
	fn default() -> Self {
		Settings {
			working_dir: std::env::temp_dir().join("pkgpost"),
			broker_url: DEFAULT_BROKER_URL.to_string(),
			force_ssl: false,
		}
	}
}

impl Settings {
	/// Validate field values that deserialization alone can't check.
	pub fn validate(&self) -> Result<(), PkgpostError> {
		if self.working_dir.as_os_str().is_empty() {
			return Err(PkgpostError::InvalidSetting {
				key: "working-dir".to_string(),
				reason: "must not be empty".to_string(),
			});
		}

		if !self.broker_url.contains("://") {
			return Err(PkgpostError::InvalidSetting {
				key: "broker-url".to_string(),
				reason: format!("missing scheme in {:?}", self.broker_url),
			});
		}

		Ok(())
	}

	/// Scheme a request should be treated as arriving on, given the value of
	/// an `X-Forwarded-Proto` header set by a reverse proxy.
	pub fn effective_scheme<'a>(&self, forwarded_proto: Option<&'a str>) -> &'a str {
		if self.force_ssl {
			return "https";
		}

		match forwarded_proto.map(str::trim) {
			Some(proto) if !proto.is_empty() => proto,
			_ => "http",
		}
	}
}

/// Settings together with the file they were read from, if any.
#[derive(Debug, Clone)]
pub struct LoadedSettings {
	/// The effective settings.
	pub settings: Settings,

	/// The file these settings came from, or `None` for built-in defaults.
	pub path: Option<PathBuf>,
}
