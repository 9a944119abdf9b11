//! Config file and its merge with command line flags.
//!
//! Every field is optional; a flag given on the command line wins over the
//! file, and the file wins over the built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use xdp::{PlayerConfig, ScreenCastOptions};

use crate::cli::{Cli, CursorModeArg, ScreencastArgs, SourceKind, source_types};
use crate::error::{CliError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
	pub launcher: Option<String>,
	pub sink: Option<String>,
	pub client_name: Option<String>,
	pub reply_timeout_ms: Option<u64>,
	pub stop_grace_ms: Option<u64>,
	pub screencast: ScreencastConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreencastConfig {
	pub multiple: Option<bool>,
	pub types: Option<Vec<SourceKind>>,
	pub cursor_mode: Option<CursorModeArg>,
}

/// `$XDG_CONFIG_HOME/xdp-rs/config.json`.
pub fn default_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("xdp-rs").join("config.json"))
}

impl ConfigFile {
	/// Loads `explicit` if given, otherwise the default path when it exists.
	///
	/// A missing default file yields the defaults; a missing explicit file is
	/// an error.
	pub fn load(explicit: Option<&Path>) -> Result<Self> {
		match explicit {
			Some(path) => Self::read(path),
			None => match default_path() {
				Some(path) if path.is_file() => Self::read(&path),
				_ => Ok(Self::default()),
			},
		}
	}

	pub fn read(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
			path: path.to_path_buf(),
			source,
		})?;
		serde_json::from_str(&content).map_err(|source| CliError::ConfigParse {
			path: path.to_path_buf(),
			source,
		})
	}
}

/// Settings shared by every command after merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
	pub reply_timeout: Option<Duration>,
	pub player: PlayerConfig,
}

impl Settings {
	/// Applies file values, then flags, on top of `base`.
	pub fn resolve(cli: &Cli, file: &ConfigFile, base: PlayerConfig) -> Self {
		let mut player = base;
		if let Some(launcher) = &file.launcher {
			player.launcher = launcher.clone();
		}
		if let Some(sink) = cli.sink.as_ref().or(file.sink.as_ref()) {
			player.sink = sink.clone();
		}
		if let Some(name) = cli.client_name.as_ref().or(file.client_name.as_ref()) {
			player.client_name = Some(name.clone());
		}
		if let Some(ms) = file.stop_grace_ms {
			player.stop_grace = Duration::from_millis(ms);
		}

		let reply_timeout = cli
			.reply_timeout_ms
			.or(file.reply_timeout_ms)
			.filter(|ms| *ms > 0)
			.map(Duration::from_millis);

		Self { reply_timeout, player }
	}
}

pub fn screen_cast_options(args: &ScreencastArgs, file: &ScreencastConfig) -> ScreenCastOptions {
	let kinds = if args.types.is_empty() {
		file.types.as_deref().unwrap_or_default()
	} else {
		args.types.as_slice()
	};

	ScreenCastOptions {
		multiple: args.multiple().or(file.multiple).unwrap_or(false),
		types: source_types(kinds),
		cursor_mode: args.cursor_mode.or(file.cursor_mode).map(Into::into),
	}
}
