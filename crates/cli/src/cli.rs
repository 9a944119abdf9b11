use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use xdp::{CursorMode, SourceTypes};

#[derive(Parser, Debug)]
#[command(name = "xdp")]
#[command(about = "Play camera and screen cast streams granted by the desktop portal")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// GStreamer sink element and properties
	#[arg(long, global = true, value_name = "ELEMENT")]
	pub sink: Option<String>,

	/// PipeWire client name announced by the pipeline
	#[arg(long, global = true, value_name = "NAME")]
	pub client_name: Option<String>,

	/// Give up on a portal reply after this many milliseconds (0 waits forever)
	#[arg(long, global = true, value_name = "MS")]
	pub reply_timeout_ms: Option<u64>,

	/// Config file (defaults to $XDG_CONFIG_HOME/xdp-rs/config.json)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Request camera access and play the camera remote
	Camera,

	/// Start a screen cast session and play every granted stream
	#[command(alias = "sc")]
	Screencast(ScreencastArgs),

	/// Print the sender segment and the object paths of the next request and session
	Paths,
}

#[derive(Args, Debug, Default)]
pub struct ScreencastArgs {
	/// Allow selecting more than one source
	#[arg(long, overrides_with = "no_multiple")]
	pub multiple: bool,

	/// Allow a single source only, even if the config file says otherwise
	#[arg(long, overrides_with = "multiple")]
	pub no_multiple: bool,

	/// Source kinds offered in the picker
	#[arg(long, value_enum, value_delimiter = ',', value_name = "KIND")]
	pub types: Vec<SourceKind>,

	/// How the cursor is delivered
	#[arg(long, value_enum)]
	pub cursor_mode: Option<CursorModeArg>,
}

impl ScreencastArgs {
	/// `Some` only when one of `--multiple` / `--no-multiple` was given.
	pub fn multiple(&self) -> Option<bool> {
		match (self.multiple, self.no_multiple) {
			(true, _) => Some(true),
			(_, true) => Some(false),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
	Camera,
	Monitor,
}

impl From<SourceKind> for SourceTypes {
	fn from(kind: SourceKind) -> Self {
		match kind {
			SourceKind::Camera => SourceTypes::CAMERA,
			SourceKind::Monitor => SourceTypes::MONITOR,
		}
	}
}

/// Folds a kind list into a mask; an empty list means the portal default.
pub fn source_types(kinds: &[SourceKind]) -> SourceTypes {
	let types = kinds.iter().fold(SourceTypes::empty(), |acc, kind| acc | SourceTypes::from(*kind));
	if types.is_empty() { SourceTypes::default() } else { types }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorModeArg {
	Hidden,
	Embedded,
	Metadata,
}

impl From<CursorModeArg> for CursorMode {
	fn from(mode: CursorModeArg) -> Self {
		match mode {
			CursorModeArg::Hidden => CursorMode::Hidden,
			CursorModeArg::Embedded => CursorMode::Embedded,
			CursorModeArg::Metadata => CursorMode::Metadata,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_camera_with_globals() {
		let cli = Cli::try_parse_from(["xdp", "camera", "-vv", "--sink", "autovideosink", "--reply-timeout-ms", "500"]).unwrap();

		assert!(matches!(cli.command, Commands::Camera));
		assert_eq!(cli.verbose, 2);
		assert_eq!(cli.sink.as_deref(), Some("autovideosink"));
		assert_eq!(cli.reply_timeout_ms, Some(500));
		assert!(cli.client_name.is_none());
	}

	#[test]
	fn parse_screencast_defaults() {
		let cli = Cli::try_parse_from(["xdp", "screencast"]).unwrap();

		match cli.command {
			Commands::Screencast(args) => {
				assert_eq!(args.multiple(), None);
				assert!(args.types.is_empty());
				assert!(args.cursor_mode.is_none());
			}
			_ => panic!("Expected Screencast command"),
		}
	}

	#[test]
	fn parse_screencast_types_list() {
		let cli =
			Cli::try_parse_from(["xdp", "sc", "--multiple", "--types", "camera,monitor", "--cursor-mode", "embedded"]).unwrap();

		match cli.command {
			Commands::Screencast(args) => {
				assert_eq!(args.multiple(), Some(true));
				assert_eq!(args.types, [SourceKind::Camera, SourceKind::Monitor]);
				assert_eq!(args.cursor_mode, Some(CursorModeArg::Embedded));
			}
			_ => panic!("Expected Screencast command"),
		}
	}

	#[test]
	fn last_multiple_flag_wins() {
		let parse = |args: &[&str]| match Cli::try_parse_from(args).unwrap().command {
			Commands::Screencast(args) => args.multiple(),
			_ => panic!("Expected Screencast command"),
		};

		assert_eq!(parse(&["xdp", "screencast", "--no-multiple"]), Some(false));
		assert_eq!(parse(&["xdp", "screencast", "--multiple", "--no-multiple"]), Some(false));
		assert_eq!(parse(&["xdp", "screencast", "--no-multiple", "--multiple"]), Some(true));
	}

	#[test]
	fn unknown_source_kind_is_rejected() {
		assert!(Cli::try_parse_from(["xdp", "screencast", "--types", "window"]).is_err());
	}

	#[test]
	fn source_kinds_fold_into_mask() {
		assert_eq!(source_types(&[SourceKind::Monitor]).bits(), 2);
		assert_eq!(source_types(&[SourceKind::Camera, SourceKind::Monitor]).bits(), 3);
		assert_eq!(source_types(&[]).bits(), 3);
	}
}
