use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
	#[error("failed to read config {}: {source}", .path.display())]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid config {}: {source}", .path.display())]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error(transparent)]
	Portal(#[from] xdp::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
