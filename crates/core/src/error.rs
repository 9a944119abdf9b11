use crate::step::Step;

/// Errors that end a negotiation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The user or a policy refused (`response` 1).
	#[error("{step} was denied (response {code})")]
	Denied { step: Step, code: u32 },

	/// The interaction ended some other way (`response` 2 or unknown).
	#[error("{step} failed (response {code})")]
	Failed { step: Step, code: u32 },

	/// A successful reply lacked a key the next step depends on.
	#[error("{step} reply has no `{key}`")]
	Malformed { step: Step, key: &'static str },

	#[error("OpenPipeWireRemote failed for {}: {source}", node_label(.node_id))]
	ChannelFailure {
		node_id: Option<u32>,
		#[source]
		source: xdp_runtime::Error,
	},

	#[error("failed to start pipeline `{launcher}`: {source}")]
	PlayerSpawn {
		launcher: String,
		#[source]
		source: std::io::Error,
	},

	#[error(transparent)]
	Runtime(#[from] xdp_runtime::Error),
}

impl Error {
	/// Step the error is attributed to, when known.
	pub fn step(&self) -> Option<Step> {
		match self {
			Error::Denied { step, .. } | Error::Failed { step, .. } | Error::Malformed { step, .. } => Some(*step),
			Error::ChannelFailure { .. } => Some(Step::OpenPipeWireRemote),
			_ => None,
		}
	}

	/// Portal response code, for denial and failure.
	pub fn response_code(&self) -> Option<u32> {
		match self {
			Error::Denied { code, .. } | Error::Failed { code, .. } => Some(*code),
			_ => None,
		}
	}
}

fn node_label(node_id: &Option<u32>) -> String {
	match node_id {
		Some(node) => format!("node {node}"),
		None => "camera".to_string(),
	}
}

pub type Result<T> = std::result::Result<T, Error>;
