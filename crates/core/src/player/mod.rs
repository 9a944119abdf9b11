//! Consumers of a granted PipeWire remote.

mod gst;

use std::os::fd::OwnedFd;
use std::process::ExitStatus;

use async_trait::async_trait;

pub use gst::{GstPlayer, PlayerConfig};

use crate::error::Result;

/// How a started pipeline ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineExit {
	pub node_id: Option<u32>,
	/// `None` when the exit status could not be collected.
	pub status: Option<ExitStatus>,
}

impl PipelineExit {
	pub fn success(&self) -> bool {
		self.status.is_some_and(|status| status.success())
	}
}

/// Receives granted streams.
#[async_trait]
pub trait Player: Send {
	/// Starts playback from `fd`. Ownership of the descriptor moves to the player.
	async fn play(&mut self, fd: OwnedFd, node_id: Option<u32>) -> Result<()>;

	/// Resolves once any started pipeline has exited. Pending forever while
	/// nothing is playing.
	async fn ended(&mut self) -> PipelineExit;

	/// Stops everything started so far. Safe to call repeatedly.
	async fn stop(&mut self);

	/// Number of pipelines currently running.
	fn active(&self) -> usize;
}
