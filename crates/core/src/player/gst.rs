//! GStreamer playback through `gst-launch-1.0` child processes.
//!
//! Each stream gets its own child running
//!
//! ```text
//! gst-launch-1.0 -e pipewiresrc fd=<fd> [path=<node>] client-name=<name> ! videoconvert ! <sink>
//! ```
//!
//! with the PipeWire remote inherited across `exec`.

use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::select_all;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};
use xdp_runtime::process;

use super::{PipelineExit, Player};
use crate::error::{Error, Result};

/// Pipeline launch settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
	pub launcher: String,
	/// Sink element and its properties, whitespace separated.
	pub sink: String,
	pub client_name: Option<String>,
	/// How long a pipeline gets to drain after SIGINT before it is killed.
	pub stop_grace: Duration,
}

impl PlayerConfig {
	pub fn camera() -> Self {
		Self {
			launcher: "gst-launch-1.0".to_string(),
			sink: "xvimagesink".to_string(),
			client_name: None,
			stop_grace: Duration::from_secs(2),
		}
	}

	pub fn screen_cast() -> Self {
		Self {
			sink: "glimagesink rotate-method=automatic".to_string(),
			client_name: Some("xdp-rs".to_string()),
			..Self::camera()
		}
	}

	/// Launcher arguments for a pipeline reading from `fd`.
	pub fn pipeline_args(&self, fd: RawFd, node_id: Option<u32>) -> Vec<String> {
		let mut args = vec!["-e".to_string(), "pipewiresrc".to_string(), format!("fd={fd}")];
		if let Some(node) = node_id {
			args.push(format!("path={node}"));
		}
		if let Some(name) = &self.client_name {
			args.push(format!("client-name={name}"));
		}
		args.extend(["!", "videoconvert", "!"].map(String::from));
		args.extend(self.sink.split_whitespace().map(String::from));
		args
	}
}

struct Pipeline {
	child: Child,
	node_id: Option<u32>,
}

/// [`Player`] spawning one `gst-launch-1.0` process per stream.
pub struct GstPlayer {
	config: PlayerConfig,
	pipelines: Vec<Pipeline>,
}

impl GstPlayer {
	pub fn new(config: PlayerConfig) -> Self {
		Self {
			config,
			pipelines: Vec::new(),
		}
	}

	async fn stop_pipeline(&self, mut pipeline: Pipeline) {
		if let Some(pid) = pipeline.child.id().filter(|pid| process::pid_is_alive(*pid)) {
			if let Err(err) = process::interrupt(pid) {
				warn!(target = "xdp.pipeline", pid, error = %err, "failed to interrupt pipeline");
			}
		}

		match tokio::time::timeout(self.config.stop_grace, pipeline.child.wait()).await {
			Ok(Ok(status)) => debug!(target = "xdp.pipeline", node_id = ?pipeline.node_id, %status, "pipeline stopped"),
			Ok(Err(err)) => warn!(target = "xdp.pipeline", node_id = ?pipeline.node_id, error = %err, "failed to reap pipeline"),
			Err(_) => {
				warn!(target = "xdp.pipeline", node_id = ?pipeline.node_id, "pipeline ignored interrupt, killing");
				if let Err(err) = pipeline.child.kill().await {
					warn!(target = "xdp.pipeline", error = %err, "failed to kill pipeline");
				}
			}
		}
	}
}

#[async_trait]
impl Player for GstPlayer {
	async fn play(&mut self, fd: OwnedFd, node_id: Option<u32>) -> Result<()> {
		let raw = fd.as_raw_fd();
		let args = self.config.pipeline_args(raw, node_id);
		debug!(target = "xdp.pipeline", launcher = %self.config.launcher, args = %args.join(" "), "spawning pipeline");

		let mut command = Command::new(&self.config.launcher);
		command.args(&args).stdin(Stdio::null()).kill_on_drop(true);
		// SAFETY: inherit_fd only calls fcntl, which is async-signal-safe.
		unsafe {
			command.pre_exec(move || process::inherit_fd(raw));
		}

		let child = command.spawn().map_err(|source| Error::PlayerSpawn {
			launcher: self.config.launcher.clone(),
			source,
		})?;
		// The child holds its own copy now.
		drop(fd);

		info!(target = "xdp.pipeline", pid = ?child.id(), ?node_id, "playing");
		self.pipelines.push(Pipeline { child, node_id });
		Ok(())
	}

	async fn ended(&mut self) -> PipelineExit {
		if self.pipelines.is_empty() {
			return std::future::pending().await;
		}

		let (status, index, rest) = select_all(self.pipelines.iter_mut().map(|pipeline| Box::pin(pipeline.child.wait()))).await;
		drop(rest);

		let pipeline = self.pipelines.remove(index);
		let status = match status {
			Ok(status) => Some(status),
			Err(err) => {
				warn!(target = "xdp.pipeline", error = %err, "failed to collect pipeline status");
				None
			}
		};
		info!(target = "xdp.pipeline", node_id = ?pipeline.node_id, ?status, "pipeline ended");

		PipelineExit {
			node_id: pipeline.node_id,
			status,
		}
	}

	async fn stop(&mut self) {
		for pipeline in std::mem::take(&mut self.pipelines) {
			self.stop_pipeline(pipeline).await;
		}
	}

	fn active(&self) -> usize {
		self.pipelines.len()
	}
}
