//! Shared fixtures for flow tests.

#![allow(dead_code)]

use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use async_trait::async_trait;
use xdp::{PipelineExit, Player, Portal, Result};
use xdp_runtime::{FakeTransport, FakeTransportController};

pub const UNIQUE_NAME: &str = ":1.42";

/// Player that records every handoff and keeps the descriptors open.
#[derive(Default)]
pub struct RecordingPlayer {
	pub played: Vec<(OwnedFd, Option<u32>)>,
	pub stops: usize,
}

impl RecordingPlayer {
	pub fn node_ids(&self) -> Vec<Option<u32>> {
		self.played.iter().map(|(_, node)| *node).collect()
	}

	pub fn raw_fds(&self) -> Vec<RawFd> {
		self.played.iter().map(|(fd, _)| fd.as_raw_fd()).collect()
	}
}

#[async_trait]
impl Player for RecordingPlayer {
	async fn play(&mut self, fd: OwnedFd, node_id: Option<u32>) -> Result<()> {
		self.played.push((fd, node_id));
		Ok(())
	}

	async fn ended(&mut self) -> PipelineExit {
		std::future::pending().await
	}

	async fn stop(&mut self) {
		self.stops += 1;
		self.played.clear();
	}

	fn active(&self) -> usize {
		self.played.len()
	}
}

pub fn portal() -> (Portal, FakeTransportController) {
	let (parts, controller) = FakeTransport::new(UNIQUE_NAME);
	(Portal::with_transport(parts, None), controller)
}
