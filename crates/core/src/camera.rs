//! Camera access flow.
//!
//! ```text
//! Idle ─► AwaitingAccess ─► ChannelRequested ─► Streaming
//!               │                   │
//!               └───────────────────┴─► Terminated
//! ```

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};
use xdp_protocol::MethodCall;
use xdp_runtime::Connection;

use crate::channel::{ChannelTarget, open_channel};
use crate::error::Result;
use crate::player::Player;
use crate::step::{Step, accept};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraPhase {
	Idle,
	AwaitingAccess,
	ChannelRequested,
	Streaming,
	Terminated,
}

/// Negotiates camera access and hands the remote to a player.
pub struct CameraFlow {
	connection: Arc<Connection>,
	phase: CameraPhase,
}

impl CameraFlow {
	pub fn new(connection: Arc<Connection>) -> Self {
		Self {
			connection,
			phase: CameraPhase::Idle,
		}
	}

	pub fn phase(&self) -> CameraPhase {
		self.phase
	}

	/// Runs `AccessCamera` then `OpenPipeWireRemote`, and starts playback.
	///
	/// Any denial or failure leaves the flow in [`CameraPhase::Terminated`]
	/// without opening a remote.
	pub async fn negotiate<P>(&mut self, player: &mut P) -> Result<()>
	where
		P: Player + ?Sized,
	{
		let result = self.advance(player).await;
		if let Err(err) = &result {
			debug!(target = "xdp.session", error = %err, phase = ?self.phase, "camera negotiation failed");
			self.phase = CameraPhase::Terminated;
		}
		result
	}

	/// Like [`negotiate`](Self::negotiate), but gives up once `shutdown`
	/// resolves. Returns `Ok(None)` when interrupted; anything already playing
	/// is stopped and the flow is [`CameraPhase::Terminated`].
	pub async fn negotiate_until<P, S>(&mut self, player: &mut P, shutdown: S) -> Result<Option<()>>
	where
		P: Player + ?Sized,
		S: Future<Output = ()>,
	{
		let outcome = tokio::select! {
			result = self.negotiate(player) => Some(result),
			() = shutdown => None,
		};

		match outcome {
			Some(result) => result.map(Some),
			None => {
				info!(target = "xdp.session", phase = ?self.phase, "camera negotiation interrupted");
				player.stop().await;
				self.terminate();
				Ok(None)
			}
		}
	}

	/// Ends the flow. Idempotent.
	pub fn terminate(&mut self) {
		if self.phase != CameraPhase::Terminated {
			self.transition(CameraPhase::Terminated);
		}
	}

	async fn advance<P>(&mut self, player: &mut P) -> Result<()>
	where
		P: Player + ?Sized,
	{
		self.transition(CameraPhase::AwaitingAccess);
		let response = self.connection.request(MethodCall::access_camera()).await?;
		accept(Step::AccessCamera, response)?;

		self.transition(CameraPhase::ChannelRequested);
		let channel = open_channel(&self.connection, ChannelTarget::Camera).await?;
		player.play(channel.fd, channel.node_id).await?;

		self.transition(CameraPhase::Streaming);
		Ok(())
	}

	fn transition(&mut self, next: CameraPhase) {
		info!(target = "xdp.session", from = ?self.phase, to = ?next, "camera");
		self.phase = next;
	}
}
