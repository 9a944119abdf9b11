//! PipeWire remote acquisition.
//!
//! Once access is granted (camera) or a session is started (screen cast),
//! `OpenPipeWireRemote` returns a descriptor for a PipeWire connection that
//! only exposes the granted nodes.

use std::os::fd::{AsRawFd, OwnedFd};

use tracing::debug;
use xdp_protocol::MethodCall;
use xdp_runtime::{CallReturn, Connection};

use crate::error::{Error, Result};

/// What the remote is opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTarget<'a> {
	/// Camera access; no session, no node selector.
	Camera,
	/// One stream of a started screen cast session.
	ScreenCast { session: &'a str, node_id: u32 },
}

/// An owned PipeWire remote, optionally bound to a stream node.
#[derive(Debug)]
pub struct Channel {
	pub fd: OwnedFd,
	pub node_id: Option<u32>,
}

/// Opens a PipeWire remote for `target`.
///
/// The returned descriptor is a duplicate owned by the caller; the portal's
/// copy is released with the reply message.
pub async fn open_channel(connection: &Connection, target: ChannelTarget<'_>) -> Result<Channel> {
	let (call, node_id) = match target {
		ChannelTarget::Camera => (MethodCall::camera_open_pipewire_remote(), None),
		ChannelTarget::ScreenCast { session, node_id } => (MethodCall::screen_cast_open_pipewire_remote(session), Some(node_id)),
	};

	match connection.call(call).await {
		Ok(CallReturn::Fd(fd)) => {
			debug!(target = "xdp.session", fd = fd.as_raw_fd(), ?node_id, "pipewire remote opened");
			Ok(Channel { fd, node_id })
		}
		Ok(other) => Err(Error::ChannelFailure {
			node_id,
			source: xdp_runtime::Error::ProtocolError(format!("expected a file descriptor, got {other:?}")),
		}),
		Err(source) => Err(Error::ChannelFailure { node_id, source }),
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use xdp_protocol::CallArgs;
	use xdp_runtime::FakeTransport;

	use super::*;

	#[tokio::test]
	async fn camera_remote_has_no_session_or_node() {
		let (parts, controller) = FakeTransport::new(":1.3");
		let connection = Arc::new(Connection::new(parts));

		let channel = open_channel(&connection, ChannelTarget::Camera).await.unwrap();

		assert_eq!(channel.node_id, None);
		let sent = controller.sent();
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].call.interface, "org.freedesktop.portal.Camera");
		assert!(matches!(sent[0].call.args, CallArgs::Options(ref options) if options.is_empty()));
	}

	#[tokio::test]
	async fn screen_cast_remote_carries_session() {
		let (parts, controller) = FakeTransport::new(":1.3");
		let connection = Connection::new(parts);

		let channel = open_channel(&connection, ChannelTarget::ScreenCast { session: "/s1", node_id: 42 })
			.await
			.unwrap();

		assert_eq!(channel.node_id, Some(42));
		let sent = controller.sent();
		assert_eq!(sent[0].call.interface, "org.freedesktop.portal.ScreenCast");
		assert_eq!(sent[0].call.args.session(), Some("/s1"));
	}

	#[tokio::test]
	async fn refused_remote_is_channel_failure() {
		let (parts, controller) = FakeTransport::new(":1.3");
		controller.fail_open_remote_after(0);
		let connection = Connection::new(parts);

		let result = open_channel(&connection, ChannelTarget::ScreenCast { session: "/s1", node_id: 7 }).await;

		assert!(matches!(result, Err(Error::ChannelFailure { node_id: Some(7), .. })));
	}
}
