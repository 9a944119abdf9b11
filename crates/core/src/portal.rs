//! Portal connection facade.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use xdp_runtime::{Connection, DbusTransport, TransportParts};

use crate::camera::CameraFlow;
use crate::error::Result;
use crate::screencast::{ScreenCastFlow, ScreenCastOptions};

/// A correlating portal connection with its dispatch loop running.
///
/// The loop is aborted when the `Portal` is dropped.
pub struct Portal {
	connection: Arc<Connection>,
	dispatch: JoinHandle<()>,
}

impl Portal {
	/// Connects to the session bus.
	///
	/// `reply_timeout` bounds every wait for a `Response`; `None` waits
	/// indefinitely.
	pub async fn connect(reply_timeout: Option<Duration>) -> Result<Self> {
		let parts = DbusTransport::session().await?;
		Ok(Self::with_transport(parts, reply_timeout))
	}

	/// Wraps an existing transport. Must be called within a tokio runtime.
	pub fn with_transport(parts: TransportParts, reply_timeout: Option<Duration>) -> Self {
		let connection = Arc::new(Connection::new(parts).with_reply_timeout(reply_timeout));

		let conn = Arc::clone(&connection);
		let dispatch = tokio::spawn(async move {
			conn.run().await;
		});

		Self { connection, dispatch }
	}

	pub fn connection(&self) -> &Arc<Connection> {
		&self.connection
	}

	pub fn camera(&self) -> CameraFlow {
		CameraFlow::new(Arc::clone(&self.connection))
	}

	pub fn screen_cast(&self, options: ScreenCastOptions) -> ScreenCastFlow {
		ScreenCastFlow::new(Arc::clone(&self.connection), options)
	}
}

impl Drop for Portal {
	fn drop(&mut self) {
		self.dispatch.abort();
	}
}
