//! Request/response correlation for portal calls.
//!
//! Portal methods that need user interaction return immediately with the path
//! of a request object; the actual outcome arrives later as a `Response`
//! signal on that path. This module pairs each outbound call with that signal.
//! It handles:
//! - Allocating a request token and deriving its path
//! - Subscribing to the path before the call goes out
//! - Delivering the first `Response` on a path to its caller exactly once
//! - Rejecting signals for paths with no pending request
//!
//! # Message Flow
//!
//! 1. Caller invokes `request()` with a [`MethodCall`]
//! 2. Connection allocates `u<N>` and derives the request path
//! 3. A oneshot sender is stored under the path, and the transport subscribes
//! 4. `handle_token` is added to the call options and the call is sent
//! 5. Caller awaits the oneshot receiver
//! 6. Dispatch loop receives the signal, removes the pending entry, unsubscribes
//! 7. Caller receives the decoded [`Response`]
//!
//! # Example
//!
//! ```ignore
//! let parts = DbusTransport::session().await?;
//! let connection = Arc::new(Connection::new(parts));
//!
//! let conn = Arc::clone(&connection);
//! tokio::spawn(async move { conn.run().await });
//!
//! let response = connection.request(MethodCall::access_camera()).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, error, warn};
use xdp_protocol::{HANDLE_TOKEN, MethodCall, ReplyKind, Response};

use crate::error::{Error, Result};
use crate::token::TokenAllocator;
use crate::transport::{CallReturn, InboundSignal, Transport, TransportParts};

/// Correlating connection to the portal.
///
/// Pending requests are keyed by their derived object path. The dispatch loop
/// ([`Connection::run`]) must be running for [`Connection::request`] to
/// complete.
pub struct Connection {
	tokens: TokenAllocator,
	/// Pending request callbacks keyed by request path
	callbacks: Mutex<HashMap<String, oneshot::Sender<Result<Response>>>>,
	transport: Arc<dyn Transport>,
	/// Receiver for matched signals; taken by the first `run()` call
	signal_rx: Mutex<Option<mpsc::UnboundedReceiver<InboundSignal>>>,
	reply_timeout: Option<Duration>,
}

impl Connection {
	pub fn new(parts: TransportParts) -> Self {
		Self {
			tokens: TokenAllocator::new(parts.transport.unique_name()),
			callbacks: Mutex::new(HashMap::new()),
			transport: parts.transport,
			signal_rx: Mutex::new(Some(parts.signal_rx)),
			reply_timeout: None,
		}
	}

	/// Bounds the wait for each `Response`. Without a timeout a request whose
	/// reply never arrives waits forever.
	pub fn with_reply_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.reply_timeout = timeout;
		self
	}

	pub fn tokens(&self) -> &TokenAllocator {
		&self.tokens
	}

	pub fn unique_name(&self) -> &str {
		self.transport.unique_name()
	}

	/// Number of requests still waiting for their `Response`.
	pub async fn pending(&self) -> usize {
		self.callbacks.lock().await.len()
	}

	/// Sends a request-style call and waits for its correlated `Response`.
	///
	/// # Errors
	///
	/// Returns an error if:
	/// - The call itself fails on the bus
	/// - The reply signal cannot be decoded
	/// - The dispatch loop stops before the reply arrives
	/// - A reply timeout is configured and expires
	pub async fn request(&self, mut call: MethodCall) -> Result<Response> {
		if call.reply != ReplyKind::RequestHandle {
			return Err(Error::ProtocolError(format!("{} does not create a request object", call.member)));
		}

		let (token, path) = self.tokens.next_request();
		let (tx, rx) = oneshot::channel();

		{
			let mut callbacks = self.callbacks.lock().await;
			if callbacks.contains_key(&path) {
				return Err(Error::ProtocolError(format!("request path already pending: {path}")));
			}
			callbacks.insert(path.clone(), tx);
		}

		// Subscribe first so a fast reply cannot slip past us.
		if let Err(err) = self.transport.subscribe(&path).await {
			self.release(&path).await;
			return Err(err);
		}

		match call.args.options_mut() {
			Some(options) => options.insert(HANDLE_TOKEN, token.to_string()),
			None => {
				self.release(&path).await;
				return Err(Error::ProtocolError(format!("{} takes no options", call.member)));
			}
		}

		let member = call.member;
		debug!(target = "xdp.portal", %token, %path, member, "request");

		match self.transport.call(call).await {
			Ok(CallReturn::RequestHandle(handle)) if handle != path => {
				// Pre-0.9 portals ignored handle_token; nothing we can correlate then.
				warn!(target = "xdp.portal", expected = %path, returned = %handle, member, "portal returned unexpected request handle");
			}
			Ok(_) => {}
			Err(err) => {
				self.release(&path).await;
				return Err(err);
			}
		}

		let reply = match self.reply_timeout {
			Some(timeout) => match tokio::time::timeout(timeout, rx).await {
				Ok(reply) => reply,
				Err(_) => {
					self.release(&path).await;
					return Err(Error::Timeout { member, timeout });
				}
			},
			None => rx.await,
		};

		reply.map_err(|_| Error::ChannelClosed).and_then(|result| result)
	}

	/// Sends a call whose result is its synchronous return value.
	pub async fn call(&self, call: MethodCall) -> Result<CallReturn> {
		debug!(target = "xdp.portal", path = %call.path, member = call.member, "call");
		self.transport.call(call).await
	}

	/// Runs the signal dispatch loop until the transport's channel closes.
	///
	/// Spawn this in a background task; only the first invocation does work.
	pub async fn run(&self) {
		let Some(mut signal_rx) = self.signal_rx.lock().await.take() else {
			warn!(target = "xdp.portal", "dispatch loop already running");
			return;
		};

		while let Some(signal) = signal_rx.recv().await {
			if let Err(e) = self.dispatch(signal).await {
				error!(target = "xdp.portal", error = %e, "dropping response");
			}
		}

		debug!(target = "xdp.portal", "dispatch loop ended (transport closed)");
		// Wake every waiter; their senders drop here.
		self.callbacks.lock().await.clear();
	}

	/// Delivers one signal to the request waiting on its path.
	async fn dispatch(&self, signal: InboundSignal) -> Result<()> {
		let callback = self
			.callbacks
			.lock()
			.await
			.remove(&signal.path)
			.ok_or_else(|| Error::ProtocolError(format!("Cannot find request to respond: path={}", signal.path)))?;

		self.transport.unsubscribe(&signal.path);

		if let Ok(response) = &signal.reply {
			debug!(target = "xdp.portal", path = %signal.path, code = response.code, "response");
		}

		// Receiver may have given up (timeout); nothing left to do then.
		let _ = callback.send(signal.reply);
		Ok(())
	}

	async fn release(&self, path: &str) {
		self.callbacks.lock().await.remove(path);
		self.transport.unsubscribe(path);
	}
}
