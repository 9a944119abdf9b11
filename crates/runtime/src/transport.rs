//! Bus transport seam.
//!
//! The [`Transport`] trait is the narrow surface the correlator needs from the
//! message bus: the caller's unique name, per-path `Response` subscriptions,
//! and method calls. Matched signals are pushed into one unbounded channel,
//! which the [`Connection`](crate::Connection) dispatch loop drains in arrival
//! order.

use std::collections::HashMap;
use std::future::Future;
use std::os::fd::OwnedFd;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use xdp_protocol::{
	CallArgs, MethodCall, PORTAL_BUS_NAME, REQUEST_INTERFACE, RESPONSE_SIGNAL, ReplyKind, Response, Results, SESSION_HANDLE,
	session_handle_from_value,
};
use zbus::{MatchRule, MessageStream};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue};

use crate::error::{Error, Result};

/// A `Response` signal observed on a subscribed request path.
#[derive(Debug)]
pub struct InboundSignal {
	pub path: String,
	pub reply: Result<Response>,
}

/// Synchronous return value of a method call.
#[derive(Debug)]
pub enum CallReturn {
	RequestHandle(String),
	Fd(OwnedFd),
	Empty,
}

/// Bus operations used by the correlator.
pub trait Transport: Send + Sync {
	/// Unique name of this connection on the bus (e.g. `:1.42`).
	fn unique_name(&self) -> &str;

	/// Starts forwarding `Response` signals emitted on `path`.
	fn subscribe<'a>(&'a self, path: &'a str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

	/// Stops forwarding signals for `path`. Unknown paths are ignored.
	fn unsubscribe(&self, path: &str);

	/// Invokes a method and decodes its synchronous return value.
	fn call(&self, call: MethodCall) -> Pin<Box<dyn Future<Output = Result<CallReturn>> + Send + '_>>;
}

/// A transport together with the receiving end of its signal channel.
pub struct TransportParts {
	pub transport: Arc<dyn Transport>,
	pub signal_rx: mpsc::UnboundedReceiver<InboundSignal>,
}

/// [`Transport`] over a zbus session-bus connection.
pub struct DbusTransport {
	conn: zbus::Connection,
	unique_name: String,
	signal_tx: mpsc::UnboundedSender<InboundSignal>,
	subscriptions: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl DbusTransport {
	/// Connects to the session bus.
	pub async fn session() -> Result<TransportParts> {
		let conn = zbus::Connection::session().await?;
		Self::from_connection(conn)
	}

	pub fn from_connection(conn: zbus::Connection) -> Result<TransportParts> {
		let unique_name = conn
			.unique_name()
			.map(|name| name.as_str().to_string())
			.ok_or_else(|| Error::ProtocolError("bus connection has no unique name".to_string()))?;
		debug!(target = "xdp.portal", %unique_name, "connected to session bus");

		let (signal_tx, signal_rx) = mpsc::unbounded_channel();
		let transport = Self {
			conn,
			unique_name,
			signal_tx,
			subscriptions: Mutex::new(HashMap::new()),
		};

		Ok(TransportParts {
			transport: Arc::new(transport),
			signal_rx,
		})
	}
}

impl Transport for DbusTransport {
	fn unique_name(&self) -> &str {
		&self.unique_name
	}

	fn subscribe<'a>(&'a self, path: &'a str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
		Box::pin(async move {
			let rule = response_rule(path)?;
			let stream = MessageStream::for_match_rule(rule, &self.conn, Some(1)).await?;

			let task = tokio::spawn(forward_responses(stream, path.to_string(), self.signal_tx.clone()));
			if let Some(previous) = self.subscriptions.lock().insert(path.to_string(), task) {
				previous.abort();
			}
			Ok(())
		})
	}

	fn unsubscribe(&self, path: &str) {
		// Dropping the stream inside the task removes the match rule.
		if let Some(task) = self.subscriptions.lock().remove(path) {
			task.abort();
		}
	}

	fn call(&self, call: MethodCall) -> Pin<Box<dyn Future<Output = Result<CallReturn>> + Send + '_>> {
		Box::pin(async move {
			let destination = Some(PORTAL_BUS_NAME);
			let path = call.path.as_str();
			let interface = Some(call.interface);

			let reply = match &call.args {
				CallArgs::None => self.conn.call_method(destination, path, interface, call.member, &()).await?,
				CallArgs::Options(options) => {
					self.conn
						.call_method(destination, path, interface, call.member, &(options.to_vardict(),))
						.await?
				}
				CallArgs::Session { session, options } => {
					let session = ObjectPath::try_from(session.as_str())?;
					self.conn
						.call_method(destination, path, interface, call.member, &(session, options.to_vardict()))
						.await?
				}
				CallArgs::SessionWindow {
					session,
					parent_window,
					options,
				} => {
					let session = ObjectPath::try_from(session.as_str())?;
					self.conn
						.call_method(destination, path, interface, call.member, &(session, parent_window.as_str(), options.to_vardict()))
						.await?
				}
			};

			match call.reply {
				ReplyKind::RequestHandle => {
					let handle: OwnedObjectPath = reply.body().deserialize()?;
					Ok(CallReturn::RequestHandle(handle.as_str().to_string()))
				}
				ReplyKind::Fd => {
					let fd: zvariant::OwnedFd = reply.body().deserialize()?;
					Ok(CallReturn::Fd(fd.into()))
				}
				ReplyKind::Empty => Ok(CallReturn::Empty),
			}
		})
	}
}

impl Drop for DbusTransport {
	fn drop(&mut self) {
		for (_, task) in self.subscriptions.lock().drain() {
			task.abort();
		}
	}
}

/// Matches `Response` on `path`, emitted by the portal and nobody else.
fn response_rule(path: &str) -> Result<MatchRule<'_>> {
	Ok(MatchRule::builder()
		.msg_type(zbus::message::Type::Signal)
		.sender(PORTAL_BUS_NAME)?
		.path(path)?
		.interface(REQUEST_INTERFACE)?
		.member(RESPONSE_SIGNAL)?
		.build())
}

async fn forward_responses(mut stream: MessageStream, path: String, signal_tx: mpsc::UnboundedSender<InboundSignal>) {
	while let Some(message) = stream.next().await {
		let reply = match message {
			Ok(message) => decode_response(&message),
			Err(err) => {
				warn!(target = "xdp.portal", %path, error = %err, "signal stream error");
				continue;
			}
		};

		if signal_tx.send(InboundSignal { path: path.clone(), reply }).is_err() {
			break;
		}
	}
}

fn decode_response(message: &zbus::Message) -> Result<Response> {
	let body = message.body();
	let (code, mut results): (u32, Results) = body
		.deserialize()
		.map_err(|e| Error::Malformed(format!("Response body: {e}")))?;

	// The typed view drops a handle of unexpected type; read it from the raw dict.
	let (_, raw): (u32, HashMap<String, OwnedValue>) = body
		.deserialize()
		.map_err(|e| Error::Malformed(format!("Response body: {e}")))?;
	if let Some(value) = raw.get(SESSION_HANDLE) {
		let handle = session_handle_from_value(value).ok_or_else(|| {
			Error::Malformed(format!(
				"{SESSION_HANDLE} has type `{}`, expected `s` or `o`",
				value.value_signature()
			))
		})?;
		results.session_handle = Some(handle);
	}

	Ok(Response::new(code, results))
}
