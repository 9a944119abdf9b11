//! Fake transport for unit testing request correlation and the portal flows.
//!
//! Provides an in-memory bus so the correlator and the flows can be exercised
//! without a session bus or a running portal.
//!
//! # Example
//!
//! ```ignore
//! let (parts, controller) = FakeTransport::new(":1.42");
//! controller.respond("AccessCamera", Response::success(Results::default()));
//!
//! let connection = Arc::new(Connection::new(parts));
//! tokio::spawn({
//!     let conn = Arc::clone(&connection);
//!     async move { conn.run().await }
//! });
//!
//! let response = connection.request(MethodCall::access_camera()).await?;
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use xdp_protocol::{HANDLE_TOKEN, MethodCall, OptionValue, PORTAL_OBJECT_PATH, ReplyKind, Response};

use crate::error::{Error, Result};
use crate::token::sanitize_sender;
use crate::transport::{CallReturn, InboundSignal, Transport, TransportParts};

/// A call observed by the fake bus.
#[derive(Debug, Clone)]
pub struct SentCall {
	pub call: MethodCall,
	/// Whether a `Response` subscription for the call's request path already
	/// existed when the call went out.
	pub subscribed: bool,
}

impl SentCall {
	pub fn member(&self) -> &'static str {
		self.call.member
	}

	pub fn option(&self, key: &str) -> Option<&OptionValue> {
		self.call.args.options().and_then(|options| options.get(key))
	}
}

#[derive(Default)]
struct FakeBus {
	subscriptions: HashSet<String>,
	sent: Vec<SentCall>,
	scripted: HashMap<&'static str, VecDeque<Response>>,
	fds_before_failure: Option<usize>,
	fds_opened: usize,
}

/// In-memory [`Transport`].
pub struct FakeTransport {
	sender: String,
	bus: Arc<Mutex<FakeBus>>,
	signal_tx: mpsc::UnboundedSender<InboundSignal>,
}

impl FakeTransport {
	/// Builds a fake transport for `unique_name` and its controller.
	pub fn new(unique_name: &str) -> (TransportParts, FakeTransportController) {
		let (signal_tx, signal_rx) = mpsc::unbounded_channel();
		let bus = Arc::new(Mutex::new(FakeBus::default()));

		let transport = FakeTransport {
			sender: unique_name.to_string(),
			bus: Arc::clone(&bus),
			signal_tx: signal_tx.clone(),
		};

		let controller = FakeTransportController {
			sender: sanitize_sender(unique_name),
			bus,
			signal_tx,
		};

		let parts = TransportParts {
			transport: Arc::new(transport),
			signal_rx,
		};

		(parts, controller)
	}

	fn request_path(&self, token: &str) -> String {
		format!("{PORTAL_OBJECT_PATH}/request/{}/{token}", sanitize_sender(&self.sender))
	}

	fn handle_request(&self, call: MethodCall) -> Result<CallReturn> {
		let token = call
			.args
			.options()
			.and_then(|options| options.get(HANDLE_TOKEN))
			.and_then(OptionValue::as_str)
			.ok_or_else(|| Error::ProtocolError(format!("{} sent without {HANDLE_TOKEN}", call.member)))?
			.to_string();
		let path = self.request_path(&token);

		let mut bus = self.bus.lock();
		let subscribed = bus.subscriptions.contains(&path);
		let scripted = bus.scripted.get_mut(call.member).and_then(VecDeque::pop_front);
		bus.sent.push(SentCall { call, subscribed });
		drop(bus);

		// Replies emitted before anyone subscribed are lost, as on a real bus.
		if let Some(response) = scripted.filter(|_| subscribed) {
			let _ = self.signal_tx.send(InboundSignal {
				path: path.clone(),
				reply: Ok(response),
			});
		}

		Ok(CallReturn::RequestHandle(path))
	}

	fn handle_fd(&self, call: MethodCall) -> Result<CallReturn> {
		let mut bus = self.bus.lock();
		bus.sent.push(SentCall { call, subscribed: false });

		if bus.fds_before_failure.is_some_and(|limit| bus.fds_opened >= limit) {
			return Err(Error::ProtocolError("org.freedesktop.portal.Error.NotAllowed".to_string()));
		}
		bus.fds_opened += 1;
		drop(bus);

		let file = std::fs::File::open("/dev/null")?;
		Ok(CallReturn::Fd(file.into()))
	}
}

impl Transport for FakeTransport {
	fn unique_name(&self) -> &str {
		&self.sender
	}

	fn subscribe<'a>(&'a self, path: &'a str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
		Box::pin(async move {
			self.bus.lock().subscriptions.insert(path.to_string());
			Ok(())
		})
	}

	fn unsubscribe(&self, path: &str) {
		self.bus.lock().subscriptions.remove(path);
	}

	fn call(&self, call: MethodCall) -> Pin<Box<dyn Future<Output = Result<CallReturn>> + Send + '_>> {
		Box::pin(async move {
			match call.reply {
				ReplyKind::RequestHandle => self.handle_request(call),
				ReplyKind::Fd => self.handle_fd(call),
				ReplyKind::Empty => {
					self.bus.lock().sent.push(SentCall { call, subscribed: false });
					Ok(CallReturn::Empty)
				}
			}
		})
	}
}

/// Controller for scripting replies and inspecting sent calls.
#[derive(Clone)]
pub struct FakeTransportController {
	sender: String,
	bus: Arc<Mutex<FakeBus>>,
	signal_tx: mpsc::UnboundedSender<InboundSignal>,
}

impl FakeTransportController {
	/// Queues the `Response` emitted for the next `member` call.
	///
	/// Members without a queued response never get a reply.
	pub fn respond(&self, member: &'static str, response: Response) {
		self.bus.lock().scripted.entry(member).or_default().push_back(response);
	}

	/// Makes every `OpenPipeWireRemote` call after the first `count` fail.
	pub fn fail_open_remote_after(&self, count: usize) {
		self.bus.lock().fds_before_failure = Some(count);
	}

	/// Emits a raw `Response` signal on `path`, subscribed or not.
	pub fn inject(&self, path: &str, response: Response) {
		let _ = self.signal_tx.send(InboundSignal {
			path: path.to_string(),
			reply: Ok(response),
		});
	}

	/// Emits an undecodable `Response` signal on `path`.
	pub fn inject_malformed(&self, path: &str, reason: &str) {
		let _ = self.signal_tx.send(InboundSignal {
			path: path.to_string(),
			reply: Err(Error::Malformed(reason.to_string())),
		});
	}

	/// Object path the portal would use for request `token`.
	pub fn request_path(&self, token: &str) -> String {
		format!("{PORTAL_OBJECT_PATH}/request/{}/{token}", self.sender)
	}

	pub fn sent(&self) -> Vec<SentCall> {
		self.bus.lock().sent.clone()
	}

	pub fn sent_members(&self) -> Vec<&'static str> {
		self.bus.lock().sent.iter().map(SentCall::member).collect()
	}

	pub fn subscriptions(&self) -> Vec<String> {
		let mut paths: Vec<String> = self.bus.lock().subscriptions.iter().cloned().collect();
		paths.sort();
		paths
	}

	pub fn fds_opened(&self) -> usize {
		self.bus.lock().fds_opened
	}
}
