//! Screen cast session flow.
//!
//! ```text
//! Idle ─► SessionCreating ─► SourcesSelecting ─► Starting ─► Streaming
//!                │                  │               │            │
//!                └──────────────────┴───────────────┴────────────┴─► Terminated
//! ```
//!
//! The session handle returned by `CreateSession` is threaded unchanged
//! through `SelectSources`, `Start` and every `OpenPipeWireRemote`.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};
use xdp_protocol::{CursorMode, MethodCall, Options, SESSION_HANDLE_TOKEN, SourceTypes, Stream};
use xdp_runtime::{Connection, Token};

use crate::channel::{ChannelTarget, open_channel};
use crate::error::{Error, Result};
use crate::player::Player;
use crate::step::{Step, accept};

/// `SelectSources` preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenCastOptions {
	pub multiple: bool,
	pub types: SourceTypes,
	pub cursor_mode: Option<CursorMode>,
}

impl Default for ScreenCastOptions {
	fn default() -> Self {
		Self {
			multiple: false,
			types: SourceTypes::default(),
			cursor_mode: None,
		}
	}
}

impl ScreenCastOptions {
	fn to_options(self) -> Options {
		let mut options = Options::new().with("multiple", self.multiple).with("types", self.types.bits());
		if let Some(mode) = self.cursor_mode {
			options.insert("cursor_mode", mode.bits());
		}
		options
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	Created,
	SourcesSelected,
	Started,
	Streaming,
	Closed,
}

/// A portal session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
	pub token: Token,
	/// Path derived from the session token.
	pub path: String,
	/// Handle issued by the portal; passed verbatim to every later call.
	pub handle: String,
	pub state: SessionState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenCastPhase {
	Idle,
	SessionCreating,
	SourcesSelecting,
	Starting,
	Streaming,
	Terminated,
}

/// Negotiates a screen cast session and hands every stream to a player.
pub struct ScreenCastFlow {
	connection: Arc<Connection>,
	options: ScreenCastOptions,
	phase: ScreenCastPhase,
	session: Option<Session>,
	streams: Vec<Stream>,
}

impl ScreenCastFlow {
	pub fn new(connection: Arc<Connection>, options: ScreenCastOptions) -> Self {
		Self {
			connection,
			options,
			phase: ScreenCastPhase::Idle,
			session: None,
			streams: Vec::new(),
		}
	}

	pub fn phase(&self) -> ScreenCastPhase {
		self.phase
	}

	pub fn session(&self) -> Option<&Session> {
		self.session.as_ref()
	}

	/// Streams listed by the `Start` reply.
	pub fn streams(&self) -> &[Stream] {
		&self.streams
	}

	/// Runs the session flow and plays every started stream.
	///
	/// Returns the number of streams handed to `player`. Zero is not an
	/// error: the flow stays in [`ScreenCastPhase::Streaming`] with nothing
	/// playing.
	///
	/// If any `OpenPipeWireRemote` fails, streams already handed off are
	/// stopped and no further streams are attempted.
	pub async fn negotiate<P>(&mut self, player: &mut P) -> Result<usize>
	where
		P: Player + ?Sized,
	{
		let result = self.advance(player).await;
		if let Err(err) = &result {
			debug!(target = "xdp.session", error = %err, phase = ?self.phase, "screen cast negotiation failed");
			if self.phase == ScreenCastPhase::Streaming {
				player.stop().await;
			}
			self.phase = ScreenCastPhase::Terminated;
		}
		result
	}

	/// Like [`negotiate`](Self::negotiate), but gives up once `shutdown`
	/// resolves. Returns `Ok(None)` when interrupted; streams already handed
	/// off are stopped and the flow is [`ScreenCastPhase::Terminated`]. The
	/// session stays open until [`close`](Self::close).
	pub async fn negotiate_until<P, S>(&mut self, player: &mut P, shutdown: S) -> Result<Option<usize>>
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
				info!(target = "xdp.session", phase = ?self.phase, "screen cast negotiation interrupted");
				player.stop().await;
				self.terminate();
				Ok(None)
			}
		}
	}

	/// Ends the flow. Idempotent.
	pub fn terminate(&mut self) {
		if self.phase != ScreenCastPhase::Terminated {
			self.transition(ScreenCastPhase::Terminated);
		}
	}

	async fn advance<P>(&mut self, player: &mut P) -> Result<usize>
	where
		P: Player + ?Sized,
	{
		self.transition(ScreenCastPhase::SessionCreating);
		let handle = self.create_session().await?;

		self.transition(ScreenCastPhase::SourcesSelecting);
		let response = self
			.connection
			.request(MethodCall::select_sources(&handle, self.options.to_options()))
			.await?;
		accept(Step::SelectSources, response)?;
		self.set_session_state(SessionState::SourcesSelected);
		info!(target = "xdp.session", "sources selected");

		self.transition(ScreenCastPhase::Starting);
		let response = self.connection.request(MethodCall::start(&handle, "")).await?;
		let results = accept(Step::Start, response)?;
		let streams = results.streams.ok_or(Error::Malformed {
			step: Step::Start,
			key: "streams",
		})?;
		self.set_session_state(SessionState::Started);
		self.streams = streams.clone();

		self.transition(ScreenCastPhase::Streaming);
		if streams.is_empty() {
			warn!(target = "xdp.session", "portal started the session without streams");
		}

		let mut handed_off = 0;
		for stream in &streams {
			let props = &stream.properties;
			info!(
				target = "xdp.session",
				node_id = stream.node_id,
				id = ?props.id,
				source_type = ?props.source_type,
				position = ?props.position,
				size = ?props.size,
				"stream"
			);

			let channel = open_channel(
				&self.connection,
				ChannelTarget::ScreenCast {
					session: &handle,
					node_id: stream.node_id,
				},
			)
			.await?;
			player.play(channel.fd, channel.node_id).await?;
			handed_off += 1;
		}

		self.set_session_state(SessionState::Streaming);
		Ok(handed_off)
	}

	async fn create_session(&mut self) -> Result<String> {
		let (token, path) = self.connection.tokens().next_session();
		debug!(target = "xdp.session", %token, %path, "session token");

		let options = Options::new().with(SESSION_HANDLE_TOKEN, token.to_string());
		let response = self.connection.request(MethodCall::create_session(options)).await?;
		let results = accept(Step::CreateSession, response)?;
		let handle = results.session_handle.ok_or(Error::Malformed {
			step: Step::CreateSession,
			key: "session_handle",
		})?;

		if handle != path {
			debug!(target = "xdp.session", derived = %path, returned = %handle, "session handle differs from derived path");
		}
		info!(target = "xdp.session", session = %handle, "session created");

		self.session = Some(Session {
			token,
			path,
			handle: handle.clone(),
			state: SessionState::Created,
		});
		Ok(handle)
	}

	/// Closes the portal session, if one was created and is still open.
	pub async fn close(&mut self) -> Result<()> {
		let Some(session) = self.session.as_mut().filter(|s| s.state != SessionState::Closed) else {
			return Ok(());
		};
		let handle = session.handle.clone();
		session.state = SessionState::Closed;

		info!(target = "xdp.session", session = %handle, "closing session");
		self.connection.call(MethodCall::close_session(&handle)).await?;
		Ok(())
	}

	fn set_session_state(&mut self, state: SessionState) {
		if let Some(session) = self.session.as_mut() {
			session.state = state;
		}
	}

	fn transition(&mut self, next: ScreenCastPhase) {
		info!(target = "xdp.session", from = ?self.phase, to = ?next, "screen cast");
		self.phase = next;
	}
}
