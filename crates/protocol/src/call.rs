//! Outbound method call descriptions.

use crate::names::{CAMERA_INTERFACE, PORTAL_OBJECT_PATH, SCREEN_CAST_INTERFACE, SESSION_INTERFACE, member};
use crate::options::Options;

/// Positional arguments preceding the trailing options, by call shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArgs {
	/// `()`
	None,
	/// `(a{sv})`
	Options(Options),
	/// `(o, a{sv})`
	Session { session: String, options: Options },
	/// `(o, s, a{sv})`
	SessionWindow {
		session: String,
		parent_window: String,
		options: Options,
	},
}

impl CallArgs {
	pub fn options(&self) -> Option<&Options> {
		match self {
			CallArgs::None => None,
			CallArgs::Options(options) | CallArgs::Session { options, .. } | CallArgs::SessionWindow { options, .. } => Some(options),
		}
	}

	pub fn options_mut(&mut self) -> Option<&mut Options> {
		match self {
			CallArgs::None => None,
			CallArgs::Options(options) | CallArgs::Session { options, .. } | CallArgs::SessionWindow { options, .. } => Some(options),
		}
	}

	/// Session handle argument, when the call shape has one.
	pub fn session(&self) -> Option<&str> {
		match self {
			CallArgs::Session { session, .. } | CallArgs::SessionWindow { session, .. } => Some(session),
			_ => None,
		}
	}
}

/// What the method returns synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
	/// A request object path (`o`); the real result arrives as a `Response` signal.
	RequestHandle,
	/// A unix file descriptor (`h`).
	Fd,
	/// Nothing.
	Empty,
}

/// One method call against a portal object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
	pub path: String,
	pub interface: &'static str,
	pub member: &'static str,
	pub args: CallArgs,
	pub reply: ReplyKind,
}

impl MethodCall {
	fn portal(interface: &'static str, member: &'static str, args: CallArgs, reply: ReplyKind) -> Self {
		Self {
			path: PORTAL_OBJECT_PATH.to_string(),
			interface,
			member,
			args,
			reply,
		}
	}

	/// `Camera.AccessCamera(a{sv}) -> o`
	pub fn access_camera() -> Self {
		Self::portal(CAMERA_INTERFACE, member::ACCESS_CAMERA, CallArgs::Options(Options::new()), ReplyKind::RequestHandle)
	}

	/// `Camera.OpenPipeWireRemote(a{sv}) -> h`
	pub fn camera_open_pipewire_remote() -> Self {
		Self::portal(CAMERA_INTERFACE, member::OPEN_PIPEWIRE_REMOTE, CallArgs::Options(Options::new()), ReplyKind::Fd)
	}

	/// `ScreenCast.CreateSession(a{sv}) -> o`
	pub fn create_session(options: Options) -> Self {
		Self::portal(SCREEN_CAST_INTERFACE, member::CREATE_SESSION, CallArgs::Options(options), ReplyKind::RequestHandle)
	}

	/// `ScreenCast.SelectSources(o, a{sv}) -> o`
	pub fn select_sources(session: &str, options: Options) -> Self {
		Self::portal(
			SCREEN_CAST_INTERFACE,
			member::SELECT_SOURCES,
			CallArgs::Session {
				session: session.to_string(),
				options,
			},
			ReplyKind::RequestHandle,
		)
	}

	/// `ScreenCast.Start(o, s, a{sv}) -> o`
	pub fn start(session: &str, parent_window: &str) -> Self {
		Self::portal(
			SCREEN_CAST_INTERFACE,
			member::START,
			CallArgs::SessionWindow {
				session: session.to_string(),
				parent_window: parent_window.to_string(),
				options: Options::new(),
			},
			ReplyKind::RequestHandle,
		)
	}

	/// `ScreenCast.OpenPipeWireRemote(o, a{sv}) -> h`
	pub fn screen_cast_open_pipewire_remote(session: &str) -> Self {
		Self::portal(
			SCREEN_CAST_INTERFACE,
			member::OPEN_PIPEWIRE_REMOTE,
			CallArgs::Session {
				session: session.to_string(),
				options: Options::new(),
			},
			ReplyKind::Fd,
		)
	}

	/// `Session.Close()` on the session object itself.
	pub fn close_session(session: &str) -> Self {
		Self {
			path: session.to_string(),
			interface: SESSION_INTERFACE,
			member: member::CLOSE,
			args: CallArgs::None,
			reply: ReplyKind::Empty,
		}
	}
}
