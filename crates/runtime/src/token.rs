//! Request and session tokens.
//!
//! The portal derives the object path of every request and session from the
//! caller's unique bus name and a caller-chosen token:
//!
//! ```text
//! /org/freedesktop/portal/desktop/request/<sender>/<token>
//! /org/freedesktop/portal/desktop/session/<sender>/<token>
//! ```
//!
//! where `<sender>` is the unique name without its leading `:` and with every
//! `.` replaced by `_`. Knowing the path up front lets us subscribe to the
//! `Response` signal before the call is even sent.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use xdp_protocol::PORTAL_OBJECT_PATH;

/// Token kind; each kind has its own counter and path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
	Request,
	Session,
}

impl Category {
	pub fn as_str(self) -> &'static str {
		match self {
			Category::Request => "request",
			Category::Session => "session",
		}
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A process-unique token, rendered as `u<N>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u32);

impl Token {
	pub fn value(self) -> u32 {
		self.0
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "u{}", self.0)
	}
}

/// Strips the leading `:` of a unique name and replaces `.` with `_`.
pub fn sanitize_sender(unique_name: &str) -> String {
	unique_name.strip_prefix(':').unwrap_or(unique_name).replace('.', "_")
}

/// Builds the object path for `token` under `category` for `sender`.
///
/// `sender` must already be sanitized.
pub fn derive_path(sender: &str, category: Category, token: Token) -> String {
	format!("{PORTAL_OBJECT_PATH}/{category}/{sender}/{token}")
}

/// Monotonic token source bound to one bus connection.
#[derive(Debug)]
pub struct TokenAllocator {
	sender: String,
	last_request: AtomicU32,
	last_session: AtomicU32,
}

impl TokenAllocator {
	pub fn new(unique_name: &str) -> Self {
		Self {
			sender: sanitize_sender(unique_name),
			last_request: AtomicU32::new(0),
			last_session: AtomicU32::new(0),
		}
	}

	/// Sanitized sender segment used in every derived path.
	pub fn sender(&self) -> &str {
		&self.sender
	}

	pub fn next_request_token(&self) -> Token {
		Token(self.last_request.fetch_add(1, Ordering::SeqCst) + 1)
	}

	pub fn next_session_token(&self) -> Token {
		Token(self.last_session.fetch_add(1, Ordering::SeqCst) + 1)
	}

	pub fn derive_path(&self, category: Category, token: Token) -> String {
		derive_path(&self.sender, category, token)
	}

	/// Allocates a request token together with its path.
	pub fn next_request(&self) -> (Token, String) {
		let token = self.next_request_token();
		(token, self.derive_path(Category::Request, token))
	}

	/// Allocates a session token together with its path.
	pub fn next_session(&self) -> (Token, String) {
		let token = self.next_session_token();
		(token, self.derive_path(Category::Session, token))
	}
}
