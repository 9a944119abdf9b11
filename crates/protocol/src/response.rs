//! Decoded `org.freedesktop.portal.Request::Response` signal payload.
//!
//! The signal carries `(u response, a{sv} results)`. Only the result keys the
//! camera and screen cast flows consume are decoded; unknown keys are skipped.

use serde::{Deserialize, Serialize};
use zvariant::{DeserializeDict, SerializeDict, Type, Value};

/// The interaction ended successfully.
pub const RESPONSE_SUCCESS: u32 = 0;
/// The user cancelled the interaction.
pub const RESPONSE_CANCELLED: u32 = 1;
/// The interaction was ended some other way.
pub const RESPONSE_OTHER: u32 = 2;

/// Descriptive attributes of a stream, as listed by the screen cast portal.
#[derive(Debug, Clone, Default, PartialEq, Eq, DeserializeDict, SerializeDict, Type)]
#[zvariant(signature = "dict")]
pub struct StreamProperties {
	pub id: Option<String>,
	pub position: Option<(i32, i32)>,
	pub size: Option<(i32, i32)>,
	pub source_type: Option<u32>,
	pub mapping_id: Option<String>,
}

/// One capturable source exposed after `Start`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Type)]
pub struct Stream {
	pub node_id: u32,
	pub properties: StreamProperties,
}

impl Stream {
	pub fn new(node_id: u32) -> Self {
		Self {
			node_id,
			properties: StreamProperties::default(),
		}
	}
}

/// Result vardict of a `Response` signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, DeserializeDict, SerializeDict, Type)]
#[zvariant(signature = "dict")]
pub struct Results {
	pub session_handle: Option<String>,
	pub streams: Option<Vec<Stream>>,
}

/// Reads a session handle sent either as a string (`s`) or as an object path
/// (`o`). Portal versions disagree on which one they send.
pub fn session_handle_from_value(value: &Value<'_>) -> Option<String> {
	match value {
		Value::Str(handle) => Some(handle.as_str().to_string()),
		Value::ObjectPath(handle) => Some(handle.as_str().to_string()),
		_ => None,
	}
}

/// A `Response` signal as delivered to the request's caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
	pub code: u32,
	pub results: Results,
}

impl Response {
	pub fn new(code: u32, results: Results) -> Self {
		Self { code, results }
	}

	pub fn success(results: Results) -> Self {
		Self::new(RESPONSE_SUCCESS, results)
	}

	pub fn outcome(self) -> Outcome {
		match self.code {
			RESPONSE_SUCCESS => Outcome::Success(self.results),
			RESPONSE_CANCELLED => Outcome::Denied(self.code),
			code => Outcome::Error(code),
		}
	}
}

/// Tagged result of a portal interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
	Success(Results),
	/// The user (or a policy acting for them) refused.
	Denied(u32),
	/// The interaction ended for another reason.
	Error(u32),
}
