//! Well-known bus names, object paths, interfaces and members.

/// Bus name owned by the portal frontend.
pub const PORTAL_BUS_NAME: &str = "org.freedesktop.portal.Desktop";

/// Object implementing every portal interface.
pub const PORTAL_OBJECT_PATH: &str = "/org/freedesktop/portal/desktop";

pub const REQUEST_INTERFACE: &str = "org.freedesktop.portal.Request";
pub const SESSION_INTERFACE: &str = "org.freedesktop.portal.Session";
pub const CAMERA_INTERFACE: &str = "org.freedesktop.portal.Camera";
pub const SCREEN_CAST_INTERFACE: &str = "org.freedesktop.portal.ScreenCast";

/// Signal emitted on a request object once the user or policy decided.
pub const RESPONSE_SIGNAL: &str = "Response";

/// Option key carrying the caller-chosen request token.
pub const HANDLE_TOKEN: &str = "handle_token";

/// Option key carrying the caller-chosen session token.
pub const SESSION_HANDLE_TOKEN: &str = "session_handle_token";

/// Result key carrying the portal-issued session handle.
pub const SESSION_HANDLE: &str = "session_handle";

/// Method names used by the camera and screen cast flows.
pub mod member {
	pub const ACCESS_CAMERA: &str = "AccessCamera";
	pub const CREATE_SESSION: &str = "CreateSession";
	pub const SELECT_SOURCES: &str = "SelectSources";
	pub const START: &str = "Start";
	pub const OPEN_PIPEWIRE_REMOTE: &str = "OpenPipeWireRemote";
	pub const CLOSE: &str = "Close";
}
