use std::time::Duration;

/// Errors raised by the transport and the request correlator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("D-Bus error: {0}")]
	Bus(#[from] zbus::Error),

	#[error("D-Bus value error: {0}")]
	Variant(#[from] zvariant::Error),

	#[error("Protocol error: {0}")]
	ProtocolError(String),

	#[error("Malformed reply: {0}")]
	Malformed(String),

	#[error("Connection closed before a reply arrived")]
	ChannelClosed,

	#[error("No {member} reply after {timeout:?}")]
	Timeout { member: &'static str, timeout: Duration },

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
