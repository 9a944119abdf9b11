//! Runtime plumbing for talking to the desktop portal.
//!
//! * [`token`]: request/session tokens and the object paths derived from them
//! * [`transport`]: the bus seam, with a zbus implementation and an in-memory fake
//! * [`connection`]: correlation of outbound requests with their `Response` signals
//! * [`process`]: helpers for handing descriptors to, and stopping, child processes

pub mod connection;
pub mod error;
pub mod fake_transport;
pub mod process;
pub mod token;
pub mod transport;

pub use connection::Connection;
pub use error::{Error, Result};
pub use fake_transport::{FakeTransport, FakeTransportController, SentCall};
pub use token::{Category, Token, TokenAllocator};
pub use transport::{CallReturn, DbusTransport, InboundSignal, Transport, TransportParts};
