//! Wire types for the desktop portal protocol.
//!
//! This crate contains the types exchanged with `org.freedesktop.portal.Desktop`
//! over the D-Bus session bus: well-known names, method call descriptions,
//! vardict options, and the decoded `Response` signal payload.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond encoding/decoding and small accessors
//! * 1:1 with protocol: Match the portal interface XML
//! * Stable: Changes only when the portal interfaces change
//!
//! Correlation, sessions and playback are built on top of these types in
//! `xdp-runtime` and `xdp-rs`.

pub mod call;
pub mod names;
pub mod options;
pub mod response;

pub use call::*;
pub use names::*;
pub use options::*;
pub use response::*;
