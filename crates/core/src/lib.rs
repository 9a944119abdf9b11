//! Camera and screen cast access through the desktop portal.
//!
//! The portal grants access to privileged media sources on behalf of
//! sandboxed callers. Getting a PipeWire stream out of it takes a short,
//! strictly ordered conversation:
//!
//! ```text
//! camera:      AccessCamera ─────────────────────────────► OpenPipeWireRemote
//! screen cast: CreateSession ► SelectSources ► Start ────► OpenPipeWireRemote (per stream)
//! ```
//!
//! Each step is a request whose outcome arrives as a `Response` signal; the
//! flows here advance only on success and stop at the first denial or error.
//! The resulting descriptor is handed to a [`Player`].
//!
//! # Example
//!
//! ```ignore
//! use xdp::{GstPlayer, PlayerConfig, Portal};
//!
//! let portal = Portal::connect(None).await?;
//! let mut player = GstPlayer::new(PlayerConfig::camera());
//! portal.camera().negotiate(&mut player).await?;
//! ```

pub mod camera;
pub mod channel;
pub mod error;
pub mod player;
pub mod portal;
pub mod screencast;
pub mod step;

pub use camera::{CameraFlow, CameraPhase};
pub use channel::{Channel, ChannelTarget, open_channel};
pub use error::{Error, Result};
pub use player::{GstPlayer, PipelineExit, Player, PlayerConfig};
pub use portal::Portal;
pub use screencast::{ScreenCastFlow, ScreenCastOptions, ScreenCastPhase, Session, SessionState};
pub use step::Step;

pub use xdp_protocol::{CursorMode, SourceTypes, Stream, StreamProperties};
