mod camera;
mod paths;
mod screencast;

use std::future::Future;

use anyhow::Context;
use tracing::{info, warn};
use xdp::{PipelineExit, Player};

use crate::cli::{Cli, Commands};
use crate::config::{ConfigFile, Settings, screen_cast_options};

pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
	let file = ConfigFile::load(cli.config.as_deref())?;

	match &cli.command {
		Commands::Camera => {
			let settings = Settings::resolve(&cli, &file, xdp::PlayerConfig::camera());
			camera::run(&settings).await.context("camera")?;
		}
		Commands::Screencast(args) => {
			let settings = Settings::resolve(&cli, &file, xdp::PlayerConfig::screen_cast());
			let options = screen_cast_options(args, &file.screencast);
			screencast::run(&settings, options).await.context("screen cast")?;
		}
		Commands::Paths => {
			let settings = Settings::resolve(&cli, &file, xdp::PlayerConfig::camera());
			paths::run(&settings).await?;
		}
	}

	Ok(())
}

/// Why a streaming command stopped.
#[derive(Debug)]
pub(crate) enum Ending {
	Interrupted,
	PipelineExited(PipelineExit),
}

/// Resolves on Ctrl-C.
pub(crate) async fn interrupted() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		warn!(target = "xdp", error = %err, "cannot listen for Ctrl-C");
		std::future::pending::<()>().await;
	}
}

/// Waits for Ctrl-C or for any pipeline to exit, whichever comes first.
pub(crate) async fn supervise<P>(player: &mut P) -> Ending
where
	P: Player + ?Sized,
{
	supervise_until(player, interrupted()).await
}

async fn supervise_until<P, S>(player: &mut P, shutdown: S) -> Ending
where
	P: Player + ?Sized,
	S: Future<Output = ()>,
{
	let ending = tokio::select! {
		() = shutdown => Ending::Interrupted,
		exit = player.ended() => Ending::PipelineExited(exit),
	};

	match &ending {
		Ending::Interrupted => info!(target = "xdp.pipeline", "interrupted"),
		Ending::PipelineExited(exit) if exit.success() => {
			info!(target = "xdp.pipeline", node_id = ?exit.node_id, "stream ended")
		}
		Ending::PipelineExited(exit) => {
			warn!(target = "xdp.pipeline", node_id = ?exit.node_id, status = ?exit.status, "pipeline exited abnormally")
		}
	}
	ending
}

#[cfg(test)]
mod tests {
	use std::os::fd::OwnedFd;
	use std::time::Duration;

	use async_trait::async_trait;

	use super::*;

	/// Player whose single pipeline exits on its first `ended()` poll, if `exits` is set.
	#[derive(Default)]
	struct ScriptedPlayer {
		exits: bool,
	}

	#[async_trait]
	impl Player for ScriptedPlayer {
		async fn play(&mut self, _fd: OwnedFd, _node_id: Option<u32>) -> xdp::Result<()> {
			Ok(())
		}

		async fn ended(&mut self) -> PipelineExit {
			if !self.exits {
				std::future::pending::<()>().await;
			}
			PipelineExit {
				node_id: Some(42),
				status: None,
			}
		}

		async fn stop(&mut self) {}

		fn active(&self) -> usize {
			usize::from(self.exits)
		}
	}

	#[tokio::test]
	async fn pipeline_exit_ends_supervision() {
		let mut player = ScriptedPlayer { exits: true };

		let ending = supervise_until(&mut player, std::future::pending()).await;

		match ending {
			Ending::PipelineExited(exit) => {
				assert_eq!(exit.node_id, Some(42));
				assert!(!exit.success());
			}
			other => panic!("expected pipeline exit, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn shutdown_ends_supervision_while_playing() {
		let mut player = ScriptedPlayer::default();

		let ending = supervise_until(&mut player, tokio::time::sleep(Duration::from_millis(10))).await;

		assert!(matches!(ending, Ending::Interrupted));
	}
}
