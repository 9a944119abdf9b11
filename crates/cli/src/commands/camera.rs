use tracing::info;
use xdp::{GstPlayer, Player, Portal};

use super::{interrupted, supervise};
use crate::config::Settings;
use crate::error::Result;

pub(super) async fn run(settings: &Settings) -> Result<()> {
	let portal = Portal::connect(settings.reply_timeout).await?;
	let mut player = GstPlayer::new(settings.player.clone());
	let mut flow = portal.camera();

	let result = match flow.negotiate_until(&mut player, interrupted()).await {
		Ok(Some(())) => {
			supervise(&mut player).await;
			Ok(())
		}
		Ok(None) => {
			info!(target = "xdp.session", "interrupted while negotiating");
			Ok(())
		}
		Err(err) => Err(err.into()),
	};

	player.stop().await;
	flow.terminate();
	result
}
