use tracing::{info, warn};
use xdp::{GstPlayer, Player, Portal, ScreenCastFlow, ScreenCastOptions};

use super::{interrupted, supervise};
use crate::config::Settings;
use crate::error::Result;

pub(super) async fn run(settings: &Settings, options: ScreenCastOptions) -> Result<()> {
	let portal = Portal::connect(settings.reply_timeout).await?;
	let mut player = GstPlayer::new(settings.player.clone());
	let mut flow = portal.screen_cast(options);

	let result = match flow.negotiate_until(&mut player, interrupted()).await {
		Ok(Some(streams)) => {
			info!(target = "xdp.session", streams, "streaming");
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
	close(&mut flow).await;
	result
}

async fn close(flow: &mut ScreenCastFlow) {
	if let Err(err) = flow.close().await {
		warn!(target = "xdp.session", error = %err, "failed to close session");
	}
}
