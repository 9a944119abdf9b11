use xdp::Portal;

use crate::config::Settings;
use crate::error::Result;

/// Prints where the portal will place this connection's first request and session.
pub(super) async fn run(settings: &Settings) -> Result<()> {
	let portal = Portal::connect(settings.reply_timeout).await?;
	let connection = portal.connection();
	let tokens = connection.tokens();

	let (request_token, request_path) = tokens.next_request();
	let (session_token, session_path) = tokens.next_session();

	println!("unique name  {}", connection.unique_name());
	println!("sender       {}", tokens.sender());
	println!("request      {request_token}  {request_path}");
	println!("session      {session_token}  {session_path}");
	Ok(())
}
