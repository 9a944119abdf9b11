// Screen cast session flow against the in-memory portal.

mod common;

use std::collections::HashSet;
use std::time::Duration;

use common::{RecordingPlayer, portal};
use xdp::{Error, ScreenCastOptions, ScreenCastPhase, SessionState, Step};
use xdp_protocol::{CallArgs, Response, Results, Stream};
use xdp_runtime::FakeTransportController;

fn session_created(handle: &str) -> Response {
	Response::success(Results {
		session_handle: Some(handle.to_string()),
		streams: None,
	})
}

fn started(node_ids: &[u32]) -> Response {
	Response::success(Results {
		session_handle: None,
		streams: Some(node_ids.iter().copied().map(Stream::new).collect()),
	})
}

fn script_grant(controller: &FakeTransportController, handle: &str, node_ids: &[u32]) {
	controller.respond("CreateSession", session_created(handle));
	controller.respond("SelectSources", Response::success(Results::default()));
	controller.respond("Start", started(node_ids));
}

#[tokio::test]
async fn create_session_sends_both_tokens() {
	let (portal, controller) = portal();
	script_grant(&controller, "/s1", &[]);

	portal
		.screen_cast(ScreenCastOptions::default())
		.negotiate(&mut RecordingPlayer::default())
		.await
		.unwrap();

	let create = &controller.sent()[0];
	assert_eq!(create.member(), "CreateSession");
	assert!(create.subscribed);
	assert_eq!(create.option("handle_token").and_then(|v| v.as_str()), Some("u1"));
	assert_eq!(create.option("session_handle_token").and_then(|v| v.as_str()), Some("u1"));
}

#[tokio::test]
async fn session_handle_is_propagated_unchanged() {
	let (portal, controller) = portal();
	script_grant(&controller, "/s1", &[42]);

	let mut flow = portal.screen_cast(ScreenCastOptions::default());
	flow.negotiate(&mut RecordingPlayer::default()).await.unwrap();

	let sent = controller.sent();
	assert_eq!(
		controller.sent_members(),
		["CreateSession", "SelectSources", "Start", "OpenPipeWireRemote"]
	);

	let select = &sent[1];
	assert_eq!(select.call.args.session(), Some("/s1"));
	assert_eq!(select.option("multiple").and_then(|v| v.as_bool()), Some(false));
	assert_eq!(select.option("types").and_then(|v| v.as_u32()), Some(3));

	let start = &sent[2];
	assert!(matches!(
		start.call.args,
		CallArgs::SessionWindow { ref session, ref parent_window, .. } if session == "/s1" && parent_window.is_empty()
	));

	assert_eq!(sent[3].call.args.session(), Some("/s1"));

	let session = flow.session().expect("session should be recorded");
	assert_eq!(session.handle, "/s1");
	assert_eq!(session.path, "/org/freedesktop/portal/desktop/session/1_42/u1");
	assert_eq!(session.state, SessionState::Streaming);
}

#[tokio::test]
async fn every_request_gets_a_fresh_token() {
	let (portal, controller) = portal();
	script_grant(&controller, "/s1", &[42]);

	portal
		.screen_cast(ScreenCastOptions::default())
		.negotiate(&mut RecordingPlayer::default())
		.await
		.unwrap();

	let tokens: Vec<String> = controller
		.sent()
		.iter()
		.filter_map(|sent| sent.option("handle_token").and_then(|v| v.as_str()).map(str::to_string))
		.collect();
	assert_eq!(tokens, ["u1", "u2", "u3"]);
	assert!(controller.sent().iter().take(3).all(|sent| sent.subscribed));
}

#[tokio::test]
async fn two_streams_play_twice_with_distinct_descriptors() {
	let (portal, controller) = portal();
	script_grant(&controller, "/s1", &[42, 43]);

	let mut flow = portal.screen_cast(ScreenCastOptions::default());
	let mut player = RecordingPlayer::default();
	let handed_off = flow.negotiate(&mut player).await.unwrap();

	assert_eq!(handed_off, 2);
	assert_eq!(player.node_ids(), [Some(42), Some(43)]);
	let fds: HashSet<_> = player.raw_fds().into_iter().collect();
	assert_eq!(fds.len(), 2);
	assert_eq!(flow.streams().len(), 2);
	assert_eq!(flow.phase(), ScreenCastPhase::Streaming);
}

#[tokio::test]
async fn empty_stream_list_keeps_streaming_with_nothing_playing() {
	let (portal, controller) = portal();
	script_grant(&controller, "/s1", &[]);

	let mut flow = portal.screen_cast(ScreenCastOptions::default());
	let mut player = RecordingPlayer::default();
	let handed_off = flow.negotiate(&mut player).await.unwrap();

	assert_eq!(handed_off, 0);
	assert!(player.played.is_empty());
	assert_eq!(player.stops, 0);
	assert_eq!(flow.phase(), ScreenCastPhase::Streaming);
	assert_eq!(controller.fds_opened(), 0);
}

#[tokio::test]
async fn cancelled_source_selection_terminates() {
	let (portal, controller) = portal();
	controller.respond("CreateSession", session_created("/s1"));
	controller.respond("SelectSources", Response::new(1, Results::default()));

	let mut flow = portal.screen_cast(ScreenCastOptions::default());
	let result = flow.negotiate(&mut RecordingPlayer::default()).await;

	assert!(matches!(
		result,
		Err(Error::Denied {
			step: Step::SelectSources,
			code: 1
		})
	));
	assert_eq!(flow.phase(), ScreenCastPhase::Terminated);
	assert_eq!(controller.sent_members(), ["CreateSession", "SelectSources"]);
}

#[tokio::test]
async fn failed_start_terminates() {
	let (portal, controller) = portal();
	controller.respond("CreateSession", session_created("/s1"));
	controller.respond("SelectSources", Response::success(Results::default()));
	controller.respond("Start", Response::new(2, Results::default()));

	let result = portal
		.screen_cast(ScreenCastOptions::default())
		.negotiate(&mut RecordingPlayer::default())
		.await;

	assert!(matches!(result, Err(Error::Failed { step: Step::Start, code: 2 })));
	assert_eq!(controller.fds_opened(), 0);
}

#[tokio::test]
async fn missing_session_handle_is_malformed() {
	let (portal, controller) = portal();
	controller.respond("CreateSession", Response::success(Results::default()));

	let mut flow = portal.screen_cast(ScreenCastOptions::default());
	let result = flow.negotiate(&mut RecordingPlayer::default()).await;

	assert!(matches!(
		result,
		Err(Error::Malformed {
			step: Step::CreateSession,
			key: "session_handle"
		})
	));
	assert!(flow.session().is_none());
	assert_eq!(controller.sent_members(), ["CreateSession"]);
}

#[tokio::test]
async fn missing_streams_is_malformed() {
	let (portal, controller) = portal();
	controller.respond("CreateSession", session_created("/s1"));
	controller.respond("SelectSources", Response::success(Results::default()));
	controller.respond("Start", Response::success(Results::default()));

	let result = portal
		.screen_cast(ScreenCastOptions::default())
		.negotiate(&mut RecordingPlayer::default())
		.await;

	assert!(matches!(result, Err(Error::Malformed { step: Step::Start, key: "streams" })));
}

#[tokio::test]
async fn refused_remote_mid_start_aborts_all_streams() {
	let (portal, controller) = portal();
	script_grant(&controller, "/s1", &[42, 43, 44]);
	controller.fail_open_remote_after(1);

	let mut flow = portal.screen_cast(ScreenCastOptions::default());
	let mut player = RecordingPlayer::default();
	let result = flow.negotiate(&mut player).await;

	assert!(matches!(result, Err(Error::ChannelFailure { node_id: Some(43), .. })));
	assert_eq!(player.stops, 1);
	assert!(player.played.is_empty());
	assert_eq!(flow.phase(), ScreenCastPhase::Terminated);
	// Node 44 is never attempted.
	assert_eq!(controller.sent_members().iter().filter(|m| **m == "OpenPipeWireRemote").count(), 2);
}

#[tokio::test]
async fn close_sends_session_close_once() {
	let (portal, controller) = portal();
	script_grant(&controller, "/s1", &[42]);

	let mut flow = portal.screen_cast(ScreenCastOptions::default());
	flow.negotiate(&mut RecordingPlayer::default()).await.unwrap();
	flow.close().await.unwrap();
	flow.close().await.unwrap();

	let closes: Vec<_> = controller.sent().into_iter().filter(|sent| sent.member() == "Close").collect();
	assert_eq!(closes.len(), 1);
	assert_eq!(closes[0].call.path, "/s1");
	assert_eq!(flow.session().map(|s| s.state), Some(SessionState::Closed));
}

#[tokio::test]
async fn close_without_session_is_noop() {
	let (portal, controller) = portal();

	let mut flow = portal.screen_cast(ScreenCastOptions::default());
	flow.close().await.unwrap();

	assert!(controller.sent().is_empty());
}

#[tokio::test]
async fn unanswered_select_sources_stays_pending() {
	let (portal, controller) = portal();
	controller.respond("CreateSession", session_created("/s1"));

	let mut flow = portal.screen_cast(ScreenCastOptions::default());
	let mut player = RecordingPlayer::default();
	let outcome = tokio::time::timeout(Duration::from_millis(50), flow.negotiate(&mut player)).await;

	assert!(outcome.is_err(), "negotiation should still be waiting");
	assert_eq!(controller.sent_members(), ["CreateSession", "SelectSources"]);
	assert_eq!(portal.connection().pending().await, 1);
}

#[tokio::test]
async fn interrupt_mid_session_terminates_and_still_closes() {
	let (portal, controller) = portal();
	controller.respond("CreateSession", session_created("/s1"));

	let mut flow = portal.screen_cast(ScreenCastOptions::default());
	let mut player = RecordingPlayer::default();
	let outcome = flow
		.negotiate_until(&mut player, tokio::time::sleep(Duration::from_millis(20)))
		.await
		.unwrap();

	assert_eq!(outcome, None);
	assert_eq!(flow.phase(), ScreenCastPhase::Terminated);
	assert_eq!(player.stops, 1);

	flow.close().await.unwrap();
	assert_eq!(controller.sent_members(), ["CreateSession", "SelectSources", "Close"]);
}

#[tokio::test]
async fn negotiate_until_reports_stream_count() {
	let (portal, controller) = portal();
	script_grant(&controller, "/s1", &[42, 43]);

	let mut flow = portal.screen_cast(ScreenCastOptions::default());
	let outcome = flow
		.negotiate_until(&mut RecordingPlayer::default(), std::future::pending())
		.await
		.unwrap();

	assert_eq!(outcome, Some(2));
	flow.terminate();
	assert_eq!(flow.phase(), ScreenCastPhase::Terminated);
}
