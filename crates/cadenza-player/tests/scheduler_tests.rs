// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the per-guild playback scheduler.

use std::sync::Arc;
use std::time::Duration;

use cadenza_core::{ChannelId, GuildId, PlaybackState};
use cadenza_test_utils::{MOCK_VOICE_CHANNEL, REPLY_CHANNEL, TestHarness, eventually};

const GUILD: GuildId = GuildId(1);

fn queries(snapshot: Vec<cadenza_core::Request>) -> Vec<String> {
    snapshot.into_iter().map(|r| r.query).collect()
}

/// Playback order equals enqueue order.
#[tokio::test]
async fn items_play_in_enqueue_order() {
    let harness = TestHarness::builder().with_instant_completion().build();
    let sink = harness.sink(GUILD);

    for query in ["a", "b", "c", "d"] {
        harness.enqueue(GUILD, query).await.unwrap();
    }

    assert!(eventually(|| async { sink.start_count().await == 4 }).await);
    assert_eq!(sink.started_titles().await, vec!["a", "b", "c", "d"]);
    assert!(
        eventually(|| async { harness.registry.state(GUILD).await == PlaybackState::Idle }).await
    );
    assert!(harness.surface.live().await.is_empty());
}

/// N concurrent enqueues to a fresh guild spawn exactly one consumer.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_enqueues_spawn_one_consumer() {
    let harness = Arc::new(TestHarness::builder().with_gated_resolver().build());

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let harness = Arc::clone(&harness);
            tokio::spawn(async move { harness.enqueue(GUILD, &format!("track-{i}")).await })
        })
        .collect();

    let mut started = 0;
    for task in tasks {
        if task.await.unwrap().unwrap().started_consumer {
            started += 1;
        }
    }

    assert_eq!(started, 1);
    assert_eq!(harness.registry.session_count(), 1);
    let session = harness.registry.get(GUILD).unwrap();
    assert_eq!(session.consumers_spawned(), 1);
    assert!(session.is_consumer_running().await);

    harness.registry.stop(GUILD).await;
}

/// After stop the queue is empty, no view is live and the next enqueue starts over.
#[tokio::test]
async fn stop_clears_everything_and_next_enqueue_starts_fresh() {
    let harness = TestHarness::builder()
        .with_disconnect_on_stop(false)
        .build();
    let sink = harness.sink(GUILD);

    for query in ["a", "b", "c"] {
        harness.enqueue(GUILD, query).await.unwrap();
    }
    assert!(
        eventually(|| async { harness.registry.state(GUILD).await == PlaybackState::Playing })
            .await
    );
    let old_session = harness.registry.get(GUILD).unwrap();

    assert!(harness.registry.stop(GUILD).await);

    assert!(harness.registry.snapshot_queue(GUILD).await.is_empty());
    assert!(harness.registry.now_playing(GUILD).await.is_none());
    assert!(harness.surface.live().await.is_empty());
    assert!(!old_session.is_consumer_running().await);
    assert_eq!(harness.registry.session_count(), 0);
    assert!(!sink.active_now());
    assert_eq!(sink.disconnect_count(), 0);

    let enqueued = harness.enqueue(GUILD, "d").await.unwrap();
    assert!(enqueued.started_consumer);
    let new_session = harness.registry.get(GUILD).unwrap();
    assert!(!Arc::ptr_eq(&old_session, &new_session));
    assert!(eventually(|| async { sink.started_titles().await == vec!["a", "d"] }).await);
    assert!(harness.registry.snapshot_queue(GUILD).await.is_empty());

    harness.registry.stop(GUILD).await;
}

/// With default settings stop also leaves the voice channel.
#[tokio::test]
async fn stop_disconnects_by_default() {
    let harness = TestHarness::new();
    let sink = harness.sink(GUILD);

    harness.enqueue(GUILD, "a").await.unwrap();
    assert!(eventually(|| async { sink.start_count().await == 1 }).await);

    assert!(harness.registry.stop(GUILD).await);
    assert_eq!(sink.disconnect_count(), 1);
    assert!(harness.surface.live().await.is_empty());
    assert_eq!(harness.registry.session_count(), 0);
}

/// Stop racing a publish in flight waits for it and still leaves no view behind.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_during_publish_leaves_no_view() {
    let harness = Arc::new(TestHarness::builder().with_gated_surface().build());
    let sink = harness.sink(GUILD);

    harness.enqueue(GUILD, "a").await.unwrap();
    assert!(eventually(|| async { harness.surface.publish_attempts() == 1 }).await);

    let stopper = {
        let harness = Arc::clone(&harness);
        tokio::spawn(async move { harness.registry.stop(GUILD).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!stopper.is_finished(), "stop returned while a publish was in flight");

    harness.surface.release_publishes(1);
    assert!(stopper.await.unwrap());

    assert_eq!(harness.surface.published_titles().await, vec!["a"]);
    assert_eq!(harness.surface.retired().await.len(), 1);
    assert!(harness.surface.live().await.is_empty());
    assert_eq!(sink.start_count().await, 0);
}

/// A drained session stays registered and is reused by the next request.
#[tokio::test]
async fn drained_session_is_reused() {
    let harness = TestHarness::builder().with_instant_completion().build();
    let sink = harness.sink(GUILD);

    harness.enqueue(GUILD, "a").await.unwrap();
    let session = harness.registry.get(GUILD).unwrap();
    assert!(eventually(|| async { !session.is_consumer_running().await }).await);
    assert_eq!(harness.registry.session_count(), 1);

    let enqueued = harness.enqueue(GUILD, "b").await.unwrap();
    assert!(enqueued.started_consumer);
    assert!(Arc::ptr_eq(&session, &harness.registry.get(GUILD).unwrap()));
    assert!(eventually(|| async { sink.start_count().await == 2 }).await);
    assert_eq!(session.consumers_spawned(), 2);
}

/// A stopped session refuses new requests; the registry routes them elsewhere.
#[tokio::test]
async fn retired_session_rejects_enqueue() {
    let harness = TestHarness::new();
    harness.enqueue(GUILD, "a").await.unwrap();
    let session = harness.registry.get(GUILD).unwrap();

    assert!(
        session
            .teardown(cadenza_player::TeardownReason::Stop)
            .await
    );
    let err = session
        .enqueue(TestHarness::request("b"))
        .await
        .unwrap_err();
    assert!(matches!(err, cadenza_core::CadenzaError::SessionRetired));

    // The stale entry is still registered; enqueue must replace it.
    let enqueued = harness.enqueue(GUILD, "c").await.unwrap();
    assert!(enqueued.started_consumer);
    assert!(!Arc::ptr_eq(&session, &harness.registry.get(GUILD).unwrap()));
}

/// Skip advances to the next item without resolving anything twice.
#[tokio::test]
async fn skip_advances_without_re_resolving() {
    let harness = TestHarness::new();
    let sink = harness.sink(GUILD);

    assert!(!harness.registry.skip(GUILD).await);

    harness.enqueue(GUILD, "a").await.unwrap();
    harness.enqueue(GUILD, "b").await.unwrap();
    assert!(
        eventually(|| async { harness.registry.state(GUILD).await == PlaybackState::Playing })
            .await
    );
    assert_eq!(sink.started_titles().await, vec!["a"]);

    assert!(harness.registry.skip(GUILD).await);
    assert!(eventually(|| async { sink.started_titles().await == vec!["a", "b"] }).await);
    assert_eq!(harness.resolver.calls().await, vec!["a", "b"]);
    assert_eq!(harness.surface.live().await.len(), 1);

    harness.registry.stop(GUILD).await;
}

/// Pause, resume and toggle only act on a playing item.
#[tokio::test]
async fn pause_and_resume_only_while_playing() {
    let harness = TestHarness::new();
    let sink = harness.sink(GUILD);

    assert!(!harness.registry.pause(GUILD).await);
    assert_eq!(harness.registry.toggle_pause(GUILD).await, None);

    harness.enqueue(GUILD, "a").await.unwrap();
    assert!(
        eventually(|| async { harness.registry.state(GUILD).await == PlaybackState::Playing })
            .await
    );

    assert!(harness.registry.pause(GUILD).await);
    assert!(!harness.registry.pause(GUILD).await);
    assert!(harness.registry.resume(GUILD).await);
    assert_eq!(harness.registry.toggle_pause(GUILD).await, Some(true));
    assert_eq!(harness.registry.toggle_pause(GUILD).await, Some(false));
    assert!(sink.active_now());

    harness.registry.stop(GUILD).await;
}

/// Auto-leave fires exactly once when the last human leaves the bot's channel.
#[tokio::test]
async fn auto_leave_fires_once() {
    let harness = TestHarness::new();
    let sink = harness.sink(GUILD);

    harness.enqueue(GUILD, "a").await.unwrap();
    harness.enqueue(GUILD, "b").await.unwrap();
    assert!(
        eventually(|| async { harness.registry.state(GUILD).await == PlaybackState::Playing })
            .await
    );

    let registry = &harness.registry;
    assert!(!registry.on_membership_change(GUILD, MOCK_VOICE_CHANNEL, 1).await);
    assert!(!registry.on_membership_change(GUILD, ChannelId(1), 0).await);
    assert!(registry.on_membership_change(GUILD, MOCK_VOICE_CHANNEL, 0).await);
    assert!(!registry.on_membership_change(GUILD, MOCK_VOICE_CHANNEL, 0).await);

    assert_eq!(sink.disconnect_count(), 1);
    assert_eq!(registry.session_count(), 0);
    assert!(registry.snapshot_queue(GUILD).await.is_empty());
    assert!(harness.surface.live().await.is_empty());
    assert_eq!(sink.started_titles().await, vec!["a"]);
}

/// A resolves, B fails: one start, then Idle once A completes.
#[tokio::test]
async fn failed_resolution_is_dropped_and_session_goes_idle() {
    let harness = TestHarness::builder().with_failure_notices().build();
    harness.resolver.fail_on("b").await;
    let sink = harness.sink(GUILD);

    harness.enqueue(GUILD, "a").await.unwrap();
    harness.enqueue(GUILD, "b").await.unwrap();
    assert!(eventually(|| async { sink.start_count().await == 1 }).await);

    sink.finish();
    assert!(
        eventually(|| async { harness.registry.state(GUILD).await == PlaybackState::Idle }).await
    );

    assert_eq!(sink.started_titles().await, vec!["a"]);
    assert_eq!(harness.resolver.calls().await, vec!["a", "b"]);
    let session = harness.registry.get(GUILD).unwrap();
    assert!(!session.is_consumer_running().await);
    assert!(harness.surface.live().await.is_empty());

    let notices = harness.surface.notices().await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].0, REPLY_CHANNEL);
    assert!(notices[0].1.contains("`b`"));
}

/// Stop while the resolver is still working: the sink never starts.
#[tokio::test]
async fn stop_before_resolution_never_starts_sink() {
    let harness = TestHarness::builder().with_gated_resolver().build();
    let sink = harness.sink(GUILD);

    harness.enqueue(GUILD, "a").await.unwrap();
    assert!(eventually(|| async { harness.resolver.call_count().await == 1 }).await);
    assert_eq!(harness.registry.state(GUILD).await, PlaybackState::Resolving);

    assert!(harness.registry.stop(GUILD).await);
    harness.resolver.release(1);
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(sink.start_count().await, 0);
    assert!(harness.surface.published_titles().await.is_empty());
    assert!(harness.registry.snapshot_queue(GUILD).await.is_empty());
}

/// Snapshot after three enqueues and one dequeue returns the other two in order.
#[tokio::test]
async fn snapshot_excludes_the_playing_item() {
    let harness = TestHarness::new();
    let sink = harness.sink(GUILD);

    for query in ["a", "b", "c"] {
        harness.enqueue(GUILD, query).await.unwrap();
    }
    assert!(eventually(|| async { sink.start_count().await == 1 }).await);
    assert_eq!(
        queries(harness.registry.snapshot_queue(GUILD).await),
        vec!["b", "c"]
    );

    sink.finish();
    assert!(eventually(|| async { sink.start_count().await == 2 }).await);
    assert_eq!(queries(harness.registry.snapshot_queue(GUILD).await), vec!["c"]);
    assert_eq!(
        harness.registry.now_playing(GUILD).await.unwrap().item.title,
        "b"
    );

    harness.registry.stop(GUILD).await;
}

/// A dropped voice connection abandons the queue instead of spinning on it.
#[tokio::test]
async fn lost_connection_abandons_pending_requests() {
    let harness = TestHarness::new();
    let sink = harness.sink(GUILD);
    sink.drop_connection().await;

    harness.enqueue(GUILD, "a").await.unwrap();
    harness.enqueue(GUILD, "b").await.unwrap();

    let session = harness.registry.get(GUILD).unwrap();
    assert!(eventually(|| async { !session.is_consumer_running().await }).await);
    assert!(harness.registry.snapshot_queue(GUILD).await.is_empty());
    assert_eq!(sink.start_count().await, 0);
    assert!(harness.surface.live().await.is_empty());
    assert!(harness.surface.published_titles().await.is_empty());
    assert!(harness.resolver.calls().await.is_empty());
}

/// A connection that drops between items stops the session before the next resolve.
#[tokio::test]
async fn connection_lost_mid_queue_skips_resolution() {
    let harness = TestHarness::new();
    let sink = harness.sink(GUILD);

    harness.enqueue(GUILD, "a").await.unwrap();
    harness.enqueue(GUILD, "b").await.unwrap();
    assert!(eventually(|| async { sink.start_count().await == 1 }).await);

    sink.drop_connection().await;

    let session = harness.registry.get(GUILD).unwrap();
    assert!(eventually(|| async { !session.is_consumer_running().await }).await);
    assert_eq!(harness.resolver.calls().await, vec!["a"]);
    assert_eq!(harness.surface.published_titles().await, vec!["a"]);
    assert!(harness.surface.live().await.is_empty());
    assert!(harness.registry.snapshot_queue(GUILD).await.is_empty());
}

/// A rejected item is skipped and the next one plays.
#[tokio::test]
async fn rejected_item_is_skipped() {
    let harness = TestHarness::new();
    let sink = harness.sink(GUILD);
    sink.reject("a").await;

    harness.enqueue(GUILD, "a").await.unwrap();
    harness.enqueue(GUILD, "b").await.unwrap();

    assert!(eventually(|| async { sink.started_titles().await == vec!["b"] }).await);
    assert_eq!(harness.surface.live().await.len(), 1);

    harness.registry.stop(GUILD).await;
}

/// Guilds are independent.
#[tokio::test]
async fn guilds_do_not_share_sessions() {
    let harness = TestHarness::new();
    let other = GuildId(2);

    harness.enqueue(GUILD, "a").await.unwrap();
    harness.enqueue(other, "x").await.unwrap();
    assert!(eventually(|| async { harness.sink(other).start_count().await == 1 }).await);

    assert!(harness.registry.stop(GUILD).await);
    assert_eq!(harness.registry.session_count(), 1);
    assert_eq!(
        harness.registry.now_playing(other).await.unwrap().item.title,
        "x"
    );

    harness.registry.stop(other).await;
}

/// Leave without a session still disconnects a connected sink.
#[tokio::test]
async fn leave_without_session_disconnects() {
    let harness = TestHarness::new();
    let sink = harness.sink(GUILD);

    assert!(harness.registry.leave(GUILD).await);
    assert_eq!(sink.disconnect_count(), 1);
    assert!(!harness.registry.leave(GUILD).await);
}

/// Shutdown tears down every guild.
#[tokio::test]
async fn shutdown_tears_down_all_sessions() {
    let harness = TestHarness::new();
    for guild in 1..=3 {
        harness.enqueue(GuildId(guild), "a").await.unwrap();
    }
    assert!(
        eventually(|| async {
            harness.registry.playing_count().await == 3
        })
        .await
    );

    let drained =
        cadenza_player::drain_sessions(&harness.registry, Duration::from_secs(2)).await;
    assert!(drained);
    assert_eq!(harness.registry.session_count(), 0);
    assert!(harness.surface.live().await.is_empty());
    for guild in 1..=3 {
        assert_eq!(harness.sink(GuildId(guild)).disconnect_count(), 1);
    }
}
