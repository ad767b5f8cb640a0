//! End-to-end engine tests
//!
//! Drives the controllers, reconciliation listener, and side-effect
//! dispatcher together against scripted collaborators.

use std::sync::Arc;

use feed_core::{
    CommentLikeState, GatewayError, NotificationKind, XpReason, XP_POST_LIKED,
};
use feed_engine::{CreateCommentRequest, EditCommentRequest, EngineError};
use integration_tests::fixtures::{reaction_state, update};
use integration_tests::helpers::TestEngine;

// ============================================================================
// Toggle semantics
// ============================================================================

#[tokio::test]
async fn toggle_twice_returns_to_original_state() {
    let engine = TestEngine::new();
    let initial = reaction_state(&[("👍", 3)], None);
    let controller = engine.reaction_controller(initial.clone());

    controller.toggle_reaction("🎉").await.unwrap();
    let settled = controller.toggle_reaction("🎉").await.unwrap();

    assert_eq!(settled.viewer_reaction, initial.viewer_reaction);
    assert_eq!(settled.total_count, initial.total_count);
    assert_eq!(settled.count_of("👍"), initial.count_of("👍"));
    assert_eq!(settled.count_of("🎉"), 0);
}

#[tokio::test]
async fn new_reaction_scenario() {
    let engine = TestEngine::new();
    let controller = engine.reaction_controller(reaction_state(&[("👍", 3)], None));

    let state = controller.toggle_reaction("🎉").await.unwrap();

    assert_eq!(state.count_of("👍"), 3);
    assert_eq!(state.count_of("🎉"), 1);
    assert_eq!(state.viewer_reaction.as_deref(), Some("🎉"));
    assert_eq!(state.total_count, 4);

    // Confirmed success on someone else's post: exactly one XP award and
    // one notification.
    let awards = engine.xp.awards();
    assert_eq!(awards.len(), 1);
    assert_eq!(awards[0], (engine.owner, XP_POST_LIKED, XpReason::PostLiked));

    let delivered = engine.notifications.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].kind, NotificationKind::PostLiked);
    assert_eq!(delivered[0].to_user_id, engine.owner);
    assert_eq!(delivered[0].actor_id, engine.viewer);
}

#[tokio::test]
async fn reaction_swap_scenario() {
    let engine = TestEngine::new();
    let controller =
        engine.reaction_controller(reaction_state(&[("👍", 3), ("🎉", 1)], Some("🎉")));

    let state = controller.toggle_reaction("❤️").await.unwrap();

    assert_eq!(state.count_of("👍"), 3);
    assert_eq!(state.count_of("🎉"), 0);
    assert_eq!(state.count_of("❤️"), 1);
    assert_eq!(state.viewer_reaction.as_deref(), Some("❤️"));
    // A swap is not a net add.
    assert_eq!(state.total_count, 4);
}

// ============================================================================
// Rollback
// ============================================================================

#[tokio::test]
async fn remote_failure_rolls_back_to_exact_snapshot() {
    let engine = TestEngine::new();
    let initial = reaction_state(&[("👍", 0)], None);
    let controller = engine.reaction_controller(initial.clone());
    engine.gateway.fail_next(GatewayError::Timeout);

    let err = controller.toggle_reaction("👍").await.unwrap_err();

    assert!(err.is_retryable());
    // Bit-for-bit equal, not merely close: floors were not double-applied.
    assert_eq!(controller.state(), initial);
    // Failed primary mutation fires no side effects.
    assert!(engine.xp.awards().is_empty());
    assert!(engine.notifications.delivered().is_empty());
}

#[tokio::test]
async fn rollback_preserves_zero_floored_counters() {
    let engine = TestEngine::new();
    let initial = reaction_state(&[("👍", 0), ("🎉", 2)], None);
    let controller = engine.reaction_controller(initial.clone());
    engine.gateway.fail_next(GatewayError::Transport("reset".to_owned()));

    controller.toggle_reaction("🎉").await.unwrap_err();

    assert_eq!(controller.state(), initial);
}

// ============================================================================
// Single flight
// ============================================================================

#[tokio::test]
async fn comment_like_is_single_flight() {
    let engine = TestEngine::new();
    let author = engine.owner;
    let comment = engine.seed_comment(author, "great shot", 0);
    let controller = engine.comment_controller();
    engine.gateway.hold();

    let first = {
        let controller = Arc::clone(&controller);
        let comment_id = comment.id;
        tokio::spawn(async move { controller.toggle_like(comment_id).await })
    };
    engine.gateway.wait_for_call().await;

    // Second intent before the first resolves: no-op on the unchanged
    // speculative state, and exactly one gateway invocation.
    let state = controller.toggle_like(comment.id).await.unwrap();
    assert_eq!(
        state,
        CommentLikeState {
            liked: true,
            count: 1
        }
    );
    assert_eq!(engine.gateway.like_calls(), 1);

    engine.gateway.release();
    first.await.unwrap().unwrap();
    assert_eq!(engine.gateway.like_calls(), 1);
}

// ============================================================================
// Reconciliation
// ============================================================================

#[tokio::test]
async fn push_while_settled_becomes_baseline() {
    let engine = TestEngine::new();
    let controller = engine.reaction_controller(reaction_state(&[("👍", 1)], None));
    engine.watch(&controller).await;

    engine.feed.push(update(engine.post, &[("👍", 12)], 12));
    engine.feed.drained().await;

    assert_eq!(controller.state().count_of("👍"), 12);
    assert_eq!(controller.state().total_count, 12);
}

#[tokio::test]
async fn push_during_pending_mutation_is_buffered() {
    let engine = TestEngine::new();
    let controller = engine.reaction_controller(reaction_state(&[("👍", 3)], None));
    engine.watch(&controller).await;
    engine.gateway.hold();

    let pending = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.toggle_reaction("🎉").await })
    };
    engine.gateway.wait_for_call().await;

    // A push arrives while the toggle is outstanding.
    engine.feed.push(update(engine.post, &[("👍", 4)], 4));
    engine.feed.drained().await;

    // Not applied yet: the speculative state is still on screen.
    let speculative = controller.state();
    assert_eq!(speculative.count_of("👍"), 3);
    assert_eq!(speculative.count_of("🎉"), 1);

    engine.gateway.release();
    let settled = pending.await.unwrap().unwrap();

    // After settling, the push is the new baseline and the viewer's own
    // completed action is still visible.
    assert_eq!(settled.count_of("👍"), 4);
    assert_eq!(settled.count_of("🎉"), 1);
    assert_eq!(settled.viewer_reaction.as_deref(), Some("🎉"));
    assert_eq!(settled.total_count, 5);
}

#[tokio::test]
async fn unwatch_releases_the_subscription() {
    let engine = TestEngine::new();
    let controller = engine.reaction_controller(reaction_state(&[], None));
    engine.watch(&controller).await;
    assert!(engine.feed.is_subscribed(engine.post));

    engine.listener.unwatch(engine.post).await.unwrap();
    assert!(!engine.feed.is_subscribed(engine.post));

    // Updates after unwatch no longer reach the controller.
    engine.feed.push(update(engine.post, &[("👍", 7)], 7));
    engine.feed.drained().await;
    assert_eq!(controller.state().count_of("👍"), 0);
}

// ============================================================================
// Side effects
// ============================================================================

#[tokio::test]
async fn xp_failure_is_invisible_and_does_not_block_notification() {
    let engine = TestEngine::with_failing_xp();
    let controller = engine.reaction_controller(reaction_state(&[("👍", 3)], None));

    let state = controller.toggle_reaction("🎉").await.unwrap();

    // The primary action is complete and correct from the user's view.
    assert_eq!(state.count_of("🎉"), 1);
    assert_eq!(state.viewer_reaction.as_deref(), Some("🎉"));

    // XP failed silently; the notification was still attempted.
    assert!(engine.xp.awards().is_empty());
    assert_eq!(engine.notifications.delivered().len(), 1);
}

#[tokio::test]
async fn own_post_reaction_fires_no_side_effects() {
    let engine = TestEngine::new();
    let controller = engine.own_post_controller(reaction_state(&[], None));

    controller.toggle_reaction("👍").await.unwrap();

    assert!(engine.xp.awards().is_empty());
    assert!(engine.notifications.delivered().is_empty());
}

// ============================================================================
// Comment flows
// ============================================================================

#[tokio::test]
async fn comment_create_reply_edit_delete_flow() {
    let engine = TestEngine::new();
    let parent_author = engine.owner;
    let parent = engine.seed_comment(parent_author, "original take", 0);
    let controller = engine.comment_controller();

    // Reply: prefix stripped, structured linkage, both notifications.
    let reply = controller
        .create_comment(CreateCommentRequest::reply(
            "@sam totally agree",
            parent.id,
            "sam",
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply.content, "totally agree");
    assert_eq!(reply.reply_to_comment_id, Some(parent.id));

    let kinds: Vec<_> = engine
        .notifications
        .delivered()
        .iter()
        .map(|n| n.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::PostCommented,
            NotificationKind::CommentReplied
        ]
    );

    // Edit own reply, then confirm the canonical list reflects it.
    let edited = controller
        .edit_comment(
            reply.id,
            EditCommentRequest {
                content: "totally agree!".to_owned(),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert!(edited.is_edited());
    assert!(controller
        .comments()
        .iter()
        .any(|c| c.id == reply.id && c.content == "totally agree!"));

    // Delete it; thread shrinks back to the parent.
    assert!(controller.delete_comment(reply.id).await.unwrap());
    let remaining = controller.comments();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, parent.id);
}

#[tokio::test]
async fn comment_create_failure_keeps_input_retryable() {
    let engine = TestEngine::new();
    engine.seed_comment(engine.owner, "existing", 0);
    let controller = engine.comment_controller();
    engine.gateway.fail_next(GatewayError::Rejected {
        status: 422,
        message: "too spicy".to_owned(),
    });

    let err = controller
        .create_comment(CreateCommentRequest::new("my hot take"))
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(controller.comments().len(), 1);
    assert!(engine.notifications.delivered().is_empty());
}

#[tokio::test]
async fn edit_of_foreign_comment_is_fatal() {
    let engine = TestEngine::new();
    let comment = engine.seed_comment(engine.owner, "not yours", 0);
    let controller = engine.comment_controller();
    engine.gateway.fail_next(GatewayError::Unauthorized);

    let err = controller
        .edit_comment(
            comment.id,
            EditCommentRequest {
                content: "hijacked".to_owned(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Authorization(_)));
    assert!(!err.is_retryable());
    assert_eq!(controller.comments()[0].content, "not yours");
}

#[tokio::test]
async fn comment_unlike_deducts_xp_without_notification() {
    let engine = TestEngine::new();
    let author = engine.owner;
    let comment = engine.seed_comment(author, "well said", 0);
    let controller = engine.comment_controller();

    controller.toggle_like(comment.id).await.unwrap();
    controller.toggle_like(comment.id).await.unwrap();

    assert_eq!(engine.xp.awards().len(), 1);
    let deductions = engine.xp.deductions();
    assert_eq!(deductions.len(), 1);
    assert_eq!(deductions[0].0, author);
    // Only the like produced a notification.
    assert_eq!(engine.notifications.delivered().len(), 1);
}
