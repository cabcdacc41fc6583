//! Real-time core integration tests
//!
//! Exercises the service layer end to end over the in-memory store:
//! ordering, presence reference counting, offer resolution races, typing
//! expiry, and validation side-effect isolation.
//!
//! Run with: cargo test -p integration-tests --test realtime_tests

use std::time::Duration;

use integration_tests::{Negotiation, TestHarness};

use haggle_core::store::MessageQuery;
use haggle_core::{ConversationStore, MessageKind, ServerEvent, Snowflake};
use haggle_service::{DraftOffer, MessagePipeline, OfferDecision, OfferService};
use haggle_store::MemoryStore;

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
async fn test_all_room_members_observe_one_order() {
    let harness = TestHarness::new();
    let pair = Negotiation::unique();
    let conv = pair.create(harness.ctx().store()).await.unwrap();

    let mut buyer_conn = harness.connect(pair.buyer);
    let mut artist_conn = harness.connect(pair.artist);
    harness.ctx().rooms().join(conv.id, &buyer_conn.session_id);
    harness.ctx().rooms().join(conv.id, &artist_conn.session_id);
    buyer_conn.drain();
    artist_conn.drain();

    // Both participants send concurrently
    let conv_id = conv.id;
    let mut handles = Vec::new();
    for sender in [pair.buyer, pair.artist] {
        let ctx = harness.ctx().clone();
        handles.push(tokio::spawn(async move {
            for i in 0..10 {
                MessagePipeline::new(&ctx)
                    .submit(
                        conv_id,
                        sender,
                        MessageKind::Text,
                        format!("msg {sender} {i}"),
                        None,
                    )
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let buyer_order = buyer_conn.drain_message_ids();
    let artist_order = artist_conn.drain_message_ids();

    assert_eq!(buyer_order.len(), 20);
    assert_eq!(buyer_order, artist_order);
    assert!(buyer_order.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_store_ids_are_monotonic_per_conversation() {
    let store = MemoryStore::new_shared(0);
    let pair = Negotiation::unique();
    let conv = pair.create(store.as_ref()).await.unwrap();

    let conv_id = conv.id;
    let mut handles = Vec::new();
    for task in 0..4 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..25 {
                store
                    .append(
                        conv_id,
                        haggle_core::store::NewMessage {
                            sender_id: pair.buyer,
                            kind: MessageKind::Text,
                            content: format!("t{task} m{i}"),
                            offer: None,
                        },
                    )
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let page = store
        .messages(
            conv.id,
            MessageQuery {
                before: None,
                limit: 200,
            },
        )
        .await
        .unwrap();

    assert_eq!(page.len(), 100);
    assert!(page.windows(2).all(|w| w[0].id < w[1].id));
}

// ============================================================================
// Presence
// ============================================================================

#[tokio::test]
async fn test_presence_reference_counting_across_two_connections() {
    let harness = TestHarness::new();
    let user = Snowflake::new(1);
    let observer_id = Snowflake::new(2);

    let mut observer = harness.connect(observer_id);

    let first = harness.connect(user);
    let second = harness.connect(user);

    // Only the 0 -> 1 transition produced a delta
    let deltas: Vec<_> = observer
        .drain()
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::PresenceDelta { user_id, .. } if *user_id == user))
        .collect();
    assert_eq!(deltas.len(), 1);

    harness.disconnect(&first);
    assert!(harness.ctx().presence().is_online(user));
    assert!(observer.drain().is_empty());

    harness.disconnect(&second);
    assert!(!harness.ctx().presence().is_online(user));
    match observer.drain().as_slice() {
        [ServerEvent::PresenceDelta { user_id, online }] => {
            assert_eq!(*user_id, user);
            assert!(!online);
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

// ============================================================================
// Rooms
// ============================================================================

#[tokio::test]
async fn test_join_is_idempotent_and_leave_is_safe() {
    let harness = TestHarness::new();
    let pair = Negotiation::unique();
    let conv = pair.create(harness.ctx().store()).await.unwrap();

    let mut conn = harness.connect(pair.buyer);
    assert!(harness.ctx().rooms().join(conv.id, &conn.session_id));
    assert!(!harness.ctx().rooms().join(conv.id, &conn.session_id));
    conn.drain();

    MessagePipeline::new(harness.ctx())
        .submit(conv.id, pair.buyer, MessageKind::Text, "once".into(), None)
        .await
        .unwrap();

    // Double join did not double delivery
    assert_eq!(conn.drain_message_ids().len(), 1);

    // Leaving a room never joined is a no-op
    assert!(!harness.ctx().rooms().leave(Snowflake::new(999), &conn.session_id));
}

// ============================================================================
// Offers
// ============================================================================

#[tokio::test]
async fn test_offer_eligibility_matrix() {
    let harness = TestHarness::new();
    let pair = Negotiation::unique();
    let conv = pair.create(harness.ctx().store()).await.unwrap();
    let pipeline = MessagePipeline::new(harness.ctx());

    // Buyer offering on the linked item succeeds
    let message = pipeline
        .submit(
            conv.id,
            pair.buyer,
            MessageKind::Offer,
            String::new(),
            Some(DraftOffer {
                amount_minor: 50_000,
                item_id: pair.item,
            }),
        )
        .await
        .unwrap();
    assert!(message.offer.is_some());

    // The verified artist cannot initiate an offer
    let err = pipeline
        .submit(
            conv.id,
            pair.artist,
            MessageKind::Offer,
            String::new(),
            Some(DraftOffer {
                amount_minor: 50_000,
                item_id: pair.item,
            }),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INELIGIBLE_OFFER_SENDER");

    // An item the artist does not own is not a valid target
    let err = pipeline
        .submit(
            conv.id,
            pair.buyer,
            MessageKind::Offer,
            String::new(),
            Some(DraftOffer {
                amount_minor: 50_000,
                item_id: Snowflake::new(424_242),
            }),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_OFFER_TARGET");
}

#[tokio::test]
async fn test_concurrent_offer_responses_resolve_once() {
    let harness = TestHarness::new();
    let pair = Negotiation::unique();
    let conv = pair.create(harness.ctx().store()).await.unwrap();

    let offer = MessagePipeline::new(harness.ctx())
        .submit(
            conv.id,
            pair.buyer,
            MessageKind::Offer,
            String::new(),
            Some(DraftOffer {
                amount_minor: 75_000,
                item_id: pair.item,
            }),
        )
        .await
        .unwrap();

    let offer_id = offer.id;
    let mut handles = Vec::new();
    for i in 0..8 {
        let ctx = harness.ctx().clone();
        let decision = if i % 2 == 0 {
            OfferDecision::Accept
        } else {
            OfferDecision::Reject
        };
        handles.push(tokio::spawn(async move {
            OfferService::new(&ctx)
                .respond(offer_id, pair.artist, decision)
                .await
        }));
    }

    let mut winner = None;
    let mut losers = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(message) => {
                assert!(winner.is_none(), "two responses succeeded");
                winner = Some(message);
            }
            Err(e) => {
                assert_eq!(e.code(), "OFFER_ALREADY_RESOLVED");
                losers += 1;
            }
        }
    }
    assert_eq!(losers, 7);

    // The stored status matches the single winner's decision
    let stored = harness
        .ctx()
        .store()
        .find_message(offer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        stored.offer.unwrap().status,
        winner.unwrap().offer.unwrap().status
    );
}

// ============================================================================
// Typing
// ============================================================================

#[tokio::test]
async fn test_typing_flag_expires_via_sweep() {
    let harness = TestHarness::with_typing_ttl(Duration::from_millis(40));
    let pair = Negotiation::unique();
    let conv = pair.create(harness.ctx().store()).await.unwrap();

    let mut artist_conn = harness.connect(pair.artist);
    harness.ctx().rooms().join(conv.id, &artist_conn.session_id);

    harness.ctx().typing().start(conv.id, pair.buyer);
    assert_eq!(harness.ctx().typing().active_typers(conv.id), vec![pair.buyer]);

    tokio::time::sleep(Duration::from_millis(60)).await;

    // The sweep clears the entry and the gateway loop broadcasts the stop
    let expired = harness.ctx().typing().sweep();
    assert_eq!(expired, vec![(conv.id, pair.buyer)]);
    for (conversation_id, user_id) in expired {
        harness.ctx().rooms().broadcast(
            conversation_id,
            &ServerEvent::TypingUpdate {
                conversation_id,
                user_id,
                is_typing: false,
            },
        );
    }

    assert!(harness.ctx().typing().active_typers(conv.id).is_empty());
    match artist_conn.drain().as_slice() {
        [ServerEvent::TypingUpdate {
            user_id, is_typing, ..
        }] => {
            assert_eq!(*user_id, pair.buyer);
            assert!(!is_typing);
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

// ============================================================================
// Validation isolation
// ============================================================================

#[tokio::test]
async fn test_rejected_frames_leave_no_partial_effects() {
    let harness = TestHarness::new();
    let pair = Negotiation::unique();
    let conv = pair.create(harness.ctx().store()).await.unwrap();

    let mut conn = harness.connect(pair.buyer);
    harness.ctx().rooms().join(conv.id, &conn.session_id);
    conn.drain();

    let outsider = Snowflake::new(31_337);
    let err = MessagePipeline::new(harness.ctx())
        .submit(conv.id, outsider, MessageKind::Text, "intrusion".into(), None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_PARTICIPANT");

    // Nothing persisted, nothing broadcast, counters untouched
    let page = harness
        .ctx()
        .store()
        .messages(conv.id, MessageQuery { before: None, limit: 50 })
        .await
        .unwrap();
    assert!(page.is_empty());
    assert!(conn.drain().is_empty());

    let stored = harness
        .ctx()
        .store()
        .conversation(conv.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.unread_for(pair.buyer), 0);
    assert!(stored.last_message.is_none());
}

// ============================================================================
// Read receipts
// ============================================================================

#[tokio::test]
async fn test_mark_read_zeroes_counter_and_broadcasts() {
    let harness = TestHarness::new();
    let pair = Negotiation::unique();
    let conv = pair.create(harness.ctx().store()).await.unwrap();

    let mut buyer_conn = harness.connect(pair.buyer);
    harness.ctx().rooms().join(conv.id, &buyer_conn.session_id);

    let pipeline = MessagePipeline::new(harness.ctx());
    pipeline
        .submit(conv.id, pair.buyer, MessageKind::Text, "ping".into(), None)
        .await
        .unwrap();

    let stored = harness
        .ctx()
        .store()
        .conversation(conv.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.unread_for(pair.artist), 1);

    pipeline.mark_read(conv.id, pair.artist).await.unwrap();

    let stored = harness
        .ctx()
        .store()
        .conversation(conv.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.unread_for(pair.artist), 0);

    let read_events: Vec<_> = buyer_conn
        .drain()
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::MessageRead { user_id, .. } if *user_id == pair.artist))
        .collect();
    assert_eq!(read_events.len(), 1);
}
