//! Client reconciliation against live broadcasts
//!
//! Drives a `ConversationView` with the events a real connection receives
//! from the service layer, checking that optimistic sends merge with server
//! truth without duplicates.
//!
//! Run with: cargo test -p integration-tests --test reconcile_tests

use integration_tests::{Negotiation, TestHarness};

use haggle_client::ConversationView;
use haggle_core::{MessageKind, ServerEvent};
use haggle_service::{DraftOffer, MessagePipeline, OfferDecision, OfferService};

#[tokio::test]
async fn test_optimistic_hello_is_not_duplicated() {
    let harness = TestHarness::new();
    let pair = Negotiation::unique();
    let conv = pair.create(harness.ctx().store()).await.unwrap();

    let mut conn = harness.connect(pair.buyer);
    harness.ctx().rooms().join(conv.id, &conn.session_id);
    conn.drain();

    let mut view = ConversationView::new(pair.buyer);

    // Optimistic render, then the real send
    view.push_pending("tmp-1", MessageKind::Text, "Hello".to_string());
    MessagePipeline::new(harness.ctx())
        .submit(conv.id, pair.buyer, MessageKind::Text, "Hello".to_string(), None)
        .await
        .unwrap();

    for event in conn.drain() {
        if let ServerEvent::MessageNew { message, .. } = event {
            view.apply_broadcast(message);
        }
    }

    let hellos: Vec<_> = view
        .entries()
        .iter()
        .filter(|e| e.content() == "Hello")
        .collect();
    assert_eq!(hellos.len(), 1);
    assert_eq!(view.pending_count(), 0);
}

#[tokio::test]
async fn test_counterpart_view_appends_and_patches() {
    let harness = TestHarness::new();
    let pair = Negotiation::unique();
    let conv = pair.create(harness.ctx().store()).await.unwrap();

    let mut artist_conn = harness.connect(pair.artist);
    harness.ctx().rooms().join(conv.id, &artist_conn.session_id);
    artist_conn.drain();

    let offer = MessagePipeline::new(harness.ctx())
        .submit(
            conv.id,
            pair.buyer,
            MessageKind::Offer,
            String::new(),
            Some(DraftOffer {
                amount_minor: 60_000,
                item_id: pair.item,
            }),
        )
        .await
        .unwrap();
    OfferService::new(harness.ctx())
        .respond(offer.id, pair.artist, OfferDecision::Accept)
        .await
        .unwrap();

    // The artist's view sees one new message plus an in-place patch
    let mut view = ConversationView::new(pair.artist);
    for event in artist_conn.drain() {
        match event {
            ServerEvent::MessageNew { message, .. } => view.apply_broadcast(message),
            ServerEvent::OfferResolved {
                message_id, status, ..
            } => {
                assert!(view.apply_offer_resolved(message_id, status));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    assert_eq!(view.len(), 1);
    let entry = &view.entries()[0];
    match entry {
        haggle_client::LocalMessage::Confirmed(message) => {
            assert_eq!(
                message.offer.as_ref().unwrap().status,
                haggle_core::OfferStatus::Accepted
            );
        }
        haggle_client::LocalMessage::Pending { .. } => panic!("expected confirmed entry"),
    }
}

#[tokio::test]
async fn test_redelivered_broadcast_is_ignored() {
    let harness = TestHarness::new();
    let pair = Negotiation::unique();
    let conv = pair.create(harness.ctx().store()).await.unwrap();

    let message = MessagePipeline::new(harness.ctx())
        .submit(conv.id, pair.buyer, MessageKind::Text, "once".to_string(), None)
        .await
        .unwrap();

    let mut view = ConversationView::new(pair.artist);
    view.apply_broadcast(message.clone());
    view.apply_broadcast(message);

    assert_eq!(view.len(), 1);
}
