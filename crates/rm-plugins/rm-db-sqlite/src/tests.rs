use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use rm_core::models::*;
use rm_core::traits::*;
use rm_core::workflow::disputes::DisputeDraft;
use rm_core::workflow::{DisputeDesk, MessageCenter, OrderDesk, ReviewGate};

use crate::SqliteMarketRepo;

async fn repo() -> Arc<SqliteMarketRepo> {
    Arc::new(SqliteMarketRepo::new("sqlite::memory:").await.unwrap())
}

fn actor(name: &str, role: Role) -> Actor {
    Actor { id: Uuid::now_v7(), name: name.to_string(), role }
}

fn sample_order(buyer_id: Uuid, vendor_id: Uuid) -> Order {
    let now = Utc::now();
    Order {
        id: Uuid::now_v7(),
        buyer_id,
        vendor_id,
        items: vec![LineItem {
            product_id: Uuid::now_v7(),
            title: "Linen tablecloth".into(),
            unit_price_cents: 2500,
            quantity: 1,
        }],
        subtotal_cents: 2500,
        delivery_cents: 300,
        total_cents: 2800,
        payment_method: "card".into(),
        city: "Riga".into(),
        address: "Brivibas 1".into(),
        comment: Some("leave at the door".into()),
        status: OrderStatus::Pending,
        timeline: vec![TimelineEntry {
            status: OrderStatus::Pending,
            actor_id: buyer_id,
            actor_name: "Alice".into(),
            at: now,
            note: None,
        }],
        created_at: now,
    }
}

fn sample_dispute(order: &Order) -> Dispute {
    let now = Utc::now();
    Dispute {
        id: Uuid::now_v7(),
        order_id: order.id,
        product_id: Some(order.items[0].product_id),
        initiator_id: order.buyer_id,
        respondent_id: order.vendor_id,
        reason: DisputeReason::DamagedItem,
        description: "arrived torn".into(),
        amount_requested_cents: 2500,
        status: DisputeStatus::Opened,
        evidence: vec!["photo-1".into(), "photo-2".into()],
        created_at: now,
        updated_at: now,
    }
}

fn sample_conversation(participants: Vec<Uuid>) -> Conversation {
    let now = Utc::now();
    Conversation {
        id: Uuid::now_v7(),
        kind: ConversationKind::PreSales,
        participants,
        context: json!({ "product_id": "p1" }),
        last_message_at: now,
        created_at: now,
    }
}

#[tokio::test]
async fn test_create_and_get_order() {
    let repo = repo().await;
    let order = sample_order(Uuid::now_v7(), Uuid::now_v7());

    repo.create_order(order.clone()).await.expect("Failed to create order");

    let loaded = repo.get_order(order.id).await.unwrap().expect("order missing");
    assert_eq!(loaded.total_cents, 2800);
    assert_eq!(loaded.items.len(), 1);
    assert_eq!(loaded.items[0].title, "Linen tablecloth");
    assert_eq!(loaded.status, OrderStatus::Pending);
    assert_eq!(loaded.timeline.len(), 1);
    assert_eq!(loaded.comment.as_deref(), Some("leave at the door"));
}

#[tokio::test]
async fn test_update_status_appends_timeline() {
    let repo = repo().await;
    let order = sample_order(Uuid::now_v7(), Uuid::now_v7());
    repo.create_order(order.clone()).await.unwrap();

    let entry = TimelineEntry {
        status: OrderStatus::Confirmed,
        actor_id: order.vendor_id,
        actor_name: "Viktor".into(),
        at: Utc::now(),
        note: Some("packing".into()),
    };
    repo.update_status(order.id, OrderStatus::Confirmed, entry).await.unwrap();

    let loaded = repo.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, OrderStatus::Confirmed);
    assert_eq!(loaded.timeline.len(), 2);
    assert_eq!(loaded.timeline[1].status, OrderStatus::Confirmed);
    assert_eq!(loaded.timeline[1].note.as_deref(), Some("packing"));
}

#[tokio::test]
async fn test_active_dispute_query_tracks_status() {
    let repo = repo().await;
    let order = sample_order(Uuid::now_v7(), Uuid::now_v7());
    repo.create_order(order.clone()).await.unwrap();

    let dispute = sample_dispute(&order);
    repo.create_dispute(dispute.clone()).await.unwrap();
    assert_eq!(repo.active_for_order(order.id).await.unwrap().len(), 1);

    repo.set_status(dispute.id, DisputeStatus::Escalated).await.unwrap();
    assert_eq!(repo.active_for_order(order.id).await.unwrap().len(), 1);

    repo.set_status(dispute.id, DisputeStatus::ResolvedDismissed).await.unwrap();
    assert!(repo.active_for_order(order.id).await.unwrap().is_empty());

    let loaded = repo.get_dispute(dispute.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, DisputeStatus::ResolvedDismissed);
    assert_eq!(loaded.evidence, vec!["photo-1", "photo-2"]);
}

#[tokio::test]
async fn test_conversation_membership_queries() {
    let repo = repo().await;
    let (a, b, outsider) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
    let conversation = sample_conversation(vec![a, b]);
    repo.create_conversation(conversation.clone()).await.unwrap();

    let found = repo
        .find_by_kind_for_participant(ConversationKind::PreSales, a)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].context, json!({ "product_id": "p1" }));

    assert!(repo
        .find_by_kind_for_participant(ConversationKind::PreSales, outsider)
        .await
        .unwrap()
        .is_empty());
    assert!(repo
        .find_by_kind_for_participant(ConversationKind::Dispute, a)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_message_insert_bumps_parent_in_same_tx() {
    let repo = repo().await;
    let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
    let conversation = sample_conversation(vec![a, b]);
    repo.create_conversation(conversation.clone()).await.unwrap();

    let message = Message {
        id: Uuid::now_v7(),
        conversation_id: conversation.id,
        sender_id: a,
        body: "still available?".into(),
        attachments: vec![],
        read_by: vec![a],
        created_at: Utc::now(),
    };
    repo.create_message(message.clone()).await.unwrap();

    let parent = repo.get_conversation(conversation.id).await.unwrap().unwrap();
    assert_eq!(parent.last_message_at, message.created_at);

    // A message aimed at a missing conversation must not persist.
    let orphan = Message { id: Uuid::now_v7(), conversation_id: Uuid::now_v7(), ..message };
    assert!(repo.create_message(orphan.clone()).await.is_err());
    assert!(repo.get_message(orphan.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_messages_listed_in_creation_order() {
    let repo = repo().await;
    let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
    let conversation = sample_conversation(vec![a, b]);
    repo.create_conversation(conversation.clone()).await.unwrap();

    let mut ids = Vec::new();
    for body in ["one", "two", "three"] {
        let message = Message {
            id: Uuid::now_v7(),
            conversation_id: conversation.id,
            sender_id: a,
            body: body.into(),
            attachments: vec![],
            read_by: vec![a],
            created_at: Utc::now(),
        };
        ids.push(message.id);
        repo.create_message(message).await.unwrap();
    }

    let listed = repo.list_messages(conversation.id).await.unwrap();
    assert_eq!(listed.iter().map(|m| m.id).collect::<Vec<_>>(), ids);
}

#[tokio::test]
async fn test_mark_read_is_idempotent() {
    let repo = repo().await;
    let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
    let conversation = sample_conversation(vec![a, b]);
    repo.create_conversation(conversation.clone()).await.unwrap();

    let message = Message {
        id: Uuid::now_v7(),
        conversation_id: conversation.id,
        sender_id: a,
        body: "ping".into(),
        attachments: vec![],
        read_by: vec![a],
        created_at: Utc::now(),
    };
    repo.create_message(message.clone()).await.unwrap();

    repo.mark_read(message.id, b).await.unwrap();
    repo.mark_read(message.id, b).await.unwrap();

    let loaded = repo.get_message(message.id).await.unwrap().unwrap();
    assert_eq!(loaded.read_by, vec![a, b]);
}

#[tokio::test]
async fn test_review_uniqueness_and_summary() {
    let repo = repo().await;
    let (author, product) = (Uuid::now_v7(), Uuid::now_v7());

    let review = Review {
        id: Uuid::now_v7(),
        product_id: product,
        order_id: Uuid::now_v7(),
        author_id: author,
        rating: 4,
        body: "solid".into(),
        status: ReviewStatus::Published,
        created_at: Utc::now(),
    };
    repo.create_review(review.clone()).await.unwrap();

    // Same (author, product) violates the UNIQUE constraint.
    let duplicate = Review { id: Uuid::now_v7(), ..review.clone() };
    assert!(repo.create_review(duplicate).await.is_err());

    let other_author = Review {
        id: Uuid::now_v7(),
        author_id: Uuid::now_v7(),
        rating: 2,
        ..review
    };
    repo.create_review(other_author).await.unwrap();

    let summary = repo.rating_summary(product).await.unwrap();
    assert_eq!(summary.count, 2);
    assert!((summary.average - 3.0).abs() < f64::EPSILON);

    assert!(repo
        .find_by_author_and_product(author, product)
        .await
        .unwrap()
        .is_some());
}

/// End-to-end over the real store: checkout, dispute lock, resolution,
/// delivery, review.
#[tokio::test]
async fn test_workflow_round_trip_over_sqlite() {
    let store = repo().await;
    let order_repo: Arc<dyn OrderRepo> = store.clone();
    let dispute_repo: Arc<dyn DisputeRepo> = store.clone();
    let conversation_repo: Arc<dyn ConversationRepo> = store.clone();
    let review_repo: Arc<dyn ReviewRepo> = store.clone();

    let messages = Arc::new(MessageCenter::new(conversation_repo));
    let orders = OrderDesk::new(order_repo.clone(), dispute_repo.clone());
    let disputes = DisputeDesk::new(dispute_repo, order_repo.clone(), messages);
    let reviews = ReviewGate::new(review_repo, order_repo);

    let buyer = actor("Alice", Role::Buyer);
    let vendor = actor("Viktor", Role::Vendor);

    let order = orders
        .place_order(
            &buyer,
            OrderDraft {
                vendor_id: vendor.id,
                items: vec![LineItem {
                    product_id: Uuid::now_v7(),
                    title: "Oak shelf".into(),
                    unit_price_cents: 1000,
                    quantity: 1,
                }],
                delivery_cents: 200,
                payment_method: "card".into(),
                city: "Riga".into(),
                address: "Brivibas 1".into(),
                comment: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(order.total_cents, 1200);

    let dispute = disputes
        .open_dispute(
            &buyer,
            DisputeDraft {
                order_id: order.id,
                product_id: None,
                reason: DisputeReason::NotDelivered,
                description: "no tracking number yet".into(),
                amount_requested_cents: 0,
                evidence: vec![],
            },
        )
        .await
        .unwrap();

    // Locked while the dispute is active.
    assert!(orders
        .request_status_change(order.id, OrderStatus::Confirmed, &vendor, None)
        .await
        .is_err());

    disputes
        .resolve_dispute(dispute.id, &vendor, DisputeResolution::Dismissed)
        .await
        .unwrap();

    for status in [OrderStatus::Confirmed, OrderStatus::Shipped, OrderStatus::Delivered] {
        orders
            .request_status_change(order.id, status, &vendor, None)
            .await
            .unwrap();
    }

    let product = order.items[0].product_id;
    let review = reviews
        .create_review(&buyer, product, order.id, 5, "worth the wait".into())
        .await
        .unwrap();
    assert_eq!(review.status, ReviewStatus::Published);

    let summary = reviews.product_rating(product).await.unwrap();
    assert_eq!(summary.count, 1);
}
