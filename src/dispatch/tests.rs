use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

use super::event::{
    MedicineNotificationPayload, PharmacyMedicineStockPayload, PharmacyPayload,
};
use super::{Dispatcher, DomainEvent, InMemoryWatchlistIndex, WatchlistIndex};
use crate::auth::Identity;
use crate::codec::{self, Envelope};
use crate::registry::{IdentityId, MedicineId, PharmacyId, Topic, TopicRegistry};
use crate::session::SessionHandle;
use crate::utils::error::LookupError;

fn admitted(
    registry: &Arc<TopicRegistry>,
    identity_id: i64,
    capacity: usize,
) -> (Arc<SessionHandle>, mpsc::Receiver<WsMessage>) {
    let (tx, rx) = mpsc::channel(capacity);
    let handle = Arc::new(SessionHandle::new(Identity { id: identity_id }, tx));
    registry.add_session(handle.clone());
    (handle, rx)
}

fn received_envelope(rx: &mut mpsc::Receiver<WsMessage>) -> Envelope {
    match rx.try_recv().expect("expected a delivered frame") {
        WsMessage::Text(text) => codec::decode(text.as_str()).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

fn stock_changed(pharmacy_id: PharmacyId, medicine_id: MedicineId, new_stock: i64) -> DomainEvent {
    DomainEvent::PharmacyMedicineStockChanged {
        pharmacy_id,
        medicine_id,
        new_stock,
    }
}

fn back_in_stock(pharmacy_id: PharmacyId, medicine_id: MedicineId) -> DomainEvent {
    DomainEvent::MedicineBackInStock {
        pharmacy_id,
        pharmacy_name: "Central Pharmacy".to_string(),
        medicine_id,
        medicine_name: "Ibuprofen".to_string(),
        new_stock: 3,
    }
}

#[tokio::test]
async fn test_subscribe_and_receive() {
    let registry = Arc::new(TopicRegistry::new());
    let dispatcher = Dispatcher::new(registry.clone(), Arc::new(InMemoryWatchlistIndex::new()));
    let (handle, mut rx) = admitted(&registry, 1, 8);
    registry.subscribe(
        Topic::PharmacyMedicineStock {
            pharmacy_id: 7,
            medicine_id: 42,
        },
        handle.id,
    );

    dispatcher.publish(stock_changed(7, 42, 5)).await;

    let envelope = received_envelope(&mut rx);
    assert_eq!(envelope.tag, "pharmacy-medicine-stock");
    let payload: PharmacyMedicineStockPayload = envelope.payload().unwrap();
    assert_eq!(payload.pharmacy_id, 7);
    assert_eq!(payload.medicine_id, 42);
    assert_eq!(payload.stock, 5);
    // Exactly one envelope.
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_rating_event_reaches_pharmacy_subscribers() {
    let registry = Arc::new(TopicRegistry::new());
    let dispatcher = Dispatcher::new(registry.clone(), Arc::new(InMemoryWatchlistIndex::new()));
    let (handle, mut rx) = admitted(&registry, 1, 8);
    registry.subscribe(Topic::Pharmacy { pharmacy_id: 7 }, handle.id);

    dispatcher
        .publish(DomainEvent::PharmacyRatingChanged {
            pharmacy_id: 7,
            new_rating_sum: 130,
            new_rating_counts: [1, 0, 4, 10, 16],
        })
        .await;

    let envelope = received_envelope(&mut rx);
    assert_eq!(envelope.tag, "pharmacy");
    let payload: PharmacyPayload = envelope.payload().unwrap();
    assert_eq!(payload.global_rating_sum, 130);
    assert_eq!(payload.number_of_ratings, [1, 0, 4, 10, 16]);
}

#[tokio::test]
async fn test_no_cross_talk_between_topics() {
    let registry = Arc::new(TopicRegistry::new());
    let dispatcher = Dispatcher::new(registry.clone(), Arc::new(InMemoryWatchlistIndex::new()));
    let (handle, mut rx) = admitted(&registry, 1, 8);
    registry.subscribe(Topic::Pharmacy { pharmacy_id: 7 }, handle.id);

    dispatcher
        .publish(DomainEvent::PharmacyRatingChanged {
            pharmacy_id: 9,
            new_rating_sum: 12,
            new_rating_counts: [0, 0, 1, 1, 1],
        })
        .await;

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_per_session_delivery_is_fifo() {
    let registry = Arc::new(TopicRegistry::new());
    let dispatcher = Dispatcher::new(registry.clone(), Arc::new(InMemoryWatchlistIndex::new()));
    let (handle, mut rx) = admitted(&registry, 1, 8);
    registry.subscribe(
        Topic::PharmacyMedicineStock {
            pharmacy_id: 7,
            medicine_id: 42,
        },
        handle.id,
    );

    dispatcher.publish(stock_changed(7, 42, 1)).await;
    dispatcher.publish(stock_changed(7, 42, 2)).await;
    dispatcher.publish(stock_changed(7, 42, 3)).await;

    for expected in 1..=3 {
        let payload: PharmacyMedicineStockPayload =
            received_envelope(&mut rx).payload().unwrap();
        assert_eq!(payload.stock, expected);
    }
}

#[tokio::test]
async fn test_saturated_session_does_not_block_others() {
    let registry = Arc::new(TopicRegistry::new());
    let dispatcher = Dispatcher::new(registry.clone(), Arc::new(InMemoryWatchlistIndex::new()));
    let topic = Topic::PharmacyMedicineStock {
        pharmacy_id: 7,
        medicine_id: 42,
    };
    let (slow, mut slow_rx) = admitted(&registry, 1, 1);
    let (healthy, mut healthy_rx) = admitted(&registry, 2, 8);
    registry.subscribe(topic, slow.id);
    registry.subscribe(topic, healthy.id);

    dispatcher.publish(stock_changed(7, 42, 1)).await;
    dispatcher.publish(stock_changed(7, 42, 2)).await;

    // The healthy session got both updates in order.
    let first: PharmacyMedicineStockPayload =
        received_envelope(&mut healthy_rx).payload().unwrap();
    let second: PharmacyMedicineStockPayload =
        received_envelope(&mut healthy_rx).payload().unwrap();
    assert_eq!((first.stock, second.stock), (1, 2));

    // The slow session kept the older update and dropped the newest.
    let kept: PharmacyMedicineStockPayload = received_envelope(&mut slow_rx).payload().unwrap();
    assert_eq!(kept.stock, 1);
    assert!(slow_rx.try_recv().is_err());
    assert_eq!(slow.dropped_count(), 1);
}

#[tokio::test]
async fn test_identity_fan_out_targets_live_sessions_only() {
    let registry = Arc::new(TopicRegistry::new());
    let watchlists = Arc::new(InMemoryWatchlistIndex::new());
    // Identities 1 and 2 both favorited pharmacy 7 and watch medicine 42,
    // but only identity 1 has a live session.
    watchlists.record_interest(7, 42, 1);
    watchlists.record_interest(7, 42, 2);
    let dispatcher = Dispatcher::new(registry.clone(), watchlists);
    let (_handle, mut rx) = admitted(&registry, 1, 8);

    dispatcher.publish(back_in_stock(7, 42)).await;

    let envelope = received_envelope(&mut rx);
    assert_eq!(envelope.tag, "medicine-notification");
    let payload: MedicineNotificationPayload = envelope.payload().unwrap();
    assert_eq!(payload.pharmacy_id, 7);
    assert_eq!(payload.medicine_stock.medicine.id, 42);
    assert_eq!(payload.medicine_stock.medicine.name, "Ibuprofen");
    assert_eq!(payload.medicine_stock.stock, 3);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_identity_fan_out_reaches_every_session_of_the_identity() {
    let registry = Arc::new(TopicRegistry::new());
    let watchlists = Arc::new(InMemoryWatchlistIndex::new());
    watchlists.record_interest(7, 42, 1);
    let dispatcher = Dispatcher::new(registry.clone(), watchlists);
    let (_phone, mut phone_rx) = admitted(&registry, 1, 8);
    let (_tablet, mut tablet_rx) = admitted(&registry, 1, 8);

    dispatcher.publish(back_in_stock(7, 42)).await;

    assert_eq!(received_envelope(&mut phone_rx).tag, "medicine-notification");
    assert_eq!(received_envelope(&mut tablet_rx).tag, "medicine-notification");
}

#[tokio::test]
async fn test_uninterested_identity_receives_nothing() {
    let registry = Arc::new(TopicRegistry::new());
    let watchlists = Arc::new(InMemoryWatchlistIndex::new());
    watchlists.record_interest(7, 42, 1);
    let dispatcher = Dispatcher::new(registry.clone(), watchlists);
    let (_handle, mut rx) = admitted(&registry, 3, 8);

    dispatcher.publish(back_in_stock(7, 42)).await;

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_publish_after_disconnect_delivers_nowhere() {
    let registry = Arc::new(TopicRegistry::new());
    let dispatcher = Dispatcher::new(registry.clone(), Arc::new(InMemoryWatchlistIndex::new()));
    let topic = Topic::PharmacyMedicineStock {
        pharmacy_id: 7,
        medicine_id: 42,
    };
    let (handle, mut rx) = admitted(&registry, 1, 8);
    registry.subscribe(topic, handle.id);

    registry.remove_session(&handle.id);
    dispatcher.publish(stock_changed(7, 42, 5)).await;

    assert!(rx.try_recv().is_err());
}

struct FailingWatchlistIndex;

#[async_trait]
impl WatchlistIndex for FailingWatchlistIndex {
    async fn interested_identities(
        &self,
        _pharmacy_id: PharmacyId,
        _medicine_id: MedicineId,
    ) -> Result<Vec<IdentityId>, LookupError> {
        Err(LookupError("favorites store unavailable".to_string()))
    }
}

#[tokio::test]
async fn test_collaborator_failure_skips_fan_out_quietly() {
    let registry = Arc::new(TopicRegistry::new());
    let dispatcher = Dispatcher::new(registry.clone(), Arc::new(FailingWatchlistIndex));
    let (_handle, mut rx) = admitted(&registry, 1, 8);

    // Must not panic or propagate; the fan-out step is simply skipped.
    dispatcher.publish(back_in_stock(7, 42)).await;

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_watchlist_index_records_and_clears_interest() {
    let watchlists = InMemoryWatchlistIndex::new();
    watchlists.record_interest(7, 42, 1);
    watchlists.record_interest(7, 42, 1);
    watchlists.record_interest(7, 42, 2);

    let mut identities = watchlists.interested_identities(7, 42).await.unwrap();
    identities.sort_unstable();
    assert_eq!(identities, vec![1, 2]);

    watchlists.clear_interest(7, 42, &1);
    assert_eq!(watchlists.interested_identities(7, 42).await.unwrap(), vec![2]);

    watchlists.clear_interest(7, 42, &2);
    assert!(watchlists.interested_identities(7, 42).await.unwrap().is_empty());
}
