use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use super::hub::{ReloadHub, SubscriberId};
use super::ChangeEvent;
use crate::config::DeliveryPolicy;

const WAIT: Duration = Duration::from_secs(1);

fn make_hub(delivery: DeliveryPolicy) -> (mpsc::Sender<ChangeEvent>, Arc<ReloadHub>) {
    let (tx, rx) = mpsc::channel(1);
    (tx, Arc::new(ReloadHub::new(rx, delivery)))
}

fn attach(hub: &ReloadHub) -> (SubscriberId, mpsc::Receiver<ChangeEvent>) {
    let id = SubscriberId::next();
    let (tx, rx) = mpsc::channel(1);
    hub.register(id, tx);
    (id, rx)
}

#[tokio::test]
async fn test_broadcast_reaches_every_subscriber_exactly_once() {
    let (events, hub) = make_hub(DeliveryPolicy::Block);

    let mut receivers = Vec::new();
    for _ in 0..3 {
        receivers.push(attach(&hub).1);
    }
    assert_eq!(hub.subscriber_count(), 3);

    events.send(ChangeEvent::new("/x.html")).await.unwrap();

    for rx in &mut receivers {
        let event = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(event.path(), "/x.html");
        // exactly once: nothing else is pending
        assert!(rx.try_recv().is_err());
    }
}

#[tokio::test]
async fn test_two_subscribers_one_event_each() {
    let (events, hub) = make_hub(DeliveryPolicy::Block);

    let (_, mut rx_a) = attach(&hub);
    let (_, mut rx_b) = attach(&hub);

    events.send(ChangeEvent::new("/x.html")).await.unwrap();

    let a = timeout(WAIT, rx_a.recv()).await.unwrap().unwrap();
    let b = timeout(WAIT, rx_b.recv()).await.unwrap().unwrap();
    assert_eq!(a.path(), "/x.html");
    assert_eq!(b.path(), "/x.html");
    assert!(rx_a.try_recv().is_err());
    assert!(rx_b.try_recv().is_err());
}

#[tokio::test]
async fn test_deregistered_subscriber_receives_nothing_further() {
    let (events, hub) = make_hub(DeliveryPolicy::Block);

    let (_, mut rx_kept) = attach(&hub);
    let (gone_id, mut rx_gone) = attach(&hub);

    events.send(ChangeEvent::new("/first.html")).await.unwrap();
    timeout(WAIT, rx_kept.recv()).await.unwrap().unwrap();
    timeout(WAIT, rx_gone.recv()).await.unwrap().unwrap();

    hub.deregister(gone_id);
    events.send(ChangeEvent::new("/second.html")).await.unwrap();

    let event = timeout(WAIT, rx_kept.recv()).await.unwrap().unwrap();
    assert_eq!(event.path(), "/second.html");

    // the detached channel never sees the second event
    assert!(timeout(WAIT, rx_gone.recv()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_deregister_is_idempotent() {
    let (_events, hub) = make_hub(DeliveryPolicy::Block);

    let (id, _rx) = attach(&hub);
    hub.deregister(id);
    hub.deregister(id);
    hub.deregister(SubscriberId::next());
    assert_eq!(hub.subscriber_count(), 0);
}

#[tokio::test]
async fn test_source_close_closes_all_channels_and_stops_dispatcher() {
    let (events, hub) = make_hub(DeliveryPolicy::Block);

    let (_, mut rx_a) = attach(&hub);
    let (_, mut rx_b) = attach(&hub);

    drop(events);

    // every subscriber channel is closed, exactly once each
    assert!(timeout(WAIT, rx_a.recv()).await.unwrap().is_none());
    assert!(timeout(WAIT, rx_b.recv()).await.unwrap().is_none());

    // and the dispatch task has terminated
    timeout(WAIT, hub.join()).await.unwrap();
    assert_eq!(hub.subscriber_count(), 0);
}

#[tokio::test]
async fn test_drop_policy_discards_for_full_subscriber() {
    let (events, hub) = make_hub(DeliveryPolicy::Drop);

    let (_, mut rx_live) = attach(&hub);
    // this subscriber never drains its channel
    let (_, mut rx_stalled) = attach(&hub);

    events.send(ChangeEvent::new("/one.html")).await.unwrap();
    let live = timeout(WAIT, rx_live.recv()).await.unwrap().unwrap();
    assert_eq!(live.path(), "/one.html");

    // second event: the stalled channel still holds /one.html, so the
    // dispatcher drops /two.html for it instead of waiting
    events.send(ChangeEvent::new("/two.html")).await.unwrap();
    let live = timeout(WAIT, rx_live.recv()).await.unwrap().unwrap();
    assert_eq!(live.path(), "/two.html");

    tokio::time::sleep(Duration::from_millis(50)).await;
    let first = rx_stalled.try_recv().unwrap();
    assert_eq!(first.path(), "/one.html");
    assert!(rx_stalled.try_recv().is_err());
}

#[tokio::test]
async fn test_late_registration_still_receives_later_events() {
    let (events, hub) = make_hub(DeliveryPolicy::Block);

    let (_, mut rx_early) = attach(&hub);
    events.send(ChangeEvent::new("/a.html")).await.unwrap();
    timeout(WAIT, rx_early.recv()).await.unwrap().unwrap();

    let (_, mut rx_late) = attach(&hub);
    events.send(ChangeEvent::new("/b.html")).await.unwrap();

    let early = timeout(WAIT, rx_early.recv()).await.unwrap().unwrap();
    let late = timeout(WAIT, rx_late.recv()).await.unwrap().unwrap();
    assert_eq!(early.path(), "/b.html");
    assert_eq!(late.path(), "/b.html");
}
