//! Integration tests for the event bus
//!
//! Tests channel routing, subscription order, and disposal.

use std::sync::{Arc, Mutex};

use tessera_foundation::{EntityId, QueryId};
use tessera_storage::{Channel, ComponentKey, Event, EventBus, EventKind, Listener};

struct Health(i32);

fn channel(kind: EventKind) -> Channel {
    Channel::new(ComponentKey::of::<Health>(), kind)
}

#[test]
fn each_kind_is_its_own_channel() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut bus = EventBus::new();
    for kind in EventKind::ALL {
        let seen = Arc::clone(&seen);
        bus.subscribe(
            channel(kind),
            Listener::Callback(Box::new(move |_, _| seen.lock().unwrap().push(kind))),
        );
    }

    let value = Health(1);
    for kind in [EventKind::Disabled, EventKind::Added] {
        bus.publish(
            Event {
                channel: channel(kind),
                entity: EntityId::new(0, 1),
                value: &value,
            },
            |_, _| {},
        );
    }

    assert_eq!(*seen.lock().unwrap(), vec![EventKind::Disabled, EventKind::Added]);
}

#[test]
fn query_listeners_go_to_the_sink() {
    let mut bus = EventBus::new();
    let q = QueryId::new(4, 2);
    bus.subscribe(channel(EventKind::Removed), Listener::Query(q));

    let value = Health(9);
    let mut routed = Vec::new();
    bus.publish(
        Event {
            channel: channel(EventKind::Removed),
            entity: EntityId::new(3, 1),
            value: &value,
        },
        |id, event| {
            let health = event.value.downcast_ref::<Health>().map(|h| h.0);
            routed.push((id, event.entity.index, health));
        },
    );

    assert_eq!(routed, vec![(q, 3, Some(9))]);
}

#[test]
fn disposed_subscription_is_forgotten() {
    let mut bus = EventBus::new();
    let id = bus.subscribe(channel(EventKind::Added), Listener::Query(QueryId::new(0, 1)));
    assert_eq!(bus.len(), 1);

    assert!(bus.unsubscribe(id));
    assert!(!bus.has_listeners(channel(EventKind::Added)));
    assert!(bus.is_empty());
}
