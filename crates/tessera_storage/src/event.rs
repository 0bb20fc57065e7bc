//! Component event bus.
//!
//! There is one channel per (component type, [`EventKind`]). Publishing on
//! a channel synchronously visits every listener in subscription order
//! before returning. Listeners are either live queries, which the bus only
//! names by [`QueryId`] and hands back to the caller's sink, or boxed
//! callbacks owned by the bus.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tessera_foundation::{EntityId, QueryId};

use crate::registry::ComponentKey;

/// What happened to a component.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EventKind {
    /// The component was set on an entity that did not have it.
    Added,
    /// The component was removed; listeners see the last value.
    Removed,
    /// The component's enabled bit turned on (also fired after `Added`).
    Enabled,
    /// The component's enabled bit turned off.
    Disabled,
}

impl EventKind {
    /// Every kind, in a fixed order.
    pub const ALL: [Self; 4] = [Self::Added, Self::Removed, Self::Enabled, Self::Disabled];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

/// A (component type, event kind) pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Channel {
    /// Component type the event concerns.
    pub component: ComponentKey,
    /// What happened to it.
    pub kind: EventKind,
}

impl Channel {
    /// Creates a channel.
    #[must_use]
    pub const fn new(component: ComponentKey, kind: EventKind) -> Self {
        Self { component, kind }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.component, self.kind)
    }
}

/// One published event.
#[derive(Copy, Clone)]
pub struct Event<'a> {
    /// Channel the event was published on.
    pub channel: Channel,
    /// Entity whose component changed.
    pub entity: EntityId,
    /// Current value, or the last value for `Removed`.
    pub value: &'a dyn Any,
}

impl fmt::Debug for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("channel", &self.channel)
            .field("entity", &self.entity)
            .finish_non_exhaustive()
    }
}

/// Callback invoked with the entity and the component value as `&dyn Any`.
pub type Callback = Box<dyn FnMut(EntityId, &dyn Any) + Send>;

/// A subscriber on a channel.
pub enum Listener {
    /// A live query cache, updated through the publisher's sink.
    Query(QueryId),
    /// An external callback.
    Callback(Callback),
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(id) => write!(f, "Listener::Query({id:?})"),
            Self::Callback(_) => write!(f, "Listener::Callback"),
        }
    }
}

/// Disposable handle to one subscription.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Per-channel listener lists.
#[derive(Default)]
pub struct EventBus {
    channels: HashMap<Channel, Vec<(SubscriptionId, Listener)>>,
    routes: HashMap<SubscriptionId, Channel>,
    next_id: u64,
}

impl EventBus {
    /// Creates a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener to the end of `channel`'s list.
    pub fn subscribe(&mut self, channel: Channel, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.channels
            .entry(channel)
            .or_default()
            .push((id, listener));
        self.routes.insert(id, channel);
        id
    }

    /// Removes a listener. Returns false if it was already gone.
    ///
    /// Events already delivered are not affected.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(channel) = self.routes.remove(&id) else {
            return false;
        };
        if let Some(listeners) = self.channels.get_mut(&channel) {
            listeners.retain(|(sub, _)| *sub != id);
            if listeners.is_empty() {
                self.channels.remove(&channel);
            }
        }
        true
    }

    /// Returns true if the subscription is still active.
    #[must_use]
    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.routes.contains_key(&id)
    }

    /// Returns true if anyone listens on `channel`.
    #[must_use]
    pub fn has_listeners(&self, channel: Channel) -> bool {
        self.channels.contains_key(&channel)
    }

    /// Number of listeners on `channel`.
    #[must_use]
    pub fn listener_count(&self, channel: Channel) -> usize {
        self.channels.get(&channel).map_or(0, Vec::len)
    }

    /// Number of active subscriptions across all channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if there are no subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Delivers `event` to every listener on its channel, in subscription
    /// order. Query listeners are passed to `on_query`; callbacks are run
    /// directly.
    pub fn publish(&mut self, event: Event<'_>, mut on_query: impl FnMut(QueryId, &Event<'_>)) {
        let Some(listeners) = self.channels.get_mut(&event.channel) else {
            return;
        };
        tracing::trace!(
            channel = %event.channel,
            entity = ?event.entity,
            listeners = listeners.len(),
            "publish"
        );
        for (_, listener) in listeners.iter_mut() {
            match listener {
                Listener::Query(id) => on_query(*id, &event),
                Listener::Callback(callback) => callback(event.entity, event.value),
            }
        }
    }

    /// Drops every subscription.
    pub fn clear(&mut self) {
        self.channels.clear();
        self.routes.clear();
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("channels", &self.channels.len())
            .field("subscriptions", &self.routes.len())
            .finish()
    }
}
