//! Session event multiplexer.
//!
//! ARCHITECTURE
//! ============
//! The identity client offers one overwritable handler slot per event. On
//! wrap, whatever already sits in a slot becomes the first subscriber, and
//! the slot is replaced by a fan-out into an [`EventTable`] that any number
//! of components can subscribe to and leave independently.
//!
//! ERROR HANDLING
//! ==============
//! A failing subscriber is logged and recorded in the [`DispatchReport`];
//! the remaining subscribers of the same dispatch still run, in order.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::{Map, Value};

use super::{
    Claims, EventArgs, EventHandler, IdentityClient, LoginOptions, LogoutOptions, SessionEvent, TokenKind,
    UrlOptions,
};
use crate::config::SessionPaths;
use crate::error::{SessionError, SubscriberError};
use crate::stash::TokenSnapshot;

struct Subscriber {
    id: u64,
    handler: EventHandler,
}

/// Ordered subscriber lists, one per [`SessionEvent`].
#[derive(Default)]
pub struct EventTable {
    lists: RefCell<[Vec<Subscriber>; SessionEvent::COUNT]>,
    next_id: Cell<u64>,
}

/// Outcome of one fan-out.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub invoked: usize,
    /// Subscriber position and error message for each failure.
    pub failures: Vec<(usize, String)>,
}

impl EventTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: SessionEvent, handler: EventHandler) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.lists.borrow_mut()[event.index()].push(Subscriber { id, handler });
        id
    }

    fn remove(&self, event: SessionEvent, id: u64) {
        self.lists.borrow_mut()[event.index()].retain(|s| s.id != id);
    }

    #[must_use]
    pub fn subscriber_count(&self, event: SessionEvent) -> usize {
        self.lists.borrow()[event.index()].len()
    }

    /// Run every subscriber of `event` in subscription order.
    ///
    /// The list is snapshotted first, so subscribers may subscribe or
    /// unsubscribe from inside a dispatch.
    pub fn dispatch(&self, event: SessionEvent, args: &EventArgs) -> DispatchReport {
        let handlers: Vec<EventHandler> = self.lists.borrow()[event.index()]
            .iter()
            .map(|s| Rc::clone(&s.handler))
            .collect();

        let mut report = DispatchReport::default();
        for (position, handler) in handlers.iter().enumerate() {
            report.invoked += 1;
            if let Err(e) = handler(args) {
                tracing::warn!(event = event.handler_name(), position, error = %e, "session event subscriber failed");
                report.failures.push((position, e.to_string()));
            }
        }
        report
    }
}

/// Handle returned by `subscribe`; removes exactly that one registration.
pub struct Subscription {
    table: Weak<EventTable>,
    event: SessionEvent,
    id: u64,
    active: Cell<bool>,
}

impl Subscription {
    pub fn event(&self) -> SessionEvent {
        self.event
    }

    /// Idempotent: later calls do nothing.
    pub fn unsubscribe(&self) {
        if !self.active.replace(false) {
            return;
        }
        if let Some(table) = self.table.upgrade() {
            table.remove(self.event, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish()
    }
}

/// An identity client whose handler slots fan out to an [`EventTable`].
pub struct WrappedClient<C> {
    client: C,
    events: Rc<EventTable>,
    paths: SessionPaths,
}

/// Take over every handler slot of `client`.
pub fn wrap<C: IdentityClient>(client: C) -> WrappedClient<C> {
    let events = Rc::new(EventTable::new());
    for event in SessionEvent::ALL {
        if let Some(existing) = client.take_handler(event) {
            events.push(event, existing);
        }
        let table = Rc::downgrade(&events);
        client.install_handler(
            event,
            Rc::new(move |args: &EventArgs| -> Result<(), SubscriberError> {
                if let Some(table) = table.upgrade() {
                    table.dispatch(event, args);
                }
                Ok(())
            }),
        );
    }
    WrappedClient { client, events, paths: SessionPaths::default() }
}

impl<C: IdentityClient> WrappedClient<C> {
    /// Attach the route paths advertised to guards.
    #[must_use]
    pub fn with_paths(mut self, paths: SessionPaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn inner(&self) -> &C {
        &self.client
    }

    pub fn events(&self) -> &EventTable {
        &self.events
    }

    pub fn paths(&self) -> &SessionPaths {
        &self.paths
    }

    /// Add `handler` to the end of the subscriber list for `event`.
    pub fn subscribe<F>(&self, event: SessionEvent, handler: F) -> Subscription
    where
        F: Fn(&EventArgs) -> Result<(), SubscriberError> + 'static,
    {
        self.subscribe_handler(event, Rc::new(handler))
    }

    /// Like [`Self::subscribe`] but keeps the caller's `Rc`, so the same
    /// handler can be registered more than once.
    pub fn subscribe_handler(&self, event: SessionEvent, handler: EventHandler) -> Subscription {
        let id = self.events.push(event, handler);
        Subscription { table: Rc::downgrade(&self.events), event, id, active: Cell::new(true) }
    }

    /// Subscribe by event name (`"authSuccess"` or `"onAuthSuccess"`).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownEvent`] for names outside the fixed set.
    pub fn subscribe_named<F>(&self, name: &str, handler: F) -> Result<Subscription, SessionError>
    where
        F: Fn(&EventArgs) -> Result<(), SubscriberError> + 'static,
    {
        let event = name.parse::<SessionEvent>()?;
        Ok(self.subscribe(event, handler))
    }

    pub fn init(&self, options: &Map<String, Value>) {
        tracing::debug!("initializing identity client");
        self.client.init(options);
    }

    pub fn authenticated(&self) -> bool {
        self.client.authenticated()
    }

    pub fn token(&self, kind: TokenKind) -> Option<String> {
        self.client.token(kind)
    }

    pub fn claims(&self, kind: TokenKind) -> Option<Claims> {
        self.client.claims(kind)
    }

    pub fn snapshot_tokens(&self) -> TokenSnapshot {
        self.client.snapshot()
    }

    pub fn login(&self, options: &LoginOptions) {
        tracing::info!("starting provider login");
        self.client.login(options);
    }

    pub fn logout(&self, options: &LogoutOptions) {
        tracing::info!("starting provider logout");
        self.client.logout(options);
    }

    pub fn register_url(&self, options: &UrlOptions) -> String {
        self.client.create_register_url(options)
    }

    pub fn account_url(&self, options: &UrlOptions) -> String {
        self.client.create_account_url(options)
    }
}
