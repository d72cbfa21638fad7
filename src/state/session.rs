//! Session lifecycle status and the context handed to components.
//!
//! SYSTEM CONTEXT
//! ==============
//! `KeycloakProvider` owns one [`SessionContext`] and advances its
//! [`SessionStatus`] from bootstrap outcomes and client events. Guards and
//! hooks read the status and the published client from context.
//!
//! DESIGN
//! ======
//! ```text
//! Uninitialized -> Bootstrapping -> { Authenticated <-> Unauthenticated }
//!                        \-> Failed
//! ```
//! Events never leave `Failed`; only a fresh bootstrap (configuration
//! change) does.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::rc::Rc;

use leptos::prelude::*;

use crate::client::{DynClient, EventArgs, SessionEvent};
use crate::config::{GuardRoute, SessionPaths};
use crate::error::SessionError;
use crate::guards::route_path;

/// Where the session is in its lifecycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Uninitialized,
    Bootstrapping,
    Authenticated,
    Unauthenticated,
    /// Bootstrap failed; carries the error message.
    Failed(String),
}

impl SessionStatus {
    /// Whether the client has reported its initial state.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Unauthenticated)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }

    pub fn begin_bootstrap(&mut self) {
        *self = Self::Bootstrapping;
    }

    pub fn bootstrap_failed(&mut self, error: &SessionError) {
        *self = Self::Failed(error.to_string());
    }

    /// Advance on a client event. `TokenExpired` leaves the status alone
    /// because a refresh may still succeed.
    pub fn on_event(&mut self, event: SessionEvent, args: &EventArgs) {
        if matches!(self, Self::Failed(_)) {
            return;
        }
        let next = match (event, args) {
            (SessionEvent::Ready, EventArgs::Ready { authenticated: true }) => Self::Authenticated,
            (SessionEvent::Ready, _) => Self::Unauthenticated,
            (SessionEvent::AuthSuccess | SessionEvent::AuthRefreshSuccess, _) => Self::Authenticated,
            (SessionEvent::AuthError | SessionEvent::AuthRefreshError | SessionEvent::AuthLogout, _) => {
                Self::Unauthenticated
            }
            (SessionEvent::TokenExpired, _) => return,
        };
        if *self != next {
            tracing::debug!(from = ?self, to = ?next, event = event.handler_name(), "session status changed");
        }
        *self = next;
    }
}

/// Signals shared by the provider with every hook and guard below it.
///
/// The client lives in local (non-`Send`) storage: it wraps a JS object.
#[derive(Clone, Copy)]
pub struct SessionContext {
    pub status: RwSignal<SessionStatus>,
    client: RwSignal<Option<Rc<DynClient>>, LocalStorage>,
    /// Bumped on every publish, so effects can tell clients apart.
    pub revision: RwSignal<u64>,
    /// Route paths from the current configuration.
    pub paths: RwSignal<SessionPaths>,
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: RwSignal::new(SessionStatus::default()),
            client: RwSignal::new_local(None),
            revision: RwSignal::new(0),
            paths: RwSignal::new(SessionPaths::default()),
        }
    }

    /// Replace the published client.
    pub fn publish(&self, client: Rc<DynClient>) {
        self.client.set(Some(client));
        self.revision.update(|r| *r += 1);
        tracing::info!(revision = self.revision.get_untracked(), "identity client published");
    }

    /// Drop the published client (a superseding bootstrap is underway or
    /// the last one failed).
    pub fn retract(&self) {
        if self.client.with_untracked(Option::is_some) {
            self.client.set(None);
        }
    }

    /// Tracked read of the published client.
    #[must_use]
    pub fn client(&self) -> Option<Rc<DynClient>> {
        self.client.get()
    }

    #[must_use]
    pub fn client_untracked(&self) -> Option<Rc<DynClient>> {
        self.client.get_untracked()
    }

    /// Tracked path for `route`. The published client's advertised paths
    /// win over the configured ones, and `explicit` over both.
    #[must_use]
    pub fn route_path(&self, route: GuardRoute, explicit: Option<&str>) -> String {
        match self.client() {
            Some(client) => route_path(client.paths(), route, explicit),
            None => self.paths.with(|paths| route_path(paths, route, explicit)),
        }
    }

    pub fn begin_bootstrap(&self) {
        self.status.update(SessionStatus::begin_bootstrap);
    }

    pub fn bootstrap_failed(&self, error: &SessionError) {
        tracing::warn!(error = %error, "session bootstrap failed");
        self.status.update(|s| s.bootstrap_failed(error));
    }

    pub fn apply_event(&self, event: SessionEvent, args: &EventArgs) {
        self.status.update(|s| s.on_event(event, args));
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
