//! Session provider: bootstraps the identity client and shares it.
//!
//! SYSTEM CONTEXT
//! ==============
//! Mount once near the root, inside the router. Children render
//! immediately; guards below show placeholders until the session settles.
//!
//! ARCHITECTURE
//! ============
//! An effect watches the configuration. Each new endpoint triple passes the
//! [`BootstrapGate`], retracts the old client and spawns a bootstrap. A
//! bootstrap finishing after a newer one started is discarded. On success,
//! [`attach_session`] subscribes the status updater and the token stash
//! writer, publishes the client, then starts client initialization.

#[cfg(test)]
#[path = "provider_test.rs"]
mod provider_test;

use std::rc::{Rc, Weak};

use leptos::prelude::*;
use serde_json::{Map, Value};

use crate::client::{DynClient, EventArgs, SessionEvent};
use crate::config::SessionConfig;
use crate::error::SubscriberError;
use crate::stash::{Stash, StorageBackend, TokenSnapshot};
use crate::state::SessionContext;

/// Events after which the token set is snapshotted into the stash and
/// handed to `on_tokens`.
const TOKEN_SNAPSHOT_EVENTS: [SessionEvent; 3] =
    [SessionEvent::Ready, SessionEvent::AuthSuccess, SessionEvent::AuthRefreshSuccess];

/// Bootstraps a session for `config` and provides it to `children`.
///
/// `on_tokens` runs after every token change the client reports, once the
/// new tokens are stashed for the next page load.
#[component]
pub fn KeycloakProvider(
    #[prop(into)] config: Signal<SessionConfig>,
    #[prop(optional)] on_tokens: Option<Callback<TokenSnapshot>>,
    children: Children,
) -> impl IntoView {
    let session = SessionContext::new();
    session.paths.set(config.with_untracked(SessionConfig::paths));
    provide_context(session);

    #[cfg(feature = "hydrate")]
    {
        use crate::bootstrap::{BootstrapGate, bootstrap};
        use crate::client::js::{KeycloakFactory, shared_runtime};
        use crate::stash::SessionStorage;
        use crate::util::navigate::current_origin;

        let gate = StoredValue::new_local(Rc::new(BootstrapGate::new()));
        Effect::new(move || {
            let config = config.get();
            session.paths.set(config.paths());
            let gate = gate.get_value();
            let Some(generation) = gate.begin(config.bootstrap_key()) else {
                return;
            };
            session.retract();
            session.begin_bootstrap();

            leptos::task::spawn_local(async move {
                let runtime = shared_runtime();
                let stash = Stash::<SessionStorage>::default();
                let result = bootstrap(&config, &runtime, &KeycloakFactory, &stash).await;
                if !gate.is_current(generation) {
                    tracing::debug!(generation, "discarding superseded bootstrap");
                    return;
                }
                match result {
                    Ok(client) => {
                        let init = config.init_options(current_origin().as_deref());
                        attach_session(session, Rc::new(client), stash, on_tokens, &init);
                    }
                    Err(e) => session.bootstrap_failed(&e),
                }
            });
        });
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = on_tokens;
    }

    children()
}

/// Hook the provider's own subscribers into `client`, publish it and start
/// its initialization. Apps that build their client outside
/// [`KeycloakProvider`] can call this with their own context.
///
/// The subscriptions live as long as the client's event table.
pub fn attach_session<S>(
    session: SessionContext,
    client: Rc<DynClient>,
    stash: Stash<S>,
    on_tokens: Option<Callback<TokenSnapshot>>,
    init_options: &Map<String, Value>,
) where
    S: StorageBackend + 'static,
{
    for event in SessionEvent::ALL {
        client.subscribe(event, move |args: &EventArgs| -> Result<(), SubscriberError> {
            session.apply_event(event, args);
            Ok(())
        });
    }

    let stash = Rc::new(stash);
    for event in TOKEN_SNAPSHOT_EVENTS {
        let weak: Weak<DynClient> = Rc::downgrade(&client);
        let stash = Rc::clone(&stash);
        client.subscribe(event, move |_: &EventArgs| -> Result<(), SubscriberError> {
            let Some(client) = weak.upgrade() else {
                return Ok(());
            };
            let tokens = client.snapshot_tokens();
            let stored = stash.set_tokens(&tokens);
            if let Some(on_tokens) = on_tokens {
                on_tokens.run(tokens);
            }
            stored.map_err(Into::into)
        });
    }

    session.publish(Rc::clone(&client));
    client.init(init_options);
}
