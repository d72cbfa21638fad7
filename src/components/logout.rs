//! Logout route.
//!
//! [`logout_flow`] holds the wiring; the component binds it to the router.

#[cfg(test)]
#[path = "logout_test.rs"]
mod logout_test;

use std::rc::Rc;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;

use crate::client::LogoutOptions;
use crate::config::DEFAULT_REDIRECT;
use crate::guards::{GuardView, LogoutActivation, activate_logout, logout_view, resolve_redirect};
use crate::hooks::use_session;
use crate::stash::{SessionStorage, Stash, StorageBackend};

/// Signs the user out through the provider. Shows `children` (default
/// "Disconnecting...") while still authenticated, then returns to the
/// stashed path or `redirect_to`.
#[component]
pub fn Logout(
    #[prop(optional, into)] redirect_to: Option<String>,
    #[prop(optional)] logout_options: LogoutOptions,
    /// Runs when nobody was signed in to begin with.
    #[prop(optional)]
    on_success: Option<Callback<()>>,
    #[prop(optional)] children: Option<ChildrenFn>,
) -> impl IntoView {
    let navigate = use_navigate();
    let state = logout_flow(
        LogoutSetup {
            fallback: redirect_to.unwrap_or_else(|| DEFAULT_REDIRECT.to_owned()),
            options: logout_options,
            on_success,
        },
        Stash::<SessionStorage>::default(),
        move |path: &str| navigate(path, NavigateOptions::default()),
    );

    move || match state.get() {
        GuardView::Children | GuardView::Placeholder => match children.as_ref() {
            Some(children) => children().into_any(),
            None => view! { <div class="keycloak-router__status">"Disconnecting..."</div> }.into_any(),
        },
        _ => ().into_any(),
    }
}

pub struct LogoutSetup {
    pub fallback: String,
    pub options: LogoutOptions,
    pub on_success: Option<Callback<()>>,
}

pub fn logout_flow<S>(setup: LogoutSetup, stash: Stash<S>, navigate: impl Fn(&str) + 'static) -> Memo<GuardView>
where
    S: StorageBackend + 'static,
{
    let LogoutSetup { fallback, options, on_success } = setup;
    let session = use_session();
    let stash = Rc::new(stash);
    let activated_revision = StoredValue::new(None::<u64>);

    Effect::new(move || {
        if !session.status.get().is_settled() {
            return;
        }
        let Some(client) = session.client() else {
            return;
        };
        let revision = session.revision.get_untracked();
        if activated_revision.get_value() == Some(revision) {
            return;
        }
        activated_revision.set_value(Some(revision));

        if activate_logout(&client, &options) == LogoutActivation::AlreadySignedOut {
            if let Some(on_success) = on_success {
                on_success.run(());
            }
        }
    });

    let state = Memo::new(move |_| {
        let status = session.status.get();
        if status.is_settled() {
            logout_view(status.is_authenticated(), &fallback)
        } else {
            GuardView::Placeholder
        }
    });

    Effect::new(move || {
        if let GuardView::Redirect(target) = resolve_redirect(state.get(), &stash) {
            navigate(&target);
        }
    });

    state
}
