//! Login route: hand the page to the provider, then return to the stash.
//!
//! DESIGN
//! ======
//! Activation runs once per published client, and the view stays a
//! placeholder until it has. Signed in, it reports success
//! (by default, returning to the stashed path). Signed out, it stashes the
//! `redirectTo` query parameter and starts provider login; the view then
//! holds a placeholder instead of consuming the stash the provider round
//! trip still needs.
//!
//! [`login_flow`] holds the wiring; the component only binds it to the
//! router and the tab's session storage.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use std::rc::Rc;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_navigate, use_query_map};

use crate::client::{LoginOptions, TokenKind};
use crate::config::DEFAULT_REDIRECT;
use crate::guards::{GuardView, LoginActivation, activate_login, login_view, resolve_redirect};
use crate::hooks::{use_session, use_time_left};
use crate::stash::{SessionStorage, Stash, StorageBackend};

/// Query parameter carrying the path to come back to after login.
pub const RETURN_TO_PARAM: &str = "redirectTo";

#[component]
pub fn Login(
    /// Where to go when no return path is stashed.
    #[prop(optional, into)]
    redirect_to: Option<String>,
    #[prop(optional)] login_options: LoginOptions,
    /// Replaces the default return-to-stash navigation when already signed in.
    #[prop(optional)]
    on_success: Option<Callback<Option<String>>>,
    #[prop(optional)] children: Option<ChildrenFn>,
) -> impl IntoView {
    let query = use_query_map();
    let navigate = use_navigate();
    let state = login_flow(
        LoginSetup {
            fallback: redirect_to.unwrap_or_else(|| DEFAULT_REDIRECT.to_owned()),
            options: login_options,
            on_success,
        },
        Stash::<SessionStorage>::default(),
        move || query.with_untracked(|q| q.get(RETURN_TO_PARAM)),
        move |path: &str| navigate(path, NavigateOptions::default()),
    );

    move || match state.get() {
        GuardView::Children => match children.as_ref() {
            Some(children) => children().into_any(),
            None => connecting().into_any(),
        },
        GuardView::Placeholder => connecting().into_any(),
        _ => ().into_any(),
    }
}

fn connecting() -> impl IntoView {
    view! { <div class="keycloak-router__status">"Connecting..."</div> }
}

pub struct LoginSetup {
    pub fallback: String,
    pub options: LoginOptions,
    pub on_success: Option<Callback<Option<String>>>,
}

/// Login route wiring under the current session context. `return_to` reads
/// the requested return path; `navigate` performs in-app navigation.
pub fn login_flow<S>(
    setup: LoginSetup,
    stash: Stash<S>,
    return_to: impl Fn() -> Option<String> + 'static,
    navigate: impl Fn(&str) + Clone + 'static,
) -> Memo<GuardView>
where
    S: StorageBackend + 'static,
{
    let LoginSetup { fallback, options, on_success } = setup;
    let session = use_session();
    let time_left = use_time_left(TokenKind::Access);
    let stash = Rc::new(stash);
    let login_pending = RwSignal::new(false);
    let activated = RwSignal::new(None::<u64>);

    let fallback_nav = fallback.clone();
    let navigate_success = navigate.clone();
    let stash_success = Rc::clone(&stash);
    Effect::new(move || {
        if !session.status.get().is_settled() {
            return;
        }
        let Some(client) = session.client() else {
            return;
        };
        let revision = session.revision.get_untracked();
        if activated.get_untracked() == Some(revision) {
            return;
        }

        match activate_login(&client, &stash_success, return_to().as_deref(), &options) {
            LoginActivation::Succeeded { token } => match on_success {
                Some(on_success) => on_success.run(token),
                None => navigate_success(&stash_success.pop_redirect_to(&fallback_nav)),
            },
            LoginActivation::Redirecting => login_pending.set(true),
        }
        activated.set(Some(revision));
    });

    // Placeholder until the current client has been activated.
    let state = Memo::new(move |_| {
        let current = activated.get() == Some(session.revision.get());
        if current && session.status.get().is_settled() {
            login_view(time_left.get(), login_pending.get(), &fallback)
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
