//! Gates for protected content.

#[cfg(test)]
#[path = "protect_test.rs"]
mod protect_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_location, use_navigate};

use crate::client::TokenKind;
use crate::guards::{GuardView, enforce_protected};
use crate::hooks::{use_session, use_session_status, use_time_left};
use crate::stash::{SessionStorage, Stash, StorageBackend};
use crate::util::clock::now_secs;

/// Renders `children` while the access token has time left. Once the
/// session has settled without one, remembers the current path and
/// redirects to the login route.
///
/// `login_path` overrides the path the client advertises.
#[component]
pub fn Protected(#[prop(optional, into)] login_path: Option<String>, children: ChildrenFn) -> impl IntoView {
    let location = use_location();
    let navigate = use_navigate();
    let time_left = protected_flow(
        login_path,
        Stash::<SessionStorage>::default(),
        move || location.pathname.get_untracked(),
        move |path: &str| navigate(path, NavigateOptions::default()),
    );

    view! { <Show when=move || { time_left.get() > 0 }>{children()}</Show> }
}

/// Protected-content wiring under the current session context. Returns the
/// access token's time left, which gates rendering.
pub fn protected_flow<S>(
    login_path: Option<String>,
    stash: Stash<S>,
    current_path: impl Fn() -> String + 'static,
    navigate: impl Fn(&str) + 'static,
) -> Signal<i64>
where
    S: StorageBackend + 'static,
{
    let session = use_session();
    let time_left = use_time_left(TokenKind::Access);

    Effect::new(move || {
        if !session.status.get().is_settled() || time_left.get() > 0 {
            return;
        }
        let Some(client) = session.client() else {
            return;
        };
        let attempted = current_path();
        if let GuardView::Redirect(target) =
            enforce_protected(&client, &stash, now_secs(), &attempted, login_path.as_deref())
        {
            navigate(&target);
        }
    });

    time_left
}

/// Renders `children` for an authenticated session and `unprotected`
/// otherwise. Never redirects.
#[component]
pub fn Protect(children: ChildrenFn, #[prop(optional, into)] unprotected: ViewFn) -> impl IntoView {
    let status = use_session_status();
    view! {
        <Show when=move || status.get().is_authenticated() fallback=unprotected>
            {children()}
        </Show>
    }
}
