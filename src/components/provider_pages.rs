//! Routes that leave the app for provider-hosted pages.

use leptos::prelude::*;

use crate::client::UrlOptions;
use crate::guards::{GuardView, account_view, register_view};
use crate::hooks::use_session;
use crate::util::navigate::assign_location;

fn leave_app(view: GuardView) {
    match view {
        GuardView::External(url) if url.is_empty() => {
            tracing::warn!("identity client produced no provider url");
        }
        GuardView::External(url) => assign_location(&url),
        other => tracing::debug!(?other, "provider page guard did not redirect"),
    }
}

/// Sends the browser to the provider's registration page.
#[component]
pub fn RegisterRedirect(#[prop(optional)] options: UrlOptions) -> impl IntoView {
    let session = use_session();
    Effect::new(move || {
        if let Some(client) = session.client() {
            leave_app(register_view(&client, &options));
        }
    });
}

/// Sends the browser to the provider's account console.
#[component]
pub fn AccountRedirect(#[prop(optional)] options: UrlOptions) -> impl IntoView {
    let session = use_session();
    Effect::new(move || {
        if let Some(client) = session.client() {
            leave_app(account_view(&client, &options));
        }
    });
}
