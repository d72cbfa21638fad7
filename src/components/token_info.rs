//! Live token readout for debugging pages.

#[cfg(test)]
#[path = "token_info_test.rs"]
mod token_info_test;

use leptos::prelude::*;

use crate::client::{Claims, TokenKind};
use crate::guards::time_left;
use crate::hooks::{use_tock, use_token};
use crate::poll::Period;

/// Countdown plus the raw token and its decoded claims.
#[component]
pub fn TokenInfo(#[prop(optional)] kind: TokenKind, #[prop(optional)] period: Option<Period>) -> impl IntoView {
    let now = use_tock(Period::from_secs(1));
    let token = use_token(kind, period);

    let remaining = move || token.with(|t| describe_remaining(time_left(t.claims.as_ref(), now.get())));
    let raw = move || token.with(|t| t.token.clone().unwrap_or_default());
    let claims = move || token.with(|t| pretty_claims(t.claims.as_ref()));

    view! {
        <div class="token-info">
            <p class="token-info__remaining">{remaining}</p>
            <pre class="token-info__token">{raw}</pre>
            <pre class="token-info__claims">{claims}</pre>
        </div>
    }
}

pub(crate) fn describe_remaining(seconds: i64) -> String {
    match seconds {
        s if s <= 0 => "expired".to_owned(),
        1 => "expires in 1 second".to_owned(),
        s => format!("expires in {s} seconds"),
    }
}

pub(crate) fn pretty_claims(claims: Option<&Claims>) -> String {
    claims
        .and_then(|c| serde_json::to_string_pretty(c).ok())
        .unwrap_or_default()
}
