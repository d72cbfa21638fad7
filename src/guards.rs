//! Route-guard decisions over token validity.
//!
//! ARCHITECTURE
//! ============
//! Each guard is split in two: a pure decision (`*_view`, `*_decision`) that
//! maps session state to a [`GuardView`], and a thin effectful step
//! (`activate_*`, [`resolve_redirect`]) that writes the stash or hands the
//! page to the provider. Components in `crate::components` only wire these
//! to signals and the router.
//!
//! A token is usable only while `time_left > 0`; zero counts as expired.

#[cfg(test)]
#[path = "guards_test.rs"]
mod guards_test;

use crate::client::{Claims, IdentityClient, LoginOptions, LogoutOptions, TokenKind, UrlOptions, WrappedClient};
use crate::config::{GuardRoute, SessionPaths};
use crate::stash::{Stash, StorageBackend};

/// What a guard wants rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardView {
    /// Render the protected or transitional children.
    Children,
    /// Render a waiting indicator (login redirect in flight).
    Placeholder,
    /// Navigate within the app.
    Redirect(String),
    /// Navigate to the stashed return path, consuming it, or `fallback`.
    RedirectToStashed { fallback: String },
    /// Leave the app for a provider-hosted page.
    External(String),
}

/// Seconds until the claims expire, measured against `ceil(now)`; `0` when
/// there are no claims or no expiry.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn time_left(claims: Option<&Claims>, now: f64) -> i64 {
    match claims.and_then(|c| c.exp) {
        Some(exp) => exp.saturating_sub(now.ceil() as i64),
        None => 0,
    }
}

#[must_use]
pub fn is_valid(claims: Option<&Claims>, now: f64) -> bool {
    time_left(claims, now) > 0
}

/// Explicit route override, else the path the client advertises.
#[must_use]
pub fn resolve_path(explicit: Option<&str>, advertised: &str) -> String {
    explicit.filter(|p| !p.is_empty()).unwrap_or(advertised).to_owned()
}

/// Path a guard route is mounted under: `explicit`, else the advertised
/// path for `route`.
#[must_use]
pub fn route_path(paths: &SessionPaths, route: GuardRoute, explicit: Option<&str>) -> String {
    resolve_path(explicit, paths.get(route))
}

// =============================================================
// Protected content
// =============================================================

/// Outcome of the protected-content guard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtectedDecision {
    pub view: GuardView,
    /// Return path to remember before leaving for login.
    pub stash_return: Option<String>,
}

/// Render while the primary token is valid, otherwise go to login and
/// remember `attempted` unless a return path is already stashed.
#[must_use]
pub fn protected_decision(time_left: i64, attempted: &str, login_path: &str, already_stashed: bool) -> ProtectedDecision {
    if time_left > 0 {
        return ProtectedDecision { view: GuardView::Children, stash_return: None };
    }
    let stash_return = (!already_stashed && attempted != login_path).then(|| attempted.to_owned());
    ProtectedDecision { view: GuardView::Redirect(login_path.to_owned()), stash_return }
}

/// Evaluate the protected-content guard and record the return path.
pub fn enforce_protected<C, S>(
    client: &WrappedClient<C>,
    stash: &Stash<S>,
    now: f64,
    attempted: &str,
    login_override: Option<&str>,
) -> GuardView
where
    C: IdentityClient,
    S: StorageBackend,
{
    let login_path = route_path(client.paths(), GuardRoute::Login, login_override);
    let remaining = time_left(client.claims(TokenKind::Access).as_ref(), now);
    let decision = protected_decision(remaining, attempted, &login_path, stash.redirect_to().is_some());
    if let Some(path) = decision.stash_return.as_deref() {
        if let Err(e) = stash.set_redirect_to(path) {
            tracing::warn!(path, error = %e, "could not stash return path");
        }
    }
    if let GuardView::Redirect(target) = &decision.view {
        tracing::debug!(attempted, target, remaining, "protected route requires login");
    }
    decision.view
}

// =============================================================
// Login
// =============================================================

/// What the login guard did on activation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginActivation {
    /// Already signed in; the caller's success callback gets the token.
    Succeeded { token: Option<String> },
    /// Provider login started; the page is about to be replaced.
    Redirecting,
}

#[must_use]
pub fn login_view(time_left: i64, login_pending: bool, fallback: &str) -> GuardView {
    if time_left > 0 {
        GuardView::Children
    } else if login_pending {
        GuardView::Placeholder
    } else {
        GuardView::RedirectToStashed { fallback: fallback.to_owned() }
    }
}

/// Signed in: report success and stop. Otherwise remember `return_to` and
/// hand the page to the provider's login.
pub fn activate_login<C, S>(
    client: &WrappedClient<C>,
    stash: &Stash<S>,
    return_to: Option<&str>,
    options: &LoginOptions,
) -> LoginActivation
where
    C: IdentityClient,
    S: StorageBackend,
{
    if client.authenticated() {
        return LoginActivation::Succeeded { token: client.token(TokenKind::Access) };
    }
    if let Some(path) = return_to {
        if let Err(e) = stash.set_redirect_to(path) {
            tracing::warn!(path, error = %e, "could not stash return path");
        }
    }
    client.login(options);
    LoginActivation::Redirecting
}

// =============================================================
// Logout
// =============================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogoutActivation {
    /// Provider logout started; the page is about to be replaced.
    Redirecting,
    /// Nobody was signed in; the caller's success callback runs now.
    AlreadySignedOut,
}

#[must_use]
pub fn logout_view(authenticated: bool, fallback: &str) -> GuardView {
    if authenticated {
        GuardView::Children
    } else {
        GuardView::RedirectToStashed { fallback: fallback.to_owned() }
    }
}

pub fn activate_logout<C: IdentityClient>(client: &WrappedClient<C>, options: &LogoutOptions) -> LogoutActivation {
    if client.authenticated() {
        client.logout(options);
        LogoutActivation::Redirecting
    } else {
        LogoutActivation::AlreadySignedOut
    }
}

// =============================================================
// Provider-hosted pages
// =============================================================

#[must_use]
pub fn register_view<C: IdentityClient>(client: &WrappedClient<C>, options: &UrlOptions) -> GuardView {
    GuardView::External(client.register_url(options))
}

#[must_use]
pub fn account_view<C: IdentityClient>(client: &WrappedClient<C>, options: &UrlOptions) -> GuardView {
    GuardView::External(client.account_url(options))
}

// =============================================================
// Effects
// =============================================================

/// Turn [`GuardView::RedirectToStashed`] into a concrete redirect, popping
/// the stashed return path. Other views pass through untouched.
pub fn resolve_redirect<S: StorageBackend>(view: GuardView, stash: &Stash<S>) -> GuardView {
    match view {
        GuardView::RedirectToStashed { fallback } => GuardView::Redirect(stash.pop_redirect_to(&fallback)),
        other => other,
    }
}
