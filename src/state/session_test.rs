use leptos::reactive::owner::Owner;

use super::*;
use crate::client::{ProviderError, wrap};
use crate::config::{GuardRoute, SessionPaths};
use crate::testutil::FakeClient;

fn settled(authenticated: bool) -> SessionStatus {
    let mut status = SessionStatus::Bootstrapping;
    status.on_event(SessionEvent::Ready, &EventArgs::Ready { authenticated });
    status
}

// =============================================================
// SessionStatus transitions
// =============================================================

#[test]
fn status_defaults_to_uninitialized() {
    let status = SessionStatus::default();
    assert_eq!(status, SessionStatus::Uninitialized);
    assert!(!status.is_settled());
}

#[test]
fn ready_settles_by_authenticated_flag() {
    assert_eq!(settled(true), SessionStatus::Authenticated);
    assert_eq!(settled(false), SessionStatus::Unauthenticated);
    assert!(settled(false).is_settled());
}

#[test]
fn auth_success_and_refresh_success_authenticate() {
    for event in [SessionEvent::AuthSuccess, SessionEvent::AuthRefreshSuccess] {
        let mut status = settled(false);
        status.on_event(event, &EventArgs::Empty);
        assert!(status.is_authenticated(), "{event:?}");
    }
}

#[test]
fn logout_and_errors_unauthenticate() {
    let error = EventArgs::Error(ProviderError { error: "denied".to_owned(), error_description: None });
    for (event, args) in [
        (SessionEvent::AuthLogout, EventArgs::Empty),
        (SessionEvent::AuthRefreshError, EventArgs::Empty),
        (SessionEvent::AuthError, error),
    ] {
        let mut status = settled(true);
        status.on_event(event, &args);
        assert_eq!(status, SessionStatus::Unauthenticated, "{event:?}");
    }
}

#[test]
fn token_expired_leaves_status_unchanged() {
    let mut status = settled(true);
    status.on_event(SessionEvent::TokenExpired, &EventArgs::Empty);
    assert_eq!(status, SessionStatus::Authenticated);
}

#[test]
fn failed_ignores_events_until_next_bootstrap() {
    let mut status = SessionStatus::Bootstrapping;
    status.bootstrap_failed(&SessionError::MissingClientId);
    assert_eq!(status, SessionStatus::Failed("there is no client id configured".to_owned()));

    status.on_event(SessionEvent::Ready, &EventArgs::Ready { authenticated: true });
    assert!(matches!(status, SessionStatus::Failed(_)));

    status.begin_bootstrap();
    assert_eq!(status, SessionStatus::Bootstrapping);
}

// =============================================================
// SessionContext
// =============================================================

#[test]
fn publish_sets_client_and_bumps_revision() {
    let owner = Owner::new();
    owner.with(|| {
        let ctx = SessionContext::new();
        assert!(ctx.client_untracked().is_none());

        let boxed: Box<dyn crate::client::IdentityClient> = Box::new(FakeClient::signed_in("abc", 10));
        ctx.publish(Rc::new(wrap(boxed)));

        assert_eq!(ctx.revision.get_untracked(), 1);
        let client = ctx.client_untracked().unwrap();
        assert!(client.authenticated());

        ctx.retract();
        assert!(ctx.client_untracked().is_none());
    });
}

#[test]
fn context_status_follows_events() {
    let owner = Owner::new();
    owner.with(|| {
        let ctx = SessionContext::new();
        ctx.begin_bootstrap();
        assert_eq!(ctx.status.get_untracked(), SessionStatus::Bootstrapping);
        ctx.apply_event(SessionEvent::Ready, &EventArgs::Ready { authenticated: false });
        assert_eq!(ctx.status.get_untracked(), SessionStatus::Unauthenticated);
        ctx.bootstrap_failed(&SessionError::RuntimeLoad("404".to_owned()));
        assert!(matches!(ctx.status.get_untracked(), SessionStatus::Failed(_)));
    });
}

#[test]
fn route_path_prefers_published_client_paths() {
    let owner = Owner::new();
    owner.with(|| {
        let ctx = SessionContext::new();
        assert_eq!(ctx.route_path(GuardRoute::Logout, None), "/logout");

        ctx.paths.set(SessionPaths { logout: "/signout".to_owned(), ..SessionPaths::default() });
        assert_eq!(ctx.route_path(GuardRoute::Logout, None), "/signout");

        let boxed: Box<dyn crate::client::IdentityClient> = Box::new(FakeClient::new());
        let advertised = SessionPaths { account: "/me".to_owned(), ..SessionPaths::default() };
        ctx.publish(Rc::new(wrap(boxed).with_paths(advertised)));
        assert_eq!(ctx.route_path(GuardRoute::Account, None), "/me");
        assert_eq!(ctx.route_path(GuardRoute::Account, Some("/profile")), "/profile");
    });
}
