use super::*;
use crate::client::{EventArgs, IdentityClient, wrap};
use crate::config::SessionPaths;
use crate::testutil::{FakeClient, FakeTimers, settle, with_owner};

const T: i64 = 1_700_000_000;

fn dyn_client(fake: &FakeClient) -> Rc<DynClient> {
    let boxed: Box<dyn IdentityClient> = Box::new(fake.clone());
    Rc::new(wrap(boxed))
}

fn token_of(state: ReadSignal<TokenState>) -> Option<String> {
    state.with_untracked(|s| s.token.clone())
}

// =============================================================
// watch_token
// =============================================================

#[test]
fn token_is_read_as_soon_as_a_client_is_published() {
    with_owner(|_| {
        let session = SessionContext::new();
        let timers = FakeTimers::default();
        let state = watch_token(session, TokenKind::Access, Signal::from(None::<Period>), timers.starter());
        settle();
        assert_eq!(token_of(state), None);
        assert_eq!(timers.live(), 0, "no timer before a client exists");

        session.publish(dyn_client(&FakeClient::signed_in("abc", T)));
        settle();
        assert_eq!(token_of(state), Some("abc".to_owned()));
        assert_eq!(state.with_untracked(|s| s.claims.as_ref().and_then(|c| c.exp)), Some(T));
        assert_eq!(timers.live(), 1);
        assert_eq!(timers.started(), vec![Period::for_kind(TokenKind::Access).millis().unwrap_or(0)]);
    });
}

#[test]
fn auth_events_trigger_a_reread() {
    with_owner(|_| {
        let session = SessionContext::new();
        let fake = FakeClient::signed_in("abc", T);
        session.publish(dyn_client(&fake));
        let state = watch_token(session, TokenKind::Access, Signal::from(None::<Period>), FakeTimers::default().starter());
        settle();

        fake.set_token(TokenKind::Access, "after-ready", T + 1);
        fake.fire(SessionEvent::Ready, &EventArgs::Ready { authenticated: true }).unwrap();
        assert_eq!(token_of(state), Some("after-ready".to_owned()));

        fake.set_token(TokenKind::Access, "after-login", T + 2);
        fake.fire(SessionEvent::AuthSuccess, &EventArgs::Empty).unwrap();
        assert_eq!(token_of(state), Some("after-login".to_owned()));

        fake.set_token(TokenKind::Access, "after-refresh", T + 3);
        fake.fire(SessionEvent::AuthRefreshSuccess, &EventArgs::Empty).unwrap();
        assert_eq!(token_of(state), Some("after-refresh".to_owned()));

        fake.clear_token(TokenKind::Access);
        fake.fire(SessionEvent::AuthLogout, &EventArgs::Empty).unwrap();
        assert_eq!(token_of(state), None);
    });
}

#[test]
fn timer_tick_picks_up_silent_changes() {
    with_owner(|_| {
        let session = SessionContext::new();
        let fake = FakeClient::signed_in("abc", T);
        session.publish(dyn_client(&fake));
        let timers = FakeTimers::default();
        let state = watch_token(session, TokenKind::Access, Signal::from(Some(Period::from_secs(5))), timers.starter());
        settle();
        assert_eq!(timers.started(), vec![5_000]);

        fake.set_token(TokenKind::Access, "rotated", T + 60);
        assert_eq!(token_of(state), Some("abc".to_owned()));
        assert!(timers.fire());
        assert_eq!(token_of(state), Some("rotated".to_owned()));
    });
}

#[test]
fn republish_moves_subscriptions_and_timer_to_the_new_client() {
    with_owner(|_| {
        let session = SessionContext::new();
        let first = dyn_client(&FakeClient::signed_in("one", T));
        session.publish(Rc::clone(&first));
        let timers = FakeTimers::default();
        let state = watch_token(session, TokenKind::Access, Signal::from(None::<Period>), timers.starter());
        settle();
        assert_eq!(first.events().subscriber_count(SessionEvent::AuthSuccess), 1);

        let second = dyn_client(&FakeClient::signed_in("two", T));
        session.publish(Rc::clone(&second));
        settle();

        assert_eq!(token_of(state), Some("two".to_owned()));
        for event in TOKEN_EVENTS {
            assert_eq!(first.events().subscriber_count(event), 0, "{event:?} left on old client");
            assert_eq!(second.events().subscriber_count(event), 1, "{event:?} duplicated");
        }
        assert_eq!(timers.live(), 1);
        assert_eq!(timers.started().len(), 2);
    });
}

#[test]
fn disabling_the_period_stops_polling_but_keeps_event_rereads() {
    with_owner(|_| {
        let session = SessionContext::new();
        let fake = FakeClient::signed_in("abc", T);
        let client = dyn_client(&fake);
        session.publish(Rc::clone(&client));
        let period = RwSignal::new(Some(Period::from_secs(5)));
        let timers = FakeTimers::default();
        let state = watch_token(session, TokenKind::Access, Signal::from(period), timers.starter());
        settle();
        assert_eq!(timers.live(), 1);

        period.set(Some(Period::Disabled));
        settle();
        assert_eq!(timers.live(), 0);
        assert!(!timers.fire());
        assert_eq!(client.events().subscriber_count(SessionEvent::AuthRefreshSuccess), 1);

        fake.set_token(TokenKind::Access, "refreshed", T + 5);
        fake.fire(SessionEvent::AuthRefreshSuccess, &EventArgs::Empty).unwrap();
        assert_eq!(token_of(state), Some("refreshed".to_owned()));

        period.set(Some(Period::from_secs(2)));
        settle();
        assert_eq!(timers.live(), 1);
        assert_eq!(timers.started(), vec![5_000, 2_000]);
    });
}

#[test]
fn cleanup_unsubscribes_and_stops_the_timer() {
    let timers = FakeTimers::default();
    let client = dyn_client(&FakeClient::signed_in("abc", T));
    with_owner(|owner| {
        let session = SessionContext::new();
        session.publish(Rc::clone(&client));
        watch_token(session, TokenKind::Access, Signal::from(None::<Period>), timers.starter());
        settle();
        assert_eq!(timers.live(), 1);

        owner.cleanup();
    });
    assert_eq!(timers.live(), 0);
    for event in TOKEN_EVENTS {
        assert_eq!(client.events().subscriber_count(event), 0);
    }
}

// =============================================================
// tock_with
// =============================================================

#[test]
fn tock_follows_its_period() {
    let timers = FakeTimers::default();
    with_owner(|owner| {
        let period = RwSignal::new(Period::from_secs(1));
        let now = tock_with(Signal::from(period), timers.starter());
        settle();
        assert_eq!(timers.started(), vec![1_000]);
        let first = now.get_untracked();
        assert!(timers.fire());
        assert!(now.get_untracked() >= first);

        period.set(Period::Disabled);
        settle();
        assert_eq!(timers.live(), 0);

        period.set(Period::from_secs(3));
        settle();
        assert_eq!(timers.started(), vec![1_000, 3_000]);

        owner.cleanup();
    });
    assert_eq!(timers.live(), 0);
}

// =============================================================
// use_route_path
// =============================================================

#[test]
fn route_path_hook_tracks_configuration_and_client() {
    with_owner(|_| {
        let session = SessionContext::new();
        provide_context(session);
        let logout = use_route_path(GuardRoute::Logout, None);
        let account = use_route_path(GuardRoute::Account, Some("/profile".to_owned()));
        assert_eq!(logout.get_untracked(), "/logout");
        assert_eq!(account.get_untracked(), "/profile");

        let boxed: Box<dyn IdentityClient> = Box::new(FakeClient::new());
        let paths = SessionPaths { logout: "/bye".to_owned(), ..SessionPaths::default() };
        session.publish(Rc::new(wrap(boxed).with_paths(paths)));
        assert_eq!(logout.get_untracked(), "/bye");
    });
}
