//! Reactive hooks over the published session.
//!
//! SYSTEM CONTEXT
//! ==============
//! All hooks read the [`SessionContext`] that `KeycloakProvider` places in
//! context, so they must be called below it.
//!
//! DESIGN
//! ======
//! Timers are held in a [`TimerSlot`] inside a local `StoredValue`. A period
//! or client change replaces the timer (old one dropped first) and owner
//! cleanup clears it, so at most one interval per hook is ever alive.
//!
//! The public hooks bind the browser interval; [`tock_with`] and
//! [`watch_token`] take the timer constructor so native tests can drive the
//! same wiring with a fake clock.

#[cfg(test)]
#[path = "hooks_test.rs"]
mod hooks_test;

use std::rc::Rc;

use leptos::prelude::*;

use crate::client::{DynClient, SessionEvent, Subscription, TokenKind};
use crate::config::GuardRoute;
use crate::error::SubscriberError;
use crate::guards::time_left;
use crate::poll::{Period, TimerSlot, TokenState, TokenWatch};
use crate::state::{SessionContext, SessionStatus};
use crate::util::clock::now_secs;

/// A repeating timer callback.
pub type Tick = Box<dyn FnMut()>;

#[cfg(feature = "hydrate")]
type Timer = gloo_timers::callback::Interval;

#[cfg(feature = "hydrate")]
fn start_timer(millis: u32, tick: Tick) -> Timer {
    gloo_timers::callback::Interval::new(millis, tick)
}

/// Server builds never run effects; the stand-in only keeps types aligned.
#[cfg(not(feature = "hydrate"))]
struct Timer;

#[cfg(not(feature = "hydrate"))]
fn start_timer(_millis: u32, _tick: Tick) -> Timer {
    Timer
}

/// Events after which a token is re-read without waiting for the timer.
const TOKEN_EVENTS: [SessionEvent; 4] = [
    SessionEvent::Ready,
    SessionEvent::AuthSuccess,
    SessionEvent::AuthRefreshSuccess,
    SessionEvent::AuthLogout,
];

/// The session context provided by `KeycloakProvider`.
///
/// # Panics
///
/// Panics when called outside a `KeycloakProvider`.
pub fn use_session() -> SessionContext {
    expect_context::<SessionContext>()
}

/// The published wrapped client, `None` until bootstrap completes.
pub fn use_keycloak() -> Signal<Option<Rc<DynClient>>, LocalStorage> {
    let session = use_session();
    Signal::derive_local(move || session.client())
}

pub fn use_session_status() -> ReadSignal<SessionStatus> {
    use_session().status.read_only()
}

/// Where the guard for `route` lives, for links and redirects: `explicit`,
/// else the path the client advertises, else the configured one.
pub fn use_route_path(route: GuardRoute, explicit: Option<String>) -> Signal<String, LocalStorage> {
    let session = use_session();
    Signal::derive_local(move || session.route_path(route, explicit.as_deref()))
}

/// Wall-clock seconds, republished every `period`. A disabled period stops
/// the timer and keeps the last sample.
pub fn use_tock(period: impl Into<Signal<Period>>) -> ReadSignal<f64> {
    tock_with(period.into(), start_timer)
}

/// [`use_tock`] over an arbitrary timer.
pub fn tock_with<H: 'static>(period: Signal<Period>, start: impl Fn(u32, Tick) -> H + 'static) -> ReadSignal<f64> {
    let (now, set_now) = signal(now_secs());
    let timer = StoredValue::new_local(TimerSlot::<H>::new());

    Effect::new(move || {
        let millis = period.get().millis();
        timer.update_value(|slot| match millis {
            Some(millis) => slot.replace(|| start(millis, Box::new(move || set_now.set(now_secs())))),
            None => slot.clear(),
        });
    });
    on_cleanup(move || {
        timer.try_update_value(TimerSlot::clear);
    });

    now
}

/// `{token, claims}` for `kind`, republished only when the value changes.
///
/// Checks immediately whenever a client is published, then on every
/// polling period and on the auth events in `TOKEN_EVENTS`. A `None`
/// period polls at the default for `kind`. `Some(Period::Disabled)` stops
/// only the polling: the publish-time check and the event re-reads keep
/// running, and the last value stays. Changing the period restarts the
/// wiring.
pub fn use_token(kind: TokenKind, period: impl Into<Signal<Option<Period>>>) -> ReadSignal<TokenState> {
    watch_token(use_session(), kind, period.into(), start_timer)
}

/// [`use_token`] over an explicit session and timer.
pub fn watch_token<H: 'static>(
    session: SessionContext,
    kind: TokenKind,
    period: Signal<Option<Period>>,
    start: impl Fn(u32, Tick) -> H + 'static,
) -> ReadSignal<TokenState> {
    let (state, set_state) = signal(TokenState::default());
    let watch = StoredValue::new_local(TokenWatch::new(kind));
    let timer = StoredValue::new_local(TimerSlot::<H>::new());
    let subscriptions = StoredValue::new_local(Vec::<Subscription>::new());

    let check = move |client: &DynClient| {
        if let Some(next) = watch.try_update_value(|w| w.check(client)).flatten() {
            set_state.set(next);
        }
    };
    let teardown = move || {
        timer.try_update_value(TimerSlot::clear);
        subscriptions.try_update_value(|subs| subs.drain(..).for_each(|s| s.unsubscribe()));
    };

    Effect::new(move || {
        let client = session.client();
        let period = period.get().unwrap_or_else(|| Period::for_kind(kind));
        teardown();
        let Some(client) = client else {
            return;
        };
        check(&*client);

        for event in TOKEN_EVENTS {
            let weak = Rc::downgrade(&client);
            let sub = client.subscribe(event, move |_| -> Result<(), SubscriberError> {
                if let Some(client) = weak.upgrade() {
                    check(&*client);
                }
                Ok(())
            });
            subscriptions.update_value(|subs| subs.push(sub));
        }

        if let Some(millis) = period.millis() {
            let weak = Rc::downgrade(&client);
            timer.update_value(|slot| {
                slot.replace(|| {
                    start(
                        millis,
                        Box::new(move || {
                            if let Some(client) = weak.upgrade() {
                                check(&*client);
                            }
                        }),
                    )
                });
            });
        }
    });
    on_cleanup(teardown);

    state
}

/// Seconds left on `kind`, recomputed every second and on token change.
pub fn use_time_left(kind: TokenKind) -> Signal<i64> {
    let now = use_tock(Period::from_secs(1));
    let token = use_token(kind, None::<Period>);
    Signal::derive(move || token.with(|t| time_left(t.claims.as_ref(), now.get())))
}
