//! Test doubles for the identity client, runtime loader, client factory
//! and timers, plus a reactive harness for effect-driven code.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use any_spawner::Executor;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use leptos::reactive::owner::Owner;
use serde_json::{Map, Value};

use crate::bootstrap::{ClientFactory, RuntimeLoader};
use crate::client::{
    Claims, EventArgs, EventHandler, IdentityClient, LoginOptions, LogoutOptions, SessionEvent, TokenKind,
    UrlOptions,
};
use crate::error::{SessionError, SubscriberError};
use crate::hooks::Tick;

#[derive(Default)]
pub struct FakeState {
    pub authenticated: bool,
    pub tokens: HashMap<TokenKind, (String, Claims)>,
    pub handlers: HashMap<SessionEvent, EventHandler>,
    pub options: Map<String, Value>,
    pub init_calls: Vec<Map<String, Value>>,
    pub login_calls: Vec<LoginOptions>,
    pub logout_calls: Vec<LogoutOptions>,
}

/// In-memory identity client. Clones share state, so a test can keep a
/// handle after the original is moved into `wrap`.
#[derive(Clone, Default)]
pub struct FakeClient {
    pub state: Rc<RefCell<FakeState>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticated client whose access token expires at `exp`.
    pub fn signed_in(token: &str, exp: i64) -> Self {
        let client = Self::new();
        client.set_token(TokenKind::Access, token, exp);
        client.state.borrow_mut().authenticated = true;
        client
    }

    pub fn set_token(&self, kind: TokenKind, token: &str, exp: i64) {
        self.state
            .borrow_mut()
            .tokens
            .insert(kind, (token.to_owned(), Claims::expiring_at(exp)));
    }

    pub fn clear_token(&self, kind: TokenKind) {
        self.state.borrow_mut().tokens.remove(&kind);
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.state.borrow_mut().authenticated = authenticated;
    }

    /// Occupy a handler slot before wrapping, like app code assigning
    /// `kc.onReady = ...`.
    pub fn preset_handler(&self, event: SessionEvent, handler: EventHandler) {
        self.state.borrow_mut().handlers.insert(event, handler);
    }

    /// Invoke the native slot for `event`, as the real client would.
    pub fn fire(&self, event: SessionEvent, args: &EventArgs) -> Result<(), SubscriberError> {
        let handler = self.state.borrow().handlers.get(&event).cloned();
        match handler {
            Some(handler) => handler(args),
            None => Ok(()),
        }
    }

    pub fn login_count(&self) -> usize {
        self.state.borrow().login_calls.len()
    }

    pub fn logout_count(&self) -> usize {
        self.state.borrow().logout_calls.len()
    }
}

impl IdentityClient for FakeClient {
    fn init(&self, options: &Map<String, Value>) {
        self.state.borrow_mut().init_calls.push(options.clone());
    }

    fn authenticated(&self) -> bool {
        self.state.borrow().authenticated
    }

    fn token(&self, kind: TokenKind) -> Option<String> {
        self.state.borrow().tokens.get(&kind).map(|(t, _)| t.clone())
    }

    fn claims(&self, kind: TokenKind) -> Option<Claims> {
        self.state.borrow().tokens.get(&kind).map(|(_, c)| c.clone())
    }

    fn login(&self, options: &LoginOptions) {
        self.state.borrow_mut().login_calls.push(options.clone());
    }

    fn logout(&self, options: &LogoutOptions) {
        self.state.borrow_mut().logout_calls.push(options.clone());
    }

    fn create_register_url(&self, options: &UrlOptions) -> String {
        format!(
            "https://id.example.com/register?redirect_uri={}",
            options.redirect_uri.as_deref().unwrap_or("")
        )
    }

    fn create_account_url(&self, options: &UrlOptions) -> String {
        format!(
            "https://id.example.com/account?referrer_uri={}",
            options.redirect_uri.as_deref().unwrap_or("")
        )
    }

    fn take_handler(&self, event: SessionEvent) -> Option<EventHandler> {
        self.state.borrow_mut().handlers.remove(&event)
    }

    fn install_handler(&self, event: SessionEvent, handler: EventHandler) {
        self.state.borrow_mut().handlers.insert(event, handler);
    }
}

/// Loader that counts `load` calls and resolves with a preset outcome.
#[derive(Clone, Default)]
pub struct CountingLoader {
    pub available: Rc<Cell<bool>>,
    pub loads: Rc<Cell<usize>>,
    pub fail_with: Option<String>,
}

impl CountingLoader {
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn present() -> Self {
        let loader = Self::default();
        loader.available.set(true);
        loader
    }

    pub fn failing(message: &str) -> Self {
        Self { fail_with: Some(message.to_owned()), ..Self::default() }
    }
}

impl RuntimeLoader for CountingLoader {
    fn is_available(&self) -> bool {
        self.available.get()
    }

    fn load(&self, _script_url: &str) -> LocalBoxFuture<'static, Result<(), SessionError>> {
        self.loads.set(self.loads.get() + 1);
        let available = Rc::clone(&self.available);
        let outcome = self.fail_with.clone();
        async move {
            match outcome {
                Some(message) => Err(SessionError::RuntimeLoad(message)),
                None => {
                    available.set(true);
                    Ok(())
                }
            }
        }
        .boxed_local()
    }
}

/// Factory producing [`FakeClient`]s and remembering the options it saw.
#[derive(Clone, Default)]
pub struct FakeFactory {
    pub built: Rc<RefCell<Vec<FakeClient>>>,
}

impl ClientFactory for FakeFactory {
    type Client = FakeClient;

    fn construct(&self, options: &Map<String, Value>) -> Result<FakeClient, SessionError> {
        let client = FakeClient::new();
        client.state.borrow_mut().options = options.clone();
        self.built.borrow_mut().push(client.clone());
        Ok(client)
    }
}

// =============================================================
// Reactive harness
// =============================================================

/// Run `test` under a fresh owner, with effects spawned on this thread's
/// local pool. Call [`settle`] to let them run.
pub fn with_owner<T>(test: impl FnOnce(&Owner) -> T) -> T {
    let _ = Executor::init_futures_executor();
    let owner = Owner::new();
    owner.with(|| test(&owner))
}

/// Run every effect that is ready until none can make progress.
pub fn settle() {
    Executor::poll_local();
}

/// Interval factory that records what was started and lets a test fire the
/// newest live timer by hand.
#[derive(Clone, Default)]
pub struct FakeTimers {
    started: Rc<RefCell<Vec<u32>>>,
    live: Rc<Cell<usize>>,
    newest: Rc<RefCell<Option<Weak<RefCell<Tick>>>>>,
}

pub struct FakeTimer {
    live: Rc<Cell<usize>>,
    _tick: Rc<RefCell<Tick>>,
}

impl Drop for FakeTimer {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

impl FakeTimers {
    pub fn starter(&self) -> impl Fn(u32, Tick) -> FakeTimer + 'static {
        let timers = self.clone();
        move |millis, tick| timers.start(millis, tick)
    }

    fn start(&self, millis: u32, tick: Tick) -> FakeTimer {
        self.started.borrow_mut().push(millis);
        self.live.set(self.live.get() + 1);
        let tick = Rc::new(RefCell::new(tick));
        *self.newest.borrow_mut() = Some(Rc::downgrade(&tick));
        FakeTimer { live: Rc::clone(&self.live), _tick: tick }
    }

    pub fn live(&self) -> usize {
        self.live.get()
    }

    pub fn started(&self) -> Vec<u32> {
        self.started.borrow().clone()
    }

    /// Fire the newest timer; `false` if it has been dropped.
    pub fn fire(&self) -> bool {
        let tick = self.newest.borrow().as_ref().and_then(Weak::upgrade);
        match tick {
            Some(tick) => {
                let mut tick = tick.borrow_mut();
                (*tick)();
                true
            }
            None => false,
        }
    }
}
