//! Browser binding to the Keycloak JS adapter (`window.Keycloak`).
//!
//! SYSTEM CONTEXT
//! ==============
//! The adapter script is served by the identity server itself at
//! `{url}/js/keycloak.js`. [`ScriptLoader`] injects it once per page;
//! [`KeycloakFactory`] constructs clients from it and erases them into
//! `Box<dyn IdentityClient>` so the rest of the crate stays browser-agnostic.
//!
//! ERROR HANDLING
//! ==============
//! Values cross the boundary as JSON. Anything the adapter returns that does
//! not decode reads as absent. Rejected `init`/`login`/`logout` promises are
//! logged; their outcome reaches the app through the event slots instead.

use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use js_sys::{Function, Promise, Reflect};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use super::{
    Claims, EventArgs, EventHandler, HandlerSlots, IdentityClient, LoginOptions, LogoutOptions, ProviderError,
    SessionEvent, TokenKind, UrlOptions,
};
use crate::bootstrap::{ClientFactory, LoadOnce, RuntimeLoader};
use crate::error::{SessionError, SubscriberError};

#[wasm_bindgen]
extern "C" {
    /// The adapter's client class.
    pub type Keycloak;

    #[wasm_bindgen(constructor, catch)]
    fn new(config: &JsValue) -> Result<Keycloak, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn init(this: &Keycloak, options: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn login(this: &Keycloak, options: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn logout(this: &Keycloak, options: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = createRegisterUrl)]
    fn create_register_url(this: &Keycloak, options: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = createAccountUrl)]
    fn create_account_url(this: &Keycloak, options: &JsValue) -> Result<JsValue, JsValue>;
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    let raw = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&raw)
}

fn from_js<T: DeserializeOwned>(value: &JsValue) -> Option<T> {
    if value.is_undefined() || value.is_null() {
        return None;
    }
    let raw = String::from(js_sys::JSON::stringify(value).ok()?);
    serde_json::from_str(&raw).ok()
}

fn args_from_js(event: SessionEvent, raw: &JsValue) -> EventArgs {
    match event {
        SessionEvent::Ready => EventArgs::Ready { authenticated: raw.as_bool().unwrap_or(false) },
        SessionEvent::AuthError => EventArgs::Error(
            from_js::<ProviderError>(raw).unwrap_or_else(|| ProviderError { error: format!("{raw:?}"), ..ProviderError::default() }),
        ),
        _ => EventArgs::Empty,
    }
}

fn args_to_js(args: &EventArgs) -> JsValue {
    match args {
        EventArgs::Empty => JsValue::UNDEFINED,
        EventArgs::Ready { authenticated } => JsValue::from_bool(*authenticated),
        EventArgs::Error(error) => to_js(error).unwrap_or(JsValue::UNDEFINED),
    }
}

/// Await a promise-returning adapter call in the background, logging a
/// rejection.
fn settle(action: &'static str, result: Result<JsValue, JsValue>) {
    let value = match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(action, error = ?e, "identity client call threw");
            return;
        }
    };
    if let Ok(promise) = value.dyn_into::<Promise>() {
        leptos::task::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                tracing::warn!(action, error = ?e, "identity client call rejected");
            }
        });
    }
}

fn url_from_js(action: &'static str, result: Result<JsValue, JsValue>) -> String {
    match result {
        Ok(value) => value.as_string().unwrap_or_else(|| {
            tracing::warn!(action, "identity client returned a non-string url");
            String::new()
        }),
        Err(e) => {
            tracing::warn!(action, error = ?e, "identity client call threw");
            String::new()
        }
    }
}

/// A live `Keycloak` instance plus the closures occupying its handler slots.
pub struct JsIdentityClient {
    inner: Keycloak,
    slots: RefCell<HandlerSlots<Closure<dyn FnMut(JsValue)>>>,
}

impl JsIdentityClient {
    /// Run the adapter constructor with `options`.
    ///
    /// # Errors
    ///
    /// [`SessionError::Construct`] if the options cannot be converted or the
    /// constructor throws.
    pub fn construct(options: &Map<String, Value>) -> Result<Self, SessionError> {
        let config = to_js(options).map_err(|e| SessionError::Construct(format!("{e:?}")))?;
        let inner = Keycloak::new(&config).map_err(|e| SessionError::Construct(format!("{e:?}")))?;
        Ok(Self { inner, slots: RefCell::new(HandlerSlots::new()) })
    }

    fn property(&self, name: &str) -> JsValue {
        Reflect::get(&self.inner, &JsValue::from_str(name)).unwrap_or(JsValue::UNDEFINED)
    }

    fn set_property(&self, name: &str, value: &JsValue) {
        if let Err(e) = Reflect::set(&self.inner, &JsValue::from_str(name), value) {
            tracing::warn!(name, error = ?e, "could not set identity client property");
        }
    }
}

/// A replaced instance can still fire its own timers (`onTokenExpired`);
/// its slots are cleared before the closures behind them are freed.
impl Drop for JsIdentityClient {
    fn drop(&mut self) {
        let inner = &self.inner;
        self.slots.get_mut().release(|event| {
            if let Err(e) = Reflect::set(inner, &JsValue::from_str(event.handler_name()), &JsValue::UNDEFINED) {
                tracing::warn!(event = event.handler_name(), error = ?e, "could not detach identity client handler");
            }
        });
    }
}

impl IdentityClient for JsIdentityClient {
    fn init(&self, options: &Map<String, Value>) {
        match to_js(options) {
            Ok(options) => settle("init", self.inner.init(&options)),
            Err(e) => tracing::warn!(error = ?e, "init options not convertible"),
        }
    }

    fn authenticated(&self) -> bool {
        self.property("authenticated").as_bool().unwrap_or(false)
    }

    fn token(&self, kind: TokenKind) -> Option<String> {
        self.property(kind.field()).as_string()
    }

    fn claims(&self, kind: TokenKind) -> Option<Claims> {
        from_js(&self.property(kind.parsed_field()))
    }

    fn login(&self, options: &LoginOptions) {
        let options = to_js(options).unwrap_or(JsValue::UNDEFINED);
        settle("login", self.inner.login(&options));
    }

    fn logout(&self, options: &LogoutOptions) {
        let options = to_js(options).unwrap_or(JsValue::UNDEFINED);
        settle("logout", self.inner.logout(&options));
    }

    fn create_register_url(&self, options: &UrlOptions) -> String {
        let options = to_js(options).unwrap_or(JsValue::UNDEFINED);
        url_from_js("createRegisterUrl", self.inner.create_register_url(&options))
    }

    fn create_account_url(&self, options: &UrlOptions) -> String {
        let options = to_js(options).unwrap_or(JsValue::UNDEFINED);
        url_from_js("createAccountUrl", self.inner.create_account_url(&options))
    }

    fn take_handler(&self, event: SessionEvent) -> Option<EventHandler> {
        let current = self.property(event.handler_name());
        self.set_property(event.handler_name(), &JsValue::UNDEFINED);
        if self.slots.borrow_mut().remove(event).is_some() {
            return None;
        }
        let function = current.dyn_into::<Function>().ok()?;
        let this: JsValue = self.inner.clone().into();
        Some(Rc::new(move |args: &EventArgs| -> Result<(), SubscriberError> {
            function
                .call1(&this, &args_to_js(args))
                .map(|_| ())
                .map_err(|e| format!("{e:?}").into())
        }))
    }

    fn install_handler(&self, event: SessionEvent, handler: EventHandler) {
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |raw: JsValue| {
            if let Err(e) = handler(&args_from_js(event, &raw)) {
                tracing::warn!(event = event.handler_name(), error = %e, "session event handler failed");
            }
        });
        self.set_property(event.handler_name(), closure.as_ref());
        self.slots.borrow_mut().insert(event, closure);
    }
}

/// Builds [`JsIdentityClient`]s, type-erased for context.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeycloakFactory;

impl ClientFactory for KeycloakFactory {
    type Client = Box<dyn IdentityClient>;

    fn construct(&self, options: &Map<String, Value>) -> Result<Self::Client, SessionError> {
        Ok(Box::new(JsIdentityClient::construct(options)?))
    }
}

/// Loads the adapter by appending a `<script>` tag to `<head>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScriptLoader;

impl RuntimeLoader for ScriptLoader {
    fn is_available(&self) -> bool {
        web_sys::window().is_some_and(|w| Reflect::has(&w, &JsValue::from_str("Keycloak")).unwrap_or(false))
    }

    fn load(&self, script_url: &str) -> LocalBoxFuture<'static, Result<(), SessionError>> {
        let started = inject_script(script_url);
        let url = script_url.to_owned();
        async move {
            let promise = started?;
            JsFuture::from(promise)
                .await
                .map(|_| tracing::info!(url, "identity runtime loaded"))
                .map_err(|e| SessionError::RuntimeLoad(format!("{url}: {e:?}")))
        }
        .boxed_local()
    }
}

fn inject_script(url: &str) -> Result<Promise, SessionError> {
    let fail = |what: &str| SessionError::RuntimeLoad(format!("{url}: {what}"));
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| fail("no document"))?;
    let head = document.head().ok_or_else(|| fail("no <head>"))?;
    let script = document
        .create_element("script")
        .map_err(|e| fail(&format!("{e:?}")))?
        .dyn_into::<web_sys::HtmlScriptElement>()
        .map_err(|_| fail("not a script element"))?;
    script.set_src(url);
    script.set_async(true);

    let promise = Promise::new(&mut |resolve, reject| {
        script.set_onload(Some(&resolve));
        script.set_onerror(Some(&reject));
    });
    head.append_child(&script).map_err(|e| fail(&format!("{e:?}")))?;
    tracing::debug!(url, "injected identity runtime script");
    Ok(promise)
}

thread_local! {
    static RUNTIME: Rc<LoadOnce<ScriptLoader>> = Rc::new(LoadOnce::new(ScriptLoader));
}

/// The page-wide runtime load, shared by every provider.
pub fn shared_runtime() -> Rc<LoadOnce<ScriptLoader>> {
    RUNTIME.with(Rc::clone)
}
