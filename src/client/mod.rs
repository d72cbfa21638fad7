//! Boundary types for the external identity client.
//!
//! SYSTEM CONTEXT
//! ==============
//! The identity client (Keycloak's JS adapter in the browser) is an opaque
//! capability: it owns the tokens, performs login/logout redirects, builds
//! provider-hosted URLs, and reports lifecycle changes through one handler
//! slot per event. Everything else in this crate talks to it through
//! [`IdentityClient`], usually via the multiplexing [`WrappedClient`].


pub mod events;
#[cfg(feature = "hydrate")]
pub mod js;
pub mod slots;

use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SessionError, SubscriberError};
use crate::stash::TokenSnapshot;

pub use self::events::{DispatchReport, EventTable, Subscription, WrappedClient, wrap};
pub use self::slots::HandlerSlots;

/// Handler stored in a client's single event slot, or added as a subscriber.
pub type EventHandler = Rc<dyn Fn(&EventArgs) -> Result<(), SubscriberError>>;

/// The three tokens a session carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TokenKind {
    /// The access token.
    #[default]
    Access,
    Refresh,
    Id,
}

impl TokenKind {
    pub const ALL: [Self; 3] = [Self::Access, Self::Refresh, Self::Id];

    /// Poll cadence used when the caller does not pick one. Refresh tokens
    /// rotate far less often than access tokens.
    #[must_use]
    pub fn default_period(self) -> Duration {
        match self {
            Self::Access | Self::Id => Duration::from_secs(1),
            Self::Refresh => Duration::from_secs(10),
        }
    }

    /// Property name of the raw token on the JS client.
    #[must_use]
    pub fn field(self) -> &'static str {
        match self {
            Self::Access => "token",
            Self::Refresh => "refreshToken",
            Self::Id => "idToken",
        }
    }

    /// Property name of the decoded claims on the JS client.
    #[must_use]
    pub fn parsed_field(self) -> &'static str {
        match self {
            Self::Access => "tokenParsed",
            Self::Refresh => "refreshTokenParsed",
            Self::Id => "idTokenParsed",
        }
    }
}

impl FromStr for TokenKind {
    type Err = SessionError;

    /// Accepts `""`/`"token"`/`"access"`, `"refresh"`/`"refreshToken"` and
    /// `"id"`/`"idToken"`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "" | "token" | "access" => Ok(Self::Access),
            "refresh" | "refreshToken" => Ok(Self::Refresh),
            "id" | "idToken" => Ok(Self::Id),
            other => Err(SessionError::InvalidConfig(format!("unknown token kind: {other}"))),
        }
    }
}

/// Decoded token payload. Only `exp` matters to the guards; everything else
/// is carried through for display.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiry, seconds since the Unix epoch (UTC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    #[must_use]
    pub fn expiring_at(exp: i64) -> Self {
        Self { exp: Some(exp), ..Self::default() }
    }
}

/// The fixed set of lifecycle events a client reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    Ready,
    AuthSuccess,
    AuthError,
    AuthRefreshSuccess,
    AuthRefreshError,
    AuthLogout,
    TokenExpired,
}

impl SessionEvent {
    pub const COUNT: usize = 7;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Ready,
        Self::AuthSuccess,
        Self::AuthError,
        Self::AuthRefreshSuccess,
        Self::AuthRefreshError,
        Self::AuthLogout,
        Self::TokenExpired,
    ];

    /// Dense index into per-event tables.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Ready => 0,
            Self::AuthSuccess => 1,
            Self::AuthError => 2,
            Self::AuthRefreshSuccess => 3,
            Self::AuthRefreshError => 4,
            Self::AuthLogout => 5,
            Self::TokenExpired => 6,
        }
    }

    /// Name of the single handler slot on the JS client.
    #[must_use]
    pub fn handler_name(self) -> &'static str {
        match self {
            Self::Ready => "onReady",
            Self::AuthSuccess => "onAuthSuccess",
            Self::AuthError => "onAuthError",
            Self::AuthRefreshSuccess => "onAuthRefreshSuccess",
            Self::AuthRefreshError => "onAuthRefreshError",
            Self::AuthLogout => "onAuthLogout",
            Self::TokenExpired => "onTokenExpired",
        }
    }
}

impl FromStr for SessionEvent {
    type Err = SessionError;

    /// Accepts both the short form (`"authSuccess"`) and the handler slot
    /// name (`"onAuthSuccess"`).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let short = raw.strip_prefix("on").unwrap_or(raw);
        Self::ALL
            .into_iter()
            .find(|event| event.handler_name()[2..].eq_ignore_ascii_case(short))
            .ok_or_else(|| SessionError::UnknownEvent(raw.to_owned()))
    }
}

/// Error payload of an `AuthError` event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

/// Arguments a client passes to an event handler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EventArgs {
    #[default]
    Empty,
    Ready {
        authenticated: bool,
    },
    Error(ProviderError),
}

/// Options for [`IdentityClient::login`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idp_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Options for [`IdentityClient::logout`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

/// Options for provider-hosted register/account URLs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Capability surface of the external identity client.
///
/// `login` and `logout` navigate the whole page away; nothing after them is
/// expected to run in the current document.
pub trait IdentityClient {
    /// Start the client's own initialization (session check, token restore).
    /// Completion is reported through the `Ready` or `AuthError` events.
    fn init(&self, options: &Map<String, Value>);

    fn authenticated(&self) -> bool;

    fn token(&self, kind: TokenKind) -> Option<String>;

    /// Decoded claims for `kind`; present iff the raw token is.
    fn claims(&self, kind: TokenKind) -> Option<Claims>;

    fn login(&self, options: &LoginOptions);

    fn logout(&self, options: &LogoutOptions);

    fn create_register_url(&self, options: &UrlOptions) -> String;

    fn create_account_url(&self, options: &UrlOptions) -> String;

    /// Remove and return whatever currently occupies the slot for `event`.
    fn take_handler(&self, event: SessionEvent) -> Option<EventHandler>;

    /// Occupy the slot for `event`, replacing any previous handler.
    fn install_handler(&self, event: SessionEvent, handler: EventHandler);

    /// All three raw tokens at once.
    fn snapshot(&self) -> TokenSnapshot {
        TokenSnapshot {
            token: self.token(TokenKind::Access),
            refresh_token: self.token(TokenKind::Refresh),
            id_token: self.token(TokenKind::Id),
        }
    }
}

impl<T: IdentityClient + ?Sized> IdentityClient for Box<T> {
    fn init(&self, options: &Map<String, Value>) {
        (**self).init(options);
    }

    fn authenticated(&self) -> bool {
        (**self).authenticated()
    }

    fn token(&self, kind: TokenKind) -> Option<String> {
        (**self).token(kind)
    }

    fn claims(&self, kind: TokenKind) -> Option<Claims> {
        (**self).claims(kind)
    }

    fn login(&self, options: &LoginOptions) {
        (**self).login(options);
    }

    fn logout(&self, options: &LogoutOptions) {
        (**self).logout(options);
    }

    fn create_register_url(&self, options: &UrlOptions) -> String {
        (**self).create_register_url(options)
    }

    fn create_account_url(&self, options: &UrlOptions) -> String {
        (**self).create_account_url(options)
    }

    fn take_handler(&self, event: SessionEvent) -> Option<EventHandler> {
        (**self).take_handler(event)
    }

    fn install_handler(&self, event: SessionEvent, handler: EventHandler) {
        (**self).install_handler(event, handler);
    }
}

/// Type-erased client, the form components share through context.
pub type DynClient = WrappedClient<Box<dyn IdentityClient>>;
