//! Session provider configuration.
//!
//! SYSTEM CONTEXT
//! ==============
//! Configuration arrives either as component props or as a JSON document
//! shipped with the app (a `.env.json`-style file). Keys are camelCase so the
//! same document a JS deployment already has can be reused.
//!
//! DESIGN
//! ======
//! Construction options are merged in a fixed priority order, lowest first:
//! stashed tokens, caller options, the offline scope flag, then the
//! endpoint triple (url, realm, clientId) which callers cannot override.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SessionError;
use crate::stash::TokenSnapshot;

pub const DEFAULT_REALM: &str = "master";
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_LOGOUT_PATH: &str = "/logout";
pub const DEFAULT_REGISTER_PATH: &str = "/register";
pub const DEFAULT_ACCOUNT_PATH: &str = "/account";
pub const DEFAULT_AUTH_SUB_PATH: &str = "/auth";
pub const DEFAULT_REDIRECT: &str = "/";
pub const DEFAULT_SILENT_CHECK_SSO_PATH: &str = "/silent-check-sso.html";
pub const OFFLINE_SCOPE: &str = "offline_access";

/// Where the identity runtime script lives, relative to the provider URL.
pub const RUNTIME_SCRIPT_PATH: &str = "/js/keycloak.js";

/// Whether to suffix the provider URL with a sub-path.
///
/// Deserializes from `true`, `false` or a string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AppendPath {
    Flag(bool),
    Custom(String),
}

impl Default for AppendPath {
    fn default() -> Self {
        Self::Flag(true)
    }
}

impl AppendPath {
    /// Suffix to add, or `None` when appending is off.
    #[must_use]
    pub fn suffix(&self) -> Option<&str> {
        match self {
            Self::Flag(true) => Some(DEFAULT_AUTH_SUB_PATH),
            Self::Flag(false) => None,
            Self::Custom(path) if path.is_empty() => None,
            Self::Custom(path) => Some(path),
        }
    }
}

/// The routes this crate provides guards for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GuardRoute {
    Login,
    Logout,
    Register,
    Account,
}

/// Route paths guards are mounted under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionPaths {
    pub login: String,
    pub logout: String,
    pub register: String,
    pub account: String,
}

impl Default for SessionPaths {
    fn default() -> Self {
        Self {
            login: DEFAULT_LOGIN_PATH.to_owned(),
            logout: DEFAULT_LOGOUT_PATH.to_owned(),
            register: DEFAULT_REGISTER_PATH.to_owned(),
            account: DEFAULT_ACCOUNT_PATH.to_owned(),
        }
    }
}

impl SessionPaths {
    #[must_use]
    pub fn get(&self, route: GuardRoute) -> &str {
        match route {
            GuardRoute::Login => &self.login,
            GuardRoute::Logout => &self.logout,
            GuardRoute::Register => &self.register,
            GuardRoute::Account => &self.account,
        }
    }
}

/// Identity of one bootstrap. A change in any field re-runs the sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BootstrapKey {
    pub url: String,
    pub realm: String,
    pub client_id: Option<String>,
}

/// Everything the session provider accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Identity provider base URL.
    pub url: String,
    /// Required; bootstrap fails without it.
    pub client_id: Option<String>,
    pub realm: String,
    pub login_path: String,
    pub logout_path: String,
    pub register_path: String,
    pub account_path: String,
    /// Passed through to client initialization.
    pub init_options: Map<String, Value>,
    /// Passed through to client construction.
    pub keycloak_options: Map<String, Value>,
    /// Request an offline refresh token.
    pub offline: bool,
    pub append_path: AppendPath,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            client_id: None,
            realm: DEFAULT_REALM.to_owned(),
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            logout_path: DEFAULT_LOGOUT_PATH.to_owned(),
            register_path: DEFAULT_REGISTER_PATH.to_owned(),
            account_path: DEFAULT_ACCOUNT_PATH.to_owned(),
            init_options: Map::new(),
            keycloak_options: Map::new(),
            offline: false,
            append_path: AppendPath::default(),
        }
    }
}

impl SessionConfig {
    pub fn new(url: impl Into<String>, realm: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            realm: realm.into(),
            client_id: Some(client_id.into()),
            ..Self::default()
        }
    }

    /// Parse a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfig`] if the document is not valid.
    pub fn from_json(raw: &str) -> Result<Self, SessionError> {
        serde_json::from_str(raw).map_err(|e| SessionError::InvalidConfig(e.to_string()))
    }

    /// The configured client id.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingClientId`] when absent or blank.
    pub fn require_client_id(&self) -> Result<&str, SessionError> {
        match self.client_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(SessionError::MissingClientId),
        }
    }

    #[must_use]
    pub fn provider_url(&self) -> String {
        normalize_url(&self.url, &self.append_path)
    }

    #[must_use]
    pub fn runtime_script_url(&self) -> String {
        format!("{}{RUNTIME_SCRIPT_PATH}", self.provider_url())
    }

    #[must_use]
    pub fn bootstrap_key(&self) -> BootstrapKey {
        BootstrapKey {
            url: self.provider_url(),
            realm: self.realm.clone(),
            client_id: self.client_id.clone(),
        }
    }

    #[must_use]
    pub fn paths(&self) -> SessionPaths {
        SessionPaths {
            login: self.login_path.clone(),
            logout: self.logout_path.clone(),
            register: self.register_path.clone(),
            account: self.account_path.clone(),
        }
    }

    /// Construction options for the identity client, merged by priority.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingClientId`] when no client id is set.
    pub fn client_options(&self, stashed: Option<&TokenSnapshot>) -> Result<Map<String, Value>, SessionError> {
        let client_id = self.require_client_id()?;

        let mut options = match stashed.map(serde_json::to_value) {
            Some(Ok(Value::Object(tokens))) => tokens,
            _ => Map::new(),
        };
        for (key, value) in &self.keycloak_options {
            options.insert(key.clone(), value.clone());
        }
        if self.offline {
            let scope = append_offline_scope(options.get("scope").and_then(Value::as_str));
            options.insert("scope".to_owned(), Value::String(scope));
        }
        options.insert("url".to_owned(), Value::String(self.provider_url()));
        options.insert("realm".to_owned(), Value::String(self.realm.clone()));
        options.insert("clientId".to_owned(), Value::String(client_id.to_owned()));
        Ok(options)
    }

    /// Initialization options with the silent SSO default filled in.
    ///
    /// `origin` is the page origin (`https://app.example`); without one no
    /// default is injected.
    #[must_use]
    pub fn init_options(&self, origin: Option<&str>) -> Map<String, Value> {
        let mut options = self.init_options.clone();
        if let Some(origin) = origin {
            options
                .entry("silentCheckSsoRedirectUri")
                .or_insert_with(|| Value::String(format!("{}{DEFAULT_SILENT_CHECK_SSO_PATH}", origin.trim_end_matches('/'))));
        }
        options
    }
}

/// Canonical provider URL: drop one trailing `/`, add the sub-path, then
/// drop every trailing `/`.
#[must_use]
pub fn normalize_url(url: &str, append: &AppendPath) -> String {
    let mut out = match append.suffix() {
        Some(suffix) => format!("{}{suffix}", url.strip_suffix('/').unwrap_or(url)),
        None => url.to_owned(),
    };
    out.truncate(out.trim_end_matches('/').len());
    out
}

/// Add the offline scope flag to a caller-supplied scope string.
#[must_use]
pub fn append_offline_scope(scope: Option<&str>) -> String {
    match scope.map(str::trim) {
        Some(existing) if existing.split_whitespace().any(|s| s == OFFLINE_SCOPE) => existing.to_owned(),
        Some(existing) if !existing.is_empty() => format!("{existing} {OFFLINE_SCOPE}"),
        _ => OFFLINE_SCOPE.to_owned(),
    }
}
