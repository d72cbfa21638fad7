//! Leptos components wiring the session to the router.
//!
//! SYSTEM CONTEXT
//! ==============
//! `KeycloakProvider` bootstraps the client and provides the
//! `SessionContext`; every other component reads it and delegates its
//! decision to `crate::guards`.

pub mod login;
pub mod logout;
pub mod protect;
pub mod provider;
pub mod provider_pages;
pub mod token_info;

pub use self::login::Login;
pub use self::logout::Logout;
pub use self::protect::{Protect, Protected};
pub use self::provider::KeycloakProvider;
pub use self::provider_pages::{AccountRedirect, RegisterRedirect};
pub use self::token_info::TokenInfo;
