//! Keycloak sessions for Leptos apps: bootstrap, event multiplexing,
//! cross-redirect stash, token polling and route guards.
//!
//! The crate is compiled to WebAssembly with the `hydrate` feature and runs
//! in the browser. Without it (server rendering, native tests) every browser
//! touchpoint degrades to a no-op: storage reads are empty, navigation is
//! skipped, and no bootstrap starts.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`stash`] | Tab-scoped JSON stash for the return path and token snapshot |
//! | [`client`] | Identity client boundary and the [`client::events`] multiplexer |
//! | [`bootstrap`] | One-time runtime load, construction and wrapping |
//! | [`config`] | Provider configuration, URL normalization, option merging |
//! | [`poll`] | Polling periods, token change detection, timer slots |
//! | [`guards`] | Pure route-guard decisions and their side effects |
//! | [`state`] | Session status state machine and shared context |
//! | [`hooks`] | `use_keycloak`, `use_tock`, `use_token` and friends |
//! | [`components`] | `KeycloakProvider`, `Protected`, `Login`, `Logout`, ... |
//! | [`error`] | Error taxonomy |
//!
//! ## Usage
//!
//! ```ignore
//! let config = SessionConfig::new("https://id.example.com", "acme", "web-app");
//! view! {
//!     <Router>
//!         <KeycloakProvider config=config>
//!             <Routes fallback=|| "Not found">
//!                 <Route path=path!("/login") view=Login />
//!                 <Route path=path!("/logout") view=Logout />
//!                 <Route path=path!("/account") view=AccountRedirect />
//!                 <Route path=path!("/reports") view=|| view! { <Protected><Reports /></Protected> } />
//!             </Routes>
//!         </KeycloakProvider>
//!     </Router>
//! }
//! ```

pub mod bootstrap;
pub mod client;
pub mod components;
pub mod config;
pub mod error;
pub mod guards;
pub mod hooks;
pub mod poll;
pub mod stash;
pub mod state;
pub mod util;

#[cfg(test)]
mod testutil;

pub use components::{AccountRedirect, KeycloakProvider, Login, Logout, Protect, Protected, RegisterRedirect, TokenInfo};
pub use config::{AppendPath, GuardRoute, SessionConfig};
pub use error::{SessionError, StorageError};
pub use hooks::{
    use_keycloak, use_route_path, use_session, use_session_status, use_time_left, use_tock, use_token,
};
pub use state::SessionStatus;

#[cfg(feature = "hydrate")]
pub use util::logging::init_console_logging;
