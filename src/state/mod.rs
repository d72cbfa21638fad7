//! Reactive session state shared through Leptos context.

pub mod session;

pub use self::session::{SessionContext, SessionStatus};
