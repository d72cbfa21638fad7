//! Utility helpers shared across session modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate browser/environment concerns from guard and hook
//! logic to improve reuse and testability.

pub mod clock;
#[cfg(feature = "hydrate")]
pub mod logging;
pub mod navigate;
