//! Full-page navigation helpers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Provider-hosted pages (register, account) live outside the router, so
//! reaching them means replacing the document rather than pushing a route.

/// Replace the current document with `url`. No-op outside the browser.
pub fn assign_location(url: &str) {
    #[cfg(feature = "hydrate")]
    {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().set_href(url) {
                tracing::warn!(url, error = ?e, "navigation failed");
            }
        }
    }
    #[cfg(not(feature = "hydrate"))]
    {
        tracing::debug!(url, "skipping navigation outside the browser");
    }
}

/// Origin of the current page (`https://app.example.com`), if known.
pub fn current_origin() -> Option<String> {
    #[cfg(feature = "hydrate")]
    {
        web_sys::window().and_then(|w| w.location().origin().ok())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        None
    }
}
