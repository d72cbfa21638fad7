//! Wall-clock sampling in seconds since the Unix epoch.
//!
//! The browser build reads `Date.now()`; native builds (SSR, tests) read the
//! system clock, since `SystemTime` is unavailable on `wasm32-unknown-unknown`.

#[cfg(test)]
#[path = "clock_test.rs"]
mod clock_test;

/// Current time in fractional seconds.
pub fn now_secs() -> f64 {
    #[cfg(feature = "hydrate")]
    {
        js_sys::Date::now() / 1000.0
    }
    #[cfg(not(feature = "hydrate"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0.0, |d| d.as_secs_f64())
    }
}
