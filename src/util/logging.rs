//! Browser console logging.

/// Route panics and `log`/`tracing` records to the browser console.
///
/// Safe to call more than once; later calls keep the first logger.
pub fn init_console_logging(level: log::Level) {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(level).is_err() {
        tracing::debug!("console logger already installed");
    }
}
