use wasm_bindgen::prelude::*;

#[allow(missing_docs)]
#[wasm_bindgen]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

fn convert_level(level: LogLevel) -> log::Level {
    match level {
        LogLevel::Trace => log::Level::Trace,
        LogLevel::Debug => log::Level::Debug,
        LogLevel::Info => log::Level::Info,
        LogLevel::Warn => log::Level::Warn,
        LogLevel::Error => log::Level::Error,
    }
}

/// Installs the panic hook and routes `log` records to the browser console.
///
/// Safe to call more than once; only the first call sets the log level.
#[allow(missing_docs)]
#[wasm_bindgen]
pub fn init_sdk(log_level: Option<LogLevel>) {
    console_error_panic_hook::set_once();

    let log_level = convert_level(log_level.unwrap_or(LogLevel::Info));
    if let Err(e) = console_log::init_with_level(log_level) {
        log::debug!("Logger already initialized: {e}");
    }
}
