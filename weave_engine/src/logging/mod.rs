//! Global logging module for the Weave engine
//!
//! Provides thread-safe global logging with coded diagnostics, structured
//! JSON output, and a clean macro interface. The logger is optional: when no
//! global service has been initialized every log call is a no-op, so the
//! engine stays quiet as a library by default.

pub mod codes;
pub mod events;
pub mod macros;
pub mod service;

use crate::utils::Span;
use std::sync::{Arc, OnceLock};

// Re-export main types
pub use codes::Code;
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};

// ============================================================================
// GLOBAL STATE
// ============================================================================

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize global logging from runtime preferences
pub fn init_global_logging() -> Result<(), String> {
    let preferences = crate::config::runtime::LoggingPreferences::default();

    let logger: Arc<dyn Logger> = if preferences.use_structured_logging {
        Arc::new(StructuredLogger::new(preferences.min_log_level))
    } else {
        Arc::new(ConsoleLogger::new(preferences.min_log_level))
    };
    let service = Arc::new(LoggingService::new(logger, preferences.min_log_level));

    init_global_logging_with_service(service)?;

    let event = events::LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    );
    get_global_logger().log_event(event);

    Ok(())
}

/// Initialize with custom service (primarily for testing)
pub fn init_global_logging_with_service(service: Arc<LoggingService>) -> Result<(), String> {
    GLOBAL_LOGGER
        .set(service)
        .map_err(|_| "Global logger already initialized".to_string())
}

/// Check if global logging is initialized
pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

// ============================================================================
// GLOBAL ACCESS
// ============================================================================

/// Get global logger (panics if not initialized)
pub fn get_global_logger() -> &'static LoggingService {
    GLOBAL_LOGGER
        .get()
        .expect("Global logger not initialized. Call init_global_logging() first.")
        .as_ref()
}

/// Safe access to global logger
pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

// ============================================================================
// MACRO SUPPORT FUNCTIONS
// ============================================================================

/// Log error with optional span and context (used by log_error!)
pub fn log_error_with_context(
    code: Code,
    message: &str,
    span: Option<Span>,
    context: Vec<(&str, String)>,
) {
    if let Some(logger) = try_get_global_logger() {
        let mut event = LogEvent::error(code, message);
        if let Some(span) = span {
            event = event.with_span(span);
        }
        for (key, value) in context {
            event = event.with_context(key, &value);
        }
        logger.log_event(event);
    }
}

/// Log success with context (used by log_success!)
pub fn log_success_with_context(code: Code, message: &str, context: Vec<(&str, String)>) {
    if let Some(logger) = try_get_global_logger() {
        let mut event = LogEvent::success(code, message);
        for (key, value) in context {
            event = event.with_context(key, &value);
        }
        logger.log_event(event);
    }
}

/// Log info with context (used by log_info!)
pub fn log_info_with_context(message: &str, context: Vec<(&str, String)>) {
    if let Some(logger) = try_get_global_logger() {
        let mut event = LogEvent::info(message);
        for (key, value) in context {
            event = event.with_context(key, &value);
        }
        logger.log_event(event);
    }
}

/// Log warning with context (used by log_warning!)
pub fn log_warning_with_context(message: &str, context: Vec<(&str, String)>) {
    if let Some(logger) = try_get_global_logger() {
        let mut event = LogEvent::warning(message);
        for (key, value) in context {
            event = event.with_context(key, &value);
        }
        logger.log_event(event);
    }
}

/// Log debug with context (used by log_debug!)
pub fn log_debug_with_context(message: &str, context: Vec<(&str, String)>) {
    if let Some(logger) = try_get_global_logger() {
        let mut event = LogEvent::debug(message);
        for (key, value) in context {
            event = event.with_context(key, &value);
        }
        logger.log_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_is_noop_without_init() {
        // Must not panic even when no global service exists.
        log_error_with_context(codes::system::INTERNAL_ERROR, "boom", None, vec![]);
        log_info_with_context("hello", vec![("key", "value".to_string())]);
    }
}
