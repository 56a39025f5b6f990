//! Type-safe logging macros using Code types with Display support

// ============================================================================
// ERROR LOGGING MACROS
// ============================================================================

/// Log error with Code type - accepts Display types for context values
#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr) => {
        $crate::logging::log_error_with_context($code, $message, None, vec![])
    };

    ($code:expr, $message:expr, span = $span:expr) => {
        $crate::logging::log_error_with_context($code, $message, Some($span), vec![])
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+) => {
        $crate::logging::log_error_with_context(
            $code,
            $message,
            None,
            vec![$(($key, format!("{}", $value))),+],
        )
    };

    ($code:expr, $message:expr, span = $span:expr, $($key:expr => $value:expr),+) => {
        $crate::logging::log_error_with_context(
            $code,
            $message,
            Some($span),
            vec![$(($key, format!("{}", $value))),+],
        )
    };
}

// ============================================================================
// SUCCESS LOGGING MACROS
// ============================================================================

/// Log success with Code type - accepts Display types for context values
#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr) => {
        $crate::logging::log_success_with_context($code, $message, vec![])
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+) => {
        $crate::logging::log_success_with_context(
            $code,
            $message,
            vec![$(($key, format!("{}", $value))),+],
        )
    };
}

// ============================================================================
// INFO LOGGING MACROS
// ============================================================================

/// Log informational message - accepts Display types for context values
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        $crate::logging::log_info_with_context($message, vec![])
    };

    ($message:expr, $($key:expr => $value:expr),+) => {
        $crate::logging::log_info_with_context(
            $message,
            vec![$(($key, format!("{}", $value))),+],
        )
    };
}

// ============================================================================
// WARNING LOGGING MACROS
// ============================================================================

/// Log warning message - accepts Display types for context values
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        $crate::logging::log_warning_with_context($message, vec![])
    };

    ($message:expr, $($key:expr => $value:expr),+) => {
        $crate::logging::log_warning_with_context(
            $message,
            vec![$(($key, format!("{}", $value))),+],
        )
    };
}

// ============================================================================
// DEBUG LOGGING MACROS
// ============================================================================

/// Log debug message - accepts Display types for context values
#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        $crate::logging::log_debug_with_context($message, vec![])
    };

    ($message:expr, $($key:expr => $value:expr),+) => {
        $crate::logging::log_debug_with_context(
            $message,
            vec![$(($key, format!("{}", $value))),+],
        )
    };
}

#[cfg(test)]
mod tests {
    use crate::logging::codes;
    use crate::utils::{Position, Span};

    #[allow(dead_code)]
    fn example_usage() {
        let name = "payload";
        let count: usize = 42;
        let span = Span::new(Position::start(), Position::start());

        log_error!(codes::runtime::UNKNOWN_IDENTIFIER, "Unknown identifier",
            "name" => name
        );

        log_error!(codes::syntax::UNEXPECTED_TOKEN, "Unexpected token",
            span = span,
            "found" => "+"
        );

        log_success!(codes::success::TOKENIZATION_COMPLETE, "Tokenization completed",
            "tokens" => count
        );

        log_info!("Executing script", "body_kind" => "expression");
        log_warning!("Output directive missing, defaulting to json");
        log_debug!("Parser advanced", "position" => count);
    }
}
