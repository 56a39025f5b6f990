//! Consolidated diagnostic codes and classification system
//!
//! Single source of truth for all error and success codes, their metadata,
//! and classification functions.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a diagnostic code
#[derive(Debug, Clone)]
pub struct CodeMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub description: &'static str,
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Lexical analysis error codes
pub mod lexical {
    use super::Code;

    pub const INVALID_CHARACTER: Code = Code::new("E020");
    pub const UNTERMINATED_STRING: Code = Code::new("E021");
    pub const UNTERMINATED_BLOCK_COMMENT: Code = Code::new("E022");
    pub const IDENTIFIER_TOO_LONG: Code = Code::new("E023");
    pub const STRING_TOO_LARGE: Code = Code::new("E024");
    pub const TOO_MANY_TOKENS: Code = Code::new("E025");
}

/// Syntax analysis error codes
pub mod syntax {
    use super::Code;

    pub const UNEXPECTED_TOKEN: Code = Code::new("E040");
    pub const UNEXPECTED_END_OF_INPUT: Code = Code::new("E041");
    pub const TRAILING_TOKENS: Code = Code::new("E042");
    pub const MISSING_ELSE_BRANCH: Code = Code::new("E043");
    pub const EMPTY_MATCH: Code = Code::new("E044");
    pub const MISSING_SEPARATOR: Code = Code::new("E045");
    pub const MISSING_VERSION_DIRECTIVE: Code = Code::new("E046");
    pub const INVALID_DIRECTIVE: Code = Code::new("E047");
    pub const INVALID_VAR_DECLARATION: Code = Code::new("E048");
    pub const MAX_RECURSION_DEPTH: Code = Code::new("E049");
}

/// Evaluation error codes
pub mod runtime {
    use super::Code;

    pub const UNKNOWN_IDENTIFIER: Code = Code::new("E060");
    pub const NOT_CALLABLE: Code = Code::new("E061");
    pub const ATTRIBUTE_ACCESS: Code = Code::new("E062");
    pub const TOO_MANY_ARGUMENTS: Code = Code::new("E063");
    pub const MISSING_ARGUMENT: Code = Code::new("E064");
    pub const INVALID_OPERANDS: Code = Code::new("E065");
    pub const CALL_DEPTH_EXCEEDED: Code = Code::new("E066");
}

/// Format boundary error codes
pub mod format {
    use super::Code;

    pub const UNSUPPORTED_FORMAT: Code = Code::new("E080");
    pub const READ_FAILED: Code = Code::new("E081");
    pub const WRITE_FAILED: Code = Code::new("E082");
}

/// Success codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I001");
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I002");
    pub const PARSE_COMPLETE: Code = Code::new("I003");
    pub const EXECUTION_COMPLETE: Code = Code::new("I004");
}

// ============================================================================
// METADATA REGISTRY
// ============================================================================

fn metadata_registry() -> &'static HashMap<&'static str, CodeMetadata> {
    static REGISTRY: OnceLock<HashMap<&'static str, CodeMetadata>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let entries = [
            CodeMetadata {
                code: "ERR001",
                category: "System",
                severity: Severity::Critical,
                recoverable: false,
                description: "Internal engine error",
            },
            CodeMetadata {
                code: "ERR002",
                category: "System",
                severity: Severity::Critical,
                recoverable: false,
                description: "Initialization failure",
            },
            CodeMetadata {
                code: "E020",
                category: "Lexical",
                severity: Severity::High,
                recoverable: true,
                description: "Character matches no lexeme rule",
            },
            CodeMetadata {
                code: "E021",
                category: "Lexical",
                severity: Severity::High,
                recoverable: true,
                description: "String literal is not terminated",
            },
            CodeMetadata {
                code: "E022",
                category: "Lexical",
                severity: Severity::High,
                recoverable: true,
                description: "Block comment is not terminated",
            },
            CodeMetadata {
                code: "E023",
                category: "Lexical",
                severity: Severity::Medium,
                recoverable: true,
                description: "Identifier exceeds the configured length limit",
            },
            CodeMetadata {
                code: "E024",
                category: "Lexical",
                severity: Severity::Medium,
                recoverable: true,
                description: "String literal exceeds the configured size limit",
            },
            CodeMetadata {
                code: "E025",
                category: "Lexical",
                severity: Severity::Medium,
                recoverable: true,
                description: "Token count exceeds the configured limit",
            },
            CodeMetadata {
                code: "E040",
                category: "Syntax",
                severity: Severity::High,
                recoverable: true,
                description: "Token does not match the expected grammar element",
            },
            CodeMetadata {
                code: "E041",
                category: "Syntax",
                severity: Severity::High,
                recoverable: true,
                description: "Input ended while a grammar element was expected",
            },
            CodeMetadata {
                code: "E042",
                category: "Syntax",
                severity: Severity::High,
                recoverable: true,
                description: "Tokens remain after a complete expression",
            },
            CodeMetadata {
                code: "E043",
                category: "Syntax",
                severity: Severity::High,
                recoverable: true,
                description: "If expression is missing its else branch",
            },
            CodeMetadata {
                code: "E044",
                category: "Syntax",
                severity: Severity::High,
                recoverable: true,
                description: "Match expression contains no cases",
            },
            CodeMetadata {
                code: "E045",
                category: "Syntax",
                severity: Severity::High,
                recoverable: true,
                description: "Script is missing the '---' body separator",
            },
            CodeMetadata {
                code: "E046",
                category: "Syntax",
                severity: Severity::High,
                recoverable: true,
                description: "Header is missing the %dw version directive",
            },
            CodeMetadata {
                code: "E047",
                category: "Syntax",
                severity: Severity::High,
                recoverable: true,
                description: "Header line is not a recognized directive",
            },
            CodeMetadata {
                code: "E048",
                category: "Syntax",
                severity: Severity::High,
                recoverable: true,
                description: "Header var declaration is malformed",
            },
            CodeMetadata {
                code: "E049",
                category: "Syntax",
                severity: Severity::Critical,
                recoverable: false,
                description: "Parser recursion depth limit exceeded",
            },
            CodeMetadata {
                code: "E060",
                category: "Runtime",
                severity: Severity::High,
                recoverable: true,
                description: "Identifier is not bound in any scope",
            },
            CodeMetadata {
                code: "E061",
                category: "Runtime",
                severity: Severity::High,
                recoverable: true,
                description: "Call target is not a callable value",
            },
            CodeMetadata {
                code: "E062",
                category: "Runtime",
                severity: Severity::High,
                recoverable: true,
                description: "Value does not support named attributes",
            },
            CodeMetadata {
                code: "E063",
                category: "Runtime",
                severity: Severity::High,
                recoverable: true,
                description: "Lambda received more arguments than parameters",
            },
            CodeMetadata {
                code: "E064",
                category: "Runtime",
                severity: Severity::High,
                recoverable: true,
                description: "Lambda parameter has no argument and no default",
            },
            CodeMetadata {
                code: "E065",
                category: "Runtime",
                severity: Severity::High,
                recoverable: true,
                description: "Operator applied to incompatible operand kinds",
            },
            CodeMetadata {
                code: "E066",
                category: "Runtime",
                severity: Severity::Critical,
                recoverable: false,
                description: "Call depth limit exceeded",
            },
            CodeMetadata {
                code: "E080",
                category: "Format",
                severity: Severity::High,
                recoverable: true,
                description: "Format name is not registered",
            },
            CodeMetadata {
                code: "E081",
                category: "Format",
                severity: Severity::High,
                recoverable: true,
                description: "Input could not be parsed in the requested format",
            },
            CodeMetadata {
                code: "E082",
                category: "Format",
                severity: Severity::High,
                recoverable: true,
                description: "Value could not be rendered in the requested format",
            },
            CodeMetadata {
                code: "I001",
                category: "Success",
                severity: Severity::Low,
                recoverable: true,
                description: "Logging system initialized",
            },
            CodeMetadata {
                code: "I002",
                category: "Success",
                severity: Severity::Low,
                recoverable: true,
                description: "Tokenization completed",
            },
            CodeMetadata {
                code: "I003",
                category: "Success",
                severity: Severity::Low,
                recoverable: true,
                description: "Parsing completed",
            },
            CodeMetadata {
                code: "I004",
                category: "Success",
                severity: Severity::Low,
                recoverable: true,
                description: "Script execution completed",
            },
        ];

        entries
            .into_iter()
            .map(|metadata| (metadata.code, metadata))
            .collect()
    })
}

/// Get severity for a code (defaults to Medium for unknown codes)
pub fn get_severity(code: &str) -> Severity {
    metadata_registry()
        .get(code)
        .map(|m| m.severity)
        .unwrap_or(Severity::Medium)
}

/// Get category for a code
pub fn get_category(code: &str) -> &'static str {
    metadata_registry()
        .get(code)
        .map(|m| m.category)
        .unwrap_or("Unknown")
}

/// Get description for a code
pub fn get_description(code: &str) -> &'static str {
    metadata_registry()
        .get(code)
        .map(|m| m.description)
        .unwrap_or("Unknown error")
}

/// Check whether an error with this code is recoverable
pub fn is_recoverable(code: &str) -> bool {
    metadata_registry()
        .get(code)
        .map(|m| m.recoverable)
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_display() {
        assert_eq!(lexical::INVALID_CHARACTER.as_str(), "E020");
        assert_eq!(format!("{}", syntax::UNEXPECTED_TOKEN), "E040");
    }

    #[test]
    fn test_metadata_lookup() {
        assert_eq!(get_category("E020"), "Lexical");
        assert_eq!(get_category("E060"), "Runtime");
        assert_eq!(get_severity("ERR001"), Severity::Critical);
        assert!(!is_recoverable("E049"));
        assert!(is_recoverable("E040"));
    }

    #[test]
    fn test_unknown_code_defaults() {
        assert_eq!(get_category("Z999"), "Unknown");
        assert_eq!(get_description("Z999"), "Unknown error");
        assert_eq!(get_severity("Z999"), Severity::Medium);
    }

    #[test]
    fn test_all_codes_have_metadata() {
        let codes = [
            "ERR001", "ERR002", "E020", "E021", "E022", "E023", "E024", "E025", "E040", "E041",
            "E042", "E043", "E044", "E045", "E046", "E047", "E048", "E049", "E060", "E061", "E062",
            "E063", "E064", "E065", "E066", "E080", "E081", "E082", "I001", "I002", "I003", "I004",
        ];
        for code in codes {
            assert_ne!(get_description(code), "Unknown error", "missing: {}", code);
        }
    }
}
