//! Error code registry for the representation phase
//!
//! Codes follow the compiler-wide numbering scheme. The boxing phase only
//! raises internal compiler errors, so every code lives in the internal range.
//!
//! # Error Code Ranges
//!
//! - E9000-E9099: General internal errors and assertions
//! - E9100-E9199: Declaration graph invariant violations found by the boxing phase

use std::collections::HashMap;
use std::fmt;

pub const ASSERTION_FAILED: u16 = 9001;
pub const UNEXPECTED_STATE: u16 = 9002;
pub const UNKNOWN_DECLARATION: u16 = 9101;
pub const UNKNOWN_TYPE: u16 = 9102;
pub const UNHANDLED_SCOPE: u16 = 9103;
pub const UNKNOWN_ERROR: u16 = 9999;

/// Error code struct containing the numeric code and human-readable description
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// The numeric error code (e.g., 9101)
    pub code: u16,
    /// Human-readable error category
    pub category: &'static str,
    /// Brief description of what this error means
    pub description: &'static str,
    /// Optional help text
    pub help: Option<&'static str>,
}

impl ErrorCode {
    pub const fn new(
        code: u16,
        category: &'static str,
        description: &'static str,
        help: Option<&'static str>,
    ) -> Self {
        Self {
            code,
            category,
            description,
            help,
        }
    }

    /// Format the error code as "E{code:04}" (e.g., "E9101")
    pub fn format_code(&self) -> String {
        format_error_code(self.code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]: {}",
            self.format_code(),
            self.category,
            self.description
        )
    }
}

const REPORT_HELP: Option<&str> = Some("This is an internal compiler error; please report it");

/// Fallback used when a code is missing from the registry
pub static INTERNAL_ERROR: ErrorCode = ErrorCode::new(
    UNKNOWN_ERROR,
    "Internal",
    "Unknown error",
    Some("An unexpected error occurred; please report it with context"),
);

/// Registry containing all defined error codes
pub struct ErrorCodeRegistry {
    codes: HashMap<u16, ErrorCode>,
}

impl ErrorCodeRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            codes: HashMap::new(),
        };
        registry.register_all_codes();
        registry
    }

    pub fn get(&self, code: u16) -> Option<&ErrorCode> {
        self.codes.get(&code)
    }

    /// Get an error code by its formatted string (e.g., "E9101")
    pub fn get_by_string(&self, code_str: &str) -> Option<&ErrorCode> {
        parse_error_code(code_str).and_then(|code| self.get(code))
    }

    fn register(&mut self, error_code: ErrorCode) {
        self.codes.insert(error_code.code, error_code);
    }

    fn register_all_codes(&mut self) {
        // Internal errors (E9000-E9099)
        self.register(ErrorCode::new(
            ASSERTION_FAILED,
            "Internal",
            "Compiler assertion failed",
            REPORT_HELP,
        ));
        self.register(ErrorCode::new(
            UNEXPECTED_STATE,
            "Internal",
            "Unexpected compiler state",
            REPORT_HELP,
        ));

        // Declaration graph invariants (E9100-E9199)
        self.register(ErrorCode::new(
            UNKNOWN_DECLARATION,
            "Representation",
            "Reference to a declaration missing from the declaration table",
            REPORT_HELP,
        ));
        self.register(ErrorCode::new(
            UNKNOWN_TYPE,
            "Representation",
            "Reference to a type missing from the type table",
            REPORT_HELP,
        ));
        self.register(ErrorCode::new(
            UNHANDLED_SCOPE,
            "Representation",
            "Parameter declared in a scope that is neither a declaration nor a specification",
            REPORT_HELP,
        ));

        self.register(INTERNAL_ERROR.clone());
    }

    /// Get all error codes in a specific range
    pub fn get_range(&self, start: u16, end: u16) -> Vec<&ErrorCode> {
        let mut codes: Vec<&ErrorCode> = self
            .codes
            .values()
            .filter(|code| code.code >= start && code.code <= end)
            .collect();
        codes.sort_by_key(|code| code.code);
        codes
    }

    pub fn is_valid_code(&self, code: u16) -> bool {
        self.codes.contains_key(&code)
    }
}

impl Default for ErrorCodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRY: std::sync::OnceLock<ErrorCodeRegistry> = std::sync::OnceLock::new();

/// Get the global error code registry
pub fn error_registry() -> &'static ErrorCodeRegistry {
    REGISTRY.get_or_init(ErrorCodeRegistry::new)
}

pub fn get_error_code(code: u16) -> Option<&'static ErrorCode> {
    error_registry().get(code)
}

/// 9101 -> "E9101"
pub fn format_error_code(code: u16) -> String {
    format!("E{:04}", code)
}

/// "E9101" -> Some(9101)
pub fn parse_error_code(code_str: &str) -> Option<u16> {
    code_str.strip_prefix('E')?.parse::<u16>().ok()
}
