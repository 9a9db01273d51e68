//! Internal errors of the boxing phase
//!
//! Upstream errors (unresolved references, missing types) are already
//! reported by the type checker and show up as `None` in the model; the
//! analyzers skip them. A [`BoxingError`] means the model itself broke an
//! invariant and the pass must stop.

use crate::error_codes::{self, ErrorCode};
use crate::model::{DeclId, SourceLocation, TypeId};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxingError {
    /// A tree node or declaration refers to an id missing from the declaration table
    UnknownDeclaration { id: DeclId, location: SourceLocation },
    /// A declaration refers to an id missing from the type table
    UnknownType { id: TypeId, location: SourceLocation },
    /// A parameter whose container is neither a declaration nor a specification
    UnhandledScope {
        declaration: DeclId,
        name: String,
        location: SourceLocation,
    },
}

impl BoxingError {
    pub fn error_code(&self) -> &'static ErrorCode {
        let code = match self {
            BoxingError::UnknownDeclaration { .. } => error_codes::UNKNOWN_DECLARATION,
            BoxingError::UnknownType { .. } => error_codes::UNKNOWN_TYPE,
            BoxingError::UnhandledScope { .. } => error_codes::UNHANDLED_SCOPE,
        };
        error_codes::get_error_code(code).unwrap_or(&error_codes::INTERNAL_ERROR)
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            BoxingError::UnknownDeclaration { location, .. }
            | BoxingError::UnknownType { location, .. }
            | BoxingError::UnhandledScope { location, .. } => *location,
        }
    }
}

impl fmt::Display for BoxingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxingError::UnknownDeclaration { id, .. } => {
                write!(f, "reference to unknown declaration {}", id)
            }
            BoxingError::UnknownType { id, .. } => write!(f, "reference to unknown type {}", id),
            BoxingError::UnhandledScope { name, .. } => {
                write!(f, "unhandled container scope for parameter '{}'", name)
            }
        }
    }
}

impl std::error::Error for BoxingError {}

pub type BoxingResult<T> = Result<T, BoxingError>;
