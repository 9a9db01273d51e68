//! Builders for internal compiler errors
//!
//! Raised by backend phases when their input breaks an invariant the
//! front end should have guaranteed. The user cannot fix these, so the
//! diagnostic says so and points at the construct being compiled.

use crate::{Diagnostic, DiagnosticBuilder, SourceSpan};

pub struct InternalDiagnostics;

impl InternalDiagnostics {
    /// `error[E9xxx]: internal compiler error in <phase>: <message>`
    pub fn compiler_error(
        phase: &str,
        code: &str,
        message: impl std::fmt::Display,
        span: Option<SourceSpan>,
    ) -> Diagnostic {
        let mut builder = DiagnosticBuilder::error(format!(
            "internal compiler error in {}: {}",
            phase, message
        ))
        .code(code)
        .span(span);
        if let Some(span) = span {
            builder = builder.label(span, "while compiling this");
        }
        builder
            .with_note("this is a bug in the compiler, not in the program")
            .build()
    }

    /// Attach the registry's help text to an internal error
    pub fn with_help(mut diagnostic: Diagnostic, help: Option<&str>) -> Diagnostic {
        if let Some(help) = help {
            diagnostic.help.push(help.to_string());
        }
        diagnostic
    }
}
