//! Representation (boxing) analysis
//!
//! Decides, for every declaration and expression of a type-checked program,
//! whether the backend stores the value in its primitive form or as an
//! object reference, and whether its static type was erased, is raw, or is
//! untrusted. The code generator reads the results through
//! [`analysis::predicates`].

pub mod analysis;
pub mod config;
pub mod error;
pub mod error_codes;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod report;

pub use analysis::{
    Annotated, BoxingStrategy, DeclarationBoxingAnalyzer, ExpressionBoxingAnalyzer, RefinementResolver,
    RepresentationPolicy, StandardPolicy,
};
pub use config::BoxingConfig;
pub use error::{BoxingError, BoxingResult};
pub use pipeline::{BoxingOutcome, BoxingPass};
pub use report::{AnnotationReport, BoxingStats};
