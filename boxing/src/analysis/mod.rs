//! Representation analyses
//!
//! The declaration analyzer decides every declaration of a unit first; the
//! expression analyzer then annotates the expression trees using those
//! decisions. Both consult the injected [`RepresentationPolicy`] and resolve
//! refinements through [`RefinementResolver`].

pub mod declaration_boxing;
pub mod expression_boxing;
pub mod policy;
pub mod predicates;
pub mod refinement;

mod policy_test;

pub use declaration_boxing::{DeclarationBoxingAnalyzer, DeclarationStats};
pub use expression_boxing::{ExpressionBoxingAnalyzer, ExpressionStats};
pub use policy::{ErasedRepresentation, RepresentationPolicy, StandardPolicy};
pub use predicates::{Annotated, BoxingStrategy};
pub use refinement::{RefinementResolver, ShortcutRewrites};
