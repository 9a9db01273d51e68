//! Read accessors for representation annotations, plus code generation helpers
//!
//! The code generator reads the results of the phase exclusively through
//! these functions; it never re-derives a decision. An unset declaration flag
//! reads as boxed.

use super::policy::RepresentationPolicy;
use crate::error::{BoxingError, BoxingResult};
use crate::model::{Container, DeclId, Declaration, ExprKind, Expression, Program, TypeId, TypeTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxingStrategy {
    Unboxed,
    Boxed,
}

/// Anything carrying representation annotations
pub trait Annotated {
    fn is_unboxed(&self) -> bool;

    fn has_type_erased(&self) -> bool;

    fn has_untrusted_type(&self) -> bool;

    /// Raw lives on the type reference, so the type table is needed
    fn is_raw(&self, types: &TypeTable) -> bool;

    fn boxing_strategy(&self) -> BoxingStrategy {
        if self.is_unboxed() {
            BoxingStrategy::Unboxed
        } else {
            BoxingStrategy::Boxed
        }
    }
}

impl Annotated for Declaration {
    fn is_unboxed(&self) -> bool {
        self.annotations.unboxed == Some(true)
    }

    fn has_type_erased(&self) -> bool {
        self.annotations.type_erased
    }

    fn has_untrusted_type(&self) -> bool {
        self.annotations.untrusted_type == Some(true)
    }

    fn is_raw(&self, types: &TypeTable) -> bool {
        self.type_id.is_some_and(|t| types.is_raw(t))
    }
}

impl Annotated for Expression {
    fn is_unboxed(&self) -> bool {
        self.annotations.unboxed
    }

    fn has_type_erased(&self) -> bool {
        self.annotations.type_erased
    }

    fn has_untrusted_type(&self) -> bool {
        self.annotations.untrusted_type
    }

    fn is_raw(&self, types: &TypeTable) -> bool {
        self.annotations.raw || self.type_id.is_some_and(|t| types.is_raw(t))
    }
}

pub fn is_unboxed(item: &impl Annotated) -> bool {
    item.is_unboxed()
}

pub fn is_raw(item: &impl Annotated, types: &TypeTable) -> bool {
    item.is_raw(types)
}

pub fn has_type_erased(item: &impl Annotated) -> bool {
    item.has_type_erased()
}

pub fn has_untrusted_type(item: &impl Annotated) -> bool {
    item.has_untrusted_type()
}

pub fn boxing_strategy(item: &impl Annotated) -> BoxingStrategy {
    item.boxing_strategy()
}

/// Exactly the top `Anything` type
pub fn is_void(program: &Program, policy: &dyn RepresentationPolicy, ty: Option<TypeId>) -> bool {
    ty.is_some_and(|t| policy.is_anything(program, t))
}

/// A void method compiled without a boxed `null` result
pub fn is_unboxed_void(program: &Program, policy: &dyn RepresentationPolicy, decl: &Declaration) -> bool {
    decl.is_method() && is_void(program, policy, decl.type_id) && !policy.uses_boxed_void(program, decl.id)
}

/// The type is a type parameter or mentions one
pub fn contains_type_parameter(types: &TypeTable, ty: TypeId) -> bool {
    types.any_nested(ty, &mut |t| t.is_type_parameter())
}

/// The declaration whose parameter list holds `decl`
pub fn parameterized_declaration(program: &Program, decl: &Declaration) -> BoxingResult<DeclId> {
    match (decl.is_parameter(), decl.container.declaration()) {
        (true, Some(owner)) => Ok(owner),
        _ => Err(BoxingError::UnhandledScope {
            declaration: decl.id,
            name: program.name_of(decl.id).to_string(),
            location: decl.location,
        }),
    }
}

/// `decl` is declared directly inside a functional parameter
///
/// Declarations at unit level or in control blocks have no declaring
/// container and answer `false`.
pub fn is_container_functional_parameter(program: &Program, decl: &Declaration) -> BoxingResult<bool> {
    let owner = match decl.container {
        Container::Declaration(owner) | Container::Specification(owner) => owner,
        Container::Unit | Container::Block(_) => return Ok(false),
    };
    let container = program.declarations.get(owner).ok_or(BoxingError::UnknownDeclaration {
        id: owner,
        location: decl.location,
    })?;
    Ok(container.is_functional_parameter())
}

/// A local, non-shared, uncaptured value that can be read without an accessor
pub fn is_direct_access_variable(program: &Program, expr: &Expression) -> bool {
    let ExprKind::BaseMember { declaration: Some(id), .. } = &expr.kind else {
        return false;
    };
    let Some(decl) = program.declarations.get(*id) else {
        return false;
    };
    let member = decl
        .container
        .declaration()
        .and_then(|owner| program.declarations.get(owner))
        .is_some_and(Declaration::is_class_or_interface);
    decl.is_value() && !decl.is_toplevel() && !member && !decl.is_captured() && !decl.is_shared()
}

/// `m = expr;` can be compiled as a direct method body
///
/// True for function literals and for references whose target cannot change:
/// methods, classes and parameters.
pub fn can_optimise_method_specifier(program: &Program, expr: &Expression) -> bool {
    match &expr.kind {
        ExprKind::FunctionLiteral(_) => true,
        ExprKind::BaseMember { declaration, .. } | ExprKind::BaseType { declaration } => declaration
            .and_then(|id| program.declarations.get(id))
            .is_some_and(|d| d.is_method() || d.is_class() || (d.is_value() && d.is_parameter())),
        _ => false,
    }
}
