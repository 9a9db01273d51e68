//! Target-representation policy
//!
//! Which types have a primitive representation, which collapse to the top
//! object type, when a method returns a boxed void: these are properties of
//! the code generator's target, not of the language. The analyzers consult
//! them through [`RepresentationPolicy`] so the phase can be reused for other
//! targets. [`StandardPolicy`] describes a JVM-like target:
//! - Boolean, Integer, Float, Byte, Character and String are primitive
//! - `Anything`, `Object`, `Basic`, `Null`, unions and intersections erase to
//!   the top object type, except `T?` which erases like `T`
//! - type parameters erase to their first non-erased bound, or to the top type

use crate::model::{DeclId, DeclKind, Declaration, Program, TypeId, TypeKind};

/// What a type looks like once lowered to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErasedRepresentation {
    /// Primitive slot for a basic class
    Primitive(DeclId),
    /// Reference to a specific class or interface
    Class(DeclId),
    /// The top object type
    Object,
}

/// Representation predicates the analyzers depend on
pub trait RepresentationPolicy {
    /// One of the intrinsic value types, with no type arguments
    fn is_basic_type(&self, program: &Program, ty: TypeId) -> bool;

    fn is_null(&self, program: &Program, ty: TypeId) -> bool;

    fn is_object(&self, program: &Program, ty: TypeId) -> bool;

    /// Exactly the top `Anything` type
    fn is_anything(&self, program: &Program, ty: TypeId) -> bool;

    fn is_callable(&self, program: &Program, ty: TypeId) -> bool;

    /// A union of `Null` with exactly one other case
    fn is_optional(&self, program: &Program, ty: TypeId) -> bool;

    fn is_iterable_root(&self, program: &Program, ty: TypeId) -> bool;

    /// Structural erasure: a union or intersection, or one nested in a type argument
    fn has_erasure(&self, program: &Program, ty: TypeId) -> bool;

    fn will_erase_to_object(&self, program: &Program, ty: TypeId) -> bool;

    /// A generic type used without type arguments
    fn is_raw(&self, program: &Program, ty: TypeId) -> bool;

    /// An `actual` member whose type lowers differently from the member it refines
    fn is_widening_typed_declaration(&self, program: &Program, decl: DeclId) -> bool;

    /// A type argument that erases to the top type where the type parameter has non-erased bounds
    fn has_substituted_bounds(&self, program: &Program, ty: TypeId) -> bool;

    fn erased_representation(&self, program: &Program, ty: TypeId) -> ErasedRepresentation;

    /// Whether a void method must return a boxed `null` instead of nothing
    fn uses_boxed_void(&self, program: &Program, method: DeclId) -> bool;

    /// Whether a functional parameter is compiled to a real method
    fn creates_method(&self, program: &Program, decl: DeclId) -> bool;

    fn is_boolean_true(&self, program: &Program, decl: DeclId) -> bool;

    fn is_boolean_false(&self, program: &Program, decl: DeclId) -> bool;
}

/// Memoised test: some bound of the type parameter does not erase to the top type
///
/// Unknown ids and non-type-parameters answer `false`.
pub fn has_non_erased_bounds(
    program: &Program,
    policy: &dyn RepresentationPolicy,
    type_parameter: DeclId,
) -> bool {
    let Some(DeclKind::TypeParameter(info)) = program.declarations.get(type_parameter).map(|d| &d.kind)
    else {
        return false;
    };
    if let Some(known) = info.has_non_erased_bounds.get() {
        return known;
    }
    // Provisional answer while the bounds are examined; a bound mentioning its
    // own type parameter (`T satisfies Comparable<T>`) sees it.
    info.has_non_erased_bounds.set(Some(false));
    let result = info
        .satisfied_types
        .iter()
        .any(|&bound| !policy.will_erase_to_object(program, bound));
    info.has_non_erased_bounds.set(Some(result));
    result
}

/// Policy for a JVM-like target
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPolicy;

impl StandardPolicy {
    pub fn new() -> Self {
        Self
    }

    fn nominal_declaration(program: &Program, ty: TypeId) -> Option<DeclId> {
        match program.types.kind(ty)? {
            TypeKind::Nominal { declaration, .. } => Some(*declaration),
            _ => None,
        }
    }

    fn is_nominal(program: &Program, ty: TypeId, decl: DeclId) -> bool {
        Self::nominal_declaration(program, ty) == Some(decl)
    }

    /// The non-null case of `T?`
    fn optional_payload(&self, program: &Program, ty: TypeId) -> Option<TypeId> {
        let TypeKind::Union { cases } = program.types.kind(ty)? else {
            return None;
        };
        let mut payload = None;
        let mut saw_null = false;
        for &case in cases {
            if self.is_null(program, case) {
                saw_null = true;
            } else if payload.replace(case).is_some() {
                return None;
            }
        }
        if saw_null { payload } else { None }
    }

    fn type_parameter_count(program: &Program, decl: DeclId) -> usize {
        program
            .declarations
            .get(decl)
            .map_or(0, |d| d.type_parameters.len())
    }

    /// Declarations `decl` refines, nearest first
    fn refinement_chain(program: &Program, decl: &Declaration) -> Vec<DeclId> {
        let mut chain = Vec::new();
        let mut current = decl.refined;
        while let Some(id) = current {
            if id == decl.id || chain.contains(&id) {
                break;
            }
            chain.push(id);
            current = program.declarations.get(id).and_then(|d| d.refined);
        }
        chain
    }
}

impl RepresentationPolicy for StandardPolicy {
    fn is_basic_type(&self, program: &Program, ty: TypeId) -> bool {
        match program.types.kind(ty) {
            Some(TypeKind::Nominal { declaration, type_args }) => {
                type_args.is_empty() && program.core.is_basic_class(*declaration)
            }
            _ => false,
        }
    }

    fn is_null(&self, program: &Program, ty: TypeId) -> bool {
        Self::is_nominal(program, ty, program.core.null)
    }

    fn is_object(&self, program: &Program, ty: TypeId) -> bool {
        Self::is_nominal(program, ty, program.core.object)
    }

    fn is_anything(&self, program: &Program, ty: TypeId) -> bool {
        Self::is_nominal(program, ty, program.core.anything)
    }

    fn is_callable(&self, program: &Program, ty: TypeId) -> bool {
        Self::is_nominal(program, ty, program.core.callable)
    }

    fn is_optional(&self, program: &Program, ty: TypeId) -> bool {
        self.optional_payload(program, ty).is_some()
    }

    fn is_iterable_root(&self, program: &Program, ty: TypeId) -> bool {
        Self::is_nominal(program, ty, program.core.iterable)
    }

    fn has_erasure(&self, program: &Program, ty: TypeId) -> bool {
        if let Some(payload) = self.optional_payload(program, ty) {
            return self.has_erasure(program, payload);
        }
        match program.types.kind(ty) {
            Some(TypeKind::Union { .. } | TypeKind::Intersection { .. } | TypeKind::Nothing) => true,
            Some(TypeKind::Nominal { type_args, .. }) => type_args
                .iter()
                .any(|&arg| self.has_erasure(program, arg)),
            Some(TypeKind::TypeParameter { .. } | TypeKind::Error) | None => false,
        }
    }

    fn will_erase_to_object(&self, program: &Program, ty: TypeId) -> bool {
        if let Some(payload) = self.optional_payload(program, ty) {
            return self.will_erase_to_object(program, payload);
        }
        match program.types.kind(ty) {
            Some(TypeKind::Nominal { declaration, .. }) => program.core.is_top_class(*declaration),
            Some(TypeKind::Union { .. } | TypeKind::Intersection { .. } | TypeKind::Nothing) => true,
            Some(TypeKind::TypeParameter { .. } | TypeKind::Error) | None => false,
        }
    }

    fn is_raw(&self, program: &Program, ty: TypeId) -> bool {
        match program.types.kind(ty) {
            Some(TypeKind::Nominal { declaration, type_args }) => {
                (type_args.is_empty() && Self::type_parameter_count(program, *declaration) > 0)
                    || type_args.iter().any(|&arg| self.is_raw(program, arg))
            }
            _ => false,
        }
    }

    fn is_widening_typed_declaration(&self, program: &Program, decl: DeclId) -> bool {
        let Some(declaration) = program.declarations.get(decl) else {
            return false;
        };
        let Some(own_type) = declaration.type_id else {
            return false;
        };
        let own = self.erased_representation(program, own_type);
        Self::refinement_chain(program, declaration)
            .into_iter()
            .filter_map(|ancestor| program.declarations.get(ancestor)?.type_id)
            .any(|ancestor_type| self.erased_representation(program, ancestor_type) != own)
    }

    fn has_substituted_bounds(&self, program: &Program, ty: TypeId) -> bool {
        let Some(TypeKind::Nominal { declaration, type_args }) = program.types.kind(ty) else {
            return false;
        };
        let Some(generic) = program.declarations.get(*declaration) else {
            return false;
        };
        type_args.iter().enumerate().any(|(index, &arg)| {
            let substituted = generic
                .type_parameters
                .get(index)
                .is_some_and(|&tp| {
                    has_non_erased_bounds(program, self, tp)
                        && self.will_erase_to_object(program, arg)
                });
            substituted || self.has_substituted_bounds(program, arg)
        })
    }

    fn erased_representation(&self, program: &Program, ty: TypeId) -> ErasedRepresentation {
        if let Some(payload) = self.optional_payload(program, ty) {
            // An optional primitive lowers to its wrapper class
            return match self.erased_representation(program, payload) {
                ErasedRepresentation::Primitive(class) => ErasedRepresentation::Class(class),
                other => other,
            };
        }
        if self.is_basic_type(program, ty) {
            if let Some(class) = Self::nominal_declaration(program, ty) {
                return ErasedRepresentation::Primitive(class);
            }
        }
        if self.will_erase_to_object(program, ty) {
            return ErasedRepresentation::Object;
        }
        match program.types.kind(ty) {
            Some(TypeKind::Nominal { declaration, .. }) => ErasedRepresentation::Class(*declaration),
            Some(TypeKind::TypeParameter { declaration }) => {
                let bound = match program.declarations.get(*declaration).map(|d| &d.kind) {
                    Some(DeclKind::TypeParameter(info)) => info
                        .satisfied_types
                        .iter()
                        .copied()
                        .find(|&b| !self.will_erase_to_object(program, b)),
                    _ => None,
                };
                match bound {
                    Some(bound) if !program.types.get(bound).is_some_and(|t| t.is_type_parameter()) => {
                        match self.erased_representation(program, bound) {
                            ErasedRepresentation::Primitive(class) => ErasedRepresentation::Class(class),
                            other => other,
                        }
                    }
                    _ => ErasedRepresentation::Object,
                }
            }
            _ => ErasedRepresentation::Object,
        }
    }

    fn uses_boxed_void(&self, program: &Program, method: DeclId) -> bool {
        let Some(decl) = program.declarations.get(method) else {
            return true;
        };
        let DeclKind::Method(info) = &decl.kind else {
            return true;
        };
        !info.declared_void
            || decl.is_mpl()
            || (decl.is_parameter() && !self.creates_method(program, method))
    }

    fn creates_method(&self, program: &Program, decl: DeclId) -> bool {
        let Some(declaration) = program.declarations.get(decl) else {
            return false;
        };
        if !declaration.is_functional_parameter() {
            return false;
        }
        let class_member = declaration
            .container
            .declaration()
            .and_then(|owner| program.declarations.get(owner))
            .is_some_and(|owner| owner.is_class());
        class_member && (declaration.is_shared() || declaration.is_captured())
    }

    fn is_boolean_true(&self, program: &Program, decl: DeclId) -> bool {
        decl == program.core.true_value
    }

    fn is_boolean_false(&self, program: &Program, decl: DeclId) -> bool {
        decl == program.core.false_value
    }
}
