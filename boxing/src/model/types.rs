//! Type references
//!
//! A [`ProducedType`] is one *use* of a type: the type of a declaration, of an
//! expression node, a type argument, a bound. Type references are never shared
//! structurally because each one carries its own mutable representation
//! facts:
//!
//! - `raw`: the generic type must be handled without type arguments
//! - `underlying`: a narrower machine representation (for example `int` for a
//!   small integer)

use super::id_types::{DeclId, IdType, TypeId};
use smallvec::SmallVec;
use std::fmt;

pub type TypeArgs = SmallVec<[TypeId; 2]>;

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// A class or interface applied to type arguments
    Nominal { declaration: DeclId, type_args: TypeArgs },
    /// A use of a type parameter
    TypeParameter { declaration: DeclId },
    Union { cases: SmallVec<[TypeId; 4]> },
    Intersection { satisfied: SmallVec<[TypeId; 4]> },
    /// The bottom type
    Nothing,
    /// A type the checker could not compute
    Error,
}

/// Narrower machine representation of a basic type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnderlyingType {
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

impl fmt::Display for UnderlyingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnderlyingType::Byte => "byte",
            UnderlyingType::Short => "short",
            UnderlyingType::Int => "int",
            UnderlyingType::Long => "long",
            UnderlyingType::Char => "char",
            UnderlyingType::Float => "float",
            UnderlyingType::Double => "double",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct ProducedType {
    pub id: TypeId,
    pub kind: TypeKind,
    pub raw: bool,
    pub underlying: Option<UnderlyingType>,
}

impl ProducedType {
    /// The class, interface or type parameter this type refers to
    pub fn declaration(&self) -> Option<DeclId> {
        match &self.kind {
            TypeKind::Nominal { declaration, .. } | TypeKind::TypeParameter { declaration } => {
                Some(*declaration)
            }
            _ => None,
        }
    }

    pub fn type_args(&self) -> &[TypeId] {
        match &self.kind {
            TypeKind::Nominal { type_args, .. } => type_args,
            _ => &[],
        }
    }

    pub fn is_type_parameter(&self) -> bool {
        matches!(self.kind, TypeKind::TypeParameter { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TypeKind::Error)
    }
}

/// Arena of type references
#[derive(Debug, Default, Clone)]
pub struct TypeTable {
    types: Vec<ProducedType>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh type reference
    pub fn create(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId::from_index(self.types.len());
        self.types.push(ProducedType {
            id,
            kind,
            raw: false,
            underlying: None,
        });
        id
    }

    pub fn nominal(&mut self, declaration: DeclId, type_args: &[TypeId]) -> TypeId {
        self.create(TypeKind::Nominal {
            declaration,
            type_args: type_args.iter().copied().collect(),
        })
    }

    pub fn type_parameter(&mut self, declaration: DeclId) -> TypeId {
        self.create(TypeKind::TypeParameter { declaration })
    }

    pub fn union(&mut self, cases: &[TypeId]) -> TypeId {
        self.create(TypeKind::Union {
            cases: cases.iter().copied().collect(),
        })
    }

    pub fn intersection(&mut self, satisfied: &[TypeId]) -> TypeId {
        self.create(TypeKind::Intersection {
            satisfied: satisfied.iter().copied().collect(),
        })
    }

    /// A fresh reference with the same shape and representation facts as `id`
    pub fn duplicate(&mut self, id: TypeId) -> Option<TypeId> {
        let source = self.get(id)?.clone();
        let copy = self.create(source.kind);
        if let Some(ty) = self.get_mut(copy) {
            ty.raw = source.raw;
            ty.underlying = source.underlying;
        }
        Some(copy)
    }

    pub fn get(&self, id: TypeId) -> Option<&ProducedType> {
        self.types.get(id.index())
    }

    pub fn get_mut(&mut self, id: TypeId) -> Option<&mut ProducedType> {
        self.types.get_mut(id.index())
    }

    pub fn kind(&self, id: TypeId) -> Option<&TypeKind> {
        self.get(id).map(|t| &t.kind)
    }

    pub fn is_raw(&self, id: TypeId) -> bool {
        self.get(id).is_some_and(|t| t.raw)
    }

    pub fn set_raw(&mut self, id: TypeId, raw: bool) {
        if let Some(ty) = self.get_mut(id) {
            ty.raw = raw;
        }
    }

    pub fn underlying(&self, id: TypeId) -> Option<UnderlyingType> {
        self.get(id).and_then(|t| t.underlying)
    }

    pub fn set_underlying(&mut self, id: TypeId, underlying: Option<UnderlyingType>) {
        if let Some(ty) = self.get_mut(id) {
            ty.underlying = underlying;
        }
    }

    /// Structural equality, ignoring the per-reference representation facts
    ///
    /// Union and intersection members compare as sets. Error types are never
    /// exactly anything.
    pub fn is_exactly(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return self.get(a).is_some_and(|t| !t.is_error());
        }
        let (Some(left), Some(right)) = (self.kind(a), self.kind(b)) else {
            return false;
        };
        match (left, right) {
            (
                TypeKind::Nominal { declaration: d1, type_args: a1 },
                TypeKind::Nominal { declaration: d2, type_args: a2 },
            ) => {
                d1 == d2
                    && a1.len() == a2.len()
                    && a1.iter().zip(a2.iter()).all(|(x, y)| self.is_exactly(*x, *y))
            }
            (
                TypeKind::TypeParameter { declaration: d1 },
                TypeKind::TypeParameter { declaration: d2 },
            ) => d1 == d2,
            (TypeKind::Union { cases: c1 }, TypeKind::Union { cases: c2 }) => {
                self.same_members(c1, c2)
            }
            (
                TypeKind::Intersection { satisfied: s1 },
                TypeKind::Intersection { satisfied: s2 },
            ) => self.same_members(s1, s2),
            (TypeKind::Nothing, TypeKind::Nothing) => true,
            _ => false,
        }
    }

    fn same_members(&self, left: &[TypeId], right: &[TypeId]) -> bool {
        left.len() == right.len()
            && left
                .iter()
                .all(|l| right.iter().any(|r| self.is_exactly(*l, *r)))
            && right
                .iter()
                .all(|r| left.iter().any(|l| self.is_exactly(*l, *r)))
    }

    /// Visit `id` and every type nested in it (arguments, cases)
    pub fn any_nested(&self, id: TypeId, predicate: &mut dyn FnMut(&ProducedType) -> bool) -> bool {
        let Some(ty) = self.get(id) else {
            return false;
        };
        if predicate(ty) {
            return true;
        }
        let nested: SmallVec<[TypeId; 4]> = match &ty.kind {
            TypeKind::Nominal { type_args, .. } => type_args.iter().copied().collect(),
            TypeKind::Union { cases } => cases.clone(),
            TypeKind::Intersection { satisfied } => satisfied.clone(),
            TypeKind::TypeParameter { .. } | TypeKind::Nothing | TypeKind::Error => {
                SmallVec::new()
            }
        };
        for inner in nested {
            if self.any_nested(inner, predicate) {
                return true;
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProducedType> {
        self.types.iter()
    }
}
