//! Declarations of the declaration graph
//!
//! Every named (or anonymous) entity the type checker produced is a
//! [`Declaration`] stored in the [`DeclarationTable`]:
//! - values, attributes and value parameters
//! - methods, functional parameters and function literals
//! - setters, classes, interfaces, type aliases, type parameters
//!
//! Declarations point at their container scope and at the declaration they
//! directly refine. The boxing phase writes its results into
//! [`DeclAnnotations`].

use super::id_types::{DeclId, IdType, TypeId};
use super::string_intern::InternedString;
use smallvec::SmallVec;
use std::cell::Cell;

/// Source location of a declaration or node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    pub file_id: u32,
    pub line: u32,
    pub column: u32,
    pub byte_offset: u32,
}

impl SourceLocation {
    pub fn new(file_id: u32, line: u32, column: u32, byte_offset: u32) -> Self {
        Self {
            file_id,
            line,
            column,
            byte_offset,
        }
    }

    pub fn unknown() -> Self {
        Self {
            file_id: u32::MAX,
            line: 0,
            column: 0,
            byte_offset: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.file_id != u32::MAX && self.line > 0
    }
}

/// Declaration modifiers relevant to representation decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclFlags(u32);

impl DeclFlags {
    pub const NONE: Self = Self(0);
    pub const SHARED: Self = Self(1 << 0);
    pub const VARIABLE: Self = Self(1 << 1);
    pub const PARAMETER: Self = Self(1 << 2);
    pub const TOPLEVEL: Self = Self(1 << 3);
    pub const ACTUAL: Self = Self(1 << 4);
    pub const FORMAL: Self = Self(1 << 5);
    pub const DEFAULT: Self = Self(1 << 6);
    /// Class alias (`class A() => B()`)
    pub const ALIAS: Self = Self(1 << 7);
    /// Captured by a nested declaration
    pub const CAPTURED: Self = Self(1 << 8);
    /// Value known to fit the narrow integer representation
    pub const SMALL: Self = Self(1 << 9);
    /// Method introduced by a specification statement refining an inherited member
    pub const SHORTCUT_REFINEMENT: Self = Self(1 << 10);
    pub const FUNCTION_ARGUMENT: Self = Self(1 << 11);

    pub const fn empty() -> Self {
        Self::NONE
    }

    pub const fn contains(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }

    pub fn insert(&mut self, flag: Self) {
        self.0 |= flag.0;
    }

    pub fn remove(&mut self, flag: Self) {
        self.0 &= !flag.0;
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for DeclFlags {
    fn default() -> Self {
        Self::NONE
    }
}

impl std::ops::BitOr for DeclFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

pub type ParameterList = SmallVec<[DeclId; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variance {
    Invariant,
    Covariant,
    Contravariant,
}

/// The scope a declaration lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    /// Top level of a compilation unit
    Unit,
    /// Member, parameter or type parameter of a declaration
    Declaration(DeclId),
    /// Scope of the specification statement `m = ...` that specifies the named declaration
    Specification(DeclId),
    /// Control block inside the body of the named declaration
    Block(DeclId),
}

impl Container {
    /// The declaration this container *is*, for declaration and specification scopes
    pub fn declaration(self) -> Option<DeclId> {
        match self {
            Container::Declaration(id) | Container::Specification(id) => Some(id),
            Container::Unit | Container::Block(_) => None,
        }
    }

    /// The nearest declaration enclosing this scope
    pub fn owner(self) -> Option<DeclId> {
        match self {
            Container::Declaration(id) | Container::Specification(id) | Container::Block(id) => {
                Some(id)
            }
            Container::Unit => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MethodInfo {
    pub parameter_lists: Vec<ParameterList>,
    /// Declared with the `void` keyword rather than a return type
    pub declared_void: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ClassInfo {
    pub parameter_list: Option<ParameterList>,
    pub extended_type: Option<TypeId>,
    pub satisfied_types: Vec<TypeId>,
    pub members: Vec<DeclId>,
}

#[derive(Debug, Clone, Default)]
pub struct InterfaceInfo {
    pub satisfied_types: Vec<TypeId>,
    pub members: Vec<DeclId>,
}

#[derive(Debug, Clone)]
pub struct TypeParameterInfo {
    pub variance: Variance,
    pub satisfied_types: Vec<TypeId>,
    /// Memo: some bound does not erase to the top object type
    pub has_non_erased_bounds: Cell<Option<bool>>,
}

impl TypeParameterInfo {
    pub fn new(variance: Variance, satisfied_types: Vec<TypeId>) -> Self {
        Self {
            variance,
            satisfied_types,
            has_non_erased_bounds: Cell::new(None),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DeclKind {
    Value,
    Method(MethodInfo),
    Setter { parameter: DeclId },
    Class(ClassInfo),
    Interface(InterfaceInfo),
    TypeAlias { target: Option<TypeId> },
    TypeParameter(TypeParameterInfo),
}

/// Results written by the boxing phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeclAnnotations {
    /// `None` until decided; read as boxed
    pub unboxed: Option<bool>,
    pub type_erased: bool,
    pub untrusted_type: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub id: DeclId,
    /// `None` for anonymous function literals
    pub name: Option<InternedString>,
    pub kind: DeclKind,
    pub container: Container,
    /// Value type, or result type for methods
    pub type_id: Option<TypeId>,
    /// The declaration this one directly refines
    pub refined: Option<DeclId>,
    pub flags: DeclFlags,
    pub type_parameters: Vec<DeclId>,
    pub annotations: DeclAnnotations,
    pub location: SourceLocation,
}

impl Declaration {
    pub fn new(id: DeclId, name: Option<InternedString>, kind: DeclKind, container: Container) -> Self {
        Self {
            id,
            name,
            kind,
            container,
            type_id: None,
            refined: None,
            flags: DeclFlags::NONE,
            type_parameters: Vec::new(),
            annotations: DeclAnnotations::default(),
            location: SourceLocation::unknown(),
        }
    }

    pub fn is_shared(&self) -> bool {
        self.flags.contains(DeclFlags::SHARED)
    }

    pub fn is_actual(&self) -> bool {
        self.flags.contains(DeclFlags::ACTUAL)
    }

    pub fn is_formal(&self) -> bool {
        self.flags.contains(DeclFlags::FORMAL)
    }

    pub fn is_parameter(&self) -> bool {
        self.flags.contains(DeclFlags::PARAMETER)
    }

    pub fn is_variable(&self) -> bool {
        self.flags.contains(DeclFlags::VARIABLE)
    }

    pub fn is_toplevel(&self) -> bool {
        self.flags.contains(DeclFlags::TOPLEVEL)
    }

    pub fn is_alias(&self) -> bool {
        self.flags.contains(DeclFlags::ALIAS)
    }

    pub fn is_captured(&self) -> bool {
        self.flags.contains(DeclFlags::CAPTURED)
    }

    pub fn is_small(&self) -> bool {
        self.flags.contains(DeclFlags::SMALL)
    }

    pub fn is_shortcut_refinement(&self) -> bool {
        self.flags.contains(DeclFlags::SHORTCUT_REFINEMENT)
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, DeclKind::Method(_))
    }

    pub fn is_value(&self) -> bool {
        matches!(self.kind, DeclKind::Value)
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, DeclKind::Class(_))
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, DeclKind::Interface(_))
    }

    pub fn is_class_or_interface(&self) -> bool {
        self.is_class() || self.is_interface()
    }

    pub fn is_type_parameter(&self) -> bool {
        matches!(self.kind, DeclKind::TypeParameter(_))
    }

    /// A method-typed parameter: `void f(Integer g(String s))`
    pub fn is_functional_parameter(&self) -> bool {
        self.is_method() && self.is_parameter()
    }

    pub fn is_value_parameter(&self) -> bool {
        self.is_value() && self.is_parameter()
    }

    /// Parameter lists of a method, or the single list of a class
    pub fn parameter_lists(&self) -> &[ParameterList] {
        match &self.kind {
            DeclKind::Method(info) => &info.parameter_lists,
            DeclKind::Class(info) => info.parameter_list.as_slice(),
            _ => &[],
        }
    }

    /// Whether this declaration takes parameters at all
    pub fn is_functional(&self) -> bool {
        match &self.kind {
            DeclKind::Method(_) => true,
            DeclKind::Class(info) => info.parameter_list.is_some(),
            _ => false,
        }
    }

    /// Multiple parameter lists: `String f(Integer a)(Integer b)`
    pub fn is_mpl(&self) -> bool {
        self.parameter_lists().len() > 1
    }

    pub fn members(&self) -> &[DeclId] {
        match &self.kind {
            DeclKind::Class(info) => &info.members,
            DeclKind::Interface(info) => &info.members,
            _ => &[],
        }
    }

    pub fn satisfied_types(&self) -> &[TypeId] {
        match &self.kind {
            DeclKind::Class(info) => &info.satisfied_types,
            DeclKind::Interface(info) => &info.satisfied_types,
            DeclKind::TypeParameter(info) => &info.satisfied_types,
            _ => &[],
        }
    }

    pub fn extended_type(&self) -> Option<TypeId> {
        match &self.kind {
            DeclKind::Class(info) => info.extended_type,
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            DeclKind::Value if self.is_parameter() => "parameter",
            DeclKind::Value => "value",
            DeclKind::Method(_) if self.is_parameter() => "functional parameter",
            DeclKind::Method(_) => "method",
            DeclKind::Setter { .. } => "setter",
            DeclKind::Class(_) => "class",
            DeclKind::Interface(_) => "interface",
            DeclKind::TypeAlias { .. } => "type alias",
            DeclKind::TypeParameter(_) => "type parameter",
        }
    }
}

/// Arena of declarations
#[derive(Debug, Default, Clone)]
pub struct DeclarationTable {
    declarations: Vec<Declaration>,
}

impl DeclarationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: Option<InternedString>, kind: DeclKind, container: Container) -> DeclId {
        let id = DeclId::from_index(self.declarations.len());
        self.declarations
            .push(Declaration::new(id, name, kind, container));
        id
    }

    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.declarations.get(id.index())
    }

    pub fn get_mut(&mut self, id: DeclId) -> Option<&mut Declaration> {
        self.declarations.get_mut(id.index())
    }

    pub fn contains(&self, id: DeclId) -> bool {
        id.index() < self.declarations.len()
    }

    /// Record the boxing decision unless one was already made
    ///
    /// Returns whether the flag was written.
    pub fn set_unboxed(&mut self, id: DeclId, unboxed: bool) -> bool {
        match self.get_mut(id) {
            Some(decl) if decl.annotations.unboxed.is_none() => {
                decl.annotations.unboxed = Some(unboxed);
                true
            }
            _ => false,
        }
    }

    /// Mark as boxed, overriding any earlier decision
    pub fn force_boxed(&mut self, id: DeclId) {
        if let Some(decl) = self.get_mut(id) {
            decl.annotations.unboxed = Some(false);
        }
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }
}
