//! Declaration graph and typed tree consumed by the boxing phase
//!
//! The model is produced by the type checker and is treated as input data:
//! - [`DeclarationTable`]: every declaration with its container, refinement
//!   pointer, parameter lists and modifiers
//! - [`TypeTable`]: per-use type references
//! - [`CompilationUnit`]: the typed statement and expression tree
//!
//! The phase only writes the annotation fields.

pub mod builder;
pub mod core;
pub mod declarations;
pub mod id_types;
pub mod node;
pub mod string_intern;
pub mod types;

pub use self::core::CoreDeclarations;
pub use builder::ProgramBuilder;
pub use declarations::*;
pub use id_types::collections::{IdMap, IdSet};
pub use id_types::{DeclId, ExprId, IdType, TypeId};
pub use node::*;
pub use string_intern::{InternedString, StringInterner};
pub use types::{ProducedType, TypeArgs, TypeKind, TypeTable, UnderlyingType};

use crate::error::{BoxingError, BoxingResult};

/// Everything the phase reads besides the trees themselves
#[derive(Debug, Clone)]
pub struct Program {
    pub interner: StringInterner,
    pub declarations: DeclarationTable,
    pub types: TypeTable,
    pub core: CoreDeclarations,
    next_expr: u32,
}

impl Program {
    /// Empty program containing only the language-module declarations
    pub fn new() -> Self {
        let mut interner = StringInterner::new();
        let mut declarations = DeclarationTable::new();
        let mut types = TypeTable::new();
        let core = CoreDeclarations::install(&mut interner, &mut declarations, &mut types);
        Self {
            interner,
            declarations,
            types,
            core,
            next_expr: 0,
        }
    }

    pub fn decl(&self, id: DeclId) -> BoxingResult<&Declaration> {
        self.declarations
            .get(id)
            .ok_or(BoxingError::UnknownDeclaration {
                id,
                location: SourceLocation::unknown(),
            })
    }

    pub fn ty(&self, id: TypeId) -> BoxingResult<&ProducedType> {
        self.types.get(id).ok_or(BoxingError::UnknownType {
            id,
            location: SourceLocation::unknown(),
        })
    }

    /// Display name of a declaration
    pub fn name_of(&self, id: DeclId) -> &str {
        self.declarations
            .get(id)
            .and_then(|d| d.name)
            .map(|n| self.interner.resolve(n))
            .unwrap_or("<anonymous>")
    }

    /// Dotted name through the enclosing declarations, e.g. `Outer.Inner.x`
    pub fn qualified_name(&self, id: DeclId) -> String {
        let mut parts = vec![self.name_of(id)];
        let mut current = self.declarations.get(id).and_then(|d| d.container.owner());
        while let Some(owner) = current {
            if parts.len() > self.declarations.len() {
                break;
            }
            parts.push(self.name_of(owner));
            current = self.declarations.get(owner).and_then(|d| d.container.owner());
        }
        parts.reverse();
        parts.join(".")
    }

    /// The declaration a type reference points at, if it is nominal or a type parameter
    pub fn type_declaration(&self, id: TypeId) -> Option<&Declaration> {
        self.types
            .get(id)
            .and_then(|t| t.declaration())
            .and_then(|d| self.declarations.get(d))
    }

    /// Class extended by `class`, if any
    pub fn extended_class(&self, class: DeclId) -> Option<DeclId> {
        let extended = self.declarations.get(class)?.extended_type()?;
        self.types.get(extended)?.declaration()
    }

    pub fn next_expr_id(&mut self) -> ExprId {
        let id = ExprId::from_raw(self.next_expr);
        self.next_expr += 1;
        id
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}
