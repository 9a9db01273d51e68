//! Construction helpers for declaration graphs and typed trees
//!
//! The type checker is the real producer of the model; this builder lets
//! tests, benchmarks and embedders assemble programs without one. Members
//! declared inside a class or interface are registered as its members, and
//! parameters are appended to the owner's last parameter list.

use super::declarations::{
    ClassInfo, Container, DeclFlags, DeclKind, InterfaceInfo, MethodInfo, ParameterList,
    SourceLocation, TypeParameterInfo, Variance,
};
use super::id_types::{DeclId, TypeId};
use super::node::*;
use super::types::TypeKind;
use super::{CoreDeclarations, Program};

pub struct ProgramBuilder {
    program: Program,
    location: SourceLocation,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self {
            program: Program::new(),
            location: SourceLocation::unknown(),
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn program_mut(&mut self) -> &mut Program {
        &mut self.program
    }

    pub fn core(&self) -> CoreDeclarations {
        self.program.core
    }

    pub fn finish(self) -> Program {
        self.program
    }

    /// Location stamped on everything created from now on
    pub fn at(&mut self, location: SourceLocation) -> &mut Self {
        self.location = location;
        self
    }

    // ===== Declarations =====

    pub fn declare(&mut self, name: Option<&str>, kind: DeclKind, container: Container) -> DeclId {
        let name = name.map(|n| self.program.interner.intern(n));
        let id = self.program.declarations.add(name, kind, container);
        let location = self.location;
        let mut register_member = false;
        if let Some(decl) = self.program.declarations.get_mut(id) {
            decl.location = location;
            register_member = !decl.is_type_parameter();
            if container == Container::Unit {
                decl.flags.insert(DeclFlags::TOPLEVEL);
            }
        }
        if let (true, Container::Declaration(owner)) = (register_member, container) {
            self.register_member(owner, id);
        }
        id
    }

    fn register_member(&mut self, owner: DeclId, member: DeclId) {
        match self.program.declarations.get_mut(owner).map(|d| &mut d.kind) {
            Some(DeclKind::Class(info)) => info.members.push(member),
            Some(DeclKind::Interface(info)) => info.members.push(member),
            _ => {}
        }
    }

    /// Class without a parameter list
    pub fn class(&mut self, name: &str, container: Container) -> DeclId {
        self.declare(Some(name), DeclKind::Class(ClassInfo::default()), container)
    }

    /// Class with an (initially empty) parameter list
    pub fn class_with_parameters(&mut self, name: &str, container: Container) -> DeclId {
        let info = ClassInfo {
            parameter_list: Some(ParameterList::new()),
            ..ClassInfo::default()
        };
        self.declare(Some(name), DeclKind::Class(info), container)
    }

    pub fn interface(&mut self, name: &str, container: Container) -> DeclId {
        self.declare(
            Some(name),
            DeclKind::Interface(InterfaceInfo::default()),
            container,
        )
    }

    pub fn value(&mut self, name: &str, container: Container, ty: TypeId) -> DeclId {
        let id = self.declare(Some(name), DeclKind::Value, container);
        self.set_type(id, ty);
        id
    }

    /// Method with one empty parameter list
    pub fn method(&mut self, name: &str, container: Container, result: TypeId) -> DeclId {
        let info = MethodInfo {
            parameter_lists: vec![ParameterList::new()],
            declared_void: false,
        };
        let id = self.declare(Some(name), DeclKind::Method(info), container);
        self.set_type(id, result);
        id
    }

    /// Method declared with the `void` keyword
    pub fn void_method(&mut self, name: &str, container: Container) -> DeclId {
        let anything = self.anything_type();
        let id = self.method(name, container, anything);
        if let Some(DeclKind::Method(info)) = self.program.declarations.get_mut(id).map(|d| &mut d.kind) {
            info.declared_void = true;
        }
        id
    }

    /// Anonymous method backing a function literal or method argument
    pub fn anonymous_method(&mut self, container: Container, result: TypeId) -> DeclId {
        let info = MethodInfo {
            parameter_lists: vec![ParameterList::new()],
            declared_void: false,
        };
        let id = self.declare(None, DeclKind::Method(info), container);
        self.set_type(id, result);
        self.add_flags(id, DeclFlags::FUNCTION_ARGUMENT);
        id
    }

    /// Setter for an attribute, returning `(setter, parameter)`
    pub fn setter(&mut self, name: &str, container: Container, ty: TypeId) -> (DeclId, DeclId) {
        let param_name = self.program.interner.intern(name);
        let parameter = self
            .program
            .declarations
            .add(Some(param_name), DeclKind::Value, Container::Unit);
        let setter = self.declare(Some(name), DeclKind::Setter { parameter }, container);
        let location = self.location;
        let param_type = self.duplicate(ty);
        if let Some(decl) = self.program.declarations.get_mut(parameter) {
            decl.container = Container::Declaration(setter);
            decl.flags.insert(DeclFlags::PARAMETER);
            decl.type_id = Some(param_type);
            decl.location = location;
        }
        (setter, parameter)
    }

    pub fn type_alias(&mut self, name: &str, container: Container, target: TypeId) -> DeclId {
        self.declare(Some(name), DeclKind::TypeAlias { target: Some(target) }, container)
    }

    pub fn type_parameter(&mut self, owner: DeclId, name: &str, bounds: &[TypeId]) -> DeclId {
        let info = TypeParameterInfo::new(Variance::Invariant, bounds.to_vec());
        let id = self.declare(
            Some(name),
            DeclKind::TypeParameter(info),
            Container::Declaration(owner),
        );
        if let Some(decl) = self.program.declarations.get_mut(owner) {
            decl.type_parameters.push(id);
        }
        id
    }

    /// Value parameter appended to the last parameter list of `owner`
    pub fn parameter(&mut self, owner: DeclId, name: &str, ty: TypeId) -> DeclId {
        let id = self.declare(Some(name), DeclKind::Value, Container::Declaration(owner));
        self.set_type(id, ty);
        self.add_flags(id, DeclFlags::PARAMETER);
        self.append_parameter(owner, id);
        id
    }

    /// Functional parameter `Result name()` appended to the last parameter list of `owner`
    pub fn functional_parameter(&mut self, owner: DeclId, name: &str, result: TypeId) -> DeclId {
        let info = MethodInfo {
            parameter_lists: vec![ParameterList::new()],
            declared_void: false,
        };
        let id = self.declare(Some(name), DeclKind::Method(info), Container::Declaration(owner));
        self.set_type(id, result);
        self.add_flags(id, DeclFlags::PARAMETER);
        self.append_parameter(owner, id);
        id
    }

    fn append_parameter(&mut self, owner: DeclId, parameter: DeclId) {
        match self.program.declarations.get_mut(owner).map(|d| &mut d.kind) {
            Some(DeclKind::Method(info)) => {
                if info.parameter_lists.is_empty() {
                    info.parameter_lists.push(ParameterList::new());
                }
                if let Some(last) = info.parameter_lists.last_mut() {
                    last.push(parameter);
                }
            }
            Some(DeclKind::Class(info)) => {
                info.parameter_list
                    .get_or_insert_with(ParameterList::new)
                    .push(parameter);
            }
            _ => {}
        }
    }

    /// Start a further parameter list on a method
    pub fn add_parameter_list(&mut self, method: DeclId) {
        if let Some(DeclKind::Method(info)) = self.program.declarations.get_mut(method).map(|d| &mut d.kind) {
            info.parameter_lists.push(ParameterList::new());
        }
    }

    pub fn add_flags(&mut self, id: DeclId, flags: DeclFlags) {
        if let Some(decl) = self.program.declarations.get_mut(id) {
            decl.flags.insert(flags);
        }
    }

    pub fn refines(&mut self, id: DeclId, refined: DeclId) {
        if let Some(decl) = self.program.declarations.get_mut(id) {
            decl.refined = Some(refined);
        }
    }

    pub fn set_type(&mut self, id: DeclId, ty: TypeId) {
        if let Some(decl) = self.program.declarations.get_mut(id) {
            decl.type_id = Some(ty);
        }
    }

    pub fn extend(&mut self, class: DeclId, parent: TypeId) {
        if let Some(DeclKind::Class(info)) = self.program.declarations.get_mut(class).map(|d| &mut d.kind) {
            info.extended_type = Some(parent);
        }
    }

    pub fn satisfy(&mut self, declaration: DeclId, ty: TypeId) {
        match self.program.declarations.get_mut(declaration).map(|d| &mut d.kind) {
            Some(DeclKind::Class(info)) => info.satisfied_types.push(ty),
            Some(DeclKind::Interface(info)) => info.satisfied_types.push(ty),
            Some(DeclKind::TypeParameter(info)) => info.satisfied_types.push(ty),
            _ => {}
        }
    }

    // ===== Types =====

    /// `decl` applied to no type arguments
    pub fn type_of(&mut self, decl: DeclId) -> TypeId {
        self.program.types.nominal(decl, &[])
    }

    pub fn generic(&mut self, decl: DeclId, args: &[TypeId]) -> TypeId {
        self.program.types.nominal(decl, args)
    }

    pub fn type_parameter_type(&mut self, type_parameter: DeclId) -> TypeId {
        self.program.types.type_parameter(type_parameter)
    }

    pub fn union(&mut self, cases: &[TypeId]) -> TypeId {
        self.program.types.union(cases)
    }

    pub fn intersection(&mut self, satisfied: &[TypeId]) -> TypeId {
        self.program.types.intersection(satisfied)
    }

    /// `T?`, i.e. `T|Null`
    pub fn optional(&mut self, ty: TypeId) -> TypeId {
        let null = self.null_type();
        self.program.types.union(&[ty, null])
    }

    pub fn nothing_type(&mut self) -> TypeId {
        self.program.types.create(TypeKind::Nothing)
    }

    pub fn error_type(&mut self) -> TypeId {
        self.program.types.create(TypeKind::Error)
    }

    pub fn anything_type(&mut self) -> TypeId {
        self.type_of(self.program.core.anything)
    }

    pub fn object_type(&mut self) -> TypeId {
        self.type_of(self.program.core.object)
    }

    pub fn null_type(&mut self) -> TypeId {
        self.type_of(self.program.core.null)
    }

    pub fn boolean_type(&mut self) -> TypeId {
        self.type_of(self.program.core.boolean)
    }

    pub fn integer_type(&mut self) -> TypeId {
        self.type_of(self.program.core.integer)
    }

    pub fn float_type(&mut self) -> TypeId {
        self.type_of(self.program.core.float)
    }

    pub fn string_type(&mut self) -> TypeId {
        self.type_of(self.program.core.string)
    }

    pub fn character_type(&mut self) -> TypeId {
        self.type_of(self.program.core.character)
    }

    /// `Element[]`
    pub fn sequential_type(&mut self, element: TypeId) -> TypeId {
        self.generic(self.program.core.sequential, &[element])
    }

    /// Fresh copy of a type reference; the invalid id is passed through
    pub fn duplicate(&mut self, ty: TypeId) -> TypeId {
        self.program.types.duplicate(ty).unwrap_or(ty)
    }

    fn type_of_declaration(&mut self, decl: DeclId) -> Option<TypeId> {
        let ty = self.program.declarations.get(decl)?.type_id?;
        Some(self.duplicate(ty))
    }

    // ===== Expressions =====

    pub fn expr(&mut self, kind: ExprKind, type_id: Option<TypeId>) -> Expression {
        Expression {
            id: self.program.next_expr_id(),
            kind,
            type_id,
            annotations: ExprAnnotations::default(),
            location: self.location,
        }
    }

    pub fn natural(&mut self, value: u64) -> Expression {
        let ty = self.integer_type();
        self.expr(ExprKind::Literal(Literal::Natural(value)), Some(ty))
    }

    pub fn float(&mut self, value: f64) -> Expression {
        let ty = self.float_type();
        self.expr(ExprKind::Literal(Literal::Float(value)), Some(ty))
    }

    pub fn string(&mut self, value: &str) -> Expression {
        let ty = self.string_type();
        self.expr(ExprKind::Literal(Literal::String(value.to_string())), Some(ty))
    }

    pub fn character(&mut self, value: char) -> Expression {
        let ty = self.character_type();
        self.expr(ExprKind::Literal(Literal::Character(value)), Some(ty))
    }

    pub fn string_template(&mut self, parts: Vec<Expression>) -> Expression {
        let ty = self.string_type();
        self.expr(ExprKind::StringTemplate { parts }, Some(ty))
    }

    /// Reference to `decl` by its simple name
    pub fn base(&mut self, decl: DeclId) -> Expression {
        let ty = self.type_of_declaration(decl);
        self.expr(
            ExprKind::BaseMember {
                declaration: Some(decl),
                type_args: Vec::new(),
            },
            ty,
        )
    }

    /// Reference to a declaration the checker failed to resolve
    pub fn unresolved(&mut self) -> Expression {
        self.expr(
            ExprKind::BaseMember {
                declaration: None,
                type_args: Vec::new(),
            },
            None,
        )
    }

    /// Reference to a class used as a constructor
    pub fn base_type(&mut self, class: DeclId) -> Expression {
        let ty = self.type_of(class);
        self.expr(ExprKind::BaseType { declaration: Some(class) }, Some(ty))
    }

    pub fn qualified(&mut self, primary: Expression, member: DeclId, operator: MemberOperator) -> Expression {
        let ty = self.type_of_declaration(member);
        self.expr(
            ExprKind::QualifiedMember {
                primary: Box::new(primary),
                member: Some(member),
                operator,
                type_args: Vec::new(),
            },
            ty,
        )
    }

    /// `primary.member`
    pub fn member(&mut self, primary: Expression, member: DeclId) -> Expression {
        self.qualified(primary, member, MemberOperator::Member)
    }

    /// `primary?.member`
    pub fn safe_member(&mut self, primary: Expression, member: DeclId) -> Expression {
        self.qualified(primary, member, MemberOperator::Safe)
    }

    /// Invocation with positional arguments; result type defaults to the primary's type
    pub fn invoke(&mut self, primary: Expression, arguments: Vec<Expression>, ty: Option<TypeId>) -> Expression {
        let ty = ty.or_else(|| primary.type_id.map(|t| self.duplicate(t)));
        self.expr(
            ExprKind::Invocation {
                primary: Box::new(primary),
                arguments: Arguments::Positional(arguments),
            },
            ty,
        )
    }

    pub fn invoke_named(&mut self, primary: Expression, arguments: Vec<NamedArgument>, ty: Option<TypeId>) -> Expression {
        let ty = ty.or_else(|| primary.type_id.map(|t| self.duplicate(t)));
        self.expr(
            ExprKind::Invocation {
                primary: Box::new(primary),
                arguments: Arguments::Named(arguments),
            },
            ty,
        )
    }

    pub fn unary(&mut self, operator: UnaryOperator, operand: Expression) -> Expression {
        let ty = if operator == UnaryOperator::Not {
            Some(self.boolean_type())
        } else {
            operand.type_id.map(|t| self.duplicate(t))
        };
        self.expr(
            ExprKind::Unary {
                operator,
                operand: Box::new(operand),
            },
            ty,
        )
    }

    /// Binary operation; result type defaults to Boolean for boolean operators
    /// and to the left operand's type otherwise
    pub fn binary(&mut self, operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
        let ty = if operator.yields_boolean() {
            Some(self.boolean_type())
        } else {
            left.type_id.map(|t| self.duplicate(t))
        };
        self.binary_typed(operator, left, right, ty)
    }

    pub fn binary_typed(
        &mut self,
        operator: BinaryOperator,
        left: Expression,
        right: Expression,
        ty: Option<TypeId>,
    ) -> Expression {
        self.expr(
            ExprKind::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
        )
    }

    pub fn assign(&mut self, target: Expression, value: Expression) -> Expression {
        let ty = target.type_id.map(|t| self.duplicate(t));
        self.expr(
            ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            ty,
        )
    }

    pub fn enclosing(&mut self, inner: Expression) -> Expression {
        let ty = inner.type_id.map(|t| self.duplicate(t));
        self.expr(ExprKind::Enclosing(Box::new(inner)), ty)
    }

    pub fn if_expr(
        &mut self,
        conditions: Vec<Condition>,
        then_expr: Expression,
        else_expr: Expression,
        ty: Option<TypeId>,
    ) -> Expression {
        self.expr(
            ExprKind::If {
                conditions,
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            ty,
        )
    }

    pub fn function_literal(&mut self, declaration: DeclId, body: Expression) -> Expression {
        let parameter_lists = self.parameter_nodes(declaration);
        let callable = self.type_of(self.program.core.callable);
        self.expr(
            ExprKind::FunctionLiteral(FunctionLiteral {
                declaration: Some(declaration),
                parameter_lists,
                body: FunctionBody::Expression(Box::new(body)),
            }),
            Some(callable),
        )
    }

    pub fn index(&mut self, primary: Expression, index: Expression, ty: Option<TypeId>) -> Expression {
        self.expr(
            ExprKind::Index {
                primary: Box::new(primary),
                operator: IndexOperator::Element(Box::new(index)),
            },
            ty,
        )
    }

    pub fn comprehension(&mut self, clause: ComprehensionClause, ty: Option<TypeId>) -> Expression {
        self.expr(ExprKind::Comprehension(Box::new(clause)), ty)
    }

    // ===== Statements =====

    /// Parameter nodes mirroring the parameter lists recorded on `decl`
    pub fn parameter_nodes(&self, decl: DeclId) -> Vec<Vec<ParameterNode>> {
        let Some(declaration) = self.program.declarations.get(decl) else {
            return Vec::new();
        };
        declaration
            .parameter_lists()
            .iter()
            .map(|list| {
                list.iter()
                    .map(|&param| {
                        let functional = self
                            .program
                            .declarations
                            .get(param)
                            .filter(|p| p.is_method())
                            .map(|_| self.parameter_nodes(param));
                        ParameterNode {
                            declaration: param,
                            default_value: None,
                            functional,
                        }
                    })
                    .collect()
            })
            .collect()
    }

    pub fn declaration_node(&self, decl: DeclId, body: DeclarationBody) -> DeclarationNode {
        let type_parameters = self
            .program
            .declarations
            .get(decl)
            .map(|d| d.type_parameters.clone())
            .unwrap_or_default();
        DeclarationNode {
            declaration: decl,
            parameter_lists: self.parameter_nodes(decl),
            type_parameters,
            body,
            inferred_type: false,
            location: self.location,
        }
    }

    /// Declaration statement with a body
    pub fn declaration(&self, decl: DeclId, body: DeclarationBody) -> Statement {
        Statement::Declaration(self.declaration_node(decl, body))
    }

    /// Declaration statement with `= value`
    pub fn declaration_with_value(&self, decl: DeclId, value: Expression) -> Statement {
        self.declaration(decl, DeclarationBody::Specifier { value, lazy: false })
    }

    /// Class or interface declaration whose body holds `members`
    pub fn type_declaration(&self, decl: DeclId, members: Vec<Statement>) -> Statement {
        self.declaration(decl, DeclarationBody::Block(Block { statements: members }))
    }

    /// `target = value;`
    pub fn specification(&mut self, target: DeclId, value: Expression, lazy: bool) -> Statement {
        let target = self.base(target);
        Statement::Specification {
            target,
            value,
            lazy,
        }
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_and_parameters_are_registered() {
        let mut b = ProgramBuilder::new();
        let class = b.class_with_parameters("Point", Container::Unit);
        let int = b.integer_type();
        let x = b.parameter(class, "x", int);
        let float = b.float_type();
        let m = b.method("length", Container::Declaration(class), float);

        let program = b.finish();
        let point = program.declarations.get(class).unwrap();
        assert!(point.is_toplevel());
        assert_eq!(point.members(), &[x, m]);
        assert_eq!(point.parameter_lists().len(), 1);
        assert!(program.declarations.get(x).unwrap().is_value_parameter());
    }

    #[test]
    fn test_parameter_nodes_follow_functional_parameters() {
        let mut b = ProgramBuilder::new();
        let anything = b.anything_type();
        let f = b.method("apply", Container::Unit, anything);
        let int = b.integer_type();
        let g = b.functional_parameter(f, "g", int);
        let s = b.string_type();
        b.parameter(g, "s", s);

        let nodes = b.parameter_nodes(f);
        assert_eq!(nodes.len(), 1);
        let functional = nodes[0][0].functional.as_ref().unwrap();
        assert_eq!(functional[0].len(), 1);
    }

    #[test]
    fn test_base_reference_gets_fresh_type() {
        let mut b = ProgramBuilder::new();
        let int = b.integer_type();
        let v = b.value("count", Container::Unit, int);
        let reference = b.base(v);
        assert_ne!(reference.type_id, Some(int));
        assert!(b
            .program()
            .types
            .is_exactly(reference.type_id.unwrap(), int));
    }

    #[test]
    fn test_qualified_names() {
        let mut b = ProgramBuilder::new();
        let outer = b.class("Outer", Container::Unit);
        let inner = b.class_with_parameters("Inner", Container::Declaration(outer));
        let int = b.integer_type();
        let x = b.parameter(inner, "x", int);
        let program = b.finish();
        assert_eq!(program.qualified_name(x), "Outer.Inner.x");
        assert_eq!(program.qualified_name(outer), "Outer");
    }
}
