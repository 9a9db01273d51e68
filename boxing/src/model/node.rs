//! Typed statement and expression tree
//!
//! The tree is what the type checker hands to the backend: every expression
//! node carries its type (when one could be computed) and an
//! [`ExprAnnotations`] record that the boxing phase fills in. References to
//! declarations are `Option<DeclId>`; `None` marks an upstream error the
//! checker already reported.

use super::declarations::SourceLocation;
use super::id_types::{DeclId, ExprId, TypeId};
use super::string_intern::InternedString;

/// Representation facts of one expression node; all `false` means boxed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExprAnnotations {
    pub unboxed: bool,
    pub type_erased: bool,
    pub raw: bool,
    pub untrusted_type: bool,
}

#[derive(Debug, Clone)]
pub struct Expression {
    pub id: ExprId,
    pub kind: ExprKind,
    pub type_id: Option<TypeId>,
    pub annotations: ExprAnnotations,
    pub location: SourceLocation,
}

impl Expression {
    /// Strip enclosing parentheses
    pub fn unwrap_enclosing(&self) -> &Expression {
        match &self.kind {
            ExprKind::Enclosing(inner) => inner.unwrap_enclosing(),
            _ => self,
        }
    }

    /// Declaration referenced by a base or qualified member expression
    pub fn member_declaration(&self) -> Option<DeclId> {
        match &self.kind {
            ExprKind::BaseMember { declaration, .. } => *declaration,
            ExprKind::QualifiedMember { member, .. } => *member,
            ExprKind::BaseType { declaration } => *declaration,
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Natural(u64),
    Float(f64),
    String(String),
    Character(char),
}

/// How a qualified member is reached from its primary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberOperator {
    /// `x.member`
    Member,
    /// `x?.member`
    Safe,
    /// `xs*.member`
    Spread,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Positive,
    Negative,
    Not,
    PrefixIncrement,
    PrefixDecrement,
    PostfixIncrement,
    PostfixDecrement,
}

impl UnaryOperator {
    /// Operators whose result has the representation of their operand
    pub fn propagates_operand(self) -> bool {
        !matches!(self, UnaryOperator::Not)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Sum,
    Difference,
    Product,
    Quotient,
    Remainder,
    Power,
    SumAssign,
    DifferenceAssign,
    ProductAssign,
    QuotientAssign,
    RemainderAssign,
    And,
    Or,
    AndAssign,
    OrAssign,
    Equal,
    NotEqual,
    Identical,
    Smaller,
    Larger,
    SmallAs,
    LargeAs,
    /// `<=>`
    Compare,
    In,
    Range,
    Segment,
    Entry,
    Union,
    Intersection,
    Complement,
    UnionAssign,
    IntersectionAssign,
    ComplementAssign,
    Then,
    Else,
}

impl BinaryOperator {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOperator::Sum
                | BinaryOperator::Difference
                | BinaryOperator::Product
                | BinaryOperator::Quotient
                | BinaryOperator::Remainder
        )
    }

    pub fn is_arithmetic_assign(self) -> bool {
        matches!(
            self,
            BinaryOperator::SumAssign
                | BinaryOperator::DifferenceAssign
                | BinaryOperator::ProductAssign
                | BinaryOperator::QuotientAssign
                | BinaryOperator::RemainderAssign
        )
    }

    /// Operators whose result is always a truth value
    pub fn yields_boolean(self) -> bool {
        matches!(
            self,
            BinaryOperator::And
                | BinaryOperator::Or
                | BinaryOperator::AndAssign
                | BinaryOperator::OrAssign
                | BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::Identical
                | BinaryOperator::Smaller
                | BinaryOperator::Larger
                | BinaryOperator::SmallAs
                | BinaryOperator::LargeAs
                | BinaryOperator::In
        )
    }
}

#[derive(Debug, Clone)]
pub enum NamedArgument {
    /// `name = expr;`
    Specified { name: InternedString, value: Expression },
    /// `value name => expr;` or `value name { ... }`
    Attribute { declaration: DeclId, body: FunctionBody },
    /// `function name(...) => expr;`
    Method {
        declaration: DeclId,
        parameter_lists: Vec<Vec<ParameterNode>>,
        body: FunctionBody,
    },
    /// Trailing sequenced argument `{ a, b, c }`
    Sequenced(Vec<Expression>),
}

#[derive(Debug, Clone)]
pub enum Arguments {
    Positional(Vec<Expression>),
    Named(Vec<NamedArgument>),
}

impl Arguments {
    pub fn positional(&self) -> &[Expression] {
        match self {
            Arguments::Positional(args) => args,
            Arguments::Named(_) => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub enum Condition {
    Boolean(Expression),
    /// `is T x = e` or `is T e`
    Is {
        variable: Option<DeclId>,
        expression: Expression,
        tested: Option<TypeId>,
    },
    /// `exists x = e`
    Exists { variable: Option<DeclId>, expression: Expression },
    /// `nonempty xs = e`
    Nonempty { variable: Option<DeclId>, expression: Expression },
}

impl Condition {
    pub fn variable(&self) -> Option<DeclId> {
        match self {
            Condition::Boolean(_) => None,
            Condition::Is { variable, .. }
            | Condition::Exists { variable, .. }
            | Condition::Nonempty { variable, .. } => *variable,
        }
    }
}

/// Destructuring pattern of a `for` iterator
#[derive(Debug, Clone)]
pub enum Pattern {
    Variable(DeclId),
    Tuple(Vec<Pattern>),
    KeyValue { key: Box<Pattern>, value: Box<Pattern> },
}

#[derive(Debug, Clone)]
pub enum ForIterator {
    /// `for (x in xs)`
    Value { variable: DeclId, iterated: Expression },
    /// `for (k -> v in entries)`
    KeyValue {
        key: DeclId,
        value: DeclId,
        iterated: Expression,
    },
    /// `for ([a, b] in pairs)`
    Pattern { pattern: Pattern, iterated: Expression },
}

impl ForIterator {
    pub fn iterated(&self) -> &Expression {
        match self {
            ForIterator::Value { iterated, .. }
            | ForIterator::KeyValue { iterated, .. }
            | ForIterator::Pattern { iterated, .. } => iterated,
        }
    }

    pub fn iterated_mut(&mut self) -> &mut Expression {
        match self {
            ForIterator::Value { iterated, .. }
            | ForIterator::KeyValue { iterated, .. }
            | ForIterator::Pattern { iterated, .. } => iterated,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ComprehensionClause {
    For { iterator: ForIterator, next: Box<ComprehensionClause> },
    If { conditions: Vec<Condition>, next: Box<ComprehensionClause> },
    Expression(Box<Expression>),
}

#[derive(Debug, Clone)]
pub enum FunctionBody {
    Expression(Box<Expression>),
    Block(Block),
}

#[derive(Debug, Clone)]
pub struct FunctionLiteral {
    /// The anonymous method the checker created for this literal
    pub declaration: Option<DeclId>,
    pub parameter_lists: Vec<Vec<ParameterNode>>,
    pub body: FunctionBody,
}

#[derive(Debug, Clone)]
pub enum IndexOperator {
    /// `xs[i]`
    Element(Box<Expression>),
    /// `xs[a..b]`, `xs[a...]`, `xs[...b]`
    Span {
        from: Option<Box<Expression>>,
        to: Option<Box<Expression>>,
    },
}

#[derive(Debug, Clone)]
pub enum TypeLiteralTarget {
    /// A type instance, e.g. `` `List<String>` ``
    Type(TypeId),
    /// A declaration reference, e.g. `` `class List` ``
    Declaration(DeclId),
}

#[derive(Debug, Clone)]
pub struct SwitchCaseExpr {
    pub matches: Vec<Expression>,
    pub result: Expression,
}

#[derive(Debug, Clone)]
pub struct LetVariable {
    pub declaration: DeclId,
    pub value: Expression,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    /// `"Hello, ``name``!"`
    StringTemplate { parts: Vec<Expression> },
    BaseMember {
        declaration: Option<DeclId>,
        type_args: Vec<TypeId>,
    },
    QualifiedMember {
        primary: Box<Expression>,
        member: Option<DeclId>,
        operator: MemberOperator,
        type_args: Vec<TypeId>,
    },
    /// Reference to a class used as a constructor
    BaseType { declaration: Option<DeclId> },
    /// Parenthesised expression
    Enclosing(Box<Expression>),
    Invocation {
        primary: Box<Expression>,
        arguments: Arguments,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Assign {
        target: Box<Expression>,
        value: Box<Expression>,
    },
    Exists(Box<Expression>),
    Nonempty(Box<Expression>),
    Is {
        operand: Box<Expression>,
        tested: Option<TypeId>,
    },
    /// `lower < operand <= upper`
    Within {
        lower: Box<Expression>,
        operand: Box<Expression>,
        upper: Box<Expression>,
    },
    If {
        conditions: Vec<Condition>,
        then_expr: Box<Expression>,
        else_expr: Box<Expression>,
    },
    Switch {
        discriminant: Box<Expression>,
        cases: Vec<SwitchCaseExpr>,
        else_expr: Option<Box<Expression>>,
    },
    Let {
        variables: Vec<LetVariable>,
        result: Box<Expression>,
    },
    TypeLiteral(TypeLiteralTarget),
    FunctionLiteral(FunctionLiteral),
    Index {
        primary: Box<Expression>,
        operator: IndexOperator,
    },
    Tuple(Vec<Expression>),
    Sequence(Vec<Expression>),
    Comprehension(Box<ComprehensionClause>),
    /// `*xs` in an argument list
    SpreadArgument(Box<Expression>),
    This,
    Super,
    Outer,
}

/// A parameter as written in a parameter list
#[derive(Debug, Clone)]
pub struct ParameterNode {
    pub declaration: DeclId,
    pub default_value: Option<Expression>,
    /// Parameter lists of a functional parameter `Integer f(String s)`
    pub functional: Option<Vec<Vec<ParameterNode>>>,
}

#[derive(Debug, Clone)]
pub enum DeclarationBody {
    None,
    /// `= expr` or `=> expr`
    Specifier { value: Expression, lazy: bool },
    Block(Block),
}

#[derive(Debug, Clone)]
pub struct DeclarationNode {
    pub declaration: DeclId,
    pub parameter_lists: Vec<Vec<ParameterNode>>,
    pub type_parameters: Vec<DeclId>,
    pub body: DeclarationBody,
    /// Declared with `value`/`function` instead of an explicit type
    pub inferred_type: bool,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub matches: Vec<Expression>,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub enum Statement {
    Declaration(DeclarationNode),
    /// `target = value;` or `target => value;` for a declared but unspecified member
    Specification {
        target: Expression,
        value: Expression,
        lazy: bool,
    },
    Expression(Expression),
    Return(Option<Expression>),
    Throw(Option<Expression>),
    If {
        conditions: Vec<Condition>,
        then_block: Block,
        else_block: Option<Block>,
    },
    While {
        conditions: Vec<Condition>,
        body: Block,
    },
    For {
        iterator: ForIterator,
        body: Block,
        else_block: Option<Block>,
    },
    Switch {
        discriminant: Expression,
        cases: Vec<SwitchCase>,
        else_block: Option<Block>,
    },
    Block(Block),
    Break,
    Continue,
}

/// One source file's worth of typed tree
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub name: String,
    pub statements: Vec<Statement>,
}

impl CompilationUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            statements: Vec::new(),
        }
    }
}

/// Source location of a node, for diagnostics
pub trait HasSourceLocation {
    fn source_location(&self) -> SourceLocation;
}

impl HasSourceLocation for Expression {
    fn source_location(&self) -> SourceLocation {
        self.location
    }
}

impl HasSourceLocation for DeclarationNode {
    fn source_location(&self) -> SourceLocation {
        self.location
    }
}
