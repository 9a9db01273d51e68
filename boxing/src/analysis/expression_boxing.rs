//! Expression boxing analysis
//!
//! Annotates every expression node of every executable body, bottom-up. Each
//! node kind has exactly one rule deriving the node's flags from its children
//! and from the declarations it references, which must already have been
//! decided by the declaration analyzer.

use super::policy::{has_non_erased_bounds, RepresentationPolicy};
use super::predicates::{contains_type_parameter, Annotated};
use crate::error::{BoxingError, BoxingResult};
use crate::model::id_types::collections::new_id_set;
use crate::model::*;
use log::{debug, trace};
use std::collections::VecDeque;

/// Counters collected while annotating expressions
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ExpressionStats {
    pub nodes_visited: usize,
    pub unboxed: usize,
    pub type_erased: usize,
    pub raw: usize,
    pub untrusted: usize,
    /// Index expressions whose accessor could not be resolved
    pub unresolved_accessors: usize,
}

pub struct ExpressionBoxingAnalyzer<'a> {
    program: &'a mut Program,
    policy: &'a dyn RepresentationPolicy,
    /// Declarations whose bodies enclose the current node, innermost last
    scopes: Vec<DeclId>,
    /// Variables bound by the for clauses of the comprehensions being visited
    comprehension_bound: Vec<DeclId>,
    stats: ExpressionStats,
    /// Every annotated node, when recording was requested
    records: Option<Vec<ExpressionRecord>>,
}

/// Annotations of one node, as recorded for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpressionRecord {
    pub id: ExprId,
    pub location: SourceLocation,
    pub annotations: ExprAnnotations,
}

impl<'a> ExpressionBoxingAnalyzer<'a> {
    pub fn new(program: &'a mut Program, policy: &'a dyn RepresentationPolicy) -> Self {
        Self {
            program,
            policy,
            scopes: Vec::new(),
            comprehension_bound: Vec::new(),
            stats: ExpressionStats::default(),
            records: None,
        }
    }

    /// Keep a record of every annotated node, see [`take_records`](Self::take_records)
    pub fn with_recording(mut self, enabled: bool) -> Self {
        self.records = enabled.then(Vec::new);
        self
    }

    pub fn take_records(&mut self) -> Vec<ExpressionRecord> {
        self.records.as_mut().map(std::mem::take).unwrap_or_default()
    }

    pub fn stats(&self) -> ExpressionStats {
        self.stats
    }

    pub fn analyze_unit(&mut self, unit: &mut CompilationUnit) -> BoxingResult<ExpressionStats> {
        let _span = tracing::debug_span!("expression_boxing", unit = %unit.name).entered();
        for statement in &mut unit.statements {
            self.visit_statement(statement)?;
        }
        debug!(
            "expression boxing of '{}': {} nodes, {} unboxed, {} erased",
            unit.name, self.stats.nodes_visited, self.stats.unboxed, self.stats.type_erased
        );
        Ok(self.stats)
    }

    /// Annotate a single expression tree
    pub fn analyze_expression(&mut self, expr: &mut Expression) -> BoxingResult<()> {
        self.visit_expression(expr)
    }

    fn lookup(&self, id: DeclId, location: SourceLocation) -> BoxingResult<&Declaration> {
        self.program
            .declarations
            .get(id)
            .ok_or(BoxingError::UnknownDeclaration { id, location })
    }

    /// The node's type, checked against the type table
    fn node_type(&self, expr: &Expression) -> BoxingResult<Option<TypeId>> {
        match expr.type_id {
            Some(id) if self.program.types.get(id).is_none() => Err(BoxingError::UnknownType {
                id,
                location: expr.location,
            }),
            other => Ok(other),
        }
    }

    // ===== Statements =====

    fn visit_statement(&mut self, statement: &mut Statement) -> BoxingResult<()> {
        match statement {
            Statement::Declaration(node) => self.visit_declaration(node),
            Statement::Specification { target, value, .. } => {
                self.visit_expression(target)?;
                self.visit_expression(value)?;
                self.narrow_small_target(target)
            }
            Statement::Expression(expr) => self.visit_expression(expr),
            Statement::Return(expr) | Statement::Throw(expr) => match expr {
                Some(expr) => self.visit_expression(expr),
                None => Ok(()),
            },
            Statement::If {
                conditions,
                then_block,
                else_block,
            } => {
                self.visit_conditions(conditions)?;
                self.visit_block(then_block)?;
                match else_block {
                    Some(block) => self.visit_block(block),
                    None => Ok(()),
                }
            }
            Statement::While { conditions, body } => {
                self.visit_conditions(conditions)?;
                self.visit_block(body)
            }
            Statement::For {
                iterator,
                body,
                else_block,
            } => {
                self.visit_iterator(iterator)?;
                self.visit_block(body)?;
                match else_block {
                    Some(block) => self.visit_block(block),
                    None => Ok(()),
                }
            }
            Statement::Switch {
                discriminant,
                cases,
                else_block,
            } => {
                self.visit_expression(discriminant)?;
                for case in cases {
                    for item in &mut case.matches {
                        self.visit_expression(item)?;
                    }
                    self.visit_block(&mut case.body)?;
                }
                match else_block {
                    Some(block) => self.visit_block(block),
                    None => Ok(()),
                }
            }
            Statement::Block(block) => self.visit_block(block),
            Statement::Break | Statement::Continue => Ok(()),
        }
    }

    fn visit_block(&mut self, block: &mut Block) -> BoxingResult<()> {
        for statement in &mut block.statements {
            self.visit_statement(statement)?;
        }
        Ok(())
    }

    fn visit_declaration(&mut self, node: &mut DeclarationNode) -> BoxingResult<()> {
        self.lookup(node.declaration, node.location)?;
        let _span = tracing::trace_span!("body", declaration = %node.declaration).entered();
        self.scopes.push(node.declaration);
        let result = self.visit_declaration_body(node);
        self.scopes.pop();
        result
    }

    fn visit_declaration_body(&mut self, node: &mut DeclarationNode) -> BoxingResult<()> {
        self.visit_parameter_lists(&mut node.parameter_lists)?;
        match &mut node.body {
            DeclarationBody::None => Ok(()),
            DeclarationBody::Specifier { value, .. } => self.visit_expression(value),
            DeclarationBody::Block(block) => self.visit_block(block),
        }
    }

    fn visit_parameter_lists(&mut self, lists: &mut [Vec<ParameterNode>]) -> BoxingResult<()> {
        for parameter in lists.iter_mut().flatten() {
            if let Some(default_value) = &mut parameter.default_value {
                self.visit_expression(default_value)?;
            }
            if let Some(functional) = &mut parameter.functional {
                self.visit_parameter_lists(functional)?;
            }
        }
        Ok(())
    }

    fn visit_conditions(&mut self, conditions: &mut [Condition]) -> BoxingResult<()> {
        for condition in conditions {
            match condition {
                Condition::Boolean(expr) => self.visit_expression(expr)?,
                Condition::Is { expression, .. }
                | Condition::Exists { expression, .. }
                | Condition::Nonempty { expression, .. } => self.visit_expression(expression)?,
            }
        }
        Ok(())
    }

    /// Iteration variables stay boxed whatever their type
    fn visit_iterator(&mut self, iterator: &mut ForIterator) -> BoxingResult<Vec<DeclId>> {
        self.visit_expression(iterator.iterated_mut())?;
        let mut variables = Vec::new();
        match iterator {
            ForIterator::Value { variable, .. } => variables.push(*variable),
            ForIterator::KeyValue { key, value, .. } => variables.extend([*key, *value]),
            ForIterator::Pattern { pattern, .. } => pattern_variables(pattern, &mut variables),
        }
        let location = iterator.iterated().location;
        for &variable in &variables {
            self.lookup(variable, location)?;
            self.program.declarations.force_boxed(variable);
        }
        Ok(variables)
    }

    fn visit_comprehension(&mut self, clause: &mut ComprehensionClause) -> BoxingResult<()> {
        match clause {
            ComprehensionClause::For { iterator, next } => {
                let bound = self.visit_iterator(iterator)?;
                let mark = self.comprehension_bound.len();
                self.comprehension_bound.extend(bound);
                let result = self.visit_comprehension(next);
                self.comprehension_bound.truncate(mark);
                result
            }
            ComprehensionClause::If { conditions, next } => {
                for condition in conditions.iter() {
                    if let Some(variable) = condition.variable() {
                        self.lookup(variable, SourceLocation::unknown())?;
                        self.program.declarations.force_boxed(variable);
                    }
                }
                self.visit_conditions(conditions)?;
                self.visit_comprehension(next)
            }
            ComprehensionClause::Expression(expr) => {
                self.box_comprehension_receiver(expr);
                self.visit_expression(expr)
            }
        }
    }

    /// `for (x in xs) x.member`: the receiver variable is read through the iteration machinery
    fn box_comprehension_receiver(&mut self, expr: &Expression) {
        let ExprKind::QualifiedMember { primary, .. } = &expr.unwrap_enclosing().kind else {
            return;
        };
        let ExprKind::BaseMember { declaration: Some(receiver), .. } = primary.kind else {
            return;
        };
        if self.comprehension_bound.contains(&receiver) {
            self.program.declarations.force_boxed(receiver);
        }
    }

    fn visit_function_body(&mut self, body: &mut FunctionBody) -> BoxingResult<()> {
        match body {
            FunctionBody::Expression(expr) => self.visit_expression(expr),
            FunctionBody::Block(block) => self.visit_block(block),
        }
    }

    /// Visit a nested body with `scope` pushed
    fn visit_scoped<T>(
        &mut self,
        scope: Option<DeclId>,
        target: &mut T,
        visit: fn(&mut Self, &mut T) -> BoxingResult<()>,
    ) -> BoxingResult<()> {
        if let Some(scope) = scope {
            self.scopes.push(scope);
        }
        let result = visit(self, target);
        if scope.is_some() {
            self.scopes.pop();
        }
        result
    }

    // ===== Expressions =====

    fn visit_expression(&mut self, expr: &mut Expression) -> BoxingResult<()> {
        self.visit_children(expr)?;
        self.node_type(expr)?;
        let annotations = self.annotate(expr)?;
        expr.annotations = annotations;
        self.record(expr);
        Ok(())
    }

    fn visit_children(&mut self, expr: &mut Expression) -> BoxingResult<()> {
        match &mut expr.kind {
            ExprKind::Literal(_)
            | ExprKind::BaseMember { .. }
            | ExprKind::BaseType { .. }
            | ExprKind::TypeLiteral(_)
            | ExprKind::This
            | ExprKind::Super
            | ExprKind::Outer => Ok(()),
            ExprKind::StringTemplate { parts } | ExprKind::Tuple(parts) | ExprKind::Sequence(parts) => {
                for part in parts {
                    self.visit_expression(part)?;
                }
                Ok(())
            }
            ExprKind::QualifiedMember { primary, .. } => self.visit_expression(primary),
            ExprKind::Enclosing(inner)
            | ExprKind::Exists(inner)
            | ExprKind::Nonempty(inner)
            | ExprKind::SpreadArgument(inner) => self.visit_expression(inner),
            ExprKind::Is { operand, .. } | ExprKind::Unary { operand, .. } => {
                self.visit_expression(operand)
            }
            ExprKind::Invocation { primary, arguments } => {
                self.visit_expression(primary)?;
                self.visit_arguments(arguments)
            }
            ExprKind::Binary { left, right, .. } => {
                self.visit_expression(left)?;
                self.visit_expression(right)
            }
            ExprKind::Assign { target, value } => {
                self.visit_expression(target)?;
                self.visit_expression(value)?;
                self.narrow_small_target(target)
            }
            ExprKind::Within { lower, operand, upper } => {
                self.visit_expression(lower)?;
                self.visit_expression(operand)?;
                self.visit_expression(upper)
            }
            ExprKind::If {
                conditions,
                then_expr,
                else_expr,
            } => {
                self.visit_conditions(conditions)?;
                self.visit_expression(then_expr)?;
                self.visit_expression(else_expr)
            }
            ExprKind::Switch {
                discriminant,
                cases,
                else_expr,
            } => {
                self.visit_expression(discriminant)?;
                for case in cases {
                    for item in &mut case.matches {
                        self.visit_expression(item)?;
                    }
                    self.visit_expression(&mut case.result)?;
                }
                match else_expr {
                    Some(expr) => self.visit_expression(expr),
                    None => Ok(()),
                }
            }
            ExprKind::Let { variables, result } => {
                for variable in variables {
                    self.visit_expression(&mut variable.value)?;
                }
                self.visit_expression(result)
            }
            ExprKind::FunctionLiteral(literal) => {
                let scope = literal.declaration;
                self.visit_scoped(scope, literal, |this, literal| {
                    this.visit_parameter_lists(&mut literal.parameter_lists)?;
                    this.visit_function_body(&mut literal.body)
                })
            }
            ExprKind::Index { primary, operator } => {
                self.visit_expression(primary)?;
                match operator {
                    IndexOperator::Element(index) => self.visit_expression(index),
                    IndexOperator::Span { from, to } => {
                        for bound in [from, to].into_iter().flatten() {
                            self.visit_expression(bound)?;
                        }
                        Ok(())
                    }
                }
            }
            ExprKind::Comprehension(clause) => self.visit_comprehension(clause),
        }
    }

    fn visit_arguments(&mut self, arguments: &mut Arguments) -> BoxingResult<()> {
        match arguments {
            Arguments::Positional(args) => {
                for arg in args {
                    self.visit_expression(arg)?;
                }
                Ok(())
            }
            Arguments::Named(args) => {
                for arg in args {
                    match arg {
                        NamedArgument::Specified { value, .. } => self.visit_expression(value)?,
                        NamedArgument::Sequenced(values) => {
                            for value in values {
                                self.visit_expression(value)?;
                            }
                        }
                        NamedArgument::Attribute { declaration, body } => {
                            self.visit_scoped(Some(*declaration), body, Self::visit_function_body)?
                        }
                        NamedArgument::Method {
                            declaration,
                            parameter_lists,
                            body,
                        } => {
                            self.scopes.push(*declaration);
                            let result = self
                                .visit_parameter_lists(parameter_lists)
                                .and_then(|_| self.visit_function_body(body));
                            self.scopes.pop();
                            result?
                        }
                    }
                }
                Ok(())
            }
        }
    }

    fn record(&mut self, expr: &Expression) {
        let flags = expr.annotations;
        self.stats.nodes_visited += 1;
        self.stats.unboxed += usize::from(flags.unboxed);
        self.stats.type_erased += usize::from(flags.type_erased);
        self.stats.raw += usize::from(flags.raw);
        self.stats.untrusted += usize::from(flags.untrusted_type);
        if let Some(records) = &mut self.records {
            records.push(ExpressionRecord {
                id: expr.id,
                location: expr.location,
                annotations: flags,
            });
        }
        trace!(
            "{} at {}:{}: unboxed={} erased={} raw={} untrusted={}",
            expr.id,
            expr.location.line,
            expr.location.column,
            flags.unboxed,
            flags.type_erased,
            flags.raw,
            flags.untrusted_type
        );
    }

    // ===== Rules =====

    /// Flags of `expr`, whose children are already annotated
    fn annotate(&mut self, expr: &Expression) -> BoxingResult<ExprAnnotations> {
        let unboxed = |unboxed| ExprAnnotations {
            unboxed,
            ..ExprAnnotations::default()
        };
        Ok(match &expr.kind {
            ExprKind::Literal(_) | ExprKind::StringTemplate { .. } => unboxed(true),

            ExprKind::BaseMember { declaration, .. } => match declaration {
                Some(id) => self.base_member(*id, expr.location)?,
                None => ExprAnnotations::default(),
            },

            ExprKind::QualifiedMember {
                primary,
                member,
                operator,
                ..
            } => match member {
                Some(id) => self.qualified_member(primary, *id, *operator, expr.location)?,
                None => ExprAnnotations::default(),
            },

            ExprKind::Enclosing(inner) => {
                let mut flags = inner.annotations;
                if self.denotes_method(inner) {
                    flags.unboxed = false;
                }
                flags
            }

            ExprKind::Invocation { primary, arguments } => self.invocation(primary, arguments, expr.location)?,

            ExprKind::Unary { operator, operand } => {
                unboxed(!operator.propagates_operand() || operand.annotations.unboxed)
            }

            ExprKind::Binary { operator, left, right } => self.binary(expr, *operator, left, right)?,

            ExprKind::Assign { target, .. } => unboxed(target.annotations.unboxed),

            ExprKind::Exists(_) | ExprKind::Nonempty(_) | ExprKind::Is { .. } | ExprKind::Within { .. } => {
                unboxed(true)
            }

            ExprKind::If {
                then_expr, else_expr, ..
            } => self.branches(expr, [&**then_expr, &**else_expr])?,

            ExprKind::Switch { cases, else_expr, .. } => {
                let branches = cases
                    .iter()
                    .map(|case| &case.result)
                    .chain(else_expr.as_deref());
                self.branches(expr, branches)?
            }

            ExprKind::Let { result, .. } => result.annotations,

            ExprKind::TypeLiteral(target) => match target {
                TypeLiteralTarget::Type(_) => {
                    if let Some(ty) = expr.type_id {
                        self.program.types.set_raw(ty, true);
                    }
                    ExprAnnotations {
                        raw: true,
                        ..ExprAnnotations::default()
                    }
                }
                TypeLiteralTarget::Declaration(_) => ExprAnnotations::default(),
            },

            ExprKind::Index { primary, operator } => self.index(expr, primary, operator)?,

            ExprKind::BaseType { .. }
            | ExprKind::FunctionLiteral(_)
            | ExprKind::Tuple(_)
            | ExprKind::Sequence(_)
            | ExprKind::Comprehension(_)
            | ExprKind::SpreadArgument(_)
            | ExprKind::This
            | ExprKind::Super
            | ExprKind::Outer => ExprAnnotations::default(),
        })
    }

    fn declaration_flags(&self, decl: &Declaration) -> ExprAnnotations {
        ExprAnnotations {
            unboxed: decl.is_unboxed(),
            type_erased: decl.has_type_erased(),
            raw: decl.is_raw(&self.program.types),
            untrusted_type: decl.has_untrusted_type(),
        }
    }

    fn base_member(&self, id: DeclId, location: SourceLocation) -> BoxingResult<ExprAnnotations> {
        let decl = self.lookup(id, location)?;
        let mut flags = self.declaration_flags(decl);
        if self.policy.is_boolean_true(self.program, id) || self.policy.is_boolean_false(self.program, id) {
            flags.unboxed = true;
        }
        Ok(flags)
    }

    fn qualified_member(
        &self,
        primary: &Expression,
        member: DeclId,
        operator: MemberOperator,
        location: SourceLocation,
    ) -> BoxingResult<ExprAnnotations> {
        let decl = self.lookup(member, location)?;
        let mut flags = self.declaration_flags(decl);
        let member_type = decl.type_id;

        match operator {
            MemberOperator::Safe => {
                flags.unboxed = false;
                if member_type.is_some_and(|ty| self.mentions_foreign_erased_type_parameter(ty)) {
                    flags.untrusted_type = true;
                }
            }
            MemberOperator::Spread => flags.unboxed = false,
            MemberOperator::Member => {
                let value_primary = primary
                    .type_id
                    .is_some_and(|ty| self.policy.is_basic_type(self.program, ty));
                if value_primary && primary.annotations.unboxed {
                    flags.unboxed = member_type.is_some_and(|ty| self.policy.is_basic_type(self.program, ty));
                }
            }
        }

        if self.erased_through_primary(primary, decl) {
            flags.type_erased = true;
        }
        Ok(flags)
    }

    /// Access through a raw receiver, or through `super` into a generic interface
    fn erased_through_primary(&self, primary: &Expression, member: &Declaration) -> bool {
        let mentions_type_parameter = member
            .type_id
            .is_some_and(|ty| contains_type_parameter(&self.program.types, ty));
        if primary.is_raw(&self.program.types) && mentions_type_parameter {
            return true;
        }
        matches!(primary.unwrap_enclosing().kind, ExprKind::Super)
            && member
                .container
                .declaration()
                .and_then(|owner| self.program.declarations.get(owner))
                .is_some_and(|owner| owner.is_interface() && !owner.type_parameters.is_empty())
    }

    /// The type mentions a type parameter whose bounds all erase and which is
    /// declared outside the bodies enclosing the access
    fn mentions_foreign_erased_type_parameter(&self, ty: TypeId) -> bool {
        self.program.types.any_nested(ty, &mut |t| match t.kind {
            TypeKind::TypeParameter { declaration } => {
                let owner = self
                    .program
                    .declarations
                    .get(declaration)
                    .and_then(|d| d.container.owner());
                let in_scope = owner.is_some_and(|o| self.scopes.contains(&o));
                !in_scope && !has_non_erased_bounds(self.program, self.policy, declaration)
            }
            _ => false,
        })
    }

    /// An uninvoked reference to a method
    fn denotes_method(&self, expr: &Expression) -> bool {
        expr.unwrap_enclosing()
            .member_declaration()
            .and_then(|id| self.program.declarations.get(id))
            .is_some_and(Declaration::is_method)
    }

    fn invocation(
        &self,
        primary: &Expression,
        arguments: &Arguments,
        location: SourceLocation,
    ) -> BoxingResult<ExprAnnotations> {
        let target = primary.unwrap_enclosing();
        let invoked = match target.member_declaration() {
            Some(id) => Some(self.lookup(id, location)?),
            None => None,
        };
        let direct = invoked.is_some_and(|d| d.is_method() || d.is_class());
        let raw_primary = primary.is_raw(&self.program.types);

        if !direct {
            return Ok(ExprAnnotations {
                type_erased: raw_primary,
                ..ExprAnnotations::default()
            });
        }
        let Some(invoked) = invoked else {
            return Ok(ExprAnnotations::default());
        };

        if invoked.is_class() && self.program.core.is_numeric_class(invoked.id) && is_literal_argument(arguments) {
            return Ok(ExprAnnotations {
                unboxed: true,
                ..ExprAnnotations::default()
            });
        }

        let mut flags = primary.annotations;
        flags.raw = false;
        let type_args = match &target.kind {
            ExprKind::BaseMember { type_args, .. } | ExprKind::QualifiedMember { type_args, .. } => {
                type_args.as_slice()
            }
            _ => &[],
        };
        if self.generic_result(invoked, type_args, raw_primary) {
            flags.type_erased = true;
            flags.untrusted_type = true;
        }
        Ok(flags)
    }

    /// The invoked method returns a bare type parameter that the call site
    /// instantiates with an erasing argument, or the call site is raw
    fn generic_result(&self, invoked: &Declaration, type_args: &[TypeId], raw_primary: bool) -> bool {
        let returns_type_parameter = invoked
            .type_id
            .and_then(|ty| self.program.types.get(ty))
            .is_some_and(|t| t.is_type_parameter());
        returns_type_parameter
            && (raw_primary
                || type_args.iter().any(|&arg| {
                    self.policy.has_erasure(self.program, arg) || self.policy.will_erase_to_object(self.program, arg)
                }))
    }

    fn binary(
        &self,
        expr: &Expression,
        operator: BinaryOperator,
        left: &Expression,
        right: &Expression,
    ) -> BoxingResult<ExprAnnotations> {
        use BinaryOperator::*;
        let both = left.annotations.unboxed && right.annotations.unboxed;
        let unboxed = match operator {
            Power => false,
            Sum | Difference | Product | Quotient | Remainder => both,
            SumAssign | DifferenceAssign | ProductAssign | QuotientAssign | RemainderAssign => both,
            And | Or | AndAssign | OrAssign | Equal | NotEqual | Identical | Smaller | Larger | SmallAs
            | LargeAs | In => true,
            Else => {
                // `a then b else c` is `(a then b) else c`
                let alternative = match &left.kind {
                    ExprKind::Binary {
                        operator: Then,
                        right: then_value,
                        ..
                    } => then_value.annotations.unboxed,
                    _ => left.annotations.unboxed,
                };
                alternative && right.annotations.unboxed && !self.erases_to_top(expr)?
            }
            Then | Compare | Range | Segment | Entry | Union | Intersection | Complement | UnionAssign
            | IntersectionAssign | ComplementAssign => false,
        };
        Ok(ExprAnnotations {
            unboxed,
            ..ExprAnnotations::default()
        })
    }

    /// Unboxed only if every branch is and the common type keeps a primitive
    /// representation; the other flags are set if any branch sets them
    fn branches<'e>(
        &self,
        expr: &Expression,
        branches: impl IntoIterator<Item = &'e Expression>,
    ) -> BoxingResult<ExprAnnotations> {
        let mut flags = ExprAnnotations {
            unboxed: true,
            ..ExprAnnotations::default()
        };
        for branch in branches {
            let branch = branch.annotations;
            flags.unboxed &= branch.unboxed;
            flags.raw |= branch.raw;
            flags.type_erased |= branch.type_erased;
            flags.untrusted_type |= branch.untrusted_type;
        }
        if flags.unboxed && self.erases_to_top(expr)? {
            flags.unboxed = false;
        }
        Ok(flags)
    }

    /// A node without a type is treated as erasing
    fn erases_to_top(&self, expr: &Expression) -> BoxingResult<bool> {
        Ok(match self.node_type(expr)? {
            Some(ty) => self.policy.will_erase_to_object(self.program, ty),
            None => true,
        })
    }

    /// `x[i]` and `x[a:b]` behave like `x.get(i)` and `x.span(a, b)`
    fn index(
        &mut self,
        expr: &Expression,
        primary: &Expression,
        operator: &IndexOperator,
    ) -> BoxingResult<ExprAnnotations> {
        let name = match operator {
            IndexOperator::Element(_) => "get",
            IndexOperator::Span { .. } => "span",
        };
        let accessor = primary
            .type_id
            .and_then(|ty| self.program.types.get(ty))
            .and_then(|t| t.declaration())
            .and_then(|owner| self.find_member(owner, name));
        let Some(accessor) = accessor else {
            self.stats.unresolved_accessors += 1;
            debug!("no '{}' accessor for index expression {}; leaving it boxed", name, expr.id);
            return Ok(ExprAnnotations::default());
        };

        let decl = self.lookup(accessor, expr.location)?;
        let mut flags = self.declaration_flags(decl);
        if self.erased_through_primary(primary, decl) {
            flags.type_erased = true;
        }
        let raw_primary = primary.is_raw(&self.program.types);
        let type_args = primary
            .type_id
            .and_then(|ty| self.program.types.get(ty))
            .map(|t| t.type_args().to_vec())
            .unwrap_or_default();
        if self.generic_result(decl, &type_args, raw_primary) {
            flags.type_erased = true;
            flags.untrusted_type = true;
        }
        flags.raw = false;
        Ok(flags)
    }

    /// Member named `name` of `owner` or of its supertypes, nearest first
    fn find_member(&self, owner: DeclId, name: &str) -> Option<DeclId> {
        let name = self.program.interner.get_id(name)?;
        let mut queue = VecDeque::from([owner]);
        let mut seen = new_id_set();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            let declaration = self.program.declarations.get(current)?;
            let found = declaration.members().iter().copied().find(|&m| {
                self.program
                    .declarations
                    .get(m)
                    .is_some_and(|d| d.name == Some(name) && d.is_method())
            });
            if found.is_some() {
                return found;
            }
            queue.extend(
                declaration
                    .extended_type()
                    .into_iter()
                    .chain(declaration.satisfied_types().iter().copied())
                    .filter_map(|ty| self.program.types.get(ty)?.declaration()),
            );
        }
        None
    }

    /// `x = ...` where `x` is known to fit the narrow integer representation
    fn narrow_small_target(&mut self, target: &Expression) -> BoxingResult<()> {
        let Some(id) = target.member_declaration() else {
            return Ok(());
        };
        if !self.lookup(id, target.location)?.is_small() {
            return Ok(());
        }
        if let Some(ty) = self.node_type(target)? {
            self.program.types.set_underlying(ty, Some(UnderlyingType::Int));
        }
        Ok(())
    }
}

fn pattern_variables(pattern: &Pattern, out: &mut Vec<DeclId>) {
    match pattern {
        Pattern::Variable(variable) => out.push(*variable),
        Pattern::Tuple(elements) => {
            for element in elements {
                pattern_variables(element, out);
            }
        }
        Pattern::KeyValue { key, value } => {
            pattern_variables(key, out);
            pattern_variables(value, out);
        }
    }
}

/// A single literal argument, possibly negated: `Integer(-1)`
fn is_literal_argument(arguments: &Arguments) -> bool {
    match arguments.positional() {
        [argument] => match &argument.unwrap_enclosing().kind {
            ExprKind::Literal(Literal::Natural(_) | Literal::Float(_)) => true,
            ExprKind::Unary {
                operator: UnaryOperator::Negative | UnaryOperator::Positive,
                operand,
            } => matches!(operand.kind, ExprKind::Literal(Literal::Natural(_) | Literal::Float(_))),
            _ => false,
        },
        _ => false,
    }
}
