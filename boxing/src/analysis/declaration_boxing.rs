//! Declaration boxing analysis
//!
//! Walks every declaration of a compilation unit and records, on the
//! declaration itself:
//! - `type_erased` / `untrusted_type`: the declared type loses information
//!   when lowered, or an override cannot be trusted to have its declared type
//! - `raw` on the declared type reference: a generic type used without arguments
//! - `unboxed`: whether values of the declaration use a primitive slot
//!
//! The boxing decision is made once per declaration, on its topmost refined
//! declaration, and copied to every refinement. Deciding a declaration may
//! force the decision of another one first, so results do not depend on the
//! order in which declarations are visited.

use super::policy::{has_non_erased_bounds, RepresentationPolicy};
use super::predicates::{self, is_container_functional_parameter, is_unboxed_void};
use super::refinement::{RefinementResolver, ShortcutRewrites, DEFAULT_MAX_DEPTH};
use crate::error::{BoxingError, BoxingResult};
use crate::model::id_types::collections::new_id_set;
use crate::model::*;
use log::{debug, trace, warn};

/// Counters collected while analyzing declarations
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DeclarationStats {
    pub declarations_visited: usize,
    /// Decisions copied from a refined declaration
    pub inherited: usize,
    /// Iteration variables and callback literals boxed regardless of their type
    pub forced_boxed: usize,
    pub type_erased: usize,
    pub untrusted: usize,
    pub raw_types: usize,
    /// Declarations whose computation re-entered itself
    pub reentrant: usize,
}

pub struct DeclarationBoxingAnalyzer<'a> {
    program: &'a mut Program,
    policy: &'a dyn RepresentationPolicy,
    max_refinement_depth: usize,
    /// Declarations whose boxing state is being computed
    in_progress: IdSet<DeclId>,
    stats: DeclarationStats,
}

impl<'a> DeclarationBoxingAnalyzer<'a> {
    pub fn new(program: &'a mut Program, policy: &'a dyn RepresentationPolicy) -> Self {
        Self {
            program,
            policy,
            max_refinement_depth: DEFAULT_MAX_DEPTH,
            in_progress: new_id_set(),
            stats: DeclarationStats::default(),
        }
    }

    pub fn with_max_refinement_depth(mut self, depth: usize) -> Self {
        self.max_refinement_depth = depth;
        self
    }

    pub fn stats(&self) -> DeclarationStats {
        self.stats
    }

    /// Analyze every declaration of `unit`
    pub fn analyze_unit(&mut self, unit: &CompilationUnit) -> BoxingResult<DeclarationStats> {
        let _span = tracing::debug_span!("declaration_boxing", unit = %unit.name).entered();
        let mut rewrites = ShortcutRewrites::new();
        for statement in &unit.statements {
            self.walk_statement(statement, &mut rewrites)?;
        }
        debug!(
            "declaration boxing of '{}': {} declarations, {} inherited, {} forced boxed",
            unit.name,
            self.stats.declarations_visited,
            self.stats.inherited,
            self.stats.forced_boxed
        );
        Ok(self.stats)
    }

    /// Decide the boxing of `decl` outside of a tree walk
    pub fn ensure_boxing_state(&mut self, decl: DeclId) -> BoxingResult<()> {
        let rewrites = ShortcutRewrites::new();
        if self.lookup(decl)?.is_method() {
            self.box_method(decl, &rewrites)
        } else {
            self.box_attribute(decl, &rewrites)
        }
    }

    fn topmost(&self, decl: DeclId, rewrites: &ShortcutRewrites) -> DeclId {
        RefinementResolver::new(self.program, self.policy)
            .with_max_depth(self.max_refinement_depth)
            .topmost_refined(decl, rewrites)
    }

    fn lookup(&self, id: DeclId) -> BoxingResult<&Declaration> {
        self.program.decl(id)
    }

    fn lookup_at(&self, id: DeclId, location: SourceLocation) -> BoxingResult<&Declaration> {
        self.program
            .declarations
            .get(id)
            .ok_or(BoxingError::UnknownDeclaration { id, location })
    }

    // ===== Tree walk =====

    fn walk_statement(&mut self, statement: &Statement, rewrites: &mut ShortcutRewrites) -> BoxingResult<()> {
        match statement {
            Statement::Declaration(node) => self.walk_declaration(node, rewrites),
            Statement::Specification { target, value, lazy } => {
                self.walk_specification(target, value, *lazy, rewrites)
            }
            Statement::Expression(expr) => self.walk_expression(expr, rewrites),
            Statement::Return(expr) | Statement::Throw(expr) => match expr {
                Some(expr) => self.walk_expression(expr, rewrites),
                None => Ok(()),
            },
            Statement::If {
                conditions,
                then_block,
                else_block,
            } => {
                self.walk_conditions(conditions, rewrites)?;
                self.walk_block(then_block, rewrites)?;
                match else_block {
                    Some(block) => self.walk_block(block, rewrites),
                    None => Ok(()),
                }
            }
            Statement::While { conditions, body } => {
                self.walk_conditions(conditions, rewrites)?;
                self.walk_block(body, rewrites)
            }
            Statement::For {
                iterator,
                body,
                else_block,
            } => {
                self.walk_iterator(iterator, rewrites)?;
                self.walk_block(body, rewrites)?;
                match else_block {
                    Some(block) => self.walk_block(block, rewrites),
                    None => Ok(()),
                }
            }
            Statement::Switch {
                discriminant,
                cases,
                else_block,
            } => {
                self.walk_expression(discriminant, rewrites)?;
                for case in cases {
                    for item in &case.matches {
                        self.walk_expression(item, rewrites)?;
                    }
                    self.walk_block(&case.body, rewrites)?;
                }
                match else_block {
                    Some(block) => self.walk_block(block, rewrites),
                    None => Ok(()),
                }
            }
            Statement::Block(block) => self.walk_block(block, rewrites),
            Statement::Break | Statement::Continue => Ok(()),
        }
    }

    fn walk_block(&mut self, block: &Block, rewrites: &mut ShortcutRewrites) -> BoxingResult<()> {
        for statement in &block.statements {
            self.walk_statement(statement, rewrites)?;
        }
        Ok(())
    }

    fn walk_declaration(&mut self, node: &DeclarationNode, rewrites: &mut ShortcutRewrites) -> BoxingResult<()> {
        let decl = self.lookup_at(node.declaration, node.location)?;
        let kind = match &decl.kind {
            DeclKind::Value => NodeKind::Value,
            DeclKind::Method(_) => NodeKind::Method,
            DeclKind::Setter { parameter } => NodeKind::Setter(*parameter),
            DeclKind::Class(_) | DeclKind::Interface(_) | DeclKind::TypeAlias { .. } => {
                NodeKind::Type
            }
            DeclKind::TypeParameter(_) => NodeKind::TypeParameter,
        };

        if kind == NodeKind::Value {
            self.strip_inferred_underlying(node);
        }

        for list in &node.parameter_lists {
            for parameter in list {
                self.walk_parameter(parameter, rewrites)?;
            }
        }
        match &node.body {
            DeclarationBody::None => {}
            DeclarationBody::Specifier { value, .. } => self.walk_expression(value, rewrites)?,
            DeclarationBody::Block(block) => self.walk_block(block, rewrites)?,
        }
        for &type_parameter in &node.type_parameters {
            self.visit_type_parameter(type_parameter, node.location)?;
        }

        self.stats.declarations_visited += 1;
        match kind {
            NodeKind::Value => self.visit_attribute_or_parameter(node.declaration, rewrites),
            NodeKind::Method => self.visit_method(node.declaration, rewrites),
            NodeKind::Setter(parameter) => {
                self.lookup_at(parameter, node.location)?;
                self.box_attribute(parameter, rewrites)
            }
            NodeKind::Type => Ok(()),
            NodeKind::TypeParameter => self.visit_type_parameter(node.declaration, node.location),
        }
    }

    /// `value x = e;`: the declared type is the initializer's, so the
    /// narrow representation of `e` must not leak into `x`
    fn strip_inferred_underlying(&mut self, node: &DeclarationNode) {
        if !node.inferred_type {
            return;
        }
        let DeclarationBody::Specifier { value, .. } = &node.body else {
            return;
        };
        let Some(declared) = self.program.declarations.get(node.declaration).and_then(|d| d.type_id) else {
            return;
        };
        let Some(initializer) = value.type_id else {
            return;
        };
        if self.program.types.is_exactly(declared, initializer) {
            self.program.types.set_underlying(declared, None);
        }
    }

    fn walk_parameter(&mut self, parameter: &ParameterNode, rewrites: &mut ShortcutRewrites) -> BoxingResult<()> {
        let location = self
            .program
            .declarations
            .get(parameter.declaration)
            .map(|d| d.location)
            .unwrap_or_else(SourceLocation::unknown);
        self.lookup_at(parameter.declaration, location)?;

        if let Some(default_value) = &parameter.default_value {
            self.walk_expression(default_value, rewrites)?;
        }
        self.stats.declarations_visited += 1;

        match &parameter.functional {
            Some(lists) if self.policy.creates_method(self.program, parameter.declaration) => {
                // Boxed as a method first, then its own parameters
                self.visit_method(parameter.declaration, rewrites)?;
                for list in lists {
                    for nested in list {
                        self.walk_parameter(nested, rewrites)?;
                    }
                }
                Ok(())
            }
            functional => {
                for list in functional.iter().flatten() {
                    for nested in list {
                        self.walk_parameter(nested, rewrites)?;
                    }
                }
                let decl = self.lookup(parameter.declaration)?;
                predicates::parameterized_declaration(self.program, decl)?;
                self.visit_attribute_or_parameter(parameter.declaration, rewrites)
            }
        }
    }

    fn walk_specification(
        &mut self,
        target: &Expression,
        value: &Expression,
        lazy: bool,
        rewrites: &mut ShortcutRewrites,
    ) -> BoxingResult<()> {
        let specified = target.member_declaration();
        let specified_method = match specified {
            Some(id) => self.lookup_at(id, target.location)?.is_method(),
            None => false,
        };

        // `m = (x) => ...;` makes the literal stand for `m` inside this statement
        let mut pushed = false;
        if let (Some(method), true, false) = (specified, specified_method, lazy) {
            if let ExprKind::FunctionLiteral(literal) = &value.unwrap_enclosing().kind {
                if let Some(literal_decl) = literal.declaration {
                    rewrites.push(literal_decl, method);
                    pushed = true;
                }
            }
        }
        let walked = self
            .walk_expression(target, rewrites)
            .and_then(|_| self.walk_expression(value, rewrites));
        if pushed {
            rewrites.pop();
        }
        walked?;

        let Some(specified) = specified else {
            return Ok(());
        };
        let specified_decl = self.lookup(specified)?;
        if specified_decl.is_method() {
            self.visit_method(specified, rewrites)
        } else if specified_decl.is_value() {
            self.visit_attribute_or_parameter(specified, rewrites)
        } else {
            Ok(())
        }
    }

    fn walk_conditions(&mut self, conditions: &[Condition], rewrites: &mut ShortcutRewrites) -> BoxingResult<()> {
        for condition in conditions {
            match condition {
                Condition::Boolean(expr) => self.walk_expression(expr, rewrites)?,
                Condition::Is { expression, .. }
                | Condition::Exists { expression, .. }
                | Condition::Nonempty { expression, .. } => {
                    self.walk_expression(expression, rewrites)?
                }
            }
            if let Some(variable) = condition.variable() {
                self.visit_variable(variable, rewrites)?;
            }
        }
        Ok(())
    }

    /// Iteration variables are always boxed; the flag is forced before the
    /// variable is visited so it is written only once
    fn walk_iterator(&mut self, iterator: &ForIterator, rewrites: &mut ShortcutRewrites) -> BoxingResult<()> {
        self.walk_expression(iterator.iterated(), rewrites)?;
        let mut variables = Vec::new();
        match iterator {
            ForIterator::Value { variable, .. } => variables.push(*variable),
            ForIterator::KeyValue { key, value, .. } => variables.extend([*key, *value]),
            ForIterator::Pattern { pattern, .. } => collect_pattern_variables(pattern, &mut variables),
        }
        let location = iterator.iterated().location;
        for variable in variables {
            self.lookup_at(variable, location)?;
            self.force_boxed(variable);
            self.visit_variable(variable, rewrites)?;
        }
        Ok(())
    }

    fn walk_comprehension(&mut self, clause: &ComprehensionClause, rewrites: &mut ShortcutRewrites) -> BoxingResult<()> {
        match clause {
            ComprehensionClause::For { iterator, next } => {
                self.walk_iterator(iterator, rewrites)?;
                self.walk_comprehension(next, rewrites)
            }
            ComprehensionClause::If { conditions, next } => {
                for variable in conditions.iter().filter_map(Condition::variable) {
                    self.lookup(variable)?;
                    self.force_boxed(variable);
                }
                self.walk_conditions(conditions, rewrites)?;
                self.walk_comprehension(next, rewrites)
            }
            ComprehensionClause::Expression(expr) => self.walk_expression(expr, rewrites),
        }
    }

    fn walk_function_body(&mut self, body: &FunctionBody, rewrites: &mut ShortcutRewrites) -> BoxingResult<()> {
        match body {
            FunctionBody::Expression(expr) => self.walk_expression(expr, rewrites),
            FunctionBody::Block(block) => self.walk_block(block, rewrites),
        }
    }

    fn walk_expression(&mut self, expr: &Expression, rewrites: &mut ShortcutRewrites) -> BoxingResult<()> {
        match &expr.kind {
            ExprKind::Literal(_)
            | ExprKind::BaseMember { .. }
            | ExprKind::BaseType { .. }
            | ExprKind::TypeLiteral(_)
            | ExprKind::This
            | ExprKind::Super
            | ExprKind::Outer => Ok(()),
            ExprKind::StringTemplate { parts } | ExprKind::Tuple(parts) | ExprKind::Sequence(parts) => {
                for part in parts {
                    self.walk_expression(part, rewrites)?;
                }
                Ok(())
            }
            ExprKind::QualifiedMember { primary, .. } => self.walk_expression(primary, rewrites),
            ExprKind::Enclosing(inner)
            | ExprKind::Exists(inner)
            | ExprKind::Nonempty(inner)
            | ExprKind::SpreadArgument(inner) => self.walk_expression(inner, rewrites),
            ExprKind::Is { operand, .. } | ExprKind::Unary { operand, .. } => {
                self.walk_expression(operand, rewrites)
            }
            ExprKind::Invocation { primary, arguments } => {
                self.walk_expression(primary, rewrites)?;
                self.walk_arguments(arguments, rewrites)
            }
            ExprKind::Binary { left, right, .. } => {
                self.walk_expression(left, rewrites)?;
                self.walk_expression(right, rewrites)
            }
            ExprKind::Assign { target, value } => {
                self.walk_expression(target, rewrites)?;
                self.walk_expression(value, rewrites)
            }
            ExprKind::Within { lower, operand, upper } => {
                self.walk_expression(lower, rewrites)?;
                self.walk_expression(operand, rewrites)?;
                self.walk_expression(upper, rewrites)
            }
            ExprKind::If {
                conditions,
                then_expr,
                else_expr,
            } => {
                self.walk_conditions(conditions, rewrites)?;
                self.walk_expression(then_expr, rewrites)?;
                self.walk_expression(else_expr, rewrites)
            }
            ExprKind::Switch {
                discriminant,
                cases,
                else_expr,
            } => {
                self.walk_expression(discriminant, rewrites)?;
                for case in cases {
                    for item in &case.matches {
                        self.walk_expression(item, rewrites)?;
                    }
                    self.walk_expression(&case.result, rewrites)?;
                }
                match else_expr {
                    Some(expr) => self.walk_expression(expr, rewrites),
                    None => Ok(()),
                }
            }
            ExprKind::Let { variables, result } => {
                for variable in variables {
                    self.walk_expression(&variable.value, rewrites)?;
                    self.lookup_at(variable.declaration, variable.value.location)?;
                    self.visit_variable(variable.declaration, rewrites)?;
                }
                self.walk_expression(result, rewrites)
            }
            ExprKind::FunctionLiteral(literal) => {
                for list in &literal.parameter_lists {
                    for parameter in list {
                        self.walk_parameter(parameter, rewrites)?;
                    }
                }
                self.walk_function_body(&literal.body, rewrites)?;
                if let Some(decl) = literal.declaration {
                    self.lookup_at(decl, expr.location)?;
                    self.stats.declarations_visited += 1;
                    self.force_boxed(decl);
                }
                Ok(())
            }
            ExprKind::Index { primary, operator } => {
                self.walk_expression(primary, rewrites)?;
                match operator {
                    IndexOperator::Element(index) => self.walk_expression(index, rewrites),
                    IndexOperator::Span { from, to } => {
                        for bound in [from, to].into_iter().flatten() {
                            self.walk_expression(bound, rewrites)?;
                        }
                        Ok(())
                    }
                }
            }
            ExprKind::Comprehension(clause) => self.walk_comprehension(clause, rewrites),
        }
    }

    fn walk_arguments(&mut self, arguments: &Arguments, rewrites: &mut ShortcutRewrites) -> BoxingResult<()> {
        match arguments {
            Arguments::Positional(args) => {
                for arg in args {
                    self.walk_expression(arg, rewrites)?;
                }
                Ok(())
            }
            Arguments::Named(args) => {
                for arg in args {
                    self.walk_named_argument(arg, rewrites)?;
                }
                Ok(())
            }
        }
    }

    fn walk_named_argument(&mut self, argument: &NamedArgument, rewrites: &mut ShortcutRewrites) -> BoxingResult<()> {
        match argument {
            NamedArgument::Specified { value, .. } => self.walk_expression(value, rewrites),
            NamedArgument::Sequenced(values) => {
                for value in values {
                    self.walk_expression(value, rewrites)?;
                }
                Ok(())
            }
            NamedArgument::Attribute { declaration, body } => {
                self.walk_function_body(body, rewrites)?;
                self.lookup(*declaration)?;
                self.stats.declarations_visited += 1;
                self.box_attribute(*declaration, rewrites)
            }
            NamedArgument::Method {
                declaration,
                parameter_lists,
                body,
            } => {
                for list in parameter_lists {
                    for parameter in list {
                        self.walk_parameter(parameter, rewrites)?;
                    }
                }
                self.walk_function_body(body, rewrites)?;
                self.lookup(*declaration)?;
                self.stats.declarations_visited += 1;
                self.force_boxed(*declaration);
                Ok(())
            }
        }
    }

    // ===== Per-declaration rules =====

    fn visit_method(&mut self, method: DeclId, rewrites: &ShortcutRewrites) -> BoxingResult<()> {
        self.set_erasure_state(method)?;
        self.raw_typed_declaration(method)?;
        self.box_method(method, rewrites)
    }

    fn visit_attribute_or_parameter(&mut self, decl: DeclId, rewrites: &ShortcutRewrites) -> BoxingResult<()> {
        self.set_erasure_state(decl)?;
        self.raw_typed_declaration(decl)?;
        self.box_attribute(decl, rewrites)
    }

    /// Variables of conditions, `let` and iterators are their own topmost
    fn visit_variable(&mut self, decl: DeclId, rewrites: &ShortcutRewrites) -> BoxingResult<()> {
        self.stats.declarations_visited += 1;
        self.set_erasure_state(decl)?;
        self.raw_typed_declaration(decl)?;
        self.set_boxing_state(decl, decl, rewrites)
    }

    fn box_method(&mut self, method: DeclId, rewrites: &ShortcutRewrites) -> BoxingResult<()> {
        let refined = self.topmost(method, rewrites);
        if !self.lookup(refined)?.is_method() {
            warn!(
                "'{}' refines '{}', which is not a method; leaving it boxed",
                self.program.name_of(method),
                self.program.name_of(refined)
            );
            return Ok(());
        }
        if self.lookup(method)?.name.is_some() {
            self.set_boxing_state(method, refined, rewrites)
        } else {
            self.program.declarations.set_unboxed(method, false);
            Ok(())
        }
    }

    fn box_attribute(&mut self, decl: DeclId, rewrites: &ShortcutRewrites) -> BoxingResult<()> {
        let refined = self.topmost(decl, rewrites);
        self.set_boxing_state(decl, refined, rewrites)
    }

    fn raw_typed_declaration(&mut self, decl: DeclId) -> BoxingResult<()> {
        let Some(ty) = self.lookup(decl)?.type_id else {
            return Ok(());
        };
        if self.policy.is_raw(self.program, ty) {
            self.program.types.set_raw(ty, true);
            self.stats.raw_types += 1;
        }
        Ok(())
    }

    fn set_erasure_state(&mut self, decl: DeclId) -> BoxingResult<()> {
        let declaration = self.lookup(decl)?;
        let Some(ty) = declaration.type_id else {
            return Ok(());
        };
        let class_member = declaration
            .container
            .declaration()
            .and_then(|owner| self.program.declarations.get(owner))
            .is_some_and(Declaration::is_class_or_interface);
        let actual = declaration.is_actual();

        let erased = self.policy.has_erasure(self.program, ty)
            || self.policy.has_substituted_bounds(self.program, ty);
        let untrusted =
            actual && class_member && self.policy.is_widening_typed_declaration(self.program, decl);

        if let Some(declaration) = self.program.declarations.get_mut(decl) {
            if erased || untrusted {
                declaration.annotations.type_erased = true;
                self.stats.type_erased += 1;
            }
            if untrusted {
                declaration.annotations.untrusted_type = Some(true);
                self.stats.untrusted += 1;
                trace!("override '{}' has an untrusted type", decl);
            }
        }
        Ok(())
    }

    fn force_boxed(&mut self, decl: DeclId) {
        self.program.declarations.force_boxed(decl);
        self.stats.forced_boxed += 1;
    }

    /// Decide `decl`'s boxing using `refined` as its topmost refined declaration
    fn set_boxing_state(
        &mut self,
        decl: DeclId,
        refined: DeclId,
        rewrites: &ShortcutRewrites,
    ) -> BoxingResult<()> {
        let declaration = self.lookup(decl)?;
        let Some(ty) = declaration.type_id else {
            trace!("'{}' has no type; leaving it boxed", self.program.name_of(decl));
            return Ok(());
        };

        // A class parameter may really stand for an inherited attribute
        let mut refined = refined;
        if refined == decl && declaration.is_parameter() {
            let owned_by_class = matches!(declaration.container, Container::Declaration(owner)
                if self.program.declarations.get(owner).is_some_and(Declaration::is_class));
            if owned_by_class {
                if let Some(r) = declaration.refined {
                    refined = r;
                }
            }
        }

        if refined != decl && self.program.types.underlying(ty).is_none() {
            let inherited = self
                .lookup(refined)?
                .type_id
                .and_then(|t| self.program.types.underlying(t));
            if inherited.is_some() {
                self.program.types.set_underlying(ty, inherited);
            }
        }

        if self.lookup(decl)?.annotations.unboxed.is_some() {
            return Ok(());
        }
        if !self.in_progress.insert(decl) {
            self.stats.reentrant += 1;
            debug!(
                "boxing of '{}' depends on itself; leaving it boxed",
                self.program.name_of(decl)
            );
            return Ok(());
        }
        let decision = self.decide(decl, refined, ty, rewrites);
        self.in_progress.remove(&decl);

        if let Some(unboxed) = decision? {
            self.program.declarations.set_unboxed(decl, unboxed);
            trace!(
                "{} '{}' is {}",
                self.program.decl(decl)?.kind_name(),
                self.program.name_of(decl),
                if unboxed { "unboxed" } else { "boxed" }
            );
        }
        Ok(())
    }

    /// `None` leaves the flag unset (read as boxed)
    fn decide(
        &mut self,
        decl: DeclId,
        refined: DeclId,
        ty: TypeId,
        rewrites: &ShortcutRewrites,
    ) -> BoxingResult<Option<bool>> {
        let declaration = self.lookup(decl)?;

        // Results of functional parameters without a generated method go through Callable
        if declaration.is_functional_parameter() && !self.policy.creates_method(self.program, decl) {
            return Ok(Some(false));
        }

        if refined != decl {
            self.inherit_from(refined, rewrites)?;
            self.stats.inherited += 1;
            debug!(
                "'{}' inherits its boxing from '{}'",
                self.program.name_of(decl),
                self.program.name_of(refined)
            );
            return Ok(self.lookup(refined)?.annotations.unboxed);
        }

        let is_method = declaration.is_method();
        let is_value_parameter = declaration.is_value_parameter();
        let mpl = declaration.is_mpl();
        let erased_type_parameter = self.resolves_to_erased_type_parameter(ty);
        let functional_container = is_container_functional_parameter(self.program, declaration)?;
        let program: &Program = self.program;

        if is_method
            && predicates::is_void(program, self.policy, Some(ty))
            && self.policy.uses_boxed_void(program, decl)
            && !erased_type_parameter
            && !functional_container
            && !mpl
        {
            return Ok(Some(false));
        }

        if (self.policy.is_basic_type(program, ty) || is_unboxed_void(program, self.policy, declaration))
            && !erased_type_parameter
            && !functional_container
            && !mpl
        {
            return Ok(Some(true));
        }

        if is_value_parameter && functional_container {
            let functional = predicates::parameterized_declaration(program, declaration)?;
            if self.policy.creates_method(program, functional) {
                return self.decide_functional_parameter_parameter(decl, functional, ty, rewrites);
            }
        }

        Ok(Some(false))
    }

    /// Parameter of a functional parameter that is compiled to a method
    fn decide_functional_parameter_parameter(
        &mut self,
        decl: DeclId,
        functional: DeclId,
        ty: TypeId,
        rewrites: &ShortcutRewrites,
    ) -> BoxingResult<Option<bool>> {
        let refined_functional = self.topmost(functional, rewrites);
        if refined_functional == functional {
            // Callable's generic contract needs a nullable slot for these
            let uniform = self.policy.is_anything(self.program, ty) || self.policy.is_optional(self.program, ty);
            return Ok(Some(!uniform));
        }
        let counterpart = positional_counterpart(self.program, functional, refined_functional, decl)
            .unwrap_or(refined_functional);
        self.inherit_from(counterpart, rewrites)?;
        self.stats.inherited += 1;
        Ok(self.lookup(counterpart)?.annotations.unboxed)
    }

    /// Make sure `refined` has been decided
    fn inherit_from(&mut self, refined: DeclId, rewrites: &ShortcutRewrites) -> BoxingResult<()> {
        if self.lookup(refined)?.annotations.unboxed.is_none() {
            self.set_boxing_state(refined, refined, rewrites)?;
        }
        Ok(())
    }

    /// `ty` is a type parameter whose bounds all erase to the top type
    fn resolves_to_erased_type_parameter(&self, ty: TypeId) -> bool {
        match self.program.types.kind(ty) {
            Some(TypeKind::TypeParameter { declaration }) => {
                !has_non_erased_bounds(self.program, self.policy, *declaration)
            }
            _ => false,
        }
    }

    fn visit_type_parameter(&mut self, type_parameter: DeclId, location: SourceLocation) -> BoxingResult<()> {
        let decl = self.lookup_at(type_parameter, location)?;
        if decl.is_type_parameter() {
            has_non_erased_bounds(self.program, self.policy, type_parameter);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Value,
    Method,
    Setter(DeclId),
    Type,
    TypeParameter,
}

fn collect_pattern_variables(pattern: &Pattern, out: &mut Vec<DeclId>) {
    match pattern {
        Pattern::Variable(variable) => out.push(*variable),
        Pattern::Tuple(elements) => {
            for element in elements {
                collect_pattern_variables(element, out);
            }
        }
        Pattern::KeyValue { key, value } => {
            collect_pattern_variables(key, out);
            collect_pattern_variables(value, out);
        }
    }
}

/// Parameter of `refined` at the same position `parameter` has in `function`
fn positional_counterpart(program: &Program, function: DeclId, refined: DeclId, parameter: DeclId) -> Option<DeclId> {
    let lists = program.declarations.get(function)?.parameter_lists();
    let refined_lists = program.declarations.get(refined)?.parameter_lists();
    lists.iter().zip(refined_lists).find_map(|(list, refined_list)| {
        let index = list.iter().position(|&p| p == parameter)?;
        refined_list.get(index).copied()
    })
}
