//! Helpers shared by the integration tests
#![allow(dead_code)]

use boxing::model::*;
use boxing::{BoxingConfig, BoxingOutcome, BoxingPass};

pub fn unit(name: &str, statements: Vec<Statement>) -> CompilationUnit {
    let mut unit = CompilationUnit::new(name);
    unit.statements = statements;
    unit
}

pub fn run(program: &mut Program, unit: &mut CompilationUnit) -> BoxingOutcome {
    boxing::logging::init_test();
    BoxingPass::new(BoxingConfig::default())
        .run(program, unit)
        .expect("boxing pass failed")
}

pub fn unboxed(program: &Program, id: DeclId) -> Option<bool> {
    program.declarations.get(id).map(|d| d.annotations.unboxed).unwrap_or(None)
}

/// Every expression node of the unit, parents before children
pub fn expressions(unit: &CompilationUnit) -> Vec<&Expression> {
    let mut out = Vec::new();
    for statement in &unit.statements {
        statement_expressions(statement, &mut out);
    }
    out
}

fn block_expressions<'a>(block: &'a Block, out: &mut Vec<&'a Expression>) {
    for statement in &block.statements {
        statement_expressions(statement, out);
    }
}

fn statement_expressions<'a>(statement: &'a Statement, out: &mut Vec<&'a Expression>) {
    match statement {
        Statement::Declaration(node) => {
            parameter_expressions(&node.parameter_lists, out);
            match &node.body {
                DeclarationBody::None => {}
                DeclarationBody::Specifier { value, .. } => expression_tree(value, out),
                DeclarationBody::Block(block) => block_expressions(block, out),
            }
        }
        Statement::Specification { target, value, .. } => {
            expression_tree(target, out);
            expression_tree(value, out);
        }
        Statement::Expression(expr) => expression_tree(expr, out),
        Statement::Return(expr) | Statement::Throw(expr) => {
            if let Some(expr) = expr {
                expression_tree(expr, out);
            }
        }
        Statement::If {
            conditions,
            then_block,
            else_block,
        } => {
            condition_expressions(conditions, out);
            block_expressions(then_block, out);
            if let Some(block) = else_block {
                block_expressions(block, out);
            }
        }
        Statement::While { conditions, body } => {
            condition_expressions(conditions, out);
            block_expressions(body, out);
        }
        Statement::For {
            iterator,
            body,
            else_block,
        } => {
            expression_tree(iterator.iterated(), out);
            block_expressions(body, out);
            if let Some(block) = else_block {
                block_expressions(block, out);
            }
        }
        Statement::Switch {
            discriminant,
            cases,
            else_block,
        } => {
            expression_tree(discriminant, out);
            for case in cases {
                for item in &case.matches {
                    expression_tree(item, out);
                }
                block_expressions(&case.body, out);
            }
            if let Some(block) = else_block {
                block_expressions(block, out);
            }
        }
        Statement::Block(block) => block_expressions(block, out),
        Statement::Break | Statement::Continue => {}
    }
}

fn parameter_expressions<'a>(lists: &'a [Vec<ParameterNode>], out: &mut Vec<&'a Expression>) {
    for parameter in lists.iter().flatten() {
        if let Some(value) = &parameter.default_value {
            expression_tree(value, out);
        }
        if let Some(functional) = &parameter.functional {
            parameter_expressions(functional, out);
        }
    }
}

fn condition_expressions<'a>(conditions: &'a [Condition], out: &mut Vec<&'a Expression>) {
    for condition in conditions {
        match condition {
            Condition::Boolean(expr) => expression_tree(expr, out),
            Condition::Is { expression, .. }
            | Condition::Exists { expression, .. }
            | Condition::Nonempty { expression, .. } => expression_tree(expression, out),
        }
    }
}

fn clause_expressions<'a>(clause: &'a ComprehensionClause, out: &mut Vec<&'a Expression>) {
    match clause {
        ComprehensionClause::For { iterator, next } => {
            expression_tree(iterator.iterated(), out);
            clause_expressions(next, out);
        }
        ComprehensionClause::If { conditions, next } => {
            condition_expressions(conditions, out);
            clause_expressions(next, out);
        }
        ComprehensionClause::Expression(expr) => expression_tree(expr, out),
    }
}

fn body_expressions<'a>(body: &'a FunctionBody, out: &mut Vec<&'a Expression>) {
    match body {
        FunctionBody::Expression(expr) => expression_tree(expr, out),
        FunctionBody::Block(block) => block_expressions(block, out),
    }
}

fn expression_tree<'a>(expr: &'a Expression, out: &mut Vec<&'a Expression>) {
    out.push(expr);
    match &expr.kind {
        ExprKind::Literal(_)
        | ExprKind::BaseMember { .. }
        | ExprKind::BaseType { .. }
        | ExprKind::TypeLiteral(_)
        | ExprKind::This
        | ExprKind::Super
        | ExprKind::Outer => {}
        ExprKind::StringTemplate { parts } | ExprKind::Tuple(parts) | ExprKind::Sequence(parts) => {
            for part in parts {
                expression_tree(part, out);
            }
        }
        ExprKind::QualifiedMember { primary, .. } => expression_tree(primary, out),
        ExprKind::Enclosing(inner)
        | ExprKind::Exists(inner)
        | ExprKind::Nonempty(inner)
        | ExprKind::SpreadArgument(inner) => expression_tree(inner, out),
        ExprKind::Is { operand, .. } | ExprKind::Unary { operand, .. } => expression_tree(operand, out),
        ExprKind::Invocation { primary, arguments } => {
            expression_tree(primary, out);
            match arguments {
                Arguments::Positional(args) => {
                    for arg in args {
                        expression_tree(arg, out);
                    }
                }
                Arguments::Named(args) => {
                    for arg in args {
                        match arg {
                            NamedArgument::Specified { value, .. } => expression_tree(value, out),
                            NamedArgument::Sequenced(values) => {
                                for value in values {
                                    expression_tree(value, out);
                                }
                            }
                            NamedArgument::Attribute { body, .. } => body_expressions(body, out),
                            NamedArgument::Method {
                                parameter_lists, body, ..
                            } => {
                                parameter_expressions(parameter_lists, out);
                                body_expressions(body, out);
                            }
                        }
                    }
                }
            }
        }
        ExprKind::Binary { left, right, .. } | ExprKind::Assign { target: left, value: right } => {
            expression_tree(left, out);
            expression_tree(right, out);
        }
        ExprKind::Within { lower, operand, upper } => {
            expression_tree(lower, out);
            expression_tree(operand, out);
            expression_tree(upper, out);
        }
        ExprKind::If {
            conditions,
            then_expr,
            else_expr,
        } => {
            condition_expressions(conditions, out);
            expression_tree(then_expr, out);
            expression_tree(else_expr, out);
        }
        ExprKind::Switch {
            discriminant,
            cases,
            else_expr,
        } => {
            expression_tree(discriminant, out);
            for case in cases {
                for item in &case.matches {
                    expression_tree(item, out);
                }
                expression_tree(&case.result, out);
            }
            if let Some(expr) = else_expr {
                expression_tree(expr, out);
            }
        }
        ExprKind::Let { variables, result } => {
            for variable in variables {
                expression_tree(&variable.value, out);
            }
            expression_tree(result, out);
        }
        ExprKind::FunctionLiteral(literal) => {
            parameter_expressions(&literal.parameter_lists, out);
            body_expressions(&literal.body, out);
        }
        ExprKind::Index { primary, operator } => {
            expression_tree(primary, out);
            match operator {
                IndexOperator::Element(index) => expression_tree(index, out),
                IndexOperator::Span { from, to } => {
                    for bound in [from, to].into_iter().flatten() {
                        expression_tree(bound, out);
                    }
                }
            }
        }
        ExprKind::Comprehension(clause) => clause_expressions(clause, out),
    }
}
