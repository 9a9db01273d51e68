//! Properties that hold over every node of an annotated unit

mod common;

use boxing::analysis::refinement::ShortcutRewrites;
use boxing::model::*;
use boxing::{RefinementResolver, RepresentationPolicy, StandardPolicy};
use common::{expressions, run, unboxed, unit};

struct Fixture {
    program: Program,
    unit: CompilationUnit,
    iteration_variables: Vec<DeclId>,
}

fn boolean_node(b: &mut ProgramBuilder, kind: ExprKind) -> Expression {
    let ty = b.boolean_type();
    b.expr(kind, Some(ty))
}

/// A unit mixing refinement chains, loops and most expression kinds
fn fixture() -> Fixture {
    let mut b = ProgramBuilder::new();
    let int = b.integer_type();
    let object = b.object_type();
    let string = b.string_type();

    let thing = b.value("thing", Container::Unit, object);
    let count = b.value("count", Container::Unit, int);
    let int_seq = b.sequential_type(int);
    let numbers = b.value("numbers", Container::Unit, int_seq);

    let sized = b.interface("Sized", Container::Unit);
    let formal = b.value("size", Container::Declaration(sized), int);
    b.add_flags(formal, DeclFlags::SHARED | DeclFlags::FORMAL);
    let list = b.class("List", Container::Unit);
    let list_size = b.value("size", Container::Declaration(list), int);
    b.add_flags(list_size, DeclFlags::SHARED | DeclFlags::ACTUAL);
    b.refines(list_size, formal);
    let array = b.class("Array", Container::Unit);
    let array_size = b.value("size", Container::Declaration(array), int);
    b.add_flags(array_size, DeclFlags::SHARED | DeclFlags::ACTUAL);
    b.refines(array_size, list_size);

    let anything = b.anything_type();
    let main = b.method("main", Container::Unit, anything);
    let element = b.value("element", Container::Block(main), int);
    let key = b.value("key", Container::Block(main), string);
    let item = b.value("item", Container::Block(main), int);
    let first = b.value("first", Container::Block(main), int);
    let second = b.value("second", Container::Block(main), int);

    let mut body = Vec::new();
    let iterated = b.base(numbers);
    body.push(Statement::For {
        iterator: ForIterator::Value {
            variable: element,
            iterated,
        },
        body: Block::default(),
        else_block: None,
    });
    let iterated = b.base(numbers);
    body.push(Statement::For {
        iterator: ForIterator::KeyValue {
            key,
            value: item,
            iterated,
        },
        body: Block::default(),
        else_block: None,
    });
    let iterated = b.base(numbers);
    body.push(Statement::For {
        iterator: ForIterator::Pattern {
            pattern: Pattern::Tuple(vec![Pattern::Variable(first), Pattern::Variable(second)]),
            iterated,
        },
        body: Block::default(),
        else_block: None,
    });

    let mut exprs = Vec::new();

    // literals
    exprs.push(b.natural(7));
    exprs.push(b.float(0.5));
    exprs.push(b.string("s"));
    exprs.push(b.character('c'));
    let part = b.base(count);
    exprs.push(b.string_template(vec![part]));

    // arithmetic
    let (one, two) = (b.natural(1), b.natural(2));
    exprs.push(b.binary(BinaryOperator::Sum, one, two));
    let (two, three) = (b.natural(2), b.natural(3));
    exprs.push(b.binary(BinaryOperator::Power, two, three));
    let (boxed, one) = (b.base(thing), b.natural(1));
    exprs.push(b.binary_typed(BinaryOperator::Product, boxed, one, Some(int)));
    let (left, one) = (b.base(count), b.natural(1));
    exprs.push(b.binary(BinaryOperator::Difference, left, one));

    // truth-valued
    let operand = b.base(thing);
    exprs.push(b.unary(UnaryOperator::Not, operand));
    for operator in [
        BinaryOperator::And,
        BinaryOperator::Equal,
        BinaryOperator::Identical,
        BinaryOperator::Smaller,
        BinaryOperator::In,
    ] {
        let (left, right) = (b.base(thing), b.base(thing));
        exprs.push(b.binary(operator, left, right));
    }
    let operand = b.base(thing);
    exprs.push(boolean_node(&mut b, ExprKind::Exists(Box::new(operand))));
    let operand = b.base(numbers);
    exprs.push(boolean_node(&mut b, ExprKind::Nonempty(Box::new(operand))));
    let operand = b.base(thing);
    exprs.push(boolean_node(
        &mut b,
        ExprKind::Is {
            operand: Box::new(operand),
            tested: Some(int),
        },
    ));
    let (lower, operand, upper) = (b.natural(0), b.base(count), b.natural(9));
    exprs.push(boolean_node(
        &mut b,
        ExprKind::Within {
            lower: Box::new(lower),
            operand: Box::new(operand),
            upper: Box::new(upper),
        },
    ));

    // conditionals
    let truth = b.core().true_value;
    let common = b.union(&[int, string]);
    let condition = b.base(truth);
    let (one, x) = (b.natural(1), b.string("x"));
    exprs.push(b.if_expr(vec![Condition::Boolean(condition)], one, x, Some(common)));
    let condition = b.base(truth);
    let (one, two) = (b.natural(1), b.natural(2));
    exprs.push(b.if_expr(vec![Condition::Boolean(condition)], one, two, Some(int)));
    let condition = b.base(truth);
    let (one, boxed) = (b.natural(1), b.base(thing));
    exprs.push(b.if_expr(vec![Condition::Boolean(condition)], one, boxed, Some(int)));
    let discriminant = b.base(count);
    let (one, ten, zero) = (b.natural(1), b.natural(10), b.natural(0));
    exprs.push(b.expr(
        ExprKind::Switch {
            discriminant: Box::new(discriminant),
            cases: vec![SwitchCaseExpr {
                matches: vec![one],
                result: ten,
            }],
            else_expr: Some(Box::new(zero)),
        },
        Some(int),
    ));

    // members along the refinement chain
    let array_type = b.type_of(array);
    let arrays = b.value("arrays", Container::Unit, array_type);
    let receiver = b.base(arrays);
    exprs.push(b.member(receiver, array_size));

    body.extend(exprs.into_iter().map(Statement::Expression));

    let statements = vec![
        b.declaration(thing, DeclarationBody::None),
        b.declaration(count, DeclarationBody::None),
        b.declaration(numbers, DeclarationBody::None),
        b.declaration(arrays, DeclarationBody::None),
        b.type_declaration(array, vec![b.declaration(array_size, DeclarationBody::None)]),
        b.type_declaration(list, vec![b.declaration(list_size, DeclarationBody::None)]),
        b.type_declaration(sized, vec![b.declaration(formal, DeclarationBody::None)]),
        b.declaration(main, DeclarationBody::Block(Block { statements: body })),
    ];

    Fixture {
        program: b.finish(),
        unit: unit("properties.ceylon", statements),
        iteration_variables: vec![element, key, item, first, second],
    }
}

fn annotated() -> Fixture {
    let mut fixture = fixture();
    run(&mut fixture.program, &mut fixture.unit);
    fixture
}

#[test]
fn test_pass_is_idempotent() {
    let Fixture {
        mut program, mut unit, ..
    } = annotated();
    let declarations: Vec<_> = program.declarations.iter().map(|d| (d.id, d.annotations)).collect();
    let nodes: Vec<_> = expressions(&unit).iter().map(|e| (e.id, e.annotations)).collect();

    run(&mut program, &mut unit);

    let declarations_again: Vec<_> = program.declarations.iter().map(|d| (d.id, d.annotations)).collect();
    let nodes_again: Vec<_> = expressions(&unit).iter().map(|e| (e.id, e.annotations)).collect();
    assert_eq!(declarations, declarations_again);
    assert_eq!(nodes, nodes_again);
}

#[test]
fn test_literals_are_unboxed() {
    let fixture = annotated();
    let nodes = expressions(&fixture.unit);
    let literals: Vec<_> = nodes
        .iter()
        .filter(|e| matches!(e.kind, ExprKind::Literal(_) | ExprKind::StringTemplate { .. }))
        .collect();
    assert!(literals.len() > 5);
    for literal in literals {
        assert!(literal.annotations.unboxed, "boxed literal {:?}", literal.kind);
    }
}

#[test]
fn test_truth_valued_nodes_are_unboxed() {
    let fixture = annotated();
    let mut checked = 0;
    for expr in expressions(&fixture.unit) {
        let truth_valued = match &expr.kind {
            ExprKind::Unary { operator, .. } => *operator == UnaryOperator::Not,
            ExprKind::Binary { operator, .. } => operator.yields_boolean(),
            ExprKind::Exists(_) | ExprKind::Nonempty(_) | ExprKind::Is { .. } | ExprKind::Within { .. } => true,
            _ => false,
        };
        if truth_valued {
            checked += 1;
            assert!(expr.annotations.unboxed, "boxed truth value {:?}", expr.kind);
        }
    }
    assert_eq!(checked, 10);
}

#[test]
fn test_arithmetic_follows_operands() {
    let fixture = annotated();
    let mut seen = (false, false, false);
    for expr in expressions(&fixture.unit) {
        let ExprKind::Binary { operator, left, right } = &expr.kind else {
            continue;
        };
        if *operator == BinaryOperator::Power {
            assert!(!expr.annotations.unboxed);
            seen.0 = true;
        } else if operator.is_arithmetic() {
            let both = left.annotations.unboxed && right.annotations.unboxed;
            assert_eq!(expr.annotations.unboxed, both);
            if both {
                seen.1 = true;
            } else {
                seen.2 = true;
            }
        }
    }
    assert_eq!(seen, (true, true, true));
}

#[test]
fn test_refinements_agree_with_topmost() {
    let fixture = annotated();
    let program = &fixture.program;
    let policy = StandardPolicy::new();
    let resolver = RefinementResolver::new(program, &policy);
    let rewrites = ShortcutRewrites::new();

    let mut refining = 0;
    for decl in program.declarations.iter() {
        let topmost = resolver.topmost_refined(decl.id, &rewrites);
        if topmost != decl.id {
            refining += 1;
            assert_eq!(
                decl.annotations.unboxed,
                unboxed(program, topmost),
                "{} disagrees with {}",
                program.qualified_name(decl.id),
                program.qualified_name(topmost)
            );
        }
    }
    assert!(refining >= 2);
}

#[test]
fn test_iteration_variables_are_boxed() {
    let fixture = annotated();
    for variable in &fixture.iteration_variables {
        assert_eq!(
            unboxed(&fixture.program, *variable),
            Some(false),
            "{}",
            fixture.program.name_of(*variable)
        );
    }
}

#[test]
fn test_conditionals_need_unboxed_branches_and_type() {
    let fixture = annotated();
    let program = &fixture.program;
    let policy = StandardPolicy::new();
    let mut outcomes = Vec::new();
    for expr in expressions(&fixture.unit) {
        let branches: Vec<&Expression> = match &expr.kind {
            ExprKind::If {
                then_expr, else_expr, ..
            } => vec![&**then_expr, &**else_expr],
            ExprKind::Switch { cases, else_expr, .. } => cases
                .iter()
                .map(|case| &case.result)
                .chain(else_expr.as_deref())
                .collect(),
            _ => continue,
        };
        let keeps_type = expr
            .type_id
            .is_some_and(|ty| !policy.will_erase_to_object(program, ty));
        let expected = branches.iter().all(|b| b.annotations.unboxed) && keeps_type;
        assert_eq!(expr.annotations.unboxed, expected);
        outcomes.push(expected);
    }
    assert_eq!(outcomes, vec![false, true, false, true]);
}
