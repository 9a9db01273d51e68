//! End-to-end representation decisions for small programs, run through the
//! public pass driver

mod common;

use boxing::analysis::refinement::ShortcutRewrites;
use boxing::model::*;
use boxing::{BoxingConfig, BoxingPass, RefinementResolver, StandardPolicy};
use common::{expressions, run, unboxed, unit};

#[test]
fn test_integer_value_is_unboxed() {
    let mut b = ProgramBuilder::new();
    let int = b.integer_type();
    let count = b.value("count", Container::Unit, int);
    let one = b.natural(1);
    let mut unit = unit("count.ceylon", vec![b.declaration_with_value(count, one)]);
    let mut program = b.finish();

    run(&mut program, &mut unit);

    let annotations = program.declarations.get(count).unwrap().annotations;
    assert_eq!(annotations.unboxed, Some(true));
    assert!(!annotations.type_erased);
    assert!(!program.types.is_raw(int));
}

#[test]
fn test_narrowing_override_is_untrusted_and_erased() {
    let mut b = ProgramBuilder::new();
    let object = b.object_type();
    let source = b.interface("Source", Container::Unit);
    let formal = b.method("read", Container::Declaration(source), object);
    b.add_flags(formal, DeclFlags::SHARED | DeclFlags::FORMAL);

    let int = b.integer_type();
    let counter = b.class("Counter", Container::Unit);
    let narrowed = b.method("read", Container::Declaration(counter), int);
    b.add_flags(narrowed, DeclFlags::SHARED | DeclFlags::ACTUAL);
    b.refines(narrowed, formal);

    let statements = vec![
        b.type_declaration(source, vec![b.declaration(formal, DeclarationBody::None)]),
        b.type_declaration(
            counter,
            vec![b.declaration(narrowed, DeclarationBody::Block(Block::default()))],
        ),
    ];
    let mut unit = unit("counter.ceylon", statements);
    let mut program = b.finish();

    run(&mut program, &mut unit);

    let annotations = program.declarations.get(narrowed).unwrap().annotations;
    assert_eq!(annotations.untrusted_type, Some(true));
    assert!(annotations.type_erased);
    assert_eq!(annotations.unboxed, Some(false));
}

#[test]
fn test_arithmetic_is_unboxed_but_power_is_not() {
    let mut b = ProgramBuilder::new();
    let (one, two) = (b.natural(1), b.natural(2));
    let sum = b.binary(BinaryOperator::Sum, one, two);
    let (two, three) = (b.natural(2), b.natural(3));
    let power = b.binary(BinaryOperator::Power, two, three);
    let (sum_id, power_id) = (sum.id, power.id);
    let mut unit = unit(
        "math.ceylon",
        vec![Statement::Expression(sum), Statement::Expression(power)],
    );
    let mut program = b.finish();

    run(&mut program, &mut unit);

    let nodes = expressions(&unit);
    let find = |id| nodes.iter().find(|e| e.id == id).unwrap();
    assert!(find(sum_id).annotations.unboxed);
    assert!(!find(power_id).annotations.unboxed);
}

#[test]
fn test_conditional_with_erasing_common_type_is_boxed() {
    let mut b = ProgramBuilder::new();
    let int = b.integer_type();
    let string = b.string_type();
    let common = b.union(&[int, string]);
    let truth = b.core().true_value;
    let condition = b.base(truth);
    let (one, x) = (b.natural(1), b.string("x"));
    let choice = b.if_expr(vec![Condition::Boolean(condition)], one, x, Some(common));
    let mut unit = unit("choice.ceylon", vec![Statement::Expression(choice)]);
    let mut program = b.finish();

    run(&mut program, &mut unit);

    let nodes = expressions(&unit);
    let ExprKind::If {
        then_expr, else_expr, ..
    } = &nodes[0].kind
    else {
        panic!("expected an if expression");
    };
    assert!(then_expr.annotations.unboxed);
    assert!(else_expr.annotations.unboxed);
    assert!(!nodes[0].annotations.unboxed);
}

#[test]
fn test_actual_class_parameter_resolves_to_refined_class() {
    let mut b = ProgramBuilder::new();
    let int = b.integer_type();
    let outer = b.class("Outer", Container::Unit);
    let a = b.class_with_parameters("A", Container::Declaration(outer));
    let a_x = b.parameter(a, "x", int);
    b.add_flags(a_x, DeclFlags::SHARED);

    let sub = b.class("Sub", Container::Unit);
    let a_type = b.type_of(a);
    let b_class = b.class_with_parameters("B", Container::Declaration(sub));
    b.add_flags(b_class, DeclFlags::SHARED | DeclFlags::ACTUAL);
    b.extend(b_class, a_type);
    b.refines(b_class, a);
    let b_x = b.parameter(b_class, "x", int);

    let statements = vec![
        b.type_declaration(sub, vec![b.type_declaration(b_class, Vec::new())]),
        b.type_declaration(outer, vec![b.type_declaration(a, Vec::new())]),
    ];
    let mut unit = unit("classes.ceylon", statements);
    let mut program = b.finish();

    let policy = StandardPolicy::new();
    let topmost = RefinementResolver::new(&program, &policy).topmost_refined(b_x, &ShortcutRewrites::new());
    assert_eq!(topmost, a_x);

    run(&mut program, &mut unit);
    assert!(unboxed(&program, a_x).is_some());
    assert_eq!(unboxed(&program, b_x), unboxed(&program, a_x));
}

#[test]
fn test_units_share_one_declaration_graph() {
    let mut b = ProgramBuilder::new();
    let int = b.integer_type();
    let sized = b.interface("Sized", Container::Unit);
    let formal = b.value("size", Container::Declaration(sized), int);
    b.add_flags(formal, DeclFlags::SHARED | DeclFlags::FORMAL);

    let list = b.class("List", Container::Unit);
    let actual = b.value("size", Container::Declaration(list), int);
    b.add_flags(actual, DeclFlags::SHARED | DeclFlags::ACTUAL);
    b.refines(actual, formal);

    let list_type = b.type_of(list);
    let items = b.value("items", Container::Unit, list_type);
    let receiver = b.base(items);
    let read = b.member(receiver, actual);
    let read_id = read.id;

    let mut units = vec![
        unit(
            "list.ceylon",
            vec![
                b.type_declaration(list, vec![b.declaration(actual, DeclarationBody::None)]),
                b.declaration(items, DeclarationBody::None),
                Statement::Expression(read),
            ],
        ),
        unit(
            "sized.ceylon",
            vec![b.type_declaration(sized, vec![b.declaration(formal, DeclarationBody::None)])],
        ),
    ];
    let mut program = b.finish();

    let outcome = BoxingPass::new(BoxingConfig::default().with_report(true))
        .run_all(&mut program, &mut units)
        .unwrap();

    assert_eq!(unboxed(&program, formal), Some(true));
    assert_eq!(unboxed(&program, actual), Some(true));
    let report = outcome.report.unwrap();
    assert_eq!(report.unit, "list.ceylon, sized.ceylon");
    assert!(report.declarations["Sized.size"].unboxed);
    assert!(report.declarations["List.size"].unboxed);
    assert!(report.expressions.contains_key(&read_id.as_raw()));
}

#[test]
fn test_report_serialises_to_json() {
    let mut b = ProgramBuilder::new();
    let int = b.integer_type();
    let count = b.value("count", Container::Unit, int);
    let one = b.natural(1);
    let mut unit = unit("count.ceylon", vec![b.declaration_with_value(count, one)]);
    let mut program = b.finish();

    let config = BoxingConfig::from_json(r#"{ "collect_report": true }"#).unwrap();
    let outcome = BoxingPass::new(config).run(&mut program, &mut unit).unwrap();

    let json = outcome.report.unwrap().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["unit"], "count.ceylon");
    assert_eq!(value["declarations"]["count"]["unboxed"], true);
    assert_eq!(value["stats"]["declarations"]["declarations_visited"], 1);
}
