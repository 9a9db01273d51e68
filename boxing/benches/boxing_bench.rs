//! Benchmarks for the boxing pass over synthetic declaration graphs

use boxing::model::*;
use boxing::{BoxingConfig, BoxingPass};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

/// `interface Level0 { formal Integer size; }` refined through `depth` classes,
/// each declaring `actual Integer size`
fn deep_refinement_chain(depth: usize) -> (Program, CompilationUnit) {
    let mut b = ProgramBuilder::new();
    let int = b.integer_type();
    let root = b.interface("Level0", Container::Unit);
    let mut refined = b.value("size", Container::Declaration(root), int);
    b.add_flags(refined, DeclFlags::SHARED | DeclFlags::FORMAL);

    let mut statements = Vec::new();
    let mut parent = b.type_of(root);
    for i in 1..=depth {
        let class = b.class(&format!("Level{}", i), Container::Unit);
        b.satisfy(class, parent);
        let size = b.value("size", Container::Declaration(class), int);
        b.add_flags(size, DeclFlags::SHARED | DeclFlags::ACTUAL);
        b.refines(size, refined);
        let value = b.natural(i as u64);
        let member = b.declaration_with_value(size, value);
        statements.push(b.type_declaration(class, vec![member]));
        refined = size;
        parent = b.type_of(class);
    }
    // Visit the deepest class first so every decision recurses to the root
    statements.reverse();

    let mut unit = CompilationUnit::new("chain.ceylon");
    unit.statements = statements;
    (b.finish(), unit)
}

/// `value total = 1 + 2 + ... + n;` as one left-leaning tree
fn wide_expression(terms: usize) -> (Program, CompilationUnit) {
    let mut b = ProgramBuilder::new();
    let int = b.integer_type();
    let total = b.value("total", Container::Unit, int);
    let mut sum = b.natural(0);
    for i in 1..terms {
        let term = b.natural(i as u64);
        sum = b.binary(BinaryOperator::Sum, sum, term);
    }
    let mut unit = CompilationUnit::new("sum.ceylon");
    unit.statements = vec![b.declaration_with_value(total, sum)];
    (b.finish(), unit)
}

/// `count` top-level values, each read back through a generic accessor
fn many_declarations(count: usize) -> (Program, CompilationUnit) {
    let mut b = ProgramBuilder::new();
    let anything = b.anything_type();
    let identity = b.method("identity", Container::Unit, anything);
    let t = b.type_parameter(identity, "T", &[]);
    let t_type = b.type_parameter_type(t);
    b.set_type(identity, t_type);

    let mut statements = Vec::new();
    for i in 0..count {
        let ty = match i % 3 {
            0 => b.integer_type(),
            1 => b.string_type(),
            _ => b.object_type(),
        };
        let value = b.value(&format!("v{}", i), Container::Unit, ty);
        let mut primary = b.base(identity);
        if let ExprKind::BaseMember { type_args, .. } = &mut primary.kind {
            type_args.push(ty);
        }
        let call = b.invoke(primary, Vec::new(), Some(ty));
        statements.push(b.declaration_with_value(value, call));
    }
    let mut unit = CompilationUnit::new("values.ceylon");
    unit.statements = statements;
    (b.finish(), unit)
}

fn run_pass(setup: impl Fn() -> (Program, CompilationUnit), c: &mut Criterion, group: &str, size: usize) {
    let pass = BoxingPass::new(BoxingConfig::default());
    let mut group = c.benchmark_group(group);
    group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bench, _| {
        bench.iter_batched(
            &setup,
            |(mut program, mut unit)| {
                let outcome = pass.run(&mut program, &mut unit);
                black_box(outcome.map(|o| o.stats))
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn benchmark_refinement_chains(c: &mut Criterion) {
    for depth in [10, 50, 200] {
        run_pass(|| deep_refinement_chain(depth), c, "refinement_chain", depth);
    }
}

fn benchmark_wide_expressions(c: &mut Criterion) {
    for terms in [100, 500, 2000] {
        run_pass(|| wide_expression(terms), c, "wide_expression", terms);
    }
}

fn benchmark_many_declarations(c: &mut Criterion) {
    for count in [100, 1000] {
        run_pass(|| many_declarations(count), c, "many_declarations", count);
    }
}

criterion_group!(
    benches,
    benchmark_refinement_chains,
    benchmark_wide_expressions,
    benchmark_many_declarations
);

criterion_main!(benches);
