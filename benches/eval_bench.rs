use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qlisp::Environment;
use qlisp::evaluator::evaluate;
use qlisp::lexer::tokenize;
use qlisp::parser::parse_program_str;

// A reasonably varied input for the lexer and parser benchmarks
const BENCH_INPUT: &str = r#"
(def {square} (\ {x} {* x x})) ; squaring helper
(def {twice} (\ {f x} {f (f x)}))
(square 12)
(+ 1 (* 2 3) (- 10 4) (/ 100 5 2))
(head {1 2 3 4 5})
(join {1 2} {3 4} {5 6})
(eval (head {(+ 1 2) (+ 10 20)}))
{a quoted {nested} list with -42 and symbols}
; trailing comment
"#;

// A REPL-style session for the end-to-end benchmark: each line is one
// program evaluated against a shared environment.
const EVAL_PROGRAMS: &[&str] = &[
    "def {square} (\\ {x} {* x x})",
    "def {compose} (\\ {f g x} {f (g x)})",
    "def {add3} (\\ {x} {+ x 3})",
    "(compose square add3 7)",
    "+ (square 12) (square 13)",
    "eval (join {+} (tail {9 1 2 3}))",
    "head (list 1 2 3 4 5)",
];

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pipeline");

    group.bench_with_input(
        BenchmarkId::new("tokenize", "bench_input"),
        &BENCH_INPUT,
        |b, input| b.iter(|| tokenize(black_box(input))),
    );

    group.bench_with_input(
        BenchmarkId::new("parse_program", "bench_input"),
        &BENCH_INPUT,
        |b, input| b.iter(|| parse_program_str(black_box(input))),
    );

    group.bench_with_input(
        BenchmarkId::new("evaluate", "repl_session"),
        &EVAL_PROGRAMS,
        |b, programs| {
            b.iter(|| {
                let env = Environment::new_global_populated();
                for program in *programs {
                    let node =
                        parse_program_str(black_box(program)).expect("bench program parses");
                    evaluate(node, env.clone()).expect("bench program evaluates");
                }
            })
        },
    );

    group.finish();
}

// Register the benchmark group with Criterion
criterion_group!(benches, bench_pipeline);
// Generate the main function necessary for the benchmark executable
criterion_main!(benches);
