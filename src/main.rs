// Use the library crate (whose name is defined in Cargo.toml)
use qlisp::Environment;
use qlisp::evaluator::evaluate;
use qlisp::parser::parse_program_str;

fn main() {
    // A tiny tour of the pipeline; the interactive loop lives in bin/repl.rs
    let inputs = [
        "+ 1 (* 2 3)",
        "def {square} (\\ {x} {* x x})",
        "square 12",
        "eval (head {(+ 1 2) (+ 10 20)})",
    ];

    let env = Environment::new_global_populated();
    for input in inputs {
        println!("> {}", input);
        match parse_program_str(input) {
            Ok(node) => match evaluate(node, env.clone()) {
                Ok(result) => println!("{}", result),
                Err(e) => e.pretty_print(input),
            },
            Err(e) => e.pretty_print(input),
        }
    }
}
