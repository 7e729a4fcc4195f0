use crate::environment::EnvError;
use crate::evaluator::EvalError;
use crate::parser::ParseError;
use ariadne::{Label, Report, ReportKind, Source};

impl EvalError {
    pub fn pretty_print(&self, input: &str) {
        let report = match self {
            EvalError::Env(env_error) => match env_error {
                EnvError::UnboundSymbol(symbol, span) => {
                    Report::build(ReportKind::Error, ("REPL", span.to_range()))
                        .with_message(format!("Unbound symbol `{}`", symbol))
                        .with_label(
                            Label::new(("REPL", span.to_range()))
                                .with_message("This symbol is not defined in the current scope"),
                        )
                }
            },
            EvalError::NotAFunction(value, span) => {
                Report::build(ReportKind::Error, ("REPL", span.to_range()))
                    .with_message(format!("Not a function: {}", value))
                    .with_label(
                        Label::new(("REPL", span.to_range()))
                            .with_message("This expression cannot be called as a function"),
                    )
            }
            EvalError::ArityMismatch {
                name,
                expected,
                got,
                span,
            } => Report::build(ReportKind::Error, ("REPL", span.to_range()))
                .with_message(format!("Wrong number of arguments for '{}'", name))
                .with_label(Label::new(("REPL", span.to_range())).with_message(format!(
                    "'{}' expects {} arguments but this call passes {}",
                    name, expected, got
                ))),
            EvalError::TypeMismatch {
                name,
                expected,
                found,
                span,
            } => Report::build(ReportKind::Error, ("REPL", span.to_range()))
                .with_message(format!("Type mismatch in call to '{}'", name))
                .with_label(
                    Label::new(("REPL", span.to_range()))
                        .with_message(format!("Expected a {}, found a {}", expected, found)),
                ),
            EvalError::EmptyList { name, span } => {
                Report::build(ReportKind::Error, ("REPL", span.to_range()))
                    .with_message(format!("'{}' passed {{}}", name))
                    .with_label(
                        Label::new(("REPL", span.to_range()))
                            .with_message("This q-expression has no elements"),
                    )
            }
            EvalError::DivisionByZero(span) => {
                Report::build(ReportKind::Error, ("REPL", span.to_range()))
                    .with_message("Division by zero")
                    .with_label(
                        Label::new(("REPL", span.to_range()))
                            .with_message("The divisor here evaluates to 0"),
                    )
            }
            EvalError::BadDefinition(message, span) => {
                Report::build(ReportKind::Error, ("REPL", span.to_range()))
                    .with_message(format!("Malformed definition: {}", message))
                    .with_label(
                        Label::new(("REPL", span.to_range()))
                            .with_message("This definition is malformed or incomplete"),
                    )
            }
        };
        report
            .finish()
            .print(("REPL", Source::from(input)))
            .unwrap();
    }
}

impl ParseError {
    pub fn pretty_print(&self, input: &str) {
        let report = match self {
            ParseError::UnexpectedToken { found, expected } => {
                Report::build(ReportKind::Error, ("REPL", found.span.to_range()))
                    .with_message(format!("Unexpected token: {}", found.kind))
                    .with_label(
                        Label::new(("REPL", found.span.to_range()))
                            .with_message(format!("Expected {expected}")),
                    )
            }
            ParseError::UnexpectedEof(expected) => {
                let end = input.len();
                let start = end.saturating_sub(1);
                Report::build(ReportKind::Error, ("REPL", start..end))
                    .with_message("Unexpected end of input")
                    .with_label(Label::new(("REPL", start..end)).with_message(expected))
            }
            ParseError::Lexer(lex_err) => {
                Report::build(ReportKind::Error, ("REPL", lex_err.span.to_range()))
                    .with_message("Lexer Error")
                    .with_label(
                        Label::new(("REPL", lex_err.span.to_range()))
                            .with_message(lex_err.error.to_string()),
                    )
            }
        };
        report
            .finish()
            .print(("REPL", Source::from(input)))
            .unwrap();
    }
}
