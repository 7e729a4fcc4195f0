use crate::environment::{EnvError, Environment};
use crate::source::Span;
use crate::types::{Lambda, Node, Procedure, Value};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

// --- Evaluation Error ---

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error(transparent)]
    Env(#[from] EnvError), // Errors from environment lookup
    #[error("first element of an s-expression must be a function, got {}", .0.type_name())]
    NotAFunction(Value, Span),
    #[error("'{name}' expects {expected} arguments, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
        span: Span,
    },
    #[error("'{name}' expects a {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
        span: Span,
    },
    #[error("'{name}' passed {{}}")]
    EmptyList { name: String, span: Span },
    #[error("division by zero")]
    DivisionByZero(Span),
    #[error("malformed definition: {0}")]
    BadDefinition(String, Span), // Malformed def/=/lambda argument lists
}

// Result type alias for convenience
pub type EvalResult<T = Node> = Result<T, EvalError>;

// --- Evaluate Function ---

/// Evaluates a given Node within the specified environment.
///
/// Numbers, errors, procedures and q-expressions are self-evaluating;
/// symbols are looked up (the caller owns the returned copy); s-expressions
/// reduce as function calls.
pub fn evaluate(node: Node, env: Rc<RefCell<Environment>>) -> EvalResult {
    let Node { kind, span } = node;
    match kind {
        Value::Number(_) | Value::Error(_) | Value::Procedure(_) | Value::Qexpr(_) => {
            Ok(Node::new(kind, span))
        }
        // Use the symbol's span for error reporting if lookup fails
        Value::Symbol(name) => Ok(env.borrow().get(&name, span)?),
        Value::Sexpr(children) => eval_sexpr(children, span, env),
    }
}

fn eval_sexpr(children: Vec<Node>, span: Span, env: Rc<RefCell<Environment>>) -> EvalResult {
    // 1. Evaluate each child left to right. The first failure becomes the
    // result of the whole expression; later siblings are never evaluated
    // and already-evaluated ones are dropped.
    let mut evaluated = Vec::with_capacity(children.len());
    for child in children {
        let value = evaluate(child, env.clone())?;
        if let Value::Error(_) = value.kind {
            return Ok(value);
        }
        evaluated.push(value);
    }

    // 2. An empty s-expression evaluates to itself
    if evaluated.is_empty() {
        return Ok(Node::new_sexpr(evaluated, span));
    }

    // 3. A parenthesized single value collapses to that value
    if evaluated.len() == 1 {
        return Ok(evaluated.remove(0));
    }

    // 4. Otherwise this is a call: the first element must be callable
    let first = evaluated.remove(0);
    let args = evaluated;
    match first.kind {
        Value::Procedure(procedure) => apply(procedure, args, span, env),
        other => Err(EvalError::NotAFunction(other, first.span)),
    }
}

/// Applies a callable to already-evaluated arguments.
pub fn apply(
    procedure: Procedure,
    args: Vec<Node>,
    span: Span,
    env: Rc<RefCell<Environment>>,
) -> EvalResult {
    match procedure {
        Procedure::Builtin(func, _) => func(env, args, span),
        Procedure::Lambda(lambda) => apply_lambda(lambda, args, span),
    }
}

fn apply_lambda(lambda: Lambda, args: Vec<Node>, span: Span) -> EvalResult {
    let Lambda { params, body, env } = lambda;

    let Value::Qexpr(param_nodes) = params.kind else {
        return Err(EvalError::BadDefinition(
            "lambda formals must be a q-expression".to_string(),
            params.span,
        ));
    };

    if param_nodes.len() != args.len() {
        return Err(EvalError::ArityMismatch {
            name: "lambda".to_string(),
            expected: param_nodes.len(),
            got: args.len(),
            span,
        });
    }

    // Formals bind positionally in a fresh frame whose parent is the
    // captured environment. The frame is dropped when the call returns;
    // the capture lives on with the lambda.
    let call_env = Environment::new_enclosed(env);
    for (param, arg) in param_nodes.into_iter().zip(args) {
        match param.kind {
            Value::Symbol(name) => call_env.borrow_mut().define(name, arg),
            other => {
                return Err(EvalError::BadDefinition(
                    format!("lambda cannot bind to {}", other.type_name()),
                    param.span,
                ));
            }
        }
    }

    // The body is stored quoted; calling re-tags it as an s-expression.
    let Node {
        kind,
        span: body_span,
    } = *body;
    match kind {
        Value::Qexpr(children) => eval_sexpr(children, body_span, call_env),
        other => Err(EvalError::BadDefinition(
            format!("lambda body must be a q-expression, not {}", other.type_name()),
            body_span,
        )),
    }
}
