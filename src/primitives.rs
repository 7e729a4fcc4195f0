use crate::environment::Environment;
use crate::evaluator::{EvalError, EvalResult, evaluate};
use crate::source::Span;
use crate::types::{Node, Value};
use std::cell::RefCell;
use std::rc::Rc;

// Checks the number of arguments
macro_rules! check_arity {
    ($args:expr, $expected:expr, $span:expr, $name:expr) => {
        if $args.len() != $expected {
            return Err(EvalError::ArityMismatch {
                name: $name.to_string(),
                expected: $expected,
                got: $args.len(),
                span: $span,
            });
        }
    };
    // Variant for minimum number of args
    ($args:expr, min $expected:expr, $span:expr, $name:expr) => {
        if $args.len() < $expected {
            return Err(EvalError::ArityMismatch {
                name: $name.to_string(),
                expected: $expected,
                got: $args.len(),
                span: $span,
            });
        }
    };
}

fn type_mismatch(name: &str, expected: &'static str, found: &Node) -> EvalError {
    EvalError::TypeMismatch {
        name: name.to_string(),
        expected,
        found: found.kind.type_name(),
        span: found.span,
    }
}

// Extracts the children of a q-expression argument or fails with the
// builtin's name in the message.
fn expect_qexpr(name: &str, node: Node) -> EvalResult<Vec<Node>> {
    let span = node.span;
    match node.kind {
        Value::Qexpr(children) => Ok(children),
        other => Err(EvalError::TypeMismatch {
            name: name.to_string(),
            expected: "q-expression",
            found: other.type_name(),
            span,
        }),
    }
}

// --- Arithmetic ---

#[derive(Copy, Clone)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    fn name(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }

    // Fixed-width semantics: overflow wraps, only division by zero fails.
    fn fold(self, acc: i64, rhs: i64, span: Span) -> EvalResult<i64> {
        match self {
            ArithOp::Add => Ok(acc.wrapping_add(rhs)),
            ArithOp::Sub => Ok(acc.wrapping_sub(rhs)),
            ArithOp::Mul => Ok(acc.wrapping_mul(rhs)),
            ArithOp::Div => {
                if rhs == 0 {
                    Err(EvalError::DivisionByZero(span))
                } else {
                    Ok(acc.wrapping_div(rhs))
                }
            }
        }
    }
}

fn arith_op(args: Vec<Node>, span: Span, op: ArithOp) -> EvalResult {
    check_arity!(args, min 1, span, op.name());

    let mut numbers = Vec::with_capacity(args.len());
    for arg in &args {
        match arg.kind {
            Value::Number(n) => numbers.push(n),
            _ => return Err(type_mismatch(op.name(), "number", arg)),
        }
    }

    // (- x) -> -x
    if numbers.len() == 1 && matches!(op, ArithOp::Sub) {
        return Ok(Node::new_number(numbers[0].wrapping_neg(), span));
    }

    let mut acc = numbers[0];
    for &n in &numbers[1..] {
        acc = op.fold(acc, n, span)?;
    }
    Ok(Node::new_number(acc, span))
}

pub fn prim_add(_env: Rc<RefCell<Environment>>, args: Vec<Node>, span: Span) -> EvalResult {
    arith_op(args, span, ArithOp::Add)
}

pub fn prim_sub(_env: Rc<RefCell<Environment>>, args: Vec<Node>, span: Span) -> EvalResult {
    arith_op(args, span, ArithOp::Sub)
}

pub fn prim_mul(_env: Rc<RefCell<Environment>>, args: Vec<Node>, span: Span) -> EvalResult {
    arith_op(args, span, ArithOp::Mul)
}

pub fn prim_div(_env: Rc<RefCell<Environment>>, args: Vec<Node>, span: Span) -> EvalResult {
    arith_op(args, span, ArithOp::Div)
}

// --- List operations ---

/// (list 1 2 3) -> {1 2 3}: the evaluated argument list, re-tagged quoted.
pub fn prim_list(_env: Rc<RefCell<Environment>>, args: Vec<Node>, span: Span) -> EvalResult {
    Ok(Node::new_qexpr(args, span))
}

/// (head {1 2 3}) -> {1}
pub fn prim_head(_env: Rc<RefCell<Environment>>, mut args: Vec<Node>, span: Span) -> EvalResult {
    check_arity!(args, 1, span, "head");
    let arg = args.remove(0);
    let arg_span = arg.span;
    let mut children = expect_qexpr("head", arg)?;
    if children.is_empty() {
        return Err(EvalError::EmptyList {
            name: "head".to_string(),
            span: arg_span,
        });
    }
    children.truncate(1);
    Ok(Node::new_qexpr(children, span))
}

/// (tail {1 2 3}) -> {2 3}
pub fn prim_tail(_env: Rc<RefCell<Environment>>, mut args: Vec<Node>, span: Span) -> EvalResult {
    check_arity!(args, 1, span, "tail");
    let arg = args.remove(0);
    let arg_span = arg.span;
    let mut children = expect_qexpr("tail", arg)?;
    if children.is_empty() {
        return Err(EvalError::EmptyList {
            name: "tail".to_string(),
            span: arg_span,
        });
    }
    children.remove(0);
    Ok(Node::new_qexpr(children, span))
}

/// (join {1 2} {3 4}) -> {1 2 3 4}, order preserved.
pub fn prim_join(_env: Rc<RefCell<Environment>>, args: Vec<Node>, span: Span) -> EvalResult {
    let mut joined = Vec::new();
    for arg in args {
        joined.append(&mut expect_qexpr("join", arg)?);
    }
    Ok(Node::new_qexpr(joined, span))
}

/// (eval {+ 1 2}) -> 3: the quoted list re-tagged as a call and reduced.
pub fn prim_eval(env: Rc<RefCell<Environment>>, mut args: Vec<Node>, span: Span) -> EvalResult {
    check_arity!(args, 1, span, "eval");
    let arg = args.remove(0);
    let arg_span = arg.span;
    let children = expect_qexpr("eval", arg)?;
    evaluate(Node::new_sexpr(children, arg_span), env)
}

// --- Functions and definitions ---

/// (\ {x y} {+ x y}) -> a lambda value.
pub fn prim_lambda(env: Rc<RefCell<Environment>>, mut args: Vec<Node>, span: Span) -> EvalResult {
    check_arity!(args, 2, span, "\\");
    let params = args.remove(0);
    let body = args.remove(0);

    match &params.kind {
        Value::Qexpr(children) => {
            for child in children {
                if !matches!(child.kind, Value::Symbol(_)) {
                    return Err(EvalError::BadDefinition(
                        format!("'\\' cannot bind to {}", child.kind.type_name()),
                        child.span,
                    ));
                }
            }
        }
        _ => return Err(type_mismatch("\\", "q-expression", &params)),
    }
    if !matches!(body.kind, Value::Qexpr(_)) {
        return Err(type_mismatch("\\", "q-expression", &body));
    }

    // A fresh empty frame parented to the defining environment: free
    // symbols in the body resolve lexically at call time.
    let captured = Environment::new_enclosed(env);
    Ok(Node::new_lambda(params, body, captured, span))
}

/// (def {x y} 1 2): bind at the global root.
pub fn prim_def(env: Rc<RefCell<Environment>>, args: Vec<Node>, span: Span) -> EvalResult {
    define_symbols(env, args, span, "def", true)
}

/// (= {x} 1): bind in the current call environment.
pub fn prim_put(env: Rc<RefCell<Environment>>, args: Vec<Node>, span: Span) -> EvalResult {
    define_symbols(env, args, span, "=", false)
}

fn define_symbols(
    env: Rc<RefCell<Environment>>,
    mut args: Vec<Node>,
    span: Span,
    name: &str,
    global: bool,
) -> EvalResult {
    check_arity!(args, min 1, span, name);
    let first = args.remove(0);
    let symbols = expect_qexpr(name, first)?;

    let mut names = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        match symbol.kind {
            Value::Symbol(n) => names.push(n),
            other => {
                return Err(EvalError::BadDefinition(
                    format!("'{}' cannot define {}", name, other.type_name()),
                    symbol.span,
                ));
            }
        }
    }

    // One value per name, exactly
    if names.len() != args.len() {
        return Err(EvalError::ArityMismatch {
            name: name.to_string(),
            expected: names.len(),
            got: args.len(),
            span,
        });
    }

    for (symbol_name, value) in names.into_iter().zip(args) {
        if global {
            env.borrow_mut().define_global(symbol_name, value);
        } else {
            env.borrow_mut().define(symbol_name, value);
        }
    }
    Ok(Node::new_sexpr(Vec::new(), span))
}
