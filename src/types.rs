use crate::environment::Environment;
use crate::evaluator::EvalResult;
use crate::source::Span;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: Value, // The actual value data
    pub span: Span,  // The source span it covers
}

impl Node {
    pub fn new(kind: Value, span: Span) -> Self {
        Node { kind, span }
    }

    pub fn new_number(n: i64, span: Span) -> Self {
        Node::new(Value::Number(n), span)
    }

    pub fn new_error(message: impl Into<String>, span: Span) -> Self {
        Node::new(Value::Error(message.into()), span)
    }

    pub fn new_symbol(name: impl Into<String>, span: Span) -> Self {
        Node::new(Value::Symbol(name.into()), span)
    }

    pub fn new_builtin(func: BuiltinFn, name: &str, span: Span) -> Self {
        Node::new(
            Value::Procedure(Procedure::Builtin(func, name.to_string())),
            span,
        )
    }

    pub fn new_lambda(params: Node, body: Node, env: Rc<RefCell<Environment>>, span: Span) -> Self {
        Node::new(
            Value::Procedure(Procedure::Lambda(Lambda {
                params: Box::new(params),
                body: Box::new(body),
                env,
            })),
            span,
        )
    }

    pub fn new_sexpr(children: Vec<Node>, span: Span) -> Self {
        Node::new(Value::Sexpr(children), span)
    }

    pub fn new_qexpr(children: Vec<Node>, span: Span) -> Self {
        Node::new(Value::Qexpr(children), span)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Delegate to Value's Display implementation
        write!(f, "{}", self.kind)
    }
}

/// The runtime value type. Both code and data are made of these: an
/// s-expression is evaluated as a call, a q-expression stays quoted data.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(i64),        // e.g. 42, -7
    Error(String),      // a failed computation, carried as a value
    Symbol(String),     // e.g. +, head, x
    Procedure(Procedure),
    Sexpr(Vec<Node>),   // ( ... ), evaluated
    Qexpr(Vec<Node>),   // { ... }, quoted
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Error(_) => "error",
            Value::Symbol(_) => "symbol",
            Value::Procedure(Procedure::Builtin(_, _)) => "builtin",
            Value::Procedure(Procedure::Lambda(_)) => "lambda",
            Value::Sexpr(_) => "s-expression",
            Value::Qexpr(_) => "q-expression",
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, children: &[Node], open: char, close: char) -> fmt::Result {
    write!(f, "{}", open)?;
    let mut first = true;
    for child in children {
        if !first {
            write!(f, " ")?;
        }
        write!(f, "{}", child)?;
        first = false;
    }
    write!(f, "{}", close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Error(message) => write!(f, "Error: {}", message),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::Procedure(Procedure::Builtin(_, name)) => write!(f, "<builtin:{}>", name),
            Value::Procedure(Procedure::Lambda(lambda)) => {
                write!(f, "(\\ {} {})", lambda.params, lambda.body)
            }
            Value::Sexpr(children) => write_seq(f, children, '(', ')'),
            Value::Qexpr(children) => write_seq(f, children, '{', '}'),
        }
    }
}

/// Native operations take the environment of the call site, the already
/// evaluated arguments, and the span of the whole call expression.
pub type BuiltinFn = fn(Rc<RefCell<Environment>>, Vec<Node>, Span) -> EvalResult;

/// A callable value: either a native builtin or a user-defined lambda.
/// Dispatch happens explicitly in `apply`, never through a nullable slot.
#[derive(Clone)]
pub enum Procedure {
    Builtin(BuiltinFn, String), // The function pointer and its name (for display/debug)
    Lambda(Lambda),
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Procedure::Builtin(_, name) => write!(f, "Builtin({})", name),
            Procedure::Lambda(lambda) => write!(f, "Lambda({} {})", lambda.params, lambda.body),
        }
    }
}

// Function pointers don't implement PartialEq directly; builtins are
// compared by name, lambdas by their formals and body. The captured
// environment is deliberately ignored (the chain can reach back to the
// binding that holds the lambda itself).
impl PartialEq for Procedure {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Procedure::Builtin(_, n1), Procedure::Builtin(_, n2)) => n1 == n2,
            (Procedure::Lambda(l1), Procedure::Lambda(l2)) => l1 == l2,
            _ => false,
        }
    }
}

/// A user-defined closure: a q-expression of formal symbols, an unevaluated
/// q-expression body, and the environment captured at definition time.
pub struct Lambda {
    pub params: Box<Node>,
    pub body: Box<Node>,
    pub env: Rc<RefCell<Environment>>,
}

// Copying a lambda duplicates its captured frame's local bindings while the
// parent chain stays shared, so copies keep seeing outer definitions but
// never each other's local state.
impl Clone for Lambda {
    fn clone(&self) -> Self {
        Lambda {
            params: self.params.clone(),
            body: self.body.clone(),
            env: Environment::clone_bindings(&self.env),
        }
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The captured environment is elided: printing it could walk back
        // into a binding that holds this very lambda.
        write!(f, "Lambda({} {})", self.params, self.body)
    }
}

impl PartialEq for Lambda {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params && self.body == other.body
    }
}
