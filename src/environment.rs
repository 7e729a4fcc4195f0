use crate::source::Span;
use crate::types::{BuiltinFn, Node};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use thiserror::Error;

// --- Environment Error ---

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvError {
    #[error("unbound symbol '{0}'")]
    UnboundSymbol(String, Span), // Symbol name, span where lookup happened
}

// --- Environment Definition ---

#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    // Rc<RefCell<...>> allows shared ownership and interior mutability:
    // closures keep their captured frame alive while `def` mutates the root.
    outer: Option<Rc<RefCell<Environment>>>,
    bindings: HashMap<String, Node>, // Maps symbol names to Nodes
}

impl Environment {
    /// Creates a new, empty, top-level environment.
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            outer: None,
            bindings: HashMap::new(),
        }))
    }

    /// Creates the global environment with the full builtin table installed.
    pub fn new_global_populated() -> Rc<RefCell<Environment>> {
        let env_ptr = Environment::new(); // Create empty global env
        {
            // Borrow mutably only inside this scope
            let mut env = env_ptr.borrow_mut();

            // Arithmetic
            env.add_builtin("+", crate::primitives::prim_add);
            env.add_builtin("-", crate::primitives::prim_sub);
            env.add_builtin("*", crate::primitives::prim_mul);
            env.add_builtin("/", crate::primitives::prim_div);

            // List operations
            env.add_builtin("list", crate::primitives::prim_list);
            env.add_builtin("head", crate::primitives::prim_head);
            env.add_builtin("tail", crate::primitives::prim_tail);
            env.add_builtin("join", crate::primitives::prim_join);
            env.add_builtin("eval", crate::primitives::prim_eval);

            // Functions and definitions
            env.add_builtin("\\", crate::primitives::prim_lambda);
            env.add_builtin("lambda", crate::primitives::prim_lambda);
            env.add_builtin("def", crate::primitives::prim_def);
            env.add_builtin("=", crate::primitives::prim_put);
            env.add_builtin("put", crate::primitives::prim_put);
        }
        env_ptr
    }

    /// Creates a new environment enclosed within an outer one.
    pub fn new_enclosed(outer_env: Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            outer: Some(outer_env),
            bindings: HashMap::new(),
        }))
    }

    /// Duplicates an environment's own bindings into a fresh cell. The
    /// parent reference is shared, not copied: copies still see later
    /// definitions made in outer scopes, but not each other's local ones.
    pub fn clone_bindings(env: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(env.borrow().clone()))
    }

    /// Defines a symbol in the *current* environment frame.
    /// Replaces the value if the symbol already exists in this frame.
    pub fn define(&mut self, name: String, value_node: Node) {
        self.bindings.insert(name, value_node);
    }

    /// Defines a symbol at the root of the environment chain, so that
    /// definitions made inside a nested call are still globally visible.
    pub fn define_global(&mut self, name: String, value_node: Node) {
        match &self.outer {
            Some(outer_env_ptr) => outer_env_ptr.borrow_mut().define_global(name, value_node),
            None => self.define(name, value_node),
        }
    }

    /// Looks up a symbol's value.
    /// Checks the current environment first, then walks up the outer chain.
    /// Returns a copy, so callers own the result independently of storage.
    /// `lookup_span` is the location of the reference, for error reporting.
    pub fn get(&self, name: &str, lookup_span: Span) -> Result<Node, EnvError> {
        if let Some(value_node) = self.bindings.get(name) {
            Ok(value_node.clone())
        } else {
            match &self.outer {
                Some(outer_env_ptr) => outer_env_ptr.borrow().get(name, lookup_span),
                None => Err(EnvError::UnboundSymbol(name.to_string(), lookup_span)),
            }
        }
    }

    /// Helper to install a builtin under a symbol name.
    fn add_builtin(&mut self, name: &str, func: BuiltinFn) {
        let node = Node::new_builtin(func, name, Span::default());
        self.define(name.to_string(), node);
    }

    fn add_identifiers(&self, mut identifiers: HashSet<String>) -> HashSet<String> {
        for identifier in self.bindings.keys() {
            identifiers.insert(identifier.to_string());
        }
        match &self.outer {
            Some(outer_env_ptr) => outer_env_ptr.borrow().add_identifiers(identifiers),
            None => identifiers,
        }
    }

    /// Gets the set of all identifiers visible from this environment.
    pub fn get_identifiers(&self) -> HashSet<String> {
        self.add_identifiers(HashSet::new())
    }
}
