//! Variable scope (§3 "Scope", §9 "Variable-scope lookup chain").
//!
//! A Scope is a stack of mapping layers plus a segregated `globals` map for
//! the `global.*` qualifier. The qualifier is an access path into that
//! segregated map, not a lexical parent — `global.x` never walks the local
//! stack.

use std::collections::HashMap;

use crate::error::{EngineError, Result};
use crate::value::Value;

/// Reserved identifiers that may not be bound as user variable names
/// (§3 invariant 2), except where the engine itself provides them.
pub const RESERVED_NAMES: &[&str] = &["global", "result", "i", "random", "and", "or", "not"];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// A stack of name->Value layers plus a segregated globals layer.
pub struct Scope {
    globals: HashMap<String, Value>,
    layers: Vec<HashMap<String, Value>>,
}

impl Scope {
    /// Creates a scope with the given global snapshot and a single empty
    /// local layer.
    pub fn new(globals: HashMap<String, Value>) -> Self {
        Scope {
            globals,
            layers: vec![HashMap::new()],
        }
    }

    /// Pushes a fresh empty layer, inheriting nothing: lookups that miss
    /// the new layer fall through to layers beneath it, per the stack
    /// lookup rule.
    pub fn push_layer(&mut self) {
        self.layers.push(HashMap::new());
    }

    pub fn pop_layer(&mut self) {
        self.layers.pop();
    }

    /// Looks up a bare name, innermost layer first, falling through to the
    /// globals map last — a local binding shadows a global of the same
    /// name, but an unshadowed global is still reachable without the
    /// `global.` qualifier (§3 invariant 1, §4.D "a fresh local scope
    /// layered on the current globals").
    pub fn get(&self, name: &str) -> Result<Value> {
        for layer in self.layers.iter().rev() {
            if let Some(v) = layer.get(name) {
                return Ok(*v);
            }
        }
        if let Some(v) = self.globals.get(name) {
            return Ok(*v);
        }
        Err(EngineError::UndefinedName(name.to_string()))
    }

    /// Looks up `global.name`, consulting only the globals layer.
    pub fn get_global(&self, name: &str) -> Result<Value> {
        self.globals
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::UndefinedName(format!("global.{}", name)))
    }

    /// Stores into the innermost layer.
    pub fn set(&mut self, name: &str, value: Value) {
        let top = self.layers.last_mut().expect("scope always has a layer");
        top.insert(name.to_string(), value);
    }

    /// Binds a name into the innermost layer without requiring a prior
    /// value, used to seed preprocess results and the `i` loop counter.
    pub fn bind(&mut self, name: &str, value: Value) {
        self.set(name, value);
    }

    pub fn globals(&self) -> &HashMap<String, Value> {
        &self.globals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn globals_with(pairs: &[(&str, f64)]) -> HashMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn local_shadows_and_falls_through() {
        let mut scope = Scope::new(globals_with(&[("users", 10.0)]));
        scope.set("x", 1.0);
        scope.push_layer();
        scope.set("y", 2.0);
        assert_eq!(scope.get("y").unwrap(), 2.0);
        assert_eq!(scope.get("x").unwrap(), 1.0);
        scope.pop_layer();
        assert!(scope.get("y").is_err());
    }

    #[test]
    fn bare_name_falls_through_to_globals_when_unshadowed() {
        let scope = Scope::new(globals_with(&[("users", 10.0), ("base", 3.0)]));
        assert_eq!(scope.get("users").unwrap(), 10.0);
        assert_eq!(scope.get("base").unwrap(), 3.0);
    }

    #[test]
    fn global_qualifier_is_segregated() {
        let mut scope = Scope::new(globals_with(&[("users", 10.0)]));
        scope.set("users", 999.0); // local shadow, does not affect global.*
        assert_eq!(scope.get_global("users").unwrap(), 10.0);
        assert_eq!(scope.get("users").unwrap(), 999.0);
    }

    #[test]
    fn undefined_name_errors() {
        let scope = Scope::new(HashMap::new());
        assert!(matches!(
            scope.get("missing"),
            Err(EngineError::UndefinedName(_))
        ));
        assert!(matches!(
            scope.get_global("missing"),
            Err(EngineError::UndefinedName(_))
        ));
    }

    #[test]
    fn reserved_names() {
        assert!(is_reserved("global"));
        assert!(is_reserved("result"));
        assert!(!is_reserved("users"));
    }
}
