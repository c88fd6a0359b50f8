use std::collections::HashMap;

/// A stack of lexical scopes mapping names to `V`
///
/// Lookups walk from the innermost scope outwards and return the first match,
/// so inner declarations shadow outer ones.
#[derive(Debug, Clone)]
pub struct ScopeStack<V> {
    scopes: Vec<HashMap<String, V>>,
}

impl<V> Default for ScopeStack<V> {
    fn default() -> Self {
        Self { scopes: Vec::new() }
    }
}

impl<V> ScopeStack<V> {
    /// A stack holding a single (outermost) scope
    pub fn new() -> Self {
        let mut stack = Self::default();
        stack.enter_scope();
        stack
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn leave_scope(&mut self) {
        self.scopes.pop();
    }

    /// Bind `name` in the innermost scope, returning the previous binding of that scope
    pub fn add_to_scope(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        match self.scopes.last_mut() {
            Some(scope) => scope.insert(name.into(), value),
            None => {
                self.scopes.push(HashMap::from([(name.into(), value)]));
                None
            }
        }
    }

    /// Look `name` up, innermost scope first
    pub fn lookup(&self, name: &str) -> Option<&V> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Look `name` up in the innermost scope only
    pub fn lookup_current(&self, name: &str) -> Option<&V> {
        self.scopes.last().and_then(|scope| scope.get(name))
    }

    /// Look `name` up in every scope except the innermost one
    pub fn lookup_enclosing(&self, name: &str) -> Option<&V> {
        let outer = self.scopes.len().saturating_sub(1);
        self.scopes[..outer]
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_after_add_returns_binding() {
        let mut scopes = ScopeStack::new();
        scopes.add_to_scope("x", 1);
        assert_eq!(scopes.lookup("x"), Some(&1));
        assert_eq!(scopes.lookup_current("x"), Some(&1));
    }

    #[test]
    fn leaving_scope_falls_back_to_outer_binding() {
        let mut scopes = ScopeStack::new();
        scopes.add_to_scope("x", 1);

        scopes.enter_scope();
        scopes.add_to_scope("x", 2);
        assert_eq!(scopes.lookup("x"), Some(&2));
        assert_eq!(scopes.lookup_enclosing("x"), Some(&1));

        scopes.leave_scope();
        assert_eq!(scopes.lookup("x"), Some(&1));
    }

    #[test]
    fn leaving_scope_forgets_inner_names() {
        let mut scopes = ScopeStack::new();
        scopes.enter_scope();
        scopes.add_to_scope("y", 'y');
        scopes.leave_scope();
        assert_eq!(scopes.lookup("y"), None);
    }

    #[test]
    fn current_scope_ignores_outer_bindings() {
        let mut scopes = ScopeStack::new();
        scopes.add_to_scope("x", 1);
        scopes.enter_scope();
        assert_eq!(scopes.lookup_current("x"), None);
        assert_eq!(scopes.lookup_enclosing("x"), Some(&1));
    }
}
