use std::collections::HashMap;

use crate::ast::{FunctionDef, NoTypeContext, VariableDecl};
use crate::{Span, Type};

/// Name keyed table that remembers insertion order
#[derive(Debug)]
pub struct SymbolTable<S> {
    entries: Vec<(String, S)>,
    index: HashMap<String, usize>,
}

impl<S> Default for SymbolTable<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<S> SymbolTable<S> {
    /// Insert a new symbol
    ///
    /// An existing entry is kept, and returned as the error.
    pub fn insert(&mut self, name: &str, symbol: S) -> Result<(), &S> {
        if let Some(&i) = self.index.get(name) {
            return Err(&self.entries[i].1);
        }

        self.index.insert(name.to_owned(), self.entries.len());
        self.entries.push((name.to_owned(), symbol));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&S> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut S> {
        self.index.get(name).map(|&i| &mut self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Symbols in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.entries.iter().map(|(_, s)| s)
    }
}

#[derive(Debug)]
pub struct GlobalSymbol<'ast> {
    pub decl: &'ast VariableDecl<NoTypeContext>,
}

impl GlobalSymbol<'_> {
    pub fn span(&self) -> Span {
        self.decl.name.span
    }
}

#[derive(Debug)]
pub struct FunctionSymbol<'ast> {
    pub def: &'ast FunctionDef<NoTypeContext>,
    pub params: Vec<Type>,

    /// Fixed from the start when declared, otherwise once the body is analyzed
    pub return_type: Option<Type>,
}

impl<'ast> FunctionSymbol<'ast> {
    pub fn new(def: &'ast FunctionDef<NoTypeContext>) -> Self {
        Self {
            def,
            params: def.params.iter().map(|p| p.typ.typ).collect(),
            return_type: def.declared_return.map(|t| t.typ),
        }
    }

    pub fn span(&self) -> Span {
        self.def.name.span
    }
}

/// What the scope stack knows about a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub span: Span,

    /// `None` when the type could not be determined, an error was already reported then
    pub typ: Option<Type>,
}
