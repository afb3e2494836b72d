//! Per-batch variable symbol table

use indexmap::IndexMap;

use crate::types::SqlType;

/// A declared variable or parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Name as written at the declaration
    pub name: String,
    pub sql_type: SqlType,
    /// Line of the declaration
    pub line: u64,
    pub referenced: bool,
}

/// Case-insensitive variable table, in declaration order
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable. A redeclaration replaces the earlier symbol.
    pub fn declare(&mut self, name: &str, sql_type: SqlType, line: u64) {
        tracing::trace!(name, line, "declare {}", sql_type);
        let symbol = Symbol {
            name: name.to_string(),
            sql_type,
            line,
            referenced: false,
        };
        let key = name.to_lowercase();
        // Keep the original position so unused reports stay in declaration order
        self.symbols.insert(key, symbol);
    }

    /// Mark `name` as used. Returns false if it was never declared.
    pub fn try_reference(&mut self, name: &str) -> bool {
        match self.symbols.get_mut(&name.to_lowercase()) {
            Some(symbol) => {
                symbol.referenced = true;
                true
            }
            None => false,
        }
    }

    pub fn type_of(&self, name: &str) -> Option<&SqlType> {
        self.symbols
            .get(&name.to_lowercase())
            .map(|symbol| &symbol.sql_type)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(&name.to_lowercase())
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
    }

    /// Symbols that were declared and never referenced
    pub fn unreferenced(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values().filter(|symbol| !symbol.referenced)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
