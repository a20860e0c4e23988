//! Filters deciding which symbols take part in a planning run.

use serde::{Deserialize, Serialize};

use crate::model::{Symbol, SymbolKind};

/// A symbol is in scope when its kind is listed and its path does not start
/// with any excluded prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeFilter {
    pub kinds: Vec<SymbolKind>,
    pub exclude_prefixes: Vec<String>,
    /// Drop reference rows into the N most referenced symbols. `0` keeps all.
    pub exclude_top_referenced: usize,
}

impl Default for ScopeFilter {
    fn default() -> Self {
        ScopeFilter {
            kinds: vec![SymbolKind::Function, SymbolKind::Struct, SymbolKind::Variable],
            exclude_prefixes: vec!["contrib/".to_string()],
            exclude_top_referenced: 0,
        }
    }
}

impl ScopeFilter {
    /// Accept every symbol, classified or not.
    pub fn everything() -> Self {
        ScopeFilter {
            kinds: SymbolKind::ALL.to_vec(),
            exclude_prefixes: Vec::new(),
            exclude_top_referenced: 0,
        }
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        let kind = symbol.kind.unwrap_or(SymbolKind::Unknown);
        if !self.kinds.contains(&kind) {
            return false;
        }
        let path = symbol.file_path.to_string_lossy();
        !self
            .exclude_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// The in-scope subset, in the input order.
    pub fn select<'a>(&self, symbols: &'a [Symbol]) -> Vec<&'a Symbol> {
        symbols.iter().filter(|s| self.contains(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(path: &str, kind: Option<SymbolKind>) -> Symbol {
        let mut s = Symbol::new(1, "x", path, 1);
        s.kind = kind;
        s
    }

    #[test]
    fn default_scope_keeps_functions_structs_variables() {
        let scope = ScopeFilter::default();
        assert!(scope.contains(&symbol("src/a.c", Some(SymbolKind::Function))));
        assert!(scope.contains(&symbol("src/a.c", Some(SymbolKind::Variable))));
        assert!(!scope.contains(&symbol("src/a.c", Some(SymbolKind::ConstantMacro))));
        assert!(!scope.contains(&symbol("src/a.c", None)));
    }

    #[test]
    fn excluded_prefixes_are_dropped() {
        let scope = ScopeFilter::default();
        assert!(!scope.contains(&symbol("contrib/x/a.c", Some(SymbolKind::Function))));
        assert!(scope.contains(&symbol("src/contrib/a.c", Some(SymbolKind::Function))));
    }

    #[test]
    fn unclassified_symbols_count_as_unknown() {
        assert!(ScopeFilter::everything().contains(&symbol("a.c", None)));
    }
}
