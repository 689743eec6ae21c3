use std::collections::HashMap;

use super::{SymbolId, SymbolKind};

/// Scope-local key: names of different kinds never collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolIndex {
    pub kind: SymbolKind,
    pub name: String,
}

impl SymbolIndex {
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SymbolTable {
    entries: HashMap<SymbolIndex, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: &SymbolIndex) -> Option<SymbolId> {
        self.entries.get(index).copied()
    }

    pub fn lookup(&self, kind: SymbolKind, name: &str) -> Option<SymbolId> {
        self.get(&SymbolIndex::new(kind, name))
    }

    /// Insert `index`, refusing to overwrite. On conflict the existing
    /// symbol is returned.
    pub fn set(&mut self, index: SymbolIndex, id: SymbolId) -> Result<(), SymbolId> {
        match self.entries.get(&index) {
            Some(&existing) => Err(existing),
            None => {
                self.entries.insert(index, id);
                Ok(())
            }
        }
    }

    pub fn contains(&self, index: &SymbolIndex) -> bool {
        self.entries.contains_key(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by key, for deterministic iteration.
    pub fn entries(&self) -> Vec<(&SymbolIndex, SymbolId)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(k, &v)| (k, v)).collect();
        entries.sort();
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolIdGen;

    #[test]
    fn test_kinds_are_disjoint_namespaces() {
        let mut ids = SymbolIdGen::new();
        let mut table = SymbolTable::new();
        let column = ids.fresh();
        let enum_ = ids.fresh();
        table
            .set(SymbolIndex::new(SymbolKind::Column, "status"), column)
            .unwrap();
        table
            .set(SymbolIndex::new(SymbolKind::Enum, "status"), enum_)
            .unwrap();
        assert_eq!(table.lookup(SymbolKind::Column, "status"), Some(column));
        assert_eq!(table.lookup(SymbolKind::Enum, "status"), Some(enum_));
    }

    #[test]
    fn test_set_refuses_duplicates() {
        let mut ids = SymbolIdGen::new();
        let mut table = SymbolTable::new();
        let first = ids.fresh();
        let second = ids.fresh();
        let index = SymbolIndex::new(SymbolKind::Table, "users");
        assert_eq!(table.set(index.clone(), first), Ok(()));
        assert_eq!(table.set(index, second), Err(first));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut ids = SymbolIdGen::new();
        let mut table = SymbolTable::new();
        table
            .set(SymbolIndex::new(SymbolKind::Table, "Users"), ids.fresh())
            .unwrap();
        assert_eq!(table.lookup(SymbolKind::Table, "users"), None);
    }
}
