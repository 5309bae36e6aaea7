/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use crate::errors::AssemblyError;
use std::collections::HashMap;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Code,
    Data,
    External,
}

#[derive(Debug, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub address: u16,
    pub kind: SymbolKind,
    /// Named by a `.entry` directive. Stays set when a placeholder is
    /// promoted on definition.
    pub is_entry: bool,
    /// External symbols are never defined locally.
    pub defined: bool,
}

/// The symbol table stores label names with their calculated addresses.
/// Insertion order is preserved; the entries file is emitted in table
/// order and must stay deterministic.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    index: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.index.get(name).map(|&i| &self.symbols[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Defines `name` at `address`. An `.entry` placeholder is promoted in
    /// place, keeping its entry flag; anything already defined (or declared
    /// external) is a conflict.
    pub fn define(
        &mut self,
        name: &str,
        address: u16,
        kind: SymbolKind,
        line: usize,
    ) -> Result<(), AssemblyError> {
        if let Some(&i) = self.index.get(name) {
            let symbol = &mut self.symbols[i];

            if symbol.defined {
                return Err(AssemblyError::SemanticError {
                    line,
                    reason: format!("symbol already defined: {}", name),
                });
            }
            if symbol.kind == SymbolKind::External {
                return Err(AssemblyError::SemanticError {
                    line,
                    reason: format!("cannot define external symbol locally: {}", name),
                });
            }

            symbol.address = address;
            symbol.kind = kind;
            symbol.defined = true;
            return Ok(());
        }

        self.insert(Symbol {
            name: name.to_string(),
            address,
            kind,
            is_entry: false,
            defined: true,
        });
        Ok(())
    }

    /// Records a `.extern` declaration. Declaring the same name external
    /// twice is harmless; a name already defined or flagged as entry is a
    /// conflict.
    pub fn declare_external(&mut self, name: &str, line: usize) -> Result<(), AssemblyError> {
        if let Some(existing) = self.get(name) {
            if existing.defined {
                return Err(AssemblyError::SemanticError {
                    line,
                    reason: format!("symbol already defined locally: {}", name),
                });
            }
            if existing.is_entry {
                return Err(AssemblyError::SemanticError {
                    line,
                    reason: format!("symbol cannot be both entry and external: {}", name),
                });
            }
            return Ok(());
        }

        self.insert(Symbol {
            name: name.to_string(),
            address: 0,
            kind: SymbolKind::External,
            is_entry: false,
            defined: false,
        });
        Ok(())
    }

    /// Records a `.entry` declaration, creating an undefined placeholder
    /// when the name is not yet known.
    pub fn mark_entry(&mut self, name: &str, line: usize) -> Result<(), AssemblyError> {
        if let Some(&i) = self.index.get(name) {
            let symbol = &mut self.symbols[i];

            if symbol.kind == SymbolKind::External {
                return Err(AssemblyError::SemanticError {
                    line,
                    reason: format!("symbol cannot be both entry and external: {}", name),
                });
            }

            symbol.is_entry = true;
            return Ok(());
        }

        self.insert(Symbol {
            name: name.to_string(),
            address: 0,
            kind: SymbolKind::Code,
            is_entry: true,
            defined: false,
        });
        Ok(())
    }

    /// Shifts every data symbol past the instruction segment once the
    /// final instruction counter is known.
    pub fn rebase_data(&mut self, ic_final: u16) {
        for symbol in &mut self.symbols {
            if symbol.kind == SymbolKind::Data && symbol.defined {
                symbol.address += ic_final;
            }
        }
    }

    /// Entry names that never received a definition.
    pub fn undefined_entries(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.is_entry && !s.defined)
    }

    fn insert(&mut self, symbol: Symbol) {
        self.index.insert(symbol.name.clone(), self.symbols.len());
        self.symbols.push(symbol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_lookup() {
        let mut table = SymbolTable::new();
        table.define("MAIN", 100, SymbolKind::Code, 1).unwrap();

        let symbol = table.get("MAIN").unwrap();
        assert_eq!(symbol.address, 100);
        assert_eq!(symbol.kind, SymbolKind::Code);
        assert!(symbol.defined);
        assert!(!symbol.is_entry);
        assert!(table.get("OTHER").is_none());
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let mut table = SymbolTable::new();
        table.define("A", 100, SymbolKind::Code, 1).unwrap();
        assert!(table.define("A", 105, SymbolKind::Code, 2).is_err());
    }

    #[test]
    fn test_entry_placeholder_promoted() {
        let mut table = SymbolTable::new();
        table.mark_entry("MAIN", 1).unwrap();
        assert!(!table.get("MAIN").unwrap().defined);

        table.define("MAIN", 100, SymbolKind::Code, 2).unwrap();

        let symbol = table.get("MAIN").unwrap();
        assert!(symbol.defined);
        assert!(symbol.is_entry);
        assert_eq!(symbol.kind, SymbolKind::Code);
    }

    #[test]
    fn test_entry_after_definition() {
        let mut table = SymbolTable::new();
        table.define("LEN", 0, SymbolKind::Data, 1).unwrap();
        table.mark_entry("LEN", 2).unwrap();

        let symbol = table.get("LEN").unwrap();
        assert!(symbol.is_entry);
        assert_eq!(symbol.kind, SymbolKind::Data);
    }

    #[test]
    fn test_extern_conflicts() {
        let mut table = SymbolTable::new();
        table.define("A", 100, SymbolKind::Code, 1).unwrap();
        assert!(table.declare_external("A", 2).is_err());

        table.declare_external("EXT", 3).unwrap();
        table.declare_external("EXT", 4).unwrap(); // repeat declaration is fine
        assert!(table.define("EXT", 101, SymbolKind::Code, 5).is_err());
        assert!(table.mark_entry("EXT", 6).is_err());

        table.mark_entry("ENT", 7).unwrap();
        assert!(table.declare_external("ENT", 8).is_err());
    }

    #[test]
    fn test_rebase_data_moves_only_data() {
        let mut table = SymbolTable::new();
        table.define("CODE", 100, SymbolKind::Code, 1).unwrap();
        table.define("DAT", 2, SymbolKind::Data, 2).unwrap();
        table.declare_external("EXT", 3).unwrap();

        table.rebase_data(104);

        assert_eq!(table.get("CODE").unwrap().address, 100);
        assert_eq!(table.get("DAT").unwrap().address, 106);
        assert_eq!(table.get("EXT").unwrap().address, 0);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut table = SymbolTable::new();
        table.define("B", 100, SymbolKind::Code, 1).unwrap();
        table.define("A", 101, SymbolKind::Code, 2).unwrap();

        let names: Vec<&str> = table.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_undefined_entries() {
        let mut table = SymbolTable::new();
        table.mark_entry("GHOST", 1).unwrap();
        table.mark_entry("MAIN", 2).unwrap();
        table.define("MAIN", 100, SymbolKind::Code, 3).unwrap();

        let names: Vec<&str> = table.undefined_entries().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["GHOST"]);
    }
}
