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

use crate::assembler::encoder::ExternalRef;
use crate::assembler::symbol_table::SymbolTable;
use crate::assembler::{IC_START, MemoryImage, base4};
use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// The four artifacts an assembled translation unit can produce.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// Macro-expanded source (`.am`).
    Expanded,
    /// Object code (`.ob`).
    Object,
    /// Entry symbols (`.ent`).
    Entries,
    /// External references (`.ext`).
    Externals,
}

impl OutputKind {
    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::Expanded => "am",
            OutputKind::Object => "ob",
            OutputKind::Entries => "ent",
            OutputKind::Externals => "ext",
        }
    }
}

pub trait OutputWriter {
    fn write(&mut self, kind: OutputKind, contents: &str) -> Result<()>;
}

// production writer: <base>.<ext> next to the source file
pub struct FileOutputWriter {
    base: PathBuf,
}

impl FileOutputWriter {
    /// `base` is the source path with its extension removed.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl OutputWriter for FileOutputWriter {
    fn write(&mut self, kind: OutputKind, contents: &str) -> Result<()> {
        let path = self.base.with_extension(kind.extension());
        fs::write(&path, contents)
            .map_err(|e| anyhow::anyhow!("cannot write file '{}': {}", path.display(), e))
    }
}

// mock writer for testing
#[derive(Default)]
pub struct MockOutputWriter {
    files: HashMap<OutputKind, String>,
}

impl MockOutputWriter {
    pub fn get(&self, kind: OutputKind) -> Option<&str> {
        self.files.get(&kind).map(String::as_str)
    }
}

impl OutputWriter for MockOutputWriter {
    fn write(&mut self, kind: OutputKind, contents: &str) -> Result<()> {
        self.files.insert(kind, contents.to_string());
        Ok(())
    }
}

/// Object file text: a header with the instruction and data word counts
/// (trimmed base-4), then one `ADDRESS WORD` line per word, instructions
/// first, data right behind them.
pub fn render_object(image: &MemoryImage) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} {}\n",
        base4::trimmed(image.instruction_count()),
        base4::trimmed(image.data_count())
    ));

    for word in &image.instructions {
        out.push_str(&format!(
            "{} {}\n",
            base4::address(word.address),
            base4::word(word.value)
        ));
    }

    let data_start = IC_START + image.instruction_count();
    for (i, &value) in image.data.iter().enumerate() {
        out.push_str(&format!(
            "{} {}\n",
            base4::address(data_start + i as u16),
            base4::word(value)
        ));
    }

    out
}

/// Entries file text in symbol-table order, or `None` when the unit
/// defines no entry symbols (the file is then not produced at all).
pub fn render_entries(symbols: &SymbolTable) -> Option<String> {
    let mut out = String::new();

    for symbol in symbols.iter() {
        if symbol.is_entry && symbol.defined {
            out.push_str(&format!("{} {}\n", symbol.name, base4::address(symbol.address)));
        }
    }

    if out.is_empty() { None } else { Some(out) }
}

/// Externals file text, one line per use site in order of occurrence, or
/// `None` when nothing external was referenced.
pub fn render_externals(external_refs: &[ExternalRef]) -> Option<String> {
    if external_refs.is_empty() {
        return None;
    }

    let mut out = String::new();
    for reference in external_refs {
        out.push_str(&format!(
            "{} {}\n",
            reference.symbol,
            base4::address(reference.address)
        ));
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::encoder::Word;
    use crate::assembler::symbol_table::SymbolKind;

    #[test]
    fn test_render_object_trivial() {
        let image = MemoryImage {
            instructions: vec![Word { address: 100, value: 960 }],
            data: vec![],
            ic_final: 101,
            dc_final: 0,
        };
        assert_eq!(render_object(&image), "b a\nbcba ddaaa\n");
    }

    #[test]
    fn test_render_object_places_data_after_instructions() {
        let image = MemoryImage {
            instructions: vec![
                Word { address: 100, value: 60 },
                Word { address: 101, value: 72 },
            ],
            data: vec![7, 0x3FF],
            ic_final: 102,
            dc_final: 2,
        };

        let text = render_object(&image);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "c c");
        assert!(lines[3].starts_with("bcbc ")); // 102
        assert!(lines[4].starts_with("bcbd ")); // 103
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_render_entries_skips_non_entries() {
        let mut symbols = SymbolTable::new();
        symbols.define("MAIN", 100, SymbolKind::Code, 1).unwrap();
        symbols.mark_entry("MAIN", 2).unwrap();
        symbols.define("OTHER", 101, SymbolKind::Code, 3).unwrap();

        assert_eq!(render_entries(&symbols).unwrap(), "MAIN bcba\n");
    }

    #[test]
    fn test_render_entries_absent_when_none() {
        let mut symbols = SymbolTable::new();
        symbols.define("MAIN", 100, SymbolKind::Code, 1).unwrap();
        assert_eq!(render_entries(&symbols), None);
    }

    #[test]
    fn test_render_externals_one_line_per_use() {
        let refs = vec![
            ExternalRef { symbol: "EXT1".to_string(), address: 101 },
            ExternalRef { symbol: "EXT1".to_string(), address: 103 },
        ];
        assert_eq!(
            render_externals(&refs).unwrap(),
            "EXT1 bcbb\nEXT1 bcbd\n"
        );
        assert_eq!(render_externals(&[]), None);
    }

    #[test]
    fn test_mock_writer_captures_output() {
        let mut writer = MockOutputWriter::default();
        writer.write(OutputKind::Object, "b a\n").unwrap();
        assert_eq!(writer.get(OutputKind::Object), Some("b a\n"));
        assert_eq!(writer.get(OutputKind::Entries), None);
    }
}
