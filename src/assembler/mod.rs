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

pub mod base4;
pub mod encoder;
pub mod instruction_table;
pub mod preprocessor;
pub mod symbol_table;

use crate::ast::{Directive, SourceLine, Statement};
use crate::errors::{AssemblyError, Diagnostics};
use encoder::{ExternalRef, Word};
use symbol_table::{SymbolKind, SymbolTable};

/// First address of the instruction segment.
pub const IC_START: u16 = 100;

/// Highest address a 4-digit base-4 string can carry.
const MAX_ADDRESS: u16 = 255;

#[derive(Debug)]
pub struct FirstPassResult {
    pub symbols: SymbolTable,
    pub ic_final: u16,
    pub dc_final: u16,
}

/// The memory image built by the second pass: instruction words starting
/// at IC_START, data words placed immediately after them.
#[derive(Debug)]
pub struct MemoryImage {
    pub instructions: Vec<Word>,
    pub data: Vec<u16>,
    pub ic_final: u16,
    pub dc_final: u16,
}

impl MemoryImage {
    pub fn instruction_count(&self) -> u16 {
        self.ic_final - IC_START
    }

    pub fn data_count(&self) -> u16 {
        self.dc_final
    }
}

/// Pass 1: walk the parsed lines, assign addresses to labels (code labels
/// at IC, data labels at DC) and record `.extern` / `.entry` declarations.
/// Every error is reported and scanning continues; the caller checks the
/// diagnostics before trusting the result. On a clean pass, data symbols
/// are rebased past the instruction segment.
pub fn first_pass(lines: &[SourceLine], diagnostics: &mut Diagnostics) -> FirstPassResult {
    let mut symbols = SymbolTable::new();
    let mut ic: u16 = IC_START;
    let mut dc: u16 = 0;

    for line in lines {
        match &line.statement {
            Statement::Directive(directive) => match directive {
                Directive::Data(values) => {
                    define_data_label(&mut symbols, line, dc, diagnostics);
                    dc = dc.saturating_add(values.len() as u16);
                }
                Directive::String(text) => {
                    define_data_label(&mut symbols, line, dc, diagnostics);
                    // one word per character plus the terminating zero
                    dc = dc.saturating_add(text.chars().count() as u16 + 1);
                }
                Directive::Mat { rows, cols, values } => {
                    let total = rows * cols;
                    if total > usize::from(MAX_ADDRESS) + 1 {
                        diagnostics.report(AssemblyError::SemanticError {
                            line: line.line_number,
                            reason: format!("matrix of {} words exceeds machine memory", total),
                        });
                        continue;
                    }
                    if !values.is_empty() && values.len() != total {
                        diagnostics.report(AssemblyError::SemanticError {
                            line: line.line_number,
                            reason: format!(
                                "matrix expects 0 or {} values, got {}",
                                total,
                                values.len()
                            ),
                        });
                        continue;
                    }
                    define_data_label(&mut symbols, line, dc, diagnostics);
                    dc = dc.saturating_add(total as u16);
                }
                // A label on a .extern or .entry line is accepted and
                // ignored.
                Directive::Extern(names) => {
                    for name in names {
                        if let Err(error) = symbols.declare_external(name, line.line_number) {
                            diagnostics.report(error);
                        }
                    }
                }
                Directive::Entry(names) => {
                    for name in names {
                        if let Err(error) = symbols.mark_entry(name, line.line_number) {
                            diagnostics.report(error);
                        }
                    }
                }
            },
            Statement::Instruction { mnemonic, operands } => {
                let info = instruction_table::lookup(*mnemonic);
                match encoder::instruction_size(info, operands, line.line_number) {
                    Ok(words) => {
                        if let Some(label) = &line.label {
                            if let Err(error) =
                                symbols.define(label, ic, SymbolKind::Code, line.line_number)
                            {
                                diagnostics.report(error);
                            }
                        }
                        ic = ic.saturating_add(words);
                    }
                    Err(error) => diagnostics.report(error),
                }
            }
        }
    }

    if !diagnostics.has_errors() {
        let missing: Vec<String> = symbols
            .undefined_entries()
            .map(|s| s.name.clone())
            .collect();
        for name in missing {
            diagnostics.report(AssemblyError::SemanticErrorNoLine {
                reason: format!("entry symbol '{}' is never defined", name),
            });
        }
    }

    if !diagnostics.has_errors() {
        let total_words = u32::from(ic - IC_START) + u32::from(dc);
        if u32::from(IC_START) + total_words > u32::from(MAX_ADDRESS) + 1 {
            diagnostics.report(AssemblyError::SemanticErrorNoLine {
                reason: format!(
                    "program needs {} words but only {} fit in memory",
                    total_words,
                    MAX_ADDRESS + 1 - IC_START
                ),
            });
        } else {
            symbols.rebase_data(ic);
        }
    }

    FirstPassResult {
        symbols,
        ic_final: ic,
        dc_final: dc,
    }
}

fn define_data_label(
    symbols: &mut SymbolTable,
    line: &SourceLine,
    dc: u16,
    diagnostics: &mut Diagnostics,
) {
    if let Some(label) = &line.label {
        if let Err(error) = symbols.define(label, dc, SymbolKind::Data, line.line_number) {
            diagnostics.report(error);
        }
    }
}

/// Pass 2: re-walk the parsed lines and emit bit-packed words. The
/// instruction walk resolves operands (recording external references);
/// the data walk then appends the data segment.
pub fn second_pass(
    lines: &[SourceLine],
    symbols: &SymbolTable,
    ic_final: u16,
    dc_final: u16,
    diagnostics: &mut Diagnostics,
) -> (MemoryImage, Vec<ExternalRef>) {
    let mut image = MemoryImage {
        instructions: Vec::with_capacity((ic_final - IC_START) as usize),
        data: Vec::with_capacity(dc_final as usize),
        ic_final,
        dc_final,
    };
    let mut external_refs = Vec::new();
    let mut current_ic = IC_START;

    // Instruction walk.
    for line in lines {
        let Statement::Instruction { mnemonic, operands } = &line.statement else {
            continue;
        };

        let info = instruction_table::lookup(*mnemonic);
        let size = match encoder::instruction_size(info, operands, line.line_number) {
            Ok(size) => size,
            // Already reported by the first pass; nothing to emit.
            Err(_) => continue,
        };

        match encoder::encode_instruction(
            info,
            operands,
            symbols,
            current_ic,
            &mut external_refs,
            line.line_number,
        ) {
            Ok(words) => image.instructions.extend(words),
            Err(error) => diagnostics.report(error),
        }

        // Advance even on failure so later addresses stay correct.
        current_ic += size;
    }

    // Data walk.
    for line in lines {
        let Statement::Directive(directive) = &line.statement else {
            continue;
        };

        match directive {
            Directive::Data(values) => {
                image.data.extend(values.iter().map(|&v| encoder::data_word(v)));
            }
            Directive::String(text) => image.data.extend(encoder::string_words(text)),
            Directive::Mat { rows, cols, values } => {
                image.data.extend(encoder::mat_words(*rows, *cols, values));
            }
            Directive::Extern(_) | Directive::Entry(_) => {}
        }
    }

    (image, external_refs)
}
