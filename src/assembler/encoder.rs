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

//! Bit-level encoding of 10-bit machine words.
//!
//! Instruction word layout: opcode in bits 6..9, source mode ordinal in
//! 4..5, destination mode ordinal in 2..3, ARE tag in 0..1. Operand words
//! put their payload above the ARE bits; register pairs and matrix index
//! pairs pack two registers into bits 6..9 and 2..5 of a single word.

use crate::assembler::instruction_table::InstructionInfo;
use crate::assembler::symbol_table::{SymbolKind, SymbolTable};
use crate::ast::{AddressingMode, Operand, Register};
use crate::errors::AssemblyError;

/// Mask for one 10-bit machine word.
pub const WORD_MASK: u16 = 0x3FF;

const OPCODE_SHIFT: u16 = 6;
const SRC_MODE_SHIFT: u16 = 4;
const DST_MODE_SHIFT: u16 = 2;
const PAYLOAD_SHIFT: u16 = 2;
const PAIR_HIGH_SHIFT: u16 = 6;
const PAIR_LOW_SHIFT: u16 = 2;

/// The A,R,E tag in bits 0..1 of every word.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Are {
    Absolute = 0b00,
    External = 0b01,
    Relocatable = 0b10,
}

/// One encoded word together with its final memory address.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub address: u16,
    pub value: u16,
}

/// A use of an external symbol: where in the instruction image the operand
/// word sits. Recorded once per use site, in order of occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalRef {
    pub symbol: String,
    pub address: u16,
}

fn operand_cost(mode: AddressingMode) -> u16 {
    match mode {
        AddressingMode::Matrix => 2,
        _ => 1,
    }
}

/// Validates the operands against the instruction table and returns the
/// number of words the instruction occupies. Wrong operand counts and
/// addressing modes outside the per-slot masks are hard errors.
pub fn instruction_size(
    info: &InstructionInfo,
    operands: &[Operand],
    line: usize,
) -> Result<u16, AssemblyError> {
    if operands.len() != info.operand_count {
        return Err(AssemblyError::SemanticError {
            line,
            reason: format!(
                "'{}' expects {} operand(s), got {}",
                info.mnemonic,
                info.operand_count,
                operands.len()
            ),
        });
    }

    match operands {
        [] => Ok(1),
        [dst] => {
            check_mode(info, dst.mode(), info.dest_modes, "destination", line)?;
            Ok(1 + operand_cost(dst.mode()))
        }
        [src, dst] => {
            check_mode(info, src.mode(), info.source_modes, "source", line)?;
            check_mode(info, dst.mode(), info.dest_modes, "destination", line)?;

            // Two register operands share a single packed word.
            if src.mode() == AddressingMode::Register && dst.mode() == AddressingMode::Register {
                Ok(2)
            } else {
                Ok(1 + operand_cost(src.mode()) + operand_cost(dst.mode()))
            }
        }
        _ => unreachable!("operand count validated above"),
    }
}

fn check_mode(
    info: &InstructionInfo,
    mode: AddressingMode,
    allowed: u8,
    slot: &str,
    line: usize,
) -> Result<(), AssemblyError> {
    if mode.mask() & allowed == 0 {
        return Err(AssemblyError::SemanticError {
            line,
            reason: format!("invalid {} addressing mode for '{}'", slot, info.mnemonic),
        });
    }
    Ok(())
}

/// Encodes a full instruction into words addressed from `current_ic`.
/// External operand uses are appended to `external_refs` at the addresses
/// of their operand words.
pub fn encode_instruction(
    info: &InstructionInfo,
    operands: &[Operand],
    symbols: &SymbolTable,
    current_ic: u16,
    external_refs: &mut Vec<ExternalRef>,
    line: usize,
) -> Result<Vec<Word>, AssemblyError> {
    let (src_mode, dst_mode) = match operands {
        [] => (None, None),
        [dst] => (None, Some(dst.mode())),
        [src, dst] => (Some(src.mode()), Some(dst.mode())),
        _ => unreachable!("operand count validated in instruction_size"),
    };

    let mut words = vec![Word {
        address: current_ic,
        value: instruction_word(info.opcode, src_mode, dst_mode),
    }];

    match operands {
        [] => {}
        [Operand::Register(src), Operand::Register(dst)] => {
            words.push(Word {
                address: current_ic + 1,
                value: register_pair_word(*src, *dst),
            });
        }
        _ => {
            for operand in operands {
                let address = current_ic + words.len() as u16;
                match operand {
                    Operand::Immediate(value) => words.push(Word {
                        address,
                        value: immediate_word(*value),
                    }),
                    Operand::Register(reg) => words.push(Word {
                        address,
                        value: single_register_word(*reg),
                    }),
                    Operand::Direct(label) => words.push(Word {
                        address,
                        value: symbol_word(label, symbols, address, external_refs, line)?,
                    }),
                    Operand::Matrix { label, row, col } => {
                        words.push(Word {
                            address,
                            value: symbol_word(label, symbols, address, external_refs, line)?,
                        });
                        words.push(Word {
                            address: address + 1,
                            value: register_pair_word(*row, *col),
                        });
                    }
                }
            }
        }
    }

    Ok(words)
}

fn instruction_word(
    opcode: u16,
    src_mode: Option<AddressingMode>,
    dst_mode: Option<AddressingMode>,
) -> u16 {
    let mut word = (opcode & 0xF) << OPCODE_SHIFT;
    if let Some(mode) = src_mode {
        word |= mode.ordinal() << SRC_MODE_SHIFT;
    }
    if let Some(mode) = dst_mode {
        word |= mode.ordinal() << DST_MODE_SHIFT;
    }
    word | Are::Absolute as u16
}

/// Immediate payload: low 8 bits of the value, two's complement.
fn immediate_word(value: i32) -> u16 {
    (((value & 0xFF) as u16) << PAYLOAD_SHIFT) | Are::Absolute as u16
}

fn single_register_word(reg: Register) -> u16 {
    ((reg.number() & 0x7) << PAYLOAD_SHIFT) | Are::Absolute as u16
}

/// Shared layout for packed register pairs and matrix index words: first
/// register in bits 6..9, second in bits 2..5.
fn register_pair_word(first: Register, second: Register) -> u16 {
    ((first.number() & 0xF) << PAIR_HIGH_SHIFT)
        | ((second.number() & 0xF) << PAIR_LOW_SHIFT)
        | Are::Absolute as u16
}

/// Resolves a label reference into an operand word. Locals carry their
/// address with the R tag; externals carry zero with the E tag and get a
/// reference recorded at the word's own address.
fn symbol_word(
    label: &str,
    symbols: &SymbolTable,
    address: u16,
    external_refs: &mut Vec<ExternalRef>,
    line: usize,
) -> Result<u16, AssemblyError> {
    let symbol = symbols.get(label).ok_or_else(|| AssemblyError::SemanticError {
        line,
        reason: format!("undefined label: {}", label),
    })?;

    if symbol.kind == SymbolKind::External {
        external_refs.push(ExternalRef {
            symbol: label.to_string(),
            address,
        });
        return Ok(Are::External as u16);
    }

    if !symbol.defined {
        return Err(AssemblyError::SemanticError {
            line,
            reason: format!("undefined label: {}", label),
        });
    }

    Ok((symbol.address << PAYLOAD_SHIFT) | Are::Relocatable as u16)
}

/// One `.data` value, truncated to the 10-bit word (two's complement for
/// negatives), ARE absolute.
pub fn data_word(value: i32) -> u16 {
    (value & WORD_MASK as i32) as u16
}

/// `.string` payload: one word per character plus a terminating zero.
pub fn string_words(text: &str) -> Vec<u16> {
    let mut words: Vec<u16> = text.chars().map(|c| c as u16).collect();
    words.push(0);
    words
}

/// `.mat` payload: row-major values padded with zeros to rows*cols.
pub fn mat_words(rows: usize, cols: usize, values: &[i32]) -> Vec<u16> {
    (0..rows * cols)
        .map(|i| values.get(i).copied().map_or(0, data_word))
        .collect()
}
