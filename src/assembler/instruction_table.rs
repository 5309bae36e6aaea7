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

use crate::ast::Mnemonic;

// Addressing mode masks, mirroring AddressingMode::mask().
const IMM: u8 = 1 << 0;
const DIR: u8 = 1 << 1;
const MAT: u8 = 1 << 2;
const REG: u8 = 1 << 3;
const NONE: u8 = 0;

#[derive(Debug, Clone, Copy)]
pub struct InstructionInfo {
    pub mnemonic: Mnemonic,
    pub opcode: u16,
    pub operand_count: usize,
    /// Permitted source addressing modes (bit mask), 0 for <2 operands.
    pub source_modes: u8,
    /// Permitted destination addressing modes (bit mask), 0 for 0 operands.
    pub dest_modes: u8,
}

/// Instruction table containing all supported commands with their
/// properties. `lea` only accepts a register destination; the jumps take
/// neither immediates nor registers; `prn` is the one instruction that
/// prints an immediate.
pub const INSTRUCTION_TABLE: [InstructionInfo; 16] = [
    InstructionInfo { mnemonic: Mnemonic::Mov, opcode: 0, operand_count: 2, source_modes: IMM | DIR | MAT | REG, dest_modes: DIR | MAT | REG },
    InstructionInfo { mnemonic: Mnemonic::Cmp, opcode: 1, operand_count: 2, source_modes: IMM | DIR | MAT | REG, dest_modes: IMM | DIR | MAT | REG },
    InstructionInfo { mnemonic: Mnemonic::Add, opcode: 2, operand_count: 2, source_modes: IMM | DIR | MAT | REG, dest_modes: DIR | MAT | REG },
    InstructionInfo { mnemonic: Mnemonic::Sub, opcode: 3, operand_count: 2, source_modes: IMM | DIR | MAT | REG, dest_modes: DIR | MAT | REG },
    InstructionInfo { mnemonic: Mnemonic::Lea, opcode: 4, operand_count: 2, source_modes: DIR | MAT, dest_modes: REG },
    InstructionInfo { mnemonic: Mnemonic::Clr, opcode: 5, operand_count: 1, source_modes: NONE, dest_modes: DIR | MAT | REG },
    InstructionInfo { mnemonic: Mnemonic::Not, opcode: 6, operand_count: 1, source_modes: NONE, dest_modes: DIR | MAT | REG },
    InstructionInfo { mnemonic: Mnemonic::Inc, opcode: 7, operand_count: 1, source_modes: NONE, dest_modes: DIR | MAT | REG },
    InstructionInfo { mnemonic: Mnemonic::Dec, opcode: 8, operand_count: 1, source_modes: NONE, dest_modes: DIR | MAT | REG },
    InstructionInfo { mnemonic: Mnemonic::Jmp, opcode: 9, operand_count: 1, source_modes: NONE, dest_modes: DIR | MAT },
    InstructionInfo { mnemonic: Mnemonic::Bne, opcode: 10, operand_count: 1, source_modes: NONE, dest_modes: DIR | MAT },
    InstructionInfo { mnemonic: Mnemonic::Jsr, opcode: 11, operand_count: 1, source_modes: NONE, dest_modes: DIR | MAT },
    InstructionInfo { mnemonic: Mnemonic::Red, opcode: 12, operand_count: 1, source_modes: NONE, dest_modes: DIR | MAT | REG },
    InstructionInfo { mnemonic: Mnemonic::Prn, opcode: 13, operand_count: 1, source_modes: NONE, dest_modes: IMM | DIR | MAT | REG },
    InstructionInfo { mnemonic: Mnemonic::Rts, opcode: 14, operand_count: 0, source_modes: NONE, dest_modes: NONE },
    InstructionInfo { mnemonic: Mnemonic::Stop, opcode: 15, operand_count: 0, source_modes: NONE, dest_modes: NONE },
];

/// Retrieves instruction data by mnemonic. A linear scan over 16 entries
/// is plenty.
pub fn lookup(mnemonic: Mnemonic) -> &'static InstructionInfo {
    INSTRUCTION_TABLE
        .iter()
        .find(|info| info.mnemonic == mnemonic)
        .expect("every mnemonic has a table entry")
}
