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

use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Register {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

impl Register {
    pub fn number(self) -> u16 {
        self as u16
    }

    /// Parses the `rN` register syntax. Anything outside `r0`..`r7` is not
    /// a register (e.g. `r9` reads as a plain label).
    pub fn parse(s: &str) -> Option<Register> {
        match s {
            "r0" => Some(Register::R0),
            "r1" => Some(Register::R1),
            "r2" => Some(Register::R2),
            "r3" => Some(Register::R3),
            "r4" => Some(Register::R4),
            "r5" => Some(Register::R5),
            "r6" => Some(Register::R6),
            "r7" => Some(Register::R7),
            _ => None,
        }
    }
}

// Addressing modes carry two numeric views: a one-hot mask checked against
// the instruction table, and the 2-bit ordinal packed into machine words.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AddressingMode {
    Immediate,
    Direct,
    Matrix,
    Register,
}

impl AddressingMode {
    pub fn mask(self) -> u8 {
        match self {
            AddressingMode::Immediate => 1 << 0,
            AddressingMode::Direct => 1 << 1,
            AddressingMode::Matrix => 1 << 2,
            AddressingMode::Register => 1 << 3,
        }
    }

    pub fn ordinal(self) -> u16 {
        match self {
            AddressingMode::Immediate => 0,
            AddressingMode::Direct => 1,
            AddressingMode::Matrix => 2,
            AddressingMode::Register => 3,
        }
    }
}

// Represents all possible forms an operand to an instruction can take.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Immediate(i32),                                         // #5, #-3
    Direct(String),                                         // my_label
    Matrix { label: String, row: Register, col: Register }, // M[r1][r2]
    Register(Register),                                     // r0..r7
}

impl Operand {
    pub fn mode(&self) -> AddressingMode {
        match self {
            Operand::Immediate(_) => AddressingMode::Immediate,
            Operand::Direct(_) => AddressingMode::Direct,
            Operand::Matrix { .. } => AddressingMode::Matrix,
            Operand::Register(_) => AddressingMode::Register,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mnemonic {
    Mov,
    Cmp,
    Add,
    Sub,
    Lea,
    Clr,
    Not,
    Inc,
    Dec,
    Jmp,
    Bne,
    Jsr,
    Red,
    Prn,
    Rts,
    Stop,
}

impl Mnemonic {
    pub fn parse(s: &str) -> Option<Mnemonic> {
        match s {
            "mov" => Some(Mnemonic::Mov),
            "cmp" => Some(Mnemonic::Cmp),
            "add" => Some(Mnemonic::Add),
            "sub" => Some(Mnemonic::Sub),
            "lea" => Some(Mnemonic::Lea),
            "clr" => Some(Mnemonic::Clr),
            "not" => Some(Mnemonic::Not),
            "inc" => Some(Mnemonic::Inc),
            "dec" => Some(Mnemonic::Dec),
            "jmp" => Some(Mnemonic::Jmp),
            "bne" => Some(Mnemonic::Bne),
            "jsr" => Some(Mnemonic::Jsr),
            "red" => Some(Mnemonic::Red),
            "prn" => Some(Mnemonic::Prn),
            "rts" => Some(Mnemonic::Rts),
            "stop" => Some(Mnemonic::Stop),
            _ => None,
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mnemonic::Mov => "mov",
            Mnemonic::Cmp => "cmp",
            Mnemonic::Add => "add",
            Mnemonic::Sub => "sub",
            Mnemonic::Lea => "lea",
            Mnemonic::Clr => "clr",
            Mnemonic::Not => "not",
            Mnemonic::Inc => "inc",
            Mnemonic::Dec => "dec",
            Mnemonic::Jmp => "jmp",
            Mnemonic::Bne => "bne",
            Mnemonic::Jsr => "jsr",
            Mnemonic::Red => "red",
            Mnemonic::Prn => "prn",
            Mnemonic::Rts => "rts",
            Mnemonic::Stop => "stop",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Data(Vec<i32>),   // .data 7, -1
    String(String),   // .string "abc" (inner text, quotes stripped)
    Mat { rows: usize, cols: usize, values: Vec<i32> }, // .mat [2][3] 1, 2
    Extern(Vec<String>), // .extern A, B
    Entry(Vec<String>),  // .entry MAIN
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Instruction { mnemonic: Mnemonic, operands: Vec<Operand> },
    Directive(Directive),
}

// --- Assembly Line Structure ---

// One parsed line of source. Blank and comment lines never make it this
// far, so a statement is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    pub line_number: usize,
    pub label: Option<String>,
    pub statement: Statement,
}
