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

//! Base-4 letter encoding over the alphabet `a`=0, `b`=1, `c`=2, `d`=3,
//! most significant digit first. Addresses use 4 digits, machine words 5.

use crate::assembler::encoder::WORD_MASK;

const ADDRESS_DIGITS: usize = 4;
const WORD_DIGITS: usize = 5;

/// 4-digit encoding used for addresses.
pub fn address(value: u16) -> String {
    encode(value, ADDRESS_DIGITS)
}

/// 5-digit encoding used for machine words, masked to 10 bits.
pub fn word(value: u16) -> String {
    encode(value & WORD_MASK, WORD_DIGITS)
}

/// Variable-width encoding used in the object header: leading `a`s are
/// stripped but at least one digit remains.
pub fn trimmed(value: u16) -> String {
    let full = encode(value, ADDRESS_DIGITS);
    let stripped = full.trim_start_matches('a');
    if stripped.is_empty() {
        "a".to_string()
    } else {
        stripped.to_string()
    }
}

fn encode(value: u16, digits: usize) -> String {
    let mut remaining = value;
    let mut out = vec![b'a'; digits];

    // Fill from the least significant digit backwards.
    for slot in out.iter_mut().rev() {
        *slot = b'a' + (remaining % 4) as u8;
        remaining /= 4;
    }

    String::from_utf8(out).expect("alphabet is ascii")
}
