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

//! Macro pre-processor. Two linear scans over the buffered source: the
//! first collects `mcro NAME` .. `mcroend` definitions, the second splices
//! bodies into call sites and suppresses the definitions themselves.

use crate::ast::{Mnemonic, Register};
use crate::errors::AssemblyError;
use crate::parser::MAX_LABEL_LENGTH;
use std::collections::HashMap;

const MCRO_KEYWORD: &str = "mcro";
const MCROEND_KEYWORD: &str = "mcroend";

/// Upper bound on a single macro body, in characters.
pub const MAX_MACRO_BODY: usize = 1000;

/// Expands all macros in `source`, returning the rewritten source text.
/// Fails on the first structural problem (macros are all-or-nothing; the
/// later passes never see a partially expanded file).
pub fn expand_macros(source: &str) -> Result<String, AssemblyError> {
    let macros = collect_macros(source)?;
    Ok(emit_expanded(source, &macros))
}

fn first_token(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

fn is_macro_end(line: &str) -> bool {
    line.trim() == MCROEND_KEYWORD
}

fn collect_macros(source: &str) -> Result<HashMap<String, String>, AssemblyError> {
    let mut macros: HashMap<String, String> = HashMap::new();
    let mut current: Option<(String, String)> = None;
    let mut current_start = 0;

    for (index, line) in source.lines().enumerate() {
        let line_number = index + 1;

        if is_macro_end(line) {
            match current.take() {
                Some((name, body)) => {
                    macros.insert(name, body);
                }
                // A stray `mcroend` outside any definition is dropped in
                // the emission scan; nothing to collect here.
                None => {}
            }
            continue;
        }

        if first_token(line) == Some(MCRO_KEYWORD) {
            if current.is_some() {
                return Err(AssemblyError::MacroError {
                    line: line_number,
                    reason: "nested macro definitions are not allowed".to_string(),
                });
            }

            let name = parse_macro_name(line, line_number, &macros)?;
            current = Some((name, String::new()));
            current_start = line_number;
            continue;
        }

        if let Some((name, body)) = current.as_mut() {
            body.push_str(line);
            body.push('\n');
            if body.len() > MAX_MACRO_BODY {
                return Err(AssemblyError::MacroError {
                    line: line_number,
                    reason: format!(
                        "macro '{}' exceeds maximum body size of {} characters",
                        name, MAX_MACRO_BODY
                    ),
                });
            }
        }
    }

    if let Some((name, _)) = current {
        return Err(AssemblyError::MacroError {
            line: current_start,
            reason: format!("macro '{}' is missing its mcroend", name),
        });
    }

    Ok(macros)
}

fn emit_expanded(source: &str, macros: &HashMap<String, String>) -> String {
    let mut out = String::new();
    let mut inside_definition = false;

    for line in source.lines() {
        if first_token(line) == Some(MCRO_KEYWORD) {
            inside_definition = true;
            continue;
        }
        if is_macro_end(line) {
            inside_definition = false;
            continue;
        }
        if inside_definition {
            continue;
        }

        // A call is a line whose first token names a macro; the body
        // replaces the whole line.
        match first_token(line).and_then(|token| macros.get(token)) {
            Some(body) => out.push_str(body),
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    out
}

fn parse_macro_name(
    line: &str,
    line_number: usize,
    macros: &HashMap<String, String>,
) -> Result<String, AssemblyError> {
    let mut tokens = line.split_whitespace();
    tokens.next(); // the mcro keyword

    let name = tokens.next().ok_or_else(|| AssemblyError::MacroError {
        line: line_number,
        reason: "missing macro name".to_string(),
    })?;

    if tokens.next().is_some() {
        return Err(AssemblyError::MacroError {
            line: line_number,
            reason: format!("unexpected text after macro name '{}'", name),
        });
    }

    validate_macro_name(name, line_number, macros)?;
    Ok(name.to_string())
}

/// Macro names follow the label rules, with underscore also permitted,
/// and must not duplicate an existing macro.
fn validate_macro_name(
    name: &str,
    line_number: usize,
    macros: &HashMap<String, String>,
) -> Result<(), AssemblyError> {
    let mut chars = name.chars();
    let valid_shape = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid_shape || name.len() > MAX_LABEL_LENGTH {
        return Err(AssemblyError::MacroError {
            line: line_number,
            reason: format!("invalid macro name '{}'", name),
        });
    }

    if Mnemonic::parse(name).is_some() || Register::parse(name).is_some() {
        return Err(AssemblyError::MacroError {
            line: line_number,
            reason: format!("invalid macro name '{}': reserved word", name),
        });
    }

    if macros.contains_key(name) {
        return Err(AssemblyError::MacroError {
            line: line_number,
            reason: format!("macro already defined: {}", name),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_macros_passes_through() {
        let source = "MAIN: mov #1, r1\nstop\n";
        assert_eq!(expand_macros(source).unwrap(), source);
    }

    #[test]
    fn test_definition_suppressed_and_call_expanded() {
        let source = "mcro setup\nmov #1, r1\nmov #2, r2\nmcroend\nsetup\nstop\n";
        let expanded = expand_macros(source).unwrap();
        assert_eq!(expanded, "mov #1, r1\nmov #2, r2\nstop\n");
    }

    #[test]
    fn test_call_expands_at_every_site() {
        let source = "mcro m_1\ninc r1\nmcroend\nm_1\nstop\nm_1\n";
        let expanded = expand_macros(source).unwrap();
        assert_eq!(expanded, "inc r1\nstop\ninc r1\n");
    }

    #[test]
    fn test_call_line_trailing_tokens_discarded() {
        let source = "mcro m\ninc r1\nmcroend\nm ignored tokens\n";
        assert_eq!(expand_macros(source).unwrap(), "inc r1\n");
    }

    #[test]
    fn test_missing_mcroend() {
        let source = "mcro m\ninc r1\n";
        let err = expand_macros(source).unwrap_err();
        assert!(matches!(err, AssemblyError::MacroError { line: 1, .. }));
    }

    #[test]
    fn test_duplicate_macro_name() {
        let source = "mcro m\ninc r1\nmcroend\nmcro m\ndec r1\nmcroend\n";
        assert!(expand_macros(source).is_err());
    }

    #[test]
    fn test_reserved_macro_names_rejected() {
        assert!(expand_macros("mcro mov\ninc r1\nmcroend\n").is_err());
        assert!(expand_macros("mcro r3\ninc r1\nmcroend\n").is_err());
        assert!(expand_macros("mcro 1up\ninc r1\nmcroend\n").is_err());
    }

    #[test]
    fn test_nested_definition_rejected() {
        let source = "mcro outer\nmcro inner\nmcroend\nmcroend\n";
        assert!(expand_macros(source).is_err());
    }

    #[test]
    fn test_stray_mcroend_suppressed() {
        let source = "stop\nmcroend\nrts\n";
        assert_eq!(expand_macros(source).unwrap(), "stop\nrts\n");
    }

    #[test]
    fn test_body_size_cap() {
        let mut source = String::from("mcro big\n");
        for _ in 0..200 {
            source.push_str("mov #1, r1\n");
        }
        source.push_str("mcroend\n");
        assert!(expand_macros(&source).is_err());
    }
}
