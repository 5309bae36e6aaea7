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

use crate::ast::*;
use crate::errors::{AssemblyError, Diagnostics};
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

/// Maximum number of printable characters on one source line.
pub const MAX_LINE_LENGTH: usize = 80;

/// Maximum length of a label or macro name.
pub const MAX_LABEL_LENGTH: usize = 30;

// Derive the parser from our grammar file.
#[derive(Parser)]
#[grammar = "./grammar.pest"]
pub struct TenasmParser;

/// Parses the whole (macro-expanded) source, one line at a time. Bad lines
/// are reported and skipped so that every error in the file surfaces in a
/// single run; the caller checks the diagnostics before moving on.
pub fn parse_source(source: &str, diagnostics: &mut Diagnostics) -> Vec<SourceLine> {
    let mut lines = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line_number = index + 1;
        match parse_line(raw, line_number) {
            Ok(Some(line)) => lines.push(line),
            Ok(None) => {}
            Err(error) => diagnostics.report(error),
        }
    }

    lines
}

/// Parses a single physical line. Blank and comment lines yield `None`.
pub fn parse_line(raw: &str, line_number: usize) -> Result<Option<SourceLine>, AssemblyError> {
    let line = raw.strip_suffix('\r').unwrap_or(raw);

    if line.chars().count() > MAX_LINE_LENGTH {
        return Err(AssemblyError::SyntaxError {
            line: line_number,
            reason: format!("line exceeds maximum length of {} characters", MAX_LINE_LENGTH),
        });
    }

    if line.chars().any(|c| c != '\t' && (!c.is_ascii() || c.is_ascii_control())) {
        return Err(AssemblyError::SyntaxError {
            line: line_number,
            reason: "line contains non-printable characters".to_string(),
        });
    }

    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(';') {
        return Ok(None);
    }

    let mut pairs =
        TenasmParser::parse(Rule::line, line).map_err(|e| AssemblyError::SyntaxError {
            line: line_number,
            reason: e.variant.message().to_string(),
        })?;

    let statement_pair = pairs
        .next()
        .expect("line rule always produces a pair")
        .into_inner()
        .find(|p| p.as_rule() == Rule::statement)
        .expect("parsed line always contains a statement");

    let mut label = None;
    let mut statement = None;

    for pair in statement_pair.into_inner() {
        match pair.as_rule() {
            Rule::label_decl => {
                let name = pair.into_inner().next().unwrap().as_str();
                validate_label(name, line_number)?;
                label = Some(name.to_string());
            }
            Rule::directive => {
                statement = Some(Statement::Directive(build_directive(pair, line_number)?));
            }
            Rule::instruction => {
                statement = Some(build_instruction(pair, line_number)?);
            }
            _ => {}
        }
    }

    Ok(Some(SourceLine {
        line_number,
        label,
        statement: statement.expect("statement rule matched either arm"),
    }))
}

/// Label rules beyond what the grammar enforces: bounded length, and the
/// name must not collide with a mnemonic or a register.
pub fn validate_label(name: &str, line_number: usize) -> Result<(), AssemblyError> {
    if name.len() > MAX_LABEL_LENGTH {
        return Err(AssemblyError::SyntaxError {
            line: line_number,
            reason: format!(
                "label '{}' exceeds maximum length of {} characters",
                name, MAX_LABEL_LENGTH
            ),
        });
    }

    if Mnemonic::parse(name).is_some() || Register::parse(name).is_some() {
        return Err(AssemblyError::SyntaxError {
            line: line_number,
            reason: format!("invalid label '{}': reserved word", name),
        });
    }

    Ok(())
}

fn build_directive(pair: Pair<Rule>, line_number: usize) -> Result<Directive, AssemblyError> {
    let inner = pair.into_inner().next().unwrap();

    match inner.as_rule() {
        Rule::data_dir => {
            let values = build_int_list(inner, line_number)?;
            Ok(Directive::Data(values))
        }
        Rule::string_dir => {
            let lit = inner
                .into_inner()
                .find(|p| p.as_rule() == Rule::string_lit)
                .unwrap()
                .as_str();
            // The grammar guarantees surrounding quotes.
            Ok(Directive::String(lit[1..lit.len() - 1].to_string()))
        }
        Rule::mat_dir => {
            let mut rows = 0usize;
            let mut cols = 0usize;
            let mut values = Vec::new();

            for part in inner.into_inner() {
                match part.as_rule() {
                    Rule::mat_dims => {
                        let mut dims = part.into_inner();
                        rows = parse_dimension(dims.next().unwrap().as_str(), line_number)?;
                        cols = parse_dimension(dims.next().unwrap().as_str(), line_number)?;
                    }
                    Rule::int_list => {
                        for int in part.into_inner() {
                            values.push(parse_integer(int.as_str(), line_number)?);
                        }
                    }
                    _ => {}
                }
            }

            Ok(Directive::Mat { rows, cols, values })
        }
        Rule::extern_dir => Ok(Directive::Extern(build_name_list(inner, line_number)?)),
        Rule::entry_dir => Ok(Directive::Entry(build_name_list(inner, line_number)?)),
        _ => unreachable!("Unknown directive rule: {:?}", inner.as_rule()),
    }
}

fn build_instruction(pair: Pair<Rule>, line_number: usize) -> Result<Statement, AssemblyError> {
    let mut inner = pair.into_inner();

    let mnemonic_pair = inner.next().unwrap();
    let mnemonic = Mnemonic::parse(mnemonic_pair.as_str())
        .expect("grammar only matches known mnemonics");

    let mut operands = Vec::new();
    if let Some(list) = inner.next() {
        for operand in list.into_inner() {
            operands.push(build_operand(operand, line_number)?);
        }
    }

    Ok(Statement::Instruction { mnemonic, operands })
}

fn build_operand(pair: Pair<Rule>, line_number: usize) -> Result<Operand, AssemblyError> {
    let inner = pair.into_inner().next().unwrap();

    match inner.as_rule() {
        Rule::matrix => {
            let mut parts = inner.into_inner();
            let label = parts.next().unwrap().as_str();
            validate_label(label, line_number)?;
            let row = parse_register(parts.next().unwrap().as_str());
            let col = parse_register(parts.next().unwrap().as_str());
            Ok(Operand::Matrix {
                label: label.to_string(),
                row,
                col,
            })
        }
        Rule::register => Ok(Operand::Register(parse_register(inner.as_str()))),
        Rule::immediate => {
            let value = parse_integer(&inner.as_str()[1..], line_number)?;
            Ok(Operand::Immediate(value))
        }
        Rule::symbol => Ok(Operand::Direct(inner.as_str().to_string())),
        _ => unreachable!("Unknown operand rule: {:?}", inner.as_rule()),
    }
}

fn build_int_list(pair: Pair<Rule>, line_number: usize) -> Result<Vec<i32>, AssemblyError> {
    let mut values = Vec::new();
    for part in pair.into_inner() {
        if part.as_rule() == Rule::int_list {
            for int in part.into_inner() {
                values.push(parse_integer(int.as_str(), line_number)?);
            }
        }
    }
    Ok(values)
}

fn build_name_list(pair: Pair<Rule>, line_number: usize) -> Result<Vec<String>, AssemblyError> {
    let mut names = Vec::new();
    for part in pair.into_inner() {
        if part.as_rule() == Rule::name_list {
            for ident in part.into_inner() {
                validate_label(ident.as_str(), line_number)?;
                names.push(ident.as_str().to_string());
            }
        }
    }
    Ok(names)
}

fn parse_register(s: &str) -> Register {
    Register::parse(s).expect("grammar only matches r0..r7")
}

fn parse_integer(s: &str, line_number: usize) -> Result<i32, AssemblyError> {
    s.parse::<i32>().map_err(|_| AssemblyError::SyntaxError {
        line: line_number,
        reason: format!("invalid numeric value '{}'", s),
    })
}

fn parse_dimension(s: &str, line_number: usize) -> Result<usize, AssemblyError> {
    let value = s.parse::<usize>().map_err(|_| AssemblyError::SyntaxError {
        line: line_number,
        reason: format!("invalid matrix dimension '{}'", s),
    })?;

    if value == 0 {
        return Err(AssemblyError::SyntaxError {
            line: line_number,
            reason: "matrix dimensions must be positive".to_string(),
        });
    }

    Ok(value)
}

// ------------- unit tests -------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(line: &str) -> SourceLine {
        parse_line(line, 1).unwrap().unwrap()
    }

    #[test]
    fn test_parse_no_operand_instruction() {
        let line = parse_ok("stop");
        assert_eq!(line.label, None);
        assert_eq!(
            line.statement,
            Statement::Instruction {
                mnemonic: Mnemonic::Stop,
                operands: vec![],
            }
        );
    }

    #[test]
    fn test_parse_labelled_instruction() {
        let line = parse_ok("MAIN:  mov  #5 , r1");
        assert_eq!(line.label.as_deref(), Some("MAIN"));
        assert_eq!(
            line.statement,
            Statement::Instruction {
                mnemonic: Mnemonic::Mov,
                operands: vec![Operand::Immediate(5), Operand::Register(Register::R1)],
            }
        );
    }

    #[test]
    fn test_parse_matrix_operand() {
        let line = parse_ok("mov M1[r1][r2], r3");
        assert_eq!(
            line.statement,
            Statement::Instruction {
                mnemonic: Mnemonic::Mov,
                operands: vec![
                    Operand::Matrix {
                        label: "M1".to_string(),
                        row: Register::R1,
                        col: Register::R2,
                    },
                    Operand::Register(Register::R3),
                ],
            }
        );
    }

    #[test]
    fn test_register_out_of_range_reads_as_label() {
        let line = parse_ok("jmp r9");
        assert_eq!(
            line.statement,
            Statement::Instruction {
                mnemonic: Mnemonic::Jmp,
                operands: vec![Operand::Direct("r9".to_string())],
            }
        );
    }

    #[test]
    fn test_parse_data_directive() {
        let line = parse_ok("LEN: .data 7, -1, +3");
        assert_eq!(line.label.as_deref(), Some("LEN"));
        assert_eq!(
            line.statement,
            Statement::Directive(Directive::Data(vec![7, -1, 3]))
        );
    }

    #[test]
    fn test_parse_string_directive() {
        let line = parse_ok(".string \"abc\"");
        assert_eq!(
            line.statement,
            Statement::Directive(Directive::String("abc".to_string()))
        );
    }

    #[test]
    fn test_parse_empty_string_directive() {
        let line = parse_ok(".string \"\"");
        assert_eq!(
            line.statement,
            Statement::Directive(Directive::String(String::new()))
        );
    }

    #[test]
    fn test_parse_mat_directive() {
        let line = parse_ok("M: .mat [2][3] 1, 2, 3, 4, 5, 6");
        assert_eq!(
            line.statement,
            Statement::Directive(Directive::Mat {
                rows: 2,
                cols: 3,
                values: vec![1, 2, 3, 4, 5, 6],
            })
        );
    }

    #[test]
    fn test_parse_mat_without_values() {
        let line = parse_ok(".mat [2][2]");
        assert_eq!(
            line.statement,
            Statement::Directive(Directive::Mat {
                rows: 2,
                cols: 2,
                values: vec![],
            })
        );
    }

    #[test]
    fn test_parse_extern_directive() {
        let line = parse_ok(".extern A, B");
        assert_eq!(
            line.statement,
            Statement::Directive(Directive::Extern(vec!["A".to_string(), "B".to_string()]))
        );
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(parse_line("", 1).unwrap(), None);
        assert_eq!(parse_line("   \t ", 1).unwrap(), None);
        assert_eq!(parse_line("; a comment", 1).unwrap(), None);
        assert_eq!(parse_line("   ; indented comment", 1).unwrap(), None);
    }

    #[test]
    fn test_line_too_long() {
        let long = "a".repeat(MAX_LINE_LENGTH + 1);
        assert!(parse_line(&long, 1).is_err());

        // Exactly at the limit is fine (even if the content is nonsense,
        // the length check itself must pass first).
        let ok = format!("; {}", "x".repeat(MAX_LINE_LENGTH - 2));
        assert_eq!(parse_line(&ok, 1).unwrap(), None);
    }

    #[test]
    fn test_non_printable_characters_rejected() {
        assert!(parse_line("mov r1, r\x07", 1).is_err());
    }

    #[test]
    fn test_trailing_carriage_return_tolerated() {
        let line = parse_ok("stop\r");
        assert_eq!(
            line.statement,
            Statement::Instruction {
                mnemonic: Mnemonic::Stop,
                operands: vec![],
            }
        );
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(parse_line("foo r1, r2", 1).is_err());
        assert!(parse_line("LABEL:", 1).is_err());
    }

    #[test]
    fn test_stray_commas_rejected() {
        assert!(parse_line("mov r1,, r2", 1).is_err());
        assert!(parse_line("mov r1, r2,", 1).is_err());
        assert!(parse_line("mov , r1", 1).is_err());
    }

    #[test]
    fn test_missing_comma_rejected() {
        assert!(parse_line("mov r1 r2", 1).is_err());
    }

    #[test]
    fn test_label_rules() {
        assert!(parse_line("mov: stop", 1).is_err());
        assert!(parse_line("r3: stop", 1).is_err());
        assert!(parse_line("1abc: stop", 1).is_err());
        let long_label = format!("{}: stop", "A".repeat(MAX_LABEL_LENGTH + 1));
        assert!(parse_line(&long_label, 1).is_err());

        let at_limit = format!("{}: stop", "A".repeat(MAX_LABEL_LENGTH));
        assert!(parse_line(&at_limit, 1).unwrap().is_some());
    }

    #[test]
    fn test_malformed_operands_rejected() {
        assert!(parse_line("mov #, r1", 1).is_err());
        assert!(parse_line("mov #5x, r1", 1).is_err());
        assert!(parse_line("mov M[r1], r2", 1).is_err());
        assert!(parse_line("mov M[r1][r9], r2", 1).is_err());
        assert!(parse_line("prn 5", 1).is_err());
    }

    #[test]
    fn test_parse_source_collects_errors_and_continues() {
        let mut diagnostics = Diagnostics::new();
        let source = "stop\nbogus line\nrts\n";
        let lines = parse_source(source, &mut diagnostics);

        assert_eq!(lines.len(), 2);
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(lines[1].line_number, 3);
    }
}
