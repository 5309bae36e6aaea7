use colored::Colorize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AssemblyError {
    #[error("Syntax error on line {line}: {reason}")]
    SyntaxError { line: usize, reason: String },

    #[error("Macro error on line {line}: {reason}")]
    MacroError { line: usize, reason: String },

    #[error("Semantic error on line {line}: {reason}")]
    SemanticError { line: usize, reason: String },

    #[error("Semantic error: {reason}")]
    SemanticErrorNoLine { reason: String },
}

/// Collects the errors a pass finds while it keeps scanning. The pass
/// itself fails only at completion, so every problem in a file gets
/// reported in one run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<AssemblyError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, error: AssemblyError) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[AssemblyError] {
        &self.errors
    }

    /// Prints every collected error to stderr.
    pub fn print_to_stderr(&self) {
        for error in &self.errors {
            eprintln!("{} {}", "Error:".red().bold(), error);
        }
    }
}
