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

pub mod assembler;
pub mod ast;
pub mod errors;
pub mod file_reader;
pub mod output;
pub mod parser;

use std::path::Path;

use anyhow::{Context, Result, bail};
use errors::Diagnostics;
use file_reader::FileReader;
use output::{OutputKind, OutputWriter};

extern crate pest;
extern crate pest_derive;

/// Assembles one translation unit read through `reader`, emitting the
/// expanded source, object file, and (when non-empty) entries and
/// externals files through `writer`. Diagnostics go to stderr; a failed
/// phase aborts the unit before later phases run.
pub fn assemble<F: FileReader, W: OutputWriter>(
    source_path: &Path,
    reader: &F,
    writer: &mut W,
) -> Result<()> {
    let source = reader
        .read_to_string(source_path)
        .context("Failed to read source file")?;

    assemble_source(&source, writer)
}

/// The full pipeline over an in-memory source buffer.
pub fn assemble_source<W: OutputWriter>(source: &str, writer: &mut W) -> Result<()> {
    let mut diagnostics = Diagnostics::new();

    // Phase 1: macro expansion.
    let expanded = match assembler::preprocessor::expand_macros(source) {
        Ok(expanded) => expanded,
        Err(error) => {
            diagnostics.report(error);
            diagnostics.print_to_stderr();
            bail!("macro expansion failed");
        }
    };

    writer
        .write(OutputKind::Expanded, &expanded)
        .context("Failed to write expanded source")?;

    // Phase 2: first pass over the expanded source.
    let lines = parser::parse_source(&expanded, &mut diagnostics);
    let pass1 = assembler::first_pass(&lines, &mut diagnostics);

    if diagnostics.has_errors() {
        diagnostics.print_to_stderr();
        bail!("first pass failed with {} error(s)", diagnostics.error_count());
    }

    // Phase 3: second pass and code generation.
    let (image, external_refs) = assembler::second_pass(
        &lines,
        &pass1.symbols,
        pass1.ic_final,
        pass1.dc_final,
        &mut diagnostics,
    );

    if diagnostics.has_errors() {
        diagnostics.print_to_stderr();
        bail!("second pass failed with {} error(s)", diagnostics.error_count());
    }

    writer
        .write(OutputKind::Object, &output::render_object(&image))
        .context("Failed to write object file")?;

    if let Some(entries) = output::render_entries(&pass1.symbols) {
        writer
            .write(OutputKind::Entries, &entries)
            .context("Failed to write entries file")?;
    }

    if let Some(externals) = output::render_externals(&external_refs) {
        writer
            .write(OutputKind::Externals, &externals)
            .context("Failed to write externals file")?;
    }

    Ok(())
}
