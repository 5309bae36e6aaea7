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

use clap::Parser as clap_parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tenasm::assemble;
use tenasm::file_reader::AsmFileReader;
use tenasm::output::FileOutputWriter;

const SOURCE_EXTENSION: &str = "as";

#[derive(clap_parser)]
#[clap(version = "0.1.0", about = "Two-pass assembler for the 10-bit word machine")]
struct Opts {
    /// Source files to assemble (each must end with .as)
    #[clap(required = true)]
    inputs: Vec<PathBuf>,
}

fn process_file(input: &Path) -> bool {
    if input.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
        eprintln!(
            "{} invalid filename '{}' (must end with .{})",
            "Error:".red().bold(),
            input.display(),
            SOURCE_EXTENSION
        );
        return false;
    }

    let reader = AsmFileReader;
    let mut writer = FileOutputWriter::new(input.with_extension(""));

    match assemble(input, &reader, &mut writer) {
        Ok(()) => {
            println!("Successfully assembled {}", input.display());
            true
        }
        Err(error) => {
            eprintln!("{} {:#}", "Error:".red().bold(), error);
            false
        }
    }
}

fn main() -> ExitCode {
    let opts: Opts = Opts::parse();
    let mut failed = 0;

    for input in &opts.inputs {
        if !process_file(input) {
            failed += 1;
        }
    }

    if opts.inputs.len() > 1 {
        println!(
            "{} of {} file(s) assembled successfully",
            opts.inputs.len() - failed,
            opts.inputs.len()
        );
    }

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
