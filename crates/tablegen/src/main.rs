//! CLI entry point for the SM83 table generator binary.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tablegen::{parse_rows, render_listing, render_module};
#[cfg(test)]
use tempfile as _;
use thiserror as _;

use lowering_core::lower_table;

const USAGE_TEXT: &str = "\
Usage: sm83-tablegen <command> [options]

Commands:
  build <table.csv> [-o <output.rs>] [--verbose]  Lower a table into a Rust module

Options:
  -o, --output <file>  Output file path (default: input stem + .rs)
  -v, --verbose        Print the routine listing and coverage to stderr
  -h, --help           Show this help message

Examples:
  sm83-tablegen build instructions.csv
  sm83-tablegen build instructions.csv -o src/generated/instructions.rs
";

#[derive(Debug, PartialEq, Eq)]
struct BuildArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    verbose: bool,
}

#[derive(Debug)]
enum ParseResult {
    Build(BuildArgs),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    if first != "build" {
        return Err(format!("unknown command: {}", first.to_string_lossy()));
    }

    parse_build_args(args).map(ParseResult::Build)
}

#[allow(clippy::while_let_on_iterator)]
fn parse_build_args(mut args: impl Iterator<Item = OsString>) -> Result<BuildArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }

        if arg == "-o" || arg == "--output" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for -o".to_string())?;
            output = Some(PathBuf::from(value));
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(BuildArgs {
        input,
        output,
        verbose,
    })
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("out");
    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{stem}.rs"))
}

fn run_build(args: &BuildArgs) -> Result<(), i32> {
    let text = match fs::read_to_string(&args.input) {
        Ok(text) => text,
        Err(error) => {
            eprintln!("error: failed to read {}: {error}", args.input.display());
            return Err(1);
        }
    };

    let rows = match parse_rows(&text) {
        Ok(rows) => rows,
        Err(error) => {
            eprintln!("{}: error: {error}", args.input.display());
            return Err(1);
        }
    };

    let set = match lower_table(&rows) {
        Ok(set) => set,
        Err(error) => {
            eprintln!("{}: error: {error}", args.input.display());
            return Err(1);
        }
    };

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));

    if let Err(error) = fs::write(&output_path, render_module(&set)) {
        eprintln!("error: failed to write output: {error}");
        return Err(1);
    }

    if args.verbose {
        eprint!("{}", render_listing(&set));
        if !set.coverage.is_complete() {
            for opcode in &set.coverage.skipped {
                eprintln!("warning: opcode {opcode:#05X} skipped (no generator for its family)");
            }
        }
    }

    println!(
        "Lowered {} of {} rows from {} -> {}",
        set.coverage.lowered,
        rows.len(),
        args.input.display(),
        output_path.display()
    );

    Ok(())
}

fn main() {
    let parsed = match parse_args(env::args_os().skip(1)) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("error: {message}");
            eprint!("{USAGE_TEXT}");
            std::process::exit(2);
        }
    };

    match parsed {
        ParseResult::Help => print!("{USAGE_TEXT}"),
        ParseResult::Build(args) => {
            if let Err(code) = run_build(&args) {
                std::process::exit(code);
            }
        }
    }
}
