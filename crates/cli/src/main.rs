// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! The `codehem` binary: detect, extract and patch source files.
//!
//! Exit codes: 0 success, 2 path not found, 3 write conflict, 4 I/O error,
//! 5 usage error. `CODEHEM_DEBUG=1` raises log verbosity to debug.

use clap::{Parser, Subcommand};
use codehem_core::{Element, Error};
use codehem_engine::ops::default_engine;
use codehem_engine::{PatchMode, PatchRequest, PatchResult};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser)]
#[command(name = "codehem", version, about = "Syntax-aware code query and patching")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the detected language code of a file.
    Detect {
        file: PathBuf,
    },
    /// Extract the element tree of a file.
    Extract {
        file: PathBuf,
        /// One line per top-level element (default).
        #[arg(long)]
        summary: bool,
        /// Full tree as JSON.
        #[arg(long)]
        raw_json: bool,
        /// Include nested elements in the summary.
        #[arg(long)]
        recursive: bool,
    },
    /// Patch an element addressed by a path expression.
    Patch {
        file: PathBuf,
        /// Path expression, e.g. `C.f[body]`.
        #[arg(long)]
        xpath: String,
        /// File containing the replacement/insertion code.
        #[arg(long = "file", value_name = "NEW_CODE_FILE")]
        code_file: PathBuf,
        #[arg(long, default_value = "replace")]
        mode: String,
        /// Compute the result without writing.
        #[arg(long)]
        dry_run: bool,
        /// Expected fragment hash for optimistic concurrency.
        #[arg(long)]
        hash: Option<String>,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            // clap's own help/version exits are successes.
            if error.use_stderr() {
                let _ = writeln!(std::io::stderr(), "{error}");
                return ExitCode::from(5);
            }
            let _ = write!(std::io::stdout(), "{error}");
            return ExitCode::SUCCESS;
        }
    };
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(std::io::stderr(), "codehem: {error}");
            ExitCode::from(exit_code(&error))
        }
    }
}

fn init_tracing() {
    let filter = if std::env::var("CODEHEM_DEBUG").is_ok_and(|v| v == "1") {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_code(error: &Error) -> u8 {
    match error {
        Error::ElementNotFound { .. } => 2,
        Error::WriteConflict { .. } => 3,
        Error::Io { .. } | Error::Timeout { .. } => 4,
        Error::PathSyntax { .. } | Error::Validation { .. } | Error::UnsupportedLanguage { .. } => 5,
        Error::Parse { .. } | Error::Plugin { .. } => 1,
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Command::Detect { file } => {
            let source = read(&file)?;
            let code = default_engine().detect(&source, Some(&file))?;
            println!("{code}");
            Ok(())
        }
        Command::Extract {
            file,
            summary: _,
            raw_json,
            recursive,
        } => {
            let source = read(&file)?;
            let text = utf8(&source)?;
            let engine = default_engine();
            let language = engine.detect(&source, Some(&file))?;
            let tree = engine.extract(text, language)?;
            if raw_json {
                let rendered = serde_json::to_string_pretty(tree.as_ref())
                    .map_err(|e| Error::validation(format!("serializing tree: {e}")))?;
                println!("{rendered}");
            } else {
                for element in &tree.elements {
                    print_summary(element, 0, recursive);
                }
            }
            Ok(())
        }
        Command::Patch {
            file,
            xpath,
            code_file,
            mode,
            dry_run,
            hash,
        } => {
            let mode: PatchMode = mode.parse()?;
            let source = read(&file)?;
            let text = utf8(&source)?;
            let new_code = utf8(&read(&code_file)?)?.to_string();
            let engine = default_engine();
            let language = engine.detect(&source, Some(&file))?;

            let mut request = PatchRequest::new(&xpath, new_code, mode);
            request.original_hash = hash;
            request.dry_run = dry_run;
            let mut result = engine
                .apply_patch(text, language, &request)
                .map_err(|e| e.with_file(&file))?;

            if dry_run {
                // Dry runs against files report the diff only, never the buffer.
                result.modified_code = None;
            } else {
                let modified = result
                    .modified_code
                    .as_deref()
                    .ok_or_else(|| Error::validation("patch produced no modified buffer"))?;
                write_atomic(&file, modified.as_bytes())?;
                debug!(file = %file.display(), xpath, "patched file");
            }
            print_result(&result)?;
            Ok(())
        }
    }
}

fn read(path: &Path) -> Result<Vec<u8>, Error> {
    std::fs::read(path).map_err(|e| Error::io(format!("reading {}", path.display()), e))
}

fn utf8(bytes: &[u8]) -> Result<&str, Error> {
    std::str::from_utf8(bytes).map_err(|_| Error::validation("file is not valid UTF-8"))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| Error::io(format!("creating temp file in {}", parent.display()), e))?;
    temp.write_all(bytes)
        .map_err(|e| Error::io(format!("writing {}", path.display()), e))?;
    temp.persist(path)
        .map_err(|e| Error::io(format!("renaming into {}", path.display()), e.error))?;
    Ok(())
}

fn print_summary(element: &Element, depth: usize, recursive: bool) {
    let indent = "  ".repeat(depth);
    let name = if element.name.is_empty() {
        "imports"
    } else {
        element.name.as_str()
    };
    println!(
        "{indent}{} {name} [{}..{}]",
        element.kind, element.range.start_line, element.range.end_line
    );
    if recursive || depth == 0 {
        for child in &element.children {
            print_summary(child, depth + 1, recursive);
        }
    }
}

fn print_result(result: &PatchResult) -> Result<(), Error> {
    let rendered = serde_json::to_string_pretty(result)
        .map_err(|e| Error::validation(format!("serializing result: {e}")))?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exit_codes_match_the_contract() {
        assert_eq!(exit_code(&Error::not_found("C.f")), 2);
        assert_eq!(
            exit_code(&Error::WriteConflict {
                path: "C.f".into(),
                file: None,
                expected: "a".into(),
                actual: "b".into(),
            }),
            3
        );
        assert_eq!(
            exit_code(&Error::io("reading", std::io::Error::other("boom"))),
            4
        );
        assert_eq!(exit_code(&Error::path_syntax("x..y", "empty segment")), 5);
        assert_eq!(exit_code(&Error::validation("empty code")), 5);
        assert_eq!(exit_code(&Error::parse("python", "no tree")), 1);
    }
}
