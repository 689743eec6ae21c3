//! What the `dbmlc` commands do, independent of argument parsing.

use std::io::Write;
use std::path::{Path, PathBuf};

use derive_more::{Display, Error, From};
use tracing::info;

use crate::compiler::Compiler;
use crate::database::CheckOptions;
use crate::diagnostics::render_diagnostic;

/// Host-level failures of the driver. Problems in the DBML source are
/// diagnostics, never errors.
#[derive(Debug, Display, Error, From)]
pub enum CliError {
    #[display("cannot read {}: {source}", path.display())]
    #[from(skip)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[display("cannot write output: {_0}")]
    Write(std::io::Error),
    #[display("cannot serialize output: {_0}")]
    Json(serde_json::Error),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

fn load(path: &Path, options: CheckOptions) -> Result<Compiler, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = text.len(), "loaded source");
    Ok(Compiler::with_options(text, options))
}

/// Print the diagnostics of `path`. Returns whether any error was reported.
pub fn check_file(
    path: &Path,
    format: OutputFormat,
    options: CheckOptions,
    out: &mut impl Write,
) -> Result<bool, CliError> {
    let compiler = load(path, options)?;
    let diagnostics = compiler.raw_diagnostics();
    let has_errors = diagnostics.iter().any(|d| d.is_error());
    match format {
        OutputFormat::Human => {
            let file_path = path.display().to_string();
            for diag in &diagnostics {
                let rendered = render_diagnostic(diag, compiler.source(), &file_path, false);
                out.write_all(rendered.as_bytes())?;
            }
            writeln!(
                out,
                "{}: {} error(s), {} warning(s)",
                file_path,
                diagnostics.iter().filter(|d| d.is_error()).count(),
                diagnostics.iter().filter(|d| !d.is_error()).count()
            )?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &compiler.diagnostics())?;
            writeln!(out)?;
        }
    }
    Ok(has_errors)
}

/// Print the interpreted model of `path` as JSON. Returns whether any error
/// was reported while building it.
pub fn print_model(path: &Path, out: &mut impl Write) -> Result<bool, CliError> {
    let compiler = load(path, CheckOptions::default())?;
    let model = compiler.parse().raw_db();
    serde_json::to_writer_pretty(&mut *out, &model)?;
    writeln!(out)?;
    Ok(compiler.has_errors())
}
