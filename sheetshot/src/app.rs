//! Argument handling and status reporting around the export call

use crate::Cli;
use colored::*;
use sheetshot_core::{ExportRequest, Exporter, list_sheets};
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;

/// Run one invocation and return the process exit code.
///
/// A status line that cannot be written (e.g. a closed pipe) fails the run.
pub fn run(cli: &Cli, exporter: &dyn Exporter, out: &mut dyn Write, err: &mut dyn Write) -> i32 {
    match execute(cli, exporter, out, err) {
        Ok(code) => code,
        Err(e) => {
            debug!("cannot write status: {}", e);
            1
        }
    }
}

fn execute(
    cli: &Cli,
    exporter: &dyn Exporter,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<i32> {
    if cli.check_input_exists && !input_exists(&cli.input, err)? {
        return Ok(1);
    }

    if cli.list_sheets {
        return print_sheets(&cli.input, out, err);
    }

    let (Some(output), Some(sheet)) = (&cli.output, &cli.sheet) else {
        writeln!(err, "Usage: sheetshot <INPUT> <OUTPUT> <SHEET> [RANGE]")?;
        return Ok(2);
    };

    let request = ExportRequest {
        input_path: cli.input.clone(),
        output_path: output.clone(),
        sheet_name: sheet.clone(),
        cell_range: cli.range.clone(),
    };
    debug!("export request: {:?}", request);

    match exporter.export(&request) {
        Ok(summary) => {
            let message = format!(
                "Image exported successfully to {}",
                request.output_path.display()
            );
            writeln!(out, "{}", message.green())?;
            out.flush()?;
            debug!(
                "exported {} ({}x{} px)",
                summary.range, summary.width, summary.height
            );
            Ok(0)
        }
        Err(e) => {
            writeln!(err, "{} {}", "Error exporting image:".red().bold(), e)?;
            Ok(1)
        }
    }
}

fn input_exists(input: &Path, err: &mut dyn Write) -> io::Result<bool> {
    let resolved = std::path::absolute(input).unwrap_or_else(|_| input.to_path_buf());
    if resolved.exists() {
        return Ok(true);
    }
    writeln!(
        err,
        "{} {}",
        "Input file not found:".red().bold(),
        resolved.display()
    )?;
    Ok(false)
}

fn print_sheets(input: &Path, out: &mut dyn Write, err: &mut dyn Write) -> io::Result<i32> {
    match list_sheets(input) {
        Ok(names) => {
            for name in names {
                writeln!(out, "{}", name)?;
            }
            out.flush()?;
            Ok(0)
        }
        Err(e) => {
            writeln!(err, "{} {}", "Error reading workbook:".red().bold(), e)?;
            Ok(1)
        }
    }
}
