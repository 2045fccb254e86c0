use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use sheetshot_core::{RenderConfig, WorkbookExporter};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod app;

#[derive(Parser, Debug)]
#[command(name = "sheetshot")]
#[command(about = "Export a region of an Excel/ODS worksheet to an image", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the Excel/ODS workbook
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Image file to write (png, jpg, bmp, gif or tiff)
    #[arg(value_name = "OUTPUT", required_unless_present = "list_sheets")]
    output: Option<PathBuf>,

    /// Name of the worksheet to export
    #[arg(value_name = "SHEET", required_unless_present = "list_sheets")]
    sheet: Option<String>,

    /// Cell range or defined name, e.g. "Sheet2!B2:C15" (defaults to the used area)
    #[arg(value_name = "RANGE")]
    range: Option<String>,

    /// Verify that the input file exists before exporting
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    check_input_exists: bool,

    /// Path to render configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Print the workbook's sheet names and exit
    #[arg(long, conflicts_with_all = ["output", "sheet", "range"])]
    list_sheets: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match load_config(&cli) {
        Ok(config) => {
            let exporter = WorkbookExporter::new(config);
            app::run(&cli, &exporter, &mut io::stdout(), &mut io::stderr())
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<RenderConfig> {
    if let Some(config_path) = &cli.config {
        return RenderConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()));
    }

    // Try to load default config from current directory if it exists
    let default_config_path = PathBuf::from("sheetshot.toml");
    if default_config_path.exists() {
        RenderConfig::from_file(&default_config_path).with_context(|| {
            format!(
                "Failed to load config from {}",
                default_config_path.display()
            )
        })
    } else {
        Ok(RenderConfig::default())
    }
}
