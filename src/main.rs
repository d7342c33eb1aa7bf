//! pycompat-matrix command-line tool
//!
//! Refreshes the feature tables from a spreadsheet (or reuses the saved JSON)
//! and renders the HTML matrix.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use pycompat_matrix::{Credentials, MatrixBuilder, MatrixError, RefreshSource};

#[derive(Debug, Parser)]
#[command(name = "pycompat-matrix", version, about)]
struct Args {
    /// Re-read the tables from this source; without it the saved JSON is reused
    #[arg(long, value_enum)]
    refresh: Option<RefreshSource>,

    /// OpenDocument spreadsheet to read with `--refresh ods`
    #[arg(long, value_name = "FILE")]
    ods: Option<PathBuf>,

    /// Workbook to read with `--refresh xls`
    #[arg(long, value_name = "FILE")]
    xls: Option<PathBuf>,

    /// Hosted spreadsheet to read with `--refresh gdocs`
    #[arg(long, value_name = "ID")]
    spreadsheet_id: Option<String>,

    /// Intermediate JSON file
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// HTML output file
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Directory containing an `index.html` template to use instead of the built-in one
    #[arg(long, value_name = "DIR")]
    templates: Option<PathBuf>,

    /// Account email for the hosted spreadsheet
    #[arg(long, env = "GDOCS_EMAIL", requires = "gdocs_token")]
    gdocs_email: Option<String>,

    /// OAuth access token for the hosted spreadsheet
    #[arg(long, env = "GDOCS_TOKEN", hide_env_values = true, requires = "gdocs_email")]
    gdocs_token: Option<String>,

    /// Application name sent as the User-Agent
    #[arg(long, env = "GDOCS_SOURCE", default_value = "pycompat-matrix")]
    gdocs_source: String,

    /// API key for public (unauthenticated) access
    #[arg(long, env = "GDOCS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        handle_error(e);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        2 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }
    builder.init();
}

fn run(args: Args) -> Result<(), MatrixError> {
    let mut builder = MatrixBuilder::new();
    if let Some(path) = args.ods {
        builder = builder.with_ods_path(path);
    }
    if let Some(path) = args.xls {
        builder = builder.with_xls_path(path);
    }
    if let Some(id) = args.spreadsheet_id {
        builder = builder.with_spreadsheet_id(id);
    }
    if let Some(path) = args.json {
        builder = builder.with_json_path(path);
    }
    if let Some(path) = args.output {
        builder = builder.with_output_path(path);
    }
    if let Some(dir) = args.templates {
        builder = builder.with_template_dir(dir);
    }
    if let (Some(email), Some(access_token)) = (args.gdocs_email, args.gdocs_token) {
        builder = builder.with_credentials(Credentials {
            email,
            access_token,
            source: args.gdocs_source,
        });
    }
    if let Some(key) = args.api_key {
        builder = builder.with_api_key(key);
    }

    let matrix = builder.build()?;
    let tables = matrix.run(args.refresh)?;
    println!(
        "Rendered {} sheets -> {}",
        tables.len(),
        matrix.config().locations.output_path.display()
    );
    Ok(())
}

fn handle_error(error: MatrixError) {
    match error {
        MatrixError::Io(io_err) => {
            eprintln!("I/O Error: {}", io_err);
            eprintln!("Please check that the file exists and you have permission to access it.");
        }
        MatrixError::Parse(parse_err) => {
            eprintln!("Parse Error: {}", parse_err);
            eprintln!("The file may not be a valid workbook or may be corrupted.");
        }
        MatrixError::Utf8(utf8_err) => {
            eprintln!("UTF-8 Conversion Error: {}", utf8_err);
        }
        MatrixError::Zip(msg) => {
            eprintln!("ZIP Archive Error: {}", msg);
            eprintln!("The file may be corrupted or not an OpenDocument spreadsheet.");
        }
        MatrixError::Xml(msg) => {
            eprintln!("XML Parse Error: {}", msg);
        }
        MatrixError::Json(json_err) => {
            eprintln!("JSON Error: {}", json_err);
            eprintln!("Run with --refresh to regenerate the JSON file.");
        }
        MatrixError::Template(template_err) => {
            eprintln!("Template Error: {}", template_err);
        }
        MatrixError::Network(net_err) => {
            eprintln!("Network Error: {}", net_err);
        }
        MatrixError::Http { status, url } if status == 401 || status == 403 => {
            eprintln!("Authentication Error: HTTP {} from {}", status, url);
            eprintln!("Please check --gdocs-email/--gdocs-token or --api-key.");
        }
        MatrixError::Http { status, url } => {
            eprintln!("HTTP Error: {} from {}", status, url);
        }
        MatrixError::SheetNotFound(name) => {
            eprintln!("Sheet Not Found: {}", name);
            eprintln!("Every listed sheet must exist in the spreadsheet.");
        }
        MatrixError::Config(msg) => {
            eprintln!("Configuration Error: {}", msg);
        }
        MatrixError::SecurityViolation(msg) => {
            eprintln!("Security Violation: {}", msg);
        }
    }
}
