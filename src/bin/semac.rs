#![allow(clippy::print_stderr)]

use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;

use sema::cli::args::{CliArgs, OutputFormat};
use sema::cli::driver;
use sema::cli::reporter::Reporter;

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERRORS_REPORTED: u8 = 1;
const EXIT_FATAL: u8 = 2;

fn main() -> ExitCode {
    // Zero cost unless SEMA_LOG or RUST_LOG is set.
    sema::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let result = match driver::compile(&args) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("semac: {err:#}");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let color = !args.no_color && std::io::stdout().is_terminal();
    let reporter = Reporter::new(color);
    match args.format {
        OutputFormat::Text => {
            if !result.diagnostics.is_empty() {
                println!("{}", reporter.render(&result.diagnostics));
                println!();
            }
            println!("{}", reporter.summary(&result.diagnostics));
        }
        OutputFormat::Json => match reporter.render_json(&result.diagnostics) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("semac: failed to serialize diagnostics: {err}");
                return ExitCode::from(EXIT_FATAL);
            }
        },
    }

    if result.has_errors() {
        ExitCode::from(EXIT_ERRORS_REPORTED)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}
