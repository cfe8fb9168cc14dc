use std::process::ExitCode;

use clap::Parser;
use envfreeze_cli::{execute, telemetry, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init(cli.log_format, cli.level());

    let report = match execute(&cli) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("envfreeze: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("envfreeze: cannot encode report: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else if !cli.quiet {
        println!("{}", report.generate_text());
    }
    ExitCode::SUCCESS
}
