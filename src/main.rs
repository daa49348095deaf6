use std::{io, process::ExitCode};

use mwxml_flatten::cli::{error_chain, CommandLine};

fn main() -> ExitCode {
    let Some(args) = CommandLine::parse_or_usage(std::env::args_os()) else {
        // git invokes textconv filters blindly, a bad invocation produces no output and no failure
        return ExitCode::SUCCESS;
    };

    // stdout carries the flattened export, all diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(args.log_level())
        .with_target(false)
        .without_time()
        .init();

    match args.run(io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("mwxml-flatten: {}", error_chain(&e));
            ExitCode::FAILURE
        }
    }
}
