//! procexec binary entry point.

use std::io::Write;
use std::process::ExitCode;

use procexec::cli::{self, ArgsError};
use procexec::config::Config;
use procexec::{logging, ProcExecError};
use tracing::{debug, error};

/// Exit code used when the program could not be started.
const EXIT_NOT_RUN: u8 = 127;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => return usage_error(e),
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("procexec: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Ignore failure: a subscriber may already be installed by the embedding process.
    let _ = logging::init_with_filter(config.log_filter());
    debug!("procexec v{}", env!("CARGO_PKG_VERSION"));

    let command = match args.to_command(&config) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("procexec: {}", e);
            return ExitCode::from(2);
        }
    };

    match command.exec_unsafe_async().await {
        Ok(result) => {
            relay(&result.stdout, &result.stderr);
            exit_code(result.exit_code)
        }
        Err(ProcExecError::NonZeroExit {
            code,
            program,
            stdout,
            stderr,
        }) => {
            relay(&stdout, &stderr);
            error!(program = %program, code, "command failed");
            exit_code(code)
        }
        Err(e) if e.is_io() => {
            eprintln!("procexec: {}", e);
            ExitCode::from(EXIT_NOT_RUN)
        }
        Err(e) => {
            eprintln!("procexec: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn usage_error(e: ArgsError) -> ExitCode {
    eprintln!("procexec: {}", e);
    eprintln!("Try 'procexec --help' for more information.");
    ExitCode::from(2)
}

/// Write captured output to our own streams.
fn relay(stdout: &str, stderr: &str) {
    let _ = std::io::stdout().lock().write_all(stdout.as_bytes());
    let _ = std::io::stderr().lock().write_all(stderr.as_bytes());
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
