//! Binary entrypoint for the `careboard` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let log_json = careboard::config::BoardConfig::from_env().is_ok_and(|config| config.log_json);
    careboard::logging::init(log_json);

    match careboard::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
