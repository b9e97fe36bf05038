#![deny(unsafe_code)]

use std::{env, io, process::ExitCode};

#[tokio::main]
async fn main() -> ExitCode {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    let status = daemon::run(env::args_os(), &mut stdout, &mut stderr).await;
    daemon::exit_code_from(status)
}
