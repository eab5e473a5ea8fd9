use std::error::Error;
use std::fmt::Write;

use log::debug;

mod cli;

/// `error: <msg>` followed by one `caused by:` line per underlying source
fn error_report(err: &dyn Error) -> String {
    let mut report = format!("error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(report, "\n  caused by: {cause}");
        source = cause.source();
    }
    report
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = cli::run().await {
        debug!("{err:?}");
        eprintln!("{}", error_report(&err));
        std::process::exit(1);
    }
}
