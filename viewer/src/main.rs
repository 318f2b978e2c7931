//! Line viewer binary.
//!
//! Connects to the configured sockets, prints every received line to stdout
//! and reads operator commands from stdin. Type `help` for the command list.

use std::process::ExitCode;

use tokio::io::BufReader;
use tracing::error;
use viewer::{debug, App, Settings, WebSocketConnector};

#[tokio::main]
async fn main() -> ExitCode {
    let _log_guard = debug::init_logger();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    let connector = WebSocketConnector::new(&settings.connection_settings());
    let app = App::start(&settings, connector);
    app.run(BufReader::new(tokio::io::stdin())).await;
    ExitCode::SUCCESS
}
