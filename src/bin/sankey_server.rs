use case_surveillance_core::config::AppConfig;
use case_surveillance_core::start_server;
use env_logger::Env;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    if env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .try_init()
        .is_err()
    {
        eprintln!("Logger already initialized");
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match start_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Server stopped with error: {}", e);
            ExitCode::FAILURE
        }
    }
}
