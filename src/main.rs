use std::{process::ExitCode, time::Duration};

use crate::{
    configuration::Configuration, configuration_handler::ConfigurationHandler,
    database_interface::DatabaseInterface, error::StartupError, http::create_app,
    local_store::LocalStore,
};
use tokio::time::sleep;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod backend;
mod configuration;
mod configuration_handler;
mod database_interface;
mod error;
mod http;
mod local_store;
mod schema;
mod session;
#[cfg(test)]
mod testutils;
mod types;
mod views;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let configuration = ConfigurationHandler::parse_arguments();

    match run(configuration).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "Appointment manager stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(configuration: ConfigurationHandler) -> Result<(), StartupError> {
    if configuration.uses_default_session_secret() {
        warn!("Using the built-in session secret. Set SESSION_SECRET for any real deployment.");
    }

    let app = if let Some(database_url) = configuration.database_url() {
        let backend = connect(&database_url).await;
        let applied = backend.run_migrations()?;
        info!(applied, "Database schema is up to date");

        if configuration.create_tables() {
            info!("Tables created, exiting");
            return Ok(());
        }
        create_app(backend, &configuration)
    } else {
        if configuration.create_tables() {
            return Err(StartupError::MissingDatabaseUrl);
        }
        warn!("No database configured. Users and appointments are kept in memory only.");
        create_app(LocalStore::default(), &configuration)
    };

    let address = format!("0.0.0.0:{}", configuration.port());
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    info!("Accessible at {address}");

    axum::serve(listener, app)
        .await
        .map_err(StartupError::Serve)
}

async fn connect(database_url: &str) -> DatabaseInterface {
    loop {
        match DatabaseInterface::new(database_url) {
            Ok(backend) => {
                info!("Successfully connected to database");
                return backend;
            }
            Err(err) => {
                error!(%err, "Failed to establish database connection. Retry in 1 sec. You may want to restart without a database url (in-memory storage).");
                sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
