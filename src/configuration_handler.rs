use crate::configuration::Configuration;
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_SESSION_SECRET: &str = "chave-supersecreta";

/// Command line flags, each with an environment variable fallback. A `.env`
/// file in the working directory is loaded first.
#[derive(Debug, Clone, Parser)]
#[command(name = "appointment_manager", version, about = "Appointment booking website")]
pub struct ConfigurationHandler {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// PostgreSQL connection string. Without it appointments are kept in memory
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Secret used to sign session cookies
    #[arg(long, env = "SESSION_SECRET", default_value = DEFAULT_SESSION_SECRET, hide_env_values = true)]
    session_secret: String,

    /// Directory served under /static
    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    static_dir: PathBuf,

    /// Site name shown in every page title
    #[arg(long, env = "WEBSITE_TITLE", default_value = "Agendamentos")]
    website_title: String,

    /// Run pending migrations and exit
    #[arg(long)]
    create_tables: bool,
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    pub fn create_tables(&self) -> bool {
        self.create_tables
    }

    pub fn uses_default_session_secret(&self) -> bool {
        self.session_secret == DEFAULT_SESSION_SECRET
    }
}

impl Configuration for ConfigurationHandler {
    fn website_title(&self) -> String {
        self.website_title.clone()
    }

    fn session_secret(&self) -> String {
        self.session_secret.clone()
    }

    fn static_dir(&self) -> PathBuf {
        self.static_dir.clone()
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn database_url(&self) -> Option<String> {
        self.database_url.clone()
    }
}
