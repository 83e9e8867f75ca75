mod cli;

use std::path::PathBuf;

use clap::Parser;
use socle_container::BoxError;
use socle_runtime::connection::registered_drivers;
use socle_runtime::{
    Connection, ConnectionDriver, SETTINGS_FILE, Settings, connection_factory, driver,
    setup_with_plugins,
};

use crate::cli::Commands;

/// In-memory demo driver so the bootstrap flow is runnable without a real
/// database. Accepts `mem:` endpoints and hands out a handle that only
/// remembers what it was asked to connect to.
#[derive(Default)]
struct MemoryDriver;

pub struct MemoryConnection {
    pub endpoint: String,
}

impl ConnectionDriver for MemoryDriver {
    fn accepts(&self, endpoint: &str) -> bool {
        endpoint.starts_with("mem:")
    }

    fn connect(&self, endpoint: &str, _settings: &Settings) -> Result<Connection, BoxError> {
        Ok(Connection::new(MemoryConnection {
            endpoint: endpoint.to_string(),
        }))
    }
}

driver!("mem", MemoryDriver::default());

fn main() -> eyre::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match cli.command {
        Commands::Boot {
            endpoint,
            plugins,
            settings,
        } => {
            let settings_path = settings.unwrap_or_else(|| PathBuf::from(SETTINGS_FILE));
            let settings = Settings::load(&settings_path)?;
            let factory = connection_factory(&endpoint, &settings)?;

            let plugins_dir = plugins.unwrap_or_else(|| PathBuf::from("."));
            tracing::info!(endpoint, plugins = %plugins_dir.display(), "booting");
            let container = setup_with_plugins(factory, &plugins_dir, settings, None)?;

            println!("bootstrap complete: {} bindings", container.len());
            let mut keys: Vec<String> = container.keys().map(ToString::to_string).collect();
            keys.sort();
            for key in keys {
                println!("  {key}");
            }
        }
        Commands::Drivers => {
            for registration in registered_drivers() {
                println!("{}", registration.name());
            }
        }
    }

    Ok(())
}
