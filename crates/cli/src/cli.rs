use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "socle", about = "Bootstrap runner for socle-based applications")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a full bootstrap and report the resulting bindings
    Boot {
        /// Connection endpoint handed to the driver table
        #[arg(long)]
        endpoint: String,

        /// Plugin directory to scan (defaults to the working directory)
        #[arg(long)]
        plugins: Option<PathBuf>,

        /// Settings file (defaults to ./socle.json)
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// List the connection drivers compiled into this binary
    Drivers,
}
