//! Command-line interface.

use clap::{Parser, Subcommand};

/// Kitchen Nerd - recipe sharing server
#[derive(Parser)]
#[command(name = "kitchen-nerd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server (default)
    #[command(alias = "-d", alias = "--daemon")]
    Serve,

    /// Write a default config.toml in the current directory
    Init,

    /// Grant admin status to a registered user
    Promote {
        /// Email address of the user
        email: String,
    },

    /// Delete expired session tokens once and exit
    Sweep,
}
