//! Command-line interface
//!
//! - `serve`: run the HTTP chat endpoint
//! - `providers`: list the accepted provider identifiers

pub mod providers;
pub mod serve;

use clap::{Parser, Subcommand};

/// Chat Gateway - one chat contract over several LLM providers
#[derive(Parser)]
#[command(name = "chat-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(serve::ServeArgs),

    /// List supported provider identifiers
    Providers,
}
