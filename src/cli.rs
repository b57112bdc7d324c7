use clap::{Parser, Subcommand};

/// ReadRoom — authentication API
#[derive(Parser)]
#[command(name = "readroom", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Port to bind (defaults to READROOM_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Apply pending database migrations and exit
    Migrate,

    /// Issue or inspect access tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Mint an access token for an existing, active user
    Issue {
        #[arg(long)]
        external_id: String,
    },
    /// Verify a token and print its claims
    Inspect { token: String },
}
