pub mod client;
pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use client::{Credentials, PortalClient};

#[derive(Parser)]
#[command(name = "ghp")]
#[command(about = "GeoHistory portal CLI - table administration and landing checks")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, env = "GHP_URL", default_value = "http://localhost:3000", help = "Portal base URL")]
    pub url: String,

    #[arg(long, global = true, env = "GHP_TOKEN", help = "Bearer token of an administrator")]
    pub token: Option<String>,

    #[arg(long, global = true, env = "GHP_BYPASS_TOKEN", help = "Development bypass token, used when no --token is given")]
    pub bypass: Option<String>,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Generic table administration")]
    Tables {
        #[command(subcommand)]
        cmd: commands::tables::TableCommands,
    },

    #[command(about = "Landing path resolution")]
    Landing {
        #[command(subcommand)]
        cmd: commands::landing::LandingCommands,
    },

    #[command(about = "Check server and database health")]
    Health,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

impl Cli {
    pub fn credentials(&self) -> Credentials {
        match (&self.token, &self.bypass) {
            (Some(token), _) => Credentials::Bearer(token.clone()),
            (None, Some(bypass)) => Credentials::Bypass(bypass.clone()),
            (None, None) => Credentials::None,
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = PortalClient::new(&cli.url, cli.credentials())?;

    match cli.command {
        Commands::Tables { cmd } => commands::tables::handle(cmd, &client, output_format).await,
        Commands::Landing { cmd } => commands::landing::handle(cmd, output_format),
        Commands::Health => commands::health::handle(&client, output_format).await,
    }
}
