use clap::Subcommand;
use serde_json::json;

use crate::cli::output::output_success;
use crate::cli::OutputFormat;
use crate::database::models::PersonaInfo;
use crate::services::compute_landing_path;

#[derive(Subcommand)]
pub enum LandingCommands {
    #[command(about = "Compute the landing path for a persona, without contacting the server")]
    Resolve {
        #[arg(long, help = "Persona code, e.g. STUDENT")]
        code: Option<String>,
        #[arg(long, help = "Configured default_landing_path of the persona")]
        path: Option<String>,
    },
}

pub fn handle(cmd: LandingCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        LandingCommands::Resolve { code, path } => {
            let persona = (code.is_some() || path.is_some()).then(|| PersonaInfo {
                code,
                default_landing_path: path,
            });
            let landing = compute_landing_path(persona.as_ref());
            output_success(output_format, &landing, Some(json!({ "path": landing })))
        }
    }
}
