use clap::Parser;
use geohistory_portal::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    geohistory_portal::init_tracing();

    let cli = Cli::parse();

    if let Err(e) = geohistory_portal::cli::run(cli).await {
        match std::env::var("GHP_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }

    Ok(())
}
