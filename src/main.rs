#![warn(rust_2018_idioms)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use db_credentials::{resolve_credentials, Settings, Source};

/// Print the database credentials the test suite would use
#[derive(Debug, Parser)]
#[command(name = "db-creds", version, about)]
struct Cli {
    /// Force a source: env-file, env or vault
    #[arg(long, env = "CREDENTIALS_SOURCE")]
    source: Option<Source>,

    /// Path of the dotenv file used by the env-file source
    #[arg(long, env = "CREDENTIALS_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Print the password instead of a mask
    #[arg(long)]
    reveal: bool,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match struct_log::StructLogBuilder::new(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    )
    .json_from_env()
    .redact(["db_password", "vault_secret_id"])
    .init()
    {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to set up logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut settings = Settings::from_env()?;
    if let Some(source) = cli.source {
        settings.source = Some(source);
    }
    if let Some(env_file) = cli.env_file {
        settings.env_file = env_file;
    }

    let credentials = resolve_credentials(&settings).await?;
    let view = credentials.view(cli.reveal);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("host:     {}", view.host);
        println!("port:     {}", view.port);
        println!("sid:      {}", view.sid);
        println!("user:     {}", view.user);
        println!("password: {}", view.password);
        println!("connect:  {}", credentials.connect_string());
    }
    Ok(())
}
