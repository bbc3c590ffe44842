use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use geolink_core::point::ReferenceSystem;
use geolink_core::position::Position;
use geolink_core::{load_app_config_from_env, AppConfig};
use geolink_convert::state::{ConversionState, Converter};
use geolink_convert::{registry, MemoryPermissionStore, Permission, ReqwestNetwork};

#[derive(Debug, Parser)]
#[command(name = "geolink")]
#[command(about = "Convert a shared map link or coordinate text into a position")]
struct Cli {
    /// The shared text: a map link, short link, or bare coordinates.
    text: String,

    /// Network consent: always, ask, or never. Defaults to
    /// GEOLINK_CONNECTION_PERMISSION.
    #[arg(long)]
    network: Option<Permission>,

    /// Print the result as JSON instead of plain text.
    #[arg(long)]
    json: bool,

    /// Request timeout in seconds, overriding GEOLINK_REQUEST_TIMEOUT_SECS.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = load_app_config_from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let permission = match cli.network {
        Some(p) => p,
        None => config
            .connection_permission
            .parse()
            .map_err(anyhow::Error::msg)?,
    };

    let state = convert(&cli, &config, permission).await?;
    match state {
        ConversionState::ConversionSucceeded { position } => {
            let position = to_wgs84(position);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&position)?);
            } else {
                print_position(&position);
            }
            Ok(())
        }
        ConversionState::ConversionFailed { error, text } => {
            tracing::debug!(%error, text, "conversion failed");
            eprintln!("{error}");
            std::process::exit(1);
        }
        other => {
            eprintln!("conversion stopped in state {}", other.name());
            std::process::exit(1);
        }
    }
}

async fn convert(
    cli: &Cli,
    config: &AppConfig,
    permission: Permission,
) -> anyhow::Result<ConversionState> {
    let network = ReqwestNetwork::new(
        cli.timeout_secs.unwrap_or(config.request_timeout_secs),
        config.connect_timeout_secs,
        &config.user_agent,
    )?;
    let store = Arc::new(MemoryPermissionStore::new(permission));
    let converter = Converter::new(registry(), network, store);

    let mut state = converter.submit(cli.text.as_str()).await;
    while state.awaits_permission() {
        let prompt = permission_prompt(&state);
        state = if ask(prompt)? {
            converter.grant(state, false).await
        } else {
            converter.deny(state, false).await
        };
    }
    Ok(state)
}

fn permission_prompt(state: &ConversionState) -> &'static str {
    let input = match state {
        ConversionState::RequestedUnshortenPermission { input, .. }
        | ConversionState::RequestedParseHtmlPermission { input, .. }
        | ConversionState::RequestedParseWebPermission { input, .. } => *input,
        _ => return "Allow a network connection?",
    };
    registry()[input].permission_prompt
}

fn ask(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

fn to_wgs84(position: Position) -> Position {
    Position {
        points: position
            .points
            .iter()
            .map(|p| p.to_system(ReferenceSystem::Wgs84))
            .collect(),
        ..position
    }
}

fn print_position(position: &Position) {
    for point in &position.points {
        println!("{point}");
    }
    if position.points.is_empty() {
        if let Some(query) = &position.query {
            println!("{query}");
        }
    }
}
