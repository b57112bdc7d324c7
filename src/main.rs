use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use readroom::auth::token::{timestamp_to_datetime, TokenIssuer};
use readroom::auth::vk::VkLaunchVerifier;
use readroom::store::postgres::PgStore;
use readroom::store::IdentityStore;
use readroom::{api, cli, config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::Migrate) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            db.migrate().await?;
            println!("Migrations applied.");
            Ok(())
        }
        Some(cli::Commands::Token { command }) => handle_token_command(&cfg, command).await,
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

/// `RUST_LOG` controls the filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("readroom=debug,tower_http=info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Connecting to database...");
    let db = PgStore::connect(&cfg.database_url).await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;

    let verifier = VkLaunchVerifier::new(cfg.vk_client_secret.clone());
    tracing::info!(
        expire_minutes = cfg.token.expire_minutes,
        algorithm = ?cfg.token.algorithm,
        "token issuer configured"
    );

    let state = Arc::new(AppState::new(cfg, Arc::new(db), Arc::new(verifier))?);
    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("ReadRoom API listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_token_command(
    cfg: &config::Config,
    cmd: cli::TokenCommands,
) -> anyhow::Result<()> {
    let issuer = TokenIssuer::new(&cfg.token)?;

    match cmd {
        cli::TokenCommands::Issue { external_id } => {
            let db = PgStore::connect(&cfg.database_url).await?;
            let identity = db
                .find_by_external_id(&external_id)
                .await?
                .with_context(|| format!("user not found: {}", external_id))?;
            if !identity.is_active {
                anyhow::bail!("user {} is inactive", external_id);
            }

            let issued = issuer.issue(&identity.external_id)?;
            println!(
                "Token issued:\n  Subject: {}\n  Expires: {}\n  Use:     Authorization: Bearer {}",
                identity.external_id, issued.expires_at, issued.access_token
            );
        }
        cli::TokenCommands::Inspect { token } => {
            let claims = issuer.decode(&token)?;
            let fmt_ts = |ts: i64| {
                timestamp_to_datetime(ts)
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_else(|| ts.to_string())
            };
            println!(
                "Token valid:\n  Subject: {}\n  Issued:  {}\n  Expires: {}",
                claims.sub,
                fmt_ts(claims.iat),
                fmt_ts(claims.exp)
            );
        }
    }
    Ok(())
}
