use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Error};
use bankid_simulator::{
    definitions::x509::{subject::subject_lines, CertificateWithDer},
    order::SystemClock,
    server::{self, AppState},
    signature::{
        random::OsRandom,
        signed_data::{srv_info_display_name, srv_info_name},
    },
    Config,
};
use clap::Parser;
use clap_stdin::MaybeStdin;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, clap::Subcommand)]
enum Action {
    /// Run the simulator.
    Serve {
        /// JSON config file. Built-in defaults are used when omitted.
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
    /// Print the effective configuration as JSON.
    PrintConfig {
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
    /// Show how a relying-party certificate will appear in the signed data.
    InspectCert {
        /// PEM-encoded certificate, or '-' to read it from stdin.
        pem: MaybeStdin<String>,
    },
}

fn load_config(path: Option<PathBuf>) -> Result<Config, Error> {
    match path {
        Some(path) => {
            Config::load(&path).with_context(|| format!("could not load {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    match Args::parse().action {
        Action::Serve { config } => serve(load_config(config)?).await,
        Action::PrintConfig { config } => {
            println!("{}", load_config(config)?.to_json_pretty()?);
            Ok(())
        }
        Action::InspectCert { pem } => inspect_cert(pem.to_string()),
    }
}

async fn serve(config: Config) -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.logging.level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let base_dir = std::env::current_dir().context("could not determine working directory")?;
    let profile = config
        .resolve_profile(&base_dir)
        .context("could not load the end-user profile")?;
    tracing::info!(
        "Completing orders as '{}' from {}.",
        profile.user_certificate().common_name(),
        profile.ip_address
    );

    let state = AppState::from_config(
        &config,
        profile,
        Arc::new(SystemClock),
        Arc::new(OsRandom),
    )?;
    let app = server::router(state);

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid listen address {}", config.listen))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("could not bind {addr}"))?;
    tracing::info!("Listening on {addr}.");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("could not listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down.");
}

fn inspect_cert(pem: String) -> Result<(), Error> {
    let certificate =
        CertificateWithDer::from_pem(pem.as_bytes()).context("could not parse certificate")?;
    let name = srv_info_name(&certificate);
    println!("subject:");
    for line in subject_lines(&certificate.inner) {
        println!("  {line}");
    }
    println!("srvInfo name: {name}");
    match srv_info_display_name(&name) {
        Ok(display_name) => println!("displayName: {display_name}"),
        Err(e) => println!("displayName: unavailable ({e})"),
    }
    println!(
        "validity: {} - {}",
        certificate.not_before_millis(),
        certificate.not_after_millis()
    );
    Ok(())
}
