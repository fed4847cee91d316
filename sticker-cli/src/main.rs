//! # Sticker CLI
//!
//! Compose profile photos with sticker overlays from the command line.

use clap::Parser;
use sticker_cli::{catalog_rows, run_compose, AppConfig, CliArgs, Command};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sticker_cli=debug,sticker_renderer=info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    // Use JSON format for log shipping (RUST_LOG_FORMAT=json)
    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = AppConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Compose(compose) => {
            tracing::info!(
                photo = %compose.photo.display(),
                overlay = %compose.overlay,
                "Composing"
            );
            let report = run_compose(&compose, &config).await?;
            tracing::info!(
                output = %report.output.display(),
                bytes = report.bytes,
                revision = report.revision,
                "Wrote {}",
                report.overlay
            );
            println!("{}", report.output.display());
            if let Some(uri) = report.data_uri {
                println!("{uri}");
            }
        }
        Command::Catalog { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(sticker_core::catalog())?);
            } else {
                for row in catalog_rows() {
                    println!("{row}");
                }
            }
        }
    }
    Ok(())
}
