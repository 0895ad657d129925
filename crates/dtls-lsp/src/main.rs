//! Design tokens language server entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Language server for DTCG design tokens.
#[derive(Parser, Debug)]
#[command(name = "design-tokens-language-server", version, about)]
struct Args {
    /// Communicate over stdin and stdout (the only transport).
    #[arg(long)]
    stdio: bool,

    /// Log filter used when RUST_LOG is unset, e.g. `info` or `dtls_core=debug`.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // LSP uses stdout for the protocol, so logs go to stderr.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&args.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    tracing::info!(stdio = args.stdio, "starting design tokens language server");
    dtls_lsp::run().await;
    Ok(())
}
