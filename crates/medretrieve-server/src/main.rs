//! `medretrieve-server`: the Tool Server binary. Listens for length-prefixed
//! JSON tool requests (§6) either over stdio (one agent, one process) or a
//! TCP socket (multiple concurrent agent connections) and dispatches them
//! through `ToolServer`.

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use medretrieve_core::config::Config;
use medretrieve_server::protocol::FramedTransport;
use medretrieve_server::{ServerContext, ToolServer};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Transport {
    Stdio,
    Tcp,
}

#[derive(Debug, Parser)]
#[command(name = "medretrieve-server", about = "Tool dispatch server for the medical retrieval engine")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "MEDRETRIEVE_CONFIG")]
    config: std::path::PathBuf,

    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,

    /// Bind address, only used when `--transport tcp`.
    #[arg(long, default_value = "127.0.0.1:8765")]
    listen_addr: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;
    let ctx = Arc::new(ServerContext::connect(config).await?);
    let server = Arc::new(ToolServer::new(ctx));

    match cli.transport {
        Transport::Stdio => run_stdio(server).await,
        Transport::Tcp => run_tcp(server, &cli.listen_addr).await,
    }
}

async fn run_stdio(server: Arc<ToolServer>) -> anyhow::Result<()> {
    info!("listening on stdio");
    let stdio = tokio::io::join(tokio::io::stdin(), tokio::io::stdout());
    serve_connection(server, stdio).await;
    Ok(())
}

async fn run_tcp(server: Arc<ToolServer>, listen_addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(addr = %listen_addr, "listening on tcp");
    loop {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "accepted connection");
        let server = server.clone();
        tokio::spawn(async move {
            serve_connection(server, stream).await;
        });
    }
}

async fn serve_connection<S>(server: Arc<ToolServer>, stream: S)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let mut transport = FramedTransport::new(stream);
    loop {
        match transport.read_request().await {
            Ok(Some(request)) => {
                let response = server.handle_request(request).await;
                if let Err(e) = transport.write_response(&response).await {
                    error!(error = %e, "failed to write response, closing connection");
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "failed to read request, closing connection");
                break;
            }
        }
    }
}
