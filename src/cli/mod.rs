//! Command-line interface parsing and startup
//!
//! Parses arguments, initializes tracing, resolves the server endpoint,
//! and hands control to the interactive chat loop.

use std::error::Error;
use std::sync::Mutex;

use clap::Parser;

use crate::core::config::Config;
use crate::ui::chat_loop::run_chat;

#[derive(Parser)]
#[command(name = "palaver")]
#[command(about = "A terminal client for a shared realtime chat channel")]
#[command(
    long_about = "Palaver is a full-screen terminal client for a single shared chat \
channel. Register or log in, then chat in real time over a websocket.\n\n\
Environment Variables:\n\
  PALAVER_SERVER_URL   Backend base URL (optional; also settable in config.toml)\n\n\
Controls:\n\
  Type                 Fill the focused field / compose a message\n\
  Tab                  Next field on the credential screens\n\
  Enter                Submit the form / send the message\n\
  Esc                  Switch between register and login\n\
  Up/Down              Scroll through chat history\n\
  Ctrl+C               Quit"
)]
pub struct Args {
    /// Backend base URL for the auth calls and the chat channel
    #[arg(short, long, value_name = "URL")]
    pub server: Option<String>,

    /// Append tracing output to this file
    #[arg(short, long, value_name = "FILE")]
    pub log: Option<String>,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    let config = Config::load()?;
    let server_url = config.resolve_server_url(args.server.as_deref());

    run_chat(server_url).await
}

/// Tracing goes to a file, never to the terminal the UI owns.
fn init_tracing(log_file: Option<&str>) -> Result<(), Box<dyn Error>> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "palaver=debug".into()),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
