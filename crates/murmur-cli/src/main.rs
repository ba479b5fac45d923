//! Murmur terminal client.
//!
//! # Usage
//!
//! ```bash
//! # Join the local development server as "alice"
//! murmur --name alice
//!
//! # Another server, verbose logs on stderr
//! murmur --server wss://chat.example.com/ws \
//!     --history https://chat.example.com/api/messages --log-level debug
//! ```

use std::time::Duration;

use clap::Parser;
use murmur_client::{
    ClientConfig, DEFAULT_HISTORY_URL, DEFAULT_SERVER_URL, Runtime, SessionHandle,
    transport::{HttpHistory, WsDriver},
};
use murmur_cli::{Command, HELP, Transcript, parse, view};
use murmur_core::{DEFAULT_HANDSHAKE_TIMEOUT, SessionConfig};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout},
    sync::broadcast::error::RecvError,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Murmur chat client
#[derive(Parser, Debug)]
#[command(name = "murmur")]
#[command(about = "Line-oriented terminal client for Murmur chat")]
#[command(version)]
struct Args {
    /// WebSocket URL of the chat service
    #[arg(short, long, default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// URL of the message history endpoint
    #[arg(long, default_value = DEFAULT_HISTORY_URL)]
    history: String,

    /// Connect immediately with this display name
    #[arg(short, long)]
    name: Option<String>,

    /// Seconds to wait for the server to acknowledge the handshake
    #[arg(long, default_value_t = DEFAULT_HANDSHAKE_TIMEOUT.as_secs())]
    handshake_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = ClientConfig {
        server_url: args.server,
        history_url: args.history.clone(),
        session: SessionConfig {
            handshake_timeout: Duration::from_secs(args.handshake_timeout_secs),
        },
        ..ClientConfig::default()
    };
    tracing::info!(server = %config.server_url, history = %config.history_url, "starting");

    let (runtime, handle) = Runtime::new(WsDriver::new(), HttpHistory::new(args.history), config);
    let task = tokio::spawn(runtime.run());

    if let Some(name) = args.name {
        handle.connect(name).await?;
    }

    let mut out = tokio::io::stdout();
    write_lines(&mut out, ["type /help for commands".to_string()]).await?;
    run(&handle, &mut out).await?;

    handle.shutdown().await?;
    task.await?;
    Ok(())
}

/// Multiplex stdin, snapshots and notices until `/quit` or end of input.
async fn run(handle: &SessionHandle, out: &mut Stdout) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut snapshots = handle.clone();
    let mut notices = handle.notices();
    let mut transcript = Transcript::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => dispatch(handle, out, command).await?,
                    Ok(None) => {},
                    Err(e) => write_lines(out, [e.to_string()]).await?,
                }
            },
            state = snapshots.changed() => {
                let state = state?;
                write_lines(out, transcript.update(&state)).await?;
            },
            notice = notices.recv() => match notice {
                Ok(notice) => write_lines(out, [view::format_notice(&notice)]).await?,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notices dropped");
                },
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}

async fn dispatch(
    handle: &SessionHandle,
    out: &mut Stdout,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Say(body) => handle.send_message(body).await?,
        Command::Connect(name) => handle.connect(name).await?,
        Command::Disconnect => handle.disconnect().await?,
        Command::Private { recipient_id, body } => {
            if handle.state().user(recipient_id).is_none() {
                write_lines(out, [format!("-- no user #{recipient_id} here, see /who")]).await?;
            }
            handle.send_private_message(recipient_id, body).await?;
        },
        Command::Typing(on) => handle.set_typing(on).await?,
        Command::Who => write_lines(out, view::format_roster(&handle.state())).await?,
        Command::Help => write_lines(out, HELP.lines().map(str::to_string)).await?,
        Command::Quit => {},
    }
    Ok(())
}

async fn write_lines(
    out: &mut Stdout,
    lines: impl IntoIterator<Item = String>,
) -> std::io::Result<()> {
    for line in lines {
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
    }
    out.flush().await
}
