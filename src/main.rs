use std::collections::HashSet;
use std::sync::Arc;

use chatfeed::config::{DEFAULT_BASE_URL, FeedConfig};
use chatfeed::{FeedView, FetchError, HttpMessageSource, Message, MessageSource, Phase, RoomFeed};
use clap::{Parser, Subcommand};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] chatfeed::ConfigError),
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("feed closed unexpectedly")]
    FeedClosed,
}

#[derive(Parser, Debug)]
#[command(name = "chatfeed", about = "Follow chat room messages from the terminal")]
struct Cli {
    #[arg(long, env = "CHATFEED_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "CHATFEED_SESSION_TOKEN")]
    session_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one snapshot and print it as JSON.
    Fetch { room_id: String },
    /// Follow a room, printing messages as they are revealed.
    Watch {
        room_id: String,
        /// Skip the progressive reveal.
        #[arg(long)]
        show_all: bool,
        /// Extra batches to reveal once the first snapshot arrives.
        #[arg(long, default_value_t = 0)]
        load_more: usize,
        /// Exit once the first snapshot is fully revealed.
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = FeedConfig::from_env()?
        .with_base_url(&cli.base_url)
        .with_session_token(cli.session_token);

    match cli.command {
        Command::Fetch { room_id } => run_fetch(&config, &room_id).await,
        Command::Watch { room_id, show_all, load_more, once } => {
            run_watch(&config, room_id, WatchOptions { show_all, load_more, once }).await
        }
    }
}

async fn run_fetch(config: &FeedConfig, room_id: &str) -> Result<(), CliError> {
    let source = HttpMessageSource::new(config)?;
    let snapshot = source.fetch_messages(room_id).await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct WatchOptions {
    show_all: bool,
    load_more: usize,
    once: bool,
}

async fn run_watch(config: &FeedConfig, room_id: String, opts: WatchOptions) -> Result<(), CliError> {
    let source: Arc<dyn MessageSource> = Arc::new(HttpMessageSource::new(config)?);
    let mut feed = RoomFeed::open(source, room_id, config);
    let mut printed: HashSet<String> = HashSet::new();
    let mut batches_requested = false;

    loop {
        let view = tokio::select! {
            view = feed.changed() => view.ok_or(CliError::FeedClosed)?,
            _ = tokio::signal::ctrl_c() => break,
        };

        if let Some(e) = &view.error {
            return Err(CliError::Fetch(e.clone()));
        }

        if view.has_more {
            if opts.show_all {
                feed.show_all();
            } else if !batches_requested {
                for _ in 0..opts.load_more {
                    feed.load_more();
                }
            }
        }
        if view.total_messages > 0 {
            batches_requested = true;
        }

        print_new(&view, &mut printed);

        if opts.once && is_settled(&view) {
            break;
        }
    }

    feed.close();
    Ok(())
}

fn is_settled(view: &FeedView) -> bool {
    !view.is_loading && !view.is_fetching && matches!(view.phase, Phase::Settled | Phase::Empty)
}

fn print_new(view: &FeedView, printed: &mut HashSet<String>) {
    for message in &view.messages {
        if printed.insert(message.id.clone()) {
            println!("{}", format_line(message));
        }
    }
}

fn format_line(message: &Message) -> String {
    format!("[{}] {}: {}", message.created_at, message.user_name, message.content)
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
