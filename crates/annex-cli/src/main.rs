//! annex - terminal chat client for xAI Grok

mod config;
mod ui;

use std::sync::Arc;

use clap::Parser;

use annex_ai::Client;
use annex_chat::{
    BufferedTransport, ChatOptions, ChatSession, SessionEvent, Status, StreamingTransport,
    Transport,
};

/// annex - an annex to your brain
#[derive(Parser, Debug)]
#[command(name = "annex")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (default: grok-3)
    #[arg(short, long)]
    model: Option<String>,

    /// API base URL (default: https://api.x.ai/v1)
    #[arg(long)]
    base_url: Option<String>,

    /// System prompt sent with every request
    #[arg(short, long)]
    system: Option<String>,

    /// Fetch replies buffered instead of streaming token by token
    #[arg(long)]
    no_stream: bool,

    /// Run in non-interactive mode with a single prompt
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing. The TUI owns the terminal, so debug output goes to
    // a log file there and to stderr in one-shot mode.
    if args.verbose {
        if args.command.is_some() {
            tracing_subscriber::fmt()
                .with_env_filter("annex=debug")
                .with_writer(std::io::stderr)
                .init();
        } else {
            let log_file = std::fs::File::create("annex.log")?;
            tracing_subscriber::fmt()
                .with_env_filter("annex=debug")
                .with_writer(log_file)
                .with_ansi(false)
                .init();
        }
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Load config file; CLI args take precedence
    let cfg = config::Config::load();

    let model = args
        .model
        .or(cfg.model.clone())
        .unwrap_or_else(|| annex_ai::DEFAULT_MODEL.to_string());

    let base_url = args
        .base_url
        .or(cfg.base_url.clone())
        .unwrap_or_else(|| annex_ai::DEFAULT_BASE_URL.to_string());

    let system_prompt = args
        .system
        .or(cfg.system_prompt.clone())
        .unwrap_or_else(|| annex_ai::DEFAULT_SYSTEM_PROMPT.to_string());

    let stream = !args.no_stream && cfg.stream.unwrap_or(true);

    // Missing credential is reported before any request is made
    let Some(api_key) = cfg.api_key() else {
        eprintln!("Error: no API key found");
        eprintln!();
        eprintln!("Set your API key with: export XAI_API_KEY=your-key");
        eprintln!("Or add it to the config file: annex --init-config");
        std::process::exit(1);
    };

    let client = Client::new(api_key).with_base_url(base_url);
    tracing::debug!(%model, stream, base_url = client.base_url(), "configured");

    let options = ChatOptions {
        model: model.clone(),
        system_prompt,
    };

    let transport: Arc<dyn Transport> = if stream {
        Arc::new(StreamingTransport::new(client, options))
    } else {
        Arc::new(BufferedTransport::new(client, options))
    };

    let mut session = ChatSession::new(transport);

    // Non-interactive mode
    if let Some(prompt) = args.command {
        return run_command(&mut session, &prompt).await;
    }

    ui::run_tui(&mut session, &model).await
}

/// One-shot mode: send a single prompt and print the reply to stdout
async fn run_command(session: &mut ChatSession, prompt: &str) -> anyhow::Result<()> {
    use std::io::Write;

    // Blank input never starts a turn, so there would be nothing to await
    if prompt.trim().is_empty() {
        return Ok(());
    }

    let mut rx = session.subscribe();

    // Print deltas as they arrive; snapshots carry the full text so far
    let printer = tokio::spawn(async move {
        let mut printed = 0usize;
        let mut errored = false;
        while let Ok(event) = rx.recv().await {
            match event {
                SessionEvent::TurnStarted { .. } => {}
                SessionEvent::MessageUpdate { snapshot } => {
                    if snapshot.text.len() > printed {
                        print!("{}", &snapshot.text[printed..]);
                        let _ = std::io::stdout().flush();
                        printed = snapshot.text.len();
                    }
                }
                SessionEvent::TurnEnded { snapshot } => {
                    if snapshot.status == Status::Error {
                        errored = true;
                        eprintln!("{}", snapshot.text);
                    } else if snapshot.text.len() > printed {
                        print!("{}", &snapshot.text[printed..]);
                    }
                    println!();
                    break;
                }
            }
        }
        errored
    });

    session.send(prompt).await;

    let errored = printer.await?;
    if errored {
        std::process::exit(1);
    }
    Ok(())
}
