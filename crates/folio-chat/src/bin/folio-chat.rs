//! Terminal chat against a running folio relay.

use anyhow::Result;
use clap::Parser;
use folio_chat::{
    suggestions::suggestion_at, ChatSession, HttpRelayClient, RejectReason, RelayClient,
    SubmitOutcome, View,
};
use folio_ui_types::{Event, Role};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[clap(name = "folio-chat", version, about = "Chat with the portfolio assistant from a terminal")]
struct Cli {
    #[clap(long, default_value = "http://127.0.0.1:3000", help = "Base URL of the relay")]
    relay_url: String,

    #[clap(long, help = "Ask a single question, print the answer and exit")]
    ask: Option<String>,

    #[clap(long, default_value = "30", help = "Seconds to wait for the relay to answer")]
    timeout: u64,

    #[clap(long, short, default_value = "warn")]
    log_level: String,
}

fn print_view(session: &ChatSession) {
    match session.view() {
        View::Landing {
            greeting,
            headline,
            placeholder,
            suggestions,
            ..
        } => {
            println!("{}", greeting);
            println!("{}", headline);
            println!();
            for (i, label) in suggestions.iter().enumerate() {
                println!("  /{} {}", i + 1, label);
            }
            println!();
            println!("{} (/quit to leave, Ctrl+C stops a reply)", placeholder);
        }
        View::Conversation { error, .. } => {
            if let Some(error) = error {
                println!("[reply failed: {}]", error);
            }
        }
    }
}

/// Send the accepted request and print the reply as it streams in.
async fn exchange(
    client: &HttpRelayClient,
    session: &mut ChatSession,
    request: &folio_ui_types::ChatRequest,
) {
    print!("… ");
    let _ = std::io::stdout().flush();

    let mut stream = match client.send(request).await {
        Ok(stream) => stream,
        Err(e) => {
            session.fail(e.to_string());
            println!();
            print_view(session);
            return;
        }
    };

    let token = stream.cancellation_token();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let mut first = true;
    let result = session
        .consume_with(&mut stream, |event| {
            if let Event::TextDelta(delta) = event {
                if first {
                    print!("\r");
                    first = false;
                }
                print!("{}", delta.delta);
                let _ = std::io::stdout().flush();
            }
        })
        .await;
    watcher.abort();
    println!();

    if let Err(e) = result {
        log::warn!("Exchange failed: {}", e);
    }
    print_view(session);
}

fn submit(session: &mut ChatSession, line: &str) -> Option<folio_ui_types::ChatRequest> {
    let outcome = match line.strip_prefix('/').and_then(|n| n.parse::<usize>().ok()) {
        Some(position) => match suggestion_at(position) {
            Some(suggestion) => {
                println!("> {}", suggestion.label);
                session.suggest(suggestion.label)
            }
            None => {
                println!("No suggestion #{}", position);
                return None;
            }
        },
        None => {
            session.set_input(line);
            session.submit_input()
        }
    };

    match outcome {
        SubmitOutcome::Accepted(request) => Some(request),
        SubmitOutcome::Rejected(RejectReason::Busy) => {
            println!("Still answering, please wait.");
            None
        }
        SubmitOutcome::Rejected(RejectReason::EmptyInput) => None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let client = HttpRelayClient::new(cli.relay_url.clone())
        .with_connect_timeout(Duration::from_secs(cli.timeout));
    let mut session = ChatSession::new();

    if let Some(question) = cli.ask {
        let Some(request) = submit(&mut session, &question) else {
            anyhow::bail!("Nothing to ask");
        };
        exchange(&client, &mut session, &request).await;
        if let Some(error) = session.last_error() {
            anyhow::bail!("Reply failed: {}", error);
        }
        return Ok(());
    }

    if let Err(e) = client.health_check().await {
        log::warn!("Relay at {} is not healthy: {}", client.base_url(), e);
    }

    print_view(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();
        if line == "/quit" {
            break;
        }
        if let Some(request) = submit(&mut session, line) {
            exchange(&client, &mut session, &request).await;
        }
    }

    let replies = session
        .messages()
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .count();
    log::info!("Session {} ended after {} replies", session.chat_id(), replies);

    Ok(())
}
