use intellichat_orchestrator::{
    config::AppConfig, dialog::DialogOrchestrator, oracle::create_default_oracle,
    registry::create_default_registry, session::Session,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Logs go to stderr so they don't interleave with the conversation
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;
    let oracle = create_default_oracle(&config.oracle)?;
    let registry = Arc::new(create_default_registry(&config, oracle.clone()).await?);
    let orchestrator = DialogOrchestrator::new(oracle, registry, config.dialog.clone());

    let mut session = Session::new(Uuid::new_v4());
    info!(session_id = %session.id(), "IntelliChat session started");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(b"IntelliChat ready. Type 'exit' to quit.\n")
        .await?;

    loop {
        stdout.write_all(b"\nYou: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if matches!(message.to_ascii_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        let reply = orchestrator.handle_message(&mut session, message).await;
        stdout
            .write_all(format!("IntelliChat: {}\n", reply.response_text).as_bytes())
            .await?;
    }

    let counters = session.task_counters();
    if !counters.is_empty() {
        stdout.write_all(b"\nCompleted tasks:\n").await?;
        for (action, count) in counters {
            stdout
                .write_all(format!("  {}: {}\n", action, count).as_bytes())
                .await?;
        }
    }
    stdout.flush().await?;

    Ok(())
}
