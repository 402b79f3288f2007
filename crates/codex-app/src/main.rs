//! Codex binary: composition root.
//!
//! 1. Resolve configuration (CLI > env > file > defaults)
//! 2. Build the orchestrator with memory, knowledge, notification channels
//!    and the optional AI enhancer
//! 3. Start the retention task (memory cleanup and idle-session expiry)
//! 4. Serve the HTTP API, or run an interactive chat on stdin

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use codex_api::state::AppState;
use codex_chat::Orchestrator;
use codex_core::{CodexConfig, SessionId};

use cli::{CliArgs, Command};

/// Expand a leading `~/` to the home directory.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    match data_dir.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(rest)
        }
        None => PathBuf::from(data_dir),
    }
}

/// Periodically purge old memories and forget idle sessions.
async fn retention_loop(orchestrator: Arc<Orchestrator>, config: CodexConfig) {
    let minutes = u64::from(config.memory.cleanup_interval_minutes.max(1));
    let max_age = chrono::Duration::days(i64::from(config.memory.max_age_days));
    let idle = chrono::Duration::minutes(i64::from(config.conversation.session_idle_minutes));

    tracing::info!(interval_minutes = minutes, "Retention task started");
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(minutes * 60));
    // The first tick fires immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        match orchestrator.memory().cleanup_old_memories(max_age) {
            Ok(report) => tracing::info!(
                entries_removed = report.entries_removed,
                summaries_removed = report.summaries_removed,
                "Memory cleanup finished"
            ),
            Err(e) => tracing::warn!(error = %e, "Memory cleanup failed"),
        }
        orchestrator.expire_idle_sessions(idle);
    }
}

/// Read lines from stdin and answer them in a single session.
async fn interactive_chat(
    orchestrator: Arc<Orchestrator>,
    session: Option<String>,
) -> std::io::Result<()> {
    let session_id = session.map(SessionId::from).unwrap_or_else(SessionId::generate);
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(format!("Session {} (Ctrl-D to quit)\n> ", session_id).as_bytes())
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let turn = orchestrator.process_utterance(&session_id, &line).await;
        let mut out = format!("{}\n", turn.message);
        if !turn.quick_replies.is_empty() {
            out.push_str(&format!("  [{}]\n", turn.quick_replies.join(" | ")));
        }
        out.push_str(&format!("  (stage {}, score {})\n", turn.stage, turn.score));
        if turn.notified {
            out.push_str("  (lead qualified, team notified)\n");
        }
        out.push_str("> ");
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }
    stdout.write_all(b"\n").await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let mut config = CodexConfig::load_or_default(&config_file);
    config.apply_env_overrides();
    args.apply(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Codex v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let data_dir = resolve_data_dir(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }
    if config.notification.local_store_file.is_none() {
        let path = data_dir.join("leads.json");
        config.notification.local_store_file = Some(path.to_string_lossy().to_string());
    }

    let orchestrator = Arc::new(Orchestrator::from_config(&config)?);
    tracing::info!("Orchestrator ready");

    let retention = tokio::spawn(retention_loop(Arc::clone(&orchestrator), config.clone()));

    match args.command() {
        Command::Serve => {
            let token = codex_api::auth::load_or_create_token(&data_dir);
            let state = AppState::new(Arc::clone(&orchestrator), config.general.clone(), token);
            let served = codex_api::start_server(state).await;
            retention.abort();
            served?;
        }
        Command::Chat { session } => {
            interactive_chat(orchestrator, session).await?;
            retention.abort();
        }
    }

    Ok(())
}
