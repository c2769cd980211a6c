use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use pdlc_panel::bridge::{PanelBridge, PanelInput, PanelOutbox};
use pdlc_panel::reply::{PlaceholderReplies, ReplyProvider};
use pdlc_panel::settings::{PanelSettings, SettingsStore};
use snafu::ResultExt;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

use commands::HostCommand;
use error::{
    DecodeFrameSnafu, EncodeMessageSnafu, HostResult, JoinTaskSnafu, LoadSettingsSnafu,
    ReadStdinSnafu, RuntimeInitSnafu, WriteStdoutSnafu,
};

/// Stdio host for the chat panel.
///
/// Reads one frame per line from stdin: either a host command id such as
/// `aiPdlc.newSession` or a JSON panel frame such as `{"type":"send","text":"hi"}`.
/// Panel messages for the host are written to stdout as JSON lines; logs go
/// to stderr.
#[derive(Debug, Parser)]
#[command(name = "pdlc", version)]
struct Cli {
    /// Settings file; defaults to the user config directory.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[snafu::report]
fn main() -> HostResult<()> {
    let cli = Cli::parse();

    let store = match cli.config {
        Some(path) => SettingsStore::open(path).context(LoadSettingsSnafu {
            stage: "open-explicit-settings",
        })?,
        None => SettingsStore::load(),
    };

    init_tracing(&store.settings().log_filter);
    tracing::info!(config_path = ?store.config_path(), "panel settings resolved");
    let settings = store.into_settings();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context(RuntimeInitSnafu {
            stage: "build-runtime",
        })?;

    runtime.block_on(serve(settings))
}

fn init_tracing(default_filter: &str) {
    // RUST_LOG wins over the configured filter.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(settings: PanelSettings) -> HostResult<()> {
    let provider: Arc<dyn ReplyProvider> = Arc::new(PlaceholderReplies::from_settings(&settings));
    let (bridge, handle, outbox, reader) = PanelBridge::new(&settings, provider);

    let bridge_task = tokio::spawn(bridge.run());
    let writer_task = tokio::spawn(write_panel_messages(outbox));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context(ReadStdinSnafu {
        stage: "read-frame-line",
    })? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let input = match parse_frame(line) {
            Ok(input) => input,
            Err(error) => {
                tracing::warn!(error = %error, "skipping malformed frame");
                continue;
            }
        };

        if let Err(error) = handle.post(input) {
            tracing::error!(error = %error, "panel bridge stopped accepting input");
            break;
        }
    }

    // Closing the last handle lets the bridge drain and stop.
    drop(handle);
    bridge_task.await.context(JoinTaskSnafu {
        stage: "join-bridge",
    })?;
    writer_task.await.context(JoinTaskSnafu {
        stage: "join-writer",
    })??;

    let snapshot = reader.snapshot();
    tracing::info!(
        revision = snapshot.revision,
        sessions = snapshot.state.sessions().len(),
        "panel host finished"
    );
    Ok(())
}

fn parse_frame(line: &str) -> HostResult<PanelInput> {
    if let Some(command) = HostCommand::from_command_id(line) {
        return Ok(PanelInput::Host(command.event()));
    }

    serde_json::from_str(line).context(DecodeFrameSnafu {
        stage: "decode-frame",
        line: line.to_string(),
    })
}

async fn write_panel_messages(mut outbox: PanelOutbox) -> HostResult<()> {
    let mut stdout = tokio::io::stdout();

    while let Some(message) = outbox.recv().await {
        let mut frame = serde_json::to_string(&message).context(EncodeMessageSnafu {
            stage: "encode-panel-message",
        })?;
        frame.push('\n');

        stdout
            .write_all(frame.as_bytes())
            .await
            .context(WriteStdoutSnafu {
                stage: "write-panel-message",
            })?;
        stdout.flush().await.context(WriteStdoutSnafu {
            stage: "flush-panel-message",
        })?;
    }

    Ok(())
}
