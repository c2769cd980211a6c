use pdlc_panel::settings::SettingsError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum HostError {
    #[snafu(display("failed to load settings on `{stage}`"))]
    LoadSettings {
        stage: &'static str,
        source: SettingsError,
    },
    #[snafu(display("failed to start tokio runtime on `{stage}`"))]
    RuntimeInit {
        stage: &'static str,
        source: std::io::Error,
    },
    #[snafu(display("failed to read stdin on `{stage}`"))]
    ReadStdin {
        stage: &'static str,
        source: std::io::Error,
    },
    #[snafu(display("failed to write stdout on `{stage}`"))]
    WriteStdout {
        stage: &'static str,
        source: std::io::Error,
    },
    #[snafu(display("'{line}' is neither a command id nor a panel frame"))]
    DecodeFrame {
        stage: &'static str,
        line: String,
        source: serde_json::Error,
    },
    #[snafu(display("failed to encode panel message on `{stage}`"))]
    EncodeMessage {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("background task failed on `{stage}`"))]
    JoinTask {
        stage: &'static str,
        source: tokio::task::JoinError,
    },
}

pub type HostResult<T> = Result<T, HostError>;
