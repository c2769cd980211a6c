pub mod state;

pub use state::{PanelSettings, SettingsError, SettingsResult, SettingsStore};
