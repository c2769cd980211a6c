/// Single-writer controller between the host, the user and the reducer.
pub mod controller;
/// Serialized messages exchanged with the host process.
pub mod protocol;

pub use controller::{
    BridgeError, BridgeHandle, BridgeResult, PanelBridge, PanelOutbox, StateReader, StateSnapshot,
};
pub use protocol::{PanelInput, PanelMessage, UserIntent};
